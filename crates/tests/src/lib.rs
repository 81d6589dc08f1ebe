//! Signal generators and measurements shared by the integration tests

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub fn generate_sine_wave(frequency: f32, sample_rate: u32, duration_ms: f32) -> Vec<f32> {
    let num_samples = (sample_rate as f32 * duration_ms / 1000.0) as usize;
    (0..num_samples)
        .map(|i| 2.0 * std::f32::consts::PI * frequency * i as f32 / sample_rate as f32)
        .map(|phase| phase.sin())
        .collect()
}

/// Uniform noise in [-amplitude, amplitude), reproducible per seed
pub fn generate_white_noise(num_samples: usize, amplitude: f32, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..num_samples)
        .map(|_| rng.gen_range(-amplitude..amplitude))
        .collect()
}

pub fn generate_silence(num_samples: usize) -> Vec<f32> {
    vec![0.0; num_samples]
}

pub fn calc_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples.iter().map(|&s| f64::from(s) * f64::from(s)).sum();
    (sum / samples.len() as f64).sqrt() as f32
}

pub fn calc_peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0_f32, |peak, s| peak.max(s.abs()))
}

/// Normalized cross-correlation at zero lag
pub fn correlation(a: &[f32], b: &[f32]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| f64::from(*x) * f64::from(*y)).sum();
    let norm_a: f64 = a.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noise_is_seeded() {
        assert_eq!(generate_white_noise(64, 0.5, 3), generate_white_noise(64, 0.5, 3));
        assert!(calc_peak(&generate_white_noise(1000, 0.5, 3)) <= 0.5);
    }

    #[test]
    fn test_sine_rms() {
        let sine = generate_sine_wave(440.0, 48000, 1000.0);
        assert_eq!(sine.len(), 48000);
        assert!((calc_rms(&sine) - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-3);
    }
}
