//! Impulse-response extraction by frequency-domain deconvolution
//!
//! Given a dry recording and the same recording through a reverb, the IR is
//! `ifft(fft(wet) / (fft(dry) + epsilon))`, real part, scaled to unit peak.
//!
//! The method assumes short, pre-aligned recordings of a linear,
//! time-invariant reverb. Both inputs are truncated to the shorter length and
//! nothing is time-aligned. Bins where the dry spectrum is close to zero are
//! unreliable and can dominate the raw result; `ExtractedIr::raw_peak`
//! exposes the magnitude before normalization so callers can judge that.

use crate::domain::audio::{AudioError, Result, SampleBuffer};
use crate::domain::reverb::ImpulseResponse;
use num_complex::Complex64;
use rustfft::FftPlanner;
use tracing::{debug, warn};

/// Result of a deconvolution
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedIr {
    /// Unit-peak IR at the dry recording's sample rate
    pub response: SampleBuffer,
    /// Peak magnitude before normalization
    pub raw_peak: f32,
    /// Samples dropped from the longer input
    pub truncated_samples: usize,
}

impl ExtractedIr {
    /// Tag the extracted buffer with a name for use as a reverb
    pub fn into_impulse_response(self, name: impl Into<String>) -> Result<ImpulseResponse> {
        ImpulseResponse::new(name, self.response)
    }
}

/// Frequency-domain deconvolution with a regularized denominator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpulseResponseExtractor {
    epsilon: f64,
    sanity_peak: f32,
}

impl ImpulseResponseExtractor {
    pub const DEFAULT_EPSILON: f64 = 1e-10;
    pub const DEFAULT_SANITY_PEAK: f32 = 1000.0;

    pub fn new(epsilon: f64, sanity_peak: f32) -> Result<Self> {
        if !(epsilon.is_finite() && epsilon >= 0.0) {
            return Err(AudioError::InvalidConfiguration(format!(
                "epsilon must be finite and non-negative, got {epsilon}"
            )));
        }
        if !(sanity_peak.is_finite() && sanity_peak > 0.0) {
            return Err(AudioError::InvalidConfiguration(format!(
                "sanity peak must be positive, got {sanity_peak}"
            )));
        }
        Ok(Self {
            epsilon,
            sanity_peak,
        })
    }

    /// Derive the IR that turns `dry` into `wet`
    pub fn extract(&self, dry: &SampleBuffer, wet: &SampleBuffer) -> Result<ExtractedIr> {
        let len = dry.len().min(wet.len());
        if len == 0 {
            return Err(AudioError::EmptyBuffer("dry and wet recordings must both contain samples".to_string()));
        }

        let truncated_samples = dry.len().max(wet.len()) - len;
        if truncated_samples > 0 {
            debug!(
                dry_len = dry.len(),
                wet_len = wet.len(),
                truncated_samples,
                "Truncating recordings to the shorter length"
            );
        }
        if dry.sample_rate() != wet.sample_rate() {
            warn!(
                dry_rate = dry.sample_rate(),
                wet_rate = wet.sample_rate(),
                "Dry and wet sample rates differ; using the dry rate"
            );
        }

        let mut planner = FftPlanner::<f64>::new();
        let forward = planner.plan_fft_forward(len);
        let inverse = planner.plan_fft_inverse(len);

        let mut dry_spectrum = to_complex(&dry.samples()[..len]);
        let mut wet_spectrum = to_complex(&wet.samples()[..len]);
        forward.process(&mut dry_spectrum);
        forward.process(&mut wet_spectrum);

        // epsilon keeps bins where the dry spectrum vanishes finite
        let mut ir_spectrum: Vec<Complex64> = wet_spectrum
            .iter()
            .zip(dry_spectrum.iter())
            .map(|(&w, &d)| w / (d + self.epsilon))
            .collect();
        inverse.process(&mut ir_spectrum);

        let scale = 1.0 / len as f64;
        let raw: Vec<f64> = ir_spectrum.iter().map(|c| c.re * scale).collect();
        let raw_peak = raw.iter().fold(0.0_f64, |peak, v| peak.max(v.abs()));

        if !raw_peak.is_finite() {
            return Err(AudioError::InvalidConfiguration(
                "deconvolution diverged; dry recording has no usable energy".to_string(),
            ));
        }

        let raw_peak_f32 = raw_peak as f32;
        if raw_peak_f32 > self.sanity_peak {
            warn!(
                raw_peak = raw_peak_f32,
                threshold = self.sanity_peak,
                "Deconvolved IR magnitude is abnormally large; dry spectrum likely has near-empty bins"
            );
        }

        let samples: Vec<f32> = if raw_peak > 0.0 {
            raw.iter().map(|v| (v / raw_peak) as f32).collect()
        } else {
            warn!("Wet recording is silent; extracted IR is all zeros");
            vec![0.0; len]
        };

        debug!(len, raw_peak = raw_peak_f32, "Impulse response extracted");

        Ok(ExtractedIr {
            response: SampleBuffer::new(samples, dry.sample_rate()),
            raw_peak: raw_peak_f32,
            truncated_samples,
        })
    }
}

impl Default for ImpulseResponseExtractor {
    fn default() -> Self {
        Self {
            epsilon: Self::DEFAULT_EPSILON,
            sanity_peak: Self::DEFAULT_SANITY_PEAK,
        }
    }
}

fn to_complex(samples: &[f32]) -> Vec<Complex64> {
    samples
        .iter()
        .map(|&s| Complex64::new(f64::from(s), 0.0))
        .collect()
}
