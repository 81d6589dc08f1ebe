//! Digital Signal Processing primitives shared by the training effects
//!
//! This module provides:
//! - The `Effect` trait implemented by band boost, panning and reverb
//! - Biquad (second-order IIR) sections and cascades of them
//! - Butterworth bandpass design via bilinear transform
//! - Linear convolution (direct for short kernels, FFT otherwise)
//! - Peak measurement and clip-guard normalization
//!
//! Filter state and FFT arithmetic run in f64; buffers stay f32.

use crate::domain::audio::{AudioError, SampleBuffer};
use num_complex::Complex64;
use rustfft::FftPlanner;
use std::f64::consts::PI;
use tracing::trace;

pub type Result<T> = std::result::Result<T, AudioError>;

/// Core trait for all training effects
///
/// An effect takes a mono clip and the hidden parameter of a trial and
/// produces the stimulus presented to the listener. Effects never mutate the
/// clip they are given.
pub trait Effect {
    /// The parameter the listener has to identify
    type Parameter: ?Sized;

    /// What the effect produces (mono, stereo, or a before/after pair)
    type Output;

    /// Render the stimulus for `parameter`
    fn apply(&self, clip: &SampleBuffer, parameter: &Self::Parameter) -> Result<Self::Output>;

    /// Get effect name for debugging/display
    fn name(&self) -> &str;
}

/// Parameter constraints for DSP design
pub mod params {
    /// Lowest normalized band edge handed to filter design
    pub const MIN_NORMALIZED_EDGE: f64 = 1e-5;
    /// Highest normalized band edge handed to filter design
    pub const MAX_NORMALIZED_EDGE: f64 = 0.99999;

    /// Kernels up to this length are convolved directly
    pub const DIRECT_CONVOLUTION_MAX_KERNEL: usize = 64;
}

/// Convert decibels to a linear amplitude factor
#[inline]
pub fn db_to_gain(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Peak absolute value of a slice (0.0 for an empty slice)
pub fn peak_abs(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0_f32, |peak, s| peak.max(s.abs()))
}

/// Divide by the peak if it exceeds 1.0
///
/// Audio already within range is left untouched. Returns the peak that
/// triggered the rescale.
pub fn normalize_if_clipping(samples: &mut [f32]) -> Option<f32> {
    let peak = peak_abs(samples);
    if peak > 1.0 {
        let scale = 1.0 / peak;
        for sample in samples.iter_mut() {
            *sample *= scale;
        }
        Some(peak)
    } else {
        None
    }
}

// ============================================================================
// BIQUAD FILTER
// ============================================================================

/// Biquad filter coefficients
///
/// Direct Form I implementation for numerical stability.
/// Coefficients are pre-computed to avoid per-sample calculations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoeffs {
    /// Numerator coefficients
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    /// Denominator coefficients (a0 is normalized to 1.0)
    pub a1: f64,
    pub a2: f64,
}

impl Default for BiquadCoeffs {
    fn default() -> Self {
        // Unity gain (no filtering)
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
        }
    }
}

impl BiquadCoeffs {
    /// Bandpass section with zeros at DC and Nyquist and a conjugate pole pair
    ///
    /// `H(z) = gain * (1 - z^-2) / ((1 - p z^-1)(1 - p* z^-1))`
    #[must_use]
    pub fn bandpass_section(pole: Complex64, gain: f64) -> Self {
        Self {
            b0: gain,
            b1: 0.0,
            b2: -gain,
            a1: -2.0 * pole.re,
            a2: pole.norm_sqr(),
        }
    }

    /// Complex frequency response at `omega` radians per sample
    pub fn response_at(&self, omega: f64) -> Complex64 {
        let z1 = Complex64::from_polar(1.0, -omega);
        let z2 = z1 * z1;
        let num = self.b0 + z1 * self.b1 + z2 * self.b2;
        let den = 1.0 + z1 * self.a1 + z2 * self.a2;
        num / den
    }
}

/// Stateful biquad filter using Direct Form I
#[derive(Debug, Clone, PartialEq)]
pub struct BiquadFilter {
    coeffs: BiquadCoeffs,
    // Previous input samples (x[n-1], x[n-2])
    x1: f64,
    x2: f64,
    // Previous output samples (y[n-1], y[n-2])
    y1: f64,
    y2: f64,
}

impl BiquadFilter {
    /// Create a new biquad filter with given coefficients
    pub fn new(coeffs: BiquadCoeffs) -> Self {
        Self {
            coeffs,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    pub fn coeffs(&self) -> &BiquadCoeffs {
        &self.coeffs
    }

    /// Process a single sample
    #[inline]
    fn process_sample(&mut self, x: f64) -> f64 {
        // Direct Form I: y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2]
        //                        - a1*y[n-1] - a2*y[n-2]
        let y = self.coeffs.b0 * x + self.coeffs.b1 * self.x1 + self.coeffs.b2 * self.x2
            - self.coeffs.a1 * self.y1
            - self.coeffs.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;

        y
    }

    /// Process a buffer of samples in place
    pub fn process(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process_sample(f64::from(*sample)) as f32;
        }
    }

    /// Reset filter state
    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}

/// Series connection of biquad sections
///
/// Samples pass through every section in f64 before being rounded back to
/// f32, so high-order designs keep their precision.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCascade {
    sections: Vec<BiquadFilter>,
}

impl FilterCascade {
    pub fn new(coeffs: impl IntoIterator<Item = BiquadCoeffs>) -> Self {
        Self {
            sections: coeffs.into_iter().map(BiquadFilter::new).collect(),
        }
    }

    pub fn sections(&self) -> &[BiquadFilter] {
        &self.sections
    }

    /// Filter `input` into a new vector, continuing from the current state
    pub fn filter(&mut self, input: &[f32]) -> Vec<f32> {
        input
            .iter()
            .map(|&x| {
                self.sections
                    .iter_mut()
                    .fold(f64::from(x), |acc, section| section.process_sample(acc)) as f32
            })
            .collect()
    }

    /// Magnitude response at a frequency normalized to Nyquist (0.0..=1.0)
    pub fn magnitude_at(&self, normalized_freq: f64) -> f64 {
        let omega = PI * normalized_freq;
        self.sections
            .iter()
            .map(|section| section.coeffs().response_at(omega))
            .fold(Complex64::new(1.0, 0.0), |acc, h| acc * h)
            .norm()
    }
}

// ============================================================================
// BUTTERWORTH BANDPASS DESIGN
// ============================================================================

/// Design a Butterworth bandpass as a cascade of `order` biquad sections
///
/// `order` is the lowpass prototype order; the bandpass has twice as many
/// poles. Edges are normalized to Nyquist and must satisfy
/// `0 < low < high < 1`. The response is -3 dB at both edges and unity at
/// the (prewarped) geometric center.
pub fn butterworth_bandpass(order: usize, low: f64, high: f64) -> Result<FilterCascade> {
    if order == 0 || order % 2 != 0 {
        return Err(AudioError::InvalidConfiguration(format!(
            "Butterworth order must be even and positive, got {order}"
        )));
    }
    if !(low > 0.0 && low < high && high < 1.0) {
        return Err(AudioError::InvalidBand(format!(
            "normalized edges must satisfy 0 < low < high < 1, got {low} and {high}"
        )));
    }

    // Bilinear transform with fs = 2, so normalized frequency 1.0 is Nyquist
    let fs2 = 4.0;
    let w1 = fs2 * (PI * low / 2.0).tan();
    let w2 = fs2 * (PI * high / 2.0).tan();
    let bandwidth = w2 - w1;
    let center_sq = w1 * w2;

    let mut coeffs = Vec::with_capacity(order);
    for k in 0..order / 2 {
        // Upper-half-plane prototype pole; its conjugate yields the conjugate sections
        let angle = PI * (2 * k + order + 1) as f64 / (2 * order) as f64;
        let prototype = Complex64::from_polar(1.0, angle) * (bandwidth / 2.0);
        let offset = (prototype * prototype - center_sq).sqrt();

        for analog in [prototype + offset, prototype - offset] {
            let digital = (fs2 + analog) / (fs2 - analog);
            // Each section carries one s-plane zero at DC and one pole pair
            let gain = bandwidth * fs2 / (fs2 - analog).norm_sqr();
            coeffs.push(BiquadCoeffs::bandpass_section(digital, gain));
        }
    }

    trace!(order, low, high, sections = coeffs.len(), "Butterworth bandpass designed");

    Ok(FilterCascade::new(coeffs))
}

/// Digital center frequency (normalized to Nyquist) of a bandpass design
pub fn bandpass_center(low: f64, high: f64) -> f64 {
    let w1 = (PI * low / 2.0).tan();
    let w2 = (PI * high / 2.0).tan();
    2.0 / PI * (w1 * w2).sqrt().atan()
}

// ============================================================================
// CONVOLUTION
// ============================================================================

/// Full linear convolution, `signal.len() + kernel.len() - 1` samples long
///
/// Returns an empty vector if either input is empty.
pub fn convolve(signal: &[f32], kernel: &[f32]) -> Vec<f32> {
    if signal.is_empty() || kernel.is_empty() {
        return Vec::new();
    }

    if signal.len().min(kernel.len()) <= params::DIRECT_CONVOLUTION_MAX_KERNEL {
        convolve_direct(signal, kernel)
    } else {
        convolve_fft(signal, kernel)
    }
}

fn convolve_direct(signal: &[f32], kernel: &[f32]) -> Vec<f32> {
    let mut output = vec![0.0_f64; signal.len() + kernel.len() - 1];
    for (i, &s) in signal.iter().enumerate() {
        for (j, &k) in kernel.iter().enumerate() {
            output[i + j] += f64::from(s) * f64::from(k);
        }
    }
    output.into_iter().map(|v| v as f32).collect()
}

fn convolve_fft(signal: &[f32], kernel: &[f32]) -> Vec<f32> {
    let out_len = signal.len() + kernel.len() - 1;
    let fft_len = out_len.next_power_of_two();

    let mut planner = FftPlanner::<f64>::new();
    let forward = planner.plan_fft_forward(fft_len);
    let inverse = planner.plan_fft_inverse(fft_len);

    let mut a = zero_padded_spectrum_input(signal, fft_len);
    let mut b = zero_padded_spectrum_input(kernel, fft_len);
    forward.process(&mut a);
    forward.process(&mut b);

    for (x, y) in a.iter_mut().zip(b.iter()) {
        *x *= *y;
    }
    inverse.process(&mut a);

    trace!(out_len, fft_len, "FFT convolution");

    // rustfft leaves the inverse unnormalized
    let scale = 1.0 / fft_len as f64;
    a.iter().take(out_len).map(|c| (c.re * scale) as f32).collect()
}

fn zero_padded_spectrum_input(samples: &[f32], len: usize) -> Vec<Complex64> {
    let mut buffer = vec![Complex64::new(0.0, 0.0); len];
    for (slot, &s) in buffer.iter_mut().zip(samples) {
        slot.re = f64::from(s);
    }
    buffer
}

// ============================================================================
// TESTS
// ============================================================================
