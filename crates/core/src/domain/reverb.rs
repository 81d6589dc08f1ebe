//! Convolution reverb with named impulse responses
//!
//! The reverb returns the full linear convolution, tail included. Cutting the
//! result back to the clip length is left to whoever plays it.

pub mod library;

use crate::domain::audio::{AudioError, Result, SampleBuffer};
use crate::domain::dsp::{convolve, Effect};
use tracing::{trace, warn};

/// A mono impulse response tagged with its display name
///
/// Read-only once built; share it by reference across any number of
/// convolutions.
#[derive(Debug, Clone, PartialEq)]
pub struct ImpulseResponse {
    name: String,
    buffer: SampleBuffer,
}

impl ImpulseResponse {
    pub fn new(name: impl Into<String>, buffer: SampleBuffer) -> Result<Self> {
        let name = name.into();
        if buffer.is_empty() {
            return Err(AudioError::EmptyBuffer(format!("impulse response '{name}'")));
        }
        Ok(Self { name, buffer })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }

    pub fn samples(&self) -> &[f32] {
        self.buffer.samples()
    }

    pub fn sample_rate(&self) -> u32 {
        self.buffer.sample_rate()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

/// Full linear convolution with an impulse response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvolutionReverb;

impl Effect for ConvolutionReverb {
    type Parameter = ImpulseResponse;
    type Output = SampleBuffer;

    /// Output is `clip.len() + ir.len() - 1` samples, rescaled only if it clips
    fn apply(&self, clip: &SampleBuffer, ir: &ImpulseResponse) -> Result<SampleBuffer> {
        if clip.is_empty() {
            return Err(AudioError::EmptyBuffer("reverb input clip".to_string()));
        }

        if ir.sample_rate() != clip.sample_rate() {
            warn!(
                ir = ir.name(),
                ir_rate = ir.sample_rate(),
                clip_rate = clip.sample_rate(),
                "Impulse response sample rate differs from clip; convolving without resampling"
            );
        }

        let mut wet = SampleBuffer::new(convolve(clip.samples(), ir.samples()), clip.sample_rate());
        let rescaled = wet.normalize_if_clipping();

        trace!(
            ir = ir.name(),
            clip_len = clip.len(),
            output_len = wet.len(),
            rescaled_from = rescaled,
            "Reverb applied"
        );

        Ok(wet)
    }

    fn name(&self) -> &str {
        "Convolution Reverb"
    }
}
