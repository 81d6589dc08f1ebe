//! Audio buffer abstractions and the DSP error taxonomy
//!
//! This module defines the sample containers that flow through every
//! processing stage. Decoding and encoding of container formats live in the
//! `infra` crate; the core only ever sees decoded float samples.

use crate::domain::dsp::{normalize_if_clipping, peak_abs};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur in the signal-processing core
#[derive(Debug, Error)]
pub enum AudioError {
    /// Band edges are not usable for filter design
    #[error("Invalid frequency band: {0}")]
    InvalidBand(String),

    /// Pan position outside -100..=100
    #[error("Pan position out of range: {0} (expected -100..=100)")]
    InvalidPan(i32),

    /// Clip duration is zero, negative or not finite
    #[error("Invalid clip duration: {0} s")]
    InvalidDuration(f32),

    /// Sample rate of zero
    #[error("Invalid sample rate: {0} Hz")]
    InvalidSampleRate(u32),

    /// Any other rejected parameter
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Requested a reverb type that was never loaded
    #[error("Unknown reverb: {0}")]
    UnknownReverb(String),

    /// An operation needs at least one sample
    #[error("Empty buffer: {0}")]
    EmptyBuffer(String),

    /// Guess kind does not match the trial's ground truth kind
    #[error("Guess mismatch: expected a {expected} guess, got {actual}")]
    GuessMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// A guess was submitted for a trial that is no longer active
    #[error("Stale trial: trial {submitted} is not the active trial")]
    StaleTrial { submitted: u64 },

    /// A named resource (IR file, source file) could not be found
    #[error("Resource missing: {name} ({reason})")]
    ResourceMissing { name: String, reason: String },

    /// The external decoder rejected the data
    #[error("Decode error: {0}")]
    Decode(String),
}

impl AudioError {
    /// Whether this error belongs to the configuration family
    ///
    /// Configuration errors are rejected before any signal processing runs.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            AudioError::InvalidBand(_)
                | AudioError::InvalidPan(_)
                | AudioError::InvalidDuration(_)
                | AudioError::InvalidSampleRate(_)
                | AudioError::InvalidConfiguration(_)
                | AudioError::UnknownReverb(_)
                | AudioError::GuessMismatch { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, AudioError>;

/// Single-channel audio with its sample rate
///
/// Values are nominally in [-1.0, 1.0]; effects may exceed this transiently
/// before their normalization step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl SampleBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// All-zero buffer of `len` samples
    pub fn silence(len: usize, sample_rate: u32) -> Self {
        Self::new(vec![0.0; len], sample_rate)
    }

    /// Reduce interleaved multi-channel audio to mono by channel average
    ///
    /// `interleaved` must hold whole frames of `channels` samples.
    pub fn from_interleaved(interleaved: &[f32], channels: usize, sample_rate: u32) -> Result<Self> {
        if channels == 0 {
            return Err(AudioError::InvalidConfiguration(
                "channel count must be at least 1".to_string(),
            ));
        }
        if interleaved.len() % channels != 0 {
            return Err(AudioError::InvalidConfiguration(format!(
                "{} samples do not split into {channels}-channel frames",
                interleaved.len()
            )));
        }

        if channels == 1 {
            return Ok(Self::new(interleaved.to_vec(), sample_rate));
        }

        let scale = 1.0 / channels as f32;
        let samples = interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() * scale)
            .collect();

        Ok(Self::new(samples, sample_rate))
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds (0.0 when the sample rate is zero)
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.samples.len() as f32 / self.sample_rate as f32
        }
    }

    /// Peak absolute sample value
    pub fn peak(&self) -> f32 {
        peak_abs(&self.samples)
    }

    /// Scale down to unit peak if the peak exceeds 1.0
    ///
    /// Returns the peak that triggered the rescale, if any.
    pub fn normalize_if_clipping(&mut self) -> Option<f32> {
        normalize_if_clipping(&mut self.samples)
    }

    /// Copy of the first `len` samples (or the whole buffer if shorter)
    pub fn truncated(&self, len: usize) -> Self {
        let end = len.min(self.samples.len());
        Self::new(self.samples[..end].to_vec(), self.sample_rate)
    }
}

/// Two-channel audio stored as (left, right) frames
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StereoBuffer {
    frames: Vec<[f32; 2]>,
    sample_rate: u32,
}

impl StereoBuffer {
    pub fn new(frames: Vec<[f32; 2]>, sample_rate: u32) -> Self {
        Self {
            frames,
            sample_rate,
        }
    }

    pub fn frames(&self) -> &[[f32; 2]] {
        &self.frames
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of frames (equal to the mono sample count it was built from)
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn left(&self) -> impl Iterator<Item = f32> + '_ {
        self.frames.iter().map(|frame| frame[0])
    }

    pub fn right(&self) -> impl Iterator<Item = f32> + '_ {
        self.frames.iter().map(|frame| frame[1])
    }

    /// Flatten to `L R L R ...` order
    pub fn interleaved(&self) -> Vec<f32> {
        self.frames.iter().flat_map(|frame| frame.iter().copied()).collect()
    }

    /// Peak absolute value across both channels
    pub fn peak(&self) -> f32 {
        self.frames
            .iter()
            .flat_map(|frame| frame.iter())
            .fold(0.0_f32, |peak, s| peak.max(s.abs()))
    }

    /// Scale both channels together if the joint peak exceeds 1.0
    pub fn normalize_if_clipping(&mut self) -> Option<f32> {
        let peak = self.peak();
        if peak > 1.0 {
            let scale = 1.0 / peak;
            for frame in &mut self.frames {
                frame[0] *= scale;
                frame[1] *= scale;
            }
            Some(peak)
        } else {
            None
        }
    }
}
