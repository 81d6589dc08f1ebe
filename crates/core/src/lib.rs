//! Earworks core: signal processing for ear-training stimuli
//!
//! Clip extraction, band boost, stereo panning, convolution reverb and
//! impulse-response deconvolution, plus the trial oracle that picks and judges
//! the hidden parameter of each exercise.

pub mod domain;

pub use domain::audio::{AudioError, SampleBuffer, StereoBuffer};
