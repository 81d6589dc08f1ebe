//! Mono-to-stereo linear panning

use crate::domain::audio::{AudioError, Result, SampleBuffer, StereoBuffer};
use crate::domain::dsp::Effect;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

/// Pan position in percent: -100 is hard left, 0 center, 100 hard right
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct PanPosition(i32);

impl PanPosition {
    pub const HARD_LEFT: i32 = -100;
    pub const HARD_RIGHT: i32 = 100;
    pub const CENTER: Self = Self(0);

    pub fn new(percent: i32) -> Result<Self> {
        if !(Self::HARD_LEFT..=Self::HARD_RIGHT).contains(&percent) {
            return Err(AudioError::InvalidPan(percent));
        }
        Ok(Self(percent))
    }

    pub fn percent(&self) -> i32 {
        self.0
    }

    /// Linear (left, right) gains
    ///
    /// Center gives unity on both sides; the far side reaches exactly zero at
    /// either extreme.
    pub fn gains(&self) -> (f32, f32) {
        let pan = self.0 as f32;
        let left = ((100.0 - pan) / 100.0).max(0.0);
        let right = ((100.0 + pan) / 100.0).max(0.0);
        (left, right)
    }
}

impl TryFrom<i32> for PanPosition {
    type Error = AudioError;

    fn try_from(percent: i32) -> Result<Self> {
        Self::new(percent)
    }
}

impl From<PanPosition> for i32 {
    fn from(pan: PanPosition) -> Self {
        pan.0
    }
}

impl fmt::Display for PanPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            0 => write!(f, "Center (0%)"),
            p if p < 0 => write!(f, "Left {}%", -p),
            p => write!(f, "Right {p}%"),
        }
    }
}

/// Linear gain panner
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Panner;

impl Effect for Panner {
    type Parameter = PanPosition;
    type Output = StereoBuffer;

    fn apply(&self, clip: &SampleBuffer, pan: &PanPosition) -> Result<StereoBuffer> {
        let (left_gain, right_gain) = pan.gains();

        let frames = clip
            .samples()
            .iter()
            .map(|&s| [s * left_gain, s * right_gain])
            .collect();

        let mut stereo = StereoBuffer::new(frames, clip.sample_rate());
        let rescaled = stereo.normalize_if_clipping();

        trace!(pan = pan.percent(), left_gain, right_gain, rescaled_from = rescaled, "Panning applied");

        Ok(stereo)
    }

    fn name(&self) -> &str {
        "Panning"
    }
}
