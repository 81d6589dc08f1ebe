//! Ground-truth selection and guess judging
//!
//! The oracle is stateless apart from its pan tolerance. Randomness comes
//! from the caller's generator so seeded runs are reproducible.

use crate::domain::audio::{AudioError, Result};
use crate::domain::panning::PanPosition;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

/// The set a trial's hidden parameter is drawn from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterSpace {
    /// Indices `0..count` into a band list
    Bands { count: usize },
    /// Integer pan positions in -100..=100
    Pan,
    /// Names of loaded impulse responses
    Reverbs { names: Vec<String> },
}

/// A hidden parameter, or a listener's guess at one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum GroundTruth {
    Band(usize),
    Pan(PanPosition),
    Reverb(String),
}

impl GroundTruth {
    fn kind(&self) -> &'static str {
        match self {
            GroundTruth::Band(_) => "band",
            GroundTruth::Pan(_) => "pan",
            GroundTruth::Reverb(_) => "reverb",
        }
    }
}

impl fmt::Display for GroundTruth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroundTruth::Band(index) => write!(f, "band {index}"),
            GroundTruth::Pan(pan) => write!(f, "{pan}"),
            GroundTruth::Reverb(name) => write!(f, "{name}"),
        }
    }
}

/// Outcome of judging one guess
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuessResult {
    pub correct: bool,
    pub ground_truth: GroundTruth,
}

/// Picks hidden parameters and judges guesses against them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialOracle {
    pan_tolerance: u32,
}

impl TrialOracle {
    pub const DEFAULT_PAN_TOLERANCE: u32 = 10;
    pub const MIN_PAN_TOLERANCE: u32 = 1;
    pub const MAX_PAN_TOLERANCE: u32 = 50;

    pub fn new(pan_tolerance: u32) -> Result<Self> {
        if !(Self::MIN_PAN_TOLERANCE..=Self::MAX_PAN_TOLERANCE).contains(&pan_tolerance) {
            return Err(AudioError::InvalidConfiguration(format!(
                "pan tolerance must be within {}..={}, got {pan_tolerance}",
                Self::MIN_PAN_TOLERANCE,
                Self::MAX_PAN_TOLERANCE
            )));
        }
        Ok(Self { pan_tolerance })
    }

    pub fn pan_tolerance(&self) -> u32 {
        self.pan_tolerance
    }

    /// Draw a uniformly random ground truth from `space`
    pub fn choose<R: Rng + ?Sized>(&self, space: &ParameterSpace, rng: &mut R) -> Result<GroundTruth> {
        let truth = match space {
            ParameterSpace::Bands { count: 0 } => {
                return Err(AudioError::InvalidConfiguration("no frequency bands to choose from".to_string()))
            }
            ParameterSpace::Bands { count } => GroundTruth::Band(rng.gen_range(0..*count)),
            ParameterSpace::Pan => GroundTruth::Pan(PanPosition::new(
                rng.gen_range(PanPosition::HARD_LEFT..=PanPosition::HARD_RIGHT),
            )?),
            ParameterSpace::Reverbs { names } => {
                let name = names.choose(rng).ok_or_else(|| {
                    AudioError::InvalidConfiguration("no impulse responses loaded".to_string())
                })?;
                GroundTruth::Reverb(name.clone())
            }
        };

        trace!(truth = %truth, "Ground truth chosen");
        Ok(truth)
    }

    /// Judge a guess with the oracle's configured pan tolerance
    pub fn judge(&self, truth: &GroundTruth, guess: &GroundTruth) -> Result<GuessResult> {
        Self::judge_with_tolerance(truth, guess, self.pan_tolerance)
    }

    /// Judge a guess: exact match for bands and reverbs, within `tolerance` for pan
    ///
    /// A tolerance of 0 demands the exact pan position.
    pub fn judge_with_tolerance(truth: &GroundTruth, guess: &GroundTruth, tolerance: u32) -> Result<GuessResult> {
        let correct = match (truth, guess) {
            (GroundTruth::Band(t), GroundTruth::Band(g)) => t == g,
            (GroundTruth::Reverb(t), GroundTruth::Reverb(g)) => t == g,
            (GroundTruth::Pan(t), GroundTruth::Pan(g)) => t.percent().abs_diff(g.percent()) <= tolerance,
            _ => {
                return Err(AudioError::GuessMismatch {
                    expected: truth.kind(),
                    actual: guess.kind(),
                })
            }
        };

        Ok(GuessResult {
            correct,
            ground_truth: truth.clone(),
        })
    }
}

impl Default for TrialOracle {
    fn default() -> Self {
        Self {
            pan_tolerance: Self::DEFAULT_PAN_TOLERANCE,
        }
    }
}
