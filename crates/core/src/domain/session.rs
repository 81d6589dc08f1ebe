//! Training session: one clip, one hidden parameter, one guess
//!
//! A `Trial` is an immutable value handed to the caller. Guesses are submitted
//! together with the trial they answer, so a guess can never be judged against
//! a clip the listener did not hear.
//!
//! ```text
//! Idle -> TrialActive -> Judged -> TrialActive -> ...
//! ```

use crate::domain::audio::{AudioError, Result, SampleBuffer, StereoBuffer};
use crate::domain::band_boost::{BandBoost, FrequencyBand};
use crate::domain::clip::{Clip, ClipExtractor};
use crate::domain::config::TrainingSettings;
use crate::domain::dsp::Effect;
use crate::domain::panning::{PanPosition, Panner};
use crate::domain::reverb::library::IrLibrary;
use crate::domain::reverb::ConvolutionReverb;
use crate::domain::trial::{GroundTruth, GuessResult, ParameterSpace, TrialOracle};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// The three ear-training exercises
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Exercise {
    BandBoost,
    Panning,
    Reverb,
}

impl Exercise {
    pub const ALL: [Exercise; 3] = [Exercise::BandBoost, Exercise::Panning, Exercise::Reverb];

    /// Parse a listener's textual answer for this exercise
    ///
    /// Band guesses are indices into the session's band list, pan guesses are
    /// signed percentages and reverb guesses are IR names.
    pub fn parse_guess(&self, text: &str) -> Result<GroundTruth> {
        let text = text.trim();
        match self {
            Exercise::BandBoost => text
                .parse::<usize>()
                .map(GroundTruth::Band)
                .map_err(|_| AudioError::InvalidBand(format!("'{text}' is not a band index"))),
            Exercise::Panning => {
                let percent = text
                    .trim_end_matches('%')
                    .parse::<i32>()
                    .map_err(|_| AudioError::InvalidConfiguration(format!("'{text}' is not a pan percentage")))?;
                Ok(GroundTruth::Pan(PanPosition::new(percent)?))
            }
            Exercise::Reverb => Ok(GroundTruth::Reverb(text.to_string())),
        }
    }
}

impl fmt::Display for Exercise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Exercise::BandBoost => "band boost",
            Exercise::Panning => "panning",
            Exercise::Reverb => "reverb",
        };
        f.write_str(name)
    }
}

/// Effect output ready to be played or written
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessedAudio {
    Mono(SampleBuffer),
    Stereo(StereoBuffer),
}

impl ProcessedAudio {
    pub fn sample_rate(&self) -> u32 {
        match self {
            ProcessedAudio::Mono(buffer) => buffer.sample_rate(),
            ProcessedAudio::Stereo(buffer) => buffer.sample_rate(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ProcessedAudio::Mono(buffer) => buffer.len(),
            ProcessedAudio::Stereo(buffer) => buffer.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cut to `clip_len` frames so original and processed play side by side
    ///
    /// Only the reverb tail is ever longer than the clip.
    pub fn for_playback(&self, clip_len: usize) -> ProcessedAudio {
        match self {
            ProcessedAudio::Mono(buffer) => ProcessedAudio::Mono(buffer.truncated(clip_len)),
            ProcessedAudio::Stereo(buffer) => ProcessedAudio::Stereo(buffer.clone()),
        }
    }
}

/// Everything the listener needs for one question
#[derive(Debug, Clone, PartialEq)]
pub struct Trial {
    id: u64,
    exercise: Exercise,
    clip: Clip,
    ground_truth: GroundTruth,
    processed: ProcessedAudio,
}

impl Trial {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn exercise(&self) -> Exercise {
        self.exercise
    }

    pub fn clip(&self) -> &Clip {
        &self.clip
    }

    /// The hidden answer; callers reveal it only after judging
    pub fn ground_truth(&self) -> &GroundTruth {
        &self.ground_truth
    }

    /// Full effect output, reverb tail included
    pub fn processed(&self) -> &ProcessedAudio {
        &self.processed
    }

    pub fn playback(&self) -> ProcessedAudio {
        self.processed.for_playback(self.clip.buffer.len())
    }
}

/// Where the session sits in the trial cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    TrialActive { trial_id: u64 },
    Judged { trial_id: u64, correct: bool },
}

/// Drives trials over one source recording
///
/// Owns the random source so that a seeded generator reproduces the same
/// sequence of clips and answers.
pub struct TrainingSession<R: Rng> {
    source: SampleBuffer,
    extractor: ClipExtractor,
    band_boost: BandBoost,
    panner: Panner,
    reverb: ConvolutionReverb,
    oracle: TrialOracle,
    bands: Vec<FrequencyBand>,
    library: IrLibrary,
    rng: R,
    state: SessionState,
    next_id: u64,
}

impl<R: Rng> TrainingSession<R> {
    pub fn new(source: SampleBuffer, settings: &TrainingSettings, library: IrLibrary, rng: R) -> Result<Self> {
        if source.sample_rate() == 0 {
            return Err(AudioError::InvalidSampleRate(0));
        }

        let bands = FrequencyBand::standard_set(source.sample_rate());

        info!(
            source_secs = source.duration_secs(),
            sample_rate = source.sample_rate(),
            bands = bands.len(),
            reverbs = library.len(),
            "Training session created"
        );

        Ok(Self {
            extractor: ClipExtractor::new(settings.clip_duration_secs)?,
            band_boost: BandBoost::new(settings.boost_db, settings.filter_order)?,
            panner: Panner,
            reverb: ConvolutionReverb,
            oracle: TrialOracle::new(settings.pan_tolerance)?,
            bands,
            library,
            source,
            rng,
            state: SessionState::Idle,
            next_id: 1,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Bands valid at the source's sample rate; band guesses index this list
    pub fn bands(&self) -> &[FrequencyBand] {
        &self.bands
    }

    pub fn reverb_names(&self) -> Vec<String> {
        self.library.names()
    }

    fn parameter_space(&self, exercise: Exercise) -> ParameterSpace {
        match exercise {
            Exercise::BandBoost => ParameterSpace::Bands {
                count: self.bands.len(),
            },
            Exercise::Panning => ParameterSpace::Pan,
            Exercise::Reverb => ParameterSpace::Reverbs {
                names: self.library.names(),
            },
        }
    }

    /// Extract a fresh clip, pick a hidden parameter and render the effect
    ///
    /// Replaces any previous trial; guesses for it become stale.
    pub fn next_trial(&mut self, exercise: Exercise) -> Result<Trial> {
        let space = self.parameter_space(exercise);
        let ground_truth = self.oracle.choose(&space, &mut self.rng)?;
        let clip = self.extractor.extract(&self.source, &mut self.rng)?;

        let processed = match &ground_truth {
            GroundTruth::Band(index) => {
                let band = self.bands.get(*index).ok_or_else(|| {
                    AudioError::InvalidBand(format!("band index {index} out of range"))
                })?;
                ProcessedAudio::Mono(render(&self.band_boost, &clip.buffer, band)?.processed)
            }
            GroundTruth::Pan(pan) => ProcessedAudio::Stereo(render(&self.panner, &clip.buffer, pan)?),
            GroundTruth::Reverb(name) => {
                let ir = self.library.get(name)?;
                ProcessedAudio::Mono(render(&self.reverb, &clip.buffer, &*ir)?)
            }
        };

        let id = self.next_id;
        self.next_id += 1;
        self.state = SessionState::TrialActive { trial_id: id };

        debug!(trial_id = id, exercise = %exercise, clip_start = clip.start, "Trial started");

        Ok(Trial {
            id,
            exercise,
            clip,
            ground_truth,
            processed,
        })
    }

    /// Judge `guess` against `trial`, which must be the active trial
    pub fn submit(&mut self, trial: &Trial, guess: &GroundTruth) -> Result<GuessResult> {
        match self.state {
            SessionState::TrialActive { trial_id } if trial_id == trial.id => {}
            _ => return Err(AudioError::StaleTrial { submitted: trial.id }),
        }

        let result = self.oracle.judge(&trial.ground_truth, guess)?;
        self.state = SessionState::Judged {
            trial_id: trial.id,
            correct: result.correct,
        };

        debug!(
            trial_id = trial.id,
            correct = result.correct,
            truth = %result.ground_truth,
            "Trial judged"
        );

        Ok(result)
    }
}

fn render<E: Effect>(effect: &E, clip: &SampleBuffer, parameter: &E::Parameter) -> Result<E::Output> {
    debug!(effect = effect.name(), clip_len = clip.len(), "Rendering");
    effect.apply(clip, parameter)
}
