//! Domain entities and signal-processing rules

pub mod audio;
pub mod band_boost;
pub mod clip;
pub mod config;
pub mod deconvolution;
pub mod dsp;
pub mod panning;
pub mod reverb;
pub mod session;
pub mod trial;

// Re-export specific items to avoid ambiguous glob imports
pub use audio::{AudioError, SampleBuffer, StereoBuffer};
pub use band_boost::{BandBoost, BoostedClip, FrequencyBand, STANDARD_BAND_EDGES};
pub use clip::{Clip, ClipExtractor};
pub use config::{ConfigError, ConfigManager, EarworksConfig, ImpulseResponseEntry, TrainingSettings};
pub use deconvolution::{ExtractedIr, ImpulseResponseExtractor};
pub use dsp::Effect;
pub use panning::{PanPosition, Panner};
pub use reverb::library::{IrLibrary, IrLoadFailure, IrLoadReport};
pub use reverb::{ConvolutionReverb, ImpulseResponse};
pub use session::{Exercise, ProcessedAudio, SessionState, TrainingSession, Trial};
pub use trial::{GroundTruth, GuessResult, ParameterSpace, TrialOracle};
