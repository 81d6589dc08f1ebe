//! Configuration management for Earworks
//!
//! This module provides:
//! - Training parameters (boost gain, clip length, pan tolerance, filter order)
//! - The named impulse-response list
//! - TOML serialization
//! - A config manager that falls back to factory defaults

use crate::domain::audio::AudioError;
use crate::domain::band_boost::BandBoost;
use crate::domain::clip::ClipExtractor;
use crate::domain::trial::TrialOracle;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, instrument};

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur during configuration operations
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<AudioError> for ConfigError {
    fn from(err: AudioError) -> Self {
        ConfigError::Invalid(err.to_string())
    }
}

/// Parameters of the training exercises
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingSettings {
    /// Gain applied to the isolated band, in dB
    pub boost_db: f32,

    /// Length of every extracted clip, in seconds
    pub clip_duration_secs: f32,

    /// Pan judging margin in percent (1..=50)
    pub pan_tolerance: u32,

    /// Butterworth prototype order for the band filter
    pub filter_order: usize,

    /// Fixed seed for reproducible trials (None = entropy)
    pub seed: Option<u64>,
}

impl Default for TrainingSettings {
    fn default() -> Self {
        Self {
            boost_db: BandBoost::DEFAULT_BOOST_DB,
            clip_duration_secs: ClipExtractor::DEFAULT_DURATION_SECS,
            pan_tolerance: TrialOracle::DEFAULT_PAN_TOLERANCE,
            filter_order: BandBoost::DEFAULT_ORDER,
            seed: None,
        }
    }
}

impl TrainingSettings {
    /// Reject values that would fail later inside the DSP core
    pub fn validate(&self) -> Result<()> {
        ClipExtractor::new(self.clip_duration_secs)?;
        BandBoost::new(self.boost_db, self.filter_order)?;
        TrialOracle::new(self.pan_tolerance)?;
        Ok(())
    }
}

/// A named impulse-response file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpulseResponseEntry {
    pub name: String,
    pub path: PathBuf,
}

/// Complete Earworks configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EarworksConfig {
    #[serde(default)]
    pub training: TrainingSettings,

    #[serde(default)]
    pub impulse_responses: Vec<ImpulseResponseEntry>,
}

impl EarworksConfig {
    /// Load configuration from TOML file
    #[instrument(skip(path))]
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading configuration");

        let contents = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.training.validate()?;

        debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Save configuration to TOML file
    #[instrument(skip(self, path))]
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        info!(path = %path.display(), "Saving configuration");

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let toml_str = toml::to_string_pretty(self)?;
        fs::write(path, toml_str)?;

        debug!("Configuration saved successfully");
        Ok(())
    }

    /// Create factory default configuration
    pub fn factory_default() -> Self {
        let impulse_responses = [
            ("Small Room", "small_room_ir.wav"),
            ("Large Hall", "large_hall_ir.wav"),
            ("Church", "church_ir.wav"),
        ]
        .into_iter()
        .map(|(name, path)| ImpulseResponseEntry {
            name: name.to_string(),
            path: PathBuf::from(path),
        })
        .collect();

        Self {
            training: TrainingSettings::default(),
            impulse_responses,
        }
    }
}

/// Configuration manager
///
/// Manages the main configuration file at `~/.config/earworks/config.toml`.
pub struct ConfigManager {
    config_dir: PathBuf,
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager rooted at `config_dir`
    pub fn new(config_dir: PathBuf) -> Self {
        let config_path = config_dir.join("config.toml");

        Self {
            config_dir,
            config_path,
        }
    }

    /// Get the default config directory path
    ///
    /// Returns `~/.config/earworks` on Linux, the platform equivalent elsewhere
    pub fn default_config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join("earworks"))
            .ok_or_else(|| ConfigError::Invalid("Could not determine config directory".to_string()))
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load configuration from file
    ///
    /// If the config file doesn't exist, writes and returns the factory default.
    /// If the config file is corrupt, backs it up and returns the factory default.
    #[instrument(skip(self))]
    pub fn load(&self) -> EarworksConfig {
        if !self.config_path.exists() {
            info!(
                path = %self.config_path.display(),
                "Config file not found, creating factory default"
            );

            let config = EarworksConfig::factory_default();
            if let Err(e) = self.save(&config) {
                error!(
                    path = %self.config_path.display(),
                    error = %e,
                    "Failed to save factory default config"
                );
            }

            return config;
        }

        match EarworksConfig::load_from_file(&self.config_path) {
            Ok(config) => config,
            Err(e) => {
                error!(
                    path = %self.config_path.display(),
                    error = %e,
                    "Failed to load config, using factory default"
                );

                let backup_path = self.config_path.with_extension("toml.corrupt");
                if let Err(copy_err) = fs::copy(&self.config_path, &backup_path) {
                    error!(
                        path = %backup_path.display(),
                        error = %copy_err,
                        "Failed to backup corrupt config"
                    );
                }

                EarworksConfig::factory_default()
            }
        }
    }

    /// Save configuration to file
    #[instrument(skip(self, config))]
    pub fn save(&self, config: &EarworksConfig) -> Result<()> {
        fs::create_dir_all(&self.config_dir)?;
        config.save_to_file(&self.config_path)
    }

    pub fn exists(&self) -> bool {
        self.config_path.exists()
    }
}
