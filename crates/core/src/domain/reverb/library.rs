//! Named impulse-response set
//!
//! IRs are loaded once at start-up. A file that fails to load is reported and
//! skipped; the library then only offers the names that did load.

use crate::domain::audio::{AudioError, Result, SampleBuffer};
use crate::domain::config::ImpulseResponseEntry;
use crate::domain::reverb::ImpulseResponse;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Loaded impulse responses keyed by name
#[derive(Debug, Clone, Default)]
pub struct IrLibrary {
    responses: BTreeMap<String, Arc<ImpulseResponse>>,
}

impl IrLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an impulse response under its own name
    pub fn insert(&mut self, response: ImpulseResponse) {
        self.responses
            .insert(response.name().to_string(), Arc::new(response));
    }

    /// Look up a loaded IR; names that never loaded are a configuration error
    pub fn get(&self, name: &str) -> Result<Arc<ImpulseResponse>> {
        self.responses
            .get(name)
            .cloned()
            .ok_or_else(|| AudioError::UnknownReverb(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.responses.contains_key(name)
    }

    /// Names in sorted order
    pub fn names(&self) -> Vec<String> {
        self.responses.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    /// Load every entry with `loader`, keeping whatever succeeds
    ///
    /// Relative paths are resolved against `base_dir` when one is given.
    pub fn load<F>(entries: &[ImpulseResponseEntry], base_dir: Option<&Path>, mut loader: F) -> IrLoadReport
    where
        F: FnMut(&Path) -> Result<SampleBuffer>,
    {
        let mut library = IrLibrary::new();
        let mut failures = Vec::new();

        for entry in entries {
            let path = match base_dir {
                Some(dir) if entry.path.is_relative() => dir.join(&entry.path),
                _ => entry.path.clone(),
            };

            match loader(&path).and_then(|buffer| ImpulseResponse::new(entry.name.clone(), buffer)) {
                Ok(response) => {
                    info!(
                        name = %entry.name,
                        path = %path.display(),
                        samples = response.len(),
                        "Impulse response loaded"
                    );
                    library.insert(response);
                }
                Err(e) => {
                    warn!(
                        name = %entry.name,
                        path = %path.display(),
                        error = %e,
                        "Impulse response unavailable"
                    );
                    failures.push(IrLoadFailure {
                        name: entry.name.clone(),
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }

        IrLoadReport { library, failures }
    }
}

/// An IR that could not be loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrLoadFailure {
    pub name: String,
    pub path: PathBuf,
    pub reason: String,
}

/// Partial-success result of loading an IR set
#[derive(Debug, Clone)]
pub struct IrLoadReport {
    pub library: IrLibrary,
    pub failures: Vec<IrLoadFailure>,
}

impl IrLoadReport {
    pub fn loaded_names(&self) -> Vec<String> {
        self.library.names()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}
