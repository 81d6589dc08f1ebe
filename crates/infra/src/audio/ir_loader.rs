//! Impulse-response library loading from WAV files

use crate::audio::wav;
use earworks_core::domain::config::ImpulseResponseEntry;
use earworks_core::domain::reverb::library::{IrLibrary, IrLoadReport};
use std::path::Path;
use tracing::warn;

/// Decode every configured IR, keeping the ones that load
///
/// Never fails as a whole: unreadable files end up in `IrLoadReport::failures`.
pub fn load_library(entries: &[ImpulseResponseEntry], base_dir: Option<&Path>) -> IrLoadReport {
    let report = IrLibrary::load(entries, base_dir, |path| wav::read_mono(path));

    if !report.is_complete() {
        warn!(
            loaded = report.library.len(),
            failed = report.failures.len(),
            "Some impulse responses could not be loaded"
        );
    }

    report
}
