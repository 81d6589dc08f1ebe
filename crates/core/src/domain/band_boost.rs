//! Frequency-band boost effect
//!
//! Isolates one band with a Butterworth bandpass, amplifies it and mixes it
//! back over the dry clip. The listener's task is to name the boosted band.

use crate::domain::audio::{AudioError, Result, SampleBuffer};
use crate::domain::dsp::{self, butterworth_bandpass, db_to_gain, params, Effect};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, trace};

/// Edges of the ten standard training bands in Hz
///
/// The last band's upper edge is clamped to just below Nyquist at runtime.
pub const STANDARD_BAND_EDGES: [(f32, f32); 10] = [
    (20.0, 60.0),
    (60.0, 250.0),
    (250.0, 500.0),
    (500.0, 1000.0),
    (1000.0, 2000.0),
    (2000.0, 4000.0),
    (4000.0, 6000.0),
    (6000.0, 10000.0),
    (10000.0, 15000.0),
    (15000.0, 20000.0),
];

/// A frequency range `low_hz < high_hz`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyBand {
    low_hz: f32,
    high_hz: f32,
}

impl FrequencyBand {
    pub fn new(low_hz: f32, high_hz: f32) -> Result<Self> {
        if !(low_hz.is_finite() && high_hz.is_finite()) || low_hz <= 0.0 || low_hz >= high_hz {
            return Err(AudioError::InvalidBand(format!(
                "expected 0 < low < high, got {low_hz} Hz - {high_hz} Hz"
            )));
        }
        Ok(Self { low_hz, high_hz })
    }

    /// The standard bands usable at `sample_rate`
    ///
    /// Upper edges are clamped to `nyquist - 1`; a band whose lower edge is
    /// already at or above that limit is left out.
    pub fn standard_set(sample_rate: u32) -> Vec<Self> {
        let ceiling = sample_rate as f32 / 2.0 - 1.0;
        let bands: Vec<Self> = STANDARD_BAND_EDGES
            .iter()
            .filter_map(|&(low, high)| Self::new(low, high.min(ceiling)).ok())
            .collect();

        if bands.len() < STANDARD_BAND_EDGES.len() {
            debug!(
                sample_rate,
                available = bands.len(),
                "Sample rate too low for the full band set"
            );
        }

        bands
    }

    pub fn low_hz(&self) -> f32 {
        self.low_hz
    }

    pub fn high_hz(&self) -> f32 {
        self.high_hz
    }

    /// Edges normalized to Nyquist and clamped into the open unit interval
    pub fn normalized(&self, sample_rate: u32) -> (f64, f64) {
        let nyquist = f64::from(sample_rate) / 2.0;
        let low = (f64::from(self.low_hz) / nyquist).max(params::MIN_NORMALIZED_EDGE);
        let high = (f64::from(self.high_hz) / nyquist).min(params::MAX_NORMALIZED_EDGE);
        (low, high)
    }
}

impl fmt::Display for FrequencyBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} Hz", self.low_hz as u32, self.high_hz as u32)
    }
}

/// Dry clip alongside its boosted version
#[derive(Debug, Clone, PartialEq)]
pub struct BoostedClip {
    pub original: SampleBuffer,
    pub processed: SampleBuffer,
}

/// Bandpass boost mixed back into the dry signal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandBoost {
    boost_db: f32,
    order: usize,
}

impl BandBoost {
    pub const DEFAULT_BOOST_DB: f32 = 12.0;
    pub const DEFAULT_ORDER: usize = 4;

    pub fn new(boost_db: f32, order: usize) -> Result<Self> {
        if !boost_db.is_finite() {
            return Err(AudioError::InvalidConfiguration(format!(
                "boost must be finite, got {boost_db} dB"
            )));
        }
        if order == 0 || order % 2 != 0 {
            return Err(AudioError::InvalidConfiguration(format!(
                "filter order must be even and positive, got {order}"
            )));
        }
        Ok(Self { boost_db, order })
    }
}

impl Default for BandBoost {
    fn default() -> Self {
        Self {
            boost_db: Self::DEFAULT_BOOST_DB,
            order: Self::DEFAULT_ORDER,
        }
    }
}

impl Effect for BandBoost {
    type Parameter = FrequencyBand;
    type Output = BoostedClip;

    /// `processed = clip + gain * bandpass(clip)`, rescaled only if it clips
    ///
    /// Edges that collapse after clamping are a configuration error.
    fn apply(&self, clip: &SampleBuffer, band: &FrequencyBand) -> Result<BoostedClip> {
        let sample_rate = clip.sample_rate();
        if sample_rate == 0 {
            return Err(AudioError::InvalidSampleRate(sample_rate));
        }

        let (low, high) = band.normalized(sample_rate);
        if low >= high {
            return Err(AudioError::InvalidBand(format!(
                "{band} collapses at {sample_rate} Hz (normalized {low:.5} >= {high:.5})"
            )));
        }

        let mut cascade = butterworth_bandpass(self.order, low, high)?;
        let gain = db_to_gain(self.boost_db);

        let mut processed: Vec<f32> = cascade
            .filter(clip.samples())
            .into_iter()
            .zip(clip.samples())
            .map(|(band_sample, &dry)| dry + band_sample * gain)
            .collect();

        let rescaled = dsp::normalize_if_clipping(&mut processed);

        trace!(
            band = %band,
            boost_db = self.boost_db,
            rescaled_from = rescaled,
            "Band boost applied"
        );

        Ok(BoostedClip {
            original: clip.clone(),
            processed: SampleBuffer::new(processed, sample_rate),
        })
    }

    fn name(&self) -> &str {
        "Band Boost"
    }
}
