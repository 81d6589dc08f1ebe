//! WAV decoding and encoding
//!
//! Integer PCM is scaled by `2^(bits - 1)`; float data passes through. Every
//! decoded file is reduced to mono by channel averaging before it reaches the
//! core. Output is always 32-bit float.

use earworks_core::domain::audio::{AudioError, Result, SampleBuffer, StereoBuffer};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::path::Path;
use tracing::{debug, info};

/// Decode a WAV file and downmix it to mono
pub fn read_mono<P: AsRef<Path>>(path: P) -> Result<SampleBuffer> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(AudioError::ResourceMissing {
            name: path.display().to_string(),
            reason: "file not found".to_string(),
        });
    }

    let mut reader = WavReader::open(path).map_err(|e| decode_error(path, e))?;
    let spec = reader.spec();

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| decode_error(path, e))?,
        SampleFormat::Int => {
            let max_value = (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f32 / max_value))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| decode_error(path, e))?
        }
    };

    let buffer = SampleBuffer::from_interleaved(&interleaved, usize::from(spec.channels), spec.sample_rate)?;

    debug!(
        path = %path.display(),
        channels = spec.channels,
        sample_rate = spec.sample_rate,
        bits = spec.bits_per_sample,
        frames = buffer.len(),
        "WAV decoded"
    );

    Ok(buffer)
}

/// Write a mono buffer as 32-bit float WAV
pub fn write_mono<P: AsRef<Path>>(path: P, buffer: &SampleBuffer) -> Result<()> {
    write_interleaved(path.as_ref(), buffer.samples(), 1, buffer.sample_rate())
}

/// Write a stereo buffer as 32-bit float WAV
pub fn write_stereo<P: AsRef<Path>>(path: P, buffer: &StereoBuffer) -> Result<()> {
    write_interleaved(path.as_ref(), &buffer.interleaved(), 2, buffer.sample_rate())
}

fn write_interleaved(path: &Path, samples: &[f32], channels: u16, sample_rate: u32) -> Result<()> {
    if sample_rate == 0 {
        return Err(AudioError::InvalidSampleRate(sample_rate));
    }

    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };

    let mut writer = WavWriter::create(path, spec).map_err(|e| encode_error(path, e))?;
    for &sample in samples {
        writer.write_sample(sample).map_err(|e| encode_error(path, e))?;
    }
    writer.finalize().map_err(|e| encode_error(path, e))?;

    info!(
        path = %path.display(),
        channels,
        sample_rate,
        frames = samples.len() / usize::from(channels),
        "WAV written"
    );

    Ok(())
}

fn decode_error(path: &Path, err: hound::Error) -> AudioError {
    match err {
        hound::Error::IoError(io) if io.kind() == std::io::ErrorKind::NotFound => AudioError::ResourceMissing {
            name: path.display().to_string(),
            reason: io.to_string(),
        },
        other => AudioError::Decode(format!("{}: {other}", path.display())),
    }
}

fn encode_error(path: &Path, err: hound::Error) -> AudioError {
    AudioError::Decode(format!("failed to write {}: {err}", path.display()))
}
