//! WAV reading and writing via hound.

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::path::Path;

use super::{AudioBuffer, AudioError};

/// Read a WAV file as mono `f32`, averaging channels.
pub fn read_wav(path: &Path) -> Result<AudioBuffer, AudioError> {
    let read_err = |source| AudioError::Read {
        path: path.to_path_buf(),
        source,
    };

    let reader = WavReader::open(path).map_err(read_err)?;
    let spec = reader.spec();

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(read_err)?,
        SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|s| s as f32 / max_val))
                .collect::<Result<_, _>>()
                .map_err(read_err)?
        }
    };

    Ok(AudioBuffer::new(
        downmix(&interleaved, spec.channels),
        spec.sample_rate,
    ))
}

/// Average interleaved frames into a single channel.
pub fn downmix(interleaved: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks(channels as usize)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

/// Write a buffer as 16-bit PCM mono, creating parent directories.
pub fn write_wav(path: &Path, buffer: &AudioBuffer) -> Result<(), AudioError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let write_err = |source| AudioError::Write {
        path: path.to_path_buf(),
        source,
    };

    let spec = WavSpec {
        channels: 1,
        sample_rate: buffer.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec).map_err(write_err)?;
    for &sample in &buffer.samples {
        let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer.write_sample(value).map_err(write_err)?;
    }
    writer.finalize().map_err(write_err)?;

    Ok(())
}
