//! Sample-rate conversion for backend artifacts.

use rubato::{FftFixedIn, Resampler};

use super::{AudioBuffer, AudioError};

const CHUNK_SIZE: usize = 1024;

/// Convert `buffer` to `target_rate`.
///
/// The output holds `len * target / source` samples, aligned with the input
/// (the resampler's filter delay is trimmed off).
pub fn resample(buffer: &AudioBuffer, target_rate: u32) -> Result<AudioBuffer, AudioError> {
    if buffer.sample_rate == target_rate || buffer.is_empty() {
        return Ok(AudioBuffer::new(buffer.samples.clone(), target_rate));
    }

    let samples = &buffer.samples;
    let expected =
        (samples.len() as u64 * target_rate as u64 / buffer.sample_rate as u64) as usize;
    if expected == 0 {
        return Ok(AudioBuffer::empty(target_rate));
    }

    let mut resampler = FftFixedIn::<f32>::new(
        buffer.sample_rate as usize,
        target_rate as usize,
        CHUNK_SIZE,
        2, // sub-chunks
        1, // channels
    )
    .map_err(|e| AudioError::Resample(format!("Failed to create resampler: {}", e)))?;

    let delay = resampler.output_delay();

    let mut output = Vec::with_capacity(delay + expected + CHUNK_SIZE);
    let mut input_buffer = vec![vec![0.0f32; CHUNK_SIZE]];
    let mut output_buffer = resampler.output_buffer_allocate(true);

    let mut pos = 0;
    // keep feeding zeros past the end until the delayed tail is flushed
    while output.len() < delay + expected {
        let start = pos.min(samples.len());
        let end = (pos + CHUNK_SIZE).min(samples.len());
        let actual_len = end - start;

        input_buffer[0][..actual_len].copy_from_slice(&samples[start..end]);
        input_buffer[0][actual_len..].fill(0.0);

        let (_, out_len) = resampler
            .process_into_buffer(&input_buffer, &mut output_buffer, None)
            .map_err(|e| AudioError::Resample(format!("Resampling failed: {}", e)))?;

        output.extend_from_slice(&output_buffer[0][..out_len]);
        pos += CHUNK_SIZE;
    }

    output.drain(..delay);
    output.truncate(expected);

    Ok(AudioBuffer::new(output, target_rate))
}
