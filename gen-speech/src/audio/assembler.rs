//! Concatenation of per-chunk artifacts into one buffer.

use std::path::Path;

use super::resample::resample;
use super::wav::read_wav;
use super::{AudioBuffer, AudioError};

/// Silence inserted between consecutive segments, in seconds.
pub const DEFAULT_INTER_CHUNK_SILENCE: f32 = 0.5;

/// Read `paths` in order and join them with `silence_secs` of silence.
///
/// Every segment is downmixed to mono and resampled to `target_rate` when
/// the backend wrote it at another rate. Silence goes only between
/// segments, never before the first or after the last.
pub fn merge<P: AsRef<Path>>(
    paths: &[P],
    target_rate: u32,
    silence_secs: f32,
) -> Result<AudioBuffer, AudioError> {
    if paths.is_empty() {
        return Err(AudioError::NoSegments);
    }

    let mut merged = AudioBuffer::empty(target_rate);
    for (i, path) in paths.iter().enumerate() {
        let path = path.as_ref();
        let mut segment = read_wav(path)?;

        if segment.sample_rate != target_rate {
            log::debug!(
                "Resampling {} from {} Hz to {} Hz",
                path.display(),
                segment.sample_rate,
                target_rate
            );
            segment = resample(&segment, target_rate)?;
        }

        if i > 0 {
            merged.push_silence(silence_secs);
        }
        log::debug!(
            "Merging segment {} ({:.2}s) from {}",
            i,
            segment.duration_secs(),
            path.display()
        );
        merged.samples.extend_from_slice(&segment.samples);
    }

    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::wav::write_wav;
    use tempfile::TempDir;

    fn tone(secs: f32, sample_rate: u32) -> AudioBuffer {
        let n = AudioBuffer::samples_for(secs, sample_rate);
        let samples = (0..n)
            .map(|i| (i as f32 * 0.05).sin() * 0.3)
            .collect();
        AudioBuffer::new(samples, sample_rate)
    }

    #[test]
    fn test_merged_duration_includes_gaps() {
        let dir = TempDir::new().unwrap();
        let lengths = [1.0f32, 0.25, 2.0];
        let mut paths = Vec::new();
        for (i, secs) in lengths.iter().enumerate() {
            let path = dir.path().join(format!("job_{}.wav", i));
            write_wav(&path, &tone(*secs, 24_000)).unwrap();
            paths.push(path);
        }

        let merged = merge(&paths, 24_000, DEFAULT_INTER_CHUNK_SILENCE).unwrap();

        let expected: f32 = lengths.iter().sum::<f32>() + 2.0 * DEFAULT_INTER_CHUNK_SILENCE;
        assert_eq!(merged.sample_rate, 24_000);
        assert!((merged.duration_secs() - expected).abs() < 1e-3);
    }

    #[test]
    fn test_single_segment_has_no_silence() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("only.wav");
        write_wav(&path, &tone(1.0, 8_000)).unwrap();

        let merged = merge(&[&path], 8_000, 0.5).unwrap();
        assert_eq!(merged.len(), 8_000);
    }

    #[test]
    fn test_silence_sits_between_segments() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.wav");
        let b = dir.path().join("b.wav");
        write_wav(&a, &AudioBuffer::new(vec![0.5; 10], 100)).unwrap();
        write_wav(&b, &AudioBuffer::new(vec![-0.5; 10], 100)).unwrap();

        let merged = merge(&[a, b], 100, 0.1).unwrap();
        assert_eq!(merged.len(), 30);
        assert!(merged.samples[..10].iter().all(|s| *s > 0.4));
        assert!(merged.samples[10..20].iter().all(|s| *s == 0.0));
        assert!(merged.samples[20..].iter().all(|s| *s < -0.4));
    }

    #[test]
    fn test_segments_at_other_rates_are_resampled() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.wav");
        let b = dir.path().join("b.wav");
        write_wav(&a, &tone(1.0, 24_000)).unwrap();
        write_wav(&b, &tone(1.0, 22_050)).unwrap();

        let merged = merge(&[a, b], 24_000, 0.5).unwrap();
        assert_eq!(merged.sample_rate, 24_000);
        assert_eq!(merged.len(), 24_000 + 12_000 + 24_000);
    }

    #[test]
    fn test_no_segments() {
        let paths: [&Path; 0] = [];
        assert!(matches!(merge(&paths, 24_000, 0.5), Err(AudioError::NoSegments)));
    }
}
