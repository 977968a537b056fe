//! Audio buffers, WAV I/O, voice-reference validation, merging and
//! post-processing.

pub mod assembler;
pub mod enhance;
pub mod resample;
pub mod voice;
pub mod wav;

pub use assembler::merge;
pub use enhance::Enhancement;
pub use voice::{ValidatedVoice, ValidationError, VoiceBounds};

use std::path::PathBuf;
use thiserror::Error;

/// Errors while reading, merging or writing audio.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Failed to read WAV {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },

    #[error("Failed to write WAV {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },

    #[error("Resampling failed: {0}")]
    Resample(String),

    #[error("No audio segments to merge")]
    NoSegments,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Mono audio samples in `[-1, 1]` at a fixed sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// An empty buffer at `sample_rate`.
    pub fn empty(sample_rate: u32) -> Self {
        Self::new(Vec::new(), sample_rate)
    }

    /// Number of samples needed for `secs` of audio at `sample_rate`.
    pub fn samples_for(secs: f32, sample_rate: u32) -> usize {
        (secs.max(0.0) * sample_rate as f32).round() as usize
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Append `secs` of silence.
    pub fn push_silence(&mut self, secs: f32) {
        let n = Self::samples_for(secs, self.sample_rate);
        self.samples.extend(std::iter::repeat_n(0.0f32, n));
    }

    /// Hard clip every sample to `[-1, 1]`.
    pub fn clip(&mut self) {
        for s in &mut self.samples {
            *s = s.clamp(-1.0, 1.0);
        }
    }
}
