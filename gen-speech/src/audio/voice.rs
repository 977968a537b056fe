//! Voice-reference validation.
//!
//! A reference clip is accepted when it is a readable WAV file whose
//! duration lies within [`VoiceBounds`]. Accepted clips are passed on
//! untouched.

use hound::WavReader;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default shortest accepted reference, in seconds.
pub const DEFAULT_MIN_SECS: f32 = 3.0;
/// Default longest accepted reference, in seconds.
pub const DEFAULT_MAX_SECS: f32 = 10.0;

/// Reasons a voice reference is rejected.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Cannot read voice reference {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },

    #[error("Voice reference is too short: {duration:.2}s (minimum {min:.1}s)")]
    TooShort { duration: f32, min: f32 },

    #[error("Voice reference is too long: {duration:.2}s (maximum {max:.1}s)")]
    TooLong { duration: f32, max: f32 },

    #[error("Invalid voice reference format: {0}")]
    InvalidFormat(String),
}

/// Accepted duration range for a reference clip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceBounds {
    pub min_secs: f32,
    pub max_secs: f32,
}

impl Default for VoiceBounds {
    fn default() -> Self {
        Self {
            min_secs: DEFAULT_MIN_SECS,
            max_secs: DEFAULT_MAX_SECS,
        }
    }
}

/// A reference clip that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedVoice {
    pub path: PathBuf,
    pub duration_secs: f32,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Check that `path` is a WAV file of acceptable length.
pub fn validate(path: &Path, bounds: VoiceBounds) -> Result<ValidatedVoice, ValidationError> {
    let reader = WavReader::open(path).map_err(|e| ValidationError::Unreadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let spec = reader.spec();
    if spec.sample_rate == 0 {
        return Err(ValidationError::InvalidFormat(
            "sample rate is zero".to_string(),
        ));
    }
    if spec.channels == 0 {
        return Err(ValidationError::InvalidFormat("no channels".to_string()));
    }

    // duration() counts frames, not interleaved samples
    let duration = reader.duration() as f32 / spec.sample_rate as f32;
    log::debug!(
        "Voice reference {}: {:.2}s, {} Hz, {} channel(s)",
        path.display(),
        duration,
        spec.sample_rate,
        spec.channels
    );

    if duration < bounds.min_secs {
        return Err(ValidationError::TooShort {
            duration,
            min: bounds.min_secs,
        });
    }
    if duration > bounds.max_secs {
        return Err(ValidationError::TooLong {
            duration,
            max: bounds.max_secs,
        });
    }

    Ok(ValidatedVoice {
        path: path.to_path_buf(),
        duration_secs: duration,
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    })
}
