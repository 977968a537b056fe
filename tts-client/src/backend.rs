use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::Result;

/// Which voice a backend should speak with.
///
/// A request carries exactly one selector: either a named preset voice or a
/// reference recording used for voice cloning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceSelector {
    /// Backend-provided named voice
    Preset(String),
    /// Path to a validated reference recording
    Reference(PathBuf),
}

impl VoiceSelector {
    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Reference(_))
    }
}

impl fmt::Display for VoiceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Preset(name) => write!(f, "preset '{}'", name),
            Self::Reference(path) => write!(f, "reference {}", path.display()),
        }
    }
}

/// A single chunk of text to synthesize
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    pub text: String,
    /// BCP-47 style language tag, e.g. `vi-vn`
    pub language: String,
    pub voice: VoiceSelector,
}

impl SynthesisRequest {
    pub fn new(text: impl Into<String>, language: impl Into<String>, voice: VoiceSelector) -> Self {
        Self {
            text: text.into(),
            language: language.into(),
            voice,
        }
    }
}

/// Flags passed explicitly to backend construction.
///
/// Some engines prompt for license consent or deserialize arbitrary objects
/// from checkpoints when loading. These flags let the caller opt out of
/// both without touching the engine's internals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackendFlags {
    /// Accept the engine's license terms non-interactively
    pub skip_consent: bool,
    /// Only allow plain tensor data when loading checkpoints
    pub restrict_deserialization: bool,
}

/// Trait for synthesis backends
#[async_trait]
pub trait SynthesisBackend: Send + Sync {
    /// Synthesize one chunk and write the audio artifact to `output_path`
    async fn synthesize(&self, request: &SynthesisRequest, output_path: &Path) -> Result<()>;

    /// Get the backend name for display
    fn name(&self) -> &'static str;

    /// Whether `VoiceSelector::Reference` is accepted
    fn supports_voice_cloning(&self) -> bool;

    /// Speaker used when no voice is requested explicitly
    fn default_speaker(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_selector_display() {
        let preset = VoiceSelector::Preset("mickey".to_string());
        assert_eq!(preset.to_string(), "preset 'mickey'");
        assert!(!preset.is_reference());

        let reference = VoiceSelector::Reference(PathBuf::from("/tmp/me.wav"));
        assert!(reference.is_reference());
        assert!(reference.to_string().contains("me.wav"));
    }

    #[test]
    fn test_default_flags() {
        let flags = BackendFlags::default();
        assert!(!flags.skip_consent);
        assert!(!flags.restrict_deserialization);
    }
}
