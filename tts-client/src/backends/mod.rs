//! Synthesis backend implementations

mod command;
pub mod mock;
mod narakeet;

pub use command::CommandBackend;
pub use mock::MockBackend;
pub use narakeet::NarakeetBackend;

use crate::backend::SynthesisBackend;
use crate::config::BackendPreset;
use crate::error::{Result, TtsError};

/// Supported backend types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Narakeet,
    Command,
    Mock,
}

impl BackendKind {
    /// Parse backend kind from string
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "narakeet" => Ok(Self::Narakeet),
            "command" | "cli" | "local" => Ok(Self::Command),
            "mock" => Ok(Self::Mock),
            _ => Err(TtsError::ConfigError(format!("Unknown backend kind: {}", s))),
        }
    }

    /// Get the environment variable name for this backend's API key
    pub fn env_var(&self) -> Option<&'static str> {
        match self {
            Self::Narakeet => Some("NARAKEET_API_KEY"),
            Self::Command | Self::Mock => None,
        }
    }
}

/// Create and initialize a backend instance from a preset.
///
/// Initialization may be slow (a command backend runs its warmup step here),
/// so callers normally go through [`crate::BackendRegistry`], which applies
/// the load deadline and memoizes the result.
pub async fn create_backend(preset: &BackendPreset) -> Result<Box<dyn SynthesisBackend>> {
    let kind = BackendKind::from_str(&preset.kind)?;

    match kind {
        BackendKind::Narakeet => {
            let api_key = get_api_key(preset, "NARAKEET_API_KEY", "Narakeet")?;
            Ok(Box::new(NarakeetBackend::new(
                api_key,
                preset.base_url.as_deref(),
                preset.speaker.as_deref(),
            )?))
        }
        BackendKind::Command => {
            let backend = CommandBackend::from_preset(preset)?;
            backend.warm_up().await?;
            Ok(Box::new(backend))
        }
        BackendKind::Mock => {
            let mut backend = MockBackend::always_succeeds();
            if let Some(rate) = preset.sample_rate {
                backend = backend.with_sample_rate(rate);
            }
            Ok(Box::new(backend))
        }
    }
}

/// Get API key from config or environment variable
fn get_api_key(preset: &BackendPreset, env_var: &str, backend_name: &str) -> Result<String> {
    if let Some(key) = preset.api_key.clone() {
        return Ok(key);
    }

    std::env::var(env_var).map_err(|_| TtsError::MissingApiKey {
        backend: backend_name.to_string(),
        env_var: env_var.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_from_str() {
        assert_eq!(BackendKind::from_str("Narakeet").unwrap(), BackendKind::Narakeet);
        assert_eq!(BackendKind::from_str("cli").unwrap(), BackendKind::Command);
        assert_eq!(BackendKind::from_str("mock").unwrap(), BackendKind::Mock);
        assert!(BackendKind::from_str("gradio").is_err());
    }

    #[test]
    fn test_env_var() {
        assert_eq!(BackendKind::Narakeet.env_var(), Some("NARAKEET_API_KEY"));
        assert_eq!(BackendKind::Command.env_var(), None);
    }

    #[test]
    fn test_api_key_from_preset_wins() {
        let preset = BackendPreset {
            kind: "narakeet".to_string(),
            api_key: Some("from-config".to_string()),
            ..Default::default()
        };
        let key = get_api_key(&preset, "GEN_SPEECH_TEST_UNSET_VAR", "Narakeet").unwrap();
        assert_eq!(key, "from-config");
    }

    #[test]
    fn test_missing_api_key() {
        let preset = BackendPreset {
            kind: "narakeet".to_string(),
            ..Default::default()
        };
        let err = get_api_key(&preset, "GEN_SPEECH_TEST_UNSET_VAR", "Narakeet").unwrap_err();
        assert!(matches!(err, TtsError::MissingApiKey { .. }));
        assert!(err.to_string().contains("GEN_SPEECH_TEST_UNSET_VAR"));
    }

    #[tokio::test]
    async fn test_create_mock_backend() {
        let preset = BackendPreset {
            kind: "mock".to_string(),
            sample_rate: Some(16000),
            ..Default::default()
        };
        let backend = create_backend(&preset).await.unwrap();
        assert_eq!(backend.name(), "mock");
    }
}
