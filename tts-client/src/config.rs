use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::backend::BackendFlags;
use crate::error::{Result, TtsError};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Backend preset used when no --backend flag is provided
    #[serde(default = "default_backend")]
    pub default_backend: String,

    /// Named backend presets
    #[serde(default)]
    pub backends: HashMap<String, BackendPreset>,
}

fn default_backend() -> String {
    "narakeet".to_string()
}

/// A named backend configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendPreset {
    /// Backend kind (narakeet, command, mock)
    pub kind: String,

    /// Preset voice used when no reference recording is supplied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,

    /// API key (optional, can use env var instead)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Custom base URL (for hosted backends)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Path or name of the synthesis binary (for command backends)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<PathBuf>,

    /// Argument template, always passed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    /// Extra arguments when speaking with a preset voice
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preset_args: Vec<String>,

    /// Extra arguments when cloning from a reference recording
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reference_args: Vec<String>,

    /// Arguments for a one-off run during load (model download, warm cache)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warmup_args: Vec<String>,

    /// Feed the chunk text on stdin instead of through `{text}`
    #[serde(default)]
    pub text_via_stdin: bool,

    /// Accept engine license terms non-interactively
    #[serde(default)]
    pub skip_consent: bool,

    /// Restrict checkpoint deserialization to plain tensor data
    #[serde(default)]
    pub restrict_deserialization: bool,

    /// Output sample rate (mock backend)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<u32>,
}

impl BackendPreset {
    pub fn flags(&self) -> BackendFlags {
        BackendFlags {
            skip_consent: self.skip_consent,
            restrict_deserialization: self.restrict_deserialization,
        }
    }
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .map_err(|_| TtsError::ConfigError("HOME not set".into()))?;
        Ok(PathBuf::from(home).join(".config/cli-programs/tts.toml"))
    }

    /// Get a backend preset by name
    pub fn get_backend(&self, name: &str) -> Result<&BackendPreset> {
        self.backends
            .get(name)
            .ok_or_else(|| TtsError::UnknownBackend(name.to_string()))
    }

    /// Resolve the preset name to use, falling back to `default_backend`
    pub fn resolve_name<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        requested.unwrap_or(&self.default_backend)
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut backends = HashMap::new();

        backends.insert(
            "narakeet".to_string(),
            BackendPreset {
                kind: "narakeet".to_string(),
                speaker: Some("mickey".to_string()),
                ..Default::default()
            },
        );

        backends.insert(
            "piper".to_string(),
            BackendPreset {
                kind: "command".to_string(),
                program: Some(PathBuf::from("piper")),
                args: vec![
                    "--model".to_string(),
                    "{speaker}".to_string(),
                    "--output_file".to_string(),
                    "{output}".to_string(),
                ],
                speaker: Some("vi_VN-vais1000-medium.onnx".to_string()),
                text_via_stdin: true,
                ..Default::default()
            },
        );

        backends.insert(
            "xtts".to_string(),
            BackendPreset {
                kind: "command".to_string(),
                program: Some(PathBuf::from("tts")),
                args: vec![
                    "--model_name".to_string(),
                    "tts_models/multilingual/multi-dataset/xtts_v2".to_string(),
                    "--text".to_string(),
                    "{text}".to_string(),
                    "--language_idx".to_string(),
                    "{lang}".to_string(),
                    "--out_path".to_string(),
                    "{output}".to_string(),
                ],
                preset_args: vec!["--speaker_idx".to_string(), "{speaker}".to_string()],
                reference_args: vec!["--speaker_wav".to_string(), "{speaker_wav}".to_string()],
                warmup_args: vec!["--list_models".to_string()],
                speaker: Some("Ana Florence".to_string()),
                skip_consent: true,
                restrict_deserialization: true,
                ..Default::default()
            },
        );

        backends.insert(
            "mock".to_string(),
            BackendPreset {
                kind: "mock".to_string(),
                sample_rate: Some(24000),
                ..Default::default()
            },
        );

        Self {
            default_backend: default_backend(),
            backends,
        }
    }
}
