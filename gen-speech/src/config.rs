//! gen-speech configuration management.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::audio::Enhancement;
use crate::audio::assembler::DEFAULT_INTER_CHUNK_SILENCE;
use crate::audio::voice::{DEFAULT_MAX_SECS, DEFAULT_MIN_SECS, VoiceBounds};
use crate::text::chunker::DEFAULT_MAX_CHUNK_LENGTH;

const DEFAULT_TARGET_SAMPLE_RATE: u32 = 24_000;
const DEFAULT_MAX_INPUT_CHARS: usize = 5000;
const DEFAULT_LANGUAGE: &str = "vi-vn";
const DEFAULT_LOAD_TIMEOUT_SECS: u64 = 600;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenSpeechConfig {
    /// Chunks stay below this many characters unless a sentence is longer
    #[serde(default = "default_max_chunk_length")]
    pub max_chunk_length: usize,

    /// Silence between merged chunks, in seconds
    #[serde(default = "default_inter_chunk_silence")]
    pub inter_chunk_silence_secs: f32,

    /// Sample rate every chunk artifact must have
    #[serde(default = "default_target_sample_rate")]
    pub target_sample_rate: u32,

    #[serde(default = "default_voice_min_secs")]
    pub voice_min_secs: f32,

    #[serde(default = "default_voice_max_secs")]
    pub voice_max_secs: f32,

    /// Extracted text beyond this many characters is dropped
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,

    /// Locale tag for normalization and synthesis
    #[serde(default = "default_language")]
    pub language: String,

    /// Backend preset name. None means the tts.toml default.
    #[serde(default)]
    pub backend: Option<String>,

    /// Preset speaker. None means the backend's default.
    #[serde(default)]
    pub speaker: Option<String>,

    /// Default voice reference audio path for cloning
    #[serde(default)]
    pub voice_ref: Option<PathBuf>,

    #[serde(default = "default_load_timeout_secs")]
    pub load_timeout_secs: u64,

    /// Extra attempts per chunk after a failure
    #[serde(default)]
    pub max_retries: u32,

    /// Parent directory for per-job working directories. None means the
    /// system temp dir.
    #[serde(default)]
    pub work_dir: Option<PathBuf>,

    #[serde(default)]
    pub enhance: Enhancement,
}

fn default_max_chunk_length() -> usize {
    DEFAULT_MAX_CHUNK_LENGTH
}

fn default_inter_chunk_silence() -> f32 {
    DEFAULT_INTER_CHUNK_SILENCE
}

fn default_target_sample_rate() -> u32 {
    DEFAULT_TARGET_SAMPLE_RATE
}

fn default_voice_min_secs() -> f32 {
    DEFAULT_MIN_SECS
}

fn default_voice_max_secs() -> f32 {
    DEFAULT_MAX_SECS
}

fn default_max_input_chars() -> usize {
    DEFAULT_MAX_INPUT_CHARS
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

fn default_load_timeout_secs() -> u64 {
    DEFAULT_LOAD_TIMEOUT_SECS
}

impl Default for GenSpeechConfig {
    fn default() -> Self {
        Self {
            max_chunk_length: default_max_chunk_length(),
            inter_chunk_silence_secs: default_inter_chunk_silence(),
            target_sample_rate: default_target_sample_rate(),
            voice_min_secs: default_voice_min_secs(),
            voice_max_secs: default_voice_max_secs(),
            max_input_chars: default_max_input_chars(),
            language: default_language(),
            backend: None,
            speaker: None,
            voice_ref: None,
            load_timeout_secs: default_load_timeout_secs(),
            max_retries: 0,
            work_dir: None,
            enhance: Enhancement::default(),
        }
    }
}

impl GenSpeechConfig {
    /// Get the config file path: ~/.config/cli-programs/gen-speech.toml
    pub fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("cli-programs")
            .join("gen-speech.toml"))
    }

    /// Load config from file, returning default if file doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: GenSpeechConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn voice_bounds(&self) -> VoiceBounds {
        VoiceBounds {
            min_secs: self.voice_min_secs,
            max_secs: self.voice_max_secs,
        }
    }

    /// The configured voice reference with a leading `~` expanded.
    pub fn voice_ref_path(&self) -> Option<PathBuf> {
        self.voice_ref.as_deref().map(expand_home)
    }
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}
