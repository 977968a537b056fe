use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TtsError {
    #[error(
        "API key not found for {backend}. Set {env_var} environment variable or add to config."
    )]
    MissingApiKey { backend: String, env_var: String },

    #[error("Backend not available: {0}")]
    BackendUnavailable(String),

    #[error("Backend '{backend}' did not become ready within {}s", .timeout.as_secs())]
    LoadTimeout { backend: String, timeout: Duration },

    #[error("Rate limit exceeded{}", .retry_after.map(|s| format!(". Retry after {} seconds", s)).unwrap_or_default())]
    RateLimited { retry_after: Option<u64> },

    #[error("Server overloaded (HTTP 503): {message}")]
    ServerOverloaded { message: String },

    #[error("API error{}: {message}", status_code.map(|c| format!(" (HTTP {})", c)).unwrap_or_default())]
    ApiError {
        message: String,
        status_code: Option<u16>,
    },

    #[error("Synthesis command failed: {0}")]
    CommandFailed(String),

    #[error("{backend} does not support voice cloning from a reference recording")]
    UnsupportedVoice { backend: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unknown backend: {0}")]
    UnknownBackend(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, TtsError>;
