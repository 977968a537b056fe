//! Synthesis backend library for the gen-speech workspace
//!
//! Provides a unified interface for text-to-speech engines:
//! - Narakeet (hosted API)
//! - Command (local synthesis binary such as piper or a voice-cloning CLI)
//! - Mock (tests and dry runs)

pub mod backend;
pub mod backends;
pub mod config;
pub mod error;
pub mod registry;

pub use backend::{BackendFlags, SynthesisBackend, SynthesisRequest, VoiceSelector};
pub use backends::{BackendKind, MockBackend, create_backend};
pub use config::{BackendPreset, Config};
pub use error::{Result, TtsError};
pub use registry::{BackendRegistry, DEFAULT_LOAD_TIMEOUT};
