//! Mock synthesis backend for testing
//!
//! Writes a short sine tone per request and records every request, so tests
//! can assert on call order and arguments. It can be told to fail on chosen
//! calls to exercise error paths.

use async_trait::async_trait;
use std::f32::consts::PI;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::backend::{SynthesisBackend, SynthesisRequest};
use crate::error::{Result, TtsError};

/// A mock backend for pipeline tests and dry runs
pub struct MockBackend {
    /// Number of leading calls that fail (0 = always succeed)
    fail_count: AtomicUsize,
    /// Zero-based call index that fails (in addition to `fail_count`)
    fail_at: Option<usize>,
    /// Current call count
    call_count: AtomicUsize,
    /// Error to return on failure
    fail_with: Mutex<Option<TtsError>>,
    /// Every request received, in order
    requests: Mutex<Vec<SynthesisRequest>>,
    /// Duration of each generated artifact
    duration_secs: f32,
    sample_rate: u32,
    cloning: bool,
}

impl MockBackend {
    fn base() -> Self {
        Self {
            fail_count: AtomicUsize::new(0),
            fail_at: None,
            call_count: AtomicUsize::new(0),
            fail_with: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
            duration_secs: 1.0,
            sample_rate: 24000,
            cloning: true,
        }
    }

    /// Create a backend that always succeeds
    pub fn always_succeeds() -> Self {
        Self::base()
    }

    /// Create a backend that fails `n` times with the given error, then succeeds
    pub fn fails_then_succeeds(n: usize, error: TtsError) -> Self {
        let backend = Self::base();
        backend.fail_count.store(n, Ordering::SeqCst);
        *backend.fail_with.lock().unwrap() = Some(error);
        backend
    }

    /// Create a backend whose `index`-th call (zero-based) fails
    pub fn fails_on_call(index: usize, error: TtsError) -> Self {
        let mut backend = Self::base();
        backend.fail_at = Some(index);
        *backend.fail_with.lock().unwrap() = Some(error);
        backend
    }

    /// Set the duration of every generated artifact
    pub fn with_duration(mut self, secs: f32) -> Self {
        self.duration_secs = secs.max(0.0);
        self
    }

    /// Set the sample rate of generated artifacts
    pub fn with_sample_rate(mut self, rate: u32) -> Self {
        self.sample_rate = rate;
        self
    }

    /// Toggle voice cloning support
    pub fn with_cloning(mut self, cloning: bool) -> Self {
        self.cloning = cloning;
        self
    }

    /// Get the number of times synthesize() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Requests received so far, in call order
    pub fn requests(&self) -> Vec<SynthesisRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of samples each artifact contains
    pub fn samples_per_call(&self) -> usize {
        (self.duration_secs * self.sample_rate as f32).round() as usize
    }

    fn write_tone(&self, output_path: &Path) -> Result<()> {
        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(output_path, spec)
            .map_err(|e| TtsError::CommandFailed(format!("mock WAV create failed: {}", e)))?;

        for i in 0..self.samples_per_call() {
            let t = i as f32 / self.sample_rate as f32;
            let sample = (2.0 * PI * 220.0 * t).sin() * 0.2;
            writer
                .write_sample((sample * i16::MAX as f32) as i16)
                .map_err(|e| TtsError::CommandFailed(format!("mock WAV write failed: {}", e)))?;
        }

        writer
            .finalize()
            .map_err(|e| TtsError::CommandFailed(format!("mock WAV finalize failed: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl SynthesisBackend for MockBackend {
    async fn synthesize(&self, request: &SynthesisRequest, output_path: &Path) -> Result<()> {
        let call_num = self.call_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        let should_fail =
            call_num < self.fail_count.load(Ordering::SeqCst) || self.fail_at == Some(call_num);
        if should_fail {
            let error = self.fail_with.lock().unwrap();
            if let Some(err) = error.as_ref() {
                return Err(clone_error(err));
            }
        }

        self.write_tone(output_path)
    }

    fn name(&self) -> &'static str {
        "mock"
    }

    fn supports_voice_cloning(&self) -> bool {
        self.cloning
    }

    fn default_speaker(&self) -> &str {
        "mock-speaker"
    }
}

/// Clone a TtsError (needed because TtsError doesn't implement Clone)
fn clone_error(err: &TtsError) -> TtsError {
    match err {
        TtsError::MissingApiKey { backend, env_var } => TtsError::MissingApiKey {
            backend: backend.clone(),
            env_var: env_var.clone(),
        },
        TtsError::BackendUnavailable(s) => TtsError::BackendUnavailable(s.clone()),
        TtsError::LoadTimeout { backend, timeout } => TtsError::LoadTimeout {
            backend: backend.clone(),
            timeout: *timeout,
        },
        TtsError::RateLimited { retry_after } => TtsError::RateLimited {
            retry_after: *retry_after,
        },
        TtsError::ServerOverloaded { message } => TtsError::ServerOverloaded {
            message: message.clone(),
        },
        TtsError::ApiError {
            message,
            status_code,
        } => TtsError::ApiError {
            message: message.clone(),
            status_code: *status_code,
        },
        TtsError::CommandFailed(s) => TtsError::CommandFailed(s.clone()),
        TtsError::UnsupportedVoice { backend } => TtsError::UnsupportedVoice {
            backend: backend.clone(),
        },
        TtsError::ConfigError(s) => TtsError::ConfigError(s.clone()),
        TtsError::UnknownBackend(s) => TtsError::UnknownBackend(s.clone()),
        // For Io and Toml errors, we create a generic error since they can't be cloned
        TtsError::Io(_) => TtsError::ConfigError("IO error (mock)".to_string()),
        TtsError::TomlParse(_) => TtsError::ConfigError("TOML parse error (mock)".to_string()),
        TtsError::TomlSerialize(_) => {
            TtsError::ConfigError("TOML serialize error (mock)".to_string())
        }
    }
}
