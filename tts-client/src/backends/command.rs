//! External synthesis binary
//!
//! Runs a local TTS program (piper, a voice-cloning model CLI, ...) once per
//! chunk as a subprocess. Arguments come from a template in the backend
//! preset.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::backend::{BackendFlags, SynthesisBackend, SynthesisRequest, VoiceSelector};
use crate::config::BackendPreset;
use crate::error::{Result, TtsError};

/// Template placeholders, expanded in one pass so substituted values are
/// never expanded again.
static RE_PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{(text|output|language|lang|speaker_wav|speaker)\}").unwrap()
});

/// Backend that shells out to a synthesis binary
pub struct CommandBackend {
    program: PathBuf,
    args: Vec<String>,
    preset_args: Vec<String>,
    reference_args: Vec<String>,
    warmup_args: Vec<String>,
    text_via_stdin: bool,
    speaker: String,
    flags: BackendFlags,
}

impl CommandBackend {
    /// Build a backend from a preset.
    ///
    /// Returns an error if the program cannot be found.
    pub fn from_preset(preset: &BackendPreset) -> Result<Self> {
        let program = preset.program.clone().ok_or_else(|| {
            TtsError::ConfigError("command backend requires a 'program'".into())
        })?;
        let program = resolve_program(program)?;

        let mentions_output = preset
            .args
            .iter()
            .chain(&preset.preset_args)
            .any(|a| a.contains("{output}"));
        if !mentions_output {
            return Err(TtsError::ConfigError(
                "command backend arguments must contain an {output} placeholder".into(),
            ));
        }

        Ok(Self {
            program,
            args: preset.args.clone(),
            preset_args: preset.preset_args.clone(),
            reference_args: preset.reference_args.clone(),
            warmup_args: preset.warmup_args.clone(),
            text_via_stdin: preset.text_via_stdin,
            speaker: preset.speaker.clone().unwrap_or_else(|| "default".to_string()),
            flags: preset.flags(),
        })
    }

    /// Run the warmup step, if any. This is where engines download or load
    /// their model, so it is the slow part of initialization.
    pub async fn warm_up(&self) -> Result<()> {
        if self.warmup_args.is_empty() {
            return Ok(());
        }

        log::info!("Warming up {}", self.program.display());
        let output = self
            .command()
            .args(&self.warmup_args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| TtsError::BackendUnavailable(format!("Failed to execute: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TtsError::BackendUnavailable(format!(
                "warmup failed: {}",
                stderr.trim()
            )));
        }

        Ok(())
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        if self.flags.skip_consent {
            cmd.env("COQUI_TOS_AGREED", "1");
        }
        if self.flags.restrict_deserialization {
            cmd.env("TORCH_FORCE_WEIGHTS_ONLY_LOAD", "1");
        }
        cmd.kill_on_drop(true);
        cmd
    }

    /// Expand the argument template for one request
    fn render_args(&self, request: &SynthesisRequest, output_path: &Path) -> Result<Vec<String>> {
        let (speaker, speaker_wav, extra) = match &request.voice {
            VoiceSelector::Preset(name) => (name.clone(), String::new(), &self.preset_args),
            VoiceSelector::Reference(path) => {
                if !self.supports_voice_cloning() {
                    return Err(TtsError::UnsupportedVoice {
                        backend: self.program.display().to_string(),
                    });
                }
                (
                    self.speaker.clone(),
                    path.to_string_lossy().into_owned(),
                    &self.reference_args,
                )
            }
        };

        let lang = request
            .language
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_lowercase();
        let output = output_path.to_string_lossy();

        Ok(self
            .args
            .iter()
            .chain(extra)
            .map(|arg| {
                RE_PLACEHOLDER
                    .replace_all(arg, |caps: &Captures| match &caps[1] {
                        "text" => request.text.clone(),
                        "output" => output.to_string(),
                        "language" => request.language.clone(),
                        "lang" => lang.clone(),
                        "speaker_wav" => speaker_wav.clone(),
                        "speaker" => speaker.clone(),
                        _ => caps[0].to_string(),
                    })
                    .into_owned()
            })
            .collect())
    }
}

#[async_trait]
impl SynthesisBackend for CommandBackend {
    async fn synthesize(&self, request: &SynthesisRequest, output_path: &Path) -> Result<()> {
        if let Some(parent) = output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let args = self.render_args(request, output_path)?;
        let mut cmd = self.command();
        cmd.args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .stdin(if self.text_via_stdin {
                Stdio::piped()
            } else {
                Stdio::null()
            });

        let mut child = cmd
            .spawn()
            .map_err(|e| TtsError::CommandFailed(format!("Failed to execute: {}", e)))?;

        if self.text_via_stdin {
            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(request.text.as_bytes()).await?;
                stdin.write_all(b"\n").await?;
            }
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| TtsError::CommandFailed(format!("Failed to wait: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TtsError::CommandFailed(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )));
        }

        if !output_path.exists() {
            return Err(TtsError::CommandFailed(format!(
                "{} did not produce {}",
                self.program.display(),
                output_path.display()
            )));
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "command"
    }

    fn supports_voice_cloning(&self) -> bool {
        self.args
            .iter()
            .chain(&self.reference_args)
            .any(|a| a.contains("{speaker_wav}"))
    }

    fn default_speaker(&self) -> &str {
        &self.speaker
    }
}

/// Find the program on disk or in PATH
fn resolve_program(program: PathBuf) -> Result<PathBuf> {
    if program.components().count() > 1 || program.is_absolute() {
        if !program.exists() {
            return Err(TtsError::BackendUnavailable(format!(
                "Synthesis program not found at specified path: {}",
                program.display()
            )));
        }
        return Ok(program);
    }

    which::which(&program).map_err(|_| {
        TtsError::BackendUnavailable(format!(
            "Synthesis program '{}' not found in PATH",
            program.display()
        ))
    })
}
