//! Per-chunk synthesis and merge of the artifacts into one narration.

use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tts_client::{SynthesisBackend, SynthesisRequest, TtsError, VoiceSelector};

use super::{JobState, PipelineError};
use crate::audio::voice::{self, ValidatedVoice, VoiceBounds};
use crate::audio::{self, Enhancement};
use crate::config::GenSpeechConfig;
use crate::text::TextChunk;

/// Knobs for a synthesis run.
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorSettings {
    pub target_sample_rate: u32,
    pub inter_chunk_silence_secs: f32,
    /// Extra attempts per chunk after a failure
    pub max_retries: u32,
    /// Parent of the per-job directories; system temp dir when None
    pub work_dir: Option<PathBuf>,
    /// Preset voice; the backend's default when None
    pub speaker: Option<String>,
    pub enhancement: Enhancement,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self::from(&GenSpeechConfig::default())
    }
}

impl From<&GenSpeechConfig> for OrchestratorSettings {
    fn from(config: &GenSpeechConfig) -> Self {
        Self {
            target_sample_rate: config.target_sample_rate,
            inter_chunk_silence_secs: config.inter_chunk_silence_secs,
            max_retries: config.max_retries,
            work_dir: config.work_dir.clone(),
            speaker: config.speaker.clone(),
            enhancement: config.enhance.clone(),
        }
    }
}

/// Drives a backend over a job's chunks and merges the results.
#[derive(Clone)]
pub struct Orchestrator {
    backend: Arc<dyn SynthesisBackend>,
    settings: OrchestratorSettings,
}

impl Orchestrator {
    pub fn new(backend: Arc<dyn SynthesisBackend>, settings: OrchestratorSettings) -> Self {
        Self { backend, settings }
    }

    pub fn backend(&self) -> &dyn SynthesisBackend {
        self.backend.as_ref()
    }

    /// Copy of this orchestrator speaking with another preset voice.
    pub fn with_speaker(&self, speaker: Option<String>) -> Self {
        let mut settings = self.settings.clone();
        if speaker.is_some() {
            settings.speaker = speaker;
        }
        Self::new(Arc::clone(&self.backend), settings)
    }

    /// The preset voice used when no reference applies.
    pub fn speaker(&self) -> String {
        self.settings
            .speaker
            .clone()
            .unwrap_or_else(|| self.backend.default_speaker().to_string())
    }

    /// Pick exactly one voice for every request of a job.
    pub fn voice_selector(&self, voice: Option<&ValidatedVoice>) -> VoiceSelector {
        match voice {
            Some(v) if self.backend.supports_voice_cloning() => {
                VoiceSelector::Reference(v.path.clone())
            }
            Some(_) => {
                log::warn!(
                    "{} cannot clone voices, using preset voice '{}'",
                    self.backend.name(),
                    self.speaker()
                );
                VoiceSelector::Preset(self.speaker())
            }
            None => VoiceSelector::Preset(self.speaker()),
        }
    }

    /// Synthesize `chunks` in order and write the merged narration to
    /// `output_path`.
    pub async fn synthesize(
        &self,
        chunks: &[TextChunk],
        output_path: &Path,
        language: &str,
        voice: Option<&ValidatedVoice>,
    ) -> Result<PathBuf, PipelineError> {
        self.synthesize_with(chunks, output_path, language, voice, &mut |_: &JobState| {})
            .await
    }

    /// Like [`synthesize`](Self::synthesize), reporting progress through
    /// `on_state`.
    pub async fn synthesize_with(
        &self,
        chunks: &[TextChunk],
        output_path: &Path,
        language: &str,
        voice: Option<&ValidatedVoice>,
        on_state: &mut dyn FnMut(&JobState),
    ) -> Result<PathBuf, PipelineError> {
        if chunks.is_empty() {
            return Err(PipelineError::EmptyInput);
        }

        // removed on drop, whether the job succeeds or not
        let job_dir = self.create_job_dir()?;
        let job_id = Utc::now().format("%Y%m%d_%H%M%S").to_string();
        let selector = self.voice_selector(voice);
        let total = chunks.len();

        log::info!(
            "Synthesizing {} chunk(s) with {} using {}",
            total,
            self.backend.name(),
            selector
        );
        on_state(&JobState::Synthesizing { current: 0, total });

        let mut artifacts = Vec::with_capacity(total);
        for (done, chunk) in chunks.iter().enumerate() {
            let artifact = job_dir
                .path()
                .join(format!("{}_{}.wav", job_id, chunk.index));
            let request = SynthesisRequest::new(chunk.text.clone(), language, selector.clone());

            self.synthesize_chunk(&request, &artifact)
                .await
                .map_err(|source| PipelineError::Synthesis {
                    index: chunk.index,
                    source,
                })?;

            artifacts.push(artifact);
            on_state(&JobState::Synthesizing {
                current: done + 1,
                total,
            });
        }

        on_state(&JobState::Merging);
        let mut merged = audio::merge(
            &artifacts,
            self.settings.target_sample_rate,
            self.settings.inter_chunk_silence_secs,
        )?;
        self.settings.enhancement.apply(&mut merged);
        audio::wav::write_wav(output_path, &merged)?;

        log::info!(
            "Wrote {:.1}s of audio to {}",
            merged.duration_secs(),
            output_path.display()
        );
        Ok(output_path.to_path_buf())
    }

    async fn synthesize_chunk(
        &self,
        request: &SynthesisRequest,
        artifact: &Path,
    ) -> Result<(), TtsError> {
        let mut attempt = 0;
        loop {
            log::debug!("Chunk -> {}: {:?}", artifact.display(), request.text);
            match self.backend.synthesize(request, artifact).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt < self.settings.max_retries => {
                    attempt += 1;
                    log::warn!(
                        "Synthesis attempt {} failed: {}. Retrying ({}/{})",
                        attempt,
                        e,
                        attempt,
                        self.settings.max_retries
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn create_job_dir(&self) -> std::io::Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("gen-speech-");
        match &self.settings.work_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                builder.tempdir_in(dir)
            }
            None => builder.tempdir(),
        }
    }
}

/// Validate an optional voice reference, falling back to the preset voice.
///
/// Returns the reference only when it passes validation and the backend can
/// clone voices. Every fallback is logged.
pub fn resolve_voice(
    requested: Option<&Path>,
    bounds: VoiceBounds,
    backend: &dyn SynthesisBackend,
) -> Option<ValidatedVoice> {
    let path = match requested {
        Some(path) => path,
        None => {
            log::info!("No voice reference given, using preset voice");
            return None;
        }
    };

    if !path.exists() {
        log::info!(
            "Voice reference {} not found, using preset voice",
            path.display()
        );
        return None;
    }

    if !backend.supports_voice_cloning() {
        log::warn!(
            "{} does not support voice cloning, ignoring {}",
            backend.name(),
            path.display()
        );
        return None;
    }

    match voice::validate(path, bounds) {
        Ok(voice) => {
            log::info!(
                "Using voice reference {} ({:.1}s)",
                voice.path.display(),
                voice.duration_secs
            );
            Some(voice)
        }
        Err(e) => {
            log::warn!("{}. Falling back to preset voice", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::voice::tests::write_clip;
    use crate::audio::wav::read_wav;
    use crate::pipeline::prepare_chunks;
    use crate::text::Language;
    use tts_client::MockBackend;

    fn chunks(texts: &[&str]) -> Vec<TextChunk> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| TextChunk::new(i, t.to_string()))
            .collect()
    }

    fn settings_in(dir: &Path) -> OrchestratorSettings {
        OrchestratorSettings {
            work_dir: Some(dir.join("work")),
            ..OrchestratorSettings::default()
        }
    }

    #[tokio::test]
    async fn test_end_to_end_single_call() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockBackend::always_succeeds());
        let orchestrator = Orchestrator::new(mock.clone(), settings_in(dir.path()));

        let chunks = prepare_chunks(
            "Giá 50000 VNĐ vào ngày 01/01/2024.",
            Language::Vietnamese,
            5000,
            100,
        );
        assert_eq!(chunks.len(), 1);

        let output = dir.path().join("out.wav");
        let written = orchestrator
            .synthesize(&chunks, &output, "vi-vn", None)
            .await
            .unwrap();

        assert_eq!(written, output);
        assert!(output.exists());
        assert_eq!(mock.call_count(), 1);
        let request = &mock.requests()[0];
        assert_eq!(request.text, chunks[0].text);
        assert_eq!(request.language, "vi-vn");
        assert!(!request.text.chars().any(|c| c.is_ascii_digit()));
    }

    #[tokio::test]
    async fn test_merged_duration_and_order() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockBackend::always_succeeds().with_duration(1.0));
        let orchestrator = Orchestrator::new(mock.clone(), settings_in(dir.path()));
        let output = dir.path().join("merged.wav");

        orchestrator
            .synthesize(&chunks(&["một.", "hai.", "ba."]), &output, "vi-vn", None)
            .await
            .unwrap();

        let texts: Vec<String> = mock.requests().into_iter().map(|r| r.text).collect();
        assert_eq!(texts, vec!["một.", "hai.", "ba."]);

        let merged = read_wav(&output).unwrap();
        assert_eq!(merged.sample_rate, 24_000);
        assert!((merged.duration_secs() - 4.0).abs() < 1e-3);
    }

    #[tokio::test]
    async fn test_failing_chunk_aborts_without_output() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockBackend::fails_on_call(
            1,
            TtsError::CommandFailed("engine crashed".to_string()),
        ));
        let settings = settings_in(dir.path());
        let work_dir = settings.work_dir.clone().unwrap();
        let orchestrator = Orchestrator::new(mock.clone(), settings);
        let output = dir.path().join("never.wav");

        let err = orchestrator
            .synthesize(&chunks(&["a.", "b.", "c."]), &output, "vi-vn", None)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Synthesis { index: 1, .. }));
        assert_eq!(mock.call_count(), 2);
        assert!(!output.exists());
        // per-job directory is gone
        assert_eq!(std::fs::read_dir(&work_dir).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_artifacts_removed_after_success() {
        let dir = TempDir::new().unwrap();
        let settings = settings_in(dir.path());
        let work_dir = settings.work_dir.clone().unwrap();
        let orchestrator = Orchestrator::new(Arc::new(MockBackend::always_succeeds()), settings);

        orchestrator
            .synthesize(&chunks(&["x.", "y."]), &dir.path().join("o.wav"), "vi-vn", None)
            .await
            .unwrap();

        assert_eq!(std::fs::read_dir(&work_dir).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_retries_are_opt_in() {
        let dir = TempDir::new().unwrap();
        let flaky = || {
            Arc::new(MockBackend::fails_then_succeeds(
                1,
                TtsError::ServerOverloaded {
                    message: "busy".to_string(),
                },
            ))
        };

        let mock = flaky();
        let orchestrator = Orchestrator::new(mock.clone(), settings_in(dir.path()));
        let result = orchestrator
            .synthesize(&chunks(&["a."]), &dir.path().join("a.wav"), "vi-vn", None)
            .await;
        assert!(matches!(result, Err(PipelineError::Synthesis { index: 0, .. })));
        assert_eq!(mock.call_count(), 1);

        let mock = flaky();
        let settings = OrchestratorSettings {
            max_retries: 2,
            ..settings_in(dir.path())
        };
        let orchestrator = Orchestrator::new(mock.clone(), settings);
        orchestrator
            .synthesize(&chunks(&["a.", "b."]), &dir.path().join("b.wav"), "vi-vn", None)
            .await
            .unwrap();
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_backend_at_other_rate_is_resampled() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockBackend::always_succeeds().with_sample_rate(22_050));
        let orchestrator = Orchestrator::new(mock, settings_in(dir.path()));

        let output = dir.path().join("a.wav");
        orchestrator
            .synthesize(&chunks(&["a.", "b."]), &output, "vi-vn", None)
            .await
            .unwrap();

        let merged = read_wav(&output).unwrap();
        assert_eq!(merged.sample_rate, 24_000);
        assert_eq!(merged.len(), 24_000 + 12_000 + 24_000);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockBackend::always_succeeds());
        let orchestrator = Orchestrator::new(mock.clone(), settings_in(dir.path()));

        let err = orchestrator
            .synthesize(&[], &dir.path().join("a.wav"), "vi-vn", None)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::EmptyInput));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_reference_or_preset_never_both() {
        let dir = TempDir::new().unwrap();
        let clip = dir.path().join("voice.wav");
        write_clip(&clip, 5.0, 16_000, 1);
        let voice = voice::validate(&clip, VoiceBounds::default()).unwrap();

        let cloning = Arc::new(MockBackend::always_succeeds());
        let orchestrator = Orchestrator::new(cloning.clone(), settings_in(dir.path()));
        orchestrator
            .synthesize(&chunks(&["a.", "b."]), &dir.path().join("a.wav"), "vi-vn", Some(&voice))
            .await
            .unwrap();
        for request in cloning.requests() {
            assert_eq!(request.voice, VoiceSelector::Reference(clip.clone()));
        }

        let preset_only = Arc::new(MockBackend::always_succeeds().with_cloning(false));
        let settings = OrchestratorSettings {
            speaker: Some("mickey".to_string()),
            ..settings_in(dir.path())
        };
        let orchestrator = Orchestrator::new(preset_only.clone(), settings);
        orchestrator
            .synthesize(&chunks(&["a."]), &dir.path().join("b.wav"), "vi-vn", Some(&voice))
            .await
            .unwrap();
        assert_eq!(
            preset_only.requests()[0].voice,
            VoiceSelector::Preset("mickey".to_string())
        );
    }

    #[tokio::test]
    async fn test_progress_states() {
        let dir = TempDir::new().unwrap();
        let orchestrator =
            Orchestrator::new(Arc::new(MockBackend::always_succeeds()), settings_in(dir.path()));
        let mut seen = Vec::new();

        orchestrator
            .synthesize_with(
                &chunks(&["a.", "b."]),
                &dir.path().join("a.wav"),
                "vi-vn",
                None,
                &mut |state: &JobState| seen.push(state.clone()),
            )
            .await
            .unwrap();

        assert_eq!(
            seen,
            vec![
                JobState::Synthesizing { current: 0, total: 2 },
                JobState::Synthesizing { current: 1, total: 2 },
                JobState::Synthesizing { current: 2, total: 2 },
                JobState::Merging,
            ]
        );
    }

    #[test]
    fn test_default_speaker_and_override() {
        let orchestrator = Orchestrator::new(
            Arc::new(MockBackend::always_succeeds()),
            OrchestratorSettings::default(),
        );
        assert_eq!(orchestrator.speaker(), "mock-speaker");
        let other = orchestrator.with_speaker(Some("alice".to_string()));
        assert_eq!(other.speaker(), "alice");
        assert_eq!(orchestrator.with_speaker(None).speaker(), "mock-speaker");
    }

    #[test]
    fn test_resolve_voice_fallbacks() {
        let dir = TempDir::new().unwrap();
        let cloning = MockBackend::always_succeeds();
        let bounds = VoiceBounds::default();

        assert!(resolve_voice(None, bounds, &cloning).is_none());

        let short = dir.path().join("short.wav");
        write_clip(&short, 2.0, 16_000, 1);
        assert!(resolve_voice(Some(short.as_path()), bounds, &cloning).is_none());

        let missing = dir.path().join("missing.wav");
        assert!(resolve_voice(Some(missing.as_path()), bounds, &cloning).is_none());

        let good = dir.path().join("good.wav");
        write_clip(&good, 5.0, 16_000, 1);
        let voice = resolve_voice(Some(good.as_path()), bounds, &cloning).unwrap();
        assert_eq!(voice.path, good);

        let no_cloning = MockBackend::always_succeeds().with_cloning(false);
        assert!(resolve_voice(Some(good.as_path()), bounds, &no_cloning).is_none());
    }

    #[test]
    fn test_missing_voice_reference_uses_preset_voice() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockBackend::always_succeeds());
        let orchestrator = Orchestrator::new(mock.clone(), settings_in(dir.path()));

        let missing = dir.path().join("nowhere").join("me.wav");
        let voice = resolve_voice(Some(missing.as_path()), VoiceBounds::default(), mock.as_ref());
        assert!(voice.is_none());
        assert_eq!(
            orchestrator.voice_selector(voice.as_ref()),
            VoiceSelector::Preset("mock-speaker".to_string())
        );
    }
}
