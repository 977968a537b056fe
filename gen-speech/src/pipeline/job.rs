use std::path::{Path, PathBuf};

use super::{
    JobState, Orchestrator, PipelineError, Stage, normalize_input, prepare_chunks, resolve_voice,
};
use crate::audio::VoiceBounds;
use crate::config::GenSpeechConfig;
use crate::document;
use crate::text::{Language, TextChunk, chunk_text};

/// Per-job text and voice options.
#[derive(Debug, Clone, PartialEq)]
pub struct JobOptions {
    pub language: Language,
    pub max_chunk_length: usize,
    pub max_input_chars: usize,
    pub voice_ref: Option<PathBuf>,
    pub voice_bounds: VoiceBounds,
}

impl JobOptions {
    pub fn from_config(config: &GenSpeechConfig, language: Language) -> Self {
        Self {
            language,
            max_chunk_length: config.max_chunk_length,
            max_input_chars: config.max_input_chars,
            voice_ref: config.voice_ref_path(),
            voice_bounds: config.voice_bounds(),
        }
    }

    /// Truncate, normalize and chunk `text` with these options.
    pub fn chunks(&self, text: &str) -> Vec<TextChunk> {
        prepare_chunks(
            text,
            self.language,
            self.max_input_chars,
            self.max_chunk_length,
        )
    }
}

type Observer<'a> = Box<dyn FnMut(&JobState) + 'a>;

/// One document-to-audio run.
pub struct Job<'a> {
    orchestrator: &'a Orchestrator,
    options: JobOptions,
    state: JobState,
    observer: Option<Observer<'a>>,
}

impl<'a> Job<'a> {
    pub fn new(orchestrator: &'a Orchestrator, options: JobOptions) -> Self {
        Self {
            orchestrator,
            options,
            state: JobState::Pending,
            observer: None,
        }
    }

    /// Call `observer` on every state transition.
    pub fn with_observer(mut self, observer: impl FnMut(&JobState) + 'a) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn state(&self) -> &JobState {
        &self.state
    }

    /// Run the whole pipeline for `document_path`, writing `output_path`.
    pub async fn run(
        &mut self,
        document_path: &Path,
        output_path: &Path,
    ) -> Result<PathBuf, PipelineError> {
        match self.run_stages(document_path, output_path).await {
            Ok(path) => {
                self.transition(JobState::Done);
                Ok(path)
            }
            Err(e) => {
                let stage = self.state.stage().unwrap_or(Stage::Pending);
                self.transition(JobState::Failed {
                    stage,
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn run_stages(
        &mut self,
        document_path: &Path,
        output_path: &Path,
    ) -> Result<PathBuf, PipelineError> {
        self.transition(JobState::Extracting);
        let text = document::extract(document_path)?;
        log::debug!("Extracted {} characters", text.chars().count());

        self.transition(JobState::Normalizing);
        let normalized = normalize_input(
            &text,
            self.options.language,
            self.options.max_input_chars,
        );

        self.transition(JobState::Chunking);
        let chunks = chunk_text(&normalized, self.options.max_chunk_length);
        if chunks.is_empty() {
            return Err(PipelineError::EmptyInput);
        }
        log::info!("Split text into {} chunk(s)", chunks.len());

        let orchestrator = self.orchestrator;
        let voice = resolve_voice(
            self.options.voice_ref.as_deref(),
            self.options.voice_bounds,
            orchestrator.backend(),
        );
        let language = self.options.language.tag();

        orchestrator
            .synthesize_with(
                &chunks,
                output_path,
                language,
                voice.as_ref(),
                &mut |state: &JobState| self.transition(state.clone()),
            )
            .await
    }

    fn transition(&mut self, next: JobState) {
        match &next {
            JobState::Synthesizing { current, total } => {
                log::debug!("Job state: synthesizing {}/{}", current, total)
            }
            JobState::Failed { .. } => log::error!("Job {}", next),
            other => log::debug!("Job state: {}", other),
        }
        self.state = next;
        if let Some(observer) = self.observer.as_mut() {
            observer(&self.state);
        }
    }
}
