use thiserror::Error;
use tts_client::TtsError;

use crate::audio::{AudioError, ValidationError};
use crate::document::ExtractionError;

/// Errors that abort a synthesis job.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Text extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Voice reference rejected: {0}")]
    Validation(#[from] ValidationError),

    #[error("Synthesis backend unavailable: {0}")]
    BackendUnavailable(#[source] TtsError),

    #[error("Synthesis failed on chunk {index}: {source}")]
    Synthesis {
        index: usize,
        #[source]
        source: TtsError,
    },

    #[error("Merging audio failed: {0}")]
    Merge(#[from] AudioError),

    #[error("No text to synthesize")]
    EmptyInput,

    #[error("Job directory error: {0}")]
    Io(#[from] std::io::Error),
}
