//! The synthesis job: extraction, normalization, chunking, per-chunk
//! synthesis and merge.

mod error;
mod job;
mod orchestrator;
mod state;

pub use error::PipelineError;
pub use job::{Job, JobOptions};
pub use orchestrator::{Orchestrator, OrchestratorSettings, resolve_voice};
pub use state::{JobState, Stage};

use crate::text::cleaner::truncate_chars;
use crate::text::{Language, TextChunk, chunk_text, normalize};

/// Truncate extracted text to `max_input_chars` and normalize it.
pub fn normalize_input(text: &str, language: Language, max_input_chars: usize) -> String {
    let (text, truncated) = truncate_chars(text, max_input_chars);
    if truncated {
        log::warn!(
            "Input exceeds {} characters, the remainder is dropped",
            max_input_chars
        );
    }
    normalize(text, language)
}

/// Truncate, normalize and chunk extracted text.
pub fn prepare_chunks(
    text: &str,
    language: Language,
    max_input_chars: usize,
    max_chunk_length: usize,
) -> Vec<TextChunk> {
    chunk_text(
        &normalize_input(text, language, max_input_chars),
        max_chunk_length,
    )
}
