//! Text processing for TTS: cleaning, number normalization and chunking.

pub mod chunker;
pub mod cleaner;
mod english;
pub mod language;
pub mod normalizer;
mod vietnamese;

pub use chunker::chunk_text;
pub use language::Language;
pub use normalizer::normalize;

/// A chunk of normalized text ready for synthesis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// Playback position of this chunk
    pub index: usize,
    /// The text content
    pub text: String,
}

impl TextChunk {
    /// Create a new text chunk.
    pub fn new(index: usize, text: String) -> Self {
        Self { index, text }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_chunk_creation() {
        let chunk = TextChunk::new(1, "Xin chào".to_string());
        assert_eq!(chunk.index, 1);
        assert_eq!(chunk.text, "Xin chào");
    }
}
