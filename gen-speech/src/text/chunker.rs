//! Text chunking for TTS processing.

use once_cell::sync::Lazy;
use regex::Regex;

use super::TextChunk;

/// Default maximum chunk length in characters.
pub const DEFAULT_MAX_CHUNK_LENGTH: usize = 200;

/// Sentence-terminal punctuation followed by whitespace, or a line break.
static SENTENCE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]\s+|\n").unwrap());

/// Split text into sentence units.
///
/// Terminal punctuation stays with its sentence; surrounding whitespace is
/// trimmed and empty units are dropped.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut units = Vec::new();
    let mut start = 0;

    for m in SENTENCE_BREAK.find_iter(text) {
        // punctuation is ASCII, so +1 stays on a char boundary
        let end = if m.as_str().starts_with('\n') {
            m.start()
        } else {
            m.start() + 1
        };
        units.push(&text[start..end]);
        start = m.end();
    }
    units.push(&text[start..]);

    units
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Split text into chunks shorter than `max_len` characters.
///
/// Sentences are packed greedily: a sentence joins the current chunk while
/// the chunk stays strictly below `max_len` after appending it. A sentence
/// that alone reaches `max_len` becomes its own chunk and is never cut.
pub fn split(text: &str, max_len: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for sentence in split_sentences(text) {
        let len = sentence.chars().count();

        if current.is_empty() {
            current.push_str(sentence);
            current_len = len;
        } else if current_len + 1 + len < max_len {
            current.push(' ');
            current.push_str(sentence);
            current_len += 1 + len;
        } else {
            chunks.push(current.trim_end().to_string());
            current = sentence.to_string();
            current_len = len;
        }
    }

    // Don't forget the last chunk
    let trimmed = current.trim_end();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }

    chunks
}

/// Split text into indexed chunks ready for synthesis.
pub fn chunk_text(text: &str, max_len: usize) -> Vec<TextChunk> {
    split(text, max_len)
        .into_iter()
        .enumerate()
        .map(|(index, text)| TextChunk::new(index, text))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn squash(text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_chunk_short_text() {
        let chunks = split("Hello world. How are you?", 100);
        assert_eq!(chunks, vec!["Hello world. How are you?"]);
    }

    #[test]
    fn test_chunk_empty_text() {
        assert!(split("", 100).is_empty());
        assert!(split("   \n\n   ", 100).is_empty());
    }

    #[test]
    fn test_split_sentences() {
        let units = split_sentences("Một. Hai! Ba? Bốn\nNăm...sáu");
        assert_eq!(units, vec!["Một.", "Hai!", "Ba?", "Bốn", "Năm...sáu"]);
    }

    #[test]
    fn test_no_split_without_whitespace() {
        assert_eq!(split_sentences("3.14 là số pi"), vec!["3.14 là số pi"]);
    }

    #[test]
    fn test_packing_is_strictly_below_max() {
        // "aaaa." + " " + "bbbb." is 11 chars
        assert_eq!(split("aaaa. bbbb.", 12), vec!["aaaa. bbbb."]);
        assert_eq!(split("aaaa. bbbb.", 11), vec!["aaaa.", "bbbb."]);
    }

    #[test]
    fn test_oversized_sentence_is_kept_whole() {
        let long = "x".repeat(50);
        let text = format!("Ngắn. {} Cuối.", long);
        let chunks = split(&text, 20);
        assert_eq!(chunks, vec!["Ngắn.".to_string(), format!("{} Cuối.", long)]);
    }

    #[test]
    fn test_oversized_sentence_alone() {
        let long = format!("{}.", "y".repeat(30));
        let chunks = split(&format!("A. {} B.", long), 10);
        assert_eq!(chunks, vec!["A.".to_string(), long, "B.".to_string()]);
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        // 9 chars each, 19 with the joining space, but far more bytes
        let text = "Đường đi. Đường về.";
        assert_eq!(split(text, 20), vec!["Đường đi. Đường về."]);
    }

    #[test]
    fn test_chunk_text_indices() {
        let chunks = chunk_text("First sentence. Second sentence. Third sentence.", 20);
        assert_eq!(chunks.len(), 3);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
        }
        assert_eq!(chunks[2].text, "Third sentence.");
    }

    proptest! {
        #[test]
        fn prop_rejoin_preserves_content(
            sentences in prop::collection::vec("[a-zA-Zàáạảãđêôơư ]{1,40}[.!?]", 0..20),
            max_len in 5usize..120,
        ) {
            let text = sentences.join(" ");
            let chunks = split(&text, max_len);
            prop_assert_eq!(squash(&chunks.join(" ")), squash(&text));
        }

        #[test]
        fn prop_chunks_bounded_unless_single_sentence(
            sentences in prop::collection::vec("[a-z ]{1,60}[.!?]", 1..20),
            max_len in 5usize..80,
        ) {
            let text = sentences.join("\n");
            for chunk in split(&text, max_len) {
                prop_assert!(
                    chunk.chars().count() < max_len || split_sentences(&chunk).len() == 1,
                    "chunk {:?} exceeds {}", chunk, max_len
                );
            }
        }
    }
}
