//! Document loading and text extraction.
//!
//! Two formats are recognized: plain text and Word `.docx` files, whose
//! paragraphs become lines of the extracted text.

use once_cell::sync::Lazy;
use regex::Regex;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::text::cleaner::clean_text;

/// Extraction errors.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported document format: {0} (expected .txt or .docx)")]
    UnsupportedFormat(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Document is not valid UTF-8 text")]
    InvalidUtf8,

    #[error("Malformed .docx document: {0}")]
    Docx(String),
}

/// Declared format of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    PlainText,
    Docx,
}

impl DocumentFormat {
    /// Detect the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, ExtractionError> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "txt" | "text" | "md" => Ok(Self::PlainText),
            "docx" => Ok(Self::Docx),
            "" => Err(ExtractionError::UnsupportedFormat(path.display().to_string())),
            other => Err(ExtractionError::UnsupportedFormat(format!(".{}", other))),
        }
    }
}

/// Raw document bytes plus their format.
#[derive(Debug, Clone)]
pub struct Document {
    pub bytes: Vec<u8>,
    pub format: DocumentFormat,
}

impl Document {
    pub fn new(bytes: Vec<u8>, format: DocumentFormat) -> Self {
        Self { bytes, format }
    }

    /// Load a document from disk, detecting its format by extension.
    pub fn open(path: &Path) -> Result<Self, ExtractionError> {
        let format = DocumentFormat::from_path(path)?;
        let bytes = std::fs::read(path).map_err(|source| ExtractionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(bytes, format))
    }

    /// Extract cleaned plain text, consuming the document.
    pub fn extract(self) -> Result<String, ExtractionError> {
        let raw = match self.format {
            DocumentFormat::PlainText => {
                String::from_utf8(self.bytes).map_err(|_| ExtractionError::InvalidUtf8)?
            }
            DocumentFormat::Docx => docx_to_text(&self.bytes)?,
        };
        Ok(clean_text(&raw))
    }
}

/// Load and extract a document in one step.
pub fn extract(path: &Path) -> Result<String, ExtractionError> {
    Document::open(path)?.extract()
}

static RE_PARAGRAPH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<w:p(?:\s[^>]*)?/>|<w:p[\s>].*?</w:p>").unwrap());
static RE_RUN_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<w:t(?:\s[^>]*)?>(?P<text>[^<]*)</w:t>|<w:(?P<tab>tab)/>|<w:(?P<br>br|cr)(?:\s[^>]*)?/>")
        .unwrap()
});
static RE_ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(?:#(?P<dec>[0-9]+)|#x(?P<hex>[0-9a-fA-F]+)|(?P<name>[a-z]+));").unwrap());

/// Pull paragraph text out of a .docx archive.
fn docx_to_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractionError::Docx(format!("not a zip archive: {}", e)))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|_| ExtractionError::Docx("word/document.xml is missing".to_string()))?
        .read_to_string(&mut xml)
        .map_err(|e| ExtractionError::Docx(format!("unreadable document.xml: {}", e)))?;

    let paragraphs: Vec<String> = RE_PARAGRAPH
        .find_iter(&xml)
        .map(|p| paragraph_text(p.as_str()))
        .collect();

    Ok(paragraphs.join("\n"))
}

fn paragraph_text(paragraph: &str) -> String {
    let mut text = String::new();
    for caps in RE_RUN_TOKEN.captures_iter(paragraph) {
        if let Some(t) = caps.name("text") {
            text.push_str(&decode_entities(t.as_str()));
        } else if caps.name("tab").is_some() {
            text.push('\t');
        } else if caps.name("br").is_some() {
            text.push('\n');
        }
    }
    text
}

/// Decode the XML entities Word emits.
fn decode_entities(text: &str) -> String {
    RE_ENTITY
        .replace_all(text, |caps: &regex::Captures| {
            let decoded = if let Some(dec) = caps.name("dec") {
                dec.as_str().parse::<u32>().ok().and_then(char::from_u32)
            } else if let Some(hex) = caps.name("hex") {
                u32::from_str_radix(hex.as_str(), 16)
                    .ok()
                    .and_then(char::from_u32)
            } else {
                match caps.name("name").map(|m| m.as_str()) {
                    Some("amp") => Some('&'),
                    Some("lt") => Some('<'),
                    Some("gt") => Some('>'),
                    Some("quot") => Some('"'),
                    Some("apos") => Some('\''),
                    _ => None,
                }
            };
            decoded
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
