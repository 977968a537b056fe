//! CSV batch mode: one audio file per row, collected into a ZIP archive.
//!
//! The CSV needs a `text` column; `id` and `voice` are optional. Rows with
//! empty text are skipped, rows without an id are named `line<N>` after
//! their 1-based position.

use serde::Deserialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::pipeline::{JobOptions, Orchestrator, PipelineError};

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV has no 'text' column")]
    MissingTextColumn,

    #[error("Row '{id}' failed: {source}")]
    Row {
        id: String,
        #[source]
        source: PipelineError,
    },

    #[error("Failed to write ZIP archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Deserialize)]
struct Record {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    voice: Option<String>,
}

/// One row of a batch CSV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRow {
    pub id: String,
    pub text: String,
    /// Preset speaker for this row
    pub voice: Option<String>,
}

/// What a batch run produced.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    /// Archive entry names, in row order
    pub written: Vec<String>,
    pub skipped: usize,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse batch rows from CSV data with a header line.
pub fn read_rows<R: Read>(reader: R) -> Result<Vec<BatchRow>, BatchError> {
    let mut csv = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    if !csv.headers()?.iter().any(|h| h == "text") {
        return Err(BatchError::MissingTextColumn);
    }

    let mut rows = Vec::new();
    for (i, record) in csv.deserialize::<Record>().enumerate() {
        let record = record?;
        rows.push(BatchRow {
            id: non_empty(record.id).unwrap_or_else(|| format!("line{}", i + 1)),
            text: record.text.unwrap_or_default(),
            voice: non_empty(record.voice),
        });
    }
    Ok(rows)
}

/// Archive entry name for a row id, unique within `used`.
fn entry_name(id: &str, used: &mut HashSet<String>) -> String {
    let stem: String = id
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let mut name = format!("{}.wav", stem);
    let mut n = 2;
    while !used.insert(name.clone()) {
        name = format!("{}_{}.wav", stem, n);
        n += 1;
    }
    name
}

/// Synthesize every row of `csv_path` and write the results to `zip_path`.
///
/// The first failing row aborts the batch and no archive is written.
pub async fn run_batch(
    csv_path: &Path,
    zip_path: &Path,
    orchestrator: &Orchestrator,
    options: &JobOptions,
) -> Result<BatchSummary, BatchError> {
    let rows = read_rows(File::open(csv_path)?)?;
    log::info!("Read {} row(s) from {}", rows.len(), csv_path.display());

    let scratch = tempfile::Builder::new()
        .prefix("gen-speech-batch-")
        .tempdir()?;
    let staged = scratch.path().join("batch.zip");
    let mut zip = ZipWriter::new(File::create(&staged)?);
    let file_options = SimpleFileOptions::default();

    let mut summary = BatchSummary::default();
    let mut used = HashSet::new();

    for row in &rows {
        let chunks = options.chunks(&row.text);
        if chunks.is_empty() {
            log::debug!("Skipping row '{}' with empty text", row.id);
            summary.skipped += 1;
            continue;
        }

        let name = entry_name(&row.id, &mut used);
        let audio_path = scratch.path().join(&name);
        log::info!("Row '{}': {} chunk(s) -> {}", row.id, chunks.len(), name);

        orchestrator
            .with_speaker(row.voice.clone())
            .synthesize(&chunks, &audio_path, options.language.tag(), None)
            .await
            .map_err(|source| BatchError::Row {
                id: row.id.clone(),
                source,
            })?;

        zip.start_file(name.as_str(), file_options)?;
        zip.write_all(&std::fs::read(&audio_path)?)?;
        std::fs::remove_file(&audio_path)?;
        summary.written.push(name);
    }

    zip.finish()?;

    if let Some(parent) = zip_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::copy(&staged, zip_path)?;

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenSpeechConfig;
    use crate::pipeline::OrchestratorSettings;
    use crate::text::Language;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tts_client::{MockBackend, TtsError, VoiceSelector};

    fn options() -> JobOptions {
        JobOptions::from_config(&GenSpeechConfig::default(), Language::Vietnamese)
    }

    #[test]
    fn test_read_rows() {
        let data = "id,text,voice\na,Xin chào,alice\n,Không có id,\nc,,bob\n";
        let rows = read_rows(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].voice.as_deref(), Some("alice"));
        assert_eq!(rows[1].id, "line2");
        assert_eq!(rows[1].voice, None);
        assert_eq!(rows[2].text, "");
    }

    #[test]
    fn test_read_rows_without_optional_columns() {
        let rows = read_rows("text\nMột\nHai\n".as_bytes()).unwrap();
        assert_eq!(rows[0].id, "line1");
        assert_eq!(rows[1].id, "line2");
        assert_eq!(rows[1].text, "Hai");
    }

    #[test]
    fn test_missing_text_column() {
        let err = read_rows("id,voice\n1,alice\n".as_bytes()).unwrap_err();
        assert!(matches!(err, BatchError::MissingTextColumn));
    }

    #[test]
    fn test_entry_names_are_safe_and_unique() {
        let mut used = HashSet::new();
        assert_eq!(entry_name("a", &mut used), "a.wav");
        assert_eq!(entry_name("a", &mut used), "a_2.wav");
        assert_eq!(entry_name("../x y", &mut used), ".._x_y.wav");
    }

    #[tokio::test]
    async fn test_run_batch_writes_zip() {
        let dir = TempDir::new().unwrap();
        let csv_path = dir.path().join("rows.csv");
        std::fs::write(
            &csv_path,
            "id,text,voice\nfirst,Có 2 con mèo.,alice\nempty,,\n,Dòng ba.,\n",
        )
        .unwrap();
        let zip_path = dir.path().join("out/results.zip");

        let mock = Arc::new(MockBackend::always_succeeds());
        let orchestrator = Orchestrator::new(mock.clone(), OrchestratorSettings::default());

        let summary = run_batch(&csv_path, &zip_path, &orchestrator, &options())
            .await
            .unwrap();

        assert_eq!(summary.written, vec!["first.wav", "line3.wav"]);
        assert_eq!(summary.skipped, 1);
        assert_eq!(mock.call_count(), 2);

        let requests = mock.requests();
        assert_eq!(requests[0].text, "Có hai con mèo.");
        assert_eq!(requests[0].voice, VoiceSelector::Preset("alice".to_string()));
        assert_eq!(
            requests[1].voice,
            VoiceSelector::Preset("mock-speaker".to_string())
        );

        let mut archive = zip::ZipArchive::new(File::open(&zip_path).unwrap()).unwrap();
        assert_eq!(archive.len(), 2);
        let entry = archive.by_name("line3.wav").unwrap();
        assert!(entry.size() > 44);
    }

    #[tokio::test]
    async fn test_failing_row_aborts_batch() {
        let dir = TempDir::new().unwrap();
        let csv_path = dir.path().join("rows.csv");
        std::fs::write(&csv_path, "id,text\na,Một.\nb,Hai.\nc,Ba.\n").unwrap();
        let zip_path = dir.path().join("results.zip");

        let mock = Arc::new(MockBackend::fails_on_call(
            1,
            TtsError::ApiError {
                message: "bad voice".to_string(),
                status_code: Some(400),
            },
        ));
        let orchestrator = Orchestrator::new(mock.clone(), OrchestratorSettings::default());

        let err = run_batch(&csv_path, &zip_path, &orchestrator, &options())
            .await
            .unwrap_err();

        assert!(matches!(err, BatchError::Row { ref id, .. } if id == "b"));
        assert_eq!(mock.call_count(), 2);
        assert!(!zip_path.exists());
    }
}
