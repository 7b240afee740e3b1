use serde::Serialize;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use steamscope_models::{ApiReview, ReviewRecord};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    /// Pick the format from the file extension, defaulting to CSV.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ExportFormat::Json,
            _ => ExportFormat::Csv,
        }
    }
}

/// Flatten per-session results into one ordered sequence. Sessions are
/// concatenated in the given order; nothing is deduplicated across them.
pub fn flatten_sessions<I>(sessions: I) -> Vec<ReviewRecord>
where
    I: IntoIterator<Item = Vec<ReviewRecord>>,
{
    sessions.into_iter().flatten().collect()
}

/// Write records as CSV with a header row; columns follow [`ReviewRecord`]'s
/// field order.
pub fn write_csv<W: Write>(writer: W, records: &[ReviewRecord]) -> Result<(), ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for record in records {
        csv_writer.serialize(record)?;
    }
    csv_writer.flush().map_err(|source| ExportError::Io {
        path: PathBuf::from("<writer>"),
        source,
    })?;
    Ok(())
}

pub fn read_csv<R: Read>(reader: R) -> Result<Vec<ReviewRecord>, ExportError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut records = Vec::new();
    for row in csv_reader.deserialize() {
        records.push(row?);
    }
    Ok(records)
}

pub fn write_json<W: Write, T: Serialize>(writer: W, items: &[T]) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(writer, items)?;
    Ok(())
}

fn create_file(path: &Path) -> Result<std::fs::File, ExportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| ExportError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::File::create(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Write records to `path`, creating parent directories.
pub fn export_reviews(path: &Path, records: &[ReviewRecord], format: ExportFormat) -> Result<(), ExportError> {
    let file = create_file(path)?;
    match format {
        ExportFormat::Csv => write_csv(file, records)?,
        ExportFormat::Json => write_json(file, records)?,
    }
    info!("Exported {} reviews to {}", records.len(), path.display());
    Ok(())
}

pub fn load_reviews_csv(path: &Path) -> Result<Vec<ReviewRecord>, ExportError> {
    let file = std::fs::File::open(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_csv(file)
}

/// Convert records for the API payload; `game_name` is used when a record
/// carries no title of its own.
pub fn to_api_reviews(records: &[ReviewRecord], game_name: &str) -> Vec<ApiReview> {
    records
        .iter()
        .map(|r| ApiReview::from_record(r, r.game_title.as_deref().unwrap_or(game_name)))
        .collect()
}
