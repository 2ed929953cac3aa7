//! JSON persistence for harvest runs.
//!
//! Each run writes three files into the output directory, keyed by store slug:
//! `<slug>_products.json` and `<slug>_skipped.json` (JSON arrays, DOM order)
//! plus `<slug>_run.json` with run metadata. [`load_run`] reads them back.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::records::{HarvestResult, PaginationStop, ProductRecord, SkippedEntry};

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error on {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Locations of the artifacts for one store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub products: PathBuf,
    pub skipped: PathBuf,
    pub summary: PathBuf,
    pub failure_dump: PathBuf,
}

impl OutputPaths {
    #[must_use]
    pub fn for_store(dir: &Path, slug: &str) -> Self {
        Self {
            products: dir.join(format!("{slug}_products.json")),
            skipped: dir.join(format!("{slug}_skipped.json")),
            summary: dir.join(format!("{slug}_run.json")),
            failure_dump: dir.join(format!("{slug}_failed_dump.html")),
        }
    }
}

/// Metadata written beside the record files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub store: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub revealed: u64,
    pub records: usize,
    pub skipped: usize,
    pub pagination_stop: PaginationStop,
    pub interrupted: bool,
}

impl RunSummary {
    #[must_use]
    pub fn from_result(
        store: &str,
        result: &HarvestResult,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        Self {
            store: store.to_owned(),
            started_at,
            finished_at,
            revealed: result.revealed,
            records: result.records.len(),
            skipped: result.skipped.len(),
            pagination_stop: result.pagination_stop,
            interrupted: result.interrupted,
        }
    }
}

/// Writes the products, skipped and summary files for one run.
///
/// # Errors
///
/// Returns [`SinkError`] if the directory cannot be created or a file cannot
/// be written.
pub fn write_run(
    dir: &Path,
    slug: &str,
    result: &HarvestResult,
    summary: &RunSummary,
) -> Result<OutputPaths, SinkError> {
    std::fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;
    let paths = OutputPaths::for_store(dir, slug);

    write_json(&paths.products, &result.records)?;
    write_json(&paths.skipped, &result.skipped)?;
    write_json(&paths.summary, summary)?;

    Ok(paths)
}

/// Reads a run previously written by [`write_run`].
///
/// # Errors
///
/// Returns [`SinkError`] if any of the three files is missing or malformed.
pub fn load_run(dir: &Path, slug: &str) -> Result<HarvestResult, SinkError> {
    let paths = OutputPaths::for_store(dir, slug);
    let records: Vec<ProductRecord> = read_json(&paths.products)?;
    let skipped: Vec<SkippedEntry> = read_json(&paths.skipped)?;
    let summary: RunSummary = read_json(&paths.summary)?;

    Ok(HarvestResult {
        records,
        skipped,
        revealed: summary.revealed,
        pagination_stop: summary.pagination_stop,
        interrupted: summary.interrupted,
    })
}

/// Saves raw page source for postmortem after a fatal run failure.
///
/// # Errors
///
/// Returns [`SinkError::Io`] if the dump cannot be written.
pub fn write_failure_dump(dir: &Path, slug: &str, html: &str) -> Result<PathBuf, SinkError> {
    std::fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;
    let path = OutputPaths::for_store(dir, slug).failure_dump;
    std::fs::write(&path, html).map_err(|e| io_error(&path, e))?;
    Ok(path)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), SinkError> {
    let body = serde_json::to_string_pretty(value).map_err(|e| SinkError::Json {
        path: path.display().to_string(),
        source: e,
    })?;
    std::fs::write(path, body).map_err(|e| io_error(path, e))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, SinkError> {
    let body = std::fs::read_to_string(path).map_err(|e| io_error(path, e))?;
    serde_json::from_str(&body).map_err(|e| SinkError::Json {
        path: path.display().to_string(),
        source: e,
    })
}

fn io_error(path: &Path, source: std::io::Error) -> SinkError {
    SinkError::Io {
        path: path.display().to_string(),
        source,
    }
}
