use gridharvest_core::{ConfigError, SkippedEntry};
use thiserror::Error;

/// Failures from the document/query layer.
#[derive(Debug, Error)]
pub enum DomError {
    #[error("invalid selector \"{selector}\": {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// The element was detached by a re-render after it was located.
    #[error("element is no longer attached to the document")]
    Stale,

    #[error("browser session error: {0}")]
    Session(String),
}

/// Required fields of a [`gridharvest_core::ProductRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    DetailUrl,
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Field::Name => write!(f, "name"),
            Field::DetailUrl => write!(f, "detail_url"),
        }
    }
}

/// Why one item node could not become a record.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("missing required field: {0}")]
    MissingField(Field),

    #[error("invalid detail URL \"{href}\": {reason}")]
    InvalidUrl { href: String, reason: String },

    #[error(transparent)]
    Dom(#[from] DomError),
}

/// An [`ExtractionError`] tagged with the node's ordinal and a best-effort
/// snapshot of its markup.
#[derive(Debug, Error)]
#[error("item {index}: {error}")]
pub struct ExtractionFailure {
    pub index: usize,
    #[source]
    pub error: ExtractionError,
    pub snapshot: Option<String>,
}

impl ExtractionFailure {
    #[must_use]
    pub fn into_skipped(self) -> SkippedEntry {
        SkippedEntry {
            index: self.index,
            error_reason: self.error.to_string(),
            raw_snapshot: self.snapshot,
        }
    }
}

/// Run-fatal failures. Everything else is recovered below the coordinator.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("document did not become ready within {waited_ms}ms")]
    NotReady { waited_ms: u64 },

    #[error("harvest cancelled before the document was ready")]
    Cancelled,

    #[error("document access failed: {0}")]
    Dom(#[from] DomError),

    #[error("store profile is unusable: {0}")]
    Profile(#[from] ConfigError),
}
