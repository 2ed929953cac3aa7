//! Records produced by a single harvest run.
//!
//! The serialized labels on [`ProductRecord`] and [`SkippedEntry`] are consumed
//! by downstream tooling as-is; renaming them is a breaking change.

use serde::{Deserialize, Serialize};

/// One successfully extracted product tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Trimmed, never empty.
    #[serde(rename = "Product Name")]
    pub name: String,
    #[serde(rename = "Original Price")]
    pub original_price: Option<String>,
    #[serde(rename = "Sale Price")]
    pub sale_price: Option<String>,
    #[serde(rename = "Image URL")]
    pub image_url: Option<String>,
    /// Always absolute.
    #[serde(rename = "Product Display Page URL")]
    pub detail_url: String,
    #[serde(rename = "Store")]
    pub store: String,
}

/// A tile that could not be converted into a [`ProductRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedEntry {
    /// 0-based position of the tile in the item snapshot.
    pub index: usize,
    #[serde(rename = "error")]
    pub error_reason: String,
    /// Outer HTML of the tile, when it could still be serialized.
    #[serde(rename = "html")]
    pub raw_snapshot: Option<String>,
}

/// Why the pagination loop stopped probing for more items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaginationStop {
    /// Repeated probing stopped producing new content.
    Stalled,
    /// The safety ceiling on iterations was hit first.
    IterationCeiling,
    /// The run deadline passed or the run was cancelled.
    Cancelled,
}

impl std::fmt::Display for PaginationStop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaginationStop::Stalled => write!(f, "stalled"),
            PaginationStop::IterationCeiling => write!(f, "iteration_ceiling"),
            PaginationStop::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Output of one harvest: successes and failures, both in DOM order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestResult {
    pub records: Vec<ProductRecord>,
    pub skipped: Vec<SkippedEntry>,
    /// Final progress value observed by pagination (item count by default).
    pub revealed: u64,
    pub pagination_stop: PaginationStop,
    /// `true` when cancellation left some item nodes unattempted.
    pub interrupted: bool,
}

impl HarvestResult {
    /// Number of item nodes that were attempted (succeeded or skipped).
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.records.len() + self.skipped.len()
    }
}
