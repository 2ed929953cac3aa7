//! The queryable-document seam the engine is written against.
//!
//! All selectors are CSS. [`static_html::StaticDocument`] serves saved pages;
//! `webdriver::WebDriverDocument` drives a live browser session.

pub mod static_html;
#[cfg(feature = "webdriver")]
pub mod webdriver;

use std::time::Duration;

use gridharvest_core::ScrollStep;
use tokio::time::Instant;

use crate::error::DomError;
use crate::pacing::RunGuard;

// The engine drives one document from a single task, so the returned futures
// carry no `Send` bound.

/// A handle to one element. Queries never mutate the element.
#[allow(async_fn_in_trait)]
pub trait ItemNode: Sized {
    /// First descendant matching `selector`, if any.
    async fn find(&self, selector: &str) -> Result<Option<Self>, DomError> {
        Ok(self.find_all(selector).await?.into_iter().next())
    }

    /// All descendants matching `selector`, in document order.
    async fn find_all(&self, selector: &str) -> Result<Vec<Self>, DomError>;

    /// Rendered text with runs of whitespace collapsed.
    async fn text(&self) -> Result<String, DomError>;

    async fn attr(&self, name: &str) -> Result<Option<String>, DomError>;

    async fn is_displayed(&self) -> Result<bool, DomError>;

    async fn outer_html(&self) -> Result<String, DomError>;
}

/// A live (or snapshotted) page.
#[allow(async_fn_in_trait)]
pub trait Document {
    type Node: ItemNode;

    async fn find_all(&self, selector: &str) -> Result<Vec<Self::Node>, DomError>;

    async fn find(&self, selector: &str) -> Result<Option<Self::Node>, DomError> {
        Ok(self.find_all(selector).await?.into_iter().next())
    }

    async fn count(&self, selector: &str) -> Result<usize, DomError> {
        Ok(self.find_all(selector).await?.len())
    }

    /// Synthetic (script-dispatched) click, so overlays cannot intercept it.
    async fn click(&self, node: &Self::Node) -> Result<(), DomError>;

    async fn scroll_by(&self, step: ScrollStep) -> Result<(), DomError>;

    async fn scroll_into_view(&self, node: &Self::Node) -> Result<(), DomError>;

    /// Total scrollable height of the document in pixels.
    async fn scroll_height(&self) -> Result<u64, DomError>;

    async fn page_source(&self) -> Result<String, DomError>;
}

/// Polls until `selector` matches at least one element.
///
/// Returns `Ok(false)` when `timeout` elapses (or the run is cancelled) first.
/// The selector is always checked at least once.
///
/// # Errors
///
/// Propagates document-access failures from the probe itself.
pub async fn wait_for<D: Document>(
    doc: &D,
    selector: &str,
    timeout: Duration,
    poll: Duration,
    guard: &RunGuard,
) -> Result<bool, DomError> {
    let deadline = Instant::now() + timeout;
    let poll = poll.max(Duration::from_millis(1));

    loop {
        if doc.count(selector).await? > 0 {
            return Ok(true);
        }
        let now = Instant::now();
        if now >= deadline || guard.is_cancelled() {
            return Ok(false);
        }
        guard.sleep(poll.min(deadline - now)).await;
    }
}
