//! Scroll-driven pagination.
//!
//! Each iteration counts the revealed items, clicks the "load more" control
//! when one is visible, feeds the progress signal to a [`StallTracker`] and
//! scrolls forward. The loop ends once the run of consecutive no-growth
//! iterations exceeds `stall_threshold`, when the iteration ceiling is
//! reached, or when the run is cancelled.

use gridharvest_core::{PaginationStop, PauseRange, ProgressSignal, StoreProfile};
use tracing::{debug, info, warn};

use crate::dom::{Document, ItemNode};
use crate::error::DomError;
use crate::pacing::{Pacer, RunGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationState {
    Scrolling,
    /// Consecutive no-growth observations so far, never above the threshold.
    Stalled(u32),
    Done(PaginationStop),
}

/// Termination rule for the pagination loop.
///
/// Any growth over the best value seen so far resets the stall count to zero.
/// The tracker is done once the stall count exceeds `threshold`, and stays
/// done.
#[derive(Debug, Clone)]
pub struct StallTracker {
    threshold: u32,
    last: u64,
    stalls: u32,
    state: PaginationState,
}

impl StallTracker {
    /// A threshold of zero is treated as one.
    #[must_use]
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            last: 0,
            stalls: 0,
            state: PaginationState::Scrolling,
        }
    }

    pub fn observe(&mut self, value: u64) -> PaginationState {
        if matches!(self.state, PaginationState::Done(_)) {
            return self.state;
        }

        if value > self.last {
            self.last = value;
            self.stalls = 0;
            self.state = PaginationState::Scrolling;
        } else {
            self.stalls += 1;
            self.state = if self.stalls > self.threshold {
                PaginationState::Done(PaginationStop::Stalled)
            } else {
                PaginationState::Stalled(self.stalls)
            };
        }
        self.state
    }

    /// Forces the tracker into `Done(stop)` unless it already finished.
    pub fn finish(&mut self, stop: PaginationStop) -> PaginationState {
        if !matches!(self.state, PaginationState::Done(_)) {
            self.state = PaginationState::Done(stop);
        }
        self.state
    }

    #[must_use]
    pub fn state(&self) -> PaginationState {
        self.state
    }

    /// Highest progress value observed.
    #[must_use]
    pub fn last(&self) -> u64 {
        self.last
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationOutcome {
    /// Item count at the final probe.
    pub item_count: usize,
    /// Highest value of the configured progress signal.
    pub progress: u64,
    pub iterations: u32,
    pub stop: PaginationStop,
}

/// Reveals every item the page will render for `profile`.
///
/// # Errors
///
/// Returns [`DomError`] when counting items or reading the scroll height
/// fails. A missing "load more" control or a failed click or scroll is
/// logged and the loop carries on.
pub async fn reveal_all<D: Document, P: Pacer>(
    doc: &D,
    profile: &StoreProfile,
    pacer: &P,
    guard: &RunGuard,
) -> Result<PaginationOutcome, DomError> {
    let settings = &profile.pagination;
    let pacing = &profile.pacing;
    let mut tracker = StallTracker::new(settings.stall_threshold());
    let mut iterations = 0u32;
    let mut item_count = 0usize;

    guard
        .sleep(pacer.delay(PauseRange::fixed(pacing.initial_settle_ms)))
        .await;

    let stop = loop {
        if guard.is_cancelled() {
            break PaginationStop::Cancelled;
        }
        if iterations >= settings.max_scroll_iterations {
            warn!(
                store = %profile.name,
                iterations,
                "pagination hit iteration ceiling"
            );
            break PaginationStop::IterationCeiling;
        }
        iterations += 1;

        item_count = doc.count(&profile.selectors.item).await?;
        let progress = match settings.progress {
            ProgressSignal::ItemCount => u64::try_from(item_count).unwrap_or(u64::MAX),
            ProgressSignal::ScrollHeight => doc.scroll_height().await?,
        };
        info!(store = %profile.name, items = item_count, progress, "scrolled");

        if let Some(selector) = &profile.selectors.load_more {
            if click_load_more(doc, selector).await {
                guard.sleep(pacer.delay(pacing.settle_pause_ms)).await;
            }
        }

        match tracker.observe(progress) {
            PaginationState::Done(stop) => {
                info!(store = %profile.name, items = item_count, "no new items after repeated scrolls");
                break stop;
            }
            PaginationState::Stalled(n) => debug!(stalls = n, "no growth"),
            PaginationState::Scrolling => {}
        }

        if let Err(e) = doc.scroll_by(settings.scroll_step).await {
            warn!(store = %profile.name, error = %e, "scroll failed");
        }
        guard.sleep(pacer.delay(pacing.scroll_pause_ms)).await;
    };
    tracker.finish(stop);

    Ok(PaginationOutcome {
        item_count,
        progress: tracker.last(),
        iterations,
        stop,
    })
}

/// Clicks the first visible match of `selector`. Returns whether a click happened.
async fn click_load_more<D: Document>(doc: &D, selector: &str) -> bool {
    let control = match doc.find(selector).await {
        Ok(Some(control)) => control,
        Ok(None) => return false,
        Err(e) => {
            debug!(selector, error = %e, "load-more lookup failed");
            return false;
        }
    };

    match control.is_displayed().await {
        Ok(true) => {}
        Ok(false) => return false,
        Err(e) => {
            debug!(selector, error = %e, "load-more control went away");
            return false;
        }
    }

    match doc.click(&control).await {
        Ok(()) => {
            info!(selector, "clicked load-more control");
            true
        }
        Err(e) => {
            warn!(selector, error = %e, "load-more click failed");
            false
        }
    }
}

#[cfg(test)]
#[path = "pagination_test.rs"]
mod tests;
