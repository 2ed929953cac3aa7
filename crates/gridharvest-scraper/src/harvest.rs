//! Run coordinator: modals, pagination, then one pass of extraction over a
//! single snapshot of the item nodes.

use std::time::Duration;

use gridharvest_core::{HarvestResult, StoreProfile};
use tracing::{info, warn};

use crate::dom::{wait_for, Document};
use crate::error::HarvestError;
use crate::extract::ItemExtractor;
use crate::modal::dismiss_modals;
use crate::pacing::{Pacer, RunGuard};
use crate::pagination::reveal_all;

const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(20);
const READY_POLL: Duration = Duration::from_millis(250);
const READY_SELECTOR: &str = "body";

pub struct Harvester<'a, P> {
    profile: &'a StoreProfile,
    pacer: P,
    guard: RunGuard,
    ready_timeout: Duration,
}

impl<'a, P: Pacer> Harvester<'a, P> {
    #[must_use]
    pub fn new(profile: &'a StoreProfile, pacer: P, guard: RunGuard) -> Self {
        Self {
            profile,
            pacer,
            guard,
            ready_timeout: DEFAULT_READY_TIMEOUT,
        }
    }

    /// How long to wait for the document to become queryable.
    #[must_use]
    pub fn with_ready_timeout(mut self, timeout: Duration) -> Self {
        self.ready_timeout = timeout;
        self
    }

    /// Harvests every tile the page reveals.
    ///
    /// Per-tile failures land in [`HarvestResult::skipped`]; cancellation after
    /// the document is ready yields a partial result with `interrupted` set.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError`] when the profile is unusable, the document
    /// never becomes ready, or the document cannot be queried for items.
    pub async fn harvest<D: Document>(&self, doc: &D) -> Result<HarvestResult, HarvestError> {
        let profile = self.profile;
        let extractor = ItemExtractor::new(profile, &self.pacer, &self.guard)?;

        self.wait_until_ready(doc).await?;

        if let Some(modal) = &profile.selectors.modal {
            let outcome =
                dismiss_modals(doc, modal, &profile.pacing, &self.pacer, &self.guard).await;
            info!(
                store = %profile.name,
                modal_seen = outcome.modal_seen,
                clicked = outcome.clicked,
                "modal check finished"
            );
        }

        let pagination = reveal_all(doc, profile, &self.pacer, &self.guard).await?;
        info!(
            store = %profile.name,
            items = pagination.item_count,
            iterations = pagination.iterations,
            stop = %pagination.stop,
            "pagination finished"
        );

        // Queried once so ordinals stay stable across the whole pass.
        let nodes = doc.find_all(&profile.selectors.item).await?;
        info!(store = %profile.name, tiles = nodes.len(), "extracting tiles");

        let mut records = Vec::with_capacity(nodes.len());
        let mut skipped = Vec::new();
        let mut interrupted = false;

        for (index, node) in nodes.iter().enumerate() {
            if self.guard.is_cancelled() {
                warn!(
                    store = %profile.name,
                    remaining = nodes.len() - index,
                    "harvest cancelled, stopping extraction"
                );
                interrupted = true;
                break;
            }

            match extractor.extract(doc, node, index).await {
                Ok(record) => records.push(record),
                Err(failure) => {
                    warn!(index, error = %failure.error, "skipping tile");
                    skipped.push(failure.into_skipped());
                }
            }
        }

        info!(
            store = %profile.name,
            records = records.len(),
            skipped = skipped.len(),
            "extraction finished"
        );

        Ok(HarvestResult {
            records,
            skipped,
            revealed: pagination.progress,
            pagination_stop: pagination.stop,
            interrupted,
        })
    }

    async fn wait_until_ready<D: Document>(&self, doc: &D) -> Result<(), HarvestError> {
        if wait_for(doc, READY_SELECTOR, self.ready_timeout, READY_POLL, &self.guard).await? {
            return Ok(());
        }
        if self.guard.is_cancelled() {
            return Err(HarvestError::Cancelled);
        }
        Err(HarvestError::NotReady {
            waited_ms: u64::try_from(self.ready_timeout.as_millis()).unwrap_or(u64::MAX),
        })
    }
}
