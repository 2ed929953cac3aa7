//! Interstitial overlay dismissal.
//!
//! Nothing here fails the run. A modal that never shows up is the normal
//! case, and one that cannot be closed is logged and left behind.

use std::time::Duration;

use gridharvest_core::{ModalSelectors, PacingSettings};
use tracing::{debug, info, warn};

use crate::dom::{wait_for, Document, ItemNode};
use crate::pacing::{Pacer, RunGuard};

/// What [`dismiss_modals`] observed, for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DismissOutcome {
    pub modal_seen: bool,
    pub clicked: usize,
}

/// Waits for the modal container, then clicks every visible close control,
/// walking `modal.close` in priority order.
pub async fn dismiss_modals<D: Document, P: Pacer>(
    doc: &D,
    modal: &ModalSelectors,
    pacing: &PacingSettings,
    pacer: &P,
    guard: &RunGuard,
) -> DismissOutcome {
    let timeout = Duration::from_millis(pacing.modal_timeout_ms);
    let poll = Duration::from_millis(pacing.modal_poll_ms);

    match wait_for(doc, &modal.container, timeout, poll, guard).await {
        Ok(true) => {}
        Ok(false) => {
            debug!(container = %modal.container, "no modal appeared");
            return DismissOutcome::default();
        }
        Err(e) => {
            warn!(container = %modal.container, error = %e, "modal probe failed");
            return DismissOutcome::default();
        }
    }

    info!(container = %modal.container, "modal detected, dismissing");
    let mut outcome = DismissOutcome {
        modal_seen: true,
        clicked: 0,
    };

    for selector in &modal.close {
        if guard.is_cancelled() {
            break;
        }
        let controls = match doc.find_all(selector).await {
            Ok(controls) => controls,
            Err(e) => {
                warn!(selector = %selector, error = %e, "close control lookup failed");
                continue;
            }
        };

        for control in controls {
            match control.is_displayed().await {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    debug!(selector = %selector, error = %e, "close control went away");
                    continue;
                }
            }
            match doc.click(&control).await {
                Ok(()) => {
                    outcome.clicked += 1;
                    debug!(selector = %selector, "clicked close control");
                    guard.sleep(pacer.delay(pacing.modal_click_pause_ms)).await;
                }
                Err(e) => warn!(selector = %selector, error = %e, "close click failed"),
            }
        }
    }

    if outcome.clicked == 0 {
        warn!(container = %modal.container, "modal seen but no visible close control");
    }
    outcome
}
