//! Pause policy and cooperative cancellation.
//!
//! A [`Pacer`] only decides how long to wait; the wait itself goes through
//! [`RunGuard::sleep`], which returns early once the run is cancelled or its
//! deadline passes. Tests pass [`NoPacer`] so nothing ever sleeps.

use std::time::Duration;

use gridharvest_core::PauseRange;
use rand::Rng;
use tokio::sync::watch;
use tokio::time::Instant;

pub trait Pacer {
    /// Picks a pause length within `range`.
    fn delay(&self, range: PauseRange) -> Duration;
}

/// Uniformly random pauses within each configured range.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomPacer;

impl Pacer for RandomPacer {
    fn delay(&self, range: PauseRange) -> Duration {
        if range.min_ms >= range.max_ms {
            return Duration::from_millis(range.min_ms);
        }
        Duration::from_millis(rand::rng().random_range(range.min_ms..=range.max_ms))
    }
}

/// Zero-length pauses.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPacer;

impl Pacer for NoPacer {
    fn delay(&self, _range: PauseRange) -> Duration {
        Duration::ZERO
    }
}

/// Cancellation and deadline state shared by every step of one run.
#[derive(Debug, Clone)]
pub struct RunGuard {
    deadline: Option<Instant>,
    cancel: Option<watch::Receiver<bool>>,
}

/// Signals a [`RunGuard`] to stop the run at the next checkpoint.
#[derive(Debug)]
pub struct Canceller(watch::Sender<bool>);

impl Canceller {
    pub fn cancel(&self) {
        self.0.send_replace(true);
    }
}

impl RunGuard {
    /// Creates a guard with an optional overall timeout and a handle to cancel it.
    #[must_use]
    pub fn new(timeout: Option<Duration>) -> (Self, Canceller) {
        let (tx, rx) = watch::channel(false);
        let guard = Self {
            deadline: timeout.map(|t| Instant::now() + t),
            cancel: Some(rx),
        };
        (guard, Canceller(tx))
    }

    /// A guard that never cancels.
    #[must_use]
    pub fn unbounded() -> Self {
        Self {
            deadline: None,
            cancel: None,
        }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        let signalled = self.cancel.as_ref().is_some_and(|rx| *rx.borrow());
        let expired = self.deadline.is_some_and(|d| Instant::now() >= d);
        signalled || expired
    }

    /// Sleeps for `duration`, waking early on cancellation or deadline.
    pub async fn sleep(&self, duration: Duration) {
        if duration.is_zero() || self.is_cancelled() {
            return;
        }

        let mut wake = Instant::now() + duration;
        if let Some(deadline) = self.deadline {
            wake = wake.min(deadline);
        }

        let Some(mut rx) = self.cancel.clone() else {
            tokio::time::sleep_until(wake).await;
            return;
        };

        let cancelled = async move {
            // A dropped Canceller can never fire.
            if rx.wait_for(|c| *c).await.is_err() {
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            () = tokio::time::sleep_until(wake) => {}
            () = cancelled => {}
        }
    }
}
