use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::models::config::SessionConfig;
use crate::services::market_clock;

/// Source of "now", injectable so scheduling tests run on a fake clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Cancels a running scheduler loop on session teardown.
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
}

impl SchedulerHandle {
    pub fn cancel(&self) {
        let _ = self.shutdown.send(true);
    }
}

/// Drives the recurring valuation snapshot.
///
/// A single-shot timer re-armed after every firing: each tick computes
/// the next session-aligned instant from the clock and sleeps until
/// then, so execution delay never accumulates drift beyond one
/// interval. This is not a fixed-rate timer.
pub struct SnapshotScheduler {
    session: SessionConfig,
    clock: Arc<dyn Clock>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl SnapshotScheduler {
    pub fn new(session: SessionConfig, clock: Arc<dyn Clock>) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            session,
            clock,
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Handle for cancelling the loop from outside.
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            shutdown: self.shutdown_tx.clone(),
        }
    }

    /// The instant the next tick would fire at.
    pub fn next_instant(&self) -> DateTime<Utc> {
        market_clock::next_snapshot_instant(&self.session, self.clock.now())
    }

    /// Run until cancelled, invoking `on_tick` with each scheduled
    /// instant. Returns after `SchedulerHandle::cancel`.
    pub async fn run<F, Fut>(&self, mut on_tick: F)
    where
        F: FnMut(DateTime<Utc>) -> Fut,
        Fut: Future<Output = ()>,
    {
        let mut shutdown = self.shutdown_rx.clone();
        if *shutdown.borrow() {
            return;
        }

        loop {
            let now = self.clock.now();
            let next = market_clock::next_snapshot_instant(&self.session, now);
            let wait = (next - now).to_std().unwrap_or_default();
            debug!(%next, "snapshot timer armed");

            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    on_tick(next).await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("snapshot scheduler cancelled");
                        return;
                    }
                }
            }
        }
    }
}
