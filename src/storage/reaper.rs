//! Session Reaper
//!
//! Background task that periodically removes expired sessions.

use std::sync::Weak;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::store::Shared;
use super::SessionStore;

/// Background eviction task for a [`SessionStore`].
///
/// Wakes every `tick` and evicts every entry whose age reached the TTL, so an
/// entry is removed between `ttl` and `ttl + tick` after its last touch.
/// Holds only a weak reference to the store.
pub struct Reaper {
    store: Weak<Shared>,
    tick: Duration,
    stop_rx: watch::Receiver<bool>,
}

impl Reaper {
    /// Run the reaper (spawned as a task by [`Reaper::spawn`])
    async fn run(mut self) {
        let mut ticker = interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(tick = ?self.tick, "Reaper started");

        loop {
            tokio::select! {
                biased;

                changed = self.stop_rx.changed() => {
                    // A dropped handle counts as a stop signal
                    if changed.is_err() || *self.stop_rx.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    let Some(shared) = self.store.upgrade() else {
                        debug!("Store dropped");
                        break;
                    };
                    let removed = SessionStore::from_shared(shared).sweep_expired();
                    if removed > 0 {
                        debug!(removed = removed, "Cleaned up expired sessions");
                    }
                }
            }
        }

        info!("Reaper stopped");
    }

    /// Spawn a reaper for `store` as a background task
    pub fn spawn(store: &SessionStore) -> ReaperHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let reaper = Self {
            store: store.downgrade(),
            tick: store.config().tick,
            stop_rx,
        };

        ReaperHandle {
            stop_tx,
            join: tokio::spawn(reaper.run()),
        }
    }
}

/// Control handle for a running [`Reaper`]. Dropping it stops the reaper.
#[derive(Debug)]
pub struct ReaperHandle {
    stop_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl ReaperHandle {
    /// Ask the reaper to stop without waiting. A sweep already running completes.
    pub fn signal_stop(&self) {
        self.stop_tx.send_replace(true);
    }

    /// Stop the reaper and wait for it to exit
    pub async fn stop(self) {
        let Self { stop_tx, join } = self;
        stop_tx.send_replace(true);
        if let Err(e) = join.await {
            warn!(error = %e, "Reaper task ended abnormally");
        }
    }

    /// Check whether the reaper task has exited
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}
