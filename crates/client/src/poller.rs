//! Periodic refresh
//!
//! Each tick spawns its own refresh, so a slow request never delays or
//! swallows the next tick; when two overlap, whichever finishes last is what
//! the view shows. Cancelling stops the timer only. Requests already in
//! flight run to completion.

use async_trait::async_trait;
use cloudpanel_common::Result;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Something that can re-fetch and re-render itself
#[async_trait]
pub trait Refresh: Send + Sync {
    async fn refresh(&self) -> Result<()>;

    fn label(&self) -> &str {
        "refresh"
    }
}

/// Drives a [`Refresh`] target on a fixed interval
///
/// Only a weak reference is held: once the target is dropped the poller
/// stops on its next tick.
pub struct Poller<T: Refresh + 'static> {
    target: Weak<T>,
    interval: Duration,
}

impl<T: Refresh + 'static> Clone for Poller<T> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
            interval: self.interval,
        }
    }
}

impl<T: Refresh + 'static> Poller<T> {
    pub fn new(target: &Arc<T>, interval: Duration) -> Self {
        Self {
            target: Arc::downgrade(target),
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run exactly one refresh and wait for it
    ///
    /// Returns false when the target no longer exists.
    pub async fn tick(&self) -> bool {
        let Some(target) = self.target.upgrade() else {
            return false;
        };
        if let Err(e) = target.refresh().await {
            warn!("{} failed: {}", target.label(), e);
        }
        true
    }

    /// Start the timer; the first refresh happens one interval from now
    pub fn start(self) -> PollHandle {
        let token = CancellationToken::new();
        let child = token.clone();
        let interval = self.interval;

        let task = tokio::spawn(async move {
            let mut ticker =
                tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = child.cancelled() => {
                        debug!("Poller cancelled");
                        break;
                    }
                    _ = ticker.tick() => {
                        let Some(target) = self.target.upgrade() else {
                            debug!("Poll target dropped, stopping");
                            break;
                        };
                        tokio::spawn(async move {
                            if let Err(e) = target.refresh().await {
                                warn!("{} failed: {}", target.label(), e);
                            }
                        });
                    }
                }
            }
        });

        info!("Polling every {:?}", interval);
        PollHandle {
            token,
            task: Some(task),
        }
    }
}

/// Handle to a running poller; dropping it cancels the timer
pub struct PollHandle {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Cancel and wait for the timer task to exit
    pub async fn stop(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
