//! Fixed-interval background refresh trigger.
//!
//! The driver owns nothing but a timer loop on the local task set; it
//! never reconciles state itself. Each tick invokes the refresh future
//! the engine hands it, and ticks that pile up behind a slow refresh
//! are delayed rather than bursted.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Handle over the background poll loop.
#[derive(Debug, Default)]
pub struct PollingDriver {
    handle: Option<JoinHandle<()>>,
}

impl PollingDriver {
    #[must_use]
    pub const fn new() -> Self {
        Self { handle: None }
    }

    /// Begin ticking every `interval`, replacing any previous loop. The
    /// first tick fires after one full interval; the initial load is
    /// the caller's job. Must run inside a `LocalSet`.
    pub fn start<F, Fut>(&mut self, interval: Duration, mut tick: F)
    where
        F: FnMut() -> Fut + 'static,
        Fut: Future<Output = ()> + 'static,
    {
        self.stop();
        debug!(?interval, "polling started");
        self.handle = Some(tokio::task::spawn_local(async move {
            let mut timer = tokio::time::interval(interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // interval's first tick completes immediately; skip it.
            timer.tick().await;
            loop {
                timer.tick().await;
                tick().await;
            }
        }));
    }

    /// Cancel the loop. Idempotent.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("polling stopped");
        }
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for PollingDriver {
    fn drop(&mut self) {
        self.stop();
    }
}
