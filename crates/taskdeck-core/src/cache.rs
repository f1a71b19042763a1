//! Time-boxed, in-memory snapshot cache (stale-while-revalidate).
//!
//! The cache only decides freshness; it never merges or mutates data.
//! A `get` that returns `None` is the signal to fetch. The task cache's
//! freshness window is configured shorter than the background poll
//! interval, so a poll always observes a stale entry and revalidates,
//! while a second near-simultaneous read reuses the just-fetched
//! snapshot. The category cache uses the same type with a longer TTL.
//!
//! Freshness is measured on `tokio::time::Instant`, so tests running
//! under a paused runtime can step the clock deterministically.

use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct Entry<T> {
    data: T,
    taken_at: Instant,
}

/// A single-entry cache with stale-while-revalidate semantics.
#[derive(Debug, Clone)]
pub struct SwrCache<T> {
    entry: Option<Entry<T>>,
    ttl: Duration,
}

impl<T> SwrCache<T> {
    #[must_use]
    pub const fn new(ttl: Duration) -> Self {
        Self { entry: None, ttl }
    }

    /// The cached value, only while fresh. `None` means the caller must
    /// fetch.
    #[must_use]
    pub fn get(&self) -> Option<&T> {
        let entry = self.entry.as_ref()?;
        if entry.taken_at.elapsed() < self.ttl {
            Some(&entry.data)
        } else {
            None
        }
    }

    /// Replace the entry with a freshly timestamped snapshot.
    pub fn set(&mut self, data: T) {
        self.entry = Some(Entry {
            data,
            taken_at: Instant::now(),
        });
    }

    /// Drop the entry; the next `get` forces a fetch.
    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }
}
