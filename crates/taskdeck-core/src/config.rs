//! Engine tuning knobs.
//!
//! All intervals are in milliseconds and deserializable from JSON, so a
//! host can ship overrides without recompiling. The defaults encode the
//! intended relationship between the windows: the task freshness window
//! is shorter than the poll interval, which guarantees every poll tick
//! observes a stale cache and actually revalidates.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// --- defaults ---------------------------------------------------------

const fn default_task_fresh_ms() -> u64 {
    30_000
}

const fn default_poll_ms() -> u64 {
    60_000
}

const fn default_category_fresh_ms() -> u64 {
    1_800_000
}

// --- config -----------------------------------------------------------

/// Timing configuration for the sync engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// How long a fetched task collection counts as fresh.
    pub task_fresh_ms: u64,
    /// Background poll cadence. Zero disables polling entirely.
    pub poll_ms: u64,
    /// How long the category list counts as fresh. Categories change
    /// rarely, so this window is much longer than the task window.
    pub category_fresh_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            task_fresh_ms: default_task_fresh_ms(),
            poll_ms: default_poll_ms(),
            category_fresh_ms: default_category_fresh_ms(),
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub const fn task_fresh(&self) -> Duration {
        Duration::from_millis(self.task_fresh_ms)
    }

    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }

    #[must_use]
    pub const fn category_fresh(&self) -> Duration {
        Duration::from_millis(self.category_fresh_ms)
    }

    /// Whether background polling is enabled at all.
    #[must_use]
    pub const fn polling_enabled(&self) -> bool {
        self.poll_ms > 0
    }
}
