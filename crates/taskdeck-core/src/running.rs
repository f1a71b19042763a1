//! The single-running-task exclusivity invariant.
//!
//! Every fresh authoritative collection passes through
//! [`reconcile_on_load`] before it is installed. The client's local
//! belief about which task is running always wins over run timestamps
//! in the fresh data: a server snapshot taken mid-transition (or stale
//! "still running" data left behind by another device) must never
//! resurrect a running flag the user has already moved past. Running
//! state only re-enters through an explicit start action — or on the
//! very first load of a session, when there is no local belief to
//! protect.

use tracing::debug;

use crate::model::{Task, TaskId};

/// What the client currently believes about the running task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunningBelief<'a> {
    /// First load of the session; trust the fresh data verbatim.
    FirstLoad,
    /// No task is running locally; clear any run timestamps found.
    Idle,
    /// This task is running locally; clear run timestamps on any other.
    Running(&'a TaskId),
}

/// Reconcile a fresh collection against the local running belief,
/// clearing stale run timestamps in place. Returns how many tasks were
/// cleared.
pub fn reconcile_on_load(tasks: &mut [Task], belief: RunningBelief<'_>) -> usize {
    let cleared = match belief {
        RunningBelief::FirstLoad => 0,
        RunningBelief::Idle => clear_where(tasks, |_| true),
        RunningBelief::Running(id) => clear_where(tasks, |t| t.id != *id),
    };
    if cleared > 0 {
        debug!(cleared, "cleared stale run timestamps from fresh collection");
    }
    cleared
}

fn clear_where(tasks: &mut [Task], stale: impl Fn(&Task) -> bool) -> usize {
    let mut cleared = 0;
    for task in &mut *tasks {
        if (task.run_start.is_some() || task.run_end.is_some()) && stale(task) {
            task.clear_run();
            cleared += 1;
        }
    }
    cleared
}
