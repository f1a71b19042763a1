//! The authoritative in-process task collection.
//!
//! All reads go through here; mutation is restricted to authoritative
//! installs (`replace_all`) and coordinator-driven optimistic writes
//! (`upsert_local`, which hands back the prior snapshot for rollback).

use tracing::warn;

use crate::model::{Task, TaskId, TaskPatch};

/// In-memory collection of task records, ordered as the store returned
/// them.
#[derive(Debug, Clone, Default)]
pub struct TaskRepository {
    tasks: Vec<Task>,
}

impl TaskRepository {
    #[must_use]
    pub const fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    /// Install a new authoritative list, replacing everything.
    pub fn replace_all(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
    }

    #[must_use]
    pub fn find(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == *id)
    }

    pub(crate) fn find_mut(&mut self, id: &TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == *id)
    }

    /// The running task, if any. The invariant allows at most one; if
    /// the backing data erroneously contains several, the first by
    /// input order wins and the rest are treated as stale.
    #[must_use]
    pub fn find_running(&self) -> Option<&Task> {
        let mut running = self.tasks.iter().filter(|t| t.is_running());
        let first = running.next();
        if running.next().is_some() {
            warn!(
                task = %first.map_or("", |t| t.id.as_str()),
                "multiple running tasks in collection; keeping the first"
            );
        }
        first
    }

    /// Clone of a task's current field values, for snapshots.
    #[must_use]
    pub fn snapshot(&self, id: &TaskId) -> Option<Task> {
        self.find(id).cloned()
    }

    /// Apply a patch in place (the optimistic write) and return the
    /// prior field values needed for rollback. `None` when the id is
    /// unknown.
    pub fn upsert_local(&mut self, id: &TaskId, patch: &TaskPatch) -> Option<Task> {
        let task = self.find_mut(id)?;
        let prior = task.clone();
        patch.apply(task);
        Some(prior)
    }

    /// Put a previously snapshotted task back, replacing the live copy.
    /// Unknown ids are ignored; the task was destroyed remotely and
    /// there is nothing to restore onto.
    pub fn restore(&mut self, snapshot: Task) {
        if let Some(task) = self.find_mut(&snapshot.id) {
            *task = snapshot;
        }
    }

    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
