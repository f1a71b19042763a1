//! The engine's shared state container.
//!
//! One [`CoreState`] per engine, created and disposed with it, passed
//! by `Rc<RefCell<_>>` to the components that need it. All access is
//! single-threaded; every mutation path re-reads current state through
//! the cell rather than closing over a copy taken before an await.

use crate::cache::SwrCache;
use crate::config::EngineConfig;
use crate::model::{Category, CategoryIndex, Task, TaskId};
use crate::ops::{OpLog, OpSeq};
use crate::render::FilterSet;
use crate::repo::TaskRepository;
use crate::running::{RunningBelief, reconcile_on_load};

/// Everything the engine mutates: the authoritative collection, both
/// caches, the sequence counter, the mutation ledger, and the active
/// filters.
#[derive(Debug)]
pub struct CoreState {
    pub config: EngineConfig,
    pub repo: TaskRepository,
    pub task_cache: SwrCache<Vec<Task>>,
    pub categories: CategoryIndex,
    pub category_cache: SwrCache<Vec<Category>>,
    pub seq: OpSeq,
    pub ops: OpLog,
    pub filters: FilterSet,
    pub loaded_once: bool,
    pub disposed: bool,
}

impl CoreState {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            repo: TaskRepository::new(),
            task_cache: SwrCache::new(config.task_fresh()),
            categories: CategoryIndex::default(),
            category_cache: SwrCache::new(config.category_fresh()),
            seq: OpSeq::new(),
            ops: OpLog::new(),
            filters: FilterSet::default(),
            loaded_once: false,
            disposed: false,
            config,
        }
    }

    /// Install a fresh authoritative collection: reconcile it against
    /// the local running belief, cache it, replace the repository, and
    /// bump the sequence counter so in-flight mutation callbacks see
    /// themselves superseded. Returns how many stale run stamps were
    /// cleared.
    pub fn install_tasks(&mut self, mut tasks: Vec<Task>) -> usize {
        let believed: Option<TaskId> = self.repo.find_running().map(|t| t.id.clone());
        let belief = if self.loaded_once {
            believed
                .as_ref()
                .map_or(RunningBelief::Idle, RunningBelief::Running)
        } else {
            RunningBelief::FirstLoad
        };
        let cleared = reconcile_on_load(&mut tasks, belief);
        self.task_cache.set(tasks.clone());
        self.repo.replace_all(tasks);
        self.loaded_once = true;
        self.seq.next();
        cleared
    }

    /// Install a fresh category collection into both the cache and the
    /// lookup index.
    pub fn install_categories(&mut self, categories: Vec<Category>) {
        self.category_cache.set(categories.clone());
        self.categories = CategoryIndex::new(categories);
    }
}

#[cfg(test)]
mod tests {
    use super::CoreState;
    use crate::config::EngineConfig;
    use crate::model::{Task, TaskId};
    use chrono::Utc;

    fn running(id: &str) -> Task {
        Task {
            id: TaskId::new(id),
            run_start: Some(Utc::now()),
            ..Task::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn first_install_trusts_running_flags() {
        let mut state = CoreState::new(EngineConfig::default());
        let cleared = state.install_tasks(vec![running("a")]);
        assert_eq!(cleared, 0);
        assert!(state.loaded_once);
        assert_eq!(state.seq.current(), 1);
        assert!(state.repo.find_running().is_some());
        assert!(state.task_cache.get().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn later_installs_defend_the_local_belief() {
        let mut state = CoreState::new(EngineConfig::default());
        state.install_tasks(vec![Task {
            id: TaskId::new("a"),
            ..Task::default()
        }]);

        // Locally idle, so a fresh snapshot claiming "a" is running is
        // stale data from elsewhere.
        let cleared = state.install_tasks(vec![running("a")]);
        assert_eq!(cleared, 1);
        assert!(state.repo.find_running().is_none());
        assert_eq!(state.seq.current(), 2);
    }
}
