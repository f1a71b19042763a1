//! The sync engine: the surface an embedding application talks to.
//!
//! An [`Engine`] wires the shared state, the event bus, the mutation
//! coordinator, the differential renderer, and the polling driver
//! around a caller-supplied provider and view. It is a cheap cloneable
//! handle; clones share one state. Everything runs on one thread — the
//! polling loop requires a `tokio::task::LocalSet`.

#![allow(
    clippy::missing_errors_doc,   // mutation wrappers all fail per the error module's taxonomy
    clippy::module_name_repetitions,
)]

use std::cell::RefCell;
use std::rc::Rc;

use chrono::Local;
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::coordinator::MutationCoordinator;
use crate::error::EngineError;
use crate::events::{EngineEvent, EventBus};
use crate::model::{Assignee, Status, Task, TaskDraft, TaskId, TaskPatch};
use crate::ops::OpStatus;
use crate::poll::PollingDriver;
use crate::render::{BoardRenderer, BoardView, FilterSet, RenderStats};
use crate::state::CoreState;

/// The refresh pipeline: cache consult, fetch, reconcile, install.
/// Split out from [`Engine`] so the polling closure can hold it without
/// holding the poller itself.
struct Refresher<P> {
    provider: Rc<P>,
    state: Rc<RefCell<CoreState>>,
    bus: Rc<EventBus>,
}

impl<P> Clone for Refresher<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Rc::clone(&self.provider),
            state: Rc::clone(&self.state),
            bus: Rc::clone(&self.bus),
        }
    }
}

impl<P: crate::provider::TaskProvider> Refresher<P> {
    /// Serve the cached collection while fresh; otherwise fetch and
    /// install. Either way the board reconciles.
    async fn refresh(&self) -> Result<(), EngineError> {
        let fresh = {
            let state = self.state.borrow();
            if state.disposed {
                return Err(EngineError::Disposed);
            }
            state.task_cache.get().is_some()
        };
        if fresh {
            self.bus.emit(&EngineEvent::CollectionChanged);
            return Ok(());
        }

        let tasks = self.provider.list_tasks().await?;
        let cleared = self.state.borrow_mut().install_tasks(tasks);
        if cleared > 0 {
            info!(cleared, "refresh cleared stale run stamps");
        }
        self.bus.emit(&EngineEvent::CollectionChanged);
        Ok(())
    }

    async fn load_categories(&self) -> Result<(), EngineError> {
        let fresh = {
            let state = self.state.borrow();
            if state.disposed {
                return Err(EngineError::Disposed);
            }
            state.category_cache.get().is_some()
        };
        if fresh {
            return Ok(());
        }
        let categories = self.provider.list_categories().await?;
        self.state.borrow_mut().install_categories(categories);
        Ok(())
    }
}

/// Client-side state synchronization engine over a task provider `P`
/// and a render target `V`.
pub struct Engine<P, V: BoardView> {
    refresher: Refresher<P>,
    coordinator: MutationCoordinator<P>,
    state: Rc<RefCell<CoreState>>,
    bus: Rc<EventBus>,
    view: Rc<RefCell<V>>,
    renderer: Rc<RefCell<BoardRenderer<V>>>,
    poller: Rc<RefCell<PollingDriver>>,
}

impl<P, V: BoardView> Clone for Engine<P, V> {
    fn clone(&self) -> Self {
        Self {
            refresher: self.refresher.clone(),
            coordinator: self.coordinator.clone(),
            state: Rc::clone(&self.state),
            bus: Rc::clone(&self.bus),
            view: Rc::clone(&self.view),
            renderer: Rc::clone(&self.renderer),
            poller: Rc::clone(&self.poller),
        }
    }
}

impl<P, V> Engine<P, V>
where
    P: crate::provider::TaskProvider + 'static,
    V: BoardView + 'static,
{
    #[must_use]
    pub fn new(provider: P, view: V, config: EngineConfig) -> Self {
        let provider = Rc::new(provider);
        let state = Rc::new(RefCell::new(CoreState::new(config)));
        let bus = Rc::new(EventBus::new());
        let view = Rc::new(RefCell::new(view));
        let renderer = Rc::new(RefCell::new(BoardRenderer::new()));

        // Internal subscriber: every collection change reconciles the
        // board. Captures its own handles, never the engine, so the bus
        // does not cycle back into itself.
        {
            let state = Rc::clone(&state);
            let renderer = Rc::clone(&renderer);
            let view = Rc::clone(&view);
            bus.subscribe(move |event| {
                if matches!(event, EngineEvent::CollectionChanged) {
                    let state = state.borrow();
                    renderer.borrow_mut().reconcile(
                        &mut *view.borrow_mut(),
                        state.repo.tasks(),
                        &state.filters,
                        &state.categories,
                        Local::now().date_naive(),
                    );
                }
            });
        }

        Self {
            refresher: Refresher {
                provider: Rc::clone(&provider),
                state: Rc::clone(&state),
                bus: Rc::clone(&bus),
            },
            coordinator: MutationCoordinator::new(
                Rc::clone(&provider),
                Rc::clone(&state),
                Rc::clone(&bus),
            ),
            state,
            bus,
            view,
            renderer,
            poller: Rc::new(RefCell::new(PollingDriver::new())),
        }
    }

    // --- lifecycle ----------------------------------------------------

    /// Load categories and the first task collection, then start the
    /// background poll. A failure on either initial load (with nothing
    /// cached) is fatal to initialization and surfaced on the view.
    pub async fn initialize(&self) -> Result<(), EngineError> {
        if let Err(err) = self.refresher.load_categories().await {
            self.view
                .borrow_mut()
                .show_error(&format!("failed to load categories: {err}"));
            return Err(err);
        }
        if let Err(err) = self.refresher.refresh().await {
            self.view
                .borrow_mut()
                .show_error(&format!("failed to load tasks: {err}"));
            return Err(err);
        }

        let interval = {
            let state = self.state.borrow();
            state
                .config
                .polling_enabled()
                .then(|| state.config.poll_interval())
        };
        if let Some(interval) = interval {
            let refresher = self.refresher.clone();
            self.poller.borrow_mut().start(interval, move || {
                let refresher = refresher.clone();
                async move {
                    // Background failures are non-fatal: the stale view
                    // stays up and the next tick retries.
                    if let Err(err) = refresher.refresh().await {
                        warn!(error = %err, "background refresh failed");
                    }
                }
            });
        }
        Ok(())
    }

    /// Refresh through the cache right now, outside the poll cadence.
    pub async fn refresh_now(&self) -> Result<(), EngineError> {
        self.refresher.refresh().await
    }

    /// Stop polling and refuse further work. Idempotent.
    pub fn dispose(&self) {
        self.poller.borrow_mut().stop();
        self.state.borrow_mut().disposed = true;
    }

    pub fn subscribe(&self, f: impl Fn(&EngineEvent) + 'static) {
        self.bus.subscribe(f);
    }

    // --- filters ------------------------------------------------------

    pub fn set_assignee_filter(&self, assignee: Option<Assignee>) {
        self.state.borrow_mut().filters.assignee = assignee;
        self.bus.emit(&EngineEvent::CollectionChanged);
    }

    pub fn set_parent_category_filter(&self, parent: Option<String>) {
        self.state.borrow_mut().filters.parent_category = parent;
        self.bus.emit(&EngineEvent::CollectionChanged);
    }

    pub fn set_include_scheduled(&self, include: bool) {
        self.state.borrow_mut().filters.include_scheduled = include;
        self.bus.emit(&EngineEvent::CollectionChanged);
    }

    #[must_use]
    pub fn filters(&self) -> FilterSet {
        self.state.borrow().filters.clone()
    }

    // --- mutations ----------------------------------------------------

    pub async fn start_task(&self, id: &TaskId) -> Result<(), EngineError> {
        let refresh = self.coordinator.start(id).await?;
        self.follow_up(refresh).await;
        Ok(())
    }

    pub async fn stop_task(&self, id: &TaskId) -> Result<(), EngineError> {
        let refresh = self.coordinator.stop(id).await?;
        self.follow_up(refresh).await;
        Ok(())
    }

    pub async fn finish_task(&self, id: &TaskId) -> Result<(), EngineError> {
        let refresh = self.coordinator.finish(id).await?;
        self.follow_up(refresh).await;
        Ok(())
    }

    pub async fn answer_task(&self, id: &TaskId, memo: Option<&str>) -> Result<(), EngineError> {
        let refresh = self.coordinator.answer(id, memo).await?;
        self.follow_up(refresh).await;
        Ok(())
    }

    pub async fn postpone_task(&self, id: &TaskId) -> Result<(), EngineError> {
        let refresh = self.coordinator.postpone(id).await?;
        self.follow_up(refresh).await;
        Ok(())
    }

    pub async fn edit_task(&self, id: &TaskId, changes: &TaskPatch) -> Result<(), EngineError> {
        let refresh = self.coordinator.edit(id, changes).await?;
        self.follow_up(refresh).await;
        Ok(())
    }

    pub async fn move_task(&self, id: &TaskId, status: Status) -> Result<(), EngineError> {
        let refresh = self.coordinator.move_status(id, status).await?;
        self.follow_up(refresh).await;
        Ok(())
    }

    /// Create a task remotely, then pick it up via a forced refresh.
    pub async fn create_task(&self, draft: &TaskDraft) -> Result<TaskId, EngineError> {
        if self.state.borrow().disposed {
            return Err(EngineError::Disposed);
        }
        let id = self.refresher.provider.create_task(draft).await?;
        self.follow_up(true).await;
        Ok(id)
    }

    /// Post-commit refresh: force a fetch past the cache so the local
    /// view converges on the store. Failures here are non-fatal; the
    /// optimistic state stands until the next poll.
    async fn follow_up(&self, refresh: bool) {
        if !refresh {
            return;
        }
        self.state.borrow_mut().task_cache.invalidate();
        if let Err(err) = self.refresher.refresh().await {
            warn!(error = %err, "post-mutation refresh failed");
        }
    }

    // --- inspection ---------------------------------------------------

    #[must_use]
    pub fn task(&self, id: &TaskId) -> Option<Task> {
        self.state.borrow().repo.snapshot(id)
    }

    #[must_use]
    pub fn tasks(&self) -> Vec<Task> {
        self.state.borrow().repo.tasks().to_vec()
    }

    #[must_use]
    pub fn find_running(&self) -> Option<TaskId> {
        self.state.borrow().repo.find_running().map(|t| t.id.clone())
    }

    #[must_use]
    pub fn current_seq(&self) -> u64 {
        self.state.borrow().seq.current()
    }

    #[must_use]
    pub fn op_status(&self, seq: u64) -> Option<OpStatus> {
        self.state.borrow().ops.status_of(seq)
    }

    #[must_use]
    pub fn last_render_stats(&self) -> RenderStats {
        self.renderer.borrow().last_stats()
    }

    #[must_use]
    pub fn is_polling(&self) -> bool {
        self.poller.borrow().is_running()
    }

    /// Run a closure against the live view, e.g. to assert on it in
    /// tests or read a derived widget.
    pub fn with_view<R>(&self, f: impl FnOnce(&V) -> R) -> R {
        f(&self.view.borrow())
    }
}
