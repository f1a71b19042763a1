//! Client-side state synchronization core for a task board.
//!
//! Mirrors server-held task records into a local, continuously
//! refreshed view while letting users mutate tasks instantly:
//!
//! - a stale-while-revalidate [`cache`] in front of the provider,
//! - an optimistic-mutation / rollback protocol in [`coordinator`],
//!   race-guarded by a global operation sequence ([`ops`]),
//! - the at-most-one-running-task invariant in [`running`],
//! - a signature-based differential board reconciler in [`render`],
//! - and a fixed-interval [`poll`] loop converging concurrent clients.
//!
//! [`engine::Engine`] composes all of it around a caller-supplied
//! [`provider::TaskProvider`] and [`render::BoardView`]. The whole core
//! is single-threaded and cooperative: run it on a current-thread tokio
//! runtime inside a `LocalSet`.

// Single-threaded cooperative core: state is shared via Rc/RefCell and
// every future runs on a LocalSet, so none of them are Send.
#![allow(clippy::future_not_send)]

pub mod cache;
pub mod config;
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod events;
pub mod model;
pub mod ops;
pub mod poll;
pub mod provider;
pub mod render;
pub mod repo;
pub mod running;
pub mod signature;
pub mod state;

pub use cache::SwrCache;
pub use config::EngineConfig;
pub use coordinator::MutationCoordinator;
pub use engine::Engine;
pub use error::{EngineError, ProviderError};
pub use events::{EngineEvent, EventBus};
pub use model::{
    Assignee, Category, CategoryId, CategoryIndex, DataChangePhase, InquiryPhase, ReviewPhase,
    Status, Task, TaskDraft, TaskId, TaskPatch,
};
pub use ops::{OpLog, OpSeq, OpStatus, PendingOp};
pub use poll::PollingDriver;
pub use provider::{MemoryProvider, PhaseHint, PostponeReceipt, StartReceipt, TaskProvider};
pub use render::{BoardRenderer, BoardView, FilterSet, RenderStats};
pub use repo::TaskRepository;
pub use running::{RunningBelief, reconcile_on_load};
pub use signature::TaskSignature;
pub use state::CoreState;
