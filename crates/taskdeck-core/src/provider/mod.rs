//! The abstract task-data provider boundary.
//!
//! Everything remote is behind [`TaskProvider`]: plain request/response
//! calls, no streaming. The engine runs on a single-threaded runtime,
//! so provider futures do not need to be `Send`; awaiting a provider
//! call is the only suspension point in the whole core.

#![allow(
    clippy::missing_errors_doc,   // every call shares the ProviderError contract above
    clippy::module_name_repetitions,
)]

pub mod memory;

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::ProviderError;
use crate::model::{
    Category, DataChangePhase, InquiryPhase, ReviewPhase, Status, Task, TaskDraft, TaskId,
    TaskPatch,
};

pub use memory::MemoryProvider;

/// Confirmation returned by a successful start call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartReceipt {
    /// The store's authoritative start timestamp; it replaces the
    /// client's optimistic one.
    pub started_at: DateTime<Utc>,
}

/// Confirmation returned by a successful postpone call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostponeReceipt {
    /// The store-computed new scheduled date (next business day).
    pub new_scheduled_date: NaiveDate,
}

/// Which phase field a start should initialize, and to what.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseHint {
    DataChange(DataChangePhase),
    Inquiry(InquiryPhase),
    Review(ReviewPhase),
}

impl PhaseHint {
    /// The patch fragment this hint stands for.
    #[must_use]
    pub fn into_patch(self) -> TaskPatch {
        let mut patch = TaskPatch::default();
        match self {
            Self::DataChange(p) => patch.phase_data_change = Some(Some(p)),
            Self::Inquiry(p) => patch.phase_inquiry = Some(Some(p)),
            Self::Review(p) => patch.phase_review = Some(Some(p)),
        }
        patch
    }
}

/// Remote task store operations. All calls may fail with a
/// transport-level or validation-level error carrying a human-readable
/// message.
#[allow(async_fn_in_trait)]
pub trait TaskProvider {
    async fn list_tasks(&self) -> Result<Vec<Task>, ProviderError>;

    async fn list_categories(&self) -> Result<Vec<Category>, ProviderError>;

    async fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> Result<(), ProviderError>;

    async fn create_task(&self, draft: &TaskDraft) -> Result<TaskId, ProviderError>;

    async fn start_task(
        &self,
        id: &TaskId,
        status_hint: Option<Status>,
        phase_hint: Option<PhaseHint>,
    ) -> Result<StartReceipt, ProviderError>;

    async fn stop_task(&self, id: &TaskId) -> Result<(), ProviderError>;

    async fn finish_task(&self, id: &TaskId) -> Result<(), ProviderError>;

    async fn answer_task(&self, id: &TaskId, memo: Option<&str>) -> Result<(), ProviderError>;

    async fn postpone_task(&self, id: &TaskId) -> Result<PostponeReceipt, ProviderError>;
}

/// Shared handles to a provider are providers themselves; lets an
/// embedder keep a control handle while the engine owns its copy.
impl<P: TaskProvider> TaskProvider for std::rc::Rc<P> {
    async fn list_tasks(&self) -> Result<Vec<Task>, ProviderError> {
        (**self).list_tasks().await
    }

    async fn list_categories(&self) -> Result<Vec<Category>, ProviderError> {
        (**self).list_categories().await
    }

    async fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> Result<(), ProviderError> {
        (**self).update_task(id, patch).await
    }

    async fn create_task(&self, draft: &TaskDraft) -> Result<TaskId, ProviderError> {
        (**self).create_task(draft).await
    }

    async fn start_task(
        &self,
        id: &TaskId,
        status_hint: Option<Status>,
        phase_hint: Option<PhaseHint>,
    ) -> Result<StartReceipt, ProviderError> {
        (**self).start_task(id, status_hint, phase_hint).await
    }

    async fn stop_task(&self, id: &TaskId) -> Result<(), ProviderError> {
        (**self).stop_task(id).await
    }

    async fn finish_task(&self, id: &TaskId) -> Result<(), ProviderError> {
        (**self).finish_task(id).await
    }

    async fn answer_task(&self, id: &TaskId, memo: Option<&str>) -> Result<(), ProviderError> {
        (**self).answer_task(id, memo).await
    }

    async fn postpone_task(&self, id: &TaskId) -> Result<PostponeReceipt, ProviderError> {
        (**self).postpone_task(id).await
    }
}
