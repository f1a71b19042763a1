//! Optimistic mutation orchestration.
//!
//! Every user mutation follows the same shape: capture a sequence
//! number and prior snapshots, apply the new values locally, render,
//! then issue the remote call. Resolution consults the sequence
//! counter: only an operation that is still the latest may roll back
//! its snapshots or request a follow-up refresh; anything older has
//! been superseded and must leave local state alone.

#![allow(
    clippy::missing_errors_doc,   // all mutations share the settle() failure contract
    clippy::module_name_repetitions,
)]

use std::cell::RefCell;
use std::rc::Rc;

use chrono::{Days, Local, Utc};
use tracing::{info, warn};

use crate::error::{EngineError, ProviderError};
use crate::events::{EngineEvent, EventBus};
use crate::model::{
    Assignee, CategoryIndex, DataChangePhase, InquiryPhase, ReviewPhase, Status, Task, TaskId,
    TaskPatch,
};
use crate::ops::{OpStatus, PendingOp};
use crate::provider::{PhaseHint, TaskProvider};
use crate::state::CoreState;

/// Category-name keywords that pick the phase field a start
/// initializes. Matched case-insensitively, reviewer assignment first.
const DATA_CHANGE_KEYWORD: &str = "data change";
const INQUIRY_KEYWORD: &str = "inquiry";

/// The phase a task entering work should be initialized to, if any.
/// Only one phase field is ever chosen, and only while it is empty.
#[must_use]
pub fn select_phase(task: &Task, categories: &CategoryIndex) -> Option<PhaseHint> {
    if task.assignee == Some(Assignee::Reviewer) {
        return task
            .phase_review
            .is_none()
            .then(|| PhaseHint::Review(ReviewPhase::initial()));
    }
    let name = task
        .category
        .as_ref()
        .and_then(|id| categories.name_of(id))?
        .to_lowercase();
    if name.contains(DATA_CHANGE_KEYWORD) {
        return task
            .phase_data_change
            .is_none()
            .then(|| PhaseHint::DataChange(DataChangePhase::initial()));
    }
    if name.contains(INQUIRY_KEYWORD) {
        return task
            .phase_inquiry
            .is_none()
            .then(|| PhaseHint::Inquiry(InquiryPhase::initial()));
    }
    None
}

fn merge_hint(patch: &mut TaskPatch, hint: PhaseHint) {
    let fragment = hint.into_patch();
    if fragment.phase_data_change.is_some() {
        patch.phase_data_change = fragment.phase_data_change;
    }
    if fragment.phase_inquiry.is_some() {
        patch.phase_inquiry = fragment.phase_inquiry;
    }
    if fragment.phase_review.is_some() {
        patch.phase_review = fragment.phase_review;
    }
}

/// Orchestrates the optimistic-write / remote-persist / resolve cycle
/// for every mutation kind. Each method returns whether the caller
/// should trigger a follow-up authoritative refresh (true only when the
/// operation committed while still the latest).
pub struct MutationCoordinator<P> {
    provider: Rc<P>,
    state: Rc<RefCell<CoreState>>,
    bus: Rc<EventBus>,
}

impl<P> Clone for MutationCoordinator<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Rc::clone(&self.provider),
            state: Rc::clone(&self.state),
            bus: Rc::clone(&self.bus),
        }
    }
}

impl<P: TaskProvider> MutationCoordinator<P> {
    #[must_use]
    pub fn new(provider: Rc<P>, state: Rc<RefCell<CoreState>>, bus: Rc<EventBus>) -> Self {
        Self {
            provider,
            state,
            bus,
        }
    }

    fn ensure_live(&self) -> Result<(), EngineError> {
        if self.state.borrow().disposed {
            Err(EngineError::Disposed)
        } else {
            Ok(())
        }
    }

    /// Steps 1–4: sequence, snapshots, optimistic writes, render.
    /// Snapshot failures surface before a sequence number is consumed.
    fn begin(&self, writes: &[(TaskId, TaskPatch)]) -> Result<u64, EngineError> {
        let seq = {
            let mut state = self.state.borrow_mut();
            let mut snapshots = Vec::with_capacity(writes.len());
            for (id, _) in writes {
                let snapshot = state
                    .repo
                    .snapshot(id)
                    .ok_or_else(|| EngineError::TaskNotFound(id.clone()))?;
                snapshots.push((id.clone(), snapshot));
            }
            let seq = state.seq.next();
            for (id, patch) in writes {
                state.repo.upsert_local(id, patch);
            }
            state.ops.record(PendingOp::new(seq, snapshots));
            seq
        };
        self.bus.emit(&EngineEvent::CollectionChanged);
        Ok(seq)
    }

    /// Steps 6–7: resolve against the current sequence. Committed ops
    /// report whether a follow-up refresh is due; failed ops roll back
    /// only while still the latest.
    fn settle(&self, seq: u64, result: Result<(), ProviderError>) -> Result<bool, EngineError> {
        match result {
            Ok(()) => {
                let latest = {
                    let mut state = self.state.borrow_mut();
                    state.ops.resolve(seq, OpStatus::Committed);
                    state.seq.current() == seq
                };
                info!(seq, latest, "mutation committed");
                self.bus.emit(&EngineEvent::MutationCommitted { seq });
                Ok(latest)
            }
            Err(err) => {
                let rolled_back = {
                    let mut state = self.state.borrow_mut();
                    let latest = state.seq.current() == seq;
                    if latest {
                        let snapshots: Vec<(TaskId, Task)> = state
                            .ops
                            .snapshots_of(seq)
                            .map(<[_]>::to_vec)
                            .unwrap_or_default();
                        for (_, snapshot) in snapshots {
                            state.repo.restore(snapshot);
                        }
                        state.ops.resolve(seq, OpStatus::RolledBack);
                    } else {
                        state.ops.resolve(seq, OpStatus::Superseded);
                    }
                    latest
                };
                warn!(seq, rolled_back, error = %err, "mutation failed");
                if rolled_back {
                    self.bus.emit(&EngineEvent::CollectionChanged);
                }
                self.bus.emit(&EngineEvent::MutationFailed {
                    seq,
                    message: err.to_string(),
                    rolled_back,
                });
                Err(err.into())
            }
        }
    }

    /// Apply a store-confirmed correction (e.g. the authoritative start
    /// timestamp) on top of the optimistic write, but only while the
    /// operation is still the latest.
    fn confirm(&self, seq: u64, id: &TaskId, patch: &TaskPatch) {
        let applied = {
            let mut state = self.state.borrow_mut();
            state.seq.current() == seq && state.repo.upsert_local(id, patch).is_some()
        };
        if applied {
            self.bus.emit(&EngineEvent::CollectionChanged);
        }
    }

    // --- mutations ----------------------------------------------------

    /// Begin executing a task, stopping whichever task was running
    /// first. Both transitions are applied locally in one atomic step
    /// under one sequence number; remotely the stop is issued before
    /// the start.
    pub async fn start(&self, id: &TaskId) -> Result<bool, EngineError> {
        self.ensure_live()?;
        let now = Utc::now();

        let (previous, status_hint, phase_hint) = {
            let state = self.state.borrow();
            let task = state
                .repo
                .find(id)
                .ok_or_else(|| EngineError::TaskNotFound(id.clone()))?;
            if task.is_running() {
                return Ok(false);
            }
            let previous = state
                .repo
                .find_running()
                .map(|t| t.id.clone())
                .filter(|prev| prev != id);
            let status_hint = matches!(task.status, Status::NotStarted | Status::Deferred)
                .then_some(Status::InProgress);
            let phase_hint = select_phase(task, &state.categories);
            (previous, status_hint, phase_hint)
        };

        let mut writes = Vec::new();
        if let Some(prev) = &previous {
            writes.push((prev.clone(), TaskPatch::default().with_run(None, None)));
        }
        let mut patch = TaskPatch::default().with_run(Some(now), None);
        if let Some(status) = status_hint {
            patch.status = Some(status);
        }
        if let Some(hint) = phase_hint {
            merge_hint(&mut patch, hint);
        }
        writes.push((id.clone(), patch));

        let seq = self.begin(&writes)?;

        if let Some(prev) = &previous
            && let Err(err) = self.provider.stop_task(prev).await
        {
            return self.settle(seq, Err(err));
        }
        match self.provider.start_task(id, status_hint, phase_hint).await {
            Ok(receipt) => {
                let confirmed = TaskPatch {
                    run_start: Some(Some(receipt.started_at)),
                    ..TaskPatch::default()
                };
                self.confirm(seq, id, &confirmed);
                self.settle(seq, Ok(()))
            }
            Err(err) => self.settle(seq, Err(err)),
        }
    }

    /// Stop the task's execution without changing its status, clearing
    /// both run stamps. A task that is not running is a no-op.
    pub async fn stop(&self, id: &TaskId) -> Result<bool, EngineError> {
        self.ensure_live()?;
        {
            let state = self.state.borrow();
            let task = state
                .repo
                .find(id)
                .ok_or_else(|| EngineError::TaskNotFound(id.clone()))?;
            if !task.is_running() {
                return Ok(false);
            }
        }
        let patch = TaskPatch::default().with_run(None, None);
        let seq = self.begin(&[(id.clone(), patch)])?;
        let result = self.provider.stop_task(id).await;
        self.settle(seq, result)
    }

    /// Complete the task: status Done, today's completion date, run
    /// stamps cleared.
    pub async fn finish(&self, id: &TaskId) -> Result<bool, EngineError> {
        self.ensure_live()?;
        {
            let state = self.state.borrow();
            state
                .repo
                .find(id)
                .ok_or_else(|| EngineError::TaskNotFound(id.clone()))?;
        }
        let patch = TaskPatch::default()
            .with_status(Status::Done)
            .with_completion_date(Some(Local::now().date_naive()))
            .with_run(None, None);
        let seq = self.begin(&[(id.clone(), patch)])?;
        let result = self.provider.finish_task(id).await;
        self.settle(seq, result)
    }

    /// Mark the task answered, clearing its run stamps and optionally
    /// replacing its memo.
    pub async fn answer(&self, id: &TaskId, memo: Option<&str>) -> Result<bool, EngineError> {
        self.ensure_live()?;
        let mut patch = TaskPatch::default()
            .with_status(Status::Answered)
            .with_run(None, None);
        if let Some(memo) = memo {
            patch = patch.with_memo(memo);
        }
        let seq = self.begin(&[(id.clone(), patch)])?;
        let result = self.provider.answer_task(id, memo).await;
        self.settle(seq, result)
    }

    /// Push the task's scheduled date forward. Optimistically tomorrow;
    /// the store confirms the actual next business day.
    pub async fn postpone(&self, id: &TaskId) -> Result<bool, EngineError> {
        self.ensure_live()?;
        let tomorrow = Local::now()
            .date_naive()
            .checked_add_days(Days::new(1))
            .unwrap_or_else(|| Local::now().date_naive());
        let patch = TaskPatch::default().with_scheduled_date(Some(tomorrow));
        let seq = self.begin(&[(id.clone(), patch)])?;
        match self.provider.postpone_task(id).await {
            Ok(receipt) => {
                let confirmed =
                    TaskPatch::default().with_scheduled_date(Some(receipt.new_scheduled_date));
                self.confirm(seq, id, &confirmed);
                self.settle(seq, Ok(()))
            }
            Err(err) => self.settle(seq, Err(err)),
        }
    }

    /// General field edit. The requested changes are reduced to a
    /// minimal diff against current values; an empty diff is a no-op
    /// that consumes no sequence number and makes no network call.
    pub async fn edit(&self, id: &TaskId, changes: &TaskPatch) -> Result<bool, EngineError> {
        self.ensure_live()?;
        let minimal = {
            let state = self.state.borrow();
            let task = state
                .repo
                .find(id)
                .ok_or_else(|| EngineError::TaskNotFound(id.clone()))?;
            let mut after = task.clone();
            changes.apply(&mut after);
            TaskPatch::between(task, &after)
        };
        if minimal.is_empty() {
            return Ok(false);
        }
        let seq = self.begin(&[(id.clone(), minimal.clone())])?;
        let result = self.provider.update_task(id, &minimal).await;
        self.settle(seq, result)
    }

    /// Status drag-move with its deterministic side effects: entering
    /// work auto-assigns a starting phase, entering Done stamps today's
    /// completion date.
    pub async fn move_status(&self, id: &TaskId, status: Status) -> Result<bool, EngineError> {
        self.ensure_live()?;
        let patch = {
            let state = self.state.borrow();
            let task = state
                .repo
                .find(id)
                .ok_or_else(|| EngineError::TaskNotFound(id.clone()))?;
            if task.status == status {
                return Ok(false);
            }
            let mut patch = TaskPatch::default().with_status(status);
            if status == Status::InProgress
                && matches!(task.status, Status::NotStarted | Status::Deferred)
                && let Some(hint) = select_phase(task, &state.categories)
            {
                merge_hint(&mut patch, hint);
            }
            if status == Status::Done {
                patch.completion_date = Some(Some(Local::now().date_naive()));
            }
            patch
        };
        let seq = self.begin(&[(id.clone(), patch.clone())])?;
        let result = self.provider.update_task(id, &patch).await;
        self.settle(seq, result)
    }
}
