//! Minimal field diffs for task mutations.
//!
//! Every mutation that persists remotely is expressed as a [`TaskPatch`]:
//! only the fields that actually changed are carried, and applying the
//! patch locally is the optimistic write. `None` means "leave the field
//! alone"; for nullable fields the inner `Option` distinguishes setting
//! a value from clearing it.

use chrono::{DateTime, NaiveDate, Utc};

use crate::model::category::CategoryId;
use crate::model::task::{
    Assignee, DataChangePhase, InquiryPhase, ReviewPhase, Status, Task, TaskId,
};

/// A partial update to a single task. Round-trip invariant: applying
/// `between(a, b)` to `a` yields a task whose diff against `b` is empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub status: Option<Status>,
    pub assignee: Option<Option<Assignee>>,
    pub category: Option<Option<CategoryId>>,
    pub due_date: Option<Option<NaiveDate>>,
    pub scheduled_date: Option<Option<NaiveDate>>,
    pub completion_date: Option<Option<NaiveDate>>,
    pub run_start: Option<Option<DateTime<Utc>>>,
    pub run_end: Option<Option<DateTime<Utc>>>,
    pub memo: Option<String>,
    pub url: Option<String>,
    pub priority: Option<Option<String>>,
    pub phase_data_change: Option<Option<DataChangePhase>>,
    pub phase_inquiry: Option<Option<InquiryPhase>>,
    pub phase_review: Option<Option<ReviewPhase>>,
}

macro_rules! diff_field {
    ($patch:ident, $before:ident, $after:ident, $field:ident) => {
        if $before.$field != $after.$field {
            $patch.$field = Some($after.$field.clone());
        }
    };
}

macro_rules! apply_field {
    ($self:ident, $task:ident, $field:ident) => {
        if let Some(value) = &$self.$field {
            $task.$field = value.clone();
        }
    };
}

impl TaskPatch {
    /// Compute the minimal diff turning `before` into `after`. Identity
    /// is not diffable; both tasks are assumed to share an id.
    #[must_use]
    pub fn between(before: &Task, after: &Task) -> Self {
        let mut patch = Self::default();
        diff_field!(patch, before, after, title);
        if before.status != after.status {
            patch.status = Some(after.status);
        }
        diff_field!(patch, before, after, assignee);
        diff_field!(patch, before, after, category);
        diff_field!(patch, before, after, due_date);
        diff_field!(patch, before, after, scheduled_date);
        diff_field!(patch, before, after, completion_date);
        diff_field!(patch, before, after, run_start);
        diff_field!(patch, before, after, run_end);
        diff_field!(patch, before, after, memo);
        diff_field!(patch, before, after, url);
        diff_field!(patch, before, after, priority);
        diff_field!(patch, before, after, phase_data_change);
        diff_field!(patch, before, after, phase_inquiry);
        diff_field!(patch, before, after, phase_review);
        patch
    }

    /// Overwrite the patched fields on `task`, leaving the rest alone.
    pub fn apply(&self, task: &mut Task) {
        apply_field!(self, task, title);
        if let Some(status) = self.status {
            task.status = status;
        }
        apply_field!(self, task, assignee);
        apply_field!(self, task, category);
        apply_field!(self, task, due_date);
        apply_field!(self, task, scheduled_date);
        apply_field!(self, task, completion_date);
        apply_field!(self, task, run_start);
        apply_field!(self, task, run_end);
        apply_field!(self, task, memo);
        apply_field!(self, task, url);
        apply_field!(self, task, priority);
        apply_field!(self, task, phase_data_change);
        apply_field!(self, task, phase_inquiry);
        apply_field!(self, task, phase_review);
    }

    /// True when no field changed; such a patch is a no-op and must not
    /// consume a sequence number or hit the network.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    #[must_use]
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn with_run(mut self, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        self.run_start = Some(start);
        self.run_end = Some(end);
        self
    }

    #[must_use]
    pub fn with_scheduled_date(mut self, date: Option<NaiveDate>) -> Self {
        self.scheduled_date = Some(date);
        self
    }

    #[must_use]
    pub fn with_completion_date(mut self, date: Option<NaiveDate>) -> Self {
        self.completion_date = Some(date);
        self
    }

    #[must_use]
    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }
}

/// Fields for creating a brand-new task; the store issues the id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub status: Option<Status>,
    pub assignee: Option<Assignee>,
    pub category: Option<CategoryId>,
    pub due_date: Option<NaiveDate>,
    pub scheduled_date: Option<NaiveDate>,
    pub memo: String,
    pub url: String,
    pub priority: Option<String>,
}

impl TaskDraft {
    /// Materialize a draft into a full task once the store has issued
    /// an id.
    #[must_use]
    pub fn into_task(self, id: TaskId) -> Task {
        Task {
            id,
            title: self.title,
            status: self.status.unwrap_or(Status::NotStarted),
            assignee: self.assignee,
            category: self.category,
            due_date: self.due_date,
            scheduled_date: self.scheduled_date,
            memo: self.memo,
            url: self.url,
            priority: self.priority,
            ..Task::default()
        }
    }
}
