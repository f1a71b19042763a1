//! In-memory [`TaskProvider`] backed by a `RefCell` store.
//!
//! Serves as the reference store semantics for unit tests and demos:
//! it applies the same side effects a real backend would (authoritative
//! start timestamps, business-day postpones, completion stamping) and
//! supports one-shot failure injection.

use std::cell::RefCell;
use std::collections::VecDeque;

use chrono::{Datelike, Days, Local, NaiveDate, Utc, Weekday};
use tracing::trace;

use crate::error::ProviderError;
use crate::model::{Category, Status, Task, TaskDraft, TaskId, TaskPatch};
use crate::provider::{PhaseHint, PostponeReceipt, StartReceipt, TaskProvider};

/// The next business day after `base`: weekends are skipped, so a
/// Friday postpone lands on Monday.
#[must_use]
pub fn next_business_day(base: NaiveDate) -> NaiveDate {
    let days = match base.weekday() {
        Weekday::Fri => 3,
        Weekday::Sat => 2,
        _ => 1,
    };
    // Adding a handful of days to any representable date cannot
    // overflow chrono's range.
    base.checked_add_days(Days::new(days)).unwrap_or(base)
}

#[derive(Debug, Default)]
struct Store {
    tasks: Vec<Task>,
    categories: Vec<Category>,
    next_id: u64,
    fail_queue: VecDeque<ProviderError>,
    calls: Vec<&'static str>,
}

/// A fake task store living entirely in process memory.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    store: RefCell<Store>,
}

impl MemoryProvider {
    #[must_use]
    pub fn new(tasks: Vec<Task>, categories: Vec<Category>) -> Self {
        Self {
            store: RefCell::new(Store {
                tasks,
                categories,
                next_id: 1,
                fail_queue: VecDeque::new(),
                calls: Vec::new(),
            }),
        }
    }

    /// Queue an error; the next provider call consumes and returns it.
    pub fn fail_next(&self, err: ProviderError) {
        self.store.borrow_mut().fail_queue.push_back(err);
    }

    /// Names of every provider call made so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<&'static str> {
        self.store.borrow().calls.clone()
    }

    /// Direct read of a stored task, bypassing the provider surface.
    #[must_use]
    pub fn stored(&self, id: &TaskId) -> Option<Task> {
        self.store
            .borrow()
            .tasks
            .iter()
            .find(|t| t.id == *id)
            .cloned()
    }

    fn enter(&self, call: &'static str) -> Result<(), ProviderError> {
        trace!(call, "memory provider call");
        let mut store = self.store.borrow_mut();
        store.calls.push(call);
        match store.fail_queue.pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn with_task<R>(
        &self,
        id: &TaskId,
        f: impl FnOnce(&mut Task) -> R,
    ) -> Result<R, ProviderError> {
        let mut store = self.store.borrow_mut();
        let task = store
            .tasks
            .iter_mut()
            .find(|t| t.id == *id)
            .ok_or_else(|| ProviderError::validation(format!("unknown task: {id}")))?;
        Ok(f(task))
    }
}

impl TaskProvider for MemoryProvider {
    async fn list_tasks(&self) -> Result<Vec<Task>, ProviderError> {
        self.enter("list_tasks")?;
        Ok(self.store.borrow().tasks.clone())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, ProviderError> {
        self.enter("list_categories")?;
        Ok(self.store.borrow().categories.clone())
    }

    async fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> Result<(), ProviderError> {
        self.enter("update_task")?;
        self.with_task(id, |task| patch.apply(task))
    }

    async fn create_task(&self, draft: &TaskDraft) -> Result<TaskId, ProviderError> {
        self.enter("create_task")?;
        if draft.title.trim().is_empty() {
            return Err(ProviderError::validation("task title must not be empty"));
        }
        let mut store = self.store.borrow_mut();
        let id = TaskId::new(format!("mem-{}", store.next_id));
        store.next_id += 1;
        store.tasks.push(draft.clone().into_task(id.clone()));
        Ok(id)
    }

    async fn start_task(
        &self,
        id: &TaskId,
        status_hint: Option<Status>,
        phase_hint: Option<PhaseHint>,
    ) -> Result<StartReceipt, ProviderError> {
        self.enter("start_task")?;
        let started_at = Utc::now();
        self.with_task(id, |task| {
            task.run_start = Some(started_at);
            task.run_end = None;
            if let Some(status) = status_hint {
                task.status = status;
            }
            if let Some(hint) = phase_hint {
                hint.into_patch().apply(task);
            }
        })?;
        Ok(StartReceipt { started_at })
    }

    async fn stop_task(&self, id: &TaskId) -> Result<(), ProviderError> {
        self.enter("stop_task")?;
        self.with_task(id, Task::clear_run)
    }

    async fn finish_task(&self, id: &TaskId) -> Result<(), ProviderError> {
        self.enter("finish_task")?;
        self.with_task(id, |task| {
            task.status = Status::Done;
            task.completion_date = Some(Local::now().date_naive());
            task.clear_run();
        })
    }

    async fn answer_task(&self, id: &TaskId, memo: Option<&str>) -> Result<(), ProviderError> {
        self.enter("answer_task")?;
        self.with_task(id, |task| {
            task.status = Status::Answered;
            task.clear_run();
            if let Some(memo) = memo {
                task.memo = memo.to_string();
            }
        })
    }

    async fn postpone_task(&self, id: &TaskId) -> Result<PostponeReceipt, ProviderError> {
        self.enter("postpone_task")?;
        let new_date = self.with_task(id, |task| {
            let base = task.scheduled_date.unwrap_or_else(|| Local::now().date_naive());
            let next = next_business_day(base);
            task.scheduled_date = Some(next);
            next
        })?;
        Ok(PostponeReceipt {
            new_scheduled_date: new_date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{MemoryProvider, next_business_day};
    use crate::error::ProviderError;
    use crate::model::{Status, Task, TaskDraft, TaskId};
    use crate::provider::TaskProvider;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn business_day_skips_weekends() {
        // 2025-01-17 is a Friday.
        assert_eq!(next_business_day(date(2025, 1, 17)), date(2025, 1, 20));
        assert_eq!(next_business_day(date(2025, 1, 18)), date(2025, 1, 20));
        assert_eq!(next_business_day(date(2025, 1, 19)), date(2025, 1, 20));
        assert_eq!(next_business_day(date(2025, 1, 20)), date(2025, 1, 21));
    }

    #[tokio::test]
    async fn start_stamps_and_applies_hints() {
        let provider = MemoryProvider::new(
            vec![Task {
                id: TaskId::new("a"),
                ..Task::default()
            }],
            vec![],
        );

        let receipt = provider
            .start_task(&TaskId::new("a"), Some(Status::InProgress), None)
            .await
            .unwrap();
        let stored = provider.stored(&TaskId::new("a")).unwrap();
        assert_eq!(stored.run_start, Some(receipt.started_at));
        assert_eq!(stored.status, Status::InProgress);
        assert!(stored.is_running());
    }

    #[tokio::test]
    async fn postpone_moves_scheduled_date_past_weekend() {
        let provider = MemoryProvider::new(
            vec![Task {
                id: TaskId::new("a"),
                scheduled_date: Some(date(2025, 1, 17)),
                ..Task::default()
            }],
            vec![],
        );

        let receipt = provider.postpone_task(&TaskId::new("a")).await.unwrap();
        assert_eq!(receipt.new_scheduled_date, date(2025, 1, 20));
        assert_eq!(
            provider.stored(&TaskId::new("a")).unwrap().scheduled_date,
            Some(date(2025, 1, 20))
        );
    }

    #[tokio::test]
    async fn injected_failure_is_one_shot() {
        let provider = MemoryProvider::new(vec![], vec![]);
        provider.fail_next(ProviderError::transport("boom"));

        assert!(provider.list_tasks().await.is_err());
        assert!(provider.list_tasks().await.is_ok());
        assert_eq!(provider.calls(), vec!["list_tasks", "list_tasks"]);
    }

    #[tokio::test]
    async fn create_rejects_blank_title() {
        let provider = MemoryProvider::new(vec![], vec![]);
        let err = provider
            .create_task(&TaskDraft {
                title: "  ".to_string(),
                ..TaskDraft::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Validation { .. }));

        let id = provider
            .create_task(&TaskDraft {
                title: "real".to_string(),
                ..TaskDraft::default()
            })
            .await
            .unwrap();
        assert!(provider.stored(&id).is_some());
    }
}
