//! Shared fixtures: task/category builders, a gate-controlled provider
//! for scripting in-flight interleavings, and a recording view.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use chrono::{Local, NaiveDate, Utc};
use tokio::sync::oneshot;

use taskdeck_core::{
    Assignee, BoardView, Category, CategoryId, CategoryIndex, EngineConfig, MemoryProvider,
    PhaseHint, PostponeReceipt, ProviderError, StartReceipt, Status, Task, TaskDraft, TaskId,
    TaskPatch, TaskProvider,
};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn task(id: &str, title: &str, status: Status) -> Task {
    Task {
        id: TaskId::new(id),
        title: title.to_string(),
        status,
        ..Task::default()
    }
}

pub fn running_task(id: &str, title: &str) -> Task {
    Task {
        run_start: Some(Utc::now()),
        status: Status::InProgress,
        ..task(id, title, Status::InProgress)
    }
}

pub fn data_change_category(id: &str) -> Category {
    Category {
        id: CategoryId::new(id),
        name: "Data Change / Production".to_string(),
        color: None,
        parent: Some("Operations".to_string()),
    }
}

pub fn inquiry_category(id: &str) -> Category {
    Category {
        id: CategoryId::new(id),
        name: "Customer Inquiry".to_string(),
        color: None,
        parent: Some("Support".to_string()),
    }
}

/// Config with polling disabled so tests drive every refresh.
pub fn manual_config() -> EngineConfig {
    EngineConfig {
        poll_ms: 0,
        ..EngineConfig::default()
    }
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Let spawned local tasks run up to their next suspension point.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

type Gate = oneshot::Receiver<Result<(), ProviderError>>;

/// Provider wrapper that can park named calls until the test releases
/// them with an outcome, exposing the in-flight window between the
/// optimistic write and remote resolution. Clones share state.
pub struct GatedProvider {
    inner: Rc<MemoryProvider>,
    gates: Rc<RefCell<HashMap<&'static str, VecDeque<Gate>>>>,
}

impl Clone for GatedProvider {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            gates: Rc::clone(&self.gates),
        }
    }
}

impl GatedProvider {
    pub fn new(tasks: Vec<Task>, categories: Vec<Category>) -> Self {
        Self {
            inner: Rc::new(MemoryProvider::new(tasks, categories)),
            gates: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    /// Arm a gate for the next `call`; the returned sender releases it
    /// with an outcome. `Err` makes the call fail without reaching the
    /// store. Dropping the sender releases with `Ok`.
    pub fn gate(&self, call: &'static str) -> oneshot::Sender<Result<(), ProviderError>> {
        let (tx, rx) = oneshot::channel();
        self.gates.borrow_mut().entry(call).or_default().push_back(rx);
        tx
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.inner.calls()
    }

    pub fn stored(&self, id: &TaskId) -> Option<Task> {
        self.inner.stored(id)
    }

    async fn pass(&self, call: &'static str) -> Result<(), ProviderError> {
        let gate = self
            .gates
            .borrow_mut()
            .get_mut(call)
            .and_then(VecDeque::pop_front);
        match gate {
            Some(rx) => rx.await.unwrap_or(Ok(())),
            None => Ok(()),
        }
    }
}

impl TaskProvider for GatedProvider {
    async fn list_tasks(&self) -> Result<Vec<Task>, ProviderError> {
        self.pass("list_tasks").await?;
        self.inner.list_tasks().await
    }

    async fn list_categories(&self) -> Result<Vec<Category>, ProviderError> {
        self.pass("list_categories").await?;
        self.inner.list_categories().await
    }

    async fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> Result<(), ProviderError> {
        self.pass("update_task").await?;
        self.inner.update_task(id, patch).await
    }

    async fn create_task(&self, draft: &TaskDraft) -> Result<TaskId, ProviderError> {
        self.pass("create_task").await?;
        self.inner.create_task(draft).await
    }

    async fn start_task(
        &self,
        id: &TaskId,
        status_hint: Option<Status>,
        phase_hint: Option<PhaseHint>,
    ) -> Result<StartReceipt, ProviderError> {
        self.pass("start_task").await?;
        self.inner.start_task(id, status_hint, phase_hint).await
    }

    async fn stop_task(&self, id: &TaskId) -> Result<(), ProviderError> {
        self.pass("stop_task").await?;
        self.inner.stop_task(id).await
    }

    async fn finish_task(&self, id: &TaskId) -> Result<(), ProviderError> {
        self.pass("finish_task").await?;
        self.inner.finish_task(id).await
    }

    async fn answer_task(&self, id: &TaskId, memo: Option<&str>) -> Result<(), ProviderError> {
        self.pass("answer_task").await?;
        self.inner.answer_task(id, memo).await
    }

    async fn postpone_task(&self, id: &TaskId) -> Result<PostponeReceipt, ProviderError> {
        self.pass("postpone_task").await?;
        self.inner.postpone_task(id).await
    }
}

/// View that records mounted order per column and counts node builds.
#[derive(Default)]
pub struct RecordingView {
    pub columns: HashMap<Status, Vec<String>>,
    pub creates: usize,
    pub errors: Vec<String>,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column(&self, status: Status) -> Vec<String> {
        self.columns.get(&status).cloned().unwrap_or_default()
    }
}

impl BoardView for RecordingView {
    type Node = String;

    fn create(&mut self, _group: Status, task: &Task, _categories: &CategoryIndex) -> String {
        self.creates += 1;
        task.id.as_str().to_string()
    }

    fn insert(&mut self, group: Status, node: &String, index: usize) {
        for column in self.columns.values_mut() {
            column.retain(|n| n != node);
        }
        let column = self.columns.entry(group).or_default();
        let index = index.min(column.len());
        column.insert(index, node.clone());
    }

    fn remove(&mut self, _group: Status, node: &String) {
        for column in self.columns.values_mut() {
            column.retain(|n| n != node);
        }
    }

    fn show_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }
}

/// One `Assignee` value for builders that need any assignee.
pub const PRIMARY: Option<Assignee> = Some(Assignee::Primary);
