//! Task-board data model: tasks, categories, and minimal field diffs.

pub mod category;
pub mod patch;
pub mod task;

pub use category::{Category, CategoryId, CategoryIndex, DEFAULT_COLOR};
pub use patch::{TaskDraft, TaskPatch};
pub use task::{
    Assignee, DataChangePhase, InquiryPhase, ParseEnumError, ReviewPhase, Status, Task, TaskId,
};
