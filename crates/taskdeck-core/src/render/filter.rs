//! Visibility predicates and ordering for the rendered board.
//!
//! Filtering never touches the repository; it is a pure projection
//! applied per status group just before reconciliation. The terminal
//! group (`Done`) has its own rule — only today's completions — while
//! every other group hides tasks scheduled for today or earlier unless
//! the include toggle is on.

use chrono::NaiveDate;

use crate::model::{Assignee, CategoryIndex, Status, Task};

/// The active filter predicate set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    /// Keep only tasks with exactly this assignee.
    pub assignee: Option<Assignee>,
    /// Keep only tasks whose category has this parent name.
    pub parent_category: Option<String>,
    /// Also show tasks scheduled for today or earlier (hidden by
    /// default in every group except `Done`).
    pub include_scheduled: bool,
}

impl FilterSet {
    fn admits(
        &self,
        task: &Task,
        group: Status,
        categories: &CategoryIndex,
        today: NaiveDate,
    ) -> bool {
        if let Some(assignee) = self.assignee
            && task.assignee != Some(assignee)
        {
            return false;
        }
        if let Some(parent) = self.parent_category.as_deref() {
            let task_parent = task.category.as_ref().and_then(|id| categories.parent_of(id));
            if task_parent != Some(parent) {
                return false;
            }
        }
        if group == Status::Done {
            return task.completion_date == Some(today);
        }
        if !self.include_scheduled
            && let Some(scheduled) = task.scheduled_date
            && scheduled <= today
        {
            return false;
        }
        true
    }
}

/// The tasks visible in one status group, in render order: due date
/// ascending with undated tasks last, then case-insensitive title.
#[must_use]
pub fn visible<'a>(
    tasks: &'a [Task],
    group: Status,
    filters: &FilterSet,
    categories: &CategoryIndex,
    today: NaiveDate,
) -> Vec<&'a Task> {
    let mut picked: Vec<&Task> = tasks
        .iter()
        .filter(|t| t.status == group && filters.admits(t, group, categories, today))
        .collect();
    picked.sort_by(|a, b| {
        let due = match (a.due_date, b.due_date) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        };
        due.then_with(|| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
    });
    picked
}
