//! Signature-based differential board rendering.
//!
//! The renderer never rebuilds the board wholesale. Each reconcile pass
//! computes, per status group, the minimal set of create / reuse /
//! reposition / remove operations against an abstract [`BoardView`],
//! using per-task signatures to detect unchanged rows. Refreshes arrive
//! on a fixed short interval whether or not anything changed, so the
//! steady-state pass must touch nothing.

pub mod filter;

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use tracing::debug;

use crate::model::{CategoryIndex, Status, Task, TaskId};
use crate::signature::TaskSignature;

pub use filter::{FilterSet, visible};

/// Abstract render target. `create` builds a node for a task entering
/// `group`, resolving display lookups (category name, color, parent)
/// through the index. `insert` places a node at `index` within a group,
/// moving it there if it is already mounted elsewhere; `remove` must
/// tolerate nodes that are not currently mounted.
pub trait BoardView {
    type Node: Clone;

    fn create(&mut self, group: Status, task: &Task, categories: &CategoryIndex) -> Self::Node;
    fn insert(&mut self, group: Status, node: &Self::Node, index: usize);
    fn remove(&mut self, group: Status, node: &Self::Node);
    fn show_error(&mut self, message: &str);
}

/// What one reconcile pass actually did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Nodes newly constructed (missing or stale-signature entries).
    pub created: usize,
    /// Nodes reused unchanged from the cache.
    pub reused: usize,
    /// Nodes removed from the view.
    pub removed: usize,
    /// Reused nodes that had to be repositioned.
    pub moved: usize,
}

struct CacheEntry<N> {
    signature: TaskSignature,
    node: N,
    group: Status,
}

/// Differential reconciler with a per-task render cache.
pub struct BoardRenderer<V: BoardView> {
    cache: HashMap<TaskId, CacheEntry<V::Node>>,
    /// Mounted id order per group, as of the last pass.
    order: HashMap<Status, Vec<TaskId>>,
    last_stats: RenderStats,
}

impl<V: BoardView> Default for BoardRenderer<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: BoardView> BoardRenderer<V> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
            order: HashMap::new(),
            last_stats: RenderStats::default(),
        }
    }

    #[must_use]
    pub const fn last_stats(&self) -> RenderStats {
        self.last_stats
    }

    /// Bring `view` up to date with the authoritative collection.
    pub fn reconcile(
        &mut self,
        view: &mut V,
        tasks: &[Task],
        filters: &FilterSet,
        categories: &CategoryIndex,
        today: NaiveDate,
    ) -> RenderStats {
        let mut stats = RenderStats::default();

        let grouped: Vec<(Status, Vec<&Task>)> = Status::ALL
            .iter()
            .map(|&g| (g, visible(tasks, g, filters, categories, today)))
            .collect();

        // Unmount everything leaving its group before any mounting, so
        // a cross-group move cannot strand its old node.
        for (group, visible_tasks) in &grouped {
            let keep: HashSet<&TaskId> = visible_tasks.iter().map(|t| &t.id).collect();
            for id in self.order.get(group).map_or(&[][..], Vec::as_slice) {
                if keep.contains(id) {
                    continue;
                }
                if let Some(entry) = self.cache.get(id)
                    && entry.group == *group
                {
                    view.remove(*group, &entry.node);
                    stats.removed += 1;
                }
            }
        }

        for (group, visible_tasks) in &grouped {
            let old_order = self.order.remove(group).unwrap_or_default();
            let mut new_order = Vec::with_capacity(visible_tasks.len());

            // Surviving old ids in their mounted order; reused nodes
            // already in relative order need no repositioning.
            let keep: HashSet<&TaskId> = visible_tasks.iter().map(|t| &t.id).collect();
            let surviving: Vec<&TaskId> =
                old_order.iter().filter(|id| keep.contains(id)).collect();
            let mut cursor = 0;

            for (index, task) in visible_tasks.iter().enumerate() {
                let signature = TaskSignature::of(task);
                let reusable = self
                    .cache
                    .get(&task.id)
                    .is_some_and(|e| e.signature == signature);

                // The cursor tracks surviving ids whether or not their
                // node is reused; a recreated row is still in place and
                // must not push later rows into "moved".
                let in_place = surviving.get(cursor).is_some_and(|id| **id == task.id);
                if in_place {
                    cursor += 1;
                }

                if reusable {
                    stats.reused += 1;
                    if !in_place && let Some(entry) = self.cache.get(&task.id) {
                        view.insert(*group, &entry.node, index);
                        stats.moved += 1;
                    }
                } else {
                    // Stale node for this id still mounted in this
                    // group: replace it.
                    if let Some(entry) = self.cache.get(&task.id)
                        && entry.group == *group
                        && old_order.contains(&task.id)
                    {
                        view.remove(*group, &entry.node);
                    }
                    let node = view.create(*group, task, categories);
                    view.insert(*group, &node, index);
                    stats.created += 1;
                    self.cache.insert(
                        task.id.clone(),
                        CacheEntry {
                            signature,
                            node,
                            group: *group,
                        },
                    );
                }
                new_order.push(task.id.clone());
            }

            self.order.insert(*group, new_order);
        }

        // Drop cache entries only for ids gone from the collection
        // itself; filtered-out tasks keep theirs for cheap re-entry.
        let known: HashSet<&TaskId> = tasks.iter().map(|t| &t.id).collect();
        self.cache.retain(|id, _| known.contains(id));

        debug!(
            created = stats.created,
            reused = stats.reused,
            removed = stats.removed,
            moved = stats.moved,
            "board reconciled"
        );
        self.last_stats = stats;
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::{BoardRenderer, BoardView, FilterSet};
    use crate::model::{Category, CategoryId, CategoryIndex, Status, Task, TaskId};
    use chrono::NaiveDate;
    use std::collections::HashMap;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    fn task(id: &str, title: &str, status: Status) -> Task {
        Task {
            id: TaskId::new(id),
            title: title.to_string(),
            status,
            ..Task::default()
        }
    }

    /// Records mounted id order per group.
    #[derive(Default)]
    struct TestView {
        columns: HashMap<Status, Vec<String>>,
        creates: usize,
        errors: Vec<String>,
    }

    impl TestView {
        fn column(&self, group: Status) -> Vec<String> {
            self.columns.get(&group).cloned().unwrap_or_default()
        }
    }

    impl BoardView for TestView {
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

    fn reconcile(
        renderer: &mut BoardRenderer<TestView>,
        view: &mut TestView,
        tasks: &[Task],
    ) -> super::RenderStats {
        renderer.reconcile(
            view,
            tasks,
            &FilterSet::default(),
            &CategoryIndex::default(),
            today(),
        )
    }

    #[test]
    fn identical_rerender_constructs_nothing() {
        let mut renderer = BoardRenderer::new();
        let mut view = TestView::default();
        let tasks = vec![
            task("a", "A", Status::NotStarted),
            task("b", "B", Status::InProgress),
        ];

        let first = reconcile(&mut renderer, &mut view, &tasks);
        assert_eq!(first.created, 2);

        let second = reconcile(&mut renderer, &mut view, &tasks);
        assert_eq!(second.created, 0);
        assert_eq!(second.reused, 2);
        assert_eq!(second.moved, 0);
        assert_eq!(view.creates, 2);
    }

    #[test]
    fn field_change_rebuilds_only_that_row() {
        let mut renderer = BoardRenderer::new();
        let mut view = TestView::default();
        let mut tasks = vec![
            task("a", "A", Status::NotStarted),
            task("b", "B", Status::NotStarted),
        ];
        reconcile(&mut renderer, &mut view, &tasks);

        tasks[0].title = "A2".to_string();
        let stats = reconcile(&mut renderer, &mut view, &tasks);
        assert_eq!(stats.created, 1);
        assert_eq!(stats.reused, 1);
        assert_eq!(stats.moved, 0);
        assert_eq!(view.column(Status::NotStarted), vec!["a", "b"]);
    }

    #[test]
    fn recreated_row_does_not_displace_followers() {
        let mut renderer = BoardRenderer::new();
        let mut view = TestView::default();
        let mut tasks = vec![
            task("a", "A", Status::NotStarted),
            task("b", "B", Status::NotStarted),
            task("c", "C", Status::NotStarted),
        ];
        reconcile(&mut renderer, &mut view, &tasks);

        // Rebuilding the first row must not count the untouched rows
        // behind it as repositioned.
        tasks[0].title = "A2".to_string();
        let stats = reconcile(&mut renderer, &mut view, &tasks);
        assert_eq!(stats.created, 1);
        assert_eq!(stats.reused, 2);
        assert_eq!(stats.moved, 0);
        assert_eq!(view.column(Status::NotStarted), vec!["a", "b", "c"]);
    }

    #[test]
    fn create_resolves_category_display_data() {
        /// Node carries what the index resolved at creation time.
        #[derive(Default)]
        struct ColorView;

        impl BoardView for ColorView {
            type Node = (Status, String);

            fn create(
                &mut self,
                group: Status,
                task: &Task,
                categories: &CategoryIndex,
            ) -> Self::Node {
                let color = categories.color_of(task.category.as_ref().unwrap());
                (group, color.to_string())
            }

            fn insert(&mut self, _group: Status, _node: &Self::Node, _index: usize) {}
            fn remove(&mut self, _group: Status, _node: &Self::Node) {}
            fn show_error(&mut self, _message: &str) {}
        }

        let categories = CategoryIndex::new(vec![Category {
            id: CategoryId::new("c-1"),
            name: "Data Change / Production".to_string(),
            color: Some("#2383e2".to_string()),
            parent: None,
        }]);
        let mut t = task("a", "A", Status::InProgress);
        t.category = Some(CategoryId::new("c-1"));

        let mut renderer: BoardRenderer<ColorView> = BoardRenderer::new();
        let mut view = ColorView::default();
        renderer.reconcile(&mut view, &[t.clone()], &FilterSet::default(), &categories, today());

        let entry = renderer.cache.get(&t.id).unwrap();
        assert_eq!(entry.node, (Status::InProgress, "#2383e2".to_string()));
    }

    #[test]
    fn cross_group_move_unmounts_the_old_node() {
        let mut renderer = BoardRenderer::new();
        let mut view = TestView::default();
        let mut tasks = vec![task("a", "A", Status::NotStarted)];
        reconcile(&mut renderer, &mut view, &tasks);
        assert_eq!(view.column(Status::NotStarted), vec!["a"]);

        tasks[0].status = Status::InProgress;
        let stats = reconcile(&mut renderer, &mut view, &tasks);
        assert_eq!(stats.created, 1);
        assert_eq!(stats.removed, 1);
        assert!(view.column(Status::NotStarted).is_empty());
        assert_eq!(view.column(Status::InProgress), vec!["a"]);
    }

    #[test]
    fn reorder_repositions_without_rebuilding() {
        let mut renderer = BoardRenderer::new();
        let mut view = TestView::default();
        let mut a = task("a", "A", Status::NotStarted);
        a.due_date = NaiveDate::from_ymd_opt(2025, 1, 1);
        let mut b = task("b", "B", Status::NotStarted);
        b.due_date = NaiveDate::from_ymd_opt(2025, 2, 1);
        let tasks = vec![a.clone(), b.clone()];
        reconcile(&mut renderer, &mut view, &tasks);
        assert_eq!(view.column(Status::NotStarted), vec!["a", "b"]);

        // Swap due dates so the order flips but content signatures of
        // both rows change; recreate both, order follows the sort.
        let mut a2 = a;
        a2.due_date = NaiveDate::from_ymd_opt(2025, 3, 1);
        let stats = reconcile(&mut renderer, &mut view, &[a2, b]);
        assert_eq!(stats.created, 1);
        assert_eq!(view.column(Status::NotStarted), vec!["b", "a"]);
    }

    #[test]
    fn vanished_id_is_removed_and_cache_purged() {
        let mut renderer = BoardRenderer::new();
        let mut view = TestView::default();
        let tasks = vec![
            task("a", "A", Status::NotStarted),
            task("b", "B", Status::NotStarted),
        ];
        reconcile(&mut renderer, &mut view, &tasks);

        let remaining = vec![tasks[1].clone()];
        let stats = reconcile(&mut renderer, &mut view, &remaining);
        assert_eq!(stats.removed, 1);
        assert_eq!(view.column(Status::NotStarted), vec!["b"]);
        assert!(!renderer.cache.contains_key(&TaskId::new("a")));
    }

    #[test]
    fn filtered_out_task_keeps_its_cache_entry() {
        let mut renderer = BoardRenderer::new();
        let mut view = TestView::default();
        let mut tasks = vec![task("a", "A", Status::NotStarted)];
        reconcile(&mut renderer, &mut view, &tasks);

        // Scheduling for today hides the row but the id is still in the
        // collection, so its cache entry survives. The row's signature
        // changed, so re-entry recreates the node.
        tasks[0].scheduled_date = Some(today());
        let stats = reconcile(&mut renderer, &mut view, &tasks);
        assert_eq!(stats.removed, 1);
        assert!(renderer.cache.contains_key(&TaskId::new("a")));
        assert!(view.column(Status::NotStarted).is_empty());
    }
}
