//! Console render target for the sync engine.
//!
//! Keeps an ordered card list per status column and prints the whole
//! board on demand. The engine drives it exclusively through the
//! `BoardView` trait; printing never mutates render state.

use std::collections::HashMap;

use taskdeck_core::{BoardView, CategoryIndex, Status, Task};

/// One mounted card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub id: String,
    pub label: String,
}

/// Terminal board: five columns of cards plus a sticky error line.
#[derive(Debug, Default)]
pub struct ConsoleView {
    columns: HashMap<Status, Vec<Card>>,
    error: Option<String>,
}

impl ConsoleView {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn unmount(&mut self, card: &Card) {
        for column in self.columns.values_mut() {
            column.retain(|c| c.id != card.id);
        }
    }

    /// Print the board, column by column in lifecycle order.
    pub fn print(&self) {
        if let Some(error) = &self.error {
            println!("!! {error}");
        }
        for status in Status::ALL {
            let cards = self.columns.get(&status).map_or(&[][..], Vec::as_slice);
            println!("[{status}] ({})", cards.len());
            for card in cards {
                println!("  - {}", card.label);
            }
        }
    }

    #[must_use]
    pub fn column(&self, status: Status) -> Vec<&Card> {
        self.columns
            .get(&status)
            .map_or_else(Vec::new, |c| c.iter().collect())
    }
}

fn label(task: &Task, categories: &CategoryIndex) -> String {
    let mut label = task.title.clone();
    if task.is_running() {
        label.push_str(" [running]");
    }
    if let Some(due) = task.due_date {
        label.push_str(&format!(" (due {due})"));
    }
    if let Some(id) = &task.category
        && let Some(name) = categories.name_of(id)
    {
        label.push_str(&format!(" <{name}>"));
    }
    label
}

impl BoardView for ConsoleView {
    type Node = Card;

    fn create(&mut self, _group: Status, task: &Task, categories: &CategoryIndex) -> Card {
        Card {
            id: task.id.as_str().to_string(),
            label: label(task, categories),
        }
    }

    fn insert(&mut self, group: Status, node: &Card, index: usize) {
        self.unmount(node);
        let column = self.columns.entry(group).or_default();
        let index = index.min(column.len());
        column.insert(index, node.clone());
    }

    fn remove(&mut self, _group: Status, node: &Card) {
        self.unmount(node);
    }

    fn show_error(&mut self, message: &str) {
        self.error = Some(message.to_string());
    }
}
