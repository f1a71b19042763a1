use serde::{Deserialize, Serialize};
use std::fmt;

/// Fallback color used when a task has no category or the category
/// carries no color of its own.
pub const DEFAULT_COLOR: &str = "#6b7280";

/// Opaque category identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(String);

impl CategoryId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CategoryId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A category record. Read-only from the sync core's perspective;
/// loaded once per session and cached with a longer TTL than tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub parent: Option<String>,
}

/// Lookup view over the loaded category collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryIndex {
    categories: Vec<Category>,
}

impl CategoryIndex {
    #[must_use]
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    #[must_use]
    pub fn by_id(&self, id: &CategoryId) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == *id)
    }

    #[must_use]
    pub fn name_of(&self, id: &CategoryId) -> Option<&str> {
        self.by_id(id).map(|c| c.name.as_str())
    }

    #[must_use]
    pub fn parent_of(&self, id: &CategoryId) -> Option<&str> {
        self.by_id(id).and_then(|c| c.parent.as_deref())
    }

    #[must_use]
    pub fn color_of(&self, id: &CategoryId) -> &str {
        self.by_id(id)
            .and_then(|c| c.color.as_deref())
            .unwrap_or(DEFAULT_COLOR)
    }

    /// Distinct parent-category names, sorted, for filter UIs.
    #[must_use]
    pub fn parents(&self) -> Vec<&str> {
        let mut parents: Vec<&str> = self
            .categories
            .iter()
            .filter_map(|c| c.parent.as_deref())
            .collect();
        parents.sort_unstable();
        parents.dedup();
        parents
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
