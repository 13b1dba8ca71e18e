//! Core types for the TodoMVC data model

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Storage key the app persists its list under
pub const DEFAULT_STORAGE_KEY: &str = "react-todos";

/// One to-do record, serialized exactly as the app stores it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

impl TodoItem {
    /// New active item with a random id
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            completed: false,
        }
    }

    pub fn with_id(id: impl Into<String>, title: impl Into<String>, completed: bool) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            completed,
        }
    }
}

/// View predicate selected by the URL fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    All,
    Active,
    Completed,
}

impl Default for Filter {
    fn default() -> Self {
        Self::All
    }
}

impl Filter {
    pub const ALL: [Filter; 3] = [Filter::All, Filter::Active, Filter::Completed];

    /// Parse a navigation fragment such as `#/active`.
    ///
    /// Anything unrecognised falls back to `All`, matching the app router.
    pub fn from_fragment(fragment: &str) -> Self {
        match fragment.trim_start_matches('#').trim_matches('/') {
            "active" => Filter::Active,
            "completed" => Filter::Completed,
            _ => Filter::All,
        }
    }

    /// Parse the fragment out of a full or relative URL
    pub fn from_url(url: &str) -> Self {
        match url.split_once('#') {
            Some((_, fragment)) => Self::from_fragment(fragment),
            None => Filter::All,
        }
    }

    /// Target fragment of the filter link
    pub fn href(&self) -> &'static str {
        match self {
            Filter::All => "#/",
            Filter::Active => "#/active",
            Filter::Completed => "#/completed",
        }
    }

    /// Link text shown in the footer
    pub fn label(&self) -> &'static str {
        match self {
            Filter::All => "All",
            Filter::Active => "Active",
            Filter::Completed => "Completed",
        }
    }

    pub fn matches(&self, item: &TodoItem) -> bool {
        match self {
            Filter::All => true,
            Filter::Active => !item.completed,
            Filter::Completed => item.completed,
        }
    }
}

impl std::fmt::Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Filter::All => write!(f, "all"),
            Filter::Active => write!(f, "active"),
            Filter::Completed => write!(f, "completed"),
        }
    }
}

/// Ordered list of todos; insertion order is display order.
///
/// `push` keeps ids unique, but deserializing takes the stored array as
/// is, duplicates included, the same way the app reads it back. Lookups by
/// id then act on the first match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoList {
    items: Vec<TodoItem>,
}

impl TodoList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a list, dropping later duplicates of an id.
    /// Use serde to keep an array exactly as stored.
    pub fn from_items(items: Vec<TodoItem>) -> Self {
        let mut list = Self::new();
        for item in items {
            list.push(item);
        }
        list
    }

    /// Append an item. Returns false if the id is already taken.
    pub fn push(&mut self, item: TodoItem) -> bool {
        if self.get(&item.id).is_some() {
            return false;
        }
        self.items.push(item);
        true
    }

    pub fn get(&self, id: &str) -> Option<&TodoItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut TodoItem> {
        self.items.iter_mut().find(|item| item.id == id)
    }

    pub fn remove(&mut self, id: &str) -> Option<TodoItem> {
        let index = self.items.iter().position(|item| item.id == id)?;
        Some(self.items.remove(index))
    }

    /// Drop every completed item, returning how many were removed
    pub fn retain_active(&mut self) -> usize {
        let before = self.items.len();
        self.items.retain(|item| !item.completed);
        before - self.items.len()
    }

    pub fn items(&self) -> &[TodoItem] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TodoItem> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, TodoItem> {
        self.items.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn visible(&self, filter: Filter) -> Vec<&TodoItem> {
        self.items.iter().filter(|item| filter.matches(item)).collect()
    }

    pub fn active(&self) -> Vec<&TodoItem> {
        self.visible(Filter::Active)
    }

    pub fn completed(&self) -> Vec<&TodoItem> {
        self.visible(Filter::Completed)
    }

    pub fn active_count(&self) -> usize {
        self.items.iter().filter(|item| !item.completed).count()
    }

    pub fn completed_count(&self) -> usize {
        self.items.len() - self.active_count()
    }

    /// True when every item is completed (vacuously true when empty)
    pub fn all_completed(&self) -> bool {
        self.items.iter().all(|item| item.completed)
    }

    pub fn into_items(self) -> Vec<TodoItem> {
        self.items
    }
}

impl<'a> IntoIterator for &'a TodoList {
    type Item = &'a TodoItem;
    type IntoIter = std::slice::Iter<'a, TodoItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Footer text for the number of active items
pub fn remaining_label(active: usize) -> String {
    let noun = if active == 1 { "item" } else { "items" };
    format!("{} {} left", active, noun)
}
