//! Reference model of the TodoMVC app's observable behaviour
//!
//! Mirrors what a user can do through the UI: add, edit, toggle, delete and
//! clear completed. Used by the headless driver to stand in for the real app
//! and by tests that check list invariants without a browser.

use crate::types::{remaining_label, Filter, TodoItem, TodoList};
use crate::{Error, Result};

#[derive(Debug, Clone, Default)]
pub struct TodoModel {
    list: TodoList,
    max_title_length: Option<usize>,
}

impl TodoModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_list(list: TodoList) -> Self {
        Self {
            list,
            max_title_length: None,
        }
    }

    /// Cap titles at `max` characters, as the input's `maxlength` does
    pub fn with_max_title_length(mut self, max: Option<usize>) -> Self {
        self.max_title_length = max;
        self
    }

    pub fn max_title_length(&self) -> Option<usize> {
        self.max_title_length
    }

    pub fn list(&self) -> &TodoList {
        &self.list
    }

    pub fn replace_list(&mut self, list: TodoList) {
        self.list = list;
    }

    fn normalize(&self, title: &str) -> Result<String> {
        let trimmed = title.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidTitle("title is blank".to_string()));
        }
        let title = match self.max_title_length {
            Some(max) => trimmed.chars().take(max).collect(),
            None => trimmed.to_string(),
        };
        Ok(title)
    }

    /// Append a new active item. Blank titles are rejected.
    pub fn add(&mut self, title: &str) -> Result<&TodoItem> {
        let title = self.normalize(title)?;
        let item = TodoItem::new(title);
        let id = item.id.clone();
        self.list.push(item);
        self.find(&id)
    }

    /// Change an item's title. Editing down to blank deletes the item.
    ///
    /// Returns `Ok(false)` when the edit removed the item.
    pub fn edit(&mut self, id: &str, title: &str) -> Result<bool> {
        match self.normalize(title) {
            Ok(title) => {
                self.find_mut(id)?.title = title;
                Ok(true)
            }
            Err(Error::InvalidTitle(_)) => {
                self.destroy(id)?;
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Flip completion, returning the new state
    pub fn toggle(&mut self, id: &str) -> Result<bool> {
        let item = self.find_mut(id)?;
        item.completed = !item.completed;
        Ok(item.completed)
    }

    pub fn set_completed(&mut self, id: &str, completed: bool) -> Result<()> {
        self.find_mut(id)?.completed = completed;
        Ok(())
    }

    pub fn toggle_all(&mut self, completed: bool) {
        for item in self.list.iter_mut() {
            item.completed = completed;
        }
    }

    pub fn destroy(&mut self, id: &str) -> Result<TodoItem> {
        self.list.remove(id).ok_or_else(|| Error::NotFound { id: id.to_string() })
    }

    pub fn clear_completed(&mut self) -> usize {
        self.list.retain_active()
    }

    pub fn visible(&self, filter: Filter) -> Vec<&TodoItem> {
        self.list.visible(filter)
    }

    pub fn remaining_label(&self) -> String {
        remaining_label(self.list.active_count())
    }

    fn find(&self, id: &str) -> Result<&TodoItem> {
        self.list.get(id).ok_or_else(|| Error::NotFound { id: id.to_string() })
    }

    fn find_mut(&mut self, id: &str) -> Result<&mut TodoItem> {
        self.list
            .get_mut(id)
            .ok_or_else(|| Error::NotFound { id: id.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(model: &TodoModel, filter: Filter) -> Vec<String> {
        model.visible(filter).iter().map(|i| i.title.clone()).collect()
    }

    #[test]
    fn test_add_appends_in_insertion_order() {
        let mut model = TodoModel::new();
        for title in ["a", "b", "c", "d"] {
            let item = model.add(title).unwrap();
            assert!(!item.completed);
        }
        assert_eq!(titles(&model, Filter::All), ["a", "b", "c", "d"]);
    }

    #[test]
    fn test_add_trims_and_rejects_blank() {
        let mut model = TodoModel::new();
        assert_eq!(model.add("  Plan holidays  ").unwrap().title, "Plan holidays");
        assert!(matches!(model.add("   "), Err(Error::InvalidTitle(_))));
        assert!(matches!(model.add(""), Err(Error::InvalidTitle(_))));
        assert_eq!(model.list().len(), 1);
    }

    #[test]
    fn test_max_title_length_truncates() {
        let mut model = TodoModel::new().with_max_title_length(Some(5));
        assert_eq!(model.add("abcdefgh").unwrap().title, "abcde");
    }

    #[test]
    fn test_edit_updates_title() {
        let mut model = TodoModel::new();
        let id = model.add("Plan holidays for September").unwrap().id.clone();
        assert!(model
            .edit(&id, "Plan holidays for September 20th - 25th")
            .unwrap());
        assert_eq!(
            titles(&model, Filter::All),
            ["Plan holidays for September 20th - 25th"]
        );
    }

    #[test]
    fn test_edit_to_blank_destroys() {
        let mut model = TodoModel::new();
        let id = model.add("gone soon").unwrap().id.clone();
        assert!(!model.edit(&id, "  ").unwrap());
        assert!(model.list().is_empty());
    }

    #[test]
    fn test_double_toggle_restores_state() {
        let mut model = TodoModel::new();
        let id = model.add("x").unwrap().id.clone();
        assert!(model.toggle(&id).unwrap());
        assert!(!model.toggle(&id).unwrap());
        assert!(!model.list().get(&id).unwrap().completed);
    }

    #[test]
    fn test_unknown_id_is_not_found() {
        let mut model = TodoModel::new();
        assert!(matches!(model.toggle("nope"), Err(Error::NotFound { .. })));
        assert!(matches!(model.destroy("nope"), Err(Error::NotFound { .. })));
    }

    #[test]
    fn test_clear_completed_and_remaining_label() {
        let mut model = TodoModel::new();
        let a = model.add("a").unwrap().id.clone();
        model.add("b").unwrap();
        model.set_completed(&a, true).unwrap();
        assert_eq!(model.remaining_label(), "1 item left");

        assert_eq!(model.clear_completed(), 1);
        assert_eq!(titles(&model, Filter::All), ["b"]);

        model.toggle_all(true);
        assert_eq!(model.remaining_label(), "0 items left");
        assert!(model.list().all_completed());
    }

    #[test]
    fn test_active_and_completed_partition_all() {
        let mut model = TodoModel::new();
        let ids: Vec<String> = (0..6)
            .map(|i| model.add(&format!("item {}", i)).unwrap().id.clone())
            .collect();
        for id in ids.iter().step_by(2) {
            model.toggle(id).unwrap();
        }

        let all = titles(&model, Filter::All);
        let active = titles(&model, Filter::Active);
        let completed = titles(&model, Filter::Completed);
        assert_eq!(active.len() + completed.len(), all.len());
        assert!(active.iter().all(|t| !completed.contains(t)));
        assert_eq!(completed, ["item 0", "item 2", "item 4"]);
    }
}
