//! Seed data for persisted storage

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::error::{E2eError, E2eResult};
use todomvc_common::{TodoItem, DEFAULT_STORAGE_KEY};

/// On-disk fixture: a storage key and the list stored under it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageFixture {
    pub key: String,
    pub value: Vec<TodoItem>,
}

impl StorageFixture {
    /// The standard list under the app's default key
    pub fn standard() -> Self {
        Self {
            key: DEFAULT_STORAGE_KEY.to_string(),
            value: standard_items(),
        }
    }

    pub fn from_json(json: &str) -> E2eResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn active(&self) -> Vec<&TodoItem> {
        self.value.iter().filter(|item| !item.completed).collect()
    }

    pub fn completed(&self) -> Vec<&TodoItem> {
        self.value.iter().filter(|item| item.completed).collect()
    }
}

/// Fixed seed list: 5 active and 10 completed items, interleaved
pub fn standard_items() -> Vec<TodoItem> {
    [
        ("0c6b2a0e-5f8e-4f5b-9b1e-0d3c1f4a7e01", "Book flights to Lisbon", true),
        ("0c6b2a0e-5f8e-4f5b-9b1e-0d3c1f4a7e02", "Renew passport", true),
        ("0c6b2a0e-5f8e-4f5b-9b1e-0d3c1f4a7e03", "Reserve hotel near Alfama", false),
        ("0c6b2a0e-5f8e-4f5b-9b1e-0d3c1f4a7e04", "Buy travel adapter", true),
        ("0c6b2a0e-5f8e-4f5b-9b1e-0d3c1f4a7e05", "Exchange currency", true),
        ("0c6b2a0e-5f8e-4f5b-9b1e-0d3c1f4a7e06", "Water the plants", false),
        ("0c6b2a0e-5f8e-4f5b-9b1e-0d3c1f4a7e07", "Pay electricity bill", true),
        ("0c6b2a0e-5f8e-4f5b-9b1e-0d3c1f4a7e08", "Call grandma", true),
        ("0c6b2a0e-5f8e-4f5b-9b1e-0d3c1f4a7e09", "Pick up dry cleaning", false),
        ("0c6b2a0e-5f8e-4f5b-9b1e-0d3c1f4a7e10", "Schedule dentist appointment", true),
        ("0c6b2a0e-5f8e-4f5b-9b1e-0d3c1f4a7e11", "Return library books", true),
        ("0c6b2a0e-5f8e-4f5b-9b1e-0d3c1f4a7e12", "Fix the bike tyre", false),
        ("0c6b2a0e-5f8e-4f5b-9b1e-0d3c1f4a7e13", "Order birthday cake", true),
        ("0c6b2a0e-5f8e-4f5b-9b1e-0d3c1f4a7e14", "Clean the fridge", true),
        ("0c6b2a0e-5f8e-4f5b-9b1e-0d3c1f4a7e15", "Write thank-you notes", false),
    ]
    .into_iter()
    .map(|(id, title, completed)| TodoItem::with_id(id, title, completed))
    .collect()
}

/// Pick the items a `seed_storage` step writes.
///
/// Ids must be unique; every driver rejects a seed that reuses one.
pub fn resolve_seed(items: Option<&[TodoItem]>, fixture: Option<&Path>) -> E2eResult<Vec<TodoItem>> {
    let items = match (items, fixture) {
        (Some(items), _) => items.to_vec(),
        (None, Some(path)) => StorageFixture::from_file(path)?.value,
        (None, None) => standard_items(),
    };

    if let Some(dup) = first_duplicate(&items) {
        return Err(E2eError::SpecParse(format!(
            "seed items reuse id '{}' ({:?})",
            dup.id, dup.title
        )));
    }
    Ok(items)
}

fn first_duplicate(items: &[TodoItem]) -> Option<&TodoItem> {
    let mut seen = HashSet::new();
    items.iter().find(|item| !seen.insert(item.id.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_standard_items_mix() {
        let fixture = StorageFixture::standard();
        assert_eq!(fixture.value.len(), 15);
        assert_eq!(fixture.active().len(), 5);
        assert_eq!(fixture.completed().len(), 10);
        assert_eq!(fixture.key, "react-todos");
    }

    #[test]
    fn test_standard_ids_are_unique() {
        let ids: HashSet<_> = standard_items().into_iter().map(|i| i.id).collect();
        assert_eq!(ids.len(), 15);
    }

    #[test]
    fn test_standard_items_are_stable() {
        assert_eq!(standard_items(), standard_items());
    }

    #[test]
    fn test_resolve_prefers_inline_items() {
        let inline = vec![TodoItem::with_id("x", "inline", false)];
        let resolved = resolve_seed(Some(&inline), Some(Path::new("/does/not/exist"))).unwrap();
        assert_eq!(resolved, inline);
        assert_eq!(resolve_seed(None, None).unwrap().len(), 15);
    }

    #[test]
    fn test_load_fixture_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"key":"react-todos","value":[{{"id":"1","title":"a","completed":false}},{{"id":"2","title":"b","completed":true}}]}}"#
        )
        .unwrap();

        let items = resolve_seed(None, Some(file.path())).unwrap();
        assert_eq!(items.len(), 2);
        assert!(items[1].completed);
    }

    #[test]
    fn test_duplicate_seed_ids_are_rejected() {
        let inline = vec![
            TodoItem::with_id("x", "a", false),
            TodoItem::with_id("x", "b", true),
        ];
        let err = resolve_seed(Some(&inline), None).unwrap_err();
        match err {
            E2eError::SpecParse(msg) => assert!(msg.contains("'x'"), "{}", msg),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_missing_fixture_file_is_io_error() {
        let err = resolve_seed(None, Some(Path::new("/does/not/exist.json"))).unwrap_err();
        assert!(matches!(err, crate::error::E2eError::Io(_)));
    }
}
