//! Element locators built on stable test hooks
//!
//! Every element the scenarios touch carries a `data-testid` attribute, so
//! locators never depend on DOM position or generated ids.

use serde::{Deserialize, Serialize};
use todomvc_common::Filter;

/// Attribute the app exposes its test hooks under
pub const TEST_ID_ATTRIBUTE: &str = "data-testid";

pub mod test_ids {
    pub const NEW_TODO: &str = "new-todo";
    pub const TODO_LIST: &str = "todo-list";
    pub const TODO_ITEM: &str = "todo-item";
    pub const TODO_TITLE: &str = "todo-title";
    pub const TODO_TOGGLE: &str = "todo-toggle";
    pub const TODO_DESTROY: &str = "todo-destroy";
    pub const TODO_EDIT: &str = "todo-edit";
    pub const TODO_COUNT: &str = "todo-count";
    pub const TOGGLE_ALL: &str = "toggle-all";
    pub const CLEAR_COMPLETED: &str = "clear-completed";
    pub const FILTER_ALL: &str = "filter-all";
    pub const FILTER_ACTIVE: &str = "filter-active";
    pub const FILTER_COMPLETED: &str = "filter-completed";
}

/// Which rendered row an item locator points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemRef {
    /// Position among the currently rendered rows
    Index(usize),
    /// Row whose text contains this string, matched by `text_matches`
    Title(String),
}

/// Part of a todo row
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemPart {
    #[default]
    Row,
    Label,
    Toggle,
    Destroy,
    Edit,
}

impl ItemPart {
    fn test_id(&self) -> Option<&'static str> {
        match self {
            ItemPart::Row => None,
            ItemPart::Label => Some(test_ids::TODO_TITLE),
            ItemPart::Toggle => Some(test_ids::TODO_TOGGLE),
            ItemPart::Destroy => Some(test_ids::TODO_DESTROY),
            ItemPart::Edit => Some(test_ids::TODO_EDIT),
        }
    }
}

/// Addressable element of the TodoMVC DOM contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Locator {
    /// The "What needs to be done?" input
    NewTodo,
    /// The list container
    TodoList,
    /// Every rendered row
    Rows,
    /// One row, or a control inside it
    Item {
        at: ItemRef,
        #[serde(default)]
        part: ItemPart,
    },
    /// The "N items left" counter
    TodoCount,
    Filter {
        filter: Filter,
    },
    ClearCompleted,
    ToggleAll,
}

impl Locator {
    pub fn row(at: impl Into<ItemRef>) -> Self {
        Locator::Item {
            at: at.into(),
            part: ItemPart::Row,
        }
    }

    pub fn label(at: impl Into<ItemRef>) -> Self {
        Locator::Item {
            at: at.into(),
            part: ItemPart::Label,
        }
    }

    pub fn toggle(at: impl Into<ItemRef>) -> Self {
        Locator::Item {
            at: at.into(),
            part: ItemPart::Toggle,
        }
    }

    pub fn destroy(at: impl Into<ItemRef>) -> Self {
        Locator::Item {
            at: at.into(),
            part: ItemPart::Destroy,
        }
    }

    pub fn edit(at: impl Into<ItemRef>) -> Self {
        Locator::Item {
            at: at.into(),
            part: ItemPart::Edit,
        }
    }

    pub fn filter(filter: Filter) -> Self {
        Locator::Filter { filter }
    }

    /// Playwright locator expression rooted at `page`.
    ///
    /// Strings are emitted as JSON literals, which are valid JavaScript.
    pub fn to_js(&self) -> String {
        match self {
            Locator::NewTodo => by_test_id("page", test_ids::NEW_TODO),
            Locator::TodoList => by_test_id("page", test_ids::TODO_LIST),
            Locator::Rows => by_test_id("page", test_ids::TODO_ITEM),
            Locator::Item { at, part } => {
                let rows = by_test_id("page", test_ids::TODO_ITEM);
                let row = match at {
                    ItemRef::Index(index) => format!("{}.nth({})", rows, index),
                    ItemRef::Title(title) => {
                        format!("{}.filter({{ hasText: {} }})", rows, js_string(title))
                    }
                };
                match part.test_id() {
                    Some(id) => by_test_id(&row, id),
                    None => row,
                }
            }
            Locator::TodoCount => by_test_id("page", test_ids::TODO_COUNT),
            Locator::Filter { filter } => by_test_id("page", filter_test_id(*filter)),
            Locator::ClearCompleted => by_test_id("page", test_ids::CLEAR_COMPLETED),
            Locator::ToggleAll => by_test_id("page", test_ids::TOGGLE_ALL),
        }
    }
}

impl From<usize> for ItemRef {
    fn from(index: usize) -> Self {
        ItemRef::Index(index)
    }
}

impl From<&str> for ItemRef {
    fn from(title: &str) -> Self {
        ItemRef::Title(title.to_string())
    }
}

impl From<String> for ItemRef {
    fn from(title: String) -> Self {
        ItemRef::Title(title)
    }
}

impl std::fmt::Display for ItemRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemRef::Index(index) => write!(f, "#{}", index),
            ItemRef::Title(title) => write!(f, "\"{}\"", title),
        }
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Locator::NewTodo => write!(f, "new-todo"),
            Locator::TodoList => write!(f, "todo-list"),
            Locator::Rows => write!(f, "todo-items"),
            Locator::Item { at, part } => match part {
                ItemPart::Row => write!(f, "item[{}]", at),
                other => write!(f, "item[{}].{:?}", at, other),
            },
            Locator::TodoCount => write!(f, "todo-count"),
            Locator::Filter { filter } => write!(f, "filter-{}", filter),
            Locator::ClearCompleted => write!(f, "clear-completed"),
            Locator::ToggleAll => write!(f, "toggle-all"),
        }
    }
}

pub fn filter_test_id(filter: Filter) -> &'static str {
    match filter {
        Filter::All => test_ids::FILTER_ALL,
        Filter::Active => test_ids::FILTER_ACTIVE,
        Filter::Completed => test_ids::FILTER_COMPLETED,
    }
}

fn by_test_id(parent: &str, id: &str) -> String {
    format!("{}.getByTestId({})", parent, js_string(id))
}

/// Whether rendered `text` matches an `ItemRef::Title`.
///
/// Same rule as Playwright's string `hasText`: case-insensitive substring
/// after collapsing runs of whitespace.
pub fn text_matches(text: &str, needle: &str) -> bool {
    normalize_text(text).contains(&normalize_text(needle))
}

fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Quote a string as a JavaScript literal
pub fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_by_title_scopes_part_to_row() {
        let js = Locator::toggle("Buy milk").to_js();
        assert_eq!(
            js,
            r#"page.getByTestId("todo-item").filter({ hasText: "Buy milk" }).getByTestId("todo-toggle")"#
        );
    }

    #[test]
    fn test_title_match_ignores_case_and_whitespace() {
        assert!(text_matches("Buy Milk", "buy milk"));
        assert!(text_matches("Plan  holidays\tfor September", "holidays for sept"));
        assert!(text_matches("  Walk the dog ", "WALK"));
        assert!(!text_matches("Buy milk", "buy bread"));
        assert!(!text_matches("Buymilk", "buy milk"));
    }

    #[test]
    fn test_item_by_index() {
        assert_eq!(
            Locator::row(2).to_js(),
            r#"page.getByTestId("todo-item").nth(2)"#
        );
    }

    #[test]
    fn test_js_string_escapes_quotes() {
        assert_eq!(js_string(r#"it's "quoted""#), r#""it's \"quoted\"""#);
    }

    #[test]
    fn test_parse_from_yaml() {
        let loc: Locator = serde_yaml::from_str("kind: item\nat: 0\npart: toggle\n").unwrap();
        assert_eq!(loc, Locator::toggle(0));

        let loc: Locator = serde_yaml::from_str("kind: item\nat: Buy milk\n").unwrap();
        assert_eq!(loc, Locator::row("Buy milk"));

        let loc: Locator = serde_yaml::from_str("kind: filter\nfilter: active\n").unwrap();
        assert_eq!(loc, Locator::filter(Filter::Active));

        let loc: Locator = serde_yaml::from_str("kind: new_todo\n").unwrap();
        assert_eq!(loc, Locator::NewTodo);
    }
}
