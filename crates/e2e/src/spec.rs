//! Declarative YAML test specification

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{E2eError, E2eResult};
use crate::locator::Locator;
use todomvc_common::TodoItem;

/// A complete test specification parsed from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSpec {
    /// Unique name for this test
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Tags for filtering tests
    #[serde(default)]
    pub tags: Vec<String>,

    /// Viewport size for the browser
    #[serde(default = "default_viewport")]
    pub viewport: Viewport,

    /// Steps to execute in order
    pub steps: Vec<TestStep>,
}

fn default_viewport() -> Viewport {
    Viewport { width: 1280, height: 720 }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Expected state of one rendered row or stored record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedItem {
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

impl ExpectedItem {
    pub fn new(title: impl Into<String>, completed: bool) -> Self {
        Self {
            title: title.into(),
            completed,
        }
    }
}

impl From<&TodoItem> for ExpectedItem {
    fn from(item: &TodoItem) -> Self {
        Self::new(item.title.clone(), item.completed)
    }
}

/// A single step in a test
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TestStep {
    /// Navigate to a URL (relative to base)
    Navigate {
        #[serde(default = "default_url")]
        url: String,
    },

    /// Reload the current page
    Reload,

    /// Write todos into persisted storage.
    ///
    /// Inline `items` win over a `fixture` file; with neither, the standard
    /// fixture list is used.
    SeedStorage {
        #[serde(default)]
        items: Option<Vec<TodoItem>>,
        #[serde(default)]
        fixture: Option<PathBuf>,
    },

    /// Remove everything from persisted storage
    ClearStorage,

    /// Type text with keyboard simulation, appending to the current value
    Type {
        target: Locator,
        text: String,
    },

    /// Replace an input's value
    Fill {
        target: Locator,
        value: String,
    },

    /// Press a key, on an element or on whatever has focus
    Press {
        #[serde(default)]
        target: Option<Locator>,
        key: String,
    },

    Click {
        target: Locator,
    },

    DoubleClick {
        target: Locator,
    },

    Hover {
        target: Locator,
    },

    Check {
        target: Locator,
    },

    Uncheck {
        target: Locator,
    },

    /// Blur the active element
    Blur,

    /// Wait for an element to reach a state
    Wait {
        target: Locator,
        #[serde(default)]
        timeout_ms: Option<u64>,
        #[serde(default)]
        state: WaitState,
    },

    /// Wait for a fixed amount of time (use sparingly)
    Sleep {
        ms: u64,
    },

    /// Assert on the element that currently has focus
    AssertFocused {
        #[serde(default)]
        placeholder: Option<String>,
        #[serde(default)]
        value: Option<String>,
    },

    /// Exact number of matching elements
    AssertCount {
        target: Locator,
        count: usize,
    },

    /// Rendered rows, exact count and order
    AssertItems {
        items: Vec<ExpectedItem>,
    },

    /// Exact text content
    AssertText {
        target: Locator,
        text: String,
    },

    AssertVisible {
        target: Locator,
        #[serde(default = "default_true")]
        visible: bool,
    },

    AssertClass {
        target: Locator,
        class: String,
        #[serde(default = "default_true")]
        present: bool,
    },

    AssertChecked {
        target: Locator,
        #[serde(default = "default_true")]
        checked: bool,
    },

    AssertAttribute {
        target: Locator,
        name: String,
        value: String,
    },

    /// Persisted list, exact count and order
    AssertStorage {
        items: Vec<ExpectedItem>,
    },

    /// Nothing persisted under the storage key
    AssertStorageAbsent,

    /// Rendered rows mirror the persisted list one to one
    AssertListMatchesStorage,

    /// Log a message (for debugging)
    Log {
        message: String,
    },
}

fn default_url() -> String {
    "/".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitState {
    #[default]
    Visible,
    Hidden,
    Attached,
    Detached,
}

impl WaitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitState::Visible => "visible",
            WaitState::Hidden => "hidden",
            WaitState::Attached => "attached",
            WaitState::Detached => "detached",
        }
    }
}

impl TestStep {
    /// Seed storage with the standard fixture list
    pub fn seed_fixture() -> Self {
        TestStep::SeedStorage {
            items: None,
            fixture: None,
        }
    }

    pub fn seed_items(items: Vec<TodoItem>) -> Self {
        TestStep::SeedStorage {
            items: Some(items),
            fixture: None,
        }
    }

    pub fn navigate_root() -> Self {
        TestStep::Navigate { url: default_url() }
    }

    pub fn type_text(target: Locator, text: impl Into<String>) -> Self {
        TestStep::Type {
            target,
            text: text.into(),
        }
    }

    pub fn press(key: impl Into<String>) -> Self {
        TestStep::Press {
            target: None,
            key: key.into(),
        }
    }

    pub fn assert_items(items: impl IntoIterator<Item = ExpectedItem>) -> Self {
        TestStep::AssertItems {
            items: items.into_iter().collect(),
        }
    }

    /// Short label used in logs and step results
    pub fn name(&self) -> String {
        match self {
            TestStep::Navigate { url } => format!("navigate:{}", url),
            TestStep::Reload => "reload".to_string(),
            TestStep::SeedStorage { items, fixture } => match (items, fixture) {
                (Some(items), _) => format!("seed_storage:{} item(s)", items.len()),
                (None, Some(path)) => format!("seed_storage:{}", path.display()),
                (None, None) => "seed_storage:standard".to_string(),
            },
            TestStep::ClearStorage => "clear_storage".to_string(),
            TestStep::Type { target, .. } => format!("type:{}", target),
            TestStep::Fill { target, .. } => format!("fill:{}", target),
            TestStep::Press { key, .. } => format!("press:{}", key),
            TestStep::Click { target } => format!("click:{}", target),
            TestStep::DoubleClick { target } => format!("double_click:{}", target),
            TestStep::Hover { target } => format!("hover:{}", target),
            TestStep::Check { target } => format!("check:{}", target),
            TestStep::Uncheck { target } => format!("uncheck:{}", target),
            TestStep::Blur => "blur".to_string(),
            TestStep::Wait { target, state, .. } => {
                format!("wait:{}:{}", target, state.as_str())
            }
            TestStep::Sleep { ms } => format!("sleep:{}ms", ms),
            TestStep::AssertFocused { .. } => "assert_focused".to_string(),
            TestStep::AssertCount { target, count } => {
                format!("assert_count:{}={}", target, count)
            }
            TestStep::AssertItems { items } => format!("assert_items:{}", items.len()),
            TestStep::AssertText { target, .. } => format!("assert_text:{}", target),
            TestStep::AssertVisible { target, visible } => {
                format!("assert_visible:{}={}", target, visible)
            }
            TestStep::AssertClass { target, class, present } => {
                format!("assert_class:{}.{}={}", target, class, present)
            }
            TestStep::AssertChecked { target, checked } => {
                format!("assert_checked:{}={}", target, checked)
            }
            TestStep::AssertAttribute { target, name, .. } => {
                format!("assert_attribute:{}[{}]", target, name)
            }
            TestStep::AssertStorage { items } => format!("assert_storage:{}", items.len()),
            TestStep::AssertStorageAbsent => "assert_storage_absent".to_string(),
            TestStep::AssertListMatchesStorage => "assert_list_matches_storage".to_string(),
            TestStep::Log { message } => {
                let end = message
                    .char_indices()
                    .nth(30)
                    .map(|(i, _)| i)
                    .unwrap_or(message.len());
                format!("log:{}", &message[..end])
            }
        }
    }
}

impl TestSpec {
    /// Parse a test spec from YAML string
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        serde_yaml::from_str(yaml).map_err(E2eError::from)
    }

    /// Parse a test spec from a YAML file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
            .map_err(|e| E2eError::SpecParse(format!("{}: {}", path.display(), e)))
    }

    /// Load all test specs from a directory, in path order
    pub fn load_all(dir: &Path) -> E2eResult<Vec<Self>> {
        let mut specs = Vec::new();

        for entry in walkdir::WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
        {
            let spec = Self::from_file(entry.path())?;
            specs.push(spec);
        }

        Ok(specs)
    }

    /// Filter specs by tag
    pub fn filter_by_tag<'a>(specs: &'a [Self], tag: &str) -> Vec<&'a Self> {
        specs.iter().filter(|s| s.has_tag(tag)).collect()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use todomvc_common::Filter;

    #[test]
    fn test_parse_simple_spec() {
        let yaml = r#"
name: add-one
description: Adding a todo renders one row
tags:
  - smoke
steps:
  - action: navigate
  - action: assert_focused
    placeholder: What needs to be done?
  - action: type
    target: { kind: new_todo }
    text: Plan holidays for September
  - action: press
    key: Enter
  - action: assert_items
    items:
      - title: Plan holidays for September
"#;
        let spec = TestSpec::from_yaml(yaml).unwrap();
        assert_eq!(spec.name, "add-one");
        assert_eq!(spec.steps.len(), 5);
        assert!(spec.has_tag("smoke"));
        assert_eq!(spec.viewport.width, 1280);

        match &spec.steps[0] {
            TestStep::Navigate { url } => assert_eq!(url, "/"),
            other => panic!("unexpected step {:?}", other),
        }
        match &spec.steps[4] {
            TestStep::AssertItems { items } => {
                assert_eq!(items, &[ExpectedItem::new("Plan holidays for September", false)])
            }
            other => panic!("unexpected step {:?}", other),
        }
    }

    #[test]
    fn test_parse_seed_and_filter_steps() {
        let yaml = r#"
name: seeded
steps:
  - action: seed_storage
    items:
      - { id: "a", title: "one", completed: true }
  - action: reload
  - action: click
    target: { kind: filter, filter: completed }
  - action: assert_class
    target: { kind: filter, filter: completed }
    class: selected
"#;
        let spec = TestSpec::from_yaml(yaml).unwrap();
        match &spec.steps[0] {
            TestStep::SeedStorage { items: Some(items), fixture: None } => {
                assert_eq!(items.len(), 1);
                assert!(items[0].completed);
            }
            other => panic!("unexpected step {:?}", other),
        }
        match &spec.steps[3] {
            TestStep::AssertClass { target, present, .. } => {
                assert_eq!(target, &Locator::filter(Filter::Completed));
                assert!(*present);
            }
            other => panic!("unexpected step {:?}", other),
        }
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        let yaml = "name: bad\nsteps:\n  - action: teleport\n";
        assert!(TestSpec::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_step_names() {
        assert_eq!(TestStep::seed_fixture().name(), "seed_storage:standard");
        assert_eq!(
            TestStep::Click { target: Locator::destroy(0) }.name(),
            "click:item[#0].Destroy"
        );
        let long = TestStep::Log { message: "x".repeat(100) };
        assert_eq!(long.name().len(), "log:".len() + 30);
    }
}
