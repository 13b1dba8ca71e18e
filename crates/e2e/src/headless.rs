//! In-process driver that plays the app's DOM contract
//!
//! `HeadlessPage` renders the TodoMVC page from a `TodoModel` and a
//! `Storage`, answering the same locators and assertions the Playwright
//! driver compiles to browser calls. It follows the browser rules the
//! scenarios depend on: actions need exactly one visible target, the delete
//! control only shows on a hovered row, edits commit on Enter or blur and
//! are dropped on Escape, and list/footer only render when there are todos.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::driver::{Driver, StepResult};
use crate::error::{E2eError, E2eResult};
use crate::fixtures::resolve_seed;
use crate::locator::{filter_test_id, test_ids, text_matches, ItemPart, ItemRef, Locator};
use crate::spec::{ExpectedItem, TestSpec, TestStep, WaitState};
use todomvc_common::{
    load_list, save_list, BlockedStorage, Error, Filter, MemoryStorage, Storage, TodoItem,
    TodoList, TodoModel, DEFAULT_STORAGE_KEY,
};

pub const NEW_TODO_PLACEHOLDER: &str = "What needs to be done?";

/// Resolved node of the rendered page
#[derive(Debug, Clone, PartialEq, Eq)]
enum Element {
    NewTodo,
    TodoList,
    Row(String),
    Label(String),
    Toggle(String),
    Destroy(String),
    Edit(String),
    TodoCount,
    FilterLink(Filter),
    ClearCompleted,
    ToggleAll,
}

impl Element {
    fn row_id(&self) -> Option<&str> {
        match self {
            Element::Row(id)
            | Element::Label(id)
            | Element::Toggle(id)
            | Element::Destroy(id)
            | Element::Edit(id) => Some(id.as_str()),
            _ => None,
        }
    }

    fn test_id(&self) -> &'static str {
        match self {
            Element::NewTodo => test_ids::NEW_TODO,
            Element::TodoList => test_ids::TODO_LIST,
            Element::Row(_) => test_ids::TODO_ITEM,
            Element::Label(_) => test_ids::TODO_TITLE,
            Element::Toggle(_) => test_ids::TODO_TOGGLE,
            Element::Destroy(_) => test_ids::TODO_DESTROY,
            Element::Edit(_) => test_ids::TODO_EDIT,
            Element::TodoCount => test_ids::TODO_COUNT,
            Element::FilterLink(filter) => filter_test_id(*filter),
            Element::ClearCompleted => test_ids::CLEAR_COMPLETED,
            Element::ToggleAll => test_ids::TOGGLE_ALL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    None,
    NewTodo,
    Edit,
}

#[derive(Debug, Clone)]
struct Editing {
    id: String,
    value: String,
}

/// Rendered TodoMVC page backed by persisted storage
pub struct HeadlessPage {
    storage: Arc<dyn Storage>,
    storage_key: String,
    model: TodoModel,
    url: Option<String>,
    route: Filter,
    new_todo_value: String,
    editing: Option<Editing>,
    focus: Focus,
    hovered: Option<String>,
}

impl HeadlessPage {
    pub fn new(storage: Arc<dyn Storage>, storage_key: impl Into<String>) -> Self {
        Self {
            storage,
            storage_key: storage_key.into(),
            model: TodoModel::new(),
            url: None,
            route: Filter::All,
            new_todo_value: String::new(),
            editing: None,
            focus: Focus::None,
            hovered: None,
        }
    }

    pub fn with_max_title_length(mut self, max: Option<usize>) -> Self {
        self.model = self.model.with_max_title_length(max);
        self
    }

    /// Todos as the app currently holds them in memory
    pub fn list(&self) -> &TodoList {
        self.model.list()
    }

    pub fn route(&self) -> Filter {
        self.route
    }

    pub fn is_loaded(&self) -> bool {
        self.url.is_some()
    }

    /// Apply one step. `Sleep` is left to the caller.
    pub fn execute(&mut self, step: &TestStep) -> E2eResult<()> {
        match step {
            TestStep::Navigate { url } => {
                self.navigate(url);
                Ok(())
            }
            TestStep::Reload => self.reload(),
            TestStep::SeedStorage { items, fixture } => {
                let items = resolve_seed(items.as_deref(), fixture.as_deref())?;
                self.seed(items)
            }
            TestStep::ClearStorage => Ok(self.storage.clear()?),
            TestStep::Type { target, text } => self.type_text(target, text),
            TestStep::Fill { target, value } => self.fill(target, value),
            TestStep::Press { target, key } => self.press(target.as_ref(), key),
            TestStep::Click { target } => self.click(target),
            TestStep::DoubleClick { target } => self.double_click(target),
            TestStep::Hover { target } => self.hover(target),
            TestStep::Check { target } => self.set_checked(target, true),
            TestStep::Uncheck { target } => self.set_checked(target, false),
            TestStep::Blur => {
                self.blur();
                Ok(())
            }
            TestStep::Wait { target, state, .. } => self.wait(target, *state),
            TestStep::Sleep { .. } => Ok(()),
            TestStep::AssertFocused { placeholder, value } => {
                self.assert_focused(placeholder.as_deref(), value.as_deref())
            }
            TestStep::AssertCount { target, count } => self.assert_count(target, *count),
            TestStep::AssertItems { items } => self.assert_items(items),
            TestStep::AssertText { target, text } => self.assert_text(target, text),
            TestStep::AssertVisible { target, visible } => self.assert_visible(target, *visible),
            TestStep::AssertClass { target, class, present } => {
                self.assert_class(target, class, *present)
            }
            TestStep::AssertChecked { target, checked } => self.assert_checked(target, *checked),
            TestStep::AssertAttribute { target, name, value } => {
                self.assert_attribute(target, name, value)
            }
            TestStep::AssertStorage { items } => self.assert_storage(items),
            TestStep::AssertStorageAbsent => self.assert_storage_absent(),
            TestStep::AssertListMatchesStorage => self.assert_list_matches_storage(),
            TestStep::Log { message } => {
                info!("[TEST LOG] {}", message);
                Ok(())
            }
        }
    }

    // ------------------------------------------------------------------
    // Navigation and storage
    // ------------------------------------------------------------------

    pub fn navigate(&mut self, url: &str) {
        self.url = Some(url.to_string());
        self.route = Filter::from_url(url);
        self.load();
    }

    pub fn reload(&mut self) -> E2eResult<()> {
        let url = self
            .url
            .clone()
            .ok_or_else(|| E2eError::UnsupportedStep("reload before navigate".to_string()))?;
        self.navigate(&url);
        Ok(())
    }

    fn load(&mut self) {
        let list = match load_list(self.storage.as_ref(), &self.storage_key) {
            Ok(list) => list,
            Err(e) => {
                warn!("Could not read '{}' from storage: {}", self.storage_key, e);
                TodoList::new()
            }
        };
        self.model.replace_list(list);
        self.new_todo_value.clear();
        self.editing = None;
        self.hovered = None;
        // The new-todo input is autofocused on load
        self.focus = Focus::NewTodo;
    }

    /// Write `items` to storage exactly as given, like a browser `setItem`
    pub fn seed(&mut self, items: Vec<TodoItem>) -> E2eResult<()> {
        let raw = serde_json::to_string(&items)?;
        self.storage.set(&self.storage_key, &raw)?;
        debug!("Seeded {} todo(s) under '{}'", items.len(), self.storage_key);
        Ok(())
    }

    fn persist(&self) {
        if let Err(e) = save_list(self.storage.as_ref(), &self.storage_key, self.model.list()) {
            warn!("Todos not persisted: {}", e);
        }
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    fn rows(&self) -> Vec<&TodoItem> {
        if !self.is_loaded() {
            return Vec::new();
        }
        self.model.visible(self.route)
    }

    fn has_todos(&self) -> bool {
        self.is_loaded() && !self.model.list().is_empty()
    }

    fn resolve(&self, locator: &Locator) -> Vec<Element> {
        if !self.is_loaded() {
            return Vec::new();
        }
        match locator {
            Locator::NewTodo => vec![Element::NewTodo],
            Locator::TodoList if self.has_todos() => vec![Element::TodoList],
            Locator::ToggleAll if self.has_todos() => vec![Element::ToggleAll],
            Locator::TodoCount if self.has_todos() => vec![Element::TodoCount],
            Locator::Filter { filter } if self.has_todos() => vec![Element::FilterLink(*filter)],
            Locator::ClearCompleted if self.model.list().completed_count() > 0 => {
                vec![Element::ClearCompleted]
            }
            Locator::Rows => self
                .rows()
                .into_iter()
                .map(|item| Element::Row(item.id.clone()))
                .collect(),
            Locator::Item { at, part } => {
                let rows = self.rows();
                let matched: Vec<&TodoItem> = match at {
                    ItemRef::Index(index) => rows.get(*index).copied().into_iter().collect(),
                    ItemRef::Title(title) => rows
                        .into_iter()
                        .filter(|item| text_matches(&item.title, title))
                        .collect(),
                };
                matched
                    .into_iter()
                    .map(|item| {
                        let id = item.id.clone();
                        match part {
                            ItemPart::Row => Element::Row(id),
                            ItemPart::Label => Element::Label(id),
                            ItemPart::Toggle => Element::Toggle(id),
                            ItemPart::Destroy => Element::Destroy(id),
                            ItemPart::Edit => Element::Edit(id),
                        }
                    })
                    .collect()
            }
            _ => Vec::new(),
        }
    }

    /// Strict resolution: exactly one element must match
    fn resolve_one(&self, locator: &Locator) -> E2eResult<Element> {
        let mut matched = self.resolve(locator);
        match matched.len() {
            0 => Err(E2eError::ElementNotFound(locator.to_string())),
            1 => Ok(matched.remove(0)),
            count => Err(E2eError::AmbiguousLocator {
                locator: locator.to_string(),
                count,
            }),
        }
    }

    /// Resolve a target for a user action; it must be visible
    fn actionable(&self, locator: &Locator) -> E2eResult<Element> {
        let element = self.resolve_one(locator)?;
        if !self.is_visible(&element) {
            return Err(E2eError::ElementNotVisible(locator.to_string()));
        }
        Ok(element)
    }

    fn is_editing(&self, id: &str) -> bool {
        self.editing.as_ref().map(|e| e.id == id).unwrap_or(false)
    }

    fn is_visible(&self, element: &Element) -> bool {
        match element {
            Element::Label(id) | Element::Toggle(id) => !self.is_editing(id),
            Element::Destroy(id) => {
                !self.is_editing(id) && self.hovered.as_deref() == Some(id.as_str())
            }
            Element::Edit(id) => self.is_editing(id),
            _ => true,
        }
    }

    fn item(&self, id: &str) -> Option<&TodoItem> {
        self.model.list().get(id)
    }

    fn text(&self, element: &Element) -> String {
        match element {
            Element::Row(id) | Element::Label(id) => {
                self.item(id).map(|i| i.title.clone()).unwrap_or_default()
            }
            Element::TodoList => self
                .rows()
                .iter()
                .map(|item| item.title.as_str())
                .collect::<Vec<_>>()
                .join(""),
            Element::TodoCount => self.model.remaining_label(),
            Element::FilterLink(filter) => filter.label().to_string(),
            Element::ClearCompleted => "Clear completed".to_string(),
            _ => String::new(),
        }
    }

    fn classes(&self, element: &Element) -> Vec<&'static str> {
        match element {
            Element::Row(id) => {
                let mut classes = Vec::new();
                if self.item(id).map(|i| i.completed).unwrap_or(false) {
                    classes.push("completed");
                }
                if self.is_editing(id) {
                    classes.push("editing");
                }
                classes
            }
            Element::FilterLink(filter) if *filter == self.route => vec!["selected"],
            Element::NewTodo => vec!["new-todo"],
            Element::TodoList => vec!["todo-list"],
            Element::Toggle(_) => vec!["toggle"],
            Element::Destroy(_) => vec!["destroy"],
            Element::Edit(_) => vec!["edit"],
            Element::TodoCount => vec!["todo-count"],
            Element::ClearCompleted => vec!["clear-completed"],
            Element::ToggleAll => vec!["toggle-all"],
            _ => Vec::new(),
        }
    }

    fn checked(&self, element: &Element, locator: &Locator) -> E2eResult<bool> {
        match element {
            Element::Toggle(id) => Ok(self.item(id).map(|i| i.completed).unwrap_or(false)),
            Element::ToggleAll => Ok(self.model.list().all_completed()),
            _ => Err(E2eError::UnsupportedStep(format!(
                "{} is not a checkbox",
                locator
            ))),
        }
    }

    fn attribute(&self, element: &Element, name: &str) -> Option<String> {
        if name == crate::locator::TEST_ID_ATTRIBUTE {
            return Some(element.test_id().to_string());
        }
        match (element, name) {
            (Element::NewTodo, "placeholder") => Some(NEW_TODO_PLACEHOLDER.to_string()),
            (Element::NewTodo, "maxlength") => {
                self.model.max_title_length().map(|max| max.to_string())
            }
            (Element::NewTodo, "value") => Some(self.new_todo_value.clone()),
            (Element::Edit(id), "value") if self.is_editing(id) => {
                self.editing.as_ref().map(|e| e.value.clone())
            }
            (Element::FilterLink(filter), "href") => Some(filter.href().to_string()),
            (Element::Toggle(_) | Element::ToggleAll, "type") => Some("checkbox".to_string()),
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Interaction
    // ------------------------------------------------------------------

    /// Move focus, committing an open edit that loses it
    fn focus_on(&mut self, next: Focus) {
        if self.focus == Focus::Edit && next != Focus::Edit {
            self.commit_edit();
        }
        self.focus = next;
    }

    fn focus_input(&mut self, locator: &Locator) -> E2eResult<()> {
        match self.actionable(locator)? {
            Element::NewTodo => self.focus_on(Focus::NewTodo),
            Element::Edit(_) => self.focus_on(Focus::Edit),
            _ => {
                return Err(E2eError::UnsupportedStep(format!(
                    "{} is not a text input",
                    locator
                )))
            }
        }
        Ok(())
    }

    fn focused_value_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            Focus::NewTodo => Some(&mut self.new_todo_value),
            Focus::Edit => self.editing.as_mut().map(|e| &mut e.value),
            Focus::None => None,
        }
    }

    fn cap_new_todo(&mut self) {
        if let Some(max) = self.model.max_title_length() {
            if self.new_todo_value.chars().count() > max {
                self.new_todo_value = self.new_todo_value.chars().take(max).collect();
            }
        }
    }

    fn type_text(&mut self, locator: &Locator, text: &str) -> E2eResult<()> {
        self.focus_input(locator)?;
        if let Some(value) = self.focused_value_mut() {
            value.push_str(text);
        }
        self.cap_new_todo();
        Ok(())
    }

    fn fill(&mut self, locator: &Locator, text: &str) -> E2eResult<()> {
        self.focus_input(locator)?;
        if let Some(value) = self.focused_value_mut() {
            *value = text.to_string();
        }
        self.cap_new_todo();
        Ok(())
    }

    fn press(&mut self, locator: Option<&Locator>, key: &str) -> E2eResult<()> {
        if let Some(locator) = locator {
            self.focus_input(locator)?;
        }
        match (key, self.focus) {
            ("Enter", Focus::NewTodo) => self.commit_new(),
            ("Enter", Focus::Edit) => {
                self.commit_edit();
                self.focus = Focus::None;
            }
            ("Escape", Focus::Edit) => {
                self.editing = None;
                self.focus = Focus::None;
            }
            ("Enter" | "Escape", _) => {}
            (other, _) => {
                return Err(E2eError::UnsupportedStep(format!("key '{}'", other)));
            }
        }
        Ok(())
    }

    fn commit_new(&mut self) {
        match self.model.add(&self.new_todo_value) {
            Ok(item) => {
                debug!("Added todo '{}'", item.title);
                self.new_todo_value.clear();
                self.persist();
            }
            Err(Error::InvalidTitle(reason)) => debug!("New todo ignored: {}", reason),
            Err(e) => warn!("New todo failed: {}", e),
        }
    }

    fn commit_edit(&mut self) {
        let Some(editing) = self.editing.take() else {
            return;
        };
        match self.model.edit(&editing.id, &editing.value) {
            Ok(_) => self.persist(),
            Err(e) => warn!("Edit of {} failed: {}", editing.id, e),
        }
    }

    fn click(&mut self, locator: &Locator) -> E2eResult<()> {
        let element = self.actionable(locator)?;
        self.hovered = element.row_id().map(String::from);

        match &element {
            Element::NewTodo => {
                self.focus_on(Focus::NewTodo);
                return Ok(());
            }
            Element::Edit(_) => {
                self.focus_on(Focus::Edit);
                return Ok(());
            }
            _ => self.focus_on(Focus::None),
        }

        match element {
            Element::Toggle(id) => {
                self.model.toggle(&id)?;
                self.persist();
            }
            Element::Destroy(id) => {
                self.model.destroy(&id)?;
                self.hovered = None;
                self.persist();
            }
            Element::FilterLink(filter) => {
                self.route = filter;
                let base = self
                    .url
                    .as_deref()
                    .map(|url| url.split('#').next().unwrap_or(url).to_string())
                    .unwrap_or_default();
                self.url = Some(format!("{}{}", base, filter.href()));
            }
            Element::ClearCompleted => {
                self.model.clear_completed();
                self.persist();
            }
            Element::ToggleAll => {
                let target = !self.model.list().all_completed();
                self.model.toggle_all(target);
                self.persist();
            }
            _ => {}
        }
        Ok(())
    }

    fn double_click(&mut self, locator: &Locator) -> E2eResult<()> {
        let element = self.actionable(locator)?;
        match element {
            Element::Row(id) | Element::Label(id) => {
                self.hovered = Some(id.clone());
                self.focus_on(Focus::None);
                let title = self.item(&id).map(|i| i.title.clone()).unwrap_or_default();
                self.editing = Some(Editing { id, value: title });
                self.focus = Focus::Edit;
                Ok(())
            }
            _ => {
                self.click(locator)?;
                // The first click may have removed or hidden the target
                if self.resolve_one(locator).is_ok() {
                    self.click(locator)?;
                }
                Ok(())
            }
        }
    }

    fn hover(&mut self, locator: &Locator) -> E2eResult<()> {
        let element = self.actionable(locator)?;
        self.hovered = element.row_id().map(String::from);
        Ok(())
    }

    fn set_checked(&mut self, locator: &Locator, checked: bool) -> E2eResult<()> {
        let element = self.actionable(locator)?;
        if self.checked(&element, locator)? != checked {
            self.click(locator)?;
        }
        if self.checked(&self.resolve_one(locator)?, locator)? != checked {
            return Err(E2eError::AssertionFailed(format!(
                "{} did not change to checked={}",
                locator, checked
            )));
        }
        Ok(())
    }

    /// Blur the active element, committing an open edit
    pub fn blur(&mut self) {
        self.focus_on(Focus::None);
    }

    fn wait(&self, locator: &Locator, state: WaitState) -> E2eResult<()> {
        let matched = self.resolve(locator);
        let reached = match state {
            WaitState::Visible => matched.iter().any(|e| self.is_visible(e)),
            WaitState::Hidden => matched.iter().all(|e| !self.is_visible(e)),
            WaitState::Attached => !matched.is_empty(),
            WaitState::Detached => matched.is_empty(),
        };
        if reached {
            Ok(())
        } else {
            Err(E2eError::Timeout(format!("{} to be {}", locator, state.as_str())))
        }
    }

    // ------------------------------------------------------------------
    // Assertions
    // ------------------------------------------------------------------

    fn assert_focused(&self, placeholder: Option<&str>, value: Option<&str>) -> E2eResult<()> {
        let (actual_placeholder, actual_value) = match self.focus {
            Focus::NewTodo => (Some(NEW_TODO_PLACEHOLDER), self.new_todo_value.as_str()),
            Focus::Edit => (
                None,
                self.editing.as_ref().map(|e| e.value.as_str()).unwrap_or(""),
            ),
            Focus::None => {
                return Err(E2eError::AssertionFailed("no element has focus".to_string()))
            }
        };
        if let Some(expected) = placeholder {
            if actual_placeholder != Some(expected) {
                return Err(E2eError::AssertionFailed(format!(
                    "focused placeholder is {:?}, expected {:?}",
                    actual_placeholder, expected
                )));
            }
        }
        if let Some(expected) = value {
            if actual_value != expected {
                return Err(E2eError::AssertionFailed(format!(
                    "focused value is {:?}, expected {:?}",
                    actual_value, expected
                )));
            }
        }
        Ok(())
    }

    fn assert_count(&self, locator: &Locator, count: usize) -> E2eResult<()> {
        let actual = self.resolve(locator).len();
        if actual != count {
            return Err(E2eError::AssertionFailed(format!(
                "{} has {} element(s), expected {}",
                locator, actual, count
            )));
        }
        Ok(())
    }

    fn assert_items(&self, expected: &[ExpectedItem]) -> E2eResult<()> {
        let actual: Vec<ExpectedItem> = self.rows().into_iter().map(ExpectedItem::from).collect();
        compare_items("rendered rows", &actual, expected)
    }

    fn assert_text(&self, locator: &Locator, text: &str) -> E2eResult<()> {
        let element = self.resolve_one(locator)?;
        let actual = self.text(&element);
        if actual.trim() != text.trim() {
            return Err(E2eError::AssertionFailed(format!(
                "{} has text {:?}, expected {:?}",
                locator, actual, text
            )));
        }
        Ok(())
    }

    fn assert_visible(&self, locator: &Locator, visible: bool) -> E2eResult<()> {
        if visible {
            let element = self.resolve_one(locator)?;
            if !self.is_visible(&element) {
                return Err(E2eError::AssertionFailed(format!("{} is hidden", locator)));
            }
        } else if self.resolve(locator).iter().any(|e| self.is_visible(e)) {
            return Err(E2eError::AssertionFailed(format!("{} is visible", locator)));
        }
        Ok(())
    }

    fn assert_class(&self, locator: &Locator, class: &str, present: bool) -> E2eResult<()> {
        let element = self.resolve_one(locator)?;
        let classes = self.classes(&element);
        if classes.contains(&class) != present {
            return Err(E2eError::AssertionFailed(format!(
                "{} classes {:?} {} '{}'",
                locator,
                classes,
                if present { "lack" } else { "include" },
                class
            )));
        }
        Ok(())
    }

    fn assert_checked(&self, locator: &Locator, checked: bool) -> E2eResult<()> {
        let element = self.resolve_one(locator)?;
        let actual = self.checked(&element, locator)?;
        if actual != checked {
            return Err(E2eError::AssertionFailed(format!(
                "{} checked={}, expected {}",
                locator, actual, checked
            )));
        }
        Ok(())
    }

    fn assert_attribute(&self, locator: &Locator, name: &str, value: &str) -> E2eResult<()> {
        let element = self.resolve_one(locator)?;
        let actual = self.attribute(&element, name);
        if actual.as_deref() != Some(value) {
            return Err(E2eError::AssertionFailed(format!(
                "{}[{}] is {:?}, expected {:?}",
                locator, name, actual, value
            )));
        }
        Ok(())
    }

    fn stored_list(&self) -> E2eResult<TodoList> {
        Ok(load_list(self.storage.as_ref(), &self.storage_key)?)
    }

    fn assert_storage(&self, expected: &[ExpectedItem]) -> E2eResult<()> {
        let stored = self.stored_list()?;
        let actual: Vec<ExpectedItem> = stored.iter().map(ExpectedItem::from).collect();
        compare_items("stored todos", &actual, expected)
    }

    fn assert_storage_absent(&self) -> E2eResult<()> {
        match self.storage.get(&self.storage_key)? {
            None => Ok(()),
            Some(raw) => Err(E2eError::AssertionFailed(format!(
                "'{}' is present in storage: {}",
                self.storage_key, raw
            ))),
        }
    }

    fn assert_list_matches_storage(&self) -> E2eResult<()> {
        let stored = self.stored_list()?;
        let expected: Vec<ExpectedItem> = stored.iter().map(ExpectedItem::from).collect();
        self.assert_items(&expected)
    }
}

/// Count-exact, order-sensitive comparison
fn compare_items(what: &str, actual: &[ExpectedItem], expected: &[ExpectedItem]) -> E2eResult<()> {
    if actual.len() != expected.len() {
        return Err(E2eError::AssertionFailed(format!(
            "{}: {} item(s), expected {}",
            what,
            actual.len(),
            expected.len()
        )));
    }
    for (index, (a, e)) in actual.iter().zip(expected).enumerate() {
        if a != e {
            return Err(E2eError::AssertionFailed(format!(
                "{}[{}]: got {:?} (completed={}), expected {:?} (completed={})",
                what, index, a.title, a.completed, e.title, e.completed
            )));
        }
    }
    Ok(())
}

/// Configuration for the headless driver
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    pub storage_key: String,
    pub max_title_length: Option<usize>,
    /// Run with storage access denied
    pub block_storage: bool,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            max_title_length: None,
            block_storage: false,
        }
    }
}

/// Driver that runs scenarios against `HeadlessPage`
#[derive(Debug, Clone, Default)]
pub struct HeadlessDriver {
    config: HeadlessConfig,
}

impl HeadlessDriver {
    pub fn new(config: HeadlessConfig) -> Self {
        Self { config }
    }

    /// Fresh page with empty storage, as a new browser context has
    pub fn new_page(&self) -> HeadlessPage {
        let storage: Arc<dyn Storage> = if self.config.block_storage {
            Arc::new(BlockedStorage)
        } else {
            Arc::new(MemoryStorage::new())
        };
        HeadlessPage::new(storage, self.config.storage_key.clone())
            .with_max_title_length(self.config.max_title_length)
    }
}

#[async_trait]
impl Driver for HeadlessDriver {
    fn name(&self) -> &'static str {
        "headless"
    }

    async fn run(&self, spec: &TestSpec) -> E2eResult<Vec<StepResult>> {
        let mut page = self.new_page();
        let mut results = Vec::with_capacity(spec.steps.len());

        for step in &spec.steps {
            let start = Instant::now();
            let step_name = step.name();
            debug!("Executing step: {}", step_name);

            let outcome = match step {
                TestStep::Sleep { ms } => {
                    tokio::time::sleep(Duration::from_millis(*ms)).await;
                    Ok(())
                }
                other => page.execute(other),
            };

            let duration_ms = start.elapsed().as_millis() as u64;
            match outcome {
                Ok(()) => results.push(StepResult::passed(step_name, duration_ms)),
                Err(e) => {
                    results.push(StepResult::failed(step_name, duration_ms, e.to_string()));
                    break;
                }
            }
        }

        page.blur();
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> HeadlessPage {
        let mut page = HeadlessDriver::default().new_page();
        page.navigate("/");
        page
    }

    fn add(page: &mut HeadlessPage, title: &str) {
        page.type_text(&Locator::NewTodo, title).unwrap();
        page.press(None, "Enter").unwrap();
    }

    #[test]
    fn test_fresh_page_has_no_list_and_focused_input() {
        let page = page();
        assert!(page.resolve(&Locator::TodoList).is_empty());
        assert!(page.resolve(&Locator::TodoCount).is_empty());
        page.assert_focused(Some(NEW_TODO_PLACEHOLDER), Some("")).unwrap();
    }

    #[test]
    fn test_enter_adds_and_clears_input() {
        let mut page = page();
        add(&mut page, "Buy milk");
        assert_eq!(page.list().len(), 1);
        assert_eq!(page.new_todo_value, "");
        page.assert_storage(&[ExpectedItem::new("Buy milk", false)]).unwrap();
    }

    #[test]
    fn test_destroy_requires_hover() {
        let mut page = page();
        add(&mut page, "Buy milk");
        let err = page.click(&Locator::destroy(0)).unwrap_err();
        assert!(matches!(err, E2eError::ElementNotVisible(_)));

        page.hover(&Locator::row(0)).unwrap();
        page.click(&Locator::destroy(0)).unwrap();
        assert!(page.list().is_empty());
        assert!(page.resolve(&Locator::TodoList).is_empty());
    }

    #[test]
    fn test_title_locator_is_strict() {
        let mut page = page();
        add(&mut page, "Buy milk");
        add(&mut page, "Buy bread");
        let err = page.click(&Locator::toggle("Buy")).unwrap_err();
        assert!(matches!(err, E2eError::AmbiguousLocator { count: 2, .. }));
        page.click(&Locator::toggle("bread")).unwrap();
        assert!(page.list().items()[1].completed);
    }

    #[test]
    fn test_title_locator_matches_like_has_text() {
        let mut page = page();
        add(&mut page, "Buy Milk");
        page.set_checked(&Locator::toggle("buy  milk"), true).unwrap();
        assert!(page.list().items()[0].completed);

        add(&mut page, "buy milk later");
        let err = page.click(&Locator::toggle("BUY MILK")).unwrap_err();
        assert!(matches!(err, E2eError::AmbiguousLocator { count: 2, .. }));
    }

    #[test]
    fn test_seed_writes_items_as_given() {
        let mut page = page();
        let items = vec![
            TodoItem::with_id("b", "second", true),
            TodoItem::with_id("a", "first", false),
        ];
        page.seed(items.clone()).unwrap();

        let raw = page.storage.get(&page.storage_key).unwrap().unwrap();
        let stored: Vec<TodoItem> = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored, items);
    }

    #[test]
    fn test_duplicate_seed_ids_fail_the_step() {
        let mut page = page();
        let step = TestStep::seed_items(vec![
            TodoItem::with_id("x", "a", false),
            TodoItem::with_id("x", "b", true),
        ]);
        assert!(matches!(page.execute(&step), Err(E2eError::SpecParse(_))));
        page.assert_storage_absent().unwrap();
    }

    #[test]
    fn test_escape_discards_edit_and_blur_commits() {
        let mut page = page();
        add(&mut page, "draft");

        page.double_click(&Locator::label(0)).unwrap();
        page.type_text(&Locator::edit(0), " v2").unwrap();
        page.press(None, "Escape").unwrap();
        assert_eq!(page.list().items()[0].title, "draft");

        page.double_click(&Locator::label(0)).unwrap();
        page.type_text(&Locator::edit(0), " v3").unwrap();
        page.blur();
        assert_eq!(page.list().items()[0].title, "draft v3");
        page.assert_storage(&[ExpectedItem::new("draft v3", false)]).unwrap();
    }

    #[test]
    fn test_filter_link_changes_route_and_selection() {
        let mut page = page();
        page.seed(crate::fixtures::standard_items()).unwrap();
        page.reload().unwrap();

        page.click(&Locator::filter(Filter::Completed)).unwrap();
        assert_eq!(page.route(), Filter::Completed);
        assert_eq!(page.url.as_deref(), Some("/#/completed"));
        page.assert_class(&Locator::filter(Filter::Completed), "selected", true)
            .unwrap();
        page.assert_class(&Locator::filter(Filter::All), "selected", false)
            .unwrap();
        page.assert_count(&Locator::Rows, 10).unwrap();
    }

    #[test]
    fn test_reload_keeps_route_from_url() {
        let mut page = page();
        page.seed(crate::fixtures::standard_items()).unwrap();
        page.navigate("/#/active");
        page.reload().unwrap();
        assert_eq!(page.route(), Filter::Active);
        page.assert_count(&Locator::Rows, 5).unwrap();
    }

    #[test]
    fn test_max_length_caps_input() {
        let mut page = HeadlessDriver::new(HeadlessConfig {
            max_title_length: Some(4),
            ..Default::default()
        })
        .new_page();
        page.navigate("/");
        page.assert_attribute(&Locator::NewTodo, "maxlength", "4").unwrap();
        add(&mut page, "abcdefg");
        page.assert_items(&[ExpectedItem::new("abcd", false)]).unwrap();
    }

    #[test]
    fn test_blocked_storage_keeps_app_usable() {
        let mut page = HeadlessDriver::new(HeadlessConfig {
            block_storage: true,
            ..Default::default()
        })
        .new_page();
        page.navigate("/");
        add(&mut page, "ephemeral");
        page.assert_items(&[ExpectedItem::new("ephemeral", false)]).unwrap();

        page.reload().unwrap();
        page.assert_count(&Locator::Rows, 0).unwrap();
    }

    #[test]
    fn test_actions_before_navigate_fail() {
        let mut page = HeadlessDriver::default().new_page();
        assert!(matches!(
            page.click(&Locator::NewTodo),
            Err(E2eError::ElementNotFound(_))
        ));
        assert!(page.reload().is_err());
    }

    #[test]
    fn test_unknown_key_is_unsupported() {
        let mut page = page();
        assert!(matches!(
            page.press(None, "F13"),
            Err(E2eError::UnsupportedStep(_))
        ));
    }
}
