//! Built-in TodoMVC scenarios
//!
//! Each scenario is self-contained: it navigates, seeds whatever storage it
//! needs and asserts exact, ordered state. Drivers give every scenario a
//! fresh context, so nothing here cleans up after itself.

use crate::fixtures::standard_items;
use crate::headless::NEW_TODO_PLACEHOLDER;
use crate::locator::Locator;
use crate::spec::{ExpectedItem, TestSpec, TestStep, Viewport};
use todomvc_common::{remaining_label, Filter, TodoItem};

pub const HOLIDAY_TITLE: &str = "Plan holidays for September";
pub const HOLIDAY_SUFFIX: &str = " 20th - 25th";

/// All built-in scenarios, in run order
pub fn builtin() -> Vec<TestSpec> {
    vec![
        todo_lifecycle(),
        reload_persistence(),
        filters(),
        remaining_count_phrasing(),
        clear_completed(),
        double_toggle(),
        first_visit(),
        blank_title_ignored(),
    ]
}

fn spec(name: &str, description: &str, tags: &[&str], steps: Vec<TestStep>) -> TestSpec {
    TestSpec {
        name: name.to_string(),
        description: description.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        viewport: Viewport {
            width: 1280,
            height: 720,
        },
        steps,
    }
}

fn expected(items: &[TodoItem]) -> Vec<ExpectedItem> {
    items.iter().map(ExpectedItem::from).collect()
}

fn add_todo(title: &str) -> [TestStep; 2] {
    [
        TestStep::type_text(Locator::NewTodo, title),
        TestStep::press("Enter"),
    ]
}

fn seed_and_reload(seed: TestStep) -> [TestStep; 3] {
    [TestStep::navigate_root(), seed, TestStep::Reload]
}

fn selected(filter: Filter, present: bool) -> TestStep {
    TestStep::AssertClass {
        target: Locator::filter(filter),
        class: "selected".to_string(),
        present,
    }
}

fn href(filter: Filter) -> TestStep {
    TestStep::AssertAttribute {
        target: Locator::filter(filter),
        name: "href".to_string(),
        value: filter.href().to_string(),
    }
}

fn count_text(active: usize) -> TestStep {
    TestStep::AssertText {
        target: Locator::TodoCount,
        text: remaining_label(active),
    }
}

fn every_row_checked(rows: usize, checked: bool) -> impl Iterator<Item = TestStep> {
    (0..rows).map(move |i| TestStep::AssertChecked {
        target: Locator::toggle(i),
        checked,
    })
}

/// Create, edit, complete and delete one todo
pub fn todo_lifecycle() -> TestSpec {
    let full_title = format!("{}{}", HOLIDAY_TITLE, HOLIDAY_SUFFIX);

    let mut steps = vec![
        TestStep::navigate_root(),
        TestStep::AssertFocused {
            placeholder: Some(NEW_TODO_PLACEHOLDER.to_string()),
            value: None,
        },
    ];
    steps.extend(add_todo(HOLIDAY_TITLE));
    steps.extend([
        TestStep::AssertCount {
            target: Locator::Rows,
            count: 1,
        },
        TestStep::assert_items([ExpectedItem::new(HOLIDAY_TITLE, false)]),
        TestStep::AssertStorage {
            items: vec![ExpectedItem::new(HOLIDAY_TITLE, false)],
        },
        TestStep::AssertVisible {
            target: Locator::destroy(HOLIDAY_TITLE),
            visible: false,
        },
        TestStep::DoubleClick {
            target: Locator::label(HOLIDAY_TITLE),
        },
        TestStep::AssertFocused {
            placeholder: None,
            value: Some(HOLIDAY_TITLE.to_string()),
        },
        TestStep::type_text(Locator::edit(HOLIDAY_TITLE), HOLIDAY_SUFFIX),
        TestStep::press("Enter"),
        TestStep::AssertCount {
            target: Locator::Rows,
            count: 1,
        },
        TestStep::assert_items([ExpectedItem::new(full_title.clone(), false)]),
        TestStep::AssertChecked {
            target: Locator::toggle(full_title.as_str()),
            checked: false,
        },
        TestStep::Check {
            target: Locator::toggle(full_title.as_str()),
        },
        TestStep::AssertChecked {
            target: Locator::toggle(full_title.as_str()),
            checked: true,
        },
        TestStep::AssertClass {
            target: Locator::row(full_title.as_str()),
            class: "completed".to_string(),
            present: true,
        },
        TestStep::Hover {
            target: Locator::row(full_title.as_str()),
        },
        TestStep::Click {
            target: Locator::destroy(full_title.as_str()),
        },
        TestStep::AssertCount {
            target: Locator::TodoList,
            count: 0,
        },
        TestStep::AssertStorage { items: vec![] },
    ]);

    spec(
        "todo-lifecycle",
        "Creates, updates, completes and removes a todo",
        &["smoke", "crud"],
        steps,
    )
}

/// Seeded todos survive a reload in the same order
pub fn reload_persistence() -> TestSpec {
    let items = standard_items();
    let active = items.iter().filter(|i| !i.completed).count();

    let mut steps = seed_and_reload(TestStep::seed_fixture()).to_vec();
    steps.extend([
        TestStep::AssertCount {
            target: Locator::Rows,
            count: items.len(),
        },
        TestStep::AssertListMatchesStorage,
        TestStep::assert_items(expected(&items)),
        count_text(active),
    ]);

    spec(
        "reload-persistence",
        "Displays previously saved todos after a reload",
        &["persistence"],
        steps,
    )
}

/// Active and Completed filters show the right subsets in order
pub fn filters() -> TestSpec {
    let items = standard_items();
    let active: Vec<TodoItem> = items.iter().filter(|i| !i.completed).cloned().collect();
    let completed: Vec<TodoItem> = items.iter().filter(|i| i.completed).cloned().collect();

    let mut steps = seed_and_reload(TestStep::seed_fixture()).to_vec();
    steps.extend([
        TestStep::AssertCount {
            target: Locator::Rows,
            count: items.len(),
        },
        selected(Filter::All, true),
        selected(Filter::Active, false),
        href(Filter::Active),
        TestStep::Click {
            target: Locator::filter(Filter::Active),
        },
        selected(Filter::Active, true),
        selected(Filter::All, false),
        TestStep::assert_items(expected(&active)),
    ]);
    steps.extend(every_row_checked(active.len(), false));
    steps.extend([
        count_text(active.len()),
        selected(Filter::Completed, false),
        href(Filter::Completed),
        TestStep::Click {
            target: Locator::filter(Filter::Completed),
        },
        selected(Filter::Completed, true),
        selected(Filter::Active, false),
        TestStep::assert_items(expected(&completed)),
    ]);
    steps.extend(every_row_checked(completed.len(), true));
    steps.extend([
        count_text(active.len()),
        href(Filter::All),
        TestStep::Click {
            target: Locator::filter(Filter::All),
        },
        selected(Filter::All, true),
        TestStep::assert_items(expected(&items)),
    ]);

    spec(
        "filters",
        "Filters active and completed todos",
        &["filters"],
        steps,
    )
}

/// Footer counter uses the singular only for exactly one item
pub fn remaining_count_phrasing() -> TestSpec {
    let seed = vec![
        TodoItem::with_id("f1a7c2d4-0001-4c55-9a0e-3b7d2e9c1a01", "Walk the dog", false),
        TodoItem::with_id("f1a7c2d4-0002-4c55-9a0e-3b7d2e9c1a02", "Feed the cat", true),
    ];

    let mut steps = seed_and_reload(TestStep::seed_items(seed)).to_vec();
    steps.extend([
        count_text(1),
        TestStep::Check {
            target: Locator::toggle("Walk the dog"),
        },
        count_text(0),
        TestStep::AssertChecked {
            target: Locator::ToggleAll,
            checked: true,
        },
        TestStep::Click {
            target: Locator::ToggleAll,
        },
        count_text(2),
        TestStep::assert_items([
            ExpectedItem::new("Walk the dog", false),
            ExpectedItem::new("Feed the cat", false),
        ]),
    ]);

    spec(
        "remaining-count-phrasing",
        "Shows '1 item left' and 'N items left' correctly",
        &["footer"],
        steps,
    )
}

/// "Clear completed" removes completed todos from view and storage
pub fn clear_completed() -> TestSpec {
    let items = standard_items();
    let active: Vec<TodoItem> = items.iter().filter(|i| !i.completed).cloned().collect();

    let mut steps = seed_and_reload(TestStep::seed_fixture()).to_vec();
    steps.extend([
        TestStep::AssertVisible {
            target: Locator::ClearCompleted,
            visible: true,
        },
        TestStep::AssertText {
            target: Locator::ClearCompleted,
            text: "Clear completed".to_string(),
        },
        TestStep::Click {
            target: Locator::ClearCompleted,
        },
        TestStep::assert_items(expected(&active)),
        TestStep::AssertCount {
            target: Locator::ClearCompleted,
            count: 0,
        },
        TestStep::AssertStorage {
            items: expected(&active),
        },
        TestStep::Reload,
        TestStep::assert_items(expected(&active)),
    ]);

    spec(
        "clear-completed",
        "Clears completed todos from the list and storage",
        &["footer", "persistence"],
        steps,
    )
}

/// Completing then un-completing a todo restores it
pub fn double_toggle() -> TestSpec {
    let title = "Water the garden";

    let mut steps = vec![TestStep::navigate_root()];
    steps.extend(add_todo(title));
    steps.extend([
        TestStep::Check {
            target: Locator::toggle(0),
        },
        TestStep::AssertClass {
            target: Locator::row(0),
            class: "completed".to_string(),
            present: true,
        },
        TestStep::Uncheck {
            target: Locator::toggle(0),
        },
        TestStep::AssertClass {
            target: Locator::row(0),
            class: "completed".to_string(),
            present: false,
        },
        TestStep::AssertChecked {
            target: Locator::toggle(0),
            checked: false,
        },
        TestStep::AssertStorage {
            items: vec![ExpectedItem::new(title, false)],
        },
    ]);

    spec(
        "double-toggle",
        "Toggling a todo twice leaves it active",
        &["crud"],
        steps,
    )
}

/// Empty app on first visit; storage is re-created after being cleared
pub fn first_visit() -> TestSpec {
    let mut steps = vec![
        TestStep::navigate_root(),
        TestStep::AssertCount {
            target: Locator::TodoList,
            count: 0,
        },
        TestStep::AssertCount {
            target: Locator::TodoCount,
            count: 0,
        },
        TestStep::AssertFocused {
            placeholder: Some(NEW_TODO_PLACEHOLDER.to_string()),
            value: Some(String::new()),
        },
        TestStep::AssertStorageAbsent,
    ];
    steps.extend(add_todo("First"));
    steps.extend([
        TestStep::AssertStorage {
            items: vec![ExpectedItem::new("First", false)],
        },
        TestStep::ClearStorage,
        TestStep::Reload,
        TestStep::AssertCount {
            target: Locator::Rows,
            count: 0,
        },
    ]);
    steps.extend(add_todo("Second"));
    steps.push(TestStep::AssertStorage {
        items: vec![ExpectedItem::new("Second", false)],
    });

    spec(
        "first-visit",
        "Starts empty and re-creates storage after it was cleared",
        &["persistence", "smoke"],
        steps,
    )
}

/// Whitespace-only titles are not added; others are trimmed
pub fn blank_title_ignored() -> TestSpec {
    let mut steps = vec![TestStep::navigate_root()];
    steps.extend(add_todo("   "));
    steps.extend([
        TestStep::AssertCount {
            target: Locator::Rows,
            count: 0,
        },
        TestStep::AssertStorageAbsent,
        TestStep::Fill {
            target: Locator::NewTodo,
            value: "  Trim me  ".to_string(),
        },
        TestStep::press("Enter"),
        TestStep::assert_items([ExpectedItem::new("Trim me", false)]),
    ]);

    spec(
        "blank-title-ignored",
        "Ignores blank titles and trims the rest",
        &["crud", "unverified"],
        steps,
    )
}
