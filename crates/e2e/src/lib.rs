//! TodoMVC E2E Test Framework
//!
//! This crate drives end-to-end scenarios against a TodoMVC app:
//! - Seeds the app's persisted storage from fixtures
//! - Parses declarative YAML scenarios alongside the built-in ones
//! - Runs them through Playwright or an in-process headless page
//! - Spawns the app's static server when it is not already running
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    E2E Test Runner (Rust)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestRunner                                                 │
//! │    ├── from_config(RunnerConfig) -> Box<dyn Driver>         │
//! │    │     ├── HeadlessDriver (TodoModel + Storage)           │
//! │    │     └── PlaywrightDriver (+ ServerHandle)              │
//! │    ├── run_spec(spec: TestSpec) -> TestResult               │
//! │    └── write_results(TestSuiteResult)                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestSpec (YAML or scenarios::builtin())                    │
//! │    ├── name, description, tags                              │
//! │    └── steps: [TestStep]                                    │
//! │          ├── navigate / reload / seed_storage               │
//! │          ├── type / press / click / check { target }        │
//! │          └── assert_items / assert_storage / ...            │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod cli;
pub mod config;
pub mod driver;
pub mod error;
pub mod fixtures;
pub mod headless;
pub mod locator;
pub mod playwright;
pub mod runner;
pub mod scenarios;
pub mod server;
pub mod spec;

pub use config::{DriverKind, RunnerConfig};
pub use driver::{Driver, StepResult};
pub use error::{E2eError, E2eResult};
pub use fixtures::StorageFixture;
pub use headless::{HeadlessDriver, HeadlessPage};
pub use locator::Locator;
pub use playwright::PlaywrightDriver;
pub use runner::{TestResult, TestRunner, TestSuiteResult};
pub use spec::{ExpectedItem, TestSpec, TestStep};
