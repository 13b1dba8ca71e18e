//! Browser driver abstraction
//!
//! A driver runs one scenario at a time against a fresh browsing context.
//! Steps run in order and stop at the first failure; the active element is
//! blurred on every exit path so pending edits cannot leak into the next
//! scenario.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::E2eResult;
use crate::spec::TestSpec;

/// Result of executing a test step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub success: bool,
    pub step_name: String,
    pub duration_ms: u64,
    pub error: Option<String>,
    #[serde(default)]
    pub screenshot_path: Option<PathBuf>,
}

impl StepResult {
    pub fn passed(step_name: String, duration_ms: u64) -> Self {
        Self {
            success: true,
            step_name,
            duration_ms,
            error: None,
            screenshot_path: None,
        }
    }

    pub fn failed(step_name: String, duration_ms: u64, error: String) -> Self {
        Self {
            success: false,
            step_name,
            duration_ms,
            error: Some(error),
            screenshot_path: None,
        }
    }
}

#[async_trait]
pub trait Driver: Send + Sync {
    /// Name shown in logs and results
    fn name(&self) -> &'static str;

    /// Execute every step of `spec` in a fresh context.
    ///
    /// Returns the results of the steps that ran; the last one is the
    /// failure if the scenario failed. `Err` is reserved for problems that
    /// prevent running the scenario at all.
    async fn run(&self, spec: &TestSpec) -> E2eResult<Vec<StepResult>>;
}
