//! Runner configuration
//!
//! Loaded from TOML; every field has a default so a partial file (or none)
//! is valid. The harness binary overrides individual fields from its flags.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{E2eError, E2eResult};
use crate::headless::HeadlessConfig;
use crate::playwright::{Browser, PlaywrightConfig};
use crate::server::ServerConfig;
use todomvc_common::DEFAULT_STORAGE_KEY;

/// Which driver executes the scenarios
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverKind {
    /// In-process page model, no browser needed
    #[default]
    Headless,
    /// Real browser through Playwright
    Playwright,
}

impl std::str::FromStr for DriverKind {
    type Err = E2eError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "headless" => Ok(DriverKind::Headless),
            "playwright" => Ok(DriverKind::Playwright),
            other => Err(E2eError::Config(format!("unknown driver '{}'", other))),
        }
    }
}

/// Configuration for the test runner
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub driver: DriverKind,

    /// Use an already running app instead of spawning one
    pub base_url: Option<String>,

    /// Key the app persists its todos under
    pub storage_key: String,

    /// Timeout for each action and expectation
    pub step_timeout_ms: u64,

    /// Input `maxlength` the headless page enforces
    pub max_title_length: Option<usize>,

    /// Run the headless page with storage access denied
    pub block_storage: bool,

    /// Run the built-in scenarios alongside the YAML specs
    pub include_builtin: bool,

    pub specs_dir: PathBuf,
    pub output_dir: PathBuf,
    pub server: ServerConfig,
    pub playwright: PlaywrightSettings,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            driver: DriverKind::Headless,
            base_url: None,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            step_timeout_ms: 5000,
            max_title_length: None,
            block_storage: false,
            include_builtin: true,
            specs_dir: PathBuf::from("specs"),
            output_dir: PathBuf::from("test-results"),
            server: ServerConfig::default(),
            playwright: PlaywrightSettings::default(),
        }
    }
}

/// Browser settings for the Playwright driver
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaywrightSettings {
    pub browser: Browser,
    pub headless: bool,
    pub work_dir: PathBuf,
    pub screenshot_dir: PathBuf,
}

impl Default for PlaywrightSettings {
    fn default() -> Self {
        Self {
            browser: Browser::Chromium,
            headless: true,
            work_dir: PathBuf::from("."),
            screenshot_dir: PathBuf::from("test-results/screenshots"),
        }
    }
}

impl RunnerConfig {
    /// Load configuration from file, falling back to defaults if it is missing
    pub fn load(path: &Path) -> E2eResult<Self> {
        let config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> E2eResult<()> {
        if self.storage_key.is_empty() {
            return Err(E2eError::Config("storage_key must not be empty".to_string()));
        }
        if self.step_timeout_ms == 0 {
            return Err(E2eError::Config("step_timeout_ms must be positive".to_string()));
        }
        if self.max_title_length == Some(0) {
            return Err(E2eError::Config("max_title_length must be positive".to_string()));
        }
        Ok(())
    }

    pub fn headless_config(&self) -> HeadlessConfig {
        HeadlessConfig {
            storage_key: self.storage_key.clone(),
            max_title_length: self.max_title_length,
            block_storage: self.block_storage,
        }
    }

    /// Playwright settings against the given app URL
    pub fn playwright_config(&self, base_url: &str) -> PlaywrightConfig {
        PlaywrightConfig {
            base_url: base_url.to_string(),
            screenshot_dir: self.playwright.screenshot_dir.clone(),
            browser: self.playwright.browser,
            headless: self.playwright.headless,
            step_timeout_ms: self.step_timeout_ms,
            storage_key: self.storage_key.clone(),
            work_dir: self.playwright.work_dir.clone(),
        }
    }
}
