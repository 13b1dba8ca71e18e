//! Command line of the `e2e` harness binary

use clap::Parser;
use std::path::PathBuf;

use crate::config::{DriverKind, RunnerConfig};
use crate::playwright::Browser;

#[derive(Parser, Debug)]
#[command(name = "todomvc-e2e")]
#[command(about = "E2E test runner for TodoMVC")]
pub struct HarnessArgs {
    /// Runner configuration file
    #[arg(short, long, default_value = "e2e.toml")]
    pub config: PathBuf,

    /// Driver to use (headless, playwright)
    #[arg(long, env = "E2E_DRIVER")]
    pub driver: Option<DriverKind>,

    /// URL of an already running app
    #[arg(long, env = "E2E_BASE_URL")]
    pub base_url: Option<String>,

    /// Path to test specs directory
    #[arg(short, long)]
    pub specs: Option<PathBuf>,

    /// Run only tests matching this tag
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Run only a specific test by name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Browser to use (chromium, firefox, webkit)
    #[arg(long)]
    pub browser: Option<Browser>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Output directory for results
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Only run the YAML specs
    #[arg(long)]
    pub no_builtin: bool,

    // What `cargo test` forwards to every test binary; accepted and ignored
    #[arg(hide = true)]
    pub filter: Option<String>,
    #[arg(long, hide = true)]
    pub exact: bool,
    #[arg(long, hide = true)]
    pub nocapture: bool,
    #[arg(long, hide = true)]
    pub quiet: bool,
}

impl HarnessArgs {
    /// Layer the flags that were given over `config`
    pub fn apply(&self, config: &mut RunnerConfig) {
        if let Some(driver) = self.driver {
            config.driver = driver;
        }
        if let Some(url) = &self.base_url {
            config.base_url = Some(url.clone());
        }
        if let Some(specs) = &self.specs {
            config.specs_dir = specs.clone();
        }
        if let Some(browser) = self.browser {
            config.playwright.browser = browser;
        }
        if self.headed {
            config.playwright.headless = false;
        }
        if let Some(output) = &self.output {
            config.output_dir = output.clone();
        }
        if self.no_builtin {
            config.include_builtin = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cargo_test_filter_is_accepted() {
        let args =
            HarnessArgs::try_parse_from(["e2e", "some_unit_test", "--exact", "--nocapture"])
                .unwrap();
        assert_eq!(args.filter.as_deref(), Some("some_unit_test"));
        assert!(args.name.is_none());
    }

    #[test]
    fn test_flags_override_config() {
        let args = HarnessArgs::try_parse_from([
            "e2e",
            "--driver",
            "playwright",
            "--browser",
            "firefox",
            "--headed",
            "--no-builtin",
            "--specs",
            "more-specs",
        ])
        .unwrap();

        let mut config = RunnerConfig::default();
        args.apply(&mut config);
        assert_eq!(config.driver, DriverKind::Playwright);
        assert_eq!(config.playwright.browser, Browser::Firefox);
        assert!(!config.playwright.headless);
        assert!(!config.include_builtin);
        assert_eq!(config.specs_dir, PathBuf::from("more-specs"));
    }

    #[test]
    fn test_no_flags_keep_config() {
        let args = HarnessArgs::try_parse_from(["e2e"]).unwrap();
        let mut config = RunnerConfig::default();
        args.apply(&mut config);
        assert_eq!(config.driver, DriverKind::Headless);
        assert!(config.include_builtin);
    }
}
