//! Scenario runner: drives specs through a `Driver` and collects results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info};

use crate::config::{DriverKind, RunnerConfig};
use crate::driver::{Driver, StepResult};
use crate::error::{E2eError, E2eResult};
use crate::headless::HeadlessDriver;
use crate::playwright::PlaywrightDriver;
use crate::scenarios;
use crate::server::ServerHandle;
use crate::spec::TestSpec;

/// Scenarios carrying this tag are reported but not run
pub const SKIP_TAG: &str = "skip";

/// Result of running a single test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub success: bool,
    #[serde(default)]
    pub skipped: bool,
    pub duration_ms: u64,
    pub steps: Vec<StepResult>,
    pub error: Option<String>,
}

impl TestResult {
    fn skipped(name: &str) -> Self {
        Self {
            name: name.to_string(),
            success: true,
            skipped: true,
            duration_ms: 0,
            steps: vec![],
            error: None,
        }
    }
}

/// Result of running all tests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuiteResult {
    pub driver: String,
    pub started_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub results: Vec<TestResult>,
}

impl TestSuiteResult {
    pub fn success(&self) -> bool {
        self.failed == 0
    }

    pub fn get(&self, name: &str) -> Option<&TestResult> {
        self.results.iter().find(|r| r.name == name)
    }
}

/// Main E2E test runner
pub struct TestRunner {
    config: RunnerConfig,
    driver: Box<dyn Driver>,

    /// Running app server, when the runner spawned one
    server: Option<ServerHandle>,
}

impl TestRunner {
    /// Runner around an existing driver
    pub fn new(driver: Box<dyn Driver>, config: RunnerConfig) -> Self {
        Self {
            config,
            driver,
            server: None,
        }
    }

    /// Runner with the in-process driver built from `config`
    pub fn headless(config: RunnerConfig) -> Self {
        let driver = HeadlessDriver::new(config.headless_config());
        Self::new(Box::new(driver), config)
    }

    /// Build the driver `config` asks for.
    ///
    /// The Playwright driver needs a live app: unless `base_url` is set the
    /// app server is spawned here and stopped when the runner is dropped.
    pub async fn from_config(config: RunnerConfig) -> E2eResult<Self> {
        match config.driver {
            DriverKind::Headless => Ok(Self::headless(config)),
            DriverKind::Playwright => {
                let server = match &config.base_url {
                    Some(_) => None,
                    None => Some(ServerHandle::spawn(config.server.clone()).await?),
                };
                let base_url = match (&server, &config.base_url) {
                    (Some(server), _) => server.base_url().to_string(),
                    (None, Some(url)) => url.clone(),
                    (None, None) => {
                        return Err(E2eError::Config("no app URL available".to_string()))
                    }
                };
                info!("Running against {}", base_url);

                let driver = PlaywrightDriver::new(config.playwright_config(&base_url))?;
                Ok(Self {
                    config,
                    driver: Box::new(driver),
                    server,
                })
            }
        }
    }

    pub fn driver_name(&self) -> &'static str {
        self.driver.name()
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Stop the app server if this runner started one
    pub fn stop_server(&mut self) -> E2eResult<()> {
        if let Some(mut server) = self.server.take() {
            server.stop()?;
        }
        Ok(())
    }

    /// Built-in scenarios (when enabled) followed by the YAML specs
    pub fn load_specs(&self) -> E2eResult<Vec<TestSpec>> {
        let mut specs = if self.config.include_builtin {
            scenarios::builtin()
        } else {
            Vec::new()
        };

        if self.config.specs_dir.is_dir() {
            specs.extend(TestSpec::load_all(&self.config.specs_dir)?);
        } else {
            debug!("No spec directory at {}", self.config.specs_dir.display());
        }
        Ok(specs)
    }

    /// Run every known scenario
    pub async fn run_all(&self) -> E2eResult<TestSuiteResult> {
        let specs = self.load_specs()?;
        Ok(self.run_specs(&specs).await)
    }

    /// Run scenarios matching a tag
    pub async fn run_tagged(&self, tag: &str) -> E2eResult<TestSuiteResult> {
        let specs: Vec<TestSpec> = self
            .load_specs()?
            .into_iter()
            .filter(|s| s.has_tag(tag))
            .collect();
        Ok(self.run_specs(&specs).await)
    }

    /// Run a specific scenario by name
    pub async fn run_test(&self, name: &str) -> E2eResult<TestResult> {
        let spec = self
            .load_specs()?
            .into_iter()
            .find(|s| s.name == name)
            .ok_or_else(|| E2eError::SpecParse(format!("Test not found: {}", name)))?;

        Ok(self.run_spec(&spec).await)
    }

    /// Run a list of scenarios, one at a time
    pub async fn run_specs(&self, specs: &[TestSpec]) -> TestSuiteResult {
        let started_at = Utc::now();
        let start = Instant::now();
        let mut results = Vec::with_capacity(specs.len());

        info!("Running {} test(s) with the {} driver", specs.len(), self.driver.name());

        for spec in specs {
            let result = if spec.has_tag(SKIP_TAG) {
                info!("- {} (skipped)", spec.name);
                TestResult::skipped(&spec.name)
            } else {
                self.run_spec(spec).await
            };
            results.push(result);
        }

        let skipped = results.iter().filter(|r| r.skipped).count();
        let passed = results.iter().filter(|r| r.success && !r.skipped).count();
        let failed = results.len() - passed - skipped;
        let duration_ms = start.elapsed().as_millis() as u64;

        info!(
            "Test Results: {} passed, {} failed, {} skipped ({} ms)",
            passed, failed, skipped, duration_ms
        );

        TestSuiteResult {
            driver: self.driver.name().to_string(),
            started_at,
            total: specs.len(),
            passed,
            failed,
            skipped,
            duration_ms,
            results,
        }
    }

    /// Run a single scenario; driver errors become a failed result
    pub async fn run_spec(&self, spec: &TestSpec) -> TestResult {
        let start = Instant::now();
        debug!("Running test: {}", spec.name);

        let (steps, error) = match self.driver.run(spec).await {
            Ok(steps) => {
                let error = match steps.iter().find(|s| !s.success) {
                    Some(step) => Some(
                        E2eError::StepFailed {
                            step: step.step_name.clone(),
                            reason: step.error.clone().unwrap_or_else(|| "unknown error".into()),
                        }
                        .to_string(),
                    ),
                    None if steps.len() < spec.steps.len() => Some(format!(
                        "only {} of {} steps ran",
                        steps.len(),
                        spec.steps.len()
                    )),
                    None => None,
                };
                (steps, error)
            }
            Err(e) => (vec![], Some(e.to_string())),
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        match &error {
            None => info!("✓ {} ({} ms)", spec.name, duration_ms),
            Some(reason) => error!("✗ {} - {}", spec.name, reason),
        }

        TestResult {
            name: spec.name.clone(),
            success: error.is_none(),
            skipped: false,
            duration_ms,
            steps,
            error,
        }
    }

    /// Write test results to `<output_dir>/test-results.json`
    pub fn write_results(&self, results: &TestSuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.config.output_dir)?;

        let path = self.config.output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

impl Drop for TestRunner {
    fn drop(&mut self) {
        let _ = self.stop_server();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::locator::Locator;
    use crate::spec::TestStep;

    /// Driver that fails every scenario before running a step
    struct BrokenDriver;

    #[async_trait]
    impl Driver for BrokenDriver {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn run(&self, _spec: &TestSpec) -> E2eResult<Vec<StepResult>> {
            Err(E2eError::Playwright("browser crashed".to_string()))
        }
    }

    fn runner_in(dir: &std::path::Path) -> TestRunner {
        TestRunner::headless(RunnerConfig {
            specs_dir: dir.join("specs"),
            output_dir: dir.join("out"),
            ..Default::default()
        })
    }

    fn spec(name: &str, tags: &[&str], steps: Vec<TestStep>) -> TestSpec {
        let mut spec = TestSpec::from_yaml(&format!("name: {}\nsteps: []\n", name)).unwrap();
        spec.tags = tags.iter().map(|t| t.to_string()).collect();
        spec.steps = steps;
        spec
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_suite() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner_in(dir.path());
        let specs = vec![
            spec(
                "broken",
                &[],
                vec![
                    TestStep::navigate_root(),
                    TestStep::AssertCount {
                        target: Locator::Rows,
                        count: 3,
                    },
                    TestStep::Reload,
                ],
            ),
            spec("fine", &[], vec![TestStep::navigate_root()]),
        ];

        let suite = runner.run_specs(&specs).await;
        assert_eq!(suite.total, 2);
        assert_eq!(suite.passed, 1);
        assert_eq!(suite.failed, 1);

        let broken = suite.get("broken").unwrap();
        assert_eq!(broken.steps.len(), 2);
        assert!(broken.error.as_deref().unwrap().contains("assert_count"));
        assert!(suite.get("fine").unwrap().success);
    }

    #[tokio::test]
    async fn test_driver_error_is_recorded_as_failure() {
        let dir = tempfile::tempdir().unwrap();
        let runner = TestRunner::new(
            Box::new(BrokenDriver),
            RunnerConfig {
                output_dir: dir.path().to_path_buf(),
                ..Default::default()
            },
        );

        let suite = runner
            .run_specs(&[spec("a", &[], vec![]), spec("b", &[], vec![])])
            .await;
        assert_eq!(suite.failed, 2);
        assert_eq!(suite.driver, "broken");
        assert!(suite.results[0].error.as_deref().unwrap().contains("browser crashed"));
    }

    #[tokio::test]
    async fn test_skip_tag() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner_in(dir.path());
        let suite = runner
            .run_specs(&[spec("later", &[SKIP_TAG], vec![TestStep::Reload])])
            .await;
        assert_eq!(suite.skipped, 1);
        assert_eq!(suite.failed, 0);
        assert!(suite.success());
    }

    #[tokio::test]
    async fn test_run_test_unknown_name() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner_in(dir.path());
        let err = runner.run_test("no-such-test").await.unwrap_err();
        assert!(matches!(err, E2eError::SpecParse(_)));
    }

    #[tokio::test]
    async fn test_yaml_specs_follow_builtin() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("specs")).unwrap();
        std::fs::write(
            dir.path().join("specs/extra.yaml"),
            "name: extra\nsteps:\n  - action: navigate\n",
        )
        .unwrap();

        let runner = runner_in(dir.path());
        let specs = runner.load_specs().unwrap();
        assert_eq!(specs.len(), scenarios::builtin().len() + 1);
        assert_eq!(specs.last().unwrap().name, "extra");
    }

    #[tokio::test]
    async fn test_write_results() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner_in(dir.path());
        let suite = runner
            .run_specs(&[spec("fine", &[], vec![TestStep::navigate_root()])])
            .await;

        let path = runner.write_results(&suite).unwrap();
        assert_eq!(path, dir.path().join("out/test-results.json"));

        let parsed: TestSuiteResult =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(parsed.passed, 1);
        assert_eq!(parsed.driver, "headless");
    }
}
