//! Playwright browser automation
//!
//! Each scenario is compiled into one Node script that owns a single browser
//! context, so storage and DOM state carry across its steps and never across
//! scenarios. The script prints one `E2E_STEP {json}` line per executed step,
//! which is parsed back into `StepResult`s.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::str::FromStr;
use tokio::process::Command as TokioCommand;
use tracing::{debug, warn};

use crate::driver::{Driver, StepResult};
use crate::error::{E2eError, E2eResult};
use crate::fixtures::resolve_seed;
use crate::locator::{js_string, test_ids};
use crate::spec::{TestSpec, TestStep};
use todomvc_common::DEFAULT_STORAGE_KEY;

/// Marker prefix of step result lines on the script's stdout
pub const STEP_MARKER: &str = "E2E_STEP ";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

impl FromStr for Browser {
    type Err = E2eError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chromium" | "chrome" => Ok(Browser::Chromium),
            "firefox" => Ok(Browser::Firefox),
            "webkit" | "safari" => Ok(Browser::Webkit),
            other => Err(E2eError::Config(format!("unknown browser '{}'", other))),
        }
    }
}

/// Configuration for Playwright
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    pub base_url: String,
    pub screenshot_dir: PathBuf,
    pub browser: Browser,
    pub headless: bool,
    /// Default timeout for actions and expectations
    pub step_timeout_ms: u64,
    pub storage_key: String,
    /// Directory whose `node_modules` provides `playwright` and `@playwright/test`
    pub work_dir: PathBuf,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            screenshot_dir: PathBuf::from("test-results/screenshots"),
            browser: Browser::Chromium,
            headless: true,
            step_timeout_ms: 5000,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            work_dir: PathBuf::from("."),
        }
    }
}

/// Driver that runs each scenario as a Playwright script under `node`
pub struct PlaywrightDriver {
    config: PlaywrightConfig,
}

impl PlaywrightDriver {
    /// Create a new Playwright driver
    pub fn new(config: PlaywrightConfig) -> E2eResult<Self> {
        // Verify playwright is installed
        Self::check_playwright_installed()?;

        // Create screenshot directory
        std::fs::create_dir_all(&config.screenshot_dir)?;

        Ok(Self { config })
    }

    /// Build a driver without probing for Playwright
    pub fn unchecked(config: PlaywrightConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlaywrightConfig {
        &self.config
    }

    pub fn set_base_url(&mut self, base_url: impl Into<String>) {
        self.config.base_url = base_url.into();
    }

    /// Check if Playwright is installed
    fn check_playwright_installed() -> E2eResult<()> {
        let output = Command::new("npx")
            .args(["playwright", "--version"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match output {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }

    /// Build the Playwright script for a whole scenario
    pub fn build_script(&self, spec: &TestSpec) -> E2eResult<String> {
        let mut script = String::new();
        let timeout = self.config.step_timeout_ms;
        let shot_prefix = self
            .config
            .screenshot_dir
            .join(format!("{}-step", sanitize(&spec.name)));

        // Header
        script.push_str(&format!(
            r#"
const {{ chromium, firefox, webkit }} = require('playwright');
const {{ expect: baseExpect }} = require('@playwright/test');

const expect = baseExpect.configure({{ timeout: {timeout} }});
const STORAGE_KEY = {storage_key};
const SHOT_PREFIX = {shot_prefix};
const ROWS = {rows};

const report = (result) => console.log({marker} + JSON.stringify(result));
const classPattern = (name) =>
  new RegExp('(^|\\s)' + name.replace(/[.*+?^${{}}()|[\]\\]/g, '\\$&') + '(\\s|$)');
const readStorage = async (page) => {{
  const raw = await page.evaluate((key) => window.localStorage.getItem(key), STORAGE_KEY);
  return raw === null ? null : JSON.parse(raw);
}};
const normalize = (items) => (items || []).map(({{ title, completed }}) => ({{ title, completed: !!completed }}));
const sameItems = (what, actual, expected) => {{
  const got = JSON.stringify(normalize(actual));
  const want = JSON.stringify(normalize(expected));
  if (got !== want) {{
    throw new Error(`${{what}}: got ${{got}}, expected ${{want}}`);
  }}
}};
const expectItems = async (page, expected) => {{
  const rows = page.getByTestId(ROWS);
  await expect(rows).toHaveCount(expected.length);
  for (let i = 0; i < expected.length; i++) {{
    await expect(rows.nth(i)).toHaveText(expected[i].title);
    if (expected[i].completed) {{
      await expect(rows.nth(i)).toHaveClass(classPattern('completed'));
    }} else {{
      await expect(rows.nth(i)).not.toHaveClass(classPattern('completed'));
    }}
  }}
}};

(async () => {{
  const browser = await {browser}.launch({{ headless: {headless} }});
  const context = await browser.newContext({{
    baseURL: {base_url},
    viewport: {{ width: {width}, height: {height} }}
  }});
  const page = await context.newPage();
  page.setDefaultTimeout({timeout});

  let index = 0;
  const step = async (name, body) => {{
    const current = index++;
    const started = Date.now();
    try {{
      await body();
      report({{ success: true, step_name: name, duration_ms: Date.now() - started, error: null }});
    }} catch (error) {{
      let screenshot_path = SHOT_PREFIX + current + '.png';
      try {{
        await page.screenshot({{ path: screenshot_path, fullPage: true }});
      }} catch (_) {{
        screenshot_path = null;
      }}
      report({{ success: false, step_name: name, duration_ms: Date.now() - started, error: error.message, screenshot_path }});
      throw error;
    }}
  }};

  let failed = false;
  try {{
"#,
            timeout = timeout,
            storage_key = js_string(&self.config.storage_key),
            shot_prefix = js_string(&shot_prefix.to_string_lossy()),
            rows = js_string(test_ids::TODO_ITEM),
            marker = js_string(STEP_MARKER),
            browser = self.config.browser.as_str(),
            headless = self.config.headless,
            base_url = js_string(&self.config.base_url),
            width = spec.viewport.width,
            height = spec.viewport.height,
        ));

        // Generate step code
        for (i, step) in spec.steps.iter().enumerate() {
            let name = step.name();
            script.push_str(&format!("\n    // Step {}: {}\n", i + 1, name));
            script.push_str(&format!(
                "    await step({}, async () => {{\n{}\n    }});\n",
                js_string(&name),
                self.step_to_js(step)?
            ));
        }

        // Footer: blur runs whether or not a step failed
        script.push_str(
            r#"
  } catch (error) {
    failed = true;
  } finally {
    await page
      .evaluate(() => document.activeElement && document.activeElement.blur())
      .catch(() => {});
    await browser.close();
  }
  process.exit(failed ? 1 : 0);
})();
"#,
        );

        Ok(script)
    }

    /// Convert a step to JavaScript code
    fn step_to_js(&self, step: &TestStep) -> E2eResult<String> {
        let js = match step {
            TestStep::Navigate { url } => {
                format!("      await page.goto({});", js_string(url))
            }
            TestStep::Reload => "      await page.reload();".to_string(),
            TestStep::SeedStorage { items, fixture } => {
                let items = resolve_seed(items.as_deref(), fixture.as_deref())?;
                let json = serde_json::to_string(&items)?;
                format!(
                    "      await page.evaluate(([key, value]) => window.localStorage.setItem(key, value), [STORAGE_KEY, {}]);",
                    js_string(&json)
                )
            }
            TestStep::ClearStorage => {
                "      await page.evaluate(() => window.localStorage.clear());".to_string()
            }
            TestStep::Type { target, text } => {
                format!("      await {}.pressSequentially({});", target.to_js(), js_string(text))
            }
            TestStep::Fill { target, value } => {
                format!("      await {}.fill({});", target.to_js(), js_string(value))
            }
            TestStep::Press { target, key } => match target {
                Some(target) => format!("      await {}.press({});", target.to_js(), js_string(key)),
                None => format!("      await page.keyboard.press({});", js_string(key)),
            },
            TestStep::Click { target } => format!("      await {}.click();", target.to_js()),
            TestStep::DoubleClick { target } => {
                format!("      await {}.dblclick();", target.to_js())
            }
            TestStep::Hover { target } => format!("      await {}.hover();", target.to_js()),
            TestStep::Check { target } => format!("      await {}.check();", target.to_js()),
            TestStep::Uncheck { target } => format!("      await {}.uncheck();", target.to_js()),
            TestStep::Blur => {
                "      await page.evaluate(() => document.activeElement && document.activeElement.blur());"
                    .to_string()
            }
            TestStep::Wait { target, timeout_ms, state } => {
                let timeout = timeout_ms.unwrap_or(self.config.step_timeout_ms);
                format!(
                    "      await {}.waitFor({{ state: '{}', timeout: {} }});",
                    target.to_js(),
                    state.as_str(),
                    timeout
                )
            }
            TestStep::Sleep { ms } => format!("      await page.waitForTimeout({});", ms),
            TestStep::AssertFocused { placeholder, value } => {
                let mut lines = vec!["      const focused = page.locator('*:focus');".to_string()];
                lines.push("      await expect(focused).toHaveCount(1);".to_string());
                if let Some(placeholder) = placeholder {
                    lines.push(format!(
                        "      await expect(focused).toHaveAttribute('placeholder', {});",
                        js_string(placeholder)
                    ));
                }
                if let Some(value) = value {
                    lines.push(format!(
                        "      await expect(focused).toHaveValue({});",
                        js_string(value)
                    ));
                }
                lines.join("\n")
            }
            TestStep::AssertCount { target, count } => {
                format!("      await expect({}).toHaveCount({});", target.to_js(), count)
            }
            TestStep::AssertItems { items } => {
                format!("      await expectItems(page, {});", serde_json::to_string(items)?)
            }
            TestStep::AssertText { target, text } => {
                format!("      await expect({}).toHaveText({});", target.to_js(), js_string(text))
            }
            TestStep::AssertVisible { target, visible } => {
                let matcher = if *visible { "toBeVisible" } else { "toBeHidden" };
                format!("      await expect({}).{}();", target.to_js(), matcher)
            }
            TestStep::AssertClass { target, class, present } => {
                let not = if *present { "" } else { "not." };
                format!(
                    "      await expect({}).{}toHaveClass(classPattern({}));",
                    target.to_js(),
                    not,
                    js_string(class)
                )
            }
            TestStep::AssertChecked { target, checked } => {
                format!(
                    "      await expect({}).toBeChecked({{ checked: {} }});",
                    target.to_js(),
                    checked
                )
            }
            TestStep::AssertAttribute { target, name, value } => {
                format!(
                    "      await expect({}).toHaveAttribute({}, {});",
                    target.to_js(),
                    js_string(name),
                    js_string(value)
                )
            }
            TestStep::AssertStorage { items } => {
                format!(
                    "      sameItems('stored todos', await readStorage(page), {});",
                    serde_json::to_string(items)?
                )
            }
            TestStep::AssertStorageAbsent => [
                "      const stored = await readStorage(page);",
                "      if (stored !== null) {",
                "        throw new Error(`${STORAGE_KEY} is present in storage: ${JSON.stringify(stored)}`);",
                "      }",
            ]
            .join("\n"),
            TestStep::AssertListMatchesStorage => {
                "      await expectItems(page, normalize(await readStorage(page)));".to_string()
            }
            TestStep::Log { message } => {
                format!("      console.log('[TEST] ' + {});", js_string(message))
            }
        };
        Ok(js)
    }

    /// Execute the full script via node, returning stdout
    pub async fn run_script(&self, script: &str) -> E2eResult<ScriptOutput> {
        // The script must live under work_dir so `require` finds its node_modules
        let temp_dir = tempfile::Builder::new()
            .prefix(".e2e-")
            .tempdir_in(&self.config.work_dir)?;
        let script_path = temp_dir.path().join("scenario.js");
        std::fs::write(&script_path, script)?;

        debug!("Running Playwright script: {}", script_path.display());

        let output = TokioCommand::new("node")
            .arg(&script_path)
            .current_dir(&self.config.work_dir)
            .output()
            .await?;

        Ok(ScriptOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Captured output of one script run
#[derive(Debug, Clone)]
pub struct ScriptOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl ScriptOutput {
    /// Step results reported by the script, in execution order
    pub fn step_results(&self) -> E2eResult<Vec<StepResult>> {
        self.stdout
            .lines()
            .filter_map(|line| line.strip_prefix(STEP_MARKER))
            .map(|json| serde_json::from_str(json).map_err(E2eError::from))
            .collect()
    }
}

#[async_trait]
impl Driver for PlaywrightDriver {
    fn name(&self) -> &'static str {
        "playwright"
    }

    async fn run(&self, spec: &TestSpec) -> E2eResult<Vec<StepResult>> {
        let script = self.build_script(spec)?;
        let output = self.run_script(&script).await?;
        let results = output.step_results()?;

        let reported_failure = results.iter().any(|r| !r.success);
        if !output.success && !reported_failure {
            // The browser never got to run a step
            return Err(E2eError::Playwright(format!(
                "Script failed:\nstdout: {}\nstderr: {}",
                output.stdout, output.stderr
            )));
        }
        if output.success && results.len() != spec.steps.len() {
            warn!(
                "{}: script reported {} of {} steps",
                spec.name,
                results.len(),
                spec.steps.len()
            );
        }

        Ok(results)
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::Locator;
    use crate::spec::ExpectedItem;
    use todomvc_common::Filter;

    fn driver() -> PlaywrightDriver {
        PlaywrightDriver::unchecked(PlaywrightConfig::default())
    }

    fn spec(steps: Vec<TestStep>) -> TestSpec {
        TestSpec {
            name: "sample test".to_string(),
            description: String::new(),
            tags: vec![],
            viewport: crate::spec::Viewport { width: 800, height: 600 },
            steps,
        }
    }

    #[test]
    fn test_script_has_one_wrapped_call_per_step() {
        let script = driver()
            .build_script(&spec(vec![
                TestStep::navigate_root(),
                TestStep::type_text(Locator::NewTodo, "Buy milk"),
                TestStep::press("Enter"),
            ]))
            .unwrap();

        assert_eq!(script.matches("await step(").count(), 3);
        assert!(script.contains(r#"await page.goto("/");"#));
        assert!(script.contains(r#"page.getByTestId("new-todo").pressSequentially("Buy milk")"#));
        assert!(script.contains(r#"await page.keyboard.press("Enter");"#));
        assert!(script.contains("width: 800, height: 600"));
        assert!(script.contains("chromium.launch({ headless: true })"));
    }

    #[test]
    fn test_duplicate_seed_ids_fail_the_build() {
        let result = driver().build_script(&spec(vec![
            TestStep::navigate_root(),
            TestStep::seed_items(vec![
                todomvc_common::TodoItem::with_id("x", "a", false),
                todomvc_common::TodoItem::with_id("x", "b", true),
            ]),
        ]));
        assert!(matches!(result, Err(E2eError::SpecParse(_))));
    }

    #[test]
    fn test_blur_cleanup_is_in_finally() {
        let script = driver().build_script(&spec(vec![])).unwrap();
        let finally = script.find("} finally {").unwrap();
        let blur = script.rfind("document.activeElement.blur()").unwrap();
        assert!(blur > finally);
    }

    #[test]
    fn test_seed_embeds_items_as_string_literal() {
        let script = driver()
            .build_script(&spec(vec![TestStep::seed_items(vec![
                todomvc_common::TodoItem::with_id("1", "it's \"quoted\"", true),
            ])]))
            .unwrap();
        assert!(script.contains(r#"[STORAGE_KEY, "[{\"id\":\"1\",\"title\":\"it's \\\"quoted\\\"\",\"completed\":true}]"]"#));
        assert!(script.contains(r#"const STORAGE_KEY = "react-todos";"#));
    }

    #[test]
    fn test_assertions_compile_to_expect_calls() {
        let d = driver();
        let class = d
            .step_to_js(&TestStep::AssertClass {
                target: Locator::filter(Filter::Active),
                class: "selected".to_string(),
                present: false,
            })
            .unwrap();
        assert_eq!(
            class,
            r#"      await expect(page.getByTestId("filter-active")).not.toHaveClass(classPattern("selected"));"#
        );

        let items = d
            .step_to_js(&TestStep::assert_items(vec![ExpectedItem::new("a", true)]))
            .unwrap();
        assert_eq!(
            items,
            r#"      await expectItems(page, [{"title":"a","completed":true}]);"#
        );

        let checked = d
            .step_to_js(&TestStep::AssertChecked {
                target: Locator::toggle(0),
                checked: false,
            })
            .unwrap();
        assert!(checked.ends_with("toBeChecked({ checked: false });"));
    }

    #[test]
    fn test_parse_step_results_from_stdout() {
        let output = ScriptOutput {
            success: false,
            stdout: [
                "[TEST] hello",
                r#"E2E_STEP {"success":true,"step_name":"navigate:/","duration_ms":12,"error":null}"#,
                r#"E2E_STEP {"success":false,"step_name":"click:todo-list","duration_ms":5000,"error":"Timeout","screenshot_path":"shots/x-step1.png"}"#,
            ]
            .join("\n"),
            stderr: String::new(),
        };
        let results = output.step_results().unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].success);
        assert!(!results[1].success);
        assert_eq!(results[1].error.as_deref(), Some("Timeout"));
        assert_eq!(
            results[1].screenshot_path.as_deref(),
            Some(std::path::Path::new("shots/x-step1.png"))
        );
    }

    #[test]
    fn test_browser_from_str() {
        assert_eq!("firefox".parse::<Browser>().unwrap(), Browser::Firefox);
        assert_eq!("WebKit".parse::<Browser>().unwrap(), Browser::Webkit);
        assert!("lynx".parse::<Browser>().is_err());
    }

    #[test]
    fn test_screenshot_prefix_is_sanitized() {
        let script = driver().build_script(&spec(vec![])).unwrap();
        assert!(script.contains("sample_test-step"));
    }
}
