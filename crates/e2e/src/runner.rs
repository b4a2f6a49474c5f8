//! Test runner that owns the per-scenario fixtures and collects results

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use hrm_common::{Project, SuiteConfig};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::api::ApiSession;
use crate::driver::BrowserDriver;
use crate::error::{E2eError, E2eResult};
use crate::pages::{LoginPage, Page, PageContext};
use crate::perf::{timed, Timing};
use crate::playwright::{PlaywrightConfig, PlaywrightSession};
use crate::scenarios::{self, Scenario};

/// Result of running a single scenario, on one project for UI scenarios
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    pub success: bool,
    pub duration_ms: u64,
    pub timings: Vec<Timing>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot_path: Option<String>,
    pub error: Option<String>,
}

impl TestResult {
    fn finish(
        scenario: Scenario,
        project: Option<&str>,
        start: Instant,
        timings: Vec<Timing>,
        outcome: E2eResult<()>,
    ) -> Self {
        Self {
            name: scenario.name().to_string(),
            project: project.map(String::from),
            success: outcome.is_ok(),
            duration_ms: start.elapsed().as_millis() as u64,
            timings,
            screenshot_path: None,
            error: outcome.err().map(|e| e.to_string()),
        }
    }

    /// Name plus project, as shown in logs
    pub fn display_name(&self) -> String {
        match &self.project {
            Some(project) => format!("{} [{}]", self.name, project),
            None => self.name.clone(),
        }
    }
}

/// Result of running a set of scenarios
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuiteResult {
    pub environment: String,
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
}

/// Configuration for the test runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub suite: SuiteConfig,

    /// Only run UI scenarios on the project with this name
    pub project: Option<String>,

    pub output_dir: PathBuf,
}

impl RunnerConfig {
    pub fn from_suite(suite: SuiteConfig) -> Self {
        let output_dir = suite.output_dir().to_path_buf();
        Self {
            suite,
            project: None,
            output_dir,
        }
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self::from_suite(SuiteConfig::default())
    }
}

/// Runs scenarios sequentially, each on fresh fixtures
pub struct TestRunner {
    config: RunnerConfig,
}

impl TestRunner {
    pub fn new() -> Self {
        Self::with_config(RunnerConfig::default())
    }

    pub fn with_config(config: RunnerConfig) -> Self {
        Self { config }
    }

    pub fn suite(&self) -> &SuiteConfig {
        &self.config.suite
    }

    /// Run every scenario
    pub async fn run_all(&self) -> E2eResult<TestSuiteResult> {
        self.run_scenarios(Scenario::all()).await
    }

    /// Run scenarios carrying a tag
    pub async fn run_tagged(&self, tag: &str) -> E2eResult<TestSuiteResult> {
        let filtered: Vec<Scenario> = Scenario::all()
            .iter()
            .copied()
            .filter(|s| s.has_tag(tag))
            .collect();
        self.run_scenarios(&filtered).await
    }

    /// Run one scenario by name
    pub async fn run_test(&self, name: &str) -> E2eResult<TestSuiteResult> {
        let scenario = Scenario::from_name(name)?;
        self.run_scenarios(&[scenario]).await
    }

    /// Run a list of scenarios
    pub async fn run_scenarios(&self, scenarios: &[Scenario]) -> E2eResult<TestSuiteResult> {
        let started_at = Utc::now();
        let start = Instant::now();
        let projects = self.projects()?;
        let mut results = Vec::new();
        let mut skipped = 0;

        info!(
            "Running {} scenario(s) against {}...",
            scenarios.len(),
            self.config.suite.environment
        );

        for &scenario in scenarios {
            if !scenario.needs_browser() {
                results.push(self.run_api_scenario(scenario).await);
                continue;
            }
            if projects.is_empty() {
                skipped += 1;
                continue;
            }
            for project in &projects {
                results.push(self.run_ui_scenario(scenario, project).await);
            }
        }

        for result in &results {
            if result.success {
                info!("✓ {} ({} ms)", result.display_name(), result.duration_ms);
            } else {
                error!(
                    "✗ {} - {}",
                    result.display_name(),
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
        }

        let passed = results.iter().filter(|r| r.success).count();
        let failed = results.len() - passed;
        let duration_ms = start.elapsed().as_millis() as u64;

        info!(
            "Test Results: {} passed, {} failed, {} skipped ({} ms)",
            passed, failed, skipped, duration_ms
        );

        Ok(TestSuiteResult {
            environment: self.config.suite.environment.to_string(),
            started_at,
            total: results.len() + skipped,
            passed,
            failed,
            skipped,
            duration_ms,
            results,
        })
    }

    /// Run an API scenario on its own session, disposed afterwards
    pub async fn run_api_scenario(&self, scenario: Scenario) -> TestResult {
        let start = Instant::now();
        let suite = &self.config.suite;
        let mut timings = Vec::new();
        debug!("Running test: {}", scenario);

        let outcome = match ApiSession::initialize(&suite.api, suite.environment) {
            Ok(mut session) => {
                let outcome = scenarios::run_api(scenario, &mut session, suite, &mut timings).await;
                session.dispose();
                outcome
            }
            Err(e) => Err(e),
        };

        TestResult::finish(scenario, None, start, timings, outcome)
    }

    /// Run a UI scenario in a freshly launched browser for `project`
    pub async fn run_ui_scenario(&self, scenario: Scenario, project: &Project) -> TestResult {
        let start = Instant::now();
        let pw_config = PlaywrightConfig::for_project(&self.config.suite.ui, project);

        match PlaywrightSession::launch(pw_config).await {
            Ok(session) => self.run_ui_with_driver(scenario, &project.name, Arc::new(session)).await,
            Err(e) => TestResult::finish(scenario, Some(&project.name), start, Vec::new(), Err(e)),
        }
    }

    /// Run a UI scenario on an already launched driver, closing it afterwards
    ///
    /// The login page is loaded first. A failure leaves a screenshot under
    /// `<output>/screenshots/`.
    pub async fn run_ui_with_driver(
        &self,
        scenario: Scenario,
        project: &str,
        driver: Arc<dyn BrowserDriver>,
    ) -> TestResult {
        let start = Instant::now();
        let suite = &self.config.suite;
        let cx = PageContext::new(driver.clone(), &suite.ui);
        let mut timings = Vec::new();
        debug!("Running test: {} [{}]", scenario, project);

        let login = LoginPage::new(cx.clone());
        let loaded = timed(&mut timings, "login page load", &suite.performance.page_load, login.navigate()).await;
        let outcome = match loaded {
            Ok(()) => scenarios::run_ui(scenario, &cx, suite, &mut timings).await,
            Err(e) => Err(e),
        };

        let screenshot = if outcome.is_err() {
            self.capture_failure(driver.as_ref(), scenario, project).await
        } else {
            None
        };

        if let Err(e) = driver.close().await {
            warn!("Failed to close browser for {} [{}]: {}", scenario, project, e);
        }

        let mut result = TestResult::finish(scenario, Some(project), start, timings, outcome);
        result.screenshot_path = screenshot.map(|p| p.to_string_lossy().to_string());
        result
    }

    async fn capture_failure(&self, driver: &dyn BrowserDriver, scenario: Scenario, project: &str) -> Option<PathBuf> {
        let dir = self.config.output_dir.join("screenshots");
        let path = dir.join(screenshot_name(scenario, project));

        let captured = match std::fs::create_dir_all(&dir) {
            Ok(()) => driver.screenshot(&path).await,
            Err(e) => Err(e.into()),
        };
        match captured {
            Ok(()) => {
                info!("Failure screenshot: {}", path.display());
                Some(path)
            }
            Err(e) => {
                warn!("Could not capture failure screenshot: {}", e);
                None
            }
        }
    }

    /// Projects UI scenarios run on, after applying the project filter
    fn projects(&self) -> E2eResult<Vec<Project>> {
        let all = &self.config.suite.ui.projects;
        match &self.config.project {
            None => Ok(all.clone()),
            Some(name) => {
                let selected: Vec<Project> = all.iter().filter(|p| &p.name == name).cloned().collect();
                if selected.is_empty() {
                    return Err(E2eError::Config(hrm_common::Error::InvalidConfig(format!(
                        "no project named '{}'",
                        name
                    ))));
                }
                Ok(selected)
            }
        }
    }

    /// Write test results to JSON file
    pub fn write_results(&self, results: &TestSuiteResult) -> E2eResult<PathBuf> {
        write_results_to(&self.config.output_dir, results)
    }
}

impl Default for TestRunner {
    fn default() -> Self {
        Self::new()
    }
}

fn write_results_to(output_dir: &Path, results: &TestSuiteResult) -> E2eResult<PathBuf> {
    std::fs::create_dir_all(output_dir)?;

    let path = output_dir.join("results.json");
    let json = serde_json::to_string_pretty(results)?;
    std::fs::write(&path, json)?;

    info!("Results written to: {}", path.display());
    Ok(path)
}

fn screenshot_name(scenario: Scenario, project: &str) -> String {
    let project: String = project
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    format!("{}-{}.png", scenario.name(), project)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_driver::FakeDriver;
    use crate::pages::tests::SHORT;
    use crate::scenarios::tests::scripted_site;

    fn runner(output_dir: &Path) -> TestRunner {
        let mut suite = SuiteConfig::default();
        suite.ui.server_url = "https://hrm.test".to_string();
        suite.ui.element_display_timeout_ms = SHORT.as_millis() as u64;
        suite.ui.expect_timeout_ms = SHORT.as_millis() as u64;
        TestRunner::with_config(RunnerConfig {
            output_dir: output_dir.to_path_buf(),
            ..RunnerConfig::from_suite(suite)
        })
    }

    fn scripted_driver(runner: &TestRunner) -> Arc<FakeDriver> {
        let driver = Arc::new(FakeDriver::new());
        let cx = PageContext::new(driver.clone(), &runner.suite().ui);
        scripted_site(&driver, &cx);
        driver
    }

    #[test]
    fn test_screenshot_name() {
        assert_eq!(
            screenshot_name(Scenario::UiLogin, "Mobile Chrome"),
            "ui_login-mobile-chrome.png"
        );
    }

    #[tokio::test]
    async fn test_ui_fixture_passes_and_closes_browser() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(dir.path());
        let driver = scripted_driver(&runner);

        let result = runner
            .run_ui_with_driver(Scenario::UiLogin, "chromium", driver.clone())
            .await;

        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.project.as_deref(), Some("chromium"));
        assert_eq!(result.timings[0].label, "login page load");
        assert!(result.screenshot_path.is_none());
        assert!(driver.actions()[0].starts_with("goto:https://hrm.test/web/index.php/auth/login"));
        assert!(driver.is_closed());
    }

    #[tokio::test]
    async fn test_ui_failure_takes_screenshot() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(dir.path());
        let driver = Arc::new(FakeDriver::new());

        let result = runner
            .run_ui_with_driver(Scenario::UiAdminSearch, "firefox", driver.clone())
            .await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("login page did not load"));
        let expected = dir.path().join("screenshots").join("ui_admin_search-firefox.png");
        assert_eq!(result.screenshot_path, Some(expected.to_string_lossy().to_string()));
        assert!(dir.path().join("screenshots").is_dir());

        let actions = driver.actions();
        assert_eq!(actions[actions.len() - 2], format!("screenshot:{}", expected.display()));
        assert_eq!(actions[actions.len() - 1], "close");
    }

    #[test]
    fn test_project_filter() {
        let dir = tempfile::tempdir().unwrap();
        let mut runner = runner(dir.path());
        assert_eq!(runner.projects().unwrap().len(), 5);

        runner.config.project = Some("webkit".to_string());
        let projects = runner.projects().unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].name, "webkit");

        runner.config.project = Some("netscape".to_string());
        assert!(matches!(runner.projects(), Err(E2eError::Config(_))));
    }

    #[tokio::test]
    async fn test_ui_scenarios_skipped_without_projects() {
        let dir = tempfile::tempdir().unwrap();
        let mut runner = runner(dir.path());
        runner.config.suite.ui.projects.clear();

        let suite = runner.run_scenarios(&[Scenario::UiLogin]).await.unwrap();
        assert_eq!(suite.total, 1);
        assert_eq!(suite.skipped, 1);
        assert!(suite.results.is_empty());
        assert!(suite.success());
    }

    #[test]
    fn test_write_results() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(&dir.path().join("nested"));
        let results = TestSuiteResult {
            environment: "prod".to_string(),
            started_at: Utc::now(),
            total: 1,
            passed: 0,
            failed: 1,
            skipped: 0,
            duration_ms: 12,
            results: vec![TestResult {
                name: "api_login".to_string(),
                project: None,
                success: false,
                duration_ms: 12,
                timings: Vec::new(),
                screenshot_path: None,
                error: Some("boom".to_string()),
            }],
        };

        let path = runner.write_results(&results).unwrap();
        assert_eq!(path, dir.path().join("nested").join("results.json"));

        let written: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(written["failed"], 1);
        assert_eq!(written["results"][0]["error"], "boom");
        assert!(written["results"][0].get("project").is_none());
    }
}
