//! Suite configuration
//!
//! Every value has a default matching the public OrangeHRM demo deployment, so
//! a missing config file is not an error. A TOML file may override any subset
//! of fields, and a couple of environment variables override the file.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use crate::error::{Error, Result};

/// Default location of the optional config file
pub const DEFAULT_CONFIG_FILE: &str = "hrm-e2e.toml";

const DEMO_HOST: &str = "https://opensource-demo.orangehrmlive.com";

/// Deployment environment the suite targets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Staging,
    #[default]
    Prod,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Dev => "dev",
            Environment::Staging => "staging",
            Environment::Prod => "prod",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Dev),
            "staging" | "stage" => Ok(Environment::Staging),
            "prod" | "production" => Ok(Environment::Prod),
            other => Err(Error::UnknownEnvironment(other.to_string())),
        }
    }
}

/// Top-level configuration for a test run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Environment whose base URL the API session uses
    pub environment: Environment,

    /// REST/auth surface
    pub api: ApiConfig,

    /// Browser surface
    pub ui: UiConfig,

    /// Fixed credentials used as test input
    pub fixtures: Fixtures,

    /// Timing budgets
    pub performance: PerformanceConfig,

    /// Where reports and failure screenshots go
    pub output_dir: OutputDir,
}

/// Output directory wrapper so the default survives partial TOML files
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputDir(pub PathBuf);

impl Default for OutputDir {
    fn default() -> Self {
        Self(PathBuf::from("test-results"))
    }
}

impl SuiteConfig {
    /// Load configuration from file, falling back to defaults when it is absent
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            debug!("Loading config from {}", path.display());
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration the way test binaries do: `HRM_CONFIG` names the
    /// file, and `HRM_ENV` / `HRM_BASE_URL` / `HRM_HEADLESS` override it.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// [`SuiteConfig::from_env`] over an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = lookup("HRM_CONFIG").unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());
        let mut config = Self::load(Path::new(&path))?;
        config.apply_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a key lookup (normally the process environment)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(env) = lookup("HRM_ENV") {
            self.environment = env.parse()?;
        }
        if let Some(url) = lookup("HRM_BASE_URL") {
            let url = url.trim().to_string();
            match self.environment {
                Environment::Dev => self.api.base_urls.dev = url,
                Environment::Staging => self.api.base_urls.staging = url,
                Environment::Prod => self.api.base_urls.prod = url,
            }
        }
        if let Some(headless) = lookup("HRM_HEADLESS") {
            self.ui.headless = !matches!(headless.trim(), "0" | "false" | "no");
        }
        Ok(())
    }

    /// Reject configurations that cannot drive a run
    pub fn validate(&self) -> Result<()> {
        for env in [Environment::Dev, Environment::Staging, Environment::Prod] {
            let url = self.api.base_url(env);
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(Error::InvalidConfig(format!(
                    "base URL for {} must be http(s), got '{}'",
                    env, url
                )));
            }
        }
        if self.ui.projects.is_empty() {
            return Err(Error::InvalidConfig("at least one browser project is required".to_string()));
        }
        if let AuthScheme::Cookie { name } = &self.api.auth {
            if name.is_empty() {
                return Err(Error::InvalidConfig("cookie auth needs a cookie name".to_string()));
            }
        }
        Ok(())
    }

    /// Base URL of the API for the configured environment
    pub fn api_base_url(&self) -> &str {
        self.api.base_url(self.environment)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir.0
    }
}

/// REST/auth configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_urls: BaseUrls,
    pub endpoints: Endpoints,

    /// Headers sent with every request
    pub headers: BTreeMap<String, String>,

    /// How the session credential is obtained and attached
    pub auth: AuthScheme,

    pub timeouts: Timeouts,
}

impl Default for ApiConfig {
    fn default() -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers.insert("Accept".to_string(), "application/json".to_string());

        Self {
            base_urls: BaseUrls::default(),
            endpoints: Endpoints::default(),
            headers,
            auth: AuthScheme::default(),
            timeouts: Timeouts::default(),
        }
    }
}

impl ApiConfig {
    pub fn base_url(&self, env: Environment) -> &str {
        match env {
            Environment::Dev => &self.base_urls.dev,
            Environment::Staging => &self.base_urls.staging,
            Environment::Prod => &self.base_urls.prod,
        }
    }
}

/// Base URL per environment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseUrls {
    pub dev: String,
    pub staging: String,
    pub prod: String,
}

impl Default for BaseUrls {
    fn default() -> Self {
        Self {
            dev: DEMO_HOST.to_string(),
            staging: DEMO_HOST.to_string(),
            prod: DEMO_HOST.to_string(),
        }
    }
}

/// Endpoint paths, relative to the base URL
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub login: String,
    pub users_list: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            login: "/auth/login".to_string(),
            users_list: "web/index.php/api/v2/admin/users".to_string(),
        }
    }
}

/// Session credential scheme of the target deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "snake_case")]
pub enum AuthScheme {
    /// JSON credentials, token read from `data.token`, sent as `Authorization: Bearer`
    Bearer,

    /// Form credentials, value read from the named entry of `cookies[]`, sent as `Cookie`
    Cookie {
        #[serde(default = "default_cookie_name")]
        name: String,
    },
}

fn default_cookie_name() -> String {
    "orangehrm".to_string()
}

impl Default for AuthScheme {
    fn default() -> Self {
        AuthScheme::Cookie {
            name: default_cookie_name(),
        }
    }
}

impl AuthScheme {
    /// Name of the header carrying the credential
    pub fn header_name(&self) -> &'static str {
        match self {
            AuthScheme::Bearer => "Authorization",
            AuthScheme::Cookie { .. } => "Cookie",
        }
    }

    /// Header value carrying the credential
    pub fn header_value(&self, credential: &str) -> String {
        match self {
            AuthScheme::Bearer => format!("Bearer {}", credential),
            AuthScheme::Cookie { name } => format!("{}={}", name, credential),
        }
    }
}

/// HTTP timeouts in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Bound on each API call
    pub request_ms: u64,

    /// Client-wide ceiling for requests that carry no bound of their own
    pub response_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            request_ms: 10_000,
            response_ms: 30_000,
        }
    }
}

impl Timeouts {
    pub fn request(&self) -> Duration {
        Duration::from_millis(self.request_ms)
    }

    pub fn response(&self) -> Duration {
        Duration::from_millis(self.response_ms)
    }
}

/// Browser engine
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
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chromium" | "chrome" => Ok(Browser::Chromium),
            "firefox" => Ok(Browser::Firefox),
            "webkit" | "safari" => Ok(Browser::Webkit),
            other => Err(Error::UnknownBrowser(other.to_string())),
        }
    }
}

/// One browser/device combination UI scenarios run against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub browser: Browser,

    /// Playwright device descriptor name, e.g. `Pixel 5`
    #[serde(default)]
    pub device: Option<String>,
}

impl Project {
    pub fn new(name: &str, browser: Browser, device: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            browser,
            device: device.map(String::from),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Browser-side configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Root URL of the web application
    pub server_url: String,

    /// Wait used by page objects for element visibility
    pub element_display_timeout_ms: u64,

    /// Wait used by polling assertions
    pub expect_timeout_ms: u64,

    /// Default timeout for clicks, fills and navigation
    pub action_timeout_ms: u64,

    pub headless: bool,
    pub viewport: Viewport,
    pub projects: Vec<Project>,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            server_url: DEMO_HOST.to_string(),
            element_display_timeout_ms: 30_000,
            expect_timeout_ms: 30_000,
            action_timeout_ms: 30_000,
            headless: true,
            viewport: Viewport {
                width: 1280,
                height: 720,
            },
            projects: vec![
                Project::new("chromium", Browser::Chromium, None),
                Project::new("firefox", Browser::Firefox, None),
                Project::new("webkit", Browser::Webkit, None),
                Project::new("Mobile Chrome", Browser::Chromium, Some("Pixel 5")),
                Project::new("Mobile Safari", Browser::Webkit, Some("iPhone 12")),
            ],
        }
    }
}

impl UiConfig {
    pub fn element_display_timeout(&self) -> Duration {
        Duration::from_millis(self.element_display_timeout_ms)
    }

    pub fn expect_timeout(&self) -> Duration {
        Duration::from_millis(self.expect_timeout_ms)
    }

    pub fn action_timeout(&self) -> Duration {
        Duration::from_millis(self.action_timeout_ms)
    }
}

/// Username/password pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Admin account used by the UI scenarios
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUser {
    pub username: String,
    pub password: String,
    pub user_role: String,
}

impl AdminUser {
    pub fn credentials(&self) -> Credentials {
        Credentials {
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }
}

/// Hard-coded test input
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Fixtures {
    pub valid_user: Credentials,
    pub admin_user: AdminUser,
}

impl Default for Fixtures {
    fn default() -> Self {
        Self {
            valid_user: Credentials {
                username: "Admin".to_string(),
                password: "admin123".to_string(),
            },
            admin_user: AdminUser {
                username: "Admin".to_string(),
                password: "admin123".to_string(),
                user_role: "Admin".to_string(),
            },
        }
    }
}

/// Outcome of comparing an elapsed time against a threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingVerdict {
    WithinBudget,
    Slow,
    OverBudget,
}

/// Warning and hard limits for one kind of operation, in milliseconds
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Threshold {
    pub max_ms: u64,
    pub warning_ms: u64,
}

impl Threshold {
    pub const fn new(max_ms: u64, warning_ms: u64) -> Self {
        Self { max_ms, warning_ms }
    }

    pub fn classify(&self, elapsed: Duration) -> TimingVerdict {
        let ms = elapsed.as_millis() as u64;
        if ms > self.max_ms {
            TimingVerdict::OverBudget
        } else if ms > self.warning_ms {
            TimingVerdict::Slow
        } else {
            TimingVerdict::WithinBudget
        }
    }
}

/// Timing budgets per operation kind
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    pub page_load: Threshold,
    pub login: Threshold,
    pub search: Threshold,
    pub api_response: Threshold,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            page_load: Threshold::new(5000, 3000),
            login: Threshold::new(3000, 2000),
            search: Threshold::new(2000, 1000),
            api_response: Threshold::new(1000, 500),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use test_case::test_case;

    #[test]
    fn test_defaults_point_at_demo_host() {
        let config = SuiteConfig::default();
        assert_eq!(config.environment, Environment::Prod);
        assert_eq!(config.api_base_url(), DEMO_HOST);
        assert_eq!(config.api.timeouts.request(), Duration::from_secs(10));
        assert_eq!(config.ui.element_display_timeout(), Duration::from_secs(30));
        assert_eq!(config.fixtures.valid_user.username, "Admin");
        assert_eq!(config.fixtures.valid_user.password, "admin123");
        assert_eq!(config.api.headers.get("Accept").map(String::as_str), Some("application/json"));
        assert_eq!(config.ui.projects.len(), 5);
        config.validate().unwrap();
    }

    #[test_case("dev", Environment::Dev)]
    #[test_case("Staging", Environment::Staging)]
    #[test_case("production", Environment::Prod)]
    fn test_parse_environment(input: &str, expected: Environment) {
        assert_eq!(input.parse::<Environment>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_environment_is_rejected() {
        assert!(matches!("qa".parse::<Environment>(), Err(Error::UnknownEnvironment(_))));
    }

    #[test]
    fn test_auth_header_per_scheme() {
        let cookie = AuthScheme::default();
        assert_eq!(cookie.header_name(), "Cookie");
        assert_eq!(cookie.header_value("abc"), "orangehrm=abc");

        assert_eq!(AuthScheme::Bearer.header_name(), "Authorization");
        assert_eq!(AuthScheme::Bearer.header_value("abc"), "Bearer abc");
    }

    #[test]
    fn test_threshold_classification() {
        let t = Threshold::new(1000, 500);
        assert_eq!(t.classify(Duration::from_millis(200)), TimingVerdict::WithinBudget);
        assert_eq!(t.classify(Duration::from_millis(500)), TimingVerdict::WithinBudget);
        assert_eq!(t.classify(Duration::from_millis(750)), TimingVerdict::Slow);
        assert_eq!(t.classify(Duration::from_millis(1001)), TimingVerdict::OverBudget);
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = SuiteConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.api.endpoints.login, "/auth/login");
    }

    #[test]
    fn test_load_partial_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hrm-e2e.toml");
        std::fs::write(
            &path,
            r#"
environment = "staging"
output_dir = "out"

[api.base_urls]
staging = "https://staging.example.com"

[api.auth]
scheme = "bearer"

[ui]
headless = false
projects = [{ name = "chromium", browser = "chromium" }]
"#,
        )
        .unwrap();

        let config = SuiteConfig::load(&path).unwrap();
        assert_eq!(config.environment, Environment::Staging);
        assert_eq!(config.api_base_url(), "https://staging.example.com");
        assert_eq!(config.api.base_urls.prod, DEMO_HOST);
        assert_eq!(config.api.auth, AuthScheme::Bearer);
        assert!(!config.ui.headless);
        assert_eq!(config.ui.projects.len(), 1);
        assert_eq!(config.output_dir(), Path::new("out"));
        // untouched sections keep their defaults
        assert_eq!(config.api.timeouts.request_ms, 10_000);
        assert_eq!(config.performance.login.max_ms, 3000);
    }

    #[test]
    fn test_load_rejects_non_http_base_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[api.base_urls]\ndev = \"ftp://nope\"\n").unwrap();
        assert!(matches!(SuiteConfig::load(&path), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [("HRM_ENV", "dev"), ("HRM_HEADLESS", "0")].into_iter().collect();
        let mut config = SuiteConfig::default();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.environment, Environment::Dev);
        assert!(!config.ui.headless);
    }

    #[test]
    fn test_base_url_override_targets_selected_environment() {
        let vars: HashMap<&str, &str> =
            [("HRM_ENV", "staging"), ("HRM_BASE_URL", "https://staging.example.com ")].into_iter().collect();
        let mut config = SuiteConfig::default();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.api_base_url(), "https://staging.example.com");
        assert_eq!(config.api.base_urls.prod, DEMO_HOST);
    }

    #[test]
    fn test_overridden_values_are_validated() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml").to_string_lossy().to_string();
        let vars: HashMap<&str, String> = [
            ("HRM_CONFIG", missing.clone()),
            ("HRM_BASE_URL", "ftp://nope".to_string()),
        ]
        .into_iter()
        .collect();
        let result = SuiteConfig::from_lookup(|key| vars.get(key).cloned());
        assert!(matches!(result, Err(Error::InvalidConfig(_))));

        let config = SuiteConfig::from_lookup(|key| (key == "HRM_CONFIG").then(|| missing.clone())).unwrap();
        assert_eq!(config.api_base_url(), DEMO_HOST);
    }

    #[test_case("chromium", Browser::Chromium)]
    #[test_case("Chrome", Browser::Chromium)]
    #[test_case("firefox", Browser::Firefox)]
    #[test_case("safari", Browser::Webkit)]
    fn test_parse_browser(input: &str, expected: Browser) {
        assert_eq!(input.parse::<Browser>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_browser_is_rejected() {
        assert!(matches!("netscape".parse::<Browser>(), Err(Error::UnknownBrowser(name)) if name == "netscape"));
    }

    #[test]
    fn test_http_timeouts() {
        let timeouts = Timeouts::default();
        assert_eq!(timeouts.request(), Duration::from_secs(10));
        assert_eq!(timeouts.response(), Duration::from_secs(30));
    }
}
