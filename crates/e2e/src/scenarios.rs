//! End-to-end scenarios
//!
//! Each scenario composes the API session or the page objects and asserts one
//! user-visible outcome. API scenarios receive a freshly initialized session;
//! UI scenarios start on the login page of a fresh browser.

use std::fmt;

use hrm_common::{GetUsersRequest, SuiteConfig};
use serde_json::Value;
use tracing::info;

use crate::api::{require_properties, validate_response_schema, ApiSession, JsonKind};
use crate::error::{E2eError, E2eResult};
use crate::pages::{AdminSearchPage, DashboardPage, LoginPage, Page, PageContext};
use crate::perf::{timed, Timing};

/// Label shown above the admin search results for a single match
pub const ONE_RECORD_FOUND: &str = "(1) Record Found";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scenario {
    /// Valid credentials yield a session credential
    ApiLogin,
    /// Invalid credentials are refused with a non-200 status
    ApiLoginRejected,
    /// Authenticated users listing has the expected shape
    ApiListUsers,
    /// UI login lands on the dashboard with "Dashboard" active
    UiLogin,
    /// Admin search for the fixture user finds exactly that user
    UiAdminSearch,
}

impl Scenario {
    pub fn all() -> &'static [Scenario] {
        &[
            Scenario::ApiLogin,
            Scenario::ApiLoginRejected,
            Scenario::ApiListUsers,
            Scenario::UiLogin,
            Scenario::UiAdminSearch,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Scenario::ApiLogin => "api_login",
            Scenario::ApiLoginRejected => "api_login_rejected",
            Scenario::ApiListUsers => "api_list_users",
            Scenario::UiLogin => "ui_login",
            Scenario::UiAdminSearch => "ui_admin_search",
        }
    }

    pub fn tags(&self) -> &'static [&'static str] {
        match self {
            Scenario::ApiLogin | Scenario::ApiLoginRejected => &["api", "auth"],
            Scenario::ApiListUsers => &["api", "users"],
            Scenario::UiLogin => &["ui", "auth"],
            Scenario::UiAdminSearch => &["ui", "search"],
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags().contains(&tag)
    }

    pub fn needs_browser(&self) -> bool {
        matches!(self, Scenario::UiLogin | Scenario::UiAdminSearch)
    }

    pub fn from_name(name: &str) -> E2eResult<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|s| s.name() == name)
            .ok_or_else(|| E2eError::UnknownScenario(name.to_string()))
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Run an API scenario on a freshly initialized session
pub async fn run_api(
    scenario: Scenario,
    session: &mut ApiSession,
    config: &SuiteConfig,
    timings: &mut Vec<Timing>,
) -> E2eResult<()> {
    match scenario {
        Scenario::ApiLogin => api_login(session, config, timings).await,
        Scenario::ApiLoginRejected => api_login_rejected(session, config).await,
        Scenario::ApiListUsers => api_list_users(session, config, timings).await,
        Scenario::UiLogin | Scenario::UiAdminSearch => Err(E2eError::UnknownScenario(format!(
            "{} is not an API scenario",
            scenario
        ))),
    }
}

/// Run a UI scenario; the page is expected to be showing the login screen
pub async fn run_ui(
    scenario: Scenario,
    cx: &PageContext,
    config: &SuiteConfig,
    timings: &mut Vec<Timing>,
) -> E2eResult<()> {
    match scenario {
        Scenario::UiLogin => ui_login(cx, config, timings).await,
        Scenario::UiAdminSearch => ui_admin_search(cx, config, timings).await,
        _ => Err(E2eError::UnknownScenario(format!("{} is not a UI scenario", scenario))),
    }
}

pub async fn api_login(session: &mut ApiSession, config: &SuiteConfig, timings: &mut Vec<Timing>) -> E2eResult<()> {
    let user = &config.fixtures.valid_user;
    let credential = timed(
        timings,
        "api login",
        &config.performance.login,
        session.login(&user.username, &user.password),
    )
    .await?;

    if credential.is_empty() {
        return Err(E2eError::AssertionFailed("login returned an empty credential".to_string()));
    }
    Ok(())
}

pub async fn api_login_rejected(session: &mut ApiSession, config: &SuiteConfig) -> E2eResult<()> {
    let user = &config.fixtures.valid_user;
    let password = format!("{}-wrong", user.password);

    match session.login(&user.username, &password).await {
        Ok(_) => Err(E2eError::AssertionFailed(
            "login with a wrong password returned a credential".to_string(),
        )),
        Err(E2eError::UnexpectedStatus { status, .. }) => {
            info!("Invalid login refused with status {}", status);
            Ok(())
        }
        Err(e) => Err(e),
    }
}

pub async fn api_list_users(
    session: &mut ApiSession,
    config: &SuiteConfig,
    timings: &mut Vec<Timing>,
) -> E2eResult<()> {
    let user = &config.fixtures.valid_user;
    session.login(&user.username, &user.password).await?;

    let response = timed(timings, "get users", &config.performance.api_response, async {
        session.users()?.get_users(&GetUsersRequest::default()).await
    })
    .await?;
    info!("Users listing returned {} of {} users", response.data.len(), response.meta.total);

    // Re-read the raw body; the typed model tolerates fields the contract requires
    let raw: Value = session.get(&config.api.endpoints.users_list, &[]).await?;
    validate_response_schema(
        &raw,
        &[("data", JsonKind::Array), ("meta", JsonKind::Object), ("rels", JsonKind::Array)],
    )?;
    require_properties(&raw["meta"], &["total"])?;

    if let Some(first) = raw["data"].as_array().and_then(|users| users.first()) {
        require_properties(first, &["id", "userName", "deleted", "status", "employee", "userRole"])?;
        require_properties(&first["employee"], &["empNumber", "employeeId", "firstName", "lastName"])?;
        require_properties(&first["userRole"], &["id", "name", "displayName"])?;
    }
    Ok(())
}

pub async fn ui_login(cx: &PageContext, config: &SuiteConfig, timings: &mut Vec<Timing>) -> E2eResult<()> {
    let dashboard = log_in_to_dashboard(cx, config, timings).await?;
    dashboard.navigation_bar.check_menu_item_selected("Dashboard").await
}

pub async fn ui_admin_search(cx: &PageContext, config: &SuiteConfig, timings: &mut Vec<Timing>) -> E2eResult<()> {
    let user = &config.fixtures.admin_user;
    let dashboard = log_in_to_dashboard(cx, config, timings).await?;

    dashboard.navigation_bar.select_menu_item("Admin").await?;
    dashboard.navigation_bar.check_menu_item_selected("Admin").await?;

    let admin = AdminSearchPage::new(cx.clone());
    admin.fill_username(&user.username).await?;
    admin.select_user_role(&user.user_role).await?;

    timed(timings, "admin search", &config.performance.search, async {
        admin.click_search().await?;
        admin.expect_records_found(ONE_RECORD_FOUND).await
    })
    .await?;

    admin
        .check_result_on_row_by_index_and_column(1, "Username", &user.username)
        .await?;
    admin
        .check_result_on_row_by_index_and_column(1, "User Role", &user.user_role)
        .await
}

async fn log_in_to_dashboard(
    cx: &PageContext,
    config: &SuiteConfig,
    timings: &mut Vec<Timing>,
) -> E2eResult<DashboardPage> {
    let user = &config.fixtures.admin_user;
    let login = LoginPage::new(cx.clone());
    let dashboard = DashboardPage::new(cx.clone());

    timed(timings, "ui login", &config.performance.login, async {
        login.login(&user.username, &user.password).await?;
        expect_loaded(&dashboard).await
    })
    .await?;
    Ok(dashboard)
}

async fn expect_loaded<P: Page>(page: &P) -> E2eResult<()> {
    if page.is_loaded().await? {
        Ok(())
    } else {
        Err(E2eError::AssertionFailed(format!("{} is not showing", page.name())))
    }
}
