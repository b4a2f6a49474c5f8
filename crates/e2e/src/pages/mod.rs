//! Page objects
//!
//! One type per logical screen. Each holds the locators for its elements and a
//! few composite actions; the markup-specific selector strings live nowhere
//! else.

mod admin_search;
mod dashboard;
mod login;
mod navigation_bar;

pub use admin_search::AdminSearchPage;
pub use dashboard::DashboardPage;
pub use login::{LoginPage, LOGIN_PATH};
pub use navigation_bar::NavigationBar;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hrm_common::UiConfig;
use tracing::{debug, info};

use crate::driver::{BrowserDriver, Locator, WaitState};
use crate::error::{E2eError, E2eResult};

/// Everything a page object needs: the driver plus the UI timing settings
#[derive(Clone)]
pub struct PageContext {
    driver: Arc<dyn BrowserDriver>,
    server_url: String,

    /// Default wait for element visibility
    pub element_timeout: Duration,

    /// Default wait for polling assertions
    pub expect_timeout: Duration,
}

impl PageContext {
    pub fn new(driver: Arc<dyn BrowserDriver>, ui: &UiConfig) -> Self {
        Self {
            driver,
            server_url: ui.server_url.trim_end_matches('/').to_string(),
            element_timeout: ui.element_display_timeout(),
            expect_timeout: ui.expect_timeout(),
        }
    }

    pub fn with_timeouts(mut self, element_timeout: Duration, expect_timeout: Duration) -> Self {
        self.element_timeout = element_timeout;
        self.expect_timeout = expect_timeout;
        self
    }

    pub fn driver(&self) -> &dyn BrowserDriver {
        self.driver.as_ref()
    }

    /// Absolute URL for a path on the application server
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.server_url, path)
    }
}

/// Contract shared by every page object
///
/// `is_loaded` has no default: a page that cannot say whether it is showing
/// would make `navigate` pass vacuously.
#[async_trait]
pub trait Page: Send + Sync {
    /// Name used in logs and errors
    fn name(&self) -> &'static str;

    fn context(&self) -> &PageContext;

    /// URL `navigate` drives to; pages reached only by interaction have none
    fn url(&self) -> Option<String> {
        None
    }

    /// Whether the page-defining element is visible within the element timeout
    async fn is_loaded(&self) -> E2eResult<bool>;

    /// Load the page's URL and assert it is showing
    async fn navigate(&self) -> E2eResult<()> {
        let url = self
            .url()
            .ok_or_else(|| E2eError::NoPageUrl(self.name().to_string()))?;

        info!("Navigating to {} ({})", self.name(), url);
        self.context().driver().goto(&url).await?;

        if self.is_loaded().await? {
            Ok(())
        } else {
            Err(E2eError::AssertionFailed(format!(
                "{} did not load after navigating to {}",
                self.name(),
                url
            )))
        }
    }

    /// Suspend until the element is visible, failing with `Timeout` otherwise
    async fn wait_for_element_visible(&self, locator: &Locator, timeout: Option<Duration>) -> E2eResult<()> {
        let timeout = timeout.unwrap_or(self.context().element_timeout);
        self.context()
            .driver()
            .wait_for(locator, WaitState::Visible, timeout)
            .await
    }

    /// Like `wait_for_element_visible`, but a timeout reads as `false`
    async fn is_element_displayed(&self, locator: &Locator, timeout: Option<Duration>) -> E2eResult<bool> {
        match self.wait_for_element_visible(locator, timeout).await {
            Ok(()) => Ok(true),
            Err(e) if e.is_timeout() => {
                debug!("{} not displayed: {}", locator, e);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}
