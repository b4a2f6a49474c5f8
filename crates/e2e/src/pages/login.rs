use async_trait::async_trait;
use tracing::info;

use super::{Page, PageContext};
use crate::driver::Locator;
use crate::error::E2eResult;

/// Path of the login screen on the application server
pub const LOGIN_PATH: &str = "/web/index.php/auth/login";

/// Login screen
pub struct LoginPage {
    cx: PageContext,
    pub login_header: Locator,
    pub login_btn: Locator,
    pub username_input: Locator,
    pub password_input: Locator,
}

impl LoginPage {
    pub fn new(cx: PageContext) -> Self {
        Self {
            cx,
            login_header: Locator::new(r#"//h5[.="Login"]"#),
            login_btn: Locator::new(r#"//button[contains(., "Login")]"#),
            username_input: Locator::new(r#"input[name="username"]"#),
            password_input: Locator::new(r#"input[name="password"]"#),
        }
    }

    /// Fill both fields and submit
    pub async fn login(&self, username: &str, password: &str) -> E2eResult<()> {
        info!("Logging in through the UI as {}", username);
        let driver = self.cx.driver();
        driver.fill(&self.username_input, username).await?;
        driver.fill(&self.password_input, password).await?;
        driver.click(&self.login_btn).await
    }
}

#[async_trait]
impl Page for LoginPage {
    fn name(&self) -> &'static str {
        "login page"
    }

    fn context(&self) -> &PageContext {
        &self.cx
    }

    fn url(&self) -> Option<String> {
        Some(self.cx.url(LOGIN_PATH))
    }

    async fn is_loaded(&self) -> E2eResult<bool> {
        self.is_element_displayed(&self.login_header, None).await
    }
}
