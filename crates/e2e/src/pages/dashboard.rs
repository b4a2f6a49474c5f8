use async_trait::async_trait;

use super::{NavigationBar, Page, PageContext};
use crate::driver::Locator;
use crate::error::E2eResult;

/// Landing screen after login
pub struct DashboardPage {
    cx: PageContext,
    pub navigation_bar: NavigationBar,
    pub dashboard_header: Locator,
}

impl DashboardPage {
    pub fn new(cx: PageContext) -> Self {
        Self {
            navigation_bar: NavigationBar::new(cx.clone()),
            dashboard_header: Locator::new(r#"//header//span[.="Dashboard"]"#),
            cx,
        }
    }
}

#[async_trait]
impl Page for DashboardPage {
    fn name(&self) -> &'static str {
        "dashboard"
    }

    fn context(&self) -> &PageContext {
        &self.cx
    }

    async fn is_loaded(&self) -> E2eResult<bool> {
        self.is_element_displayed(&self.dashboard_header, None).await
    }
}
