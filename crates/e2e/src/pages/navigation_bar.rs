use async_trait::async_trait;
use tracing::debug;

use super::{Page, PageContext};
use crate::driver::Locator;
use crate::error::E2eResult;
use crate::expect;

/// Side menu shared by every screen after login
pub struct NavigationBar {
    cx: PageContext,
    pub menu_items: Locator,
}

impl NavigationBar {
    pub fn new(cx: PageContext) -> Self {
        Self {
            cx,
            menu_items: Locator::new(r#"a[class*="oxd-main-menu-item"]"#),
        }
    }

    /// Menu entry whose visible text contains `name`
    pub fn menu_item(&self, name: &str) -> Locator {
        self.menu_items.filter_has_text(name)
    }

    pub async fn select_menu_item(&self, name: &str) -> E2eResult<()> {
        debug!("Selecting menu item {}", name);
        self.cx.driver().click(&self.menu_item(name)).await
    }

    /// Assert the entry carries the `active` class
    pub async fn check_menu_item_selected(&self, name: &str) -> E2eResult<()> {
        expect::to_contain_class(self.cx.driver(), &self.menu_item(name), "active", self.cx.expect_timeout).await
    }
}

#[async_trait]
impl Page for NavigationBar {
    fn name(&self) -> &'static str {
        "navigation bar"
    }

    fn context(&self) -> &PageContext {
        &self.cx
    }

    async fn is_loaded(&self) -> E2eResult<bool> {
        self.is_element_displayed(&self.menu_items.first(), None).await
    }
}
