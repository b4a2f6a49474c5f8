use async_trait::async_trait;
use tracing::debug;

use super::{Page, PageContext};
use crate::driver::Locator;
use crate::error::{E2eError, E2eResult};
use crate::expect;

/// Admin > User Management search screen
pub struct AdminSearchPage {
    cx: PageContext,
    pub admin_search_header: Locator,
    pub search_btn: Locator,
    pub username_input: Locator,
    pub user_role_dropdown: Locator,
    pub user_role_options: Locator,
    pub number_of_results: Locator,
}

impl AdminSearchPage {
    pub fn new(cx: PageContext) -> Self {
        Self {
            cx,
            admin_search_header: Locator::new(r#"//header//h6[.="Admin"]"#),
            search_btn: Locator::new(r#"//button[contains(., "Search")]"#),
            username_input: Locator::new(r#"//div[.="Username"]/following-sibling::div/input"#),
            user_role_dropdown: Locator::new(r#"//div[.="User Role"]/following-sibling::div"#),
            user_role_options: Locator::new(r#"div[class*="oxd-select-option"]"#),
            number_of_results: Locator::new(r#"//div[@role="table"]/../preceding-sibling::div//span"#),
        }
    }

    pub async fn fill_username(&self, username: &str) -> E2eResult<()> {
        self.cx.driver().fill(&self.username_input, username).await
    }

    /// Open the role dropdown and pick the option showing `role`
    pub async fn select_user_role(&self, role: &str) -> E2eResult<()> {
        debug!("Selecting user role {}", role);
        let driver = self.cx.driver();
        driver.click(&self.user_role_dropdown).await?;
        driver.click(&self.user_role_options.filter_has_text(role)).await
    }

    pub async fn click_search(&self) -> E2eResult<()> {
        self.cx.driver().click(&self.search_btn).await
    }

    /// Assert the records label contains `text`, e.g. `(1) Record Found`
    pub async fn expect_records_found(&self, text: &str) -> E2eResult<()> {
        expect::to_contain_text(self.cx.driver(), &self.number_of_results, text, self.cx.expect_timeout).await
    }

    /// Results-table cell at a 1-based row and the column whose header contains `column`
    pub fn result_cell(&self, index: usize, column: &str) -> E2eResult<Locator> {
        if index == 0 {
            return Err(E2eError::AssertionFailed("result rows are numbered from 1".to_string()));
        }
        Ok(Locator::new(format!(
            r#"//div[@class="oxd-table-body"]//div[@role="row"][{index}]//div[@role="cell"][count(//div[@role="columnheader"][contains(., "{column}")]//preceding-sibling::div) + 1]"#
        )))
    }

    /// Assert the cell at (`index`, `column`) shows exactly `expected`
    pub async fn check_result_on_row_by_index_and_column(
        &self,
        index: usize,
        column: &str,
        expected: &str,
    ) -> E2eResult<()> {
        let cell = self.result_cell(index, column)?;
        expect::to_have_text(self.cx.driver(), &cell, expected, self.cx.expect_timeout).await
    }
}

#[async_trait]
impl Page for AdminSearchPage {
    fn name(&self) -> &'static str {
        "admin user search"
    }

    fn context(&self) -> &PageContext {
        &self.cx
    }

    async fn is_loaded(&self) -> E2eResult<bool> {
        self.is_element_displayed(&self.admin_search_header, None).await
    }
}
