//! Browser driver seam
//!
//! Page objects only ever talk to a [`BrowserDriver`]. The production driver is
//! [`crate::playwright::PlaywrightSession`]; unit tests use an in-memory fake.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::E2eResult;

/// Address of a UI element, resolved lazily at interaction time
///
/// Selectors starting with `//` are treated as XPath by Playwright, anything
/// else as CSS.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    pub selector: String,

    /// Keep only matches whose text contains this string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_text: Option<String>,

    /// Pick the n-th (0-based) match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nth: Option<usize>,
}

impl Locator {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            has_text: None,
            nth: None,
        }
    }

    pub fn filter_has_text(&self, text: impl Into<String>) -> Self {
        Self {
            has_text: Some(text.into()),
            ..self.clone()
        }
    }

    pub fn nth(&self, index: usize) -> Self {
        Self {
            nth: Some(index),
            ..self.clone()
        }
    }

    pub fn first(&self) -> Self {
        self.nth(0)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.selector)?;
        if let Some(text) = &self.has_text {
            write!(f, " >> has-text={:?}", text)?;
        }
        if let Some(n) = self.nth {
            write!(f, " >> nth={}", n)?;
        }
        Ok(())
    }
}

/// Element state to wait for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitState {
    #[default]
    Visible,
    Hidden,
    Attached,
    Detached,
}

/// Operations a page object needs from a browser page
///
/// Every call is a suspension point; calls on one driver complete in the order
/// they were issued.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Navigate the page to an absolute URL
    async fn goto(&self, url: &str) -> E2eResult<()>;

    /// Wait until the element reaches `state`, or fail with `E2eError::Timeout`
    async fn wait_for(&self, locator: &Locator, state: WaitState, timeout: Duration) -> E2eResult<()>;

    async fn click(&self, locator: &Locator) -> E2eResult<()>;

    async fn fill(&self, locator: &Locator, value: &str) -> E2eResult<()>;

    /// Text content of the first match, `None` if nothing matches right now
    async fn text_content(&self, locator: &Locator) -> E2eResult<Option<String>>;

    /// Attribute of the first match, `None` if nothing matches or it is unset
    async fn attribute(&self, locator: &Locator, name: &str) -> E2eResult<Option<String>>;

    /// Full-page screenshot written to `path`
    async fn screenshot(&self, path: &Path) -> E2eResult<()>;

    /// Release the page and its browser
    async fn close(&self) -> E2eResult<()>;
}
