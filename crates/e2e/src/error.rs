//! Error types for E2E testing

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Playwright not found. Install with: npm i playwright && npx playwright install")]
    PlaywrightNotFound,

    #[error("Playwright error: {0}")]
    Playwright(String),

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("Unexpected status {status} for {method} {endpoint} (expected one of {expected:?})")]
    UnexpectedStatus {
        method: String,
        endpoint: String,
        status: u16,
        expected: Vec<u16>,
    },

    #[error("{operation} failed: {status} {status_text}")]
    RequestFailed {
        operation: String,
        status: u16,
        status_text: String,
    },

    #[error("Login failed: no session credential in response")]
    MissingCredential,

    #[error("Session is not authenticated, call login first")]
    NotAuthenticated,

    #[error("Page '{0}' has no URL to navigate to")]
    NoPageUrl(String),

    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),

    #[error("Config error: {0}")]
    Config(#[from] hrm_common::Error),

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Invalid header name: {0}")]
    InvalidHeaderName(#[from] reqwest::header::InvalidHeaderName),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl E2eError {
    pub fn is_timeout(&self) -> bool {
        match self {
            E2eError::Timeout(_) => true,
            E2eError::Http(e) => e.is_timeout(),
            _ => false,
        }
    }
}

pub type E2eResult<T> = Result<T, E2eError>;
