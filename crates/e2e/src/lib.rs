//! HRM end-to-end and API test suite
//!
//! This crate drives the OrangeHRM web application the way a user and an API
//! client would:
//! - An authenticated HTTP session for the REST surface (`api`)
//! - Page objects over a browser driver, backed by a Playwright bridge process
//! - Polling assertions and timing budgets
//! - A runner that gives every scenario fresh fixtures and writes a JSON report
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     TestRunner (Rust)                       │
//! │    ├── run_api_scenario() -> ApiSession per scenario        │
//! │    ├── run_ui_scenario()  -> PlaywrightSession per project  │
//! │    └── write_results()    -> <output>/results.json          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ApiSession                       Page objects              │
//! │    ├── login()                      ├── LoginPage           │
//! │    ├── get/post/put/delete()        ├── DashboardPage       │
//! │    └── users() -> UserApi           ├── AdminSearchPage     │
//! │                                     └── NavigationBar       │
//! │                                           │                 │
//! │                              dyn BrowserDriver              │
//! │                                           │                 │
//! │                     PlaywrightSession (node bridge, JSON)   │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod driver;
pub mod error;
pub mod expect;
pub mod pages;
pub mod perf;
pub mod playwright;
pub mod runner;
pub mod scenarios;

#[cfg(test)]
mod fake_driver;

pub use api::{ApiSession, UserApi};
pub use driver::{BrowserDriver, Locator, WaitState};
pub use error::{E2eError, E2eResult};
pub use runner::{RunnerConfig, TestResult, TestRunner, TestSuiteResult};
pub use scenarios::Scenario;
