//! HRM Common Library
//!
//! Configuration, wire models and shared error types for the HRM
//! end-to-end and API test suite.

pub mod config;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{
    AdminUser, ApiConfig, AuthScheme, Browser, Credentials, Environment, Fixtures,
    PerformanceConfig, Project, SuiteConfig, Threshold, TimingVerdict, UiConfig,
};
pub use error::{Error, Result};
pub use models::{Employee, GetUsersRequest, GetUsersResponse, ResponseMeta, User, UserRole};

/// Suite version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
