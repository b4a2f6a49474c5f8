//! Wire shapes of the OrangeHRM REST surface
//!
//! These mirror server data read-only; the suite never builds a `User` to send.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A system user as returned by the users-listing endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub user_name: String,

    /// Soft-delete flag
    pub deleted: bool,

    /// Active flag
    pub status: bool,

    pub employee: Employee,
    pub user_role: UserRole,
}

/// Employee record embedded in a [`User`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub emp_number: i64,
    pub employee_id: String,
    pub first_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    pub last_name: String,
    #[serde(default)]
    pub termination_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRole {
    pub id: i64,
    pub name: String,
    pub display_name: String,
}

/// Query parameters for one users-listing call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetUsersRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_term: Option<String>,
}

impl GetUsersRequest {
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_sort_field(mut self, field: impl Into<String>) -> Self {
        self.sort_field = Some(field.into());
        self
    }

    pub fn with_search_term(mut self, term: impl Into<String>) -> Self {
        self.search_term = Some(term.into());
        self
    }

    /// Encode the set fields as `?k=v&...`, or an empty string when none are set
    pub fn to_query_string(&self) -> Result<String> {
        let encoded = serde_urlencoded::to_string(self)?;
        if encoded.is_empty() {
            Ok(String::new())
        } else {
            Ok(format!("?{}", encoded))
        }
    }
}

/// Users-listing response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetUsersResponse {
    pub data: Vec<User>,
    pub meta: ResponseMeta,
    #[serde(default)]
    pub rels: Vec<serde_json::Value>,
}

/// Pagination metadata; only `total` is guaranteed by every deployment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMeta {
    pub total: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,
}

/// Login reply of a bearer-token deployment: `{ data: { token } }`
#[derive(Debug, Clone, Deserialize)]
pub struct BearerLoginResponse {
    #[serde(default)]
    pub data: Option<TokenData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenData {
    #[serde(default)]
    pub token: Option<String>,
}

impl BearerLoginResponse {
    pub fn token(&self) -> Option<&str> {
        self.data
            .as_ref()
            .and_then(|d| d.token.as_deref())
            .filter(|t| !t.is_empty())
    }
}

/// Login reply of a cookie deployment: `{ cookies: [{ name, value }] }`
#[derive(Debug, Clone, Deserialize)]
pub struct CookieLoginResponse {
    #[serde(default)]
    pub cookies: Option<Vec<Cookie>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Cookie {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
}

impl CookieLoginResponse {
    /// Value of the first cookie called `name`
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .flatten()
            .find(|c| c.name == name)
            .and_then(|c| c.value.as_deref())
            .filter(|v| !v.is_empty())
    }
}
