//! REST/auth surface of the application
//!
//! [`ApiSession`] owns one authenticated HTTP session; [`UserApi`] is the
//! users-listing helper it hands out after login.

mod schema;
mod session;
mod users;

pub use schema::{require_properties, validate_error_response, validate_response_schema, JsonKind};
pub use session::ApiSession;
pub use users::UserApi;

use reqwest::{Method, Response, StatusCode};

use crate::error::{E2eError, E2eResult};

/// Statuses the generic verbs of [`ApiSession`] accept
pub(crate) fn accepted_statuses(method: &Method) -> &'static [StatusCode] {
    match *method {
        Method::POST => &[StatusCode::OK, StatusCode::CREATED],
        Method::DELETE => &[StatusCode::OK, StatusCode::NO_CONTENT],
        _ => &[StatusCode::OK],
    }
}

pub(crate) fn check_status(
    status: StatusCode,
    method: &Method,
    endpoint: &str,
    expected: &[StatusCode],
) -> E2eResult<()> {
    if expected.contains(&status) {
        return Ok(());
    }
    Err(E2eError::UnexpectedStatus {
        method: method.as_str().to_string(),
        endpoint: endpoint.to_string(),
        status: status.as_u16(),
        expected: expected.iter().map(StatusCode::as_u16).collect(),
    })
}

/// Pass the response through if its status is one of `expected`
pub(crate) fn ensure_status(
    response: Response,
    method: &Method,
    endpoint: &str,
    expected: &[StatusCode],
) -> E2eResult<Response> {
    check_status(response.status(), method, endpoint, expected)?;
    Ok(response)
}
