use hrm_common::models::{BearerLoginResponse, CookieLoginResponse};
use hrm_common::{ApiConfig, AuthScheme, Environment};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};
use url::Url;

use super::{accepted_statuses, ensure_status, UserApi};
use crate::error::{E2eError, E2eResult};

#[derive(Serialize)]
struct LoginForm<'a> {
    username: &'a str,
    password: &'a str,
}

/// One authenticated HTTP session against the application
///
/// Created by [`ApiSession::initialize`] and released by [`ApiSession::dispose`].
/// After [`ApiSession::login`] every request carries the session credential;
/// it is never refreshed, so calls after it expires fail.
pub struct ApiSession {
    config: ApiConfig,
    base_url: Url,
    client: Client,
    credential: Option<String>,
    users: Option<UserApi>,
}

impl ApiSession {
    /// Open a client bound to the environment's base URL with the default headers
    pub fn initialize(config: &ApiConfig, environment: Environment) -> E2eResult<Self> {
        let base_url = Url::parse(config.base_url(environment))?;
        let client = build_client(config, None)?;
        info!("API session opened against {} ({})", base_url, environment);

        Ok(Self {
            config: config.clone(),
            base_url,
            client,
            credential: None,
            users: None,
        })
    }

    /// Authenticate and attach the returned credential to all later requests
    pub async fn login(&mut self, username: &str, password: &str) -> E2eResult<String> {
        let endpoint = self.config.endpoints.login.clone();
        let form = LoginForm { username, password };

        let request = self.bounded_request(Method::POST, &endpoint)?;
        let request = match &self.config.auth {
            AuthScheme::Bearer => request.json(&form),
            AuthScheme::Cookie { .. } => request.form(&form),
        };
        let response = request.send().await?;
        let response = ensure_status(response, &Method::POST, &endpoint, &[StatusCode::OK])?;

        let credential = match &self.config.auth {
            AuthScheme::Bearer => response
                .json::<BearerLoginResponse>()
                .await?
                .token()
                .map(String::from),
            AuthScheme::Cookie { name } => response
                .json::<CookieLoginResponse>()
                .await?
                .cookie(name)
                .map(String::from),
        }
        .ok_or(E2eError::MissingCredential)?;

        let auth = &self.config.auth;
        let header_value = auth.header_value(&credential);
        self.client = build_client(&self.config, Some((auth.header_name(), &header_value)))?;
        self.users = Some(UserApi::new(
            self.client.clone(),
            self.base_url.clone(),
            &self.config,
            credential.clone(),
        ));
        self.credential = Some(credential.clone());

        info!("Logged in as {}", username);
        Ok(credential)
    }

    /// Session credential, once logged in
    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }

    /// Users helper bound to this session's credential
    pub fn users(&self) -> E2eResult<&UserApi> {
        self.users.as_ref().ok_or(E2eError::NotAuthenticated)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// GET, expecting 200
    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str, params: &[(&str, &str)]) -> E2eResult<T> {
        let response = self.bounded_request(Method::GET, endpoint)?.query(params).send().await?;
        let response = ensure_status(response, &Method::GET, endpoint, accepted_statuses(&Method::GET))?;
        Ok(response.json().await?)
    }

    /// POST a JSON body, expecting 200 or 201
    pub async fn post<T, B>(&self, endpoint: &str, body: &B) -> E2eResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self.bounded_request(Method::POST, endpoint)?.json(body).send().await?;
        let response = ensure_status(response, &Method::POST, endpoint, accepted_statuses(&Method::POST))?;
        Ok(response.json().await?)
    }

    /// PUT a JSON body, expecting 200
    pub async fn put<T, B>(&self, endpoint: &str, body: &B) -> E2eResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self.bounded_request(Method::PUT, endpoint)?.json(body).send().await?;
        let response = ensure_status(response, &Method::PUT, endpoint, accepted_statuses(&Method::PUT))?;
        Ok(response.json().await?)
    }

    /// DELETE, expecting 200 (body returned) or 204 (`None`)
    pub async fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> E2eResult<Option<T>> {
        let response = self.bounded_request(Method::DELETE, endpoint)?.send().await?;
        let response = ensure_status(response, &Method::DELETE, endpoint, accepted_statuses(&Method::DELETE))?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        Ok(Some(response.json().await?))
    }

    /// Send a request without any status expectation, for negative checks
    ///
    /// Only the client-wide response timeout applies.
    pub async fn send_raw(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&serde_json::Value>,
    ) -> E2eResult<Response> {
        let mut request = self.request(method, endpoint)?;
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }

    /// Release the client; the session cannot be used afterwards
    pub fn dispose(self) {
        info!("API session against {} disposed", self.base_url);
    }

    fn request(&self, method: Method, endpoint: &str) -> E2eResult<RequestBuilder> {
        let url = self.base_url.join(endpoint)?;
        debug!("{} {}", method, url);
        Ok(self.client.request(method, url))
    }

    fn bounded_request(&self, method: Method, endpoint: &str) -> E2eResult<RequestBuilder> {
        Ok(self.request(method, endpoint)?.timeout(self.config.timeouts.request()))
    }
}

fn build_client(config: &ApiConfig, auth: Option<(&str, &str)>) -> E2eResult<Client> {
    let mut map = HeaderMap::new();
    for (name, value) in &config.headers {
        map.insert(HeaderName::from_bytes(name.as_bytes())?, HeaderValue::from_str(value)?);
    }
    if let Some((name, value)) = auth {
        let mut value = HeaderValue::from_str(value)?;
        value.set_sensitive(true);
        map.insert(HeaderName::from_bytes(name.as_bytes())?, value);
    }
    Ok(Client::builder()
        .default_headers(map)
        .timeout(config.timeouts.response())
        .build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_rejects_bad_base_url() {
        let mut config = ApiConfig::default();
        config.base_urls.prod = "not a url".to_string();
        assert!(matches!(
            ApiSession::initialize(&config, Environment::Prod),
            Err(E2eError::Url(_))
        ));
    }

    #[test]
    fn test_users_requires_login() {
        let session = ApiSession::initialize(&ApiConfig::default(), Environment::Dev).unwrap();
        assert!(!session.is_authenticated());
        assert!(matches!(session.users(), Err(E2eError::NotAuthenticated)));
        session.dispose();
    }

    #[test]
    fn test_endpoints_resolve_against_base() {
        let session = ApiSession::initialize(&ApiConfig::default(), Environment::Prod).unwrap();
        let url = session.base_url().join("web/index.php/api/v2/admin/users").unwrap();
        assert_eq!(
            url.as_str(),
            "https://opensource-demo.orangehrmlive.com/web/index.php/api/v2/admin/users"
        );
        let url = session.base_url().join("/auth/login").unwrap();
        assert_eq!(url.as_str(), "https://opensource-demo.orangehrmlive.com/auth/login");
    }

    #[test]
    fn test_build_client_rejects_bad_header() {
        let mut config = ApiConfig::default();
        config.headers.insert("X-Bad".to_string(), "line\nbreak".to_string());
        assert!(matches!(build_client(&config, None), Err(E2eError::InvalidHeader(_))));
    }
}
