use std::time::Duration;

use hrm_common::{ApiConfig, AuthScheme, GetUsersRequest, GetUsersResponse};
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::error::{E2eError, E2eResult};

/// Users-listing helper bound to one session credential
pub struct UserApi {
    client: Client,
    base_url: Url,
    endpoint: String,
    auth: AuthScheme,
    credential: String,
    timeout: Duration,
}

impl UserApi {
    pub(crate) fn new(client: Client, base_url: Url, config: &ApiConfig, credential: String) -> Self {
        Self {
            client,
            base_url,
            endpoint: config.endpoints.users_list.clone(),
            auth: config.auth.clone(),
            credential,
            timeout: config.timeouts.request(),
        }
    }

    /// List system users; unset request fields are left out of the query
    pub async fn get_users(&self, params: &GetUsersRequest) -> E2eResult<GetUsersResponse> {
        let endpoint = format!("{}{}", self.endpoint, params.to_query_string()?);
        let url = self.base_url.join(&endpoint)?;
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .header(self.auth.header_name(), self.auth.header_value(&self.credential))
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(E2eError::RequestFailed {
                operation: "Get users".to_string(),
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        Ok(response.json().await?)
    }
}
