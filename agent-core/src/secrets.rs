use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;
use tracing::info;

use crate::error::{AgentError, Result};

const SECRET_MANAGER_BASE: &str = "https://secretmanager.googleapis.com/v1";
const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Client for Google Secret Manager.
///
/// Secrets are fetched once at process startup; a missing required secret is
/// fatal for the calling service, so there is no retry and no caching here.
pub struct SecretStore {
    http: reqwest::Client,
    project_id: String,
    api_base: String,
    token_url: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct AccessSecretResponse {
    payload: SecretPayload,
}

#[derive(Debug, Deserialize)]
struct SecretPayload {
    data: String,
}

impl SecretStore {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self::with_endpoints(project_id, SECRET_MANAGER_BASE, METADATA_TOKEN_URL)
    }

    fn with_endpoints(
        project_id: impl Into<String>,
        api_base: impl Into<String>,
        token_url: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            project_id: project_id.into(),
            api_base: api_base.into(),
            token_url: token_url.into(),
        }
    }

    /// Fetch the latest version of a named secret as UTF-8 text.
    pub async fn fetch(&self, name: &str) -> Result<String> {
        let token = self.access_token().await.map_err(|e| access_error(name, e))?;

        let url = format!(
            "{}/projects/{}/secrets/{}/versions/latest:access",
            self.api_base, self.project_id, name
        );
        let response = self
            .http
            .get(&url)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| access_error(name, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AgentError::SecretAccess {
                name: name.to_string(),
                reason: format!("status {}", status),
            });
        }

        let body: AccessSecretResponse =
            response.json().await.map_err(|e| access_error(name, e))?;
        let bytes = BASE64
            .decode(body.payload.data.as_bytes())
            .map_err(|e| access_error(name, e))?;
        let value = String::from_utf8(bytes).map_err(|e| access_error(name, e))?;

        info!(secret = name, "secret loaded");
        Ok(value)
    }

    /// Obtain an access token from the GCE metadata server.
    async fn access_token(&self) -> std::result::Result<String, reqwest::Error> {
        let response: TokenResponse = self
            .http
            .get(&self.token_url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.access_token)
    }
}

fn access_error(name: &str, source: impl std::fmt::Display) -> AgentError {
    AgentError::SecretAccess {
        name: name.to_string(),
        reason: source.to_string(),
    }
}
