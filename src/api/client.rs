//! HTTP client for the compute API

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Response};
use tracing::debug;

use super::types::{ApiErrorBody, Server, ServerEnvelope, ServerListEnvelope};
use super::ServerApi;
use crate::config::Config;
use crate::error::{ExecError, Result};

/// Header carrying the API token
const AUTH_HEADER: &str = "x-auth-token";

/// Compute API client
#[derive(Debug, Clone)]
pub struct ScalewayClient {
    http: Client,
    endpoint: String,
    organization: Option<String>,
}

impl ScalewayClient {
    /// Create a client for `endpoint` authenticating with `token`
    pub fn new(endpoint: &str, token: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(token)
            .map_err(|_| ExecError::config("API token contains invalid characters"))?;
        auth.set_sensitive(true);
        headers.insert(AUTH_HEADER, auth);

        let http = Client::builder()
            .user_agent(concat!("scw-exec/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            organization: None,
        })
    }

    /// Create a client from the validated configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Self::new(&config.api_endpoint, &config.token)?;
        Ok(match config.organization {
            Some(ref org) => client.with_organization(org),
            None => client,
        })
    }

    /// Restrict server listings to one organization
    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path.trim_start_matches('/'))
    }

    /// Turn non-2xx responses into `ExecError::Api`
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .ok()
            .and_then(|b| b.message)
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("unexpected response")
                    .to_string()
            });
        Err(ExecError::api(status.as_u16(), message))
    }
}

#[async_trait]
impl ServerApi for ScalewayClient {
    async fn get_server(&self, id: &str) -> Result<Server> {
        let url = self.url(&format!("servers/{}", id));
        debug!("GET {}", url);
        let response = Self::check(self.http.get(&url).send().await?).await?;
        let envelope: ServerEnvelope = response.json().await?;
        Ok(envelope.server)
    }

    async fn list_servers(&self) -> Result<Vec<Server>> {
        let url = self.url("servers");
        debug!("GET {}", url);
        let mut request = self.http.get(&url);
        if let Some(ref org) = self.organization {
            request = request.query(&[("organization", org.as_str())]);
        }
        let response = Self::check(request.send().await?).await?;
        let envelope: ServerListEnvelope = response.json().await?;
        Ok(envelope.servers)
    }
}
