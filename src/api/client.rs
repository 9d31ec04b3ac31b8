use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error};
use url::Url;
use uuid::Uuid;

use crate::config::{HeaderPair, Settings};
use crate::error::{Error, Result};

/// Timeout for repository management and generation calls.
pub const LONG_RUNNING_TIMEOUT: Duration = Duration::from_secs(20 * 60);

/// Timeout for the lightweight compatibility check.
pub const COMPATIBILITY_TIMEOUT: Duration = Duration::from_secs(20);

/// Default CLI version (from Cargo.toml)
const DEFAULT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Which backend service a call is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    /// Chat and generation service (`MACHTIANI_URL`).
    Machtiani,
    /// Repository manager (`MACHTIANI_REPO_MANAGER_URL`).
    RepoManager,
}

fn build_user_agent() -> String {
    format!("machtiani-cli/{}", DEFAULT_VERSION)
}

/// API client for the Machtiani services.
///
/// Every call is attempted exactly once; a non-success status is returned
/// as [`Error::RemoteStatus`] with the response body attached.
pub struct ApiClient {
    client: Client,
    machtiani_url: String,
    repo_manager_url: String,
    content_type: HeaderPair,
    gateway: Option<HeaderPair>,
    user_agent: String,
    session_id: String,
}

impl ApiClient {
    /// Create a new API client from validated settings.
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            machtiani_url: settings.machtiani_url.clone(),
            repo_manager_url: settings.repo_manager_url.clone(),
            content_type: settings.content_type.clone(),
            gateway: settings.gateway.clone(),
            user_agent: build_user_agent(),
            session_id: Uuid::new_v4().to_string(),
        })
    }

    fn base_url(&self, service: Service) -> &str {
        match service {
            Service::Machtiani => &self.machtiani_url,
            Service::RepoManager => &self.repo_manager_url,
        }
    }

    /// Append `endpoint` to `base_url`, keeping any path prefix on the base.
    pub(crate) fn build_url(base_url: &str, endpoint: &str) -> Result<Url> {
        let joined = format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|e| Error::Config(format!("invalid URL {}: {}", joined, e)))
    }

    fn request(&self, method: Method, url: Url, timeout: Duration) -> reqwest::RequestBuilder {
        let mut request = self
            .client
            .request(method, url)
            .timeout(timeout)
            .header("User-Agent", &self.user_agent)
            .header("x-request-id", Uuid::new_v4().to_string())
            .header("x-request-session-id", &self.session_id);

        if let Some(gateway) = &self.gateway {
            request = request.header(gateway.name.clone(), gateway.value.clone());
        }

        request.header(self.content_type.name.clone(), self.content_type.value.clone())
    }

    /// POST a pre-serialized JSON body and return the successful response.
    pub async fn send_post(
        &self,
        service: Service,
        endpoint: &str,
        body: &[u8],
        timeout: Duration,
    ) -> Result<Response> {
        let url = Self::build_url(self.base_url(service), endpoint)?;

        debug!("=== API Request ===");
        debug!("POST {}", url);
        debug!("Timeout: {:?}", timeout);

        let request = self
            .request(Method::POST, url, timeout)
            .body(body.to_vec());
        Self::send(endpoint, request).await
    }

    /// GET with query parameters and return the successful response.
    pub async fn send_get(
        &self,
        service: Service,
        endpoint: &str,
        query: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<Response> {
        let mut url = Self::build_url(self.base_url(service), endpoint)?;

        debug!("=== API Request ===");
        // Query values may carry API keys, so only the path is logged.
        debug!("GET {}", url);
        debug!("Timeout: {:?}", timeout);

        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }

        let request = self.request(Method::GET, url, timeout);
        Self::send(endpoint, request).await
    }

    async fn send(endpoint: &str, request: reqwest::RequestBuilder) -> Result<Response> {
        let response = request.send().await.map_err(|source| {
            error!("Request to {} failed: {}", endpoint, source);
            Error::Transport {
                endpoint: endpoint.to_string(),
                source,
            }
        })?;

        let status = response.status();
        debug!("=== API Response ===");
        debug!("Status: {}", status);

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("{} failed with status {}: {}", endpoint, status, body);
            return Err(Error::RemoteStatus {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    /// Read a successful response body as text.
    pub async fn read_text(endpoint: &str, response: Response) -> Result<String> {
        response.text().await.map_err(|e| Error::Decode {
            endpoint: endpoint.to_string(),
            reason: format!("failed to read response body: {}", e),
        })
    }

    /// Decode a successful response body into `R`.
    pub async fn decode<R>(endpoint: &str, response: Response) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let text = Self::read_text(endpoint, response).await?;
        serde_json::from_str(&text).map_err(|e| Error::Decode {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("machtiani_url", &self.machtiani_url)
            .field("repo_manager_url", &self.repo_manager_url)
            .field("session_id", &self.session_id)
            .finish()
    }
}
