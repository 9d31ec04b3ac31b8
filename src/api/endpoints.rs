//! Endpoint paths and the single-shot calls that need no orchestration.

use tracing::debug;

use super::client::{ApiClient, Service, COMPATIBILITY_TIMEOUT, LONG_RUNNING_TIMEOUT};
use super::types::{CostEstimate, HeadOidResponse, StatusResponse};
use crate::error::{Error, Result};

pub const ADD_REPOSITORY: &str = "add-repository/";
pub const FETCH_AND_CHECKOUT: &str = "fetch-and-checkout/";
pub const DELETE_STORE: &str = "delete-store/";
pub const GENERATE_RESPONSE: &str = "generate-response";
pub const GENERATE_FILENAME: &str = "generate-filename";
pub const STATUS: &str = "status";
pub const GET_HEAD_OID: &str = "get-head-oid";

/// Suffix appended to an operation endpoint to reach its estimator.
pub const TOKEN_COUNT_SUFFIX: &str = "token-count";

/// Commit this binary was built from, compared against the server's.
pub const BUILD_HEAD_OID: &str = match option_env!("MACHTIANI_HEAD_OID") {
    Some(oid) => oid,
    None => "none",
};

/// Result of the compatibility check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compatibility {
    pub compatible: bool,
    /// Server-supplied instructions, shown when incompatible.
    pub message: String,
}

impl ApiClient {
    /// Ask the estimator behind `endpoint` how many tokens `body` would cost.
    pub async fn token_count(
        &self,
        service: Service,
        endpoint: &str,
        body: &[u8],
    ) -> Result<CostEstimate> {
        let estimator = format!("{}{}", endpoint, TOKEN_COUNT_SUFFIX);
        let response = self
            .send_post(service, &estimator, body, LONG_RUNNING_TIMEOUT)
            .await?;
        Self::decode(&estimator, response).await
    }

    /// Check whether the repository is locked for processing.
    pub async fn status(
        &self,
        codehost_url: &str,
        code_host_api_key: Option<&str>,
    ) -> Result<StatusResponse> {
        let mut query = vec![("codehost_url", codehost_url)];
        if let Some(key) = code_host_api_key {
            query.push(("api_key", key));
        }

        let response = self
            .send_get(Service::RepoManager, STATUS, &query, LONG_RUNNING_TIMEOUT)
            .await?;
        Self::decode(STATUS, response).await
    }

    /// Ask the service for a transcript name derived from `context`.
    pub async fn generate_filename(&self, context: &str, model_api_key: &str) -> Result<String> {
        let response = self
            .send_get(
                Service::Machtiani,
                GENERATE_FILENAME,
                &[("context", context), ("api_key", model_api_key)],
                LONG_RUNNING_TIMEOUT,
            )
            .await?;
        let filename: String = Self::decode(GENERATE_FILENAME, response).await?;
        debug!("Service suggested filename {:?}", filename);
        Ok(filename)
    }

    /// Compare the server's head commit with the one this binary was built from.
    pub async fn check_compatibility(&self) -> Result<Compatibility> {
        self.check_compatibility_with(BUILD_HEAD_OID).await
    }

    pub(crate) async fn check_compatibility_with(&self, head_oid: &str) -> Result<Compatibility> {
        let response = self
            .send_get(Service::Machtiani, GET_HEAD_OID, &[], COMPATIBILITY_TIMEOUT)
            .await?;
        let body: HeadOidResponse = Self::decode(GET_HEAD_OID, response).await?;

        debug!(
            "Server head {} / client head {}",
            body.head_oid, head_oid
        );

        if body.head_oid.is_empty() {
            return Err(Error::MissingField {
                endpoint: GET_HEAD_OID.to_string(),
                field: "head_oid",
            });
        }

        Ok(Compatibility {
            compatible: body.head_oid == head_oid,
            message: body.message,
        })
    }
}
