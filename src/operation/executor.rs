use std::io::Write;
use tracing::{debug, error};

use super::spinner::Spinner;
use super::{OperationRequest, OperationResponse};
use crate::api::{ApiClient, GenerateOutcome, RawGenerateResponse, LONG_RUNNING_TIMEOUT};
use crate::error::Result;

/// Opens the sink the spinner draws on, once per request.
type ProgressWriter = Box<dyn Fn() -> Box<dyn Write + Send> + Send + Sync>;

/// Performs the remote call for an authorized request.
pub struct Executor<'a> {
    client: &'a ApiClient,
    progress: Option<ProgressWriter>,
}

impl<'a> Executor<'a> {
    /// Executor drawing its spinner on stdout.
    pub fn new(client: &'a ApiClient) -> Self {
        Self::with_progress(client, std::io::stdout)
    }

    pub fn with_progress<F, W>(client: &'a ApiClient, make_writer: F) -> Self
    where
        F: Fn() -> W + Send + Sync + 'static,
        W: Write + Send + 'static,
    {
        let progress: ProgressWriter =
            Box::new(move || -> Box<dyn Write + Send> { Box::new(make_writer()) });
        Self {
            client,
            progress: Some(progress),
        }
    }

    #[cfg(test)]
    pub fn without_progress(mut self) -> Self {
        self.progress = None;
        self
    }

    /// Send `body` to the request's endpoint and decode the matching response.
    ///
    /// The spinner runs only while the request is outstanding: it is stopped
    /// as soon as the outcome is known, before the body is decoded.
    pub async fn execute(
        &self,
        request: &OperationRequest,
        body: &[u8],
    ) -> Result<OperationResponse> {
        let endpoint = request.endpoint();
        debug!("Executing {} via {}", request.name(), endpoint);

        let spinner = self
            .progress
            .as_ref()
            .map(|make_writer| Spinner::start_with(make_writer()));
        let sent = self
            .client
            .send_post(request.service(), endpoint, body, LONG_RUNNING_TIMEOUT)
            .await;
        if let Some(spinner) = spinner {
            spinner.stop().await;
        }

        let response = sent.map_err(|e| {
            error!(status = ?e.status(), "{} failed: {}", request.name(), e);
            e
        })?;

        let decoded = match request {
            OperationRequest::AddRepository(_) => {
                OperationResponse::RepositoryAdded(ApiClient::decode(endpoint, response).await?)
            }
            OperationRequest::SyncBranch { .. } => OperationResponse::BranchSynced {
                body: ApiClient::read_text(endpoint, response).await?,
            },
            OperationRequest::DeleteStore(_) => {
                OperationResponse::StoreDeleted(ApiClient::decode(endpoint, response).await?)
            }
            OperationRequest::GenerateResponse { .. } => {
                let raw: RawGenerateResponse = ApiClient::decode(endpoint, response).await?;
                OperationResponse::Generated(GenerateOutcome::from_raw(endpoint, raw)?)
            }
        };

        Ok(decoded)
    }
}
