use tracing::debug;

use super::OperationRequest;
use crate::api::{ApiClient, CostEstimate};
use crate::error::{Error, Result};

/// Ask the service what `request` would cost before committing to it.
///
/// Any failure is wrapped in [`Error::Estimation`] so that callers abort
/// before confirmation, with the underlying cause kept as the source.
pub async fn estimate(
    client: &ApiClient,
    request: &OperationRequest,
    body: &[u8],
) -> Result<CostEstimate> {
    debug!("Estimating token cost for {}", request.name());

    let estimate = client
        .token_count(request.service(), request.endpoint(), body)
        .await
        .map_err(|e| Error::Estimation(Box::new(e)))?;

    debug!(
        embedding = estimate.embedding_token_count,
        inference = estimate.inference_token_count,
        "Token estimate received"
    );
    Ok(estimate)
}
