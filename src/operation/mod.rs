//! Request orchestration: estimate, confirm, execute, materialize.
//!
//! Every mutating call goes through [`Orchestrator::run`], which walks a
//! single request through
//! `Estimating -> Confirming -> Executing -> Completed`, stopping early
//! with [`OperationOutcome::Aborted`] or [`OperationOutcome::Failed`].
//! Which phases apply depends on the request variant.

mod estimator;
mod executor;
mod gate;
mod materializer;
mod spinner;

pub use gate::{ConfirmationGate, ConsoleGate};
pub use materializer::{Materialized, Materializer, PromptSource};

use serde::Serialize;
use tracing::debug;

use crate::api::{
    AddRepositoryRequest, AddRepositoryResponse, ApiClient, DeleteStoreRequest,
    DeleteStoreResponse, FetchAndCheckoutRequest, GenerateOutcome, GenerateResponseRequest,
    Service, ADD_REPOSITORY, DELETE_STORE, FETCH_AND_CHECKOUT, GENERATE_RESPONSE, VCS_TYPE_GIT,
};
use crate::cli::{MatchStrength, Mode, Model};
use crate::error::{Error, Result};
use executor::Executor;

/// Repository identity and credentials shared by every request variant.
#[derive(Clone)]
pub struct RepositoryTarget {
    codehost_url: String,
    project_name: String,
    code_host_api_key: Option<String>,
    model_api_key: Option<String>,
    ignore_files: Vec<String>,
}

impl RepositoryTarget {
    /// Fails if either the codehost URL or the project name is blank.
    pub fn new(codehost_url: impl Into<String>, project_name: impl Into<String>) -> Result<Self> {
        let codehost_url = codehost_url.into();
        let project_name = project_name.into();

        if codehost_url.trim().is_empty() {
            return Err(Error::Repository("codehost URL is empty".to_string()));
        }
        if project_name.trim().is_empty() {
            return Err(Error::Repository("project name is empty".to_string()));
        }

        Ok(Self {
            codehost_url,
            project_name,
            code_host_api_key: None,
            model_api_key: None,
            ignore_files: Vec::new(),
        })
    }

    pub fn with_credentials(
        mut self,
        code_host_api_key: Option<String>,
        model_api_key: Option<String>,
    ) -> Self {
        self.code_host_api_key = code_host_api_key;
        self.model_api_key = model_api_key;
        self
    }

    pub fn with_ignore_files(mut self, ignore_files: Vec<String>) -> Self {
        self.ignore_files = ignore_files;
        self
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    fn model_api_key(&self) -> String {
        self.model_api_key.clone().unwrap_or_default()
    }
}

impl std::fmt::Debug for RepositoryTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("RepositoryTarget")
            .field("codehost_url", &self.codehost_url)
            .field("project_name", &self.project_name)
            .field("code_host_api_key", &redact(&self.code_host_api_key))
            .field("model_api_key", &redact(&self.model_api_key))
            .field("ignore_files", &self.ignore_files)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct PromptRequest {
    pub prompt: String,
    pub mode: Mode,
    pub model: Model,
    pub match_strength: MatchStrength,
}

/// One remote operation, built per invocation.
#[derive(Debug, Clone)]
pub enum OperationRequest {
    AddRepository(RepositoryTarget),
    SyncBranch {
        target: RepositoryTarget,
        branch_name: String,
    },
    DeleteStore(RepositoryTarget),
    GenerateResponse {
        target: RepositoryTarget,
        prompt: PromptRequest,
    },
}

impl OperationRequest {
    pub fn add_repository(target: RepositoryTarget) -> Self {
        OperationRequest::AddRepository(target)
    }

    pub fn sync_branch(target: RepositoryTarget, branch_name: impl Into<String>) -> Result<Self> {
        let branch_name = branch_name.into();
        if branch_name.trim().is_empty() {
            return Err(Error::Repository("branch name is empty".to_string()));
        }
        Ok(OperationRequest::SyncBranch {
            target,
            branch_name,
        })
    }

    pub fn delete_store(target: RepositoryTarget) -> Self {
        OperationRequest::DeleteStore(target)
    }

    pub fn generate_response(target: RepositoryTarget, prompt: PromptRequest) -> Self {
        OperationRequest::GenerateResponse { target, prompt }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OperationRequest::AddRepository(_) => "add repository",
            OperationRequest::SyncBranch { .. } => "sync branch",
            OperationRequest::DeleteStore(_) => "delete store",
            OperationRequest::GenerateResponse { .. } => "generate response",
        }
    }

    pub fn target(&self) -> &RepositoryTarget {
        match self {
            OperationRequest::AddRepository(target)
            | OperationRequest::SyncBranch { target, .. }
            | OperationRequest::DeleteStore(target)
            | OperationRequest::GenerateResponse { target, .. } => target,
        }
    }

    pub fn service(&self) -> Service {
        match self {
            OperationRequest::GenerateResponse { .. } => Service::Machtiani,
            _ => Service::RepoManager,
        }
    }

    pub fn endpoint(&self) -> &'static str {
        match self {
            OperationRequest::AddRepository(_) => ADD_REPOSITORY,
            OperationRequest::SyncBranch { .. } => FETCH_AND_CHECKOUT,
            OperationRequest::DeleteStore(_) => DELETE_STORE,
            OperationRequest::GenerateResponse { .. } => GENERATE_RESPONSE,
        }
    }

    /// Whether a token-count estimate is fetched before executing.
    pub fn requires_estimate(&self) -> bool {
        matches!(
            self,
            OperationRequest::AddRepository(_) | OperationRequest::SyncBranch { .. }
        )
    }

    pub fn requires_confirmation(&self) -> bool {
        !matches!(self, OperationRequest::GenerateResponse { .. })
    }

    /// JSON body shared by the estimate and the operation itself.
    pub fn body(&self) -> Result<Vec<u8>> {
        match self {
            OperationRequest::AddRepository(target) => self.encode(&AddRepositoryRequest {
                codehost_url: target.codehost_url.clone(),
                project_name: target.project_name.clone(),
                vcs_type: VCS_TYPE_GIT.to_string(),
                api_key: target.code_host_api_key.clone(),
                model_api_key: target.model_api_key(),
                ignore_files: target.ignore_files.clone(),
            }),
            OperationRequest::SyncBranch {
                target,
                branch_name,
            } => self.encode(&FetchAndCheckoutRequest {
                codehost_url: target.codehost_url.clone(),
                project_name: target.project_name.clone(),
                branch_name: branch_name.clone(),
                api_key: target.code_host_api_key.clone(),
                model_api_key: target.model_api_key(),
                ignore_files: target.ignore_files.clone(),
            }),
            OperationRequest::DeleteStore(target) => self.encode(&DeleteStoreRequest {
                project_name: target.project_name.clone(),
                codehost_url: target.codehost_url.clone(),
                ignore_files: target.ignore_files.clone(),
                vcs_type: VCS_TYPE_GIT.to_string(),
                api_key: target.code_host_api_key.clone(),
                openai_api_key: target.model_api_key(),
            }),
            OperationRequest::GenerateResponse { target, prompt } => {
                self.encode(&GenerateResponseRequest {
                    prompt: prompt.prompt.clone(),
                    project: target.project_name.clone(),
                    mode: prompt.mode.as_str().to_string(),
                    model: prompt.model.as_str().to_string(),
                    match_strength: prompt.match_strength.as_str().to_string(),
                    api_key: target.model_api_key(),
                    codehost_api_key: target.code_host_api_key.clone().unwrap_or_default(),
                    codehost_url: target.codehost_url.clone(),
                    ignore_files: target.ignore_files.clone(),
                })
            }
        }
    }

    fn encode<T: Serialize>(&self, body: &T) -> Result<Vec<u8>> {
        serde_json::to_vec(body).map_err(|source| Error::Encode {
            operation: self.name(),
            source,
        })
    }
}

/// Decoded success payload, one shape per request variant.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationResponse {
    RepositoryAdded(AddRepositoryResponse),
    /// fetch-and-checkout answers with a free-form body.
    BranchSynced { body: String },
    StoreDeleted(DeleteStoreResponse),
    Generated(GenerateOutcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    DeclinedByUser,
    DryRun,
}

impl std::fmt::Display for AbortReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AbortReason::DeclinedByUser => write!(f, "Operation aborted by user"),
            AbortReason::DryRun => write!(f, "Dry run: no changes were made"),
        }
    }
}

/// Result of a run. `Aborted` is a normal completion, not an error.
#[derive(Debug)]
pub enum OperationOutcome {
    Aborted { reason: AbortReason },
    Succeeded(OperationResponse),
    Failed(Error),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Skip the confirmation prompt.
    pub force: bool,
    /// Stop once the estimate is shown, before anything is changed.
    pub dry_run: bool,
}

pub struct Orchestrator<'a, G> {
    client: &'a ApiClient,
    gate: G,
    executor: Executor<'a>,
}

impl<'a, G: ConfirmationGate> Orchestrator<'a, G> {
    pub fn new(client: &'a ApiClient, gate: G) -> Self {
        Self {
            client,
            gate,
            executor: Executor::new(client),
        }
    }

    #[cfg(test)]
    fn without_progress(mut self) -> Self {
        self.executor = self.executor.without_progress();
        self
    }

    pub async fn run(&mut self, request: &OperationRequest, options: RunOptions) -> OperationOutcome {
        match self.try_run(request, options).await {
            Ok(outcome) => outcome,
            Err(e) => OperationOutcome::Failed(e),
        }
    }

    async fn try_run(
        &mut self,
        request: &OperationRequest,
        options: RunOptions,
    ) -> Result<OperationOutcome> {
        let body = request.body()?;

        if request.requires_estimate() {
            debug!(phase = "Estimating", "{}", request.name());
            let estimate = estimator::estimate(self.client, request, &body).await?;
            println!("{}", estimate);
        }

        if options.dry_run {
            debug!(phase = "Aborted", "{}: dry run", request.name());
            return Ok(OperationOutcome::Aborted {
                reason: AbortReason::DryRun,
            });
        }

        if request.requires_confirmation() {
            debug!(phase = "Confirming", "{}", request.name());
            if !self.gate.should_proceed(options.force) {
                debug!(phase = "Aborted", "{}: declined", request.name());
                return Ok(OperationOutcome::Aborted {
                    reason: AbortReason::DeclinedByUser,
                });
            }
        }

        debug!(phase = "Executing", "{}", request.name());
        let response = self.executor.execute(request, &body).await?;

        debug!(phase = "Completed", "{}", request.name());
        Ok(OperationOutcome::Succeeded(response))
    }
}
