//! API client for the Machtiani services.
//!
//! Two services are involved: the repository manager (add, sync, delete,
//! status, token counts) and the chat service (generation, filenames and
//! the compatibility check). All traffic is JSON over HTTP.

mod client;
mod endpoints;
mod types;

pub use client::{ApiClient, Service, LONG_RUNNING_TIMEOUT};
pub use endpoints::{ADD_REPOSITORY, DELETE_STORE, FETCH_AND_CHECKOUT, GENERATE_RESPONSE};
pub use types::{
    AddRepositoryRequest, AddRepositoryResponse, CostEstimate, DeleteStoreRequest,
    DeleteStoreResponse, FetchAndCheckoutRequest, GenerateOutcome, GenerateResponseRequest,
    RawGenerateResponse, StatusResponse, VCS_TYPE_GIT,
};

#[cfg(test)]
pub(crate) use client::tests::settings_for;
