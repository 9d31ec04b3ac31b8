//! Error taxonomy for configuration, repository context, remote calls and
//! transcript persistence.
//!
//! A declined confirmation is deliberately absent here: it is reported as
//! [`crate::operation::OperationOutcome::Aborted`], not as a failure.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A required setting is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The local repository could not provide a remote URL.
    #[error("repository error: {0}")]
    Repository(String),

    /// The pre-flight token count call failed.
    #[error("error getting token count")]
    Estimation(#[source] Box<Error>),

    /// The request never produced an HTTP response (connect, timeout, ...).
    #[error("error sending request to {endpoint}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to encode {operation} request")]
    Encode {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The server answered with a non-success status.
    #[error("{endpoint}: received status code {status} from the server: {body}")]
    RemoteStatus {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// The success body did not have the expected shape.
    #[error("{endpoint}: failed to decode response: {reason}")]
    Decode { endpoint: String, reason: String },

    /// A success body matched no known shape because a field is absent.
    #[error("{endpoint}: response is missing the `{field}` field")]
    MissingField {
        endpoint: String,
        field: &'static str,
    },

    /// The server reported an error inside a success body.
    #[error("error from API: {0}")]
    Remote(String),

    #[error("{context}")]
    Filesystem {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn filesystem(context: impl Into<String>, source: std::io::Error) -> Self {
        Error::Filesystem {
            context: context.into(),
            source,
        }
    }

    /// Remote status code, if this error came from a non-success response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::RemoteStatus { status, .. } => Some(*status),
            Error::Estimation(inner) => inner.status(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_status_message_keeps_body() {
        let err = Error::RemoteStatus {
            endpoint: "add-repository/".to_string(),
            status: 422,
            body: r#"{"detail":"codehost_url is invalid"}"#.to_string(),
        };

        let message = err.to_string();
        assert!(message.contains("422"));
        assert!(message.contains(r#"{"detail":"codehost_url is invalid"}"#));
    }

    #[test]
    fn test_estimation_exposes_underlying_cause() {
        let err = Error::Estimation(Box::new(Error::RemoteStatus {
            endpoint: "add-repository/token-count".to_string(),
            status: 500,
            body: "boom".to_string(),
        }));

        let chain = format!("{:#}", anyhow::Error::new(err));
        assert!(chain.starts_with("error getting token count: "));
        assert!(chain.contains("boom"));
    }

    #[test]
    fn test_status_unwraps_estimation() {
        let err = Error::Estimation(Box::new(Error::RemoteStatus {
            endpoint: "x".to_string(),
            status: 503,
            body: String::new(),
        }));
        assert_eq!(err.status(), Some(503));
        assert_eq!(Error::Remote("nope".to_string()).status(), None);
    }
}
