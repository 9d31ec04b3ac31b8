//! Request and response types for the Machtiani services.
//!
//! Request bodies mirror the field names the backend expects. Response
//! types are decoded strictly; the generate-response body is first read
//! into [`RawGenerateResponse`] and then validated into one of the shapes
//! of [`GenerateOutcome`].

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};

/// VCS type reported to the repository manager.
pub const VCS_TYPE_GIT: &str = "git";

// ============================================================================
// Repository manager
// ============================================================================

/// add-repository request body
#[derive(Debug, Clone, Serialize)]
pub struct AddRepositoryRequest {
    pub codehost_url: String,
    pub project_name: String,
    pub vcs_type: String,
    pub api_key: Option<String>,
    pub model_api_key: String,
    pub ignore_files: Vec<String>,
}

/// add-repository response
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AddRepositoryResponse {
    pub message: String,
    pub full_path: String,
    pub api_key_provided: bool,
    pub openai_api_key_provided: bool,
}

/// fetch-and-checkout request body
#[derive(Debug, Clone, Serialize)]
pub struct FetchAndCheckoutRequest {
    pub codehost_url: String,
    pub project_name: String,
    pub branch_name: String,
    pub api_key: Option<String>,
    pub model_api_key: String,
    pub ignore_files: Vec<String>,
}

/// delete-store request body
#[derive(Debug, Clone, Serialize)]
pub struct DeleteStoreRequest {
    pub project_name: String,
    pub codehost_url: String,
    pub ignore_files: Vec<String>,
    pub vcs_type: String,
    pub api_key: Option<String>,
    pub openai_api_key: String,
}

/// delete-store response
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DeleteStoreResponse {
    pub message: String,
}

/// Token cost estimate returned by the `<endpoint>token-count` calls.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CostEstimate {
    #[serde(rename = "embedding_tokens")]
    pub embedding_token_count: u64,
    #[serde(rename = "inference_tokens")]
    pub inference_token_count: u64,
}

impl std::fmt::Display for CostEstimate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Estimated embedding tokens: {}", self.embedding_token_count)?;
        write!(f, "Estimated inference tokens: {}", self.inference_token_count)
    }
}

/// status response
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct StatusResponse {
    pub lock_file_present: bool,
    /// Seconds the lock has been held, possibly fractional.
    #[serde(default)]
    pub lock_time_duration: f64,
}

impl StatusResponse {
    /// Lock duration reported by the server.
    ///
    /// Negative or NaN values count as zero; values too large for a
    /// `Duration` saturate.
    pub fn lock_duration(&self) -> Duration {
        if self.lock_time_duration.is_nan() || self.lock_time_duration <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(self.lock_time_duration).unwrap_or(Duration::MAX)
    }

    /// Lock duration formatted as `HH:MM:SS`.
    pub fn lock_duration_hms(&self) -> String {
        let total = self.lock_duration().as_secs();
        format!(
            "{:02}:{:02}:{:02}",
            total / 3600,
            (total / 60) % 60,
            total % 60
        )
    }
}

// ============================================================================
// Machtiani service
// ============================================================================

/// get-head-oid response
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct HeadOidResponse {
    pub head_oid: String,
    pub message: String,
}

/// generate-response request body
#[derive(Debug, Clone, Serialize)]
pub struct GenerateResponseRequest {
    pub prompt: String,
    pub project: String,
    pub mode: String,
    pub model: String,
    pub match_strength: String,
    pub api_key: String,
    pub codehost_api_key: String,
    pub codehost_url: String,
    pub ignore_files: Vec<String>,
}

/// generate-response body as sent by the server, before validation.
#[derive(Debug, Default, Deserialize)]
pub struct RawGenerateResponse {
    #[serde(default)]
    pub machtiani: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub openai_response: Option<String>,
    #[serde(default)]
    pub retrieved_file_paths: Option<Vec<String>>,
}

/// The two shapes a successful generate-response can take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateOutcome {
    /// Short-circuit message from the service (e.g. indexing in progress).
    Informational(String),
    /// A full answer with the file paths it drew on.
    Answer {
        answer: String,
        retrieved_file_paths: Vec<String>,
    },
}

impl GenerateOutcome {
    pub(crate) fn from_raw(endpoint: &str, raw: RawGenerateResponse) -> Result<Self> {
        if let Some(message) = raw.machtiani {
            return Ok(GenerateOutcome::Informational(message));
        }

        if let Some(error) = raw.error {
            return Err(Error::Remote(error));
        }

        let answer = raw.openai_response.ok_or_else(|| Error::MissingField {
            endpoint: endpoint.to_string(),
            field: "openai_response",
        })?;
        let retrieved_file_paths = raw.retrieved_file_paths.ok_or_else(|| Error::MissingField {
            endpoint: endpoint.to_string(),
            field: "retrieved_file_paths",
        })?;

        Ok(GenerateOutcome::Answer {
            answer,
            retrieved_file_paths,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn outcome(value: serde_json::Value) -> Result<GenerateOutcome> {
        let raw: RawGenerateResponse = serde_json::from_value(value).unwrap();
        GenerateOutcome::from_raw("generate-response", raw)
    }

    #[test]
    fn test_cost_estimate_decodes_and_displays() {
        let estimate: CostEstimate =
            serde_json::from_str(r#"{"embedding_tokens": 120, "inference_tokens": 45}"#).unwrap();
        assert_eq!(estimate.embedding_token_count, 120);
        assert_eq!(estimate.inference_token_count, 45);

        let shown = estimate.to_string();
        assert_eq!(
            shown,
            "Estimated embedding tokens: 120\nEstimated inference tokens: 45"
        );
    }

    #[test]
    fn test_cost_estimate_rejects_negative_counts() {
        let result: std::result::Result<CostEstimate, _> =
            serde_json::from_str(r#"{"embedding_tokens": -1, "inference_tokens": 45}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_lock_duration_formatting() {
        let status: StatusResponse =
            serde_json::from_str(r#"{"lock_file_present": true, "lock_time_duration": 3665.0}"#)
                .unwrap();
        assert!(status.lock_file_present);
        assert_eq!(status.lock_duration_hms(), "01:01:05");

        let status = StatusResponse {
            lock_file_present: true,
            lock_time_duration: 59.9,
        };
        assert_eq!(status.lock_duration_hms(), "00:00:59");

        let status = StatusResponse {
            lock_file_present: true,
            lock_time_duration: f64::NAN,
        };
        assert_eq!(status.lock_duration_hms(), "00:00:00");
    }

    #[test]
    fn test_out_of_range_lock_duration_saturates() {
        let status: StatusResponse =
            serde_json::from_str(r#"{"lock_file_present": true, "lock_time_duration": 1e20}"#)
                .unwrap();
        assert_eq!(status.lock_duration(), Duration::MAX);

        let total = u64::MAX;
        assert_eq!(
            status.lock_duration_hms(),
            format!("{:02}:{:02}:{:02}", total / 3600, (total / 60) % 60, total % 60)
        );

        let status = StatusResponse {
            lock_file_present: true,
            lock_time_duration: f64::INFINITY,
        };
        assert_eq!(status.lock_duration(), Duration::MAX);

        let status = StatusResponse {
            lock_file_present: true,
            lock_time_duration: -5.0,
        };
        assert_eq!(status.lock_duration(), Duration::ZERO);
    }

    #[test]
    fn test_informational_shape_wins() {
        let result = outcome(json!({"machtiani": "Indexing in progress"})).unwrap();
        assert_eq!(
            result,
            GenerateOutcome::Informational("Indexing in progress".to_string())
        );
    }

    #[test]
    fn test_answer_shape() {
        let result = outcome(json!({
            "openai_response": "Use a handler.",
            "retrieved_file_paths": ["a.go", "b.go"]
        }))
        .unwrap();

        assert_eq!(
            result,
            GenerateOutcome::Answer {
                answer: "Use a handler.".to_string(),
                retrieved_file_paths: vec!["a.go".to_string(), "b.go".to_string()],
            }
        );
    }

    #[test]
    fn test_missing_answer_is_missing_field() {
        let err = outcome(json!({"retrieved_file_paths": []})).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingField {
                field: "openai_response",
                ..
            }
        ));
    }

    #[test]
    fn test_server_error_field() {
        let err = outcome(json!({"error": "model key rejected"})).unwrap_err();
        assert_eq!(err.to_string(), "error from API: model key rejected");
    }

    #[test]
    fn test_request_serializes_absent_key_as_null() {
        let request = AddRepositoryRequest {
            codehost_url: "https://github.com/o/r".to_string(),
            project_name: "https://github.com/o/r".to_string(),
            vcs_type: VCS_TYPE_GIT.to_string(),
            api_key: None,
            model_api_key: String::new(),
            ignore_files: vec!["*.lock".to_string()],
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["api_key"], serde_json::Value::Null);
        assert_eq!(value["vcs_type"], "git");
        assert_eq!(value["ignore_files"], json!(["*.lock"]));
    }
}
