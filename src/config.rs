//! Settings loaded from `.machtiani-config.yml`.
//!
//! The file is looked up in the current directory first, then in the home
//! directory. An explicit `--config` path bypasses the search. The
//! `MODEL_API_KEY` environment variable takes priority over the file value.

use reqwest::header::{HeaderName, HeaderValue};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Error, Result};

/// Name of the settings file in the working directory or home directory.
pub const CONFIG_FILE_NAME: &str = ".machtiani-config.yml";

/// Environment variable that overrides the model API key from the file.
pub const MODEL_API_KEY_ENV: &str = "MODEL_API_KEY";

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    environment: RawEnvironment,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawEnvironment {
    #[serde(rename = "MODEL_API_KEY")]
    model_api_key: Option<String>,
    #[serde(rename = "MACHTIANI_URL")]
    machtiani_url: Option<String>,
    #[serde(rename = "MACHTIANI_REPO_MANAGER_URL")]
    repo_manager_url: Option<String>,
    #[serde(rename = "CODE_HOST_API_KEY")]
    code_host_api_key: Option<String>,
    #[serde(rename = "API_GATEWAY_HOST_KEY")]
    api_gateway_host_key: Option<String>,
    #[serde(rename = "API_GATEWAY_HOST_VALUE")]
    api_gateway_host_value: Option<String>,
    #[serde(rename = "CONTENT_TYPE_KEY")]
    content_type_key: Option<String>,
    #[serde(rename = "CONTENT_TYPE_VALUE")]
    content_type_value: Option<String>,
}

/// A header name/value pair attached to every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderPair {
    pub name: HeaderName,
    pub value: HeaderValue,
}

impl HeaderPair {
    fn parse(setting: &str, name: &str, value: &str) -> Result<Self> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| Error::Config(format!("{} is not a valid header name: {}", setting, e)))?;
        let value = HeaderValue::from_str(value).map_err(|e| {
            Error::Config(format!("{} has an invalid header value: {}", setting, e))
        })?;
        Ok(Self { name, value })
    }
}

/// Validated operator settings.
#[derive(Clone)]
pub struct Settings {
    pub machtiani_url: String,
    pub repo_manager_url: String,
    pub model_api_key: Option<String>,
    pub code_host_api_key: Option<String>,
    pub content_type: HeaderPair,
    pub gateway: Option<HeaderPair>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(value: Option<String>, key: &str) -> Result<String> {
    non_blank(value).ok_or_else(|| Error::Config(format!("{} must be set", key)))
}

impl Settings {
    /// Load settings from disk, applying the environment override.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let (path, content) = read_config_file(explicit_path)?;
        debug!("Loading settings from {}", path.display());

        let env_key = std::env::var(MODEL_API_KEY_ENV).ok();
        Self::from_yaml_with_override(&content, env_key)
    }

    /// Parse and validate settings from YAML text, without environment lookups.
    #[cfg(test)]
    pub fn from_yaml(content: &str) -> Result<Self> {
        Self::from_yaml_with_override(content, None)
    }

    fn from_yaml_with_override(content: &str, model_api_key: Option<String>) -> Result<Self> {
        let file: ConfigFile = serde_yaml::from_str(content)
            .map_err(|e| Error::Config(format!("failed to parse settings: {}", e)))?;
        let env = file.environment;

        let content_type_key = required(env.content_type_key, "CONTENT_TYPE_KEY")?;
        let content_type_value = required(env.content_type_value, "CONTENT_TYPE_VALUE")?;
        let machtiani_url = required(env.machtiani_url, "MACHTIANI_URL")?;
        let repo_manager_url = required(env.repo_manager_url, "MACHTIANI_REPO_MANAGER_URL")?;

        let content_type =
            HeaderPair::parse("CONTENT_TYPE_KEY", &content_type_key, &content_type_value)?;

        // The gateway header is only sent when both halves are configured.
        let gateway = match (
            non_blank(env.api_gateway_host_key),
            non_blank(env.api_gateway_host_value),
        ) {
            (Some(name), Some(value)) => {
                Some(HeaderPair::parse("API_GATEWAY_HOST_KEY", &name, &value)?)
            }
            _ => None,
        };

        Ok(Self {
            machtiani_url,
            repo_manager_url,
            model_api_key: non_blank(model_api_key).or_else(|| non_blank(env.model_api_key)),
            code_host_api_key: non_blank(env.code_host_api_key),
            content_type,
            gateway,
        })
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("Settings")
            .field("machtiani_url", &self.machtiani_url)
            .field("repo_manager_url", &self.repo_manager_url)
            .field("model_api_key", &redact(&self.model_api_key))
            .field("code_host_api_key", &redact(&self.code_host_api_key))
            .field("content_type", &self.content_type)
            .field("gateway", &self.gateway)
            .finish()
    }
}

fn read_config_file(explicit_path: Option<&Path>) -> Result<(PathBuf, String)> {
    if let Some(path) = explicit_path {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        return Ok((path.to_path_buf(), content));
    }

    let local = PathBuf::from(CONFIG_FILE_NAME);
    if let Ok(content) = std::fs::read_to_string(&local) {
        return Ok((local, content));
    }

    let home = dirs::home_dir()
        .ok_or_else(|| Error::Config("could not determine home directory".to_string()))?
        .join(CONFIG_FILE_NAME);
    let content = std::fs::read_to_string(&home).map_err(|e| {
        Error::Config(format!(
            "failed to read {} from the current directory or {}: {}",
            CONFIG_FILE_NAME,
            home.display(),
            e
        ))
    })?;
    Ok((home, content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const MINIMAL: &str = r#"
environment:
  MODEL_API_KEY: ""
  MACHTIANI_URL: "http://localhost:5071"
  MACHTIANI_REPO_MANAGER_URL: "http://localhost:5070"
  CODE_HOST_URL: "http://localhost:8080"
  CODE_HOST_API_KEY: ""
  API_GATEWAY_HOST_KEY: ""
  API_GATEWAY_HOST_VALUE: ""
  CONTENT_TYPE_KEY: "Content-Type"
  CONTENT_TYPE_VALUE: "application/json"
"#;

    #[test]
    fn test_minimal_config_normalizes_blank_optionals() {
        let settings = Settings::from_yaml(MINIMAL).unwrap();

        assert_eq!(settings.machtiani_url, "http://localhost:5071");
        assert_eq!(settings.repo_manager_url, "http://localhost:5070");
        assert_eq!(settings.model_api_key, None);
        assert_eq!(settings.code_host_api_key, None);
        assert!(settings.gateway.is_none());
        assert_eq!(settings.content_type.name.as_str(), "content-type");
        assert_eq!(settings.content_type.value, "application/json");
    }

    #[test]
    fn test_gateway_header_requires_both_halves() {
        let yaml = MINIMAL.replace(
            r#"API_GATEWAY_HOST_KEY: """#,
            r#"API_GATEWAY_HOST_KEY: "X-Gateway-Host""#,
        );
        let settings = Settings::from_yaml(&yaml).unwrap();
        assert!(settings.gateway.is_none());

        let yaml = yaml.replace(
            r#"API_GATEWAY_HOST_VALUE: """#,
            r#"API_GATEWAY_HOST_VALUE: "gateway.example.com""#,
        );
        let settings = Settings::from_yaml(&yaml).unwrap();
        let gateway = settings.gateway.unwrap();
        assert_eq!(gateway.name.as_str(), "x-gateway-host");
        assert_eq!(gateway.value, "gateway.example.com");
    }

    #[test]
    fn test_missing_required_fields_fail() {
        for key in [
            "MACHTIANI_URL",
            "MACHTIANI_REPO_MANAGER_URL",
            "CONTENT_TYPE_KEY",
            "CONTENT_TYPE_VALUE",
        ] {
            let yaml: String = MINIMAL
                .lines()
                .filter(|line| !line.trim_start().starts_with(&format!("{}:", key)))
                .map(|line| format!("{}\n", line))
                .collect();

            let err = Settings::from_yaml(&yaml).unwrap_err();
            assert!(matches!(err, Error::Config(_)));
            assert!(err.to_string().contains(key), "{} not in {}", key, err);
        }
    }

    #[test]
    fn test_blank_required_field_fails() {
        let yaml = MINIMAL.replace(
            r#"MACHTIANI_URL: "http://localhost:5071""#,
            r#"MACHTIANI_URL: "   ""#,
        );
        let err = Settings::from_yaml(&yaml).unwrap_err();
        assert!(err.to_string().contains("MACHTIANI_URL must be set"));
    }

    #[test]
    fn test_invalid_header_name_is_config_error() {
        let yaml = MINIMAL.replace(
            r#"CONTENT_TYPE_KEY: "Content-Type""#,
            r#"CONTENT_TYPE_KEY: "Content Type""#,
        );
        let err = Settings::from_yaml(&yaml).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_environment_key_overrides_file() {
        let yaml = MINIMAL.replace(
            r#"MODEL_API_KEY: """#,
            r#"MODEL_API_KEY: "from-file""#,
        );

        let settings =
            Settings::from_yaml_with_override(&yaml, Some("from-env".to_string())).unwrap();
        assert_eq!(settings.model_api_key.as_deref(), Some("from-env"));

        let settings = Settings::from_yaml_with_override(&yaml, Some(String::new())).unwrap();
        assert_eq!(settings.model_api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn test_load_from_explicit_path() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("settings.yml");
        std::fs::write(&path, MINIMAL).unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.repo_manager_url, "http://localhost:5070");
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let tmp = tempdir().unwrap();
        let err = Settings::load(Some(&tmp.path().join("absent.yml"))).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_debug_redacts_keys() {
        let yaml = MINIMAL
            .replace(r#"MODEL_API_KEY: """#, r#"MODEL_API_KEY: "sk-secret-1""#)
            .replace(r#"CODE_HOST_API_KEY: """#, r#"CODE_HOST_API_KEY: "ghp-secret-2""#);
        let settings = Settings::from_yaml(&yaml).unwrap();

        let debug_str = format!("{:?}", settings);
        assert!(!debug_str.contains("sk-secret-1"));
        assert!(!debug_str.contains("ghp-secret-2"));
        assert!(debug_str.contains("[REDACTED]"));
    }
}
