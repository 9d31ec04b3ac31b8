use anyhow::{bail, Context, Result};
use std::path::Path;
use tracing::{debug, warn};

use crate::api::ApiClient;
use crate::cli::Cli;
use crate::config::Settings;
use crate::operation::RepositoryTarget;
use crate::workspace::{read_ignore_file, RepositoryContext};

/// Everything a command needs once startup checks have passed.
pub struct CommandContext {
    pub settings: Settings,
    pub repository: RepositoryContext,
    pub client: ApiClient,
}

impl CommandContext {
    /// Load settings, resolve the repository and verify the server accepts this build.
    ///
    /// The repository is resolved before the first network call, so a
    /// missing remote never reaches the server.
    pub async fn prepare(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to read current directory")?;
        Self::prepare_in(&cwd, cli.config.as_deref(), &cli.remote).await
    }

    async fn prepare_in(dir: &Path, config: Option<&Path>, remote: &str) -> Result<Self> {
        let settings = Settings::load(config).context("Failed to load settings")?;
        debug!("Settings: {:?}", settings);

        let repository = RepositoryContext::resolve(dir, remote)
            .context("Failed to determine the repository remote")?;
        debug!("Repository root: {}", repository.root.display());
        println!(
            "Using remote URL: {} ({})",
            repository.remote_url, repository.remote_name
        );

        let client = ApiClient::new(&settings)?;

        let compatibility = client
            .check_compatibility()
            .await
            .context("Failed to check client compatibility")?;
        if !compatibility.compatible {
            warn!("Client build does not match the server");
            println!(
                "This CLI is no longer compatible with the current environment. Please update to the latest version by following the below instructions\n\n{}",
                compatibility.message
            );
            bail!("incompatible client version");
        }

        Ok(Self {
            settings,
            repository,
            client,
        })
    }

    /// Patterns from the repository's ignore file.
    pub fn ignore_files(&self) -> Result<Vec<String>> {
        Ok(read_ignore_file(&self.repository.ignore_file())?)
    }

    /// Target for the current repository, carrying the configured credentials.
    pub fn target(&self, ignore_files: Vec<String>) -> Result<RepositoryTarget> {
        let target = RepositoryTarget::new(
            self.repository.remote_url.clone(),
            self.repository.project_name(),
        )?
        .with_credentials(
            self.settings.code_host_api_key.clone(),
            self.settings.model_api_key.clone(),
        )
        .with_ignore_files(ignore_files);
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::process::Command;
    use tempfile::{tempdir, TempDir};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn git_available() -> bool {
        Command::new("git")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn git(dir: &Path, args: &[&str]) -> bool {
        Command::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn write_settings(dir: &TempDir, base_url: &str) -> PathBuf {
        let path = dir.path().join(".machtiani-config.yml");
        let yaml = format!(
            "environment:\n  MACHTIANI_URL: \"{base}\"\n  MACHTIANI_REPO_MANAGER_URL: \"{base}\"\n  CONTENT_TYPE_KEY: \"Content-Type\"\n  CONTENT_TYPE_VALUE: \"application/json\"\n",
            base = base_url
        );
        std::fs::write(&path, yaml).unwrap();
        path
    }

    #[tokio::test]
    async fn test_missing_remote_fails_before_any_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/get-head-oid"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let tmp = tempdir().unwrap();
        let config = write_settings(&tmp, &server.uri());
        // Without git the resolver fails too, which is equally pre-network.
        git(tmp.path(), &["init", "-q"]);

        let err = CommandContext::prepare_in(tmp.path(), Some(&config), "origin")
            .await
            .err()
            .expect("prepare should fail without a remote");

        assert!(
            err.to_string()
                .contains("Failed to determine the repository remote"),
            "unexpected error {:#}",
            err
        );
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_incompatible_server_is_rejected_after_resolving_remote() {
        if !git_available() {
            return;
        }

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/get-head-oid"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "head_oid": "0000000000000000000000000000000000000000",
                "message": "Run the installer again."
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tmp = tempdir().unwrap();
        let config = write_settings(&tmp, &server.uri());
        assert!(git(tmp.path(), &["init", "-q"]));
        assert!(git(
            tmp.path(),
            &["remote", "add", "origin", "https://github.com/example/stats.git"]
        ));

        let err = CommandContext::prepare_in(tmp.path(), Some(&config), "origin")
            .await
            .err()
            .expect("prepare should reject a mismatched server");

        assert!(err.to_string().contains("incompatible client version"));
    }
}
