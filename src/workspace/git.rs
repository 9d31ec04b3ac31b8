use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

use crate::cli::{resolve_project_root, CHAT_DIR, IGNORE_FILE_NAME};
use crate::error::{Error, Result};

/// Identity of the repository the CLI is running in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryContext {
    /// Git root (or the working directory outside a checkout).
    pub root: PathBuf,
    pub remote_name: String,
    /// URL of the remote; doubles as the project identity on the backend.
    pub remote_url: String,
}

impl RepositoryContext {
    /// Resolve the URL of `remote_name` for the repository containing `dir`.
    pub fn resolve(dir: &Path, remote_name: &str) -> Result<Self> {
        if remote_name.trim().is_empty() {
            return Err(Error::Repository("remote name cannot be empty".to_string()));
        }

        let output = Command::new("git")
            .args(["remote", "get-url", remote_name])
            .current_dir(dir)
            .output()
            .map_err(|e| Error::Repository(format!("failed to run git: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Repository(format!(
                "failed to get remote URL for {}: {}",
                remote_name,
                stderr.trim()
            )));
        }

        let remote_url = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if remote_url.is_empty() {
            return Err(Error::Repository(format!(
                "remote {} has no URL configured",
                remote_name
            )));
        }

        debug!("Remote {} resolves to {}", remote_name, remote_url);

        Ok(Self {
            root: resolve_project_root(dir),
            remote_name: remote_name.to_string(),
            remote_url,
        })
    }

    /// Project identity sent to the backend.
    pub fn project_name(&self) -> &str {
        &self.remote_url
    }

    /// Directory transcripts are written to.
    pub fn chat_dir(&self) -> PathBuf {
        self.root.join(CHAT_DIR)
    }

    pub fn ignore_file(&self) -> PathBuf {
        self.root.join(IGNORE_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn git_available() -> bool {
        Command::new("git")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn git(dir: &Path, args: &[&str]) {
        let status = Command::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .unwrap()
            .status;
        assert!(status.success(), "git {:?} failed", args);
    }

    #[test]
    fn test_empty_remote_name_fails() {
        let tmp = tempdir().unwrap();
        let err = RepositoryContext::resolve(tmp.path(), "  ").unwrap_err();
        assert!(matches!(err, Error::Repository(_)));
    }

    #[test]
    fn test_missing_remote_fails() {
        let tmp = tempdir().unwrap();
        if !git_available() {
            // Spawning git fails, which is a repository error as well.
            assert!(RepositoryContext::resolve(tmp.path(), "origin").is_err());
            return;
        }

        git(tmp.path(), &["init", "-q"]);
        let err = RepositoryContext::resolve(tmp.path(), "origin").unwrap_err();
        assert!(matches!(err, Error::Repository(_)));
    }

    #[test]
    fn test_resolves_remote_url_and_paths() {
        if !git_available() {
            return;
        }

        let tmp = tempdir().unwrap();
        git(tmp.path(), &["init", "-q"]);
        git(
            tmp.path(),
            &["remote", "add", "upstream", "https://github.com/acme/widgets.git"],
        );

        let nested = tmp.path().join("pkg");
        std::fs::create_dir(&nested).unwrap();

        let context = RepositoryContext::resolve(&nested, "upstream").unwrap();
        assert_eq!(context.remote_url, "https://github.com/acme/widgets.git");
        assert_eq!(context.project_name(), context.remote_url);
        assert_eq!(context.root, tmp.path());
        assert_eq!(context.chat_dir(), tmp.path().join(".machtiani/chat"));
        assert_eq!(context.ignore_file(), tmp.path().join(".machtiani.ignore"));
    }
}
