use std::path::{Path, PathBuf};

/// Transcript directory, relative to the project root.
pub const CHAT_DIR: &str = ".machtiani/chat";

/// Ignore-pattern file, relative to the project root.
pub const IGNORE_FILE_NAME: &str = ".machtiani.ignore";

/// Find the git root directory by searching upward from `start`.
pub fn find_git_root(start: &Path) -> Option<PathBuf> {
    let mut path = start;

    loop {
        if path.join(".git").exists() {
            return Some(path.to_path_buf());
        }
        path = path.parent()?;
    }
}

/// Resolve the project root: the enclosing git root, or `start` itself.
pub fn resolve_project_root(start: &Path) -> PathBuf {
    find_git_root(start).unwrap_or_else(|| start.to_path_buf())
}
