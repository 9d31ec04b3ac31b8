use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

use crate::error::{Error, Result};

/// Read ignore patterns, one per line.
///
/// Lines are trimmed; blank lines and `#` comments are skipped. A missing
/// file yields an empty list.
pub fn read_ignore_file(path: &Path) -> Result<Vec<String>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No ignore file at {}", path.display());
            return Ok(Vec::new());
        }
        Err(e) => {
            return Err(Error::filesystem(
                format!("failed to read {}", path.display()),
                e,
            ))
        }
    };

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(ToOwned::to_owned)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_empty() {
        let tmp = tempdir().unwrap();
        let patterns = read_ignore_file(&tmp.path().join(".machtiani.ignore")).unwrap();
        assert!(patterns.is_empty());
    }

    #[test]
    fn test_skips_comments_and_blank_lines() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join(".machtiani.ignore");
        std::fs::write(
            &path,
            "# generated files\n\n  go.sum  \nvendor/\n   # indented comment\npoetry.lock\n",
        )
        .unwrap();

        let patterns = read_ignore_file(&path).unwrap();
        assert_eq!(patterns, vec!["go.sum", "vendor/", "poetry.lock"]);
    }

    #[test]
    fn test_directory_is_a_read_error() {
        let tmp = tempdir().unwrap();
        let err = read_ignore_file(tmp.path()).unwrap_err();
        assert!(matches!(err, Error::Filesystem { .. }));
    }
}
