use crate::error::{PrewarmError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Read a directory path from `var`, falling back to `default`
#[must_use]
pub fn resolve_dir(var: &str, default: &Path) -> PathBuf {
    resolve_dir_with(&|key: &str| std::env::var(key).ok(), var, default)
}

/// Same as [`resolve_dir`] with an explicit variable lookup
pub fn resolve_dir_with<F>(lookup: &F, var: &str, default: &Path) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .filter(|value| !value.is_empty())
        .map_or_else(|| default.to_path_buf(), PathBuf::from)
}

/// Create `path` and any missing parents.
///
/// An existing directory is fine. Anything else that stops the directory from
/// existing (permissions, a regular file in the way) is fatal.
pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|source| PrewarmError::CacheDir {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!("Cache directory ready: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ensure_dir_creates_parents() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a/b/c");

        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn test_ensure_dir_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("cache");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("keep.me"), "data").unwrap();

        ensure_dir(&dir).unwrap();
        ensure_dir(&dir).unwrap();
        assert!(dir.join("keep.me").exists());
    }

    #[test]
    fn test_ensure_dir_file_collision_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("not-a-dir");
        fs::write(&file, "x").unwrap();

        let result = ensure_dir(&file.join("child"));
        assert!(matches!(result, Err(PrewarmError::CacheDir { .. })));
    }

    #[test]
    fn test_resolve_dir_with() {
        let default = Path::new("/default");
        let set = |_: &str| Some("/custom".to_string());
        let empty = |_: &str| Some(String::new());
        let unset = |_: &str| None;

        assert_eq!(resolve_dir_with(&set, "X", default), PathBuf::from("/custom"));
        assert_eq!(resolve_dir_with(&empty, "X", default), PathBuf::from("/default"));
        assert_eq!(resolve_dir_with(&unset, "X", default), PathBuf::from("/default"));
    }
}
