//! Configuration utility functions.

use std::path::{Path, PathBuf};

/// Find config file by searching upward from current directory
///
/// # Example
/// ```text
/// /home/user/paper/figures/     ← cwd
/// /home/user/paper/pspreview.toml ← found!
/// ```
pub fn find_config_file(config_name: &Path) -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_from(&cwd, config_name)
}

/// Search upward from `start` for `config_name`.
///
/// An absolute `config_name` is only checked as-is.
fn find_config_from(start: &Path, config_name: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.is_file().then(|| config_name.to_path_buf());
    }

    let mut current = start;
    loop {
        let candidate = current.join(config_name);
        if candidate.is_file() {
            return Some(candidate);
        }

        match current.parent() {
            Some(parent) => current = parent,
            None => return None, // Reached filesystem root
        }
    }
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_find_in_parent() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("figures").join("chapter1");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("pspreview.toml"), "").unwrap();

        let found = find_config_from(&nested, Path::new("pspreview.toml")).unwrap();
        assert_eq!(found, dir.path().join("pspreview.toml"));
    }

    #[test]
    fn test_nearest_wins() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("figures");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("pspreview.toml"), "").unwrap();
        fs::write(nested.join("pspreview.toml"), "").unwrap();

        let found = find_config_from(&nested, Path::new("pspreview.toml")).unwrap();
        assert_eq!(found, nested.join("pspreview.toml"));
    }

    #[test]
    fn test_absolute_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        assert_eq!(find_config_from(dir.path(), &path), None);

        fs::write(&path, "").unwrap();
        assert_eq!(find_config_from(Path::new("/"), &path), Some(path));
    }

    #[test]
    fn test_directory_is_not_a_config() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("pspreview-dir.toml")).unwrap();
        assert_eq!(
            find_config_from(dir.path(), Path::new("pspreview-dir.toml")),
            None
        );
    }
}
