//! Location of the local dataset cache

// standard library
use std::ffi::OsString;
use std::path::{Path, PathBuf};

// internal modules
use crate::error::Result;

// external crates
use log::debug;

/// Environment variable to override the default cache location
pub const DATA_DIR_ENV: &str = "NIDATA_DATA";

/// Name of the cache directory created under the home directory
const DEFAULT_DIR_NAME: &str = "nidata_data";

/// Root directory for every cached dataset
///
/// In order of preference:
///
/// - `data_dir` if given
/// - the `NIDATA_DATA` environment variable
/// - `nidata_data` in the user home directory
/// - `nidata_data` in the current working directory
///
/// ```rust
/// # use nidata_datasets::get_data_dir;
/// # use std::path::Path;
/// let root = get_data_dir(Some(Path::new("/tmp/cache")));
/// assert_eq!(root, Path::new("/tmp/cache"));
/// ```
pub fn get_data_dir(data_dir: Option<&Path>) -> PathBuf {
    resolve_data_dir(
        data_dir,
        std::env::var_os(DATA_DIR_ENV),
        std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")),
    )
}

/// Directory for a single dataset under the cache root, created if needed
pub fn get_dataset_dir(name: &str, data_dir: Option<&Path>) -> Result<PathBuf> {
    let path = get_data_dir(data_dir).join(name);
    if !path.is_dir() {
        debug!("Creating dataset directory {}", path.display());
        std::fs::create_dir_all(&path)?;
    }
    Ok(path)
}

fn resolve_data_dir(
    data_dir: Option<&Path>,
    env: Option<OsString>,
    home: Option<OsString>,
) -> PathBuf {
    if let Some(path) = data_dir {
        return path.to_path_buf();
    }

    match (env.filter(|e| !e.is_empty()), home.filter(|h| !h.is_empty())) {
        (Some(env), _) => PathBuf::from(env),
        (None, Some(home)) => PathBuf::from(home).join(DEFAULT_DIR_NAME),
        (None, None) => PathBuf::from(DEFAULT_DIR_NAME),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_wins() {
        let path = resolve_data_dir(
            Some(Path::new("explicit")),
            Some("env".into()),
            Some("home".into()),
        );
        assert_eq!(path, Path::new("explicit"));
    }

    #[test]
    fn environment_before_home() {
        let path = resolve_data_dir(None, Some("env".into()), Some("home".into()));
        assert_eq!(path, Path::new("env"));
    }

    #[test]
    fn home_directory_default() {
        let path = resolve_data_dir(None, Some("".into()), Some("home".into()));
        assert_eq!(path, Path::new("home").join("nidata_data"));
    }

    #[test]
    fn working_directory_last() {
        let path = resolve_data_dir(None, None, None);
        assert_eq!(path, Path::new("nidata_data"));
    }

    #[test]
    fn dataset_dir_is_created() {
        let root = tempfile::tempdir().unwrap();
        let path = get_dataset_dir("fsl", Some(root.path())).unwrap();
        assert!(path.is_dir());
        assert_eq!(path, root.path().join("fsl"));
    }
}
