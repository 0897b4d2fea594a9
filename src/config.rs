//! Runtime configuration - project root, temporary directory and HTTP settings

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the project root
pub const ROOT_PATH_ENV: &str = "SNIPTY_ROOT_PATH";

/// Environment variable overriding where downloaders place temporary artifacts
pub const TMP_DIR_ENV: &str = "SNIPTY_TMP";

/// Manifest file name, relative to the project root
pub const MANIFEST_FILE: &str = "snipty.yml";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory snippet names are resolved against
    pub root: PathBuf,
    /// Directory for downloaded artifacts before they are moved into place
    pub tmp_dir: PathBuf,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Config {
    /// Configuration for an explicit project root
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            tmp_dir: detect_tmp_dir(),
            request_timeout: REQUEST_TIMEOUT,
            user_agent: format!("snipty/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Configuration with the root taken from `SNIPTY_ROOT_PATH` or the current directory
    pub fn from_env() -> std::io::Result<Self> {
        Ok(Self::new(detect_root()?))
    }

    pub fn with_tmp_dir(mut self, tmp_dir: impl Into<PathBuf>) -> Self {
        self.tmp_dir = tmp_dir.into();
        self
    }

    pub fn manifest_path(&self) -> PathBuf {
        manifest_path(&self.root)
    }
}

/// Path of the manifest file under a project root
pub fn manifest_path(root: &Path) -> PathBuf {
    root.join(MANIFEST_FILE)
}

/// Detect the project root
pub fn detect_root() -> std::io::Result<PathBuf> {
    if let Some(root) = std::env::var_os(ROOT_PATH_ENV) {
        return Ok(PathBuf::from(root));
    }
    std::env::current_dir()
}

/// Detect the temporary directory for downloads
pub fn detect_tmp_dir() -> PathBuf {
    std::env::var_os(TMP_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir)
}
