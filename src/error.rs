use crate::downloader::DownloadError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SniptyError {
    #[error("Snipty was not used before in this project root path: {}", .0.display())]
    ConfigNotExists(PathBuf),

    #[error("Snippet {name} cannot be downloaded - {source}")]
    Download {
        name: String,
        #[source]
        source: DownloadError,
    },

    #[error("Snippet '{0}' has been already installed")]
    PackageAlreadyInstalled(String),

    #[error("Snippet from this url {0} was already installed")]
    DuplicateSource(String),

    #[error(
        "Cannot install snippet '{0}' because destination location already exists (use --force to override)"
    )]
    DestinationExists(String),

    #[error("Snippet name '{0}' must be a relative path inside the project root")]
    InvalidName(String),

    #[error("Snippet {0} does not exist")]
    SnippetNotTracked(String),

    #[error("Snippet {0} is not installed. You can still untrack it")]
    SnippetNotOnDisk(String),

    #[error("Cannot find downloader for provided url {0}")]
    Dispatch(String),

    #[error("Failed to parse manifest {}: {source}", path.display())]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to serialize manifest: {0}")]
    ManifestSerialize(#[source] serde_yaml::Error),

    #[error("Failed to create HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SniptyError {
    /// Process exit status for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::PackageAlreadyInstalled(_)
            | Self::DuplicateSource(_)
            | Self::DestinationExists(_) => 3,
            Self::Dispatch(_) => 4,
            Self::ManifestParse { .. } => 5,
            Self::Download { .. } => 6,
            Self::ConfigNotExists(_)
            | Self::InvalidName(_)
            | Self::SnippetNotTracked(_)
            | Self::SnippetNotOnDisk(_)
            | Self::ManifestSerialize(_)
            | Self::HttpClient(_)
            | Self::Io(_) => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, SniptyError>;
