//! Downloaders fetch a snippet URL into a temporary [`Artifact`].
//!
//! Each variant knows one class of URL. [`Dispatcher`] keeps them in a fixed
//! priority order - most specific service first, the generic text fetcher
//! last - and picks the first variant whose [`Downloader::matches`] accepts
//! the URL.
//!
//! # Examples
//!
//! ```no_run
//! use snipty::config::Config;
//! use snipty::downloader::Dispatcher;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let dispatcher = Dispatcher::new(&Config::from_env()?)?;
//!     let artifact = dispatcher.fetch("https://gist.github.com/octocat/6cad326836d38bd3a7ae").await?;
//!     println!("Downloaded to {}", artifact.path().display());
//!     Ok(())
//! }
//! ```

mod gist;
mod paste;
mod text;

pub use gist::GistDownloader;
pub use paste::PasteDownloader;
pub use text::{ACCEPTED_CONTENT_TYPES, TextDownloader};

use crate::config::Config;
use crate::error::{Result, SniptyError};
use std::path::{Path, PathBuf};
use tempfile::{TempDir, TempPath};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("could not fetch {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("could not fetch {url} (HTTP {status})")]
    Status { url: String, status: u16 },

    #[error("not a text format ({content_type})")]
    ContentType { url: String, content_type: String },

    #[error("invalid url {0}")]
    InvalidUrl(String),

    #[error("no snippets in this gist ({0})")]
    EmptyGist(String),

    #[error("malformed gist payload: {0}")]
    Malformed(String),

    #[error("failed to store download: {0}")]
    Io(#[from] std::io::Error),
}

/// Fetched content waiting to be moved into the project tree.
///
/// Dropping an artifact removes whatever is still left in the temporary location.
#[derive(Debug)]
pub enum Artifact {
    File(TempPath),
    Dir(TempDir),
}

impl Artifact {
    pub fn path(&self) -> &Path {
        match self {
            Artifact::File(path) => path,
            Artifact::Dir(dir) => dir.path(),
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Artifact::Dir(_))
    }
}

/// Supported downloader variants
#[derive(Debug, Clone)]
pub enum Downloader {
    Gist(GistDownloader),
    Paste(PasteDownloader),
    Text(TextDownloader),
}

impl Downloader {
    pub fn name(&self) -> &'static str {
        match self {
            Downloader::Gist(_) => "gist",
            Downloader::Paste(_) => "paste",
            Downloader::Text(_) => "text",
        }
    }

    /// Whether this variant can handle `url`. Never performs I/O.
    pub fn matches(&self, url: &str) -> bool {
        match self {
            Downloader::Gist(d) => d.matches(url),
            Downloader::Paste(d) => d.matches(url),
            Downloader::Text(d) => d.matches(url),
        }
    }

    pub async fn download(
        &self,
        client: &reqwest::Client,
        tmp_dir: &Path,
        url: &str,
    ) -> std::result::Result<Artifact, DownloadError> {
        tokio::fs::create_dir_all(tmp_dir).await?;
        match self {
            Downloader::Gist(d) => d.download(client, tmp_dir, url).await,
            Downloader::Paste(d) => d.download(client, tmp_dir, url).await,
            Downloader::Text(d) => d.download(client, tmp_dir, url).await,
        }
    }
}

/// Default priority order
pub fn default_downloaders() -> Vec<Downloader> {
    vec![
        Downloader::Gist(GistDownloader::default()),
        Downloader::Paste(PasteDownloader::default()),
        Downloader::Text(TextDownloader),
    ]
}

/// Selects a downloader for a URL and runs it with a shared HTTP client
#[derive(Debug, Clone)]
pub struct Dispatcher {
    client: reqwest::Client,
    tmp_dir: PathBuf,
    downloaders: Vec<Downloader>,
}

impl Dispatcher {
    /// Dispatcher with the default downloader table
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_downloaders(config, default_downloaders())
    }

    /// Dispatcher with a custom downloader table, evaluated in the given order
    pub fn with_downloaders(config: &Config, downloaders: Vec<Downloader>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            tmp_dir: config.tmp_dir.clone(),
            downloaders,
        })
    }

    /// First downloader in priority order that accepts `url`
    pub fn select(&self, url: &str) -> Result<&Downloader> {
        self.downloaders
            .iter()
            .find(|d| d.matches(url))
            .ok_or_else(|| SniptyError::Dispatch(url.to_string()))
    }

    /// Download `url` on behalf of snippet `name`
    pub async fn fetch_snippet(&self, name: &str, url: &str) -> Result<Artifact> {
        let downloader = self.select(url)?;
        tracing::debug!("Fetching {} with the {} downloader", url, downloader.name());

        downloader
            .download(&self.client, &self.tmp_dir, url)
            .await
            .map_err(|source| SniptyError::Download {
                name: name.to_string(),
                source,
            })
    }

    /// Download `url` without a snippet name attached
    pub async fn fetch(&self, url: &str) -> Result<Artifact> {
        self.fetch_snippet(url, url).await
    }
}
