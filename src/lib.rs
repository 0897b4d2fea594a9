//! Library interface for snipty, a minimalistic package manager for snippets
//!
//! Snippets are remote text files (plain URLs, pastes or gists) copied into a
//! project tree and tracked in `snipty.yml` so they can later be checked
//! against their source.

pub mod config;
pub mod diff;
pub mod downloader;
pub mod error;
pub mod manifest;
pub mod package_manager;
pub mod project;
pub mod reporter;

// Re-export commonly used types
pub use config::Config;
pub use downloader::{Artifact, DownloadError, Downloader, Dispatcher};
pub use error::{Result, SniptyError};
pub use manifest::Manifest;
pub use package_manager::{CheckOutcome, CheckReport, CheckSummary, Listing, PackageManager};
pub use reporter::{Level, Reporter};
