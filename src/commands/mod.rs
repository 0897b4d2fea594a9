//! Command implementations for the snipty CLI
//!
//! Each command drives the [`PackageManager`](snipty::PackageManager) and
//! returns the process exit status for its outcome:
//!
//! - **install**: install one snippet, or everything missing from disk
//! - **list**: tracked snippets with checksums
//! - **check**: compare snippets with their remote source
//! - **remove**: uninstall, untrack and prune

pub mod check;
pub mod install;
pub mod list;
pub mod remove;

pub use check::check;
pub use install::install;
pub use list::list;
pub use remove::{prune, uninstall, untrack};
