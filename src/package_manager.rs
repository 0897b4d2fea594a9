//! Snippet lifecycle - install, list, check, uninstall and untrack.
//!
//! [`PackageManager`] ties together the manifest, the downloader dispatch and
//! the project tree. It loads the manifest lazily, at most once per instance,
//! and every mutating operation runs inside a [`ManifestTransaction`] so the
//! manifest is written back on every exit path, including failures.
//!
//! # Quick Start
//!
//! ```no_run
//! use snipty::{Config, PackageManager, Reporter};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut pm = PackageManager::new(Config::from_env()?, Reporter::default())?;
//!
//!     pm.install(
//!         "lib/retry.py",
//!         "https://gist.github.com/octocat/6cad326836d38bd3a7ae",
//!         false,
//!     )
//!     .await?;
//!
//!     let report = pm.check("lib/retry.py", true).await?;
//!     println!("drifted: {}", report.discrepancies() > 0);
//!     Ok(())
//! }
//! ```
//!
//! # Snippet states
//!
//! A snippet name moves between *untracked*, *tracked but not installed* and
//! *tracked and installed*. `uninstall` removes the files together with the
//! manifest entry; `untrack` forgets the entry and leaves the files alone.

use crate::config::Config;
use crate::downloader::Dispatcher;
use crate::error::{Result, SniptyError};
use crate::manifest::{Manifest, ManifestTransaction};
use crate::project::{self, Comparison, FileStatus};
use crate::reporter::Reporter;
use std::path::{Path, PathBuf};

/// Result of an install operation
#[derive(Debug, Clone)]
pub struct InstallResult {
    pub name: String,
    pub url: String,
    /// Installed file or directory
    pub path: PathBuf,
    /// Whether the snippet was installed as a directory of files
    pub is_dir: bool,
}

/// A tracked snippet present on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledSnippet {
    pub name: String,
    /// SHA-256 of the installed content
    pub checksum: String,
    pub url: String,
}

/// A tracked snippet missing from disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingSnippet {
    pub name: String,
    pub url: String,
}

/// Tracked snippets split by whether they are on disk, each sorted by name
#[derive(Debug, Clone, Default)]
pub struct Listing {
    pub installed: Vec<InstalledSnippet>,
    pub not_installed: Vec<MissingSnippet>,
}

#[derive(Debug, Clone)]
pub enum CheckOutcome {
    /// Name is not in the manifest; nothing was downloaded
    NotTracked,
    /// Tracked, but nothing is installed; nothing was downloaded
    NotOnDisk,
    Compared(Comparison),
    /// The remote could not be fetched (only produced by `check_all`)
    Unverified(String),
}

/// Result of checking one snippet against its remote source
#[derive(Debug, Clone)]
pub struct CheckReport {
    pub name: String,
    pub outcome: CheckOutcome,
}

impl CheckReport {
    /// 1 when the snippet drifted or could not be verified, 0 otherwise
    pub fn discrepancies(&self) -> usize {
        match &self.outcome {
            CheckOutcome::Compared(comparison) => usize::from(comparison.has_drift()),
            CheckOutcome::NotTracked | CheckOutcome::NotOnDisk | CheckOutcome::Unverified(_) => 1,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CheckSummary {
    pub reports: Vec<CheckReport>,
}

impl CheckSummary {
    /// Number of snippets that drifted
    pub fn drifted(&self) -> usize {
        self.reports.iter().map(CheckReport::discrepancies).sum()
    }
}

/// High-level snippet manager for one project root
pub struct PackageManager {
    config: Config,
    dispatcher: Dispatcher,
    reporter: Reporter,
    manifest: Option<Manifest>,
}

impl PackageManager {
    /// Create a manager using the default downloaders
    pub fn new(config: Config, reporter: Reporter) -> Result<Self> {
        let dispatcher = Dispatcher::new(&config)?;
        Ok(Self::with_dispatcher(config, dispatcher, reporter))
    }

    /// Create a manager with a custom downloader table
    pub fn with_dispatcher(config: Config, dispatcher: Dispatcher, reporter: Reporter) -> Self {
        Self {
            config,
            dispatcher,
            reporter,
            manifest: None,
        }
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    /// Install the snippet at `url` as `name`.
    ///
    /// Without `force` this refuses, before touching the network, when `name`
    /// is already tracked, when `url` is already the source of another
    /// snippet, or when the destination exists on disk.
    pub async fn install(&mut self, name: &str, url: &str, force: bool) -> Result<InstallResult> {
        let manifest = cached_manifest(&mut self.manifest, &self.config.root, true)?;
        let ctx = Context::new(&self.config, &self.dispatcher, &self.reporter);

        let mut tx = ManifestTransaction::new(manifest);
        let outcome = ctx.install(&mut tx, name, url, force).await;
        tx.commit(outcome)
    }

    /// Reinstall tracked snippets missing from disk (all of them with `force`).
    ///
    /// Returns the names that were installed.
    pub async fn install_missing(&mut self, force: bool) -> Result<Vec<String>> {
        let manifest = cached_manifest(&mut self.manifest, &self.config.root, false)?;
        let ctx = Context::new(&self.config, &self.dispatcher, &self.reporter);

        let mut tx = ManifestTransaction::new(manifest);
        let outcome = ctx.install_missing(&mut tx, force).await;
        tx.commit(outcome)
    }

    /// Tracked snippets with checksums of what is on disk. No network access.
    pub fn list(&mut self) -> Result<Listing> {
        let root = self.config.root.clone();
        let manifest = cached_manifest(&mut self.manifest, &root, false)?;

        let mut listing = Listing::default();
        for (name, url) in manifest.iter() {
            match project::checksum(&snippet_path(&root, name)?)? {
                Some(checksum) => listing.installed.push(InstalledSnippet {
                    name: name.to_string(),
                    checksum,
                    url: url.to_string(),
                }),
                None => listing.not_installed.push(MissingSnippet {
                    name: name.to_string(),
                    url: url.to_string(),
                }),
            }
        }

        Ok(listing)
    }

    /// Remove a snippet from disk and stop tracking it
    pub fn uninstall(&mut self, name: &str) -> Result<()> {
        let manifest = cached_manifest(&mut self.manifest, &self.config.root, false)?;
        let ctx = Context::new(&self.config, &self.dispatcher, &self.reporter);

        let mut tx = ManifestTransaction::new(manifest);
        let outcome = ctx.uninstall(&mut tx, name);
        tx.commit(outcome)
    }

    /// Stop tracking a snippet, leaving its files in place
    pub fn untrack(&mut self, name: &str) -> Result<()> {
        let manifest = cached_manifest(&mut self.manifest, &self.config.root, false)?;
        let reporter = &self.reporter;

        let mut tx = ManifestTransaction::new(manifest);
        let outcome = match tx.remove(name) {
            Some(_) => {
                reporter.success(format!("Snippet {} has been untracked.", name));
                Ok(())
            }
            None => Err(SniptyError::SnippetNotTracked(name.to_string())),
        };
        tx.commit(outcome)
    }

    /// Drop manifest entries whose target is missing from disk
    pub fn prune(&mut self) -> Result<Vec<String>> {
        let manifest = cached_manifest(&mut self.manifest, &self.config.root, false)?;
        let reporter = &self.reporter;

        let mut tx = ManifestTransaction::new(manifest);
        let pruned = tx.prune_stale();
        for name in &pruned {
            reporter.success(format!("Snippet {} is missing and has been untracked.", name));
        }
        if pruned.is_empty() {
            reporter.info("No stale snippets to untrack!");
        }
        tx.commit(Ok(pruned))
    }

    /// Compare one snippet with a fresh download of its source
    pub async fn check(&mut self, name: &str, print_diff: bool) -> Result<CheckReport> {
        let manifest = cached_manifest(&mut self.manifest, &self.config.root, false)?;
        let ctx = Context::new(&self.config, &self.dispatcher, &self.reporter);
        ctx.check(manifest, name, print_diff).await
    }

    /// Check every tracked snippet.
    ///
    /// A snippet whose source cannot be fetched is reported and counted as
    /// drifted; the remaining snippets are still checked.
    pub async fn check_all(&mut self, print_diff: bool) -> Result<CheckSummary> {
        let manifest = cached_manifest(&mut self.manifest, &self.config.root, false)?;
        let ctx = Context::new(&self.config, &self.dispatcher, &self.reporter);

        let names: Vec<String> = manifest.iter().map(|(name, _)| name.to_string()).collect();
        let mut summary = CheckSummary::default();

        for name in names {
            match ctx.check(manifest, &name, print_diff).await {
                Ok(report) => summary.reports.push(report),
                Err(e @ (SniptyError::Download { .. } | SniptyError::Dispatch(_))) => {
                    ctx.reporter.error(&e);
                    summary.reports.push(CheckReport {
                        name,
                        outcome: CheckOutcome::Unverified(e.to_string()),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        Ok(summary)
    }
}

/// Load the manifest into `slot` on first use
fn cached_manifest<'a>(
    slot: &'a mut Option<Manifest>,
    root: &Path,
    allow_create: bool,
) -> Result<&'a mut Manifest> {
    let manifest = match slot.take() {
        Some(manifest) => manifest,
        None => Manifest::load_or_create(root, allow_create)?,
    };
    Ok(slot.insert(manifest))
}

/// Path of snippet `name` under `root`, refusing names that would leave it
fn snippet_path(root: &Path, name: &str) -> Result<PathBuf> {
    if !project::is_valid_name(name) {
        return Err(SniptyError::InvalidName(name.to_string()));
    }
    Ok(root.join(name))
}

/// Borrowed collaborators for a single operation
struct Context<'a> {
    root: &'a Path,
    dispatcher: &'a Dispatcher,
    reporter: &'a Reporter,
}

impl<'a> Context<'a> {
    fn new(config: &'a Config, dispatcher: &'a Dispatcher, reporter: &'a Reporter) -> Self {
        Self {
            root: &config.root,
            dispatcher,
            reporter,
        }
    }

    async fn install(
        &self,
        manifest: &mut Manifest,
        name: &str,
        url: &str,
        force: bool,
    ) -> Result<InstallResult> {
        let destination = snippet_path(self.root, name)?;

        if !force {
            if manifest.contains(name) {
                return Err(SniptyError::PackageAlreadyInstalled(name.to_string()));
            }
            if manifest.contains_url(url) {
                return Err(SniptyError::DuplicateSource(url.to_string()));
            }
            if destination.exists() {
                return Err(SniptyError::DestinationExists(name.to_string()));
            }
        }

        let artifact = self.dispatcher.fetch_snippet(name, url).await?;
        let is_dir = artifact.is_dir();

        if destination.exists() {
            tracing::debug!("Replacing existing {}", destination.display());
            project::remove_path(&destination)?;
        }

        let path = project::place_artifact(self.root, name, artifact)?;
        manifest.set(name, url);

        self.reporter
            .success(format!("Snippet {} installed from {}", name, url));

        Ok(InstallResult {
            name: name.to_string(),
            url: url.to_string(),
            path,
            is_dir,
        })
    }

    async fn install_missing(&self, manifest: &mut Manifest, force: bool) -> Result<Vec<String>> {
        let mut pending = Vec::new();
        for (name, url) in manifest.iter() {
            if force || !snippet_path(self.root, name)?.exists() {
                pending.push((name.to_string(), url.to_string()));
            }
        }

        let mut installed = Vec::with_capacity(pending.len());
        for (name, url) in pending {
            self.install(manifest, &name, &url, true).await?;
            installed.push(name);
        }

        if installed.is_empty() {
            self.reporter.info("No missing snippets to install!");
        }

        Ok(installed)
    }

    fn uninstall(&self, manifest: &mut Manifest, name: &str) -> Result<()> {
        if !manifest.contains(name) {
            return Err(SniptyError::SnippetNotTracked(name.to_string()));
        }

        let destination = snippet_path(self.root, name)?;
        if !destination.exists() {
            return Err(SniptyError::SnippetNotOnDisk(name.to_string()));
        }

        project::remove_path(&destination)?;
        manifest.remove(name);

        self.reporter
            .success(format!("Snippet {} has been uninstalled.", name));
        Ok(())
    }

    async fn check(&self, manifest: &Manifest, name: &str, print_diff: bool) -> Result<CheckReport> {
        let report = |outcome| CheckReport {
            name: name.to_string(),
            outcome,
        };

        let Some(url) = manifest.get(name) else {
            self.reporter
                .warning(format!("Snippet {} is not installed.", name));
            return Ok(report(CheckOutcome::NotTracked));
        };

        let destination = snippet_path(self.root, name)?;
        if !destination.exists() {
            self.reporter.warning(format!(
                "Snippet {} is tracked but missing from disk.",
                name
            ));
            return Ok(report(CheckOutcome::NotOnDisk));
        }

        let artifact = self.dispatcher.fetch_snippet(name, url).await?;
        let comparison = project::compare(&destination, artifact.path(), print_diff)?;
        self.report_comparison(name, &comparison);

        Ok(report(CheckOutcome::Compared(comparison)))
    }

    fn report_comparison(&self, name: &str, comparison: &Comparison) {
        match comparison {
            Comparison::Dir { files } if comparison.has_drift() => {
                for file in files {
                    let path = file.path.display();
                    match file.status {
                        FileStatus::Unchanged => self
                            .reporter
                            .success(format!("Snippet {} file {} did not change.", name, path)),
                        FileStatus::Changed => self
                            .reporter
                            .failure(format!("Snippet {} file {} has changed.", name, path)),
                        FileStatus::Missing => self
                            .reporter
                            .failure(format!("Snippet {} file {} is not present.", name, path)),
                    }
                    if let Some(diff) = &file.diff {
                        self.reporter.diff(diff);
                    }
                }
            }
            Comparison::File {
                changed: true,
                diff,
            } => {
                self.reporter
                    .warning(format!("Snippet {} has changed.", name));
                if let Some(diff) = diff {
                    self.reporter.diff(diff);
                }
            }
            Comparison::KindMismatch => {
                self.reporter.warning(format!(
                    "Snippet {} has changed between single and multi file.",
                    name
                ));
            }
            _ => {
                self.reporter
                    .success(format!("Snippet {} present and up to date.", name));
            }
        }
    }
}
