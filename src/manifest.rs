//! The snippet manifest - `snipty.yml` at the project root.
//!
//! The manifest maps each snippet name (a path relative to the project root)
//! to the URL it was installed from:
//!
//! ```yaml
//! lib/retry.py: https://gist.github.com/octocat/6cad326836d38bd3a7ae
//! scripts/bootstrap.sh: https://example.com/bootstrap.sh
//! ```
//!
//! Keys are kept sorted so the file diffs cleanly under version control. An
//! empty manifest is written as `{}` rather than removed.
//!
//! Entries whose target is missing from disk are *stale*. They stay tracked
//! (so `install` can restore them) until [`Manifest::prune_stale`] drops them.

use crate::config::manifest_path;
use crate::error::{Result, SniptyError};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Manifest {
    root: PathBuf,
    path: PathBuf,
    entries: BTreeMap<String, String>,
    /// Changed since the last load or persist
    dirty: bool,
}

impl Manifest {
    /// Load the manifest under `root`, creating an empty one if allowed
    pub fn load_or_create(root: &Path, allow_create: bool) -> Result<Self> {
        let path = manifest_path(root);

        if !path.exists() {
            if !allow_create {
                return Err(SniptyError::ConfigNotExists(root.to_path_buf()));
            }
            let mut empty = Self {
                root: root.to_path_buf(),
                path: path.clone(),
                entries: BTreeMap::new(),
                dirty: false,
            };
            empty.persist()?;
            tracing::debug!("Created empty manifest at {}", path.display());
        }

        let contents = fs::read_to_string(&path)?;
        let entries = parse(&contents).map_err(|source| SniptyError::ManifestParse {
            path: path.clone(),
            source,
        })?;

        let manifest = Self {
            root: root.to_path_buf(),
            path,
            entries,
            dirty: false,
        };

        for name in manifest.stale_entries() {
            tracing::debug!("Snippet {} is tracked but missing from disk", name);
        }

        Ok(manifest)
    }

    /// Write the manifest back to disk (temp file + rename)
    pub fn persist(&mut self) -> Result<()> {
        let yaml = serde_yaml::to_string(&self.entries).map_err(SniptyError::ManifestSerialize)?;

        let temp_path = self.path.with_extension("yml.tmp");
        {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(yaml.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, &self.path)?;
        self.dirty = false;

        tracing::debug!(
            "Stored {} manifest entries in {}",
            self.entries.len(),
            self.path.display()
        );
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Whether any snippet was installed from `url`
    pub fn contains_url(&self, url: &str) -> bool {
        self.entries.values().any(|u| u == url)
    }

    pub fn set(&mut self, name: impl Into<String>, url: impl Into<String>) {
        self.entries.insert(name.into(), url.into());
        self.dirty = true;
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let removed = self.entries.remove(name);
        if removed.is_some() {
            self.dirty = true;
        }
        removed
    }

    /// Entries in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, u)| (n.as_str(), u.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether there are changes not yet written by [`persist`](Manifest::persist)
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Names whose target is missing from disk
    pub fn stale_entries(&self) -> Vec<String> {
        self.entries
            .keys()
            .filter(|name| !self.root.join(name.as_str()).exists())
            .cloned()
            .collect()
    }

    /// Drop stale entries, returning their names
    pub fn prune_stale(&mut self) -> Vec<String> {
        let stale = self.stale_entries();
        for name in &stale {
            self.remove(name);
        }
        stale
    }
}

fn parse(contents: &str) -> std::result::Result<BTreeMap<String, String>, serde_yaml::Error> {
    if contents.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    // `null` / `~` documents load as an empty manifest
    let entries: Option<BTreeMap<String, String>> = serde_yaml::from_str(contents)?;
    Ok(entries.unwrap_or_default())
}

/// Scoped manifest persistence for a mutating command.
///
/// [`commit`](ManifestTransaction::commit) persists pending changes and
/// reports the outcome. If the transaction is dropped without a commit - an
/// early return or a panic unwinding through the command - pending changes are
/// still persisted and a failure is logged. A manifest without changes is left
/// alone.
pub struct ManifestTransaction<'a> {
    manifest: &'a mut Manifest,
    committed: bool,
}

impl<'a> ManifestTransaction<'a> {
    pub fn new(manifest: &'a mut Manifest) -> Self {
        Self {
            manifest,
            committed: false,
        }
    }

    /// Persist pending changes, combining the failure with the command's outcome.
    ///
    /// The command's own error wins over a persistence error.
    pub fn commit<T>(mut self, outcome: Result<T>) -> Result<T> {
        self.committed = true;
        let persisted = self.persist_changes();
        match (outcome, persisted) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(persist_err)) => {
                tracing::error!("Failed to store manifest: {}", persist_err);
                Err(e)
            }
        }
    }
}

impl ManifestTransaction<'_> {
    fn persist_changes(&mut self) -> Result<()> {
        if !self.manifest.is_dirty() {
            return Ok(());
        }
        self.manifest.persist()
    }
}

impl std::ops::Deref for ManifestTransaction<'_> {
    type Target = Manifest;

    fn deref(&self) -> &Manifest {
        self.manifest
    }
}

impl std::ops::DerefMut for ManifestTransaction<'_> {
    fn deref_mut(&mut self) -> &mut Manifest {
        self.manifest
    }
}

impl Drop for ManifestTransaction<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Err(e) = self.persist_changes() {
            tracing::error!("Failed to store manifest: {}", e);
        }
    }
}
