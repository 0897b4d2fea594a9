//! Project tree operations - placing artifacts, checksums and comparisons

use crate::diff::{DiffLine, diff_lines};
use crate::downloader::Artifact;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const PACKAGE_MARKER: &str = "__init__.py";

/// Whether `name` stays inside the project root once joined to it.
///
/// Only plain relative components are allowed: no root, prefix, `.` or `..`.
pub fn is_valid_name(name: &str) -> bool {
    let path = Path::new(name);
    path.components().next().is_some()
        && path
            .components()
            .all(|c| matches!(c, std::path::Component::Normal(_)))
}

/// Create `root/package_dir`, dropping `__init__.py` markers into every
/// directory between the root (exclusive) and `package_dir` (inclusive)
/// when `create_markers` is set.
pub fn prepare_package_dirs(root: &Path, package_dir: &Path, create_markers: bool) -> io::Result<()> {
    fs::create_dir_all(root.join(package_dir))?;

    if !create_markers {
        return Ok(());
    }

    for dir in package_dir.ancestors() {
        if dir.as_os_str().is_empty() {
            continue;
        }
        let marker = root.join(dir).join(PACKAGE_MARKER);
        if !marker.exists() {
            fs::File::create(&marker)?;
        }
    }

    Ok(())
}

/// Move a downloaded artifact to `root/name`, returning the destination
pub fn place_artifact(root: &Path, name: &str, artifact: Artifact) -> io::Result<PathBuf> {
    let destination = root.join(name);
    let create_markers = name.ends_with(".py");

    match artifact {
        Artifact::Dir(dir) => {
            prepare_package_dirs(root, Path::new(name), create_markers)?;
            for entry in fs::read_dir(dir.path())? {
                let entry = entry?;
                move_path(&entry.path(), &destination.join(entry.file_name()))?;
            }
            // `dir` is removed when dropped here
        }
        Artifact::File(path) => {
            let package_dir = Path::new(name).parent().unwrap_or(Path::new(""));
            prepare_package_dirs(root, package_dir, create_markers)?;
            move_path(&path, &destination)?;
        }
    }

    Ok(destination)
}

/// Rename `from` to `to`, copying when a rename is impossible (e.g. across filesystems)
pub fn move_path(from: &Path, to: &Path) -> io::Result<()> {
    if let Err(e) = fs::rename(from, to) {
        tracing::debug!(
            "Rename {} -> {} failed ({}), copying instead",
            from.display(),
            to.display(),
            e
        );
        if from.is_dir() {
            copy_dir(from, to)?;
            fs::remove_dir_all(from)?;
        } else {
            fs::copy(from, to)?;
            fs::remove_file(from)?;
        }
    }
    Ok(())
}

fn copy_dir(from: &Path, to: &Path) -> io::Result<()> {
    for entry in WalkDir::new(from) {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(|e| io::Error::other(e.to_string()))?;
        let target = to.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Remove a file or a directory tree
pub fn remove_path(path: &Path) -> io::Result<()> {
    let metadata = fs::symlink_metadata(path)?;
    if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

/// Regular files under `dir`, sorted by relative path
fn files_in(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() {
            let relative = entry
                .path()
                .strip_prefix(dir)
                .map_err(|e| io::Error::other(e.to_string()))?;
            files.push(relative.to_path_buf());
        }
    }
    Ok(files)
}

fn hash_file(hasher: &mut Sha256, path: &Path) -> io::Result<()> {
    let mut file = fs::File::open(path)?;
    let mut buffer = vec![0; 8192];

    loop {
        let n = file.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(())
}

/// SHA-256 of an installed snippet, or `None` when nothing is on disk.
///
/// A directory hashes the bytes of all of its files in relative-path order.
pub fn checksum(path: &Path) -> io::Result<Option<String>> {
    let mut hasher = Sha256::new();

    if path.is_file() {
        hash_file(&mut hasher, path)?;
    } else if path.is_dir() {
        for relative in files_in(path)? {
            hash_file(&mut hasher, &path.join(relative))?;
        }
    } else {
        return Ok(None);
    }

    Ok(Some(format!("{:x}", hasher.finalize())))
}

/// State of one remote file compared with its installed copy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Unchanged,
    Changed,
    /// Present remotely, missing from the installed directory
    Missing,
}

#[derive(Debug, Clone)]
pub struct FileComparison {
    pub path: PathBuf,
    pub status: FileStatus,
    pub diff: Option<Vec<DiffLine>>,
}

/// Outcome of comparing an installed snippet with a fresh download
#[derive(Debug, Clone)]
pub enum Comparison {
    File {
        changed: bool,
        diff: Option<Vec<DiffLine>>,
    },
    Dir {
        files: Vec<FileComparison>,
    },
    /// One side is a file, the other a directory (or nothing is installed)
    KindMismatch,
}

impl Comparison {
    /// Number of remote files that differ from the installed copy
    pub fn changed_files(&self) -> usize {
        match self {
            Comparison::File { changed, .. } => usize::from(*changed),
            Comparison::Dir { files } => files
                .iter()
                .filter(|f| f.status != FileStatus::Unchanged)
                .count(),
            Comparison::KindMismatch => 1,
        }
    }

    pub fn has_drift(&self) -> bool {
        self.changed_files() > 0
    }
}

fn text_diff(installed: &Path, remote: &Path) -> io::Result<Vec<DiffLine>> {
    let old = fs::read(installed)?;
    let new = fs::read(remote)?;
    Ok(diff_lines(
        &String::from_utf8_lossy(&old),
        &String::from_utf8_lossy(&new),
    ))
}

fn same_contents(a: &Path, b: &Path) -> io::Result<bool> {
    let a_meta = fs::metadata(a)?;
    let b_meta = fs::metadata(b)?;
    if a_meta.len() != b_meta.len() {
        return Ok(false);
    }
    Ok(fs::read(a)? == fs::read(b)?)
}

/// Compare the installed snippet at `installed` with the downloaded copy at `remote`.
///
/// Files only present in the installed directory are ignored.
pub fn compare(installed: &Path, remote: &Path, with_diff: bool) -> io::Result<Comparison> {
    if installed.is_dir() && remote.is_dir() {
        let mut files = Vec::new();
        for relative in files_in(remote)? {
            let local = installed.join(&relative);
            let remote_file = remote.join(&relative);

            let status = if !local.is_file() {
                FileStatus::Missing
            } else if same_contents(&local, &remote_file)? {
                FileStatus::Unchanged
            } else {
                FileStatus::Changed
            };

            let diff = if with_diff && status == FileStatus::Changed {
                Some(text_diff(&local, &remote_file)?)
            } else {
                None
            };

            files.push(FileComparison {
                path: relative,
                status,
                diff,
            });
        }
        return Ok(Comparison::Dir { files });
    }

    if installed.is_file() && remote.is_file() {
        let changed = !same_contents(installed, remote)?;
        let diff = if with_diff && changed {
            Some(text_diff(installed, remote)?)
        } else {
            None
        };
        return Ok(Comparison::File { changed, diff });
    }

    Ok(Comparison::KindMismatch)
}
