//! Working-tree traversal
//!
//! Walks the repository root depth-first with lexicographically
//! ascending names, producing repository-relative paths (directories
//! tagged with a trailing separator) plus the absolute location of every
//! `.gitignore` encountered. Anything named `.git` is invisible: files
//! are skipped, directories prune their whole subtree.

use crate::cancel::CancelHandle;
use crate::error::{Result, StatusError};
use std::ffi::OsStr;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};
use walkdir::WalkDir;

/// The outcome of one traversal.
#[derive(Debug, Default)]
pub struct WalkedPaths {
    /// Repository-relative paths in traversal order, host separator,
    /// directories carrying a trailing separator.
    pub paths: Vec<String>,
    /// Absolute paths of every `.gitignore` file seen.
    pub gitignore_paths: Vec<PathBuf>,
}

/// Walk the tree under `root`.
///
/// Per-entry traversal errors (unreadable directories, racing deletes)
/// skip that entry, matching the tolerant behavior of the comparator
/// downstream. Cancellation is checked at every step.
pub fn walk(root: &Path, cancel: &CancelHandle) -> Result<WalkedPaths> {
    let mut walked = WalkedPaths::default();

    let mut iter = WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter();

    while let Some(step) = iter.next() {
        cancel.check()?;

        let entry = match step {
            Ok(entry) => entry,
            Err(_) => continue,
        };

        let is_dir = entry.file_type().is_dir();

        if entry.file_name() == OsStr::new(".git") {
            if is_dir {
                iter.skip_current_dir();
            }
            continue;
        }

        if !is_dir && entry.file_name() == OsStr::new(".gitignore") {
            walked.gitignore_paths.push(entry.path().to_path_buf());
        }

        let rel = entry
            .path()
            .strip_prefix(root)
            .map_err(|_| {
                StatusError::io(
                    entry.path(),
                    std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        "walked path escapes the repository root",
                    ),
                )
            })?
            .to_string_lossy()
            .into_owned();

        if is_dir {
            walked.paths.push(format!("{rel}{MAIN_SEPARATOR}"));
        } else {
            walked.paths.push(rel);
        }
    }

    Ok(walked)
}
