//! Change detection
//!
//! The orchestrator composes the pipeline: walk the tree and parse the
//! index concurrently, then run the untracked classifier and the
//! tracked comparator side by side, and merge their disjoint result
//! maps.
//!
//! ## Detection Strategy
//!
//! 1. Stored timestamps first: an entry whose ctime and mtime both
//!    match on-disk metadata is clean, content unseen.
//! 2. Past that gate, check object type and permissions, then size,
//!    then blob hash.
//!
//! This mirrors Git's own stat-first approach: almost every unchanged
//! file is dismissed without opening it.

mod hasher;
mod tracked;
mod untracked;
mod view;

pub use hasher::blob_object_id;
pub use view::{excluding_deleted, excluding_directories, including_directories};

use crate::cancel::CancelHandle;
use crate::config::DebugOptions;
use crate::error::{Result, StatusError};
use crate::index::{self, IndexMap};
use crate::workspace;
use bitflags::bitflags;
use derive_new::new;
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::Path;
use std::str::FromStr;
use std::time::Instant;

bitflags! {
    /// What differs between an index entry and the working tree.
    ///
    /// The values follow Git's `statinfo.h`. OWNER and INODE are
    /// defined for completeness; this engine never sets them.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct WhatChanged: u8 {
        const MTIME_CHANGED = 0x01;
        const CTIME_CHANGED = 0x02;
        const OWNER_CHANGED = 0x04;
        const MODE_CHANGED = 0x08;
        const INODE_CHANGED = 0x10;
        const DATA_CHANGED = 0x20;
        const TYPE_CHANGED = 0x40;
        const DELETED = 0x80;
    }
}

const WHAT_CHANGED_TOKENS: [(WhatChanged, &str); 8] = [
    (WhatChanged::MTIME_CHANGED, "MTIME_CHANGED"),
    (WhatChanged::CTIME_CHANGED, "CTIME_CHANGED"),
    (WhatChanged::OWNER_CHANGED, "OWNER_CHANGED"),
    (WhatChanged::MODE_CHANGED, "MODE_CHANGED"),
    (WhatChanged::INODE_CHANGED, "INODE_CHANGED"),
    (WhatChanged::DATA_CHANGED, "DATA_CHANGED"),
    (WhatChanged::TYPE_CHANGED, "TYPE_CHANGED"),
    (WhatChanged::DELETED, "DELETED"),
];

impl fmt::Display for WhatChanged {
    /// Comma-joined ASCII tokens, e.g. `TYPE_CHANGED,DATA_CHANGED`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (flag, token) in WHAT_CHANGED_TOKENS {
            if self.contains(flag) {
                if !first {
                    write!(f, ",")?;
                }
                write!(f, "{token}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl FromStr for WhatChanged {
    type Err = std::convert::Infallible;

    /// Order-insensitive; unrecognized tokens contribute nothing.
    fn from_str(text: &str) -> std::result::Result<Self, Self::Err> {
        let mut flags = WhatChanged::empty();
        for part in text.split(',') {
            if let Some((flag, _)) = WHAT_CHANGED_TOKENS
                .iter()
                .find(|(_, token)| *token == part)
            {
                flags |= *flag;
            }
        }
        Ok(flags)
    }
}

/// One changed path: either untracked (empty flag set) or tracked with
/// at least one bit describing the difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, new)]
pub struct ChangedFile {
    pub what_changed: WhatChanged,
    pub untracked: bool,
}

/// The outcome of a status call: repository-relative path in
/// host-separator form, mapped to its change record. No ordering.
pub type StatusResult = HashMap<String, ChangedFile>;

/// Working-tree status of the repository at `root`.
///
/// `workers` defaults to the logical processor count; pass `Some(1)`
/// for deterministic single-threaded runs.
pub fn status(root: &Path, workers: Option<usize>) -> Result<StatusResult> {
    status_with_cancel(&CancelHandle::new(), root, workers)
}

/// [`status`], honoring a cancellation handle.
pub fn status_with_cancel(
    cancel: &CancelHandle,
    root: &Path,
    workers: Option<usize>,
) -> Result<StatusResult> {
    let dot_git = root.join(".git");
    match std::fs::metadata(&dot_git) {
        Ok(metadata) if metadata.is_dir() => {}
        _ => return Err(StatusError::NotARepository),
    }

    status_raw(
        cancel,
        root,
        &dot_git.join("index"),
        true,
        workers,
        &DebugOptions::default(),
    )
}

/// Status against an explicit index file, without checking that `root`
/// is a Git repository. A missing index file means everything on disk
/// is untracked.
pub fn status_raw(
    cancel: &CancelHandle,
    root: &Path,
    index_path: &Path,
    respect_git_ignore: bool,
    workers: Option<usize>,
    debug: &DebugOptions,
) -> Result<StatusResult> {
    let workers = workers
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
        .max(1);

    match std::fs::metadata(root) {
        Ok(metadata) if metadata.is_dir() => {}
        _ => {
            return Err(StatusError::io(
                root,
                io::Error::new(io::ErrorKind::NotFound, "path does not exist"),
            ));
        }
    }

    std::thread::scope(|scope| {
        let debug = *debug;
        let walker = scope.spawn(move || {
            let walk_start = Instant::now();
            let walked = workspace::walk(root, cancel);
            if debug.profile_timings {
                eprintln!("walking time: {:?}", walk_start.elapsed());
            }
            walked
        });

        // A repository without an index stages nothing: every file on
        // disk is untracked.
        if std::fs::metadata(index_path).is_err() {
            let walked = walker.join().expect("tree walker panicked")?;
            return Ok(untracked::untracked_paths_not_ignored(
                &walked.paths,
                &walked.gitignore_paths,
                root,
                &IndexMap::new(),
                respect_git_ignore,
                workers,
                &debug,
            ));
        }

        let parse_start = Instant::now();
        let entries = index::parse_index(index_path, cancel)?;
        if debug.profile_timings {
            eprintln!("index parse time: {:?}", parse_start.elapsed());
        }

        let entries = &entries;
        std::thread::scope(|inner| {
            let untracked_results = inner.spawn(move || {
                let walked = walker.join().expect("tree walker panicked")?;
                Ok::<StatusResult, StatusError>(untracked::untracked_paths_not_ignored(
                    &walked.paths,
                    &walked.gitignore_paths,
                    root,
                    entries,
                    respect_git_ignore,
                    workers,
                    &debug,
                ))
            });

            let tracked_start = Instant::now();
            let mut out = tracked::tracked_paths_changed(root, entries, workers, cancel)?;
            if debug.profile_timings {
                eprintln!("tracked comparator time: {:?}", tracked_start.elapsed());
            }

            let untracked_results = untracked_results
                .join()
                .expect("untracked classifier panicked")?;
            out.extend(untracked_results);

            Ok(out)
        })
    })
}
