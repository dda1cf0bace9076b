//! Tracked-entry comparison
//!
//! For every staged entry, stat the corresponding on-disk file and
//! decide what changed. A missing file is a deletion; matching stored
//! timestamps short-circuit everything else; anything past that gate is
//! checked by object type, then by size, then by content hash.
//!
//! The work is split into contiguous slices processed by scoped worker
//! threads writing disjoint partial maps.

use crate::cancel::CancelHandle;
use crate::error::Result;
use crate::index::{EntryKind, IndexEntry, IndexMap};
use crate::pathconv::from_slash;
use crate::slices::spread_across_workers;
use crate::status::hasher;
use crate::status::{ChangedFile, StatusResult, WhatChanged};
use std::fs::Metadata;
use std::path::Path;
use std::time::{Duration, SystemTime};

/// Compare every index entry against the working tree.
///
/// Unchanged entries are omitted from the result. Stat failures are
/// reported as deletions, never propagated; an unrecognized object type
/// aborts the whole call.
pub(crate) fn tracked_paths_changed(
    root: &Path,
    index: &IndexMap,
    workers: usize,
    cancel: &CancelHandle,
) -> Result<StatusResult> {
    let entries: Vec<(&String, &IndexEntry)> = index.iter().collect();
    let slices = spread_across_workers(entries.len(), workers);

    let mut partials: Vec<StatusResult> = Vec::with_capacity(slices.len());
    std::thread::scope(|scope| {
        let handles: Vec<_> = slices
            .iter()
            .map(|slice| {
                let entries = &entries[slice.range()];
                scope.spawn(move || compare_slice(root, entries, cancel))
            })
            .collect();

        for handle in handles {
            partials.push(handle.join().expect("tracked comparator worker panicked")?);
        }

        Ok::<(), crate::error::StatusError>(())
    })?;

    let mut merged = StatusResult::new();
    for partial in partials {
        merged.extend(partial);
    }

    Ok(merged)
}

fn compare_slice(
    root: &Path,
    entries: &[(&String, &IndexEntry)],
    cancel: &CancelHandle,
) -> Result<StatusResult> {
    let mut out = StatusResult::new();

    for (slash_path, entry) in entries {
        cancel.check()?;

        let rel = from_slash(slash_path).into_owned();
        let full_path = root.join(&rel);

        match full_path.symlink_metadata() {
            Err(_) => {
                out.insert(rel, ChangedFile::new(WhatChanged::DELETED, false));
            }
            Ok(metadata) => {
                let what_changed = file_changed(entry, slash_path, &full_path, &metadata)?;
                if !what_changed.is_empty() {
                    out.insert(rel, ChangedFile::new(what_changed, false));
                }
            }
        }
    }

    Ok(out)
}

/// Decide what changed for one stat-able entry.
fn file_changed(
    entry: &IndexEntry,
    slash_path: &str,
    full_path: &Path,
    metadata: &Metadata,
) -> Result<WhatChanged> {
    let mut what_changed = WhatChanged::empty();

    if mtime_unchanged(entry, metadata) && ctime_unchanged(entry, metadata) {
        return Ok(what_changed);
    }

    let file_type = metadata.file_type();
    match entry.kind(slash_path)? {
        EntryKind::Regular => {
            if !file_type.is_file() {
                what_changed |= WhatChanged::TYPE_CHANGED;
            }

            // Windows only stores the permission bits in the index,
            // not on disk.
            #[cfg(unix)]
            {
                use std::os::unix::fs::MetadataExt;
                if (entry.mode & 0o100) != (metadata.mode() & 0o100) {
                    what_changed |= WhatChanged::MODE_CHANGED;
                }
            }
        }
        EntryKind::Symlink => {
            // Symbolic links are stored as regular files on Windows.
            #[cfg(unix)]
            if !file_type.is_symlink() {
                what_changed |= WhatChanged::TYPE_CHANGED;
            }
        }
        EntryKind::Gitlink => {
            if !metadata.is_dir() {
                what_changed |= WhatChanged::TYPE_CHANGED;
            }
            // Sub-repository content is never inspected.
            return Ok(what_changed);
        }
    }

    if entry.size != metadata.len() as u32 {
        what_changed |= WhatChanged::DATA_CHANGED;
    } else if !hasher::matches_with_line_ending_fallback(&entry.oid, full_path, metadata) {
        what_changed |= WhatChanged::DATA_CHANGED;
    }

    Ok(what_changed)
}

fn mtime_unchanged(entry: &IndexEntry, metadata: &Metadata) -> bool {
    let stored = SystemTime::UNIX_EPOCH
        + Duration::new(entry.mtime_secs as u64, entry.mtime_nanos);
    metadata.modified().is_ok_and(|on_disk| on_disk == stored)
}

#[cfg(unix)]
fn ctime_unchanged(entry: &IndexEntry, metadata: &Metadata) -> bool {
    use std::os::unix::fs::MetadataExt;
    metadata.ctime() == entry.ctime_secs as i64
        && metadata.ctime_nsec() == entry.ctime_nanos as i64
}

/// Platforms without second+nanosecond ctime report "unequal" so every
/// downstream check still runs.
#[cfg(not(unix))]
fn ctime_unchanged(_entry: &IndexEntry, _metadata: &Metadata) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{ObjectId, REGULAR_FILE};
    use assert_fs::TempDir;
    use assert_fs::prelude::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn entry_matching_disk(root: &Path, rel: &str, content: &str) -> IndexEntry {
        use std::os::unix::fs::MetadataExt;
        let metadata = root.join(rel).symlink_metadata().unwrap();
        IndexEntry::new(
            metadata.ctime() as u32,
            metadata.ctime_nsec() as u32,
            metadata.mtime() as u32,
            metadata.mtime_nsec() as u32,
            REGULAR_FILE | (metadata.mode() & 0o777),
            metadata.len() as u32,
            hasher::blob_object_id(content.as_bytes()),
        )
    }

    fn stale(entry: IndexEntry) -> IndexEntry {
        IndexEntry {
            ctime_secs: entry.ctime_secs.saturating_sub(1000),
            mtime_secs: entry.mtime_secs.saturating_sub(1000),
            ..entry
        }
    }

    #[rstest]
    fn matching_times_short_circuit_even_with_a_wrong_hash() {
        let dir = TempDir::new().unwrap();
        dir.child("a.txt").write_str("content").unwrap();

        let mut entry = entry_matching_disk(dir.path(), "a.txt", "content");
        entry.oid = ObjectId([0xff; 20]);

        let index = IndexMap::from([("a.txt".to_string(), entry)]);
        let result =
            tracked_paths_changed(dir.path(), &index, 1, &CancelHandle::new()).unwrap();
        assert!(result.is_empty(), "result: {result:?}");
    }

    #[rstest]
    fn stale_times_with_identical_content_report_nothing() {
        let dir = TempDir::new().unwrap();
        dir.child("a.txt").write_str("content").unwrap();

        let entry = stale(entry_matching_disk(dir.path(), "a.txt", "content"));
        let index = IndexMap::from([("a.txt".to_string(), entry)]);
        let result =
            tracked_paths_changed(dir.path(), &index, 1, &CancelHandle::new()).unwrap();
        assert!(result.is_empty(), "result: {result:?}");
    }

    #[rstest]
    fn missing_file_is_a_deletion() {
        let dir = TempDir::new().unwrap();
        dir.child("a.txt").write_str("content").unwrap();
        let entry = entry_matching_disk(dir.path(), "a.txt", "content");
        std::fs::remove_file(dir.path().join("a.txt")).unwrap();

        let index = IndexMap::from([("a.txt".to_string(), entry)]);
        let result =
            tracked_paths_changed(dir.path(), &index, 1, &CancelHandle::new()).unwrap();
        assert_eq!(
            result.get("a.txt"),
            Some(&ChangedFile::new(WhatChanged::DELETED, false))
        );
    }

    #[cfg(unix)]
    #[rstest]
    fn executable_bit_flip_reports_mode_changed() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        dir.child("run.sh").write_str("#!/bin/sh\n").unwrap();

        let entry = stale(entry_matching_disk(dir.path(), "run.sh", "#!/bin/sh\n"));
        std::fs::set_permissions(
            dir.path().join("run.sh"),
            std::fs::Permissions::from_mode(0o755),
        )
        .unwrap();

        let index = IndexMap::from([("run.sh".to_string(), entry)]);
        let result =
            tracked_paths_changed(dir.path(), &index, 1, &CancelHandle::new()).unwrap();
        assert_eq!(
            result.get("run.sh"),
            Some(&ChangedFile::new(WhatChanged::MODE_CHANGED, false))
        );
    }

    #[rstest]
    fn cancelled_comparator_returns_no_partial_result() {
        let dir = TempDir::new().unwrap();
        dir.child("a.txt").write_str("content").unwrap();
        let entry = entry_matching_disk(dir.path(), "a.txt", "content");

        let cancel = CancelHandle::new();
        cancel.cancel();
        let index = IndexMap::from([("a.txt".to_string(), entry)]);
        let err = tracked_paths_changed(dir.path(), &index, 1, &cancel).unwrap_err();
        assert!(matches!(err, crate::error::StatusError::Cancelled));
    }
}
