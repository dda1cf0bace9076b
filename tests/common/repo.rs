use assert_fs::TempDir;
use rstest::fixture;
use std::os::unix::fs::MetadataExt;
use std::path::Path;
use unstaged::index::{REGULAR_FILE, SYMBOLIC_LINK};
use unstaged::{IndexEntry, blob_object_id, encode_index};

/// A temporary directory with an empty `.git` directory, so the status
/// call accepts it as a repository.
#[fixture]
pub fn repository_dir() -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    std::fs::create_dir(dir.path().join(".git")).expect("Failed to create .git");
    dir
}

/// Serialize `entries` into `<root>/.git/index`.
pub fn write_index(root: &Path, entries: &[(String, IndexEntry)]) {
    let data = encode_index(entries);
    std::fs::write(root.join(".git").join("index"), &data)
        .unwrap_or_else(|e| panic!("Failed to write index: {}", e));
}

/// Build an entry for `rel` from its current on-disk metadata, so the
/// engine sees it as staged and unchanged.
pub fn staged_entry(root: &Path, rel: &str, content: &str) -> (String, IndexEntry) {
    let metadata = root
        .join(rel)
        .symlink_metadata()
        .unwrap_or_else(|e| panic!("Failed to stat {:?}: {}", rel, e));

    let entry = IndexEntry::new(
        metadata.ctime() as u32,
        metadata.ctime_nsec() as u32,
        metadata.mtime() as u32,
        metadata.mtime_nsec() as u32,
        REGULAR_FILE | (metadata.mode() & 0o777),
        metadata.len() as u32,
        blob_object_id(content.as_bytes()),
    );

    (rel.to_string(), entry)
}

/// Like [`staged_entry`] but with stored timestamps pushed into the
/// past, forcing the comparator past its stat gate.
pub fn stale_entry(root: &Path, rel: &str, content: &str) -> (String, IndexEntry) {
    let (path, entry) = staged_entry(root, rel, content);
    (path, make_stale(entry))
}

pub fn make_stale(entry: IndexEntry) -> IndexEntry {
    IndexEntry {
        ctime_secs: entry.ctime_secs.saturating_sub(5000),
        mtime_secs: entry.mtime_secs.saturating_sub(5000),
        ..entry
    }
}

/// An entry recording a symbolic link to `target`, with timestamps
/// that never match the working tree.
pub fn symlink_entry(rel: &str, target: &str) -> (String, IndexEntry) {
    let entry = IndexEntry::new(
        1,
        0,
        1,
        0,
        SYMBOLIC_LINK,
        target.len() as u32,
        blob_object_id(target.as_bytes()),
    );

    (rel.to_string(), entry)
}
