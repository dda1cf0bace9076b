use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type used throughout the library.
pub type Result<T> = std::result::Result<T, StatusError>;

/// Everything that can abort a status call.
///
/// Per-file stat failures inside the tracked comparator are not errors
/// (they are reported as deletions), and hash or open failures inside the
/// hasher degrade to a content mismatch. Everything below is fatal to the
/// whole call.
#[derive(Debug, Error)]
pub enum StatusError {
    /// The given root has no `.git` directory.
    #[error("not a Git repository")]
    NotARepository,

    /// The index file does not start with the `DIRC` signature.
    #[error("invalid index header, missing \"DIRC\"")]
    BadIndexSignature,

    /// The index file header is shorter than 12 bytes.
    #[error("invalid index header, expected 12 bytes but got {0}")]
    TruncatedIndexHeader(usize),

    /// Only version 2 of the index format is supported.
    #[error("unsupported index version: {0}")]
    UnsupportedIndexVersion(u32),

    /// An entry could not be decoded. Names the failing field and the
    /// zero-based entry index.
    #[error("invalid index entry at index {index}: {reason}")]
    BadIndexEntry { index: u32, reason: String },

    /// An index entry's mode has an unrecognized object-type nibble.
    #[error("unknown object type in index entry \"{path}\": mode {mode:o}")]
    UnknownObjectType { path: String, mode: u32 },

    /// The caller's cancellation handle fired.
    #[error("cancelled")]
    Cancelled,

    /// A filesystem call failed on a path other than a tracked file.
    #[error("{}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StatusError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        StatusError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn bad_entry(index: u32, reason: impl Into<String>) -> Self {
        StatusError::BadIndexEntry {
            index,
            reason: reason.into(),
        }
    }
}
