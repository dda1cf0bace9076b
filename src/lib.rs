//! Working-tree status for Git repositories, computed without Git.
//!
//! The engine reads exactly two things: the binary staged index
//! (`.git/index`, version 2) and the live working tree. It reports
//! every tracked file whose on-disk state differs from the index, and
//! every file on disk that is neither tracked nor excluded by
//! `.gitignore` rules.
//!
//! ```no_run
//! let changed = unstaged::status(std::path::Path::new("."), None)?;
//! for (path, file) in &changed {
//!     println!("{} {} {}", if file.untracked { "??" } else { " M" }, file.what_changed, path);
//! }
//! # Ok::<(), unstaged::StatusError>(())
//! ```

mod cancel;
mod config;
mod error;
mod pathconv;
mod slices;

pub mod index;
pub mod status;
pub mod workspace;

pub use cancel::CancelHandle;
pub use config::DebugOptions;
pub use error::{Result, StatusError};
pub use index::{
    EntryKind, IndexEntry, IndexMap, ObjectId, encode_index, parse_index, parse_index_from_bytes,
};
pub use status::{
    ChangedFile, StatusResult, WhatChanged, blob_object_id, excluding_deleted,
    excluding_directories, including_directories, status, status_raw, status_with_cancel,
};
