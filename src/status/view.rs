//! Display-oriented result conversions
//!
//! Front-ends sometimes want directories that contain changed files to
//! appear as entries themselves (file-manager trees), or deleted paths
//! dropped. These are pure conversions; none of them touch the input.

use crate::pathconv::parent_dir;
use crate::status::{StatusResult, WhatChanged};
use std::path::MAIN_SEPARATOR;

/// Add an entry for every directory containing a changed file,
/// carrying the change record of one of the files beneath it.
pub fn including_directories(changed_files: &StatusResult) -> StatusResult {
    let mut out = changed_files.clone();

    for (path, changed) in changed_files {
        let mut parent = path.as_str();
        while parent.contains(MAIN_SEPARATOR) {
            parent = parent_dir(parent);
            out.insert(parent.to_string(), *changed);
        }
    }

    out
}

/// Undo [`including_directories`]: drop every path that is an ancestor
/// directory of another entry.
pub fn excluding_directories(changed_files: &StatusResult) -> StatusResult {
    let mut out = changed_files.clone();

    let keys: Vec<String> = out.keys().cloned().collect();
    for path in keys {
        if !path.contains(MAIN_SEPARATOR) {
            continue;
        }

        let mut parent = path.as_str();
        while parent.contains(MAIN_SEPARATOR) {
            parent = parent_dir(parent);
            out.remove(parent);
        }
    }

    out
}

/// Drop every record carrying the DELETED bit.
pub fn excluding_deleted(changed_files: &StatusResult) -> StatusResult {
    changed_files
        .iter()
        .filter(|(_, changed)| !changed.what_changed.contains(WhatChanged::DELETED))
        .map(|(path, changed)| (path.clone(), *changed))
        .collect()
}
