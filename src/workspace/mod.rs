//! Working-tree access: traversal and ignore rules.

mod ignores;
mod walker;

pub use ignores::IgnoreSet;
pub use walker::{WalkedPaths, walk};
