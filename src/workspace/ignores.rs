//! Hierarchical ignore rules
//!
//! Each directory that carries a `.gitignore` gets its own compiled
//! matcher, keyed by the directory's repository-relative path (the root
//! is keyed by "."). A path is ignored when the matcher of any ancestor
//! directory matches it, rewritten relative to that ancestor. Compile
//! failures silently leave the offending directory without local rules.

use crate::pathconv::{parent_dir, to_slash};
use ignore::gitignore::Gitignore;
use std::collections::HashMap;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};

pub struct IgnoreSet {
    matchers: HashMap<String, Gitignore>,
}

impl IgnoreSet {
    /// Compile the `.gitignore` files found during the walk.
    ///
    /// `gitignore_paths` are absolute paths under `root`, as produced by
    /// the walker.
    pub fn build(root: &Path, gitignore_paths: &[PathBuf]) -> Self {
        let mut matchers = HashMap::with_capacity(gitignore_paths.len());

        for gitignore_path in gitignore_paths {
            let (matcher, err) = Gitignore::new(gitignore_path);
            if err.is_some() {
                continue;
            }

            let Some(dir) = gitignore_path.parent() else {
                continue;
            };
            let key = match dir.strip_prefix(root) {
                Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
                Ok(rel) => rel.to_string_lossy().into_owned(),
                Err(_) => continue,
            };

            matchers.insert(key, matcher);
        }

        IgnoreSet { matchers }
    }

    /// An ignore set with no rules at all.
    pub fn empty() -> Self {
        IgnoreSet {
            matchers: HashMap::new(),
        }
    }

    /// Is `rel` excluded by the rules of any of its ancestor
    /// directories?
    ///
    /// `rel` is repository-relative in host-separator form; a trailing
    /// separator marks a directory (the lookup starts at its parent, so
    /// a `dir/` rule can ignore the contents without self-matching).
    pub fn is_ignored(&self, rel: &str) -> bool {
        let is_dir = rel.ends_with(MAIN_SEPARATOR);
        let stripped = rel.strip_suffix(MAIN_SEPARATOR).unwrap_or(rel);
        if stripped.is_empty() {
            return false;
        }

        // The trailing separator comes off before taking the parent: a
        // directory is looked up under its own parent, so a `dir/` rule
        // ignores the contents without self-matching.
        let mut dir = parent_dir(stripped);

        loop {
            let rel_to_dir = if dir == "." {
                stripped
            } else {
                &stripped[dir.len() + 1..]
            };

            if let Some(matcher) = self.matchers.get(dir) {
                let candidate = to_slash(rel_to_dir);
                if matcher
                    .matched_path_or_any_parents(candidate.as_ref(), is_dir)
                    .is_ignore()
                {
                    return true;
                }
            }

            if dir == "." {
                return false;
            }

            dir = parent_dir(dir);
        }
    }
}
