//! Untracked-path classification
//!
//! Takes the walked path list and keeps every file that is neither in
//! the index nor ignored. Directories are never reported. Workers own
//! contiguous slices of the list; an ignored directory lets a worker
//! jump past the whole subtree, leaning on the deterministic traversal
//! order. The jump is purely an optimization: the oracle's ancestor
//! walk already excludes everything underneath, so disabling it must
//! not change the result.

use crate::config::DebugOptions;
use crate::index::IndexMap;
use crate::pathconv::{parent_dir, to_slash};
use crate::slices::spread_across_workers;
use crate::status::{ChangedFile, StatusResult, WhatChanged};
use crate::workspace::IgnoreSet;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};
use std::time::Instant;

/// Classify walked paths into untracked, not-ignored files.
pub(crate) fn untracked_paths_not_ignored(
    paths: &[String],
    gitignore_paths: &[PathBuf],
    root: &Path,
    index: &IndexMap,
    respect_git_ignore: bool,
    workers: usize,
    debug: &DebugOptions,
) -> StatusResult {
    let compile_start = Instant::now();
    let ignores = if respect_git_ignore {
        IgnoreSet::build(root, gitignore_paths)
    } else {
        IgnoreSet::empty()
    };
    if debug.profile_timings {
        eprintln!("gitignore compile time: {:?}", compile_start.elapsed());
    }

    let worker_start = Instant::now();
    let slices = spread_across_workers(paths.len(), workers);

    let mut partials: Vec<StatusResult> = Vec::with_capacity(slices.len());
    std::thread::scope(|scope| {
        let handles: Vec<_> = slices
            .iter()
            .enumerate()
            .map(|(worker_index, slice)| {
                let slice_paths = &paths[slice.range()];
                if debug.log_slicing {
                    eprintln!("worker {worker_index} slice: {slice_paths:?}");
                }
                let ignores = &ignores;
                scope.spawn(move || {
                    classify_slice(slice_paths, ignores, index, respect_git_ignore, debug)
                })
            })
            .collect();

        for handle in handles {
            partials.push(handle.join().expect("untracked classifier worker panicked"));
        }
    });
    if debug.profile_timings {
        eprintln!("untracked worker time: {:?}", worker_start.elapsed());
    }

    let merge_start = Instant::now();
    let mut merged = StatusResult::new();
    for partial in partials {
        merged.extend(partial);
    }
    if debug.profile_timings {
        eprintln!("untracked merge time: {:?}", merge_start.elapsed());
    }

    merged
}

fn classify_slice(
    paths: &[String],
    ignores: &IgnoreSet,
    index: &IndexMap,
    respect_git_ignore: bool,
    debug: &DebugOptions,
) -> StatusResult {
    let mut out = StatusResult::new();

    let mut i = 0;
    while i < paths.len() {
        let rel = &paths[i];

        let tracked = index.contains_key(to_slash(rel).as_ref());
        if !tracked {
            // The walker added this separator itself, so the check is
            // portable.
            let is_dir = rel.ends_with(MAIN_SEPARATOR);

            if respect_git_ignore && ignores.is_ignored(rel) {
                if debug.log_ignored {
                    eprintln!("ignored: {rel}");
                }

                if is_dir && !debug.disable_skip_dir {
                    if debug.log_skip_dir {
                        eprintln!("skipping from: {rel}");
                    }
                    match skip_dir(paths, i) {
                        Some(next) => {
                            if debug.log_skip_dir {
                                eprintln!("skipped to: {}", paths[next]);
                            }
                            i = next;
                            continue;
                        }
                        // The rest of the slice lives under this
                        // directory.
                        None => break,
                    }
                }
            } else if !is_dir {
                out.insert(rel.clone(), ChangedFile::new(WhatChanged::empty(), true));
            }
        }

        i += 1;
    }

    out
}

/// The index of the next path that does not live under the directory at
/// `index`, or `None` when no such path remains (or the directory is
/// the root itself, which would skip everything).
///
/// Assumes the traversal order of the walker and a trailing separator
/// on directory entries.
pub(crate) fn skip_dir(paths: &[String], index: usize) -> Option<usize> {
    let dir_to_skip = parent_dir(&paths[index]);

    if dir_to_skip == "/" || dir_to_skip == "." {
        return None;
    }

    let prefix = format!("{dir_to_skip}{MAIN_SEPARATOR}");
    (index + 1..paths.len()).find(|&i| !paths[i].starts_with(&prefix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;
    use assert_fs::prelude::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn paths(list: &[&str]) -> Vec<String> {
        list.iter().map(|p| p.to_string()).collect()
    }

    #[rstest]
    #[case(&["folder/file.txt", "folder/file2.txt", "folder/file3.txt", "folder2/file.txt"], 0, Some(3))]
    #[case(&["/", "/home/", "/home/file.txt", "/home/file2.txt", "/sauce/", "/sauce/file.txt"], 0, None)]
    #[case(&["/home/", "/home/file.txt", "/home/file2.txt", "/sauce/", "/sauce/file.txt"], 0, Some(3))]
    #[case(&["/file.txt", "/file2.txt"], 0, None)]
    #[case(&["/folder/file.txt", "/folder/file2.txt", "/folder2/file.txt", "/folder2/file2.txt"], 0, Some(2))]
    #[case(&["/folder/file.txt", "/folder/file2.txt", "/folder2/file.txt", "/folder2/file2.txt"], 2, None)]
    #[case(&["hi", "hi"], 1, None)]
    #[case(&["."], 0, None)]
    #[case(&[".", "./hello"], 0, None)]
    #[case(&["2_folder/folder/", "2_folder/folder/file.txt", "5", "4"], 0, Some(2))]
    #[case(&["2_folder/folder/", "2_folder/folder/file.txt", "5", "4"], 1, Some(2))]
    #[case(&["2_folder/folder/", "2_folder/folder/file.txt", "5", "4"], 3, None)]
    #[case(&["ignored_folder/file.txt", "file.txt"], 0, Some(1))]
    #[case(&["folder/", "folder/hi"], 0, None)]
    #[case(&["folder/", "folder/hi/"], 0, None)]
    #[case(&["folder/file.txt", "folder/hi/"], 0, None)]
    #[cfg_attr(windows, ignore = "separator-specific cases")]
    fn skip_dir_finds_the_next_sibling(
        #[case] list: &[&str],
        #[case] index: usize,
        #[case] expected: Option<usize>,
    ) {
        assert_eq!(skip_dir(&paths(list), index), expected);
    }

    #[rstest]
    fn skip_lands_on_the_following_path_not_past_it() {
        // A skip that overshoots by one would silently drop file.txt.
        let dir = TempDir::new().unwrap();
        dir.child(".gitignore").write_str("ignored_folder/\n").unwrap();

        let walked = paths(&["ignored_folder/", "file.txt"]);
        let index = IndexMap::new();
        let result = untracked_paths_not_ignored(
            &walked,
            &[dir.path().join(".gitignore")],
            dir.path(),
            &index,
            true,
            1,
            &DebugOptions::default(),
        );

        assert_eq!(result.len(), 1);
        assert_eq!(
            result.get("file.txt"),
            Some(&ChangedFile::new(WhatChanged::empty(), true))
        );
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(7)]
    fn worker_count_never_changes_the_result(#[case] workers: usize) {
        let dir = TempDir::new().unwrap();
        dir.child(".gitignore").write_str("build/\n").unwrap();

        let walked = paths(&[
            ".gitignore",
            "a.txt",
            "build/",
            "build/obj/",
            "build/obj/a.o",
            "build/out.o",
            "src/",
            "src/lib.rs",
            "src/main.rs",
        ]);
        let index = IndexMap::new();
        let result = untracked_paths_not_ignored(
            &walked,
            &[dir.path().join(".gitignore")],
            dir.path(),
            &index,
            true,
            workers,
            &DebugOptions::default(),
        );

        let mut keys: Vec<&String> = result.keys().collect();
        keys.sort();
        assert_eq!(keys, [".gitignore", "a.txt", "src/lib.rs", "src/main.rs"]);
        assert!(result.values().all(|c| c.untracked && c.what_changed.is_empty()));
    }

    #[rstest]
    fn disabling_skip_dir_does_not_change_the_result() {
        let dir = TempDir::new().unwrap();
        dir.child(".gitignore").write_str("build/\n").unwrap();

        let walked = paths(&["build/", "build/a.o", "build/b.o", "main.c"]);
        let index = IndexMap::new();
        let gitignores = [dir.path().join(".gitignore")];

        let with_skip = untracked_paths_not_ignored(
            &walked,
            &gitignores,
            dir.path(),
            &index,
            true,
            1,
            &DebugOptions::default(),
        );
        let without_skip = untracked_paths_not_ignored(
            &walked,
            &gitignores,
            dir.path(),
            &index,
            true,
            1,
            &DebugOptions {
                disable_skip_dir: true,
                ..Default::default()
            },
        );

        assert_eq!(with_skip, without_skip);
    }

    #[rstest]
    fn ignore_rules_can_be_disrespected() {
        let dir = TempDir::new().unwrap();
        dir.child(".gitignore").write_str("*.o\n").unwrap();

        let walked = paths(&["a.o"]);
        let index = IndexMap::new();
        let result = untracked_paths_not_ignored(
            &walked,
            &[dir.path().join(".gitignore")],
            dir.path(),
            &index,
            false,
            1,
            &DebugOptions::default(),
        );

        assert!(result.contains_key("a.o"));
    }

    #[rstest]
    fn tracked_paths_are_never_reported() {
        let dir = TempDir::new().unwrap();
        let walked = paths(&["known.txt", "new.txt"]);
        let index = IndexMap::from([(
            "known.txt".to_string(),
            crate::index::IndexEntry::new(
                0,
                0,
                0,
                0,
                crate::index::REGULAR_FILE | 0o644,
                0,
                crate::index::ObjectId::default(),
            ),
        )]);

        let result = untracked_paths_not_ignored(
            &walked,
            &[],
            dir.path(),
            &index,
            true,
            1,
            &DebugOptions::default(),
        );

        assert_eq!(result.len(), 1);
        assert!(result.contains_key("new.txt"));
    }
}
