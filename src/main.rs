use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use std::time::Duration;
use unstaged::{CancelHandle, ChangedFile, WhatChanged, status_with_cancel};

#[derive(Parser)]
#[command(
    name = "unstaged",
    version,
    about = "Show unstaged and untracked files in a Git repository",
    long_about = "Computes the working-tree status of a Git repository straight from \
    the staged index and the live file tree, without invoking git. It lists files \
    whose content, mode or type differs from the index, deleted files, and \
    untracked files that no .gitignore rule excludes."
)]
struct Cli {
    /// Print the raw change tokens instead of git-style labels
    #[arg(long)]
    verbose: bool,

    /// Cancel the status call after this many milliseconds
    #[arg(long, value_name = "MILLIS")]
    timeout: Option<u64>,

    /// Repository root (defaults to the current directory)
    #[arg(index = 1)]
    path: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let root = match cli.path {
        Some(path) => path,
        None => std::env::current_dir().context("unable to determine the current directory")?,
    };

    let cancel = CancelHandle::new();
    if let Some(millis) = cli.timeout {
        let timer = cancel.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(millis));
            timer.cancel();
        });
    }

    let changed_files = status_with_cancel(&cancel, &root, None)
        .with_context(|| format!("status failed for {}", root.display()))?;

    let mut unstaged: Vec<(&String, &ChangedFile)> = changed_files
        .iter()
        .filter(|(_, changed)| !changed.untracked)
        .collect();
    let mut untracked: Vec<(&String, &ChangedFile)> = changed_files
        .iter()
        .filter(|(_, changed)| changed.untracked)
        .collect();
    unstaged.sort_by(|a, b| a.0.cmp(b.0));
    untracked.sort_by(|a, b| a.0.cmp(b.0));

    if !unstaged.is_empty() {
        println!("Changes not staged for commit:");
        for (path, changed) in unstaged {
            println!("        {}", format_entry(path, changed, cli.verbose).red());
        }
    }

    if !untracked.is_empty() {
        println!("Untracked files:");
        for (path, _) in untracked {
            println!("        {}", path.red());
        }
    }

    Ok(())
}

fn format_entry(path: &str, changed: &ChangedFile, verbose: bool) -> String {
    if verbose {
        return format!("{} {path}", changed.what_changed);
    }

    let label = if changed.what_changed.contains(WhatChanged::DELETED) {
        "deleted:   "
    } else if changed.what_changed.intersects(
        WhatChanged::DATA_CHANGED | WhatChanged::MODE_CHANGED | WhatChanged::TYPE_CHANGED,
    ) {
        "modified:  "
    } else {
        ""
    };

    format!("{label}{path}")
}
