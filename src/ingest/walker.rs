//! Walker - gitignore-aware file discovery

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use super::IngestOptions;

/// A file picked up by the walk, with its path relative to the root
#[derive(Debug, Clone)]
pub struct WalkedFile {
    pub path: PathBuf,
    pub relative: PathBuf,
    pub size: u64,
}

/// Collect every file below `root` in a stable, name-sorted order.
///
/// `exclude` is skipped even if it lives inside `root`, so writing the
/// digest next to the sources never feeds it back into itself.
pub fn collect_files(root: &Path, options: &IngestOptions, exclude: &Path) -> Vec<WalkedFile> {
    let mut files = Vec::new();

    let walker = WalkBuilder::new(root)
        .hidden(!options.include_hidden)
        .git_ignore(options.respect_gitignore)
        .git_global(options.respect_gitignore)
        .git_exclude(options.respect_gitignore)
        .ignore(options.respect_gitignore)
        .require_git(false)
        .follow_links(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(|entry| entry.file_name() != ".git")
        .build();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }

        let path = entry.path();
        if is_same_file(path, exclude) {
            continue;
        }

        let size = match entry.metadata() {
            Ok(metadata) => metadata.len(),
            Err(e) => {
                log::warn!("Failed to stat {}: {}", path.display(), e);
                continue;
            }
        };

        let relative = path.strip_prefix(root).unwrap_or(path).to_path_buf();
        files.push(WalkedFile {
            path: path.to_path_buf(),
            relative,
            size,
        });
    }

    files
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
