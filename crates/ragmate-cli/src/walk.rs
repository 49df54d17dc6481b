//! Source collection for indexing.

use anyhow::Result;
use ragmate_core::{Language, SourceFile};
use std::path::Path;
use walkdir::WalkDir;

/// Files gathered from a directory tree.
#[derive(Debug, Default)]
pub struct Collected {
    pub files: Vec<SourceFile>,
    /// Entries that could not be walked or read
    pub errors: usize,
}

/// Read every code and documentation file below `root`, keyed by its path
/// relative to `root` with `/` separators.
pub fn collect_sources(root: &Path) -> Result<Collected> {
    if !root.exists() {
        anyhow::bail!("path not found: {}", root.display());
    }

    let mut collected = Collected::default();
    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || (!is_hidden(e) && !is_ignored(e)))
    {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!("Error walking directory: {}", e);
                collected.errors += 1;
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let file_path = entry.path();
        let ext = file_path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if !is_indexable(ext) {
            continue;
        }

        let content = match std::fs::read_to_string(file_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!("Error reading {}: {}", file_path.display(), e);
                collected.errors += 1;
                continue;
            }
        };

        let relative = file_path.strip_prefix(root).unwrap_or(file_path);
        let key = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        collected.files.push(SourceFile::new(key, content));
    }

    Ok(collected)
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

fn is_ignored(entry: &walkdir::DirEntry) -> bool {
    let name = entry.file_name().to_str().unwrap_or("");
    matches!(
        name,
        "node_modules" | "target" | "dist" | "build" | "__pycache__" | ".git" | "vendor"
    )
}

fn is_indexable(ext: &str) -> bool {
    Language::from_str(ext) != Language::Unknown || matches!(ext, "md" | "mdx" | "rst" | "txt")
}
