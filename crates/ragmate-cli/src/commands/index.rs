//! Index command implementation.

use anyhow::Result;
use colored::Colorize;
use ragmate_core::{FileIndex, MemoryIndex};
use std::path::PathBuf;

use crate::walk::collect_sources;

/// Run the index command.
pub async fn run(path: PathBuf, max_chars: usize) -> Result<()> {
    println!("{} Indexing {}", "→".blue(), path.display());

    let collected = collect_sources(&path)?;
    let index = MemoryIndex::new(max_chars);
    index.index_files(&collected.files);
    let stats = index.stats();

    println!();
    println!("{} Indexing complete!", "✓".green());
    println!("  Files: {}", stats.files);
    println!("  Dependencies: {}", stats.dependencies);
    println!("  Exports: {}", stats.exports);
    println!("  Truncated: {}", stats.truncated);
    println!("  Errors: {}", collected.errors);

    Ok(())
}
