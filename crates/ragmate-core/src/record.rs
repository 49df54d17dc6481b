//! Index and result record types.

use serde::{Deserialize, Serialize};

/// A file handed to the indexer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: String,
    pub content: String,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// A file stored in the codebase index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedFile {
    /// Unique key
    pub path: String,
    /// File text, bounded in length
    pub content: String,
    /// Import-like references, in source order
    pub dependencies: Vec<String>,
    /// Exported symbol names, in source order
    pub exports: Vec<String>,
    /// Whether `content` was cut to the bound
    #[serde(default)]
    pub truncated: bool,
}

/// One ranked hit for a sub-query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub file_path: String,
    pub content: String,
    /// In `[0.0, 1.0]`
    pub relevance: f64,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub exports: Vec<String>,
}

impl QueryResult {
    /// Build a result carrying an index record's metadata.
    pub fn from_indexed(file: &IndexedFile, content: String, relevance: f64) -> Self {
        Self {
            file_path: file.path.clone(),
            content,
            relevance,
            dependencies: file.dependencies.clone(),
            exports: file.exports.clone(),
        }
    }
}

/// Sort by descending relevance, keeping the original order among ties.
pub fn rank_by_relevance(results: &mut [QueryResult]) {
    // sort_by is stable
    results.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));
}

/// Cut `text` to at most `max_chars` characters on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> (String, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => (text[..byte_idx].to_string(), true),
        None => (text.to_string(), false),
    }
}
