//! Index trait definitions.

use crate::{IndexedFile, QueryFilters, SourceFile};
use serde::{Deserialize, Serialize};

/// Aggregate counts over an index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub files: usize,
    pub dependencies: usize,
    pub exports: usize,
    /// Files whose content was cut to the length bound
    pub truncated: usize,
}

/// Keyed collection of indexed files.
pub trait FileIndex: Send + Sync {
    /// Parse and store files, replacing records that share a path.
    fn index_files(&self, files: &[SourceFile]);

    /// Retrieve a record by path.
    fn get(&self, path: &str) -> Option<IndexedFile>;

    /// Count stored records.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All records admitted by `filters`, ordered by path.
    fn matching(&self, filters: &QueryFilters) -> Vec<IndexedFile>;

    /// Aggregate counts.
    fn stats(&self) -> IndexStats;
}
