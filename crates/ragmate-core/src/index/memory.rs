//! In-memory index implementation.

use super::traits::{FileIndex, IndexStats};
use crate::extract::extract;
use crate::record::truncate_chars;
use crate::{IndexedFile, QueryFilters, SourceFile};
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Path-keyed in-memory index.
///
/// Writes replace whole records; there is no partial merge.
pub struct MemoryIndex {
    files: RwLock<BTreeMap<String, IndexedFile>>,
    max_content_chars: usize,
}

impl MemoryIndex {
    /// Create an empty index bounding stored content to `max_content_chars`.
    pub fn new(max_content_chars: usize) -> Self {
        Self {
            files: RwLock::new(BTreeMap::new()),
            max_content_chars,
        }
    }

    /// Parse one file into a record without storing it.
    pub fn build_record(&self, file: &SourceFile) -> IndexedFile {
        // Extract before truncating so imports near the end still count.
        let extracted = extract(&file.path, &file.content);
        let (content, truncated) = truncate_chars(&file.content, self.max_content_chars);

        IndexedFile {
            path: file.path.clone(),
            content,
            dependencies: extracted.dependencies,
            exports: extracted.exports,
            truncated,
        }
    }

    /// Remove every record.
    pub fn clear(&self) {
        self.write().clear();
    }

    // Records are inserted whole, so a poisoned map is still consistent.
    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, IndexedFile>> {
        self.files.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, IndexedFile>> {
        self.files.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MemoryIndex {
    fn default() -> Self {
        Self::new(crate::RagConfig::default().max_content_chars)
    }
}

impl FileIndex for MemoryIndex {
    fn index_files(&self, files: &[SourceFile]) {
        let records: Vec<IndexedFile> = files.iter().map(|f| self.build_record(f)).collect();

        let mut map = self.write();
        for record in records {
            map.insert(record.path.clone(), record);
        }
        tracing::debug!("Indexed {} files, index size {}", files.len(), map.len());
    }

    fn get(&self, path: &str) -> Option<IndexedFile> {
        self.read().get(path).cloned()
    }

    fn len(&self) -> usize {
        self.read().len()
    }

    fn matching(&self, filters: &QueryFilters) -> Vec<IndexedFile> {
        self.read()
            .values()
            .filter(|f| filters.matches(&f.path))
            .cloned()
            .collect()
    }

    fn stats(&self) -> IndexStats {
        let map = self.read();
        map.values().fold(
            IndexStats {
                files: map.len(),
                ..Default::default()
            },
            |mut stats, f| {
                stats.dependencies += f.dependencies.len();
                stats.exports += f.exports.len();
                stats.truncated += usize::from(f.truncated);
                stats
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::QueryOptions;

    #[test]
    fn test_index_size_and_replace() {
        let index = MemoryIndex::default();
        index.index_files(&[SourceFile::new("a.ts", "import x from 'lodash'")]);
        assert_eq!(index.len(), 1);

        index.index_files(&[
            SourceFile::new("b.ts", "export const b = 1;"),
            SourceFile::new("a.ts", "import y from 'react'"),
        ]);
        assert_eq!(index.len(), 2);

        let a = index.get("a.ts").unwrap();
        assert_eq!(a.dependencies, vec!["react"]);
        assert_eq!(a.content, "import y from 'react'");
    }

    #[test]
    fn test_content_is_bounded() {
        let index = MemoryIndex::new(10);
        let long = format!("{}\nimport z from 'zod'", "x".repeat(50));
        index.index_files(&[SourceFile::new("big.ts", long)]);

        let record = index.get("big.ts").unwrap();
        assert_eq!(record.content.chars().count(), 10);
        assert!(record.truncated);
        assert_eq!(record.dependencies, vec!["zod"]);
        assert_eq!(index.stats().truncated, 1);
    }

    #[test]
    fn test_matching_applies_filters() {
        let index = MemoryIndex::default();
        index.index_files(&[
            SourceFile::new("src/auth/login.ts", ""),
            SourceFile::new("src/auth/login.py", ""),
            SourceFile::new("lib/util.ts", ""),
        ]);

        let filters = QueryOptions::default()
            .with_language("typescript")
            .with_directory("src")
            .to_filters();
        let paths: Vec<_> = index.matching(&filters).into_iter().map(|f| f.path).collect();
        assert_eq!(paths, vec!["src/auth/login.ts"]);
        assert_eq!(index.matching(&QueryFilters::default()).len(), 3);
    }
}
