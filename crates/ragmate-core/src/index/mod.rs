//! Codebase index and result cache.
//!
//! The index is trait-based so the executor can run against any file
//! source; [`MemoryIndex`] is the in-process implementation owned by the
//! service.

mod cache;
mod memory;
mod traits;

pub use cache::ResultCache;
pub use memory::MemoryIndex;
pub use traits::{FileIndex, IndexStats};
