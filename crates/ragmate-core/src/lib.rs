//! RagMate Core Library
//!
//! Agentic retrieval-augmented generation over an in-memory codebase index:
//! an intent is planned into typed sub-queries, the sub-queries are executed
//! concurrently, and their results are synthesized into one context string.

pub mod config;
pub mod confidence;
pub mod content_hash;
pub mod error;
pub mod executor;
pub mod extract;
pub mod generation;
pub mod index;
pub mod json;
pub mod language;
pub mod plan;
pub mod planner;
pub mod record;
pub mod service;
pub mod synthesizer;

#[cfg(test)]
pub mod testutils;

pub use config::RagConfig;
pub use content_hash::ContentHash;
pub use error::{Error, Result};
pub use generation::{GenerationError, GenerationOptions, ResponseFormat, TextGenerator};
pub use index::{FileIndex, IndexStats, MemoryIndex, ResultCache};
pub use language::Language;
pub use plan::{QueryFilters, QueryOptions, QueryPlan, QueryType, SubQuery, SynthesisStrategy};
pub use record::{IndexedFile, QueryResult, SourceFile};
pub use service::{AgenticRagResult, AgenticRagService, QueryResults, RagService};
