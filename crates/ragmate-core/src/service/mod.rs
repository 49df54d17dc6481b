pub mod agentic;
pub mod models;

use async_trait::async_trait;
use crate::{IndexStats, QueryOptions, SourceFile};
pub use agentic::AgenticRagService;
pub use crate::executor::QueryResults;
pub use models::*;

#[async_trait]
pub trait RagService: Send + Sync {
    /// Plan, execute and synthesize an intent. Never fails; degradation shows
    /// up as a lower confidence score or a shorter context.
    async fn query(&self, intent: &str, options: QueryOptions) -> AgenticRagResult;

    /// Parse and store files, replacing records with the same path.
    /// Cached plans and results are discarded.
    fn index_codebase(&self, files: &[SourceFile]);

    /// Number of indexed files
    fn index_size(&self) -> usize;

    /// Aggregate index statistics
    fn index_stats(&self) -> IndexStats;

    /// Forget cached plans and results
    fn clear_cache(&self);
}
