//! Default [`RagService`] implementation.

use std::sync::Arc;
use async_trait::async_trait;
use tracing::{debug, info};

use super::{AgenticRagResult, RagService};
use crate::confidence;
use crate::executor::QueryExecutor;
use crate::planner::QueryPlanner;
use crate::synthesizer::Synthesizer;
use crate::{
    FileIndex, IndexStats, MemoryIndex, QueryOptions, QueryPlan, RagConfig, ResultCache, SourceFile,
    TextGenerator,
};

/// Agentic retrieval service owning its index and session cache.
pub struct AgenticRagService {
    index: MemoryIndex,
    cache: ResultCache,
    planner: QueryPlanner,
    executor: QueryExecutor,
    synthesizer: Synthesizer,
}

impl AgenticRagService {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self::with_config(generator, RagConfig::default())
    }

    pub fn with_config(generator: Arc<dyn TextGenerator>, config: RagConfig) -> Self {
        Self {
            index: MemoryIndex::new(config.max_content_chars),
            cache: ResultCache::new(),
            planner: QueryPlanner::new(
                Arc::clone(&generator),
                config.max_sub_queries,
                config.planning_temperature,
            ),
            synthesizer: Synthesizer::new(Arc::clone(&generator), config.synthesis_temperature),
            executor: QueryExecutor::new(generator, config),
        }
    }

    /// The index backing this service.
    pub fn index(&self) -> &MemoryIndex {
        &self.index
    }

    /// Cached plan for the scope, or a fresh one. Fallback plans are not
    /// cached so a later identical query retries planning.
    async fn plan(&self, intent: &str, options: &QueryOptions, scope: &str) -> QueryPlan {
        if let Some(plan) = self.cache.get_plan(scope) {
            debug!("Plan cache hit for '{}'", intent);
            return plan;
        }

        match self.planner.try_plan(intent, options).await {
            Ok(plan) => {
                self.cache.put_plan(scope, &plan);
                plan
            }
            Err(e) => self.planner.fallback(intent, options, &e),
        }
    }
}

#[async_trait]
impl RagService for AgenticRagService {
    async fn query(&self, intent: &str, options: QueryOptions) -> AgenticRagResult {
        let scope = options.scope_key(intent);

        let plan = self.plan(intent, &options, &scope).await;
        let query_results = self
            .executor
            .execute_all(&plan, &self.index, &self.cache, &scope)
            .await;
        let synthesized_context = self.synthesizer.synthesize(&plan, &query_results).await;
        let confidence_score = confidence::score(&query_results, &synthesized_context);

        let result = AgenticRagResult {
            plan,
            query_results,
            synthesized_context,
            confidence_score,
        };
        info!(
            "Query '{}' finished: {} sub-queries, {} results, confidence {:.2}",
            intent,
            result.plan.sub_queries.len(),
            result.result_count(),
            result.confidence_score
        );
        result
    }

    fn index_codebase(&self, files: &[SourceFile]) {
        self.index.index_files(files);
        if !files.is_empty() {
            // Cached plans and results were computed against the previous index
            self.cache.clear();
        }
        info!("Indexed {} files ({} total)", files.len(), self.index.len());
    }

    fn index_size(&self) -> usize {
        self.index.len()
    }

    fn index_stats(&self) -> IndexStats {
        self.index.stats()
    }

    fn clear_cache(&self) {
        self.cache.clear();
        debug!("Result cache cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::{auth_codebase, MockGenerator};
    use crate::SynthesisStrategy;

    const PLAN: &str = r#"{"sub_queries": [
        {"query_text": "login implementation", "query_type": "code_search"},
        {"query_text": "hashing helpers", "query_type": "api_reference"}
    ], "synthesis_strategy": "summarize"}"#;

    fn generator() -> Arc<MockGenerator> {
        Arc::new(
            MockGenerator::new()
                .respond_to("query planner", PLAN)
                .respond_to("Query: login implementation", r#"[{"file_path": "src/auth/login.ts", "relevance": 0.9}]"#)
                .respond_to("Query: hashing helpers", r#"[{"file_path": "src/auth/crypto.ts", "relevance": 0.7}]"#)
                .respond_to("concise Markdown summary", "Login hashes passwords before signing a JWT."),
        )
    }

    #[tokio::test]
    async fn test_query_pipeline() {
        let gen = generator();
        let service = AgenticRagService::new(gen.clone());
        service.index_codebase(&auth_codebase());

        let result = service.query("How does login work?", QueryOptions::default()).await;
        assert_eq!(result.plan.synthesis_strategy, SynthesisStrategy::Summarize);
        assert_eq!(result.query_results.len(), 2);
        assert_eq!(result.query_results["q1"][0].file_path, "src/auth/login.ts");
        assert_eq!(result.synthesized_context, "Login hashes passwords before signing a JWT.");
        assert!(result.confidence_score > 0.0 && result.confidence_score <= 1.0);
        // plan + two sub-queries + summary
        assert_eq!(gen.calls(), 4);
    }

    #[tokio::test]
    async fn test_repeat_query_hits_cache_until_cleared() {
        let gen = generator();
        let service = AgenticRagService::new(gen.clone());
        service.index_codebase(&auth_codebase());
        let options = QueryOptions::default().with_language("typescript");

        let first = service.query("How does login work?", options.clone()).await;
        let cold = gen.calls();

        let second = service.query("How does login work?", options.clone()).await;
        let warm = gen.calls() - cold;
        assert!(warm < cold);
        assert_eq!(second.plan.plan_id, first.plan.plan_id);
        assert_eq!(second.query_results, first.query_results);

        service.clear_cache();
        service.query("How does login work?", options).await;
        assert_eq!(gen.calls() - cold - warm, cold);
    }

    #[tokio::test]
    async fn test_fallback_plan_is_not_cached() {
        let gen = Arc::new(MockGenerator::failing());
        let service = AgenticRagService::new(gen.clone());
        service.index_codebase(&auth_codebase());

        let result = service.query("Find authentication patterns", QueryOptions::default()).await;
        assert_eq!(result.plan.sub_queries.len(), 1);
        assert!(result.query_results["q1"].is_empty());
        assert_eq!(result.synthesized_context, "");
        assert_eq!(result.confidence_score, 0.0);
        assert_eq!(gen.calls(), 2);

        service.query("Find authentication patterns", QueryOptions::default()).await;
        assert_eq!(gen.calls(), 4);
    }

    #[tokio::test]
    async fn test_reindex_invalidates_cache() {
        let gen = Arc::new(
            MockGenerator::new()
                .respond_to("query planner", r#"{"sub_queries": [{"query_text": "token", "query_type": "code_search"}], "synthesis_strategy": "concatenate"}"#)
                .respond_to("Query: token", r#"[{"file_path": "a.ts", "relevance": 0.9}]"#),
        );
        let service = AgenticRagService::new(gen.clone());
        service.index_codebase(&[SourceFile::new("a.ts", "const token = 'old';")]);

        let first = service.query("Where is the token?", QueryOptions::default()).await;
        assert_eq!(first.synthesized_context, "// File: a.ts\nconst token = 'old';");
        let cold = gen.calls();

        service.index_codebase(&[SourceFile::new("a.ts", "const token = 'new';")]);
        let second = service.query("Where is the token?", QueryOptions::default()).await;
        assert_eq!(second.synthesized_context, "// File: a.ts\nconst token = 'new';");
        assert_eq!(gen.calls(), cold * 2);
    }

    #[test]
    fn test_index_size() {
        let service = AgenticRagService::new(Arc::new(MockGenerator::new()));
        service.index_codebase(&[SourceFile::new("a.ts", "import x from 'lodash'")]);
        assert_eq!(service.index_size(), 1);

        service.index_codebase(&[
            SourceFile::new("b.ts", "export const b = 2;"),
            SourceFile::new("a.ts", "import x from 'lodash'"),
        ]);
        assert_eq!(service.index_size(), 2);
        assert_eq!(service.index_stats().dependencies, 1);
        assert_eq!(service.index_stats().exports, 1);
    }
}
