//! Query executor: runs sub-queries against the index.

use crate::json::{decode, preview};
use crate::record::{rank_by_relevance, truncate_chars};
use crate::{
    Error, FileIndex, GenerationOptions, IndexedFile, QueryPlan, QueryResult, QueryType,
    RagConfig, ResultCache, Result, SubQuery, TextGenerator,
};
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// Per-sub-query results keyed by `query_id`.
pub type QueryResults = BTreeMap<String, Vec<QueryResult>>;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ResultsPayload {
    List(Vec<ResultPayload>),
    Wrapped { results: Vec<ResultPayload> },
}

impl ResultsPayload {
    fn into_vec(self) -> Vec<ResultPayload> {
        match self {
            ResultsPayload::List(list) => list,
            ResultsPayload::Wrapped { results } => results,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ResultPayload {
    #[serde(alias = "filePath", alias = "path")]
    file_path: String,
    #[serde(default, alias = "snippet")]
    content: Option<String>,
    #[serde(alias = "score")]
    relevance: f64,
}

/// Executes sub-queries by asking the text generator to rank index entries.
pub struct QueryExecutor {
    generator: Arc<dyn TextGenerator>,
    config: RagConfig,
}

impl QueryExecutor {
    pub fn new(generator: Arc<dyn TextGenerator>, config: RagConfig) -> Self {
        Self { generator, config }
    }

    /// Execute one sub-query. Failures yield an empty list.
    pub async fn execute(&self, sub_query: &SubQuery, index: &dyn FileIndex) -> Vec<QueryResult> {
        match self.try_execute(sub_query, index).await {
            Ok(results) => results,
            Err(e) => {
                warn!("Sub-query {} failed: {}", sub_query.query_id, e);
                Vec::new()
            }
        }
    }

    /// Execute every sub-query of `plan` concurrently, consulting `cache`
    /// under `scope` first.
    ///
    /// Every `query_id` of the plan is present in the output.
    pub async fn execute_all(
        &self,
        plan: &QueryPlan,
        index: &dyn FileIndex,
        cache: &ResultCache,
        scope: &str,
    ) -> QueryResults {
        let outcomes: Vec<(String, Vec<QueryResult>)> = stream::iter(plan.sub_queries.clone())
            .map(|sub_query| async move {
                if let Some(hit) = cache.get_results(scope, &sub_query.query_id) {
                    debug!("Cache hit for sub-query {}", sub_query.query_id);
                    return (sub_query.query_id, hit);
                }

                let results = match self.try_execute(&sub_query, index).await {
                    Ok(results) => {
                        cache.put_results(scope, &sub_query.query_id, &results);
                        results
                    }
                    Err(e) => {
                        warn!("Sub-query {} failed: {}", sub_query.query_id, e);
                        Vec::new()
                    }
                };
                (sub_query.query_id, results)
            })
            .buffer_unordered(self.config.max_concurrency.max(1))
            .collect()
            .await;

        outcomes.into_iter().collect()
    }

    /// Execute one sub-query, reporting failures.
    pub async fn try_execute(&self, sub_query: &SubQuery, index: &dyn FileIndex) -> Result<Vec<QueryResult>> {
        let candidates = index.matching(&sub_query.filters);
        if candidates.is_empty() {
            debug!("No index entries match filters of sub-query {}", sub_query.query_id);
            return Ok(Vec::new());
        }

        let candidates = self.preselect(&sub_query.query_text, candidates);
        let prompt = self.build_prompt(sub_query, &candidates);
        let options = GenerationOptions::json().with_temperature(self.config.execution_temperature);

        let response = self.generator.generate(&prompt, &options).await?;
        let payload: ResultsPayload = decode(&response).map_err(|e| {
            Error::Execution(format!("{} (response: {})", e, preview(&response)))
        })?;

        let results = self.validate(payload.into_vec(), &candidates);
        debug!(
            "Sub-query {} returned {} results from {} candidates",
            sub_query.query_id,
            results.len(),
            candidates.len()
        );
        Ok(results)
    }

    /// Keep the candidates sharing the most terms with the query, in index
    /// order among equals.
    fn preselect(&self, query_text: &str, candidates: Vec<IndexedFile>) -> Vec<IndexedFile> {
        let limit = self.config.max_candidates_per_prompt.max(1);
        if candidates.len() <= limit {
            return candidates;
        }

        let terms = tokenize(query_text);
        let mut scored: Vec<(usize, IndexedFile)> = candidates
            .into_iter()
            .map(|file| {
                let haystack = format!("{} {} {}", file.path, file.exports.join(" "), file.content).to_lowercase();
                let hits = terms.iter().filter(|t| haystack.contains(t.as_str())).count();
                (hits, file)
            })
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.into_iter().take(limit).map(|(_, file)| file).collect()
    }

    /// Drop hallucinated paths and malformed scores, then rank.
    fn validate(&self, payload: Vec<ResultPayload>, candidates: &[IndexedFile]) -> Vec<QueryResult> {
        let by_path: HashMap<&str, &IndexedFile> = candidates.iter().map(|f| (f.path.as_str(), f)).collect();
        let mut seen = HashSet::new();
        let mut results = Vec::new();

        for item in payload {
            let Some(file) = by_path.get(item.file_path.as_str()) else {
                debug!("Dropping result for unknown path {}", item.file_path);
                continue;
            };
            if !item.relevance.is_finite() || !seen.insert(file.path.clone()) {
                continue;
            }

            let content = match item.content {
                Some(snippet) if !snippet.trim().is_empty() => {
                    truncate_chars(&snippet, self.config.max_content_chars).0
                }
                _ => file.content.clone(),
            };
            results.push(QueryResult::from_indexed(file, content, item.relevance.clamp(0.0, 1.0)));
        }

        rank_by_relevance(&mut results);
        results.truncate(self.config.max_results_per_query);
        results
    }

    fn build_prompt(&self, sub_query: &SubQuery, candidates: &[IndexedFile]) -> String {
        let (role, task, with_dependencies) = match sub_query.query_type {
            QueryType::CodeSearch => (
                "You are a code search engine.",
                "Find the files whose implementation best answers the query.",
                false,
            ),
            QueryType::PatternSearch => (
                "You are a code search engine.",
                "Find the files that exhibit the pattern or idiom described by the query.",
                false,
            ),
            QueryType::ApiReference => (
                "You are a code search engine.",
                "Find the files defining the public interfaces, signatures and exports the query asks about.",
                false,
            ),
            QueryType::Documentation => (
                "You are a documentation search engine.",
                "Find the files whose documentation or comments explain the query; summarize each match in the content field.",
                false,
            ),
            QueryType::DependencyGraph => (
                "You are a dependency-aware code search engine.",
                "Find the files involved in the query, using their imports to follow relationships between modules.",
                true,
            ),
        };

        let mut listing = String::new();
        for file in candidates {
            listing.push_str(&format!("### {}\n", file.path));
            if with_dependencies {
                listing.push_str(&format!("dependencies: {}\n", file.dependencies.join(", ")));
            }
            if !file.exports.is_empty() {
                listing.push_str(&format!("exports: {}\n", file.exports.join(", ")));
            }
            let (snippet, _) = truncate_chars(&file.content, self.config.prompt_snippet_chars);
            listing.push_str(&format!("```\n{}\n```\n\n", snippet));
        }

        format!(
            r#"{role}
{task}

Query: {query}

Files:
{listing}
Respond with a JSON array only, most relevant first, at most {max} entries:
[{{"file_path": "path from the list above", "content": "relevant snippet", "relevance": 0.0}}]
Relevance is between 0 and 1. Return [] when nothing is relevant."#,
            role = role,
            task = task,
            query = sub_query.query_text,
            listing = listing,
            max = self.config.max_results_per_query,
        )
    }
}

fn tokenize(text: &str) -> Vec<String> {
    let mut terms: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|t| t.len() > 2)
        .map(|t| t.to_lowercase())
        .collect();
    terms.sort();
    terms.dedup();
    terms
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::{auth_codebase, MockGenerator};
    use crate::{MemoryIndex, QueryOptions, SourceFile};

    fn sub_query(text: &str, query_type: QueryType, options: &QueryOptions) -> SubQuery {
        SubQuery {
            query_id: "q1".to_string(),
            query_text: text.to_string(),
            query_type,
            filters: options.to_filters(),
        }
    }

    fn index() -> MemoryIndex {
        let index = MemoryIndex::default();
        index.index_files(&auth_codebase());
        index
    }

    #[tokio::test]
    async fn test_malformed_payload_rejected() {
        let gen = Arc::new(MockGenerator::new().respond_to(
            "Query: login flow",
            r#"[
                {"file_path": "src/auth/crypto.ts", "relevance": 0.4},
                {"file_path": "src/auth/ghost.ts", "relevance": 0.99},
                {"file_path": "src/auth/login.ts", "content": "export async function login", "relevance": 1.7},
                {"file_path": "docs/auth.md", "relevance": "high"}
            ]"#,
        ));
        let executor = QueryExecutor::new(gen, RagConfig::default());
        let sq = sub_query("login flow", QueryType::CodeSearch, &QueryOptions::default());

        // one entry has a non-numeric relevance, so the payload is rejected outright
        assert!(executor.try_execute(&sq, &index()).await.is_err());
        assert!(executor.execute(&sq, &index()).await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_paths_dropped_and_relevance_clamped() {
        let gen = Arc::new(MockGenerator::new().respond_to(
            "Query: login flow",
            r#"{"results": [
                {"file_path": "src/auth/crypto.ts", "relevance": 0.4},
                {"file_path": "src/auth/ghost.ts", "relevance": 0.99},
                {"file_path": "src/auth/login.ts", "content": "export async function login", "relevance": 1.7},
                {"file_path": "src/auth/crypto.ts", "relevance": 0.9}
            ]}"#,
        ));
        let executor = QueryExecutor::new(gen, RagConfig::default());
        let sq = sub_query("login flow", QueryType::CodeSearch, &QueryOptions::default());
        let results = executor.execute(&sq, &index()).await;

        let paths: Vec<_> = results.iter().map(|r| r.file_path.as_str()).collect();
        assert_eq!(paths, vec!["src/auth/login.ts", "src/auth/crypto.ts"]);
        assert_eq!(results[0].relevance, 1.0);
        assert_eq!(results[0].content, "export async function login");
        assert_eq!(results[0].dependencies, vec!["./crypto", "jsonwebtoken"]);
        assert_eq!(results[1].relevance, 0.4);
        assert!(results[1].content.contains("createHash"));
    }

    #[tokio::test]
    async fn test_filtered_entries_never_reach_prompt() {
        let gen = Arc::new(MockGenerator::new().respond_to(
            "Query: seeding",
            r#"[{"file_path": "scripts/seed.py", "relevance": 0.9}]"#,
        ));
        let executor = QueryExecutor::new(gen.clone(), RagConfig::default());
        let options = QueryOptions::default().with_language("typescript");
        let results = executor
            .execute(&sub_query("seeding", QueryType::CodeSearch, &options), &index())
            .await;

        assert!(results.is_empty());
        let prompt = &gen.prompts()[0];
        assert!(prompt.contains("src/auth/login.ts"));
        assert!(!prompt.contains("scripts/seed.py"));
        assert!(!prompt.contains("docs/auth.md"));
    }

    #[tokio::test]
    async fn test_no_candidates_skips_generator() {
        let gen = Arc::new(MockGenerator::new());
        let executor = QueryExecutor::new(gen.clone(), RagConfig::default());
        let options = QueryOptions::default().with_language("go");
        let results = executor
            .execute(&sub_query("anything", QueryType::CodeSearch, &options), &index())
            .await;

        assert!(results.is_empty());
        assert_eq!(gen.calls(), 0);
    }

    #[tokio::test]
    async fn test_dependency_graph_prompt_lists_dependencies() {
        let gen = Arc::new(MockGenerator::new().respond_to("Query: imports", "[]"));
        let executor = QueryExecutor::new(gen.clone(), RagConfig::default());
        let sq = sub_query("imports", QueryType::DependencyGraph, &QueryOptions::default());
        assert!(executor.try_execute(&sq, &index()).await.unwrap().is_empty());

        let prompt = &gen.prompts()[0];
        assert!(prompt.starts_with("You are a dependency-aware code search engine."));
        assert!(prompt.contains("dependencies: ./crypto, jsonwebtoken"));
    }

    #[tokio::test]
    async fn test_execute_all_isolates_failures_and_caches() {
        let gen = Arc::new(
            MockGenerator::new()
                .respond_to("Query: hashing", r#"[{"file_path": "src/auth/crypto.ts", "relevance": 0.8}]"#)
                .respond_to("Query: broken", "this is not json"),
        );
        let executor = QueryExecutor::new(gen.clone(), RagConfig::default().with_max_concurrency(2));
        let mut plan = QueryPlan::fallback("intent", &QueryOptions::default());
        plan.sub_queries = vec![
            SubQuery { query_id: "q1".into(), ..sub_query("hashing", QueryType::CodeSearch, &QueryOptions::default()) },
            SubQuery { query_id: "q2".into(), ..sub_query("broken", QueryType::PatternSearch, &QueryOptions::default()) },
            SubQuery { query_id: "q3".into(), ..sub_query("unanswered", QueryType::ApiReference, &QueryOptions::default()) },
        ];
        let cache = ResultCache::new();
        let idx = index();

        let results = executor.execute_all(&plan, &idx, &cache, "scope").await;
        assert_eq!(results.len(), 3);
        assert_eq!(results["q1"].len(), 1);
        assert!(results["q2"].is_empty());
        assert!(results["q3"].is_empty());
        assert_eq!(gen.calls(), 3);

        // only the successful sub-query is cached
        let again = executor.execute_all(&plan, &idx, &cache, "scope").await;
        assert_eq!(again["q1"], results["q1"]);
        assert_eq!(gen.calls(), 5);
    }

    #[test]
    fn test_preselect_prefers_matching_terms() {
        let executor = QueryExecutor::new(
            Arc::new(MockGenerator::new()),
            RagConfig::default().with_max_candidates_per_prompt(1),
        );
        let index = MemoryIndex::default();
        index.index_files(&[
            SourceFile::new("a.ts", "export const unrelated = 1;"),
            SourceFile::new("b.ts", "export function tokenRefresh() {}"),
        ]);
        let picked = executor.preselect("refresh the token", index.matching(&Default::default()));
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].path, "b.ts");
    }
}
