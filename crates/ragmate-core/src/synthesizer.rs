//! Synthesizer: merges sub-query results into one context string.

use crate::executor::QueryResults;
use crate::{Error, GenerationOptions, QueryPlan, QueryResult, Result, SynthesisStrategy, TextGenerator};
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Combines results according to a plan's synthesis strategy.
///
/// Model-backed strategies fall back to [`concatenate`] on any failure.
pub struct Synthesizer {
    generator: Arc<dyn TextGenerator>,
    temperature: f32,
}

impl Synthesizer {
    pub fn new(generator: Arc<dyn TextGenerator>, temperature: f32) -> Self {
        Self { generator, temperature }
    }

    /// Synthesize a context for `plan`. Never fails.
    pub async fn synthesize(&self, plan: &QueryPlan, results: &QueryResults) -> String {
        let baseline = concatenate(plan, results);
        if baseline.is_empty() {
            return baseline;
        }

        let prompt = match plan.synthesis_strategy {
            SynthesisStrategy::Concatenate => return baseline,
            SynthesisStrategy::Summarize => summarize_prompt(plan, results),
            SynthesisStrategy::GraphBased => graph_prompt(plan, results),
            SynthesisStrategy::Hierarchical => hierarchical_prompt(plan, results),
        };

        match self.generate(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!(
                    "{} synthesis failed, falling back to concatenation: {}",
                    plan.synthesis_strategy.as_str(),
                    e
                );
                baseline
            }
        }
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let options = GenerationOptions::text().with_temperature(self.temperature);
        let text = self.generator.generate(prompt, &options).await?;
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::Synthesis("model returned an empty synthesis".to_string()));
        }
        debug!("Synthesized {} characters", text.chars().count());
        Ok(text.to_string())
    }
}

/// Results in plan order.
fn in_plan_order<'a>(plan: &'a QueryPlan, results: &'a QueryResults) -> impl Iterator<Item = &'a QueryResult> {
    plan.sub_queries
        .iter()
        .filter_map(|sq| results.get(&sq.query_id))
        .flatten()
}

/// Results in plan order, each file once (first occurrence wins).
fn unique_files<'a>(plan: &'a QueryPlan, results: &'a QueryResults) -> Vec<&'a QueryResult> {
    let mut seen = HashSet::new();
    in_plan_order(plan, results)
        .filter(|r| seen.insert(r.file_path.as_str()))
        .collect()
}

/// Deterministic join of every result's path and content. No model call.
///
/// A file returned by several sub-queries appears once per distinct content.
pub fn concatenate(plan: &QueryPlan, results: &QueryResults) -> String {
    let mut seen = HashSet::new();
    in_plan_order(plan, results)
        .filter(|r| seen.insert((r.file_path.as_str(), r.content.trim_end())))
        .map(|r| format!("// File: {}\n{}", r.file_path, r.content.trim_end()))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

/// Results grouped under their sub-query, for model prompts.
fn render_grouped(plan: &QueryPlan, results: &QueryResults) -> String {
    let mut out = String::new();
    for sq in &plan.sub_queries {
        let Some(list) = results.get(&sq.query_id).filter(|l| !l.is_empty()) else {
            continue;
        };
        out.push_str(&format!(
            "### Sub-query {} ({}): {}\n",
            sq.query_id,
            sq.query_type.as_str(),
            sq.query_text
        ));
        for r in list {
            out.push_str(&format!(
                "#### {} (relevance {:.2})\n```\n{}\n```\n",
                r.file_path,
                r.relevance,
                r.content.trim_end()
            ));
        }
        out.push('\n');
    }
    out
}

fn summarize_prompt(plan: &QueryPlan, results: &QueryResults) -> String {
    format!(
        "Write a concise Markdown summary of the retrieval results below as they relate to the request.\n\
         Keep file paths and key identifiers.\n\n\
         Request: {}\n\n{}",
        plan.original_intent,
        render_grouped(plan, results)
    )
}

fn hierarchical_prompt(plan: &QueryPlan, results: &QueryResults) -> String {
    format!(
        "Organize the retrieval results below into a hierarchy of Markdown headings: \
         an Overview section, one section per topic, and details with file paths under each section.\n\n\
         Request: {}\n\n{}",
        plan.original_intent,
        render_grouped(plan, results)
    )
}

fn graph_prompt(plan: &QueryPlan, results: &QueryResults) -> String {
    format!(
        "Describe the architecture revealed by the dependency graph and code below: \
         the main modules, how they depend on each other, and the entry points.\n\n\
         Request: {}\n\n{}\n{}",
        plan.original_intent,
        dependency_graph(plan, results),
        render_grouped(plan, results)
    )
}

/// Text rendering of the files found, their imports and exports, and the
/// edges between them.
pub fn dependency_graph(plan: &QueryPlan, results: &QueryResults) -> String {
    let files = unique_files(plan, results);

    let mut out = String::from("## Files\n");
    for r in &files {
        out.push_str(&format!("- {}\n", r.file_path));
        if !r.dependencies.is_empty() {
            out.push_str(&format!("  imports: {}\n", r.dependencies.join(", ")));
        }
        if !r.exports.is_empty() {
            out.push_str(&format!("  exports: {}\n", r.exports.join(", ")));
        }
    }

    let mut edges = Vec::new();
    for from in &files {
        for dep in &from.dependencies {
            for to in &files {
                if to.file_path != from.file_path && resolves_to(&from.file_path, dep, &to.file_path) {
                    edges.push(format!("- {} -> {} ({})", from.file_path, to.file_path, dep));
                }
            }
        }
    }
    if !edges.is_empty() {
        out.push_str("\n## Edges\n");
        out.push_str(&edges.join("\n"));
        out.push('\n');
    }
    out
}

/// Whether import `dep` written in `from` refers to the file at `target`.
fn resolves_to(from: &str, dep: &str, target: &str) -> bool {
    let target_stem = strip_extension(target);

    if dep.starts_with("./") || dep.starts_with("../") {
        let base = Path::new(from).parent().unwrap_or_else(|| Path::new(""));
        let resolved = normalize(&base.join(dep));
        let resolved = strip_extension(&resolved);
        return target_stem == resolved || target_stem == format!("{}/index", resolved);
    }

    // Module-style references: `app.models`, `crate::auth::token`, `pkg/auth`
    let segments: Vec<&str> = dep
        .split(|c: char| c == '.' || c == ':' || c == '/')
        .filter(|s| !s.is_empty() && *s != "crate" && *s != "self" && *s != "super")
        .collect();
    let Some(last) = segments.last() else {
        return false;
    };
    let file_stem = Path::new(&target_stem)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");
    if file_stem == *last {
        return true;
    }
    // `use crate::auth::Token` names a symbol inside `auth`
    segments.len() >= 2 && file_stem == segments[segments.len() - 2]
}

fn strip_extension(path: &str) -> String {
    let p = Path::new(path);
    match (p.parent(), p.file_stem().and_then(|s| s.to_str())) {
        (Some(parent), Some(stem)) if !parent.as_os_str().is_empty() => {
            format!("{}/{}", parent.to_string_lossy(), stem)
        }
        (_, Some(stem)) => stem.to_string(),
        _ => path.to_string(),
    }
}

fn normalize(path: &Path) -> String {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::{result, MockGenerator};
    use crate::{QueryOptions, QueryType, SubQuery};

    fn plan(strategy: SynthesisStrategy) -> QueryPlan {
        let mut plan = QueryPlan::fallback("Find authentication patterns", &QueryOptions::default());
        plan.synthesis_strategy = strategy;
        plan.sub_queries.push(SubQuery {
            query_id: "q2".to_string(),
            query_text: "auth docs".to_string(),
            query_type: QueryType::Documentation,
            filters: Default::default(),
        });
        plan
    }

    fn results() -> QueryResults {
        let mut login = result("src/auth/login.ts", "export function login() {}", 0.9);
        login.dependencies = vec!["./crypto".to_string(), "jsonwebtoken".to_string()];
        login.exports = vec!["login".to_string()];
        let mut crypto = result("src/auth/crypto.ts", "export function hash() {}", 0.7);
        crypto.exports = vec!["hash".to_string()];

        let mut map = QueryResults::new();
        map.insert("q1".to_string(), vec![login.clone(), crypto]);
        map.insert("q2".to_string(), vec![result("docs/auth.md", "# Auth", 0.8), login]);
        map
    }

    #[test]
    fn test_concatenate_is_deterministic_and_unique() {
        let p = plan(SynthesisStrategy::Concatenate);
        let text = concatenate(&p, &results());
        assert_eq!(text, concatenate(&p, &results()));
        assert_eq!(text.matches("src/auth/login.ts").count(), 1);

        let login = text.find("src/auth/login.ts").unwrap();
        let crypto = text.find("src/auth/crypto.ts").unwrap();
        let docs = text.find("docs/auth.md").unwrap();
        assert!(login < crypto && crypto < docs);
        assert!(text.contains("export function hash() {}"));
    }

    #[test]
    fn test_concatenate_keeps_distinct_content_per_file() {
        let p = plan(SynthesisStrategy::Concatenate);
        let mut map = QueryResults::new();
        map.insert("q1".to_string(), vec![result("a.ts", "export const token = sign(user);", 0.9)]);
        map.insert("q2".to_string(), vec![result("a.ts", "Signs a JWT for the user.", 0.8)]);

        let text = concatenate(&p, &map);
        assert_eq!(
            text,
            "// File: a.ts\nexport const token = sign(user);\n\n---\n\n// File: a.ts\nSigns a JWT for the user."
        );
        assert_eq!(dependency_graph(&p, &map).matches("- a.ts").count(), 1);
    }

    #[tokio::test]
    async fn test_concatenate_makes_no_model_call() {
        let gen = Arc::new(MockGenerator::failing());
        let synth = Synthesizer::new(gen.clone(), 0.3);
        let p = plan(SynthesisStrategy::Concatenate);
        assert_eq!(synth.synthesize(&p, &results()).await, concatenate(&p, &results()));
        assert_eq!(gen.calls(), 0);
    }

    #[tokio::test]
    async fn test_model_strategies_use_generator() {
        let gen = Arc::new(
            MockGenerator::new()
                .respond_to("concise Markdown summary", "## Summary\nLogin signs JWTs.")
                .respond_to("Describe the architecture", "login depends on crypto")
                .respond_to("hierarchy of Markdown headings", "# Overview\n## Login"),
        );
        let synth = Synthesizer::new(gen.clone(), 0.3);

        let summary = synth.synthesize(&plan(SynthesisStrategy::Summarize), &results()).await;
        assert_eq!(summary, "## Summary\nLogin signs JWTs.");

        let graph = synth.synthesize(&plan(SynthesisStrategy::GraphBased), &results()).await;
        assert_eq!(graph, "login depends on crypto");
        let graph_prompt = &gen.prompts()[1];
        assert!(graph_prompt.contains("- src/auth/login.ts -> src/auth/crypto.ts (./crypto)"));

        let tree = synth.synthesize(&plan(SynthesisStrategy::Hierarchical), &results()).await;
        assert!(tree.starts_with("# Overview"));
        assert_eq!(gen.calls(), 3);
    }

    #[tokio::test]
    async fn test_failures_fall_back_to_concatenation() {
        let failing = Synthesizer::new(Arc::new(MockGenerator::failing()), 0.3);
        let blank = Synthesizer::new(
            Arc::new(MockGenerator::new().respond_to("Request:", "   \n")),
            0.3,
        );
        for strategy in [
            SynthesisStrategy::Summarize,
            SynthesisStrategy::GraphBased,
            SynthesisStrategy::Hierarchical,
        ] {
            let p = plan(strategy);
            let expected = concatenate(&p, &results());
            assert_eq!(failing.synthesize(&p, &results()).await, expected);
            assert_eq!(blank.synthesize(&p, &results()).await, expected);
        }
    }

    #[tokio::test]
    async fn test_empty_results_skip_model() {
        let gen = Arc::new(MockGenerator::new().respond_to("Request:", "should not be used"));
        let synth = Synthesizer::new(gen.clone(), 0.3);
        let mut empty = QueryResults::new();
        empty.insert("q1".to_string(), vec![]);

        let text = synth.synthesize(&plan(SynthesisStrategy::Summarize), &empty).await;
        assert!(text.is_empty());
        assert_eq!(gen.calls(), 0);
    }

    #[test]
    fn test_resolves_to() {
        assert!(resolves_to("src/auth/login.ts", "./crypto", "src/auth/crypto.ts"));
        assert!(resolves_to("src/auth/login.ts", "../db", "src/db/index.ts"));
        assert!(resolves_to("app/views.py", "app.models", "app/models.py"));
        assert!(resolves_to("src/main.rs", "crate::auth::Token", "src/auth.rs"));
        assert!(!resolves_to("src/auth/login.ts", "jsonwebtoken", "src/auth/crypto.ts"));
        assert!(!resolves_to("src/auth/login.ts", "./crypto", "lib/crypto.ts"));
    }
}
