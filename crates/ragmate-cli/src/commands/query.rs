//! Query command implementation.

use anyhow::Result;
use colored::Colorize;
use ragmate_core::{AgenticRagResult, AgenticRagService, QueryOptions, RagConfig, RagService};
use ragmate_llm::{GeneratorConfig, OpenAiCompatibleGenerator};
use std::path::PathBuf;
use std::sync::Arc;

use crate::walk::collect_sources;

/// Arguments of the query command.
pub struct QueryArgs {
    pub intent: String,
    pub path: PathBuf,
    pub language: Option<String>,
    pub directories: Vec<String>,
    pub concurrency: usize,
    pub json: bool,
}

/// Run the query command.
pub async fn run(args: QueryArgs, generator: GeneratorConfig) -> Result<()> {
    let collected = collect_sources(&args.path)?;
    if collected.files.is_empty() {
        eprintln!("{} No indexable files under {}", "✗".red(), args.path.display());
        return Ok(());
    }

    let generator = Arc::new(OpenAiCompatibleGenerator::new(generator)?);
    let config = RagConfig::default().with_max_concurrency(args.concurrency);
    let service = AgenticRagService::with_config(generator, config);
    service.index_codebase(&collected.files);

    let mut options = QueryOptions::default();
    if let Some(language) = args.language {
        options = options.with_language(language);
    }
    for dir in args.directories {
        options = options.with_directory(dir);
    }

    if !args.json {
        println!("{} Querying: {}", "→".blue(), args.intent.yellow());
        println!("  {} {} files indexed", "•".dimmed(), service.index_size());
        println!();
    }

    let result = service.query(&args.intent, options).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result);
    }

    Ok(())
}

fn print_result(result: &AgenticRagResult) {
    println!(
        "{} Plan {} ({})",
        "✓".green(),
        result.plan.plan_id.dimmed(),
        result.plan.synthesis_strategy.as_str().cyan()
    );
    for sub_query in &result.plan.sub_queries {
        let hits = result
            .query_results
            .get(&sub_query.query_id)
            .map(Vec::as_slice)
            .unwrap_or_default();
        println!(
            "  {} {} {}",
            format!("[{}]", sub_query.query_id).blue(),
            sub_query.query_type.as_str().dimmed(),
            sub_query.query_text
        );
        for hit in hits {
            println!(
                "      {} {}",
                format!("{:.2}", hit.relevance).green(),
                hit.file_path
            );
        }
        if hits.is_empty() {
            println!("      {}", "no results".dimmed());
        }
    }

    println!();
    if result.synthesized_context.is_empty() {
        println!("{} No context could be assembled.", "→".yellow());
    } else {
        println!("{}", result.synthesized_context);
    }

    println!();
    let score = format!("{:.2}", result.confidence_score);
    let score = if result.confidence_score >= 0.7 {
        score.green()
    } else if result.confidence_score >= 0.4 {
        score.yellow()
    } else {
        score.red()
    };
    println!("{} Confidence: {}", "✓".green(), score);
}
