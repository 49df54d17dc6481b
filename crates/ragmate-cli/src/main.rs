//! RagMate CLI
//!
//! Command-line interface for the RagMate agentic retrieval engine.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod walk;

#[derive(Parser)]
#[command(name = "ragmate")]
#[command(author, version, about = "Agentic retrieval over your codebase", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Index a directory and print statistics
    Index {
        /// Path to index (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Maximum stored characters per file
        #[arg(long, default_value = "8000")]
        max_chars: usize,
    },

    /// Plan, execute and synthesize a query
    Query {
        /// What you are looking for
        intent: String,

        /// Path to index (defaults to current directory)
        #[arg(short, long, default_value = ".")]
        path: PathBuf,

        /// Restrict results to a language
        #[arg(short, long)]
        language: Option<String>,

        /// Restrict results to a directory (repeatable)
        #[arg(short, long = "dir")]
        directories: Vec<String>,

        /// Maximum sub-queries executed at once
        #[arg(long, default_value = "4")]
        concurrency: usize,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,

        /// API key for the model endpoint
        #[arg(long, env = "RAGMATE_API_KEY", default_value = "", hide_env_values = true)]
        api_key: String,

        /// Model name
        #[arg(long, env = "RAGMATE_MODEL", default_value = ragmate_llm::DEFAULT_MODEL)]
        model: String,

        /// OpenAI-compatible endpoint base URL
        #[arg(long, env = "RAGMATE_ENDPOINT", default_value = ragmate_llm::DEFAULT_ENDPOINT)]
        endpoint: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "ragmate=debug" } else { "ragmate=info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Index { path, max_chars } => {
            commands::index::run(path, max_chars).await?;
        }
        Commands::Query {
            intent,
            path,
            language,
            directories,
            concurrency,
            json,
            api_key,
            model,
            endpoint,
        } => {
            let generator = ragmate_llm::GeneratorConfig::new(api_key)
                .with_model(model)
                .with_endpoint(endpoint);
            let args = commands::query::QueryArgs {
                intent,
                path,
                language,
                directories,
                concurrency,
                json,
            };
            commands::query::run(args, generator).await?;
        }
    }

    Ok(())
}
