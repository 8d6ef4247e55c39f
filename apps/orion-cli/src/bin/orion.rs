use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use orion_cli::{DryRunSink, LoaderKind, Orion};
use orion_core::config::Config;
use orion_rag::{Curator, PipelineOutcome};

#[derive(Parser)]
#[command(name = "orion", version, about = "Hybrid retrieval QA over logs, chat, PRs and PDFs")]
struct Cli {
    /// Directory holding config.toml / config.<env>.toml
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load, split and store documents in both indexes
    Ingest {
        #[arg(value_enum)]
        kind: LoaderKind,
        /// Defaults to the configured directory for `kind`
        path: Option<PathBuf>,
    },
    /// Answer a question from the indexed documents
    Ask {
        query: String,
        #[arg(long)]
        json: bool,
    },
    /// Ranked documents and citations for a question, without an answer
    Docs {
        query: String,
        #[arg(long)]
        json: bool,
    },
    /// List every stored chunk
    List,
    /// Propose documentation updates from documents (statements are printed, not executed)
    Suggest {
        #[arg(value_enum)]
        kind: LoaderKind,
        path: Option<PathBuf>,
        /// File describing the current documentation structure
        #[arg(long)]
        structure: PathBuf,
    },
    /// Delete every stored chunk
    Purge,
    /// Stored chunk count per index
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    let config = match &cli.config_dir {
        Some(dir) => Config::load_from(dir, &std::env::var("RUST_ENV").unwrap_or_else(|_| "dev".into()))?,
        None => Config::load()?,
    };
    let orion = Orion::open(config.settings()?).await?;
    tracing::debug!(offline = orion.offline(), "stores opened");

    match cli.command {
        Command::Ingest { kind, path } => {
            let docs = orion.load(kind, path.as_deref())?;
            let report = orion.ingestor().ingest(&docs).await?;
            println!(
                "Ingested {} documents into {} chunks ({} rejected, {} duplicate ids)",
                report.documents, report.chunks, report.rejected, report.duplicates
            );
            for (store, added) in &report.added { println!("  {store}: {added} new"); }
        }
        Command::Ask { query, json } => {
            let response = orion.service()?.answer(&query).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                println!("{}", response.response);
                for d in &response.documents { println!("  - {} ({})", d.source, d.time.as_deref().unwrap_or("None")); }
            }
        }
        Command::Docs { query, json } => {
            let outcome = orion.pipeline()?.run(&query).await?;
            if json {
                let docs: Vec<_> = outcome.documents().iter().collect();
                println!("{}", serde_json::to_string_pretty(&docs)?);
            } else {
                print_outcome(&outcome);
            }
        }
        Command::List => {
            for c in orion.documents().await? { println!("{}\t{}\t{}", c.id, c.time().unwrap_or("None"), c.kind().map(|k| k.as_str()).unwrap_or("-")); }
        }
        Command::Suggest { kind, path, structure } => {
            let docs = orion.load(kind, path.as_deref())?;
            let sink = Arc::new(DryRunSink::from_file(&structure)?);
            let report = Curator::new(Arc::new(orion.curator_model()), sink.clone()).curate(&docs).await?;
            for s in sink.statements() { println!("{s}"); }
            eprintln!("{} statements proposed", report.succeeded());
        }
        Command::Purge => {
            orion.ingestor().purge().await?;
            println!("Purged both indexes");
        }
        Command::Status => {
            for (store, count) in orion.ingestor().status().await? { println!("{store}: {count} chunks"); }
        }
    }
    Ok(())
}

fn print_outcome(outcome: &PipelineOutcome) {
    match outcome {
        PipelineOutcome::NoResults { .. } => println!("{}", outcome.citations()),
        PipelineOutcome::Ranked(result) => {
            for (i, d) in result.documents.iter().enumerate() {
                let score = d.relevance.map(|s| format!("{s:.3}")).unwrap_or_else(|| "-".into());
                println!("{:>2}. [{score}] {} ({})", i + 1, d.chunk.id, d.branch);
            }
            print!("{}", result.citations);
        }
    }
}
