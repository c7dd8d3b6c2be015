//! Pairbench runner
//!
//! Computes ground truths, judges answers, and replays recorded model
//! answers through the benchmark harness.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use pairbench::{
    builtin_catalog, evaluate, evaluate_answer, load_catalog, load_catalogs_from_dir,
    parse_context, BenchmarkConfig, Harness, PairQuery, ReplayAnswerer, Sample,
};

#[derive(Parser)]
#[command(name = "pairbench")]
#[command(about = "OOLONG-Pairs ground truth and answer evaluation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (or set PAIRBENCH_CONFIG env var)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Query catalog file or directory (defaults to the built-in catalog)
    #[arg(long)]
    catalog: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List catalog queries
    List,

    /// Compute ground truths for a context file
    Truth {
        /// Context window text file
        context: PathBuf,

        /// Treat the context as unlabelled and infer labels from questions
        #[arg(long)]
        unlabeled: bool,

        /// Only compute this query id
        #[arg(short, long)]
        query: Option<String>,
    },

    /// Judge a single answer against a ground truth
    Judge {
        /// Ground truth text, as produced by `truth`
        #[arg(long)]
        truth: String,

        /// Model answer
        #[arg(long)]
        predicted: String,

        /// Query text (used to detect counting questions)
        #[arg(long, default_value = "")]
        query: String,
    },

    /// Replay recorded answers through the benchmark
    Replay {
        /// JSONL file of samples ({id, context, labeled_context})
        #[arg(long)]
        samples: PathBuf,

        /// JSONL file of answers ({sample_id, query_id, predicted})
        #[arg(long)]
        answers: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Also print every outcome as JSONL
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = BenchmarkConfig::resolve(cli.config.as_deref())?;
    let catalog_path = cli.catalog.or_else(|| config.catalog_path.clone());
    let queries = get_queries(catalog_path.as_deref())?;

    match cli.command {
        Commands::List => {
            list_queries(&queries);
            Ok(())
        }
        Commands::Truth {
            context,
            unlabeled,
            query,
        } => print_ground_truths(&context, !unlabeled, query.as_deref(), &queries),
        Commands::Judge {
            truth,
            predicted,
            query,
        } => {
            let verdict = evaluate_answer(&predicted, &truth, &query);
            println!("{}", serde_json::to_string_pretty(&verdict)?);
            if !verdict.passed() {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Replay {
            samples,
            answers,
            json,
            verbose,
        } => replay(&samples, &answers, config, &queries, json, verbose),
    }
}

/// Load queries from a catalog file or directory, or the built-in catalog
fn get_queries(catalog: Option<&Path>) -> Result<Vec<PairQuery>> {
    let queries = match catalog {
        Some(path) if path.is_dir() => load_catalogs_from_dir(path)
            .with_context(|| format!("Failed to load catalogs from {}", path.display()))?,
        Some(path) => load_catalog(path)
            .with_context(|| format!("Failed to load catalog {}", path.display()))?,
        None => builtin_catalog().context("Built-in catalog is invalid")?,
    };
    Ok(queries)
}

fn list_queries(queries: &[PairQuery]) {
    println!("Available queries:\n");
    for q in queries {
        println!("  {} [{}]", q.id, q.predicate.kind());
        println!("    {}", q.query);
    }
}

fn print_ground_truths(
    context_path: &Path,
    labeled: bool,
    only: Option<&str>,
    queries: &[PairQuery],
) -> Result<()> {
    let context = std::fs::read_to_string(context_path)
        .with_context(|| format!("Failed to read context: {}", context_path.display()))?;
    let corpus = parse_context(&context, labeled);
    println!(
        "Parsed {} users ({} instances)\n",
        corpus.len(),
        corpus.instance_count()
    );

    let selected: Vec<&PairQuery> = queries
        .iter()
        .filter(|q| only.map_or(true, |id| q.id == id))
        .collect();
    if selected.is_empty() {
        anyhow::bail!("No query matches {}", only.unwrap_or("the catalog"));
    }

    for query in selected {
        println!("{}: {}", query.id, evaluate(&corpus, query));
    }
    Ok(())
}

fn replay(
    samples_path: &Path,
    answers_path: &Path,
    config: BenchmarkConfig,
    queries: &[PairQuery],
    json: bool,
    verbose: bool,
) -> Result<()> {
    let samples = load_samples(samples_path)?;
    let answers = std::fs::read_to_string(answers_path)
        .with_context(|| format!("Failed to read answers: {}", answers_path.display()))?;
    let answerer = ReplayAnswerer::from_jsonl(&answers)?;

    let mut harness = Harness::new(answerer, config);
    let report = harness.run(&samples, queries);

    if verbose {
        print!("{}", report.outcomes_jsonl()?);
    }
    if json {
        println!("{}", report.to_json()?);
    } else {
        report.print_summary();
    }
    Ok(())
}

fn load_samples(path: &Path) -> Result<Vec<Sample>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read samples: {}", path.display()))?;
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("Invalid sample on line {} of {}", i + 1, path.display()))
        })
        .collect()
}
