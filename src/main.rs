//! landscape - software landscape data-collection stages
//!
//! Each subcommand is one independently runnable batch stage that reads
//! the files earlier stages left under the data directory.
//!
//! ## Usage
//!
//! ```bash
//! export LANDSCAPE_ANALYSIS_GH_TOKEN=token_here
//! landscape seek
//! landscape mentions --policy legacy
//! landscape link titles.txt --threshold 90
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use landscape::{
    biorxiv::BiorxivClient,
    config::{DataPaths, DEFAULT_LINKAGE_THRESHOLD, DEFAULT_SCRNA_TOOLS_LIMIT},
    github::GithubClient,
    gscholar::{ScholarClient, ScholarOptions},
    linkage::{LinkagePolicy, RecordLinker, Scorer},
    pipeline,
};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

/// Software landscape catalog and publication-mention stages
#[derive(Parser)]
#[command(name = "landscape")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Data directory holding stage inputs and outputs
    #[arg(long, global = true, default_value = "data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the deduplicated project catalog (projects.yaml)
    Seek {
        /// scRNA-tools table export (default: <data-dir>/scRNA-Tools-tableExport-2023-10-12.csv)
        #[arg(long)]
        scrna_tools: Option<PathBuf>,

        /// Number of most cited scRNA-tools entries to include
        #[arg(long, default_value_t = DEFAULT_SCRNA_TOOLS_LIMIT)]
        scrna_limit: usize,
    },

    /// Gather publication mentions for loi-focus targets
    Mentions {
        /// Similarity threshold (0-100) for record linkage
        #[arg(long, default_value_t = DEFAULT_LINKAGE_THRESHOLD)]
        threshold: u8,

        /// Record linkage policy
        #[arg(long, value_enum, default_value = "legacy")]
        policy: LinkagePolicy,

        /// Maximum Google Scholar pages per project
        #[arg(long, default_value = "20")]
        scholar_max_pages: u32,

        /// Proxy URL for Google Scholar (e.g., http://127.0.0.1:7890)
        #[arg(long)]
        proxy: Option<String>,

        /// Google Scholar mirror site URL
        #[arg(long)]
        mirror: Option<String>,
    },

    /// Record-link a newline-delimited list of titles and print the survivors
    Link {
        /// File with one title per line
        input: PathBuf,

        /// Similarity threshold (0-100)
        #[arg(long, default_value_t = DEFAULT_LINKAGE_THRESHOLD)]
        threshold: u8,

        /// Record linkage policy
        #[arg(long, value_enum, default_value = "legacy")]
        policy: LinkagePolicy,

        /// Pair scorer
        #[arg(long, value_enum, default_value = "indel")]
        scorer: Scorer,
    },
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    if cli.log_json {
        fmt().json().with_env_filter(filter).init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .init();
    }

    let paths = DataPaths::under(&cli.data_dir);

    match cli.command {
        Commands::Seek {
            scrna_tools,
            scrna_limit,
        } => run_seek(paths, scrna_tools, scrna_limit).await,
        Commands::Mentions {
            threshold,
            policy,
            scholar_max_pages,
            proxy,
            mirror,
        } => {
            let linker = RecordLinker::new(threshold, policy)?;
            let options = ScholarOptions {
                proxy,
                base_url: mirror,
                max_pages: scholar_max_pages,
                ..Default::default()
            };
            run_mentions(paths, linker, options).await
        }
        Commands::Link {
            input,
            threshold,
            policy,
            scorer,
        } => run_link(input, threshold, policy, scorer),
    }
}

// ============================================================================
// Stages
// ============================================================================

async fn run_seek(
    mut paths: DataPaths,
    scrna_tools: Option<PathBuf>,
    scrna_limit: usize,
) -> Result<()> {
    if let Some(path) = scrna_tools {
        paths.scrna_tools = path;
    }

    let github = GithubClient::from_env()?;
    let count = pipeline::run_seek_stage(&paths, &github, scrna_limit)
        .await
        .context("seek stage failed")?;

    info!(projects = count, path = ?paths.projects, "Catalog written");
    println!("Saved {} projects to {}", count, paths.projects.display());
    Ok(())
}

async fn run_mentions(
    paths: DataPaths,
    linker: RecordLinker,
    options: ScholarOptions,
) -> Result<()> {
    let github = GithubClient::from_env()?;
    let scholar = ScholarClient::new(options)?;
    let biorxiv = BiorxivClient::new()?;

    let metrics = pipeline::run_mentions_stage(&paths, &github, &scholar, &biorxiv, &linker)
        .await
        .context("mentions stage failed")?;

    println!(
        "{:<24} {:>6} {:>14} {:>9} {:>7} {:>14}",
        "Project Name", "Year", "google_scholar", "bioarxiv", "total", "record_linked"
    );
    for m in &metrics {
        println!(
            "{:<24} {:>6} {:>14} {:>9} {:>7} {:>14}",
            m.project_name,
            m.date_created_year,
            m.google_scholar_count,
            m.bioarxiv_count,
            m.total_pub_count,
            m.total_pub_count_non_record_linked
        );
    }
    println!("Saved: {}", paths.publication_metrics.display());
    println!("Saved: {}", paths.publication_summary.display());
    Ok(())
}

fn run_link(input: PathBuf, threshold: u8, policy: LinkagePolicy, scorer: Scorer) -> Result<()> {
    let content = std::fs::read_to_string(&input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let titles: Vec<String> = content
        .lines()
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();

    let linker = RecordLinker::new(threshold, policy)?.with_scorer(scorer);
    let distinct = linker.distinct(&titles);

    info!(input = titles.len(), output = distinct.len(), policy = %policy, "Linked titles");
    for title in &distinct {
        println!("{}", title);
    }
    Ok(())
}
