//! coaster-reviews - review summaries for roller coasters
//!
//! A CLI that fetches the reviews for one or more coasters from a GraphQL
//! endpoint (or a saved JSON file) and renders the average rating, review
//! count and keyword tag shares.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (config, output, invalid arguments)
//!   2 - At least one coaster's reviews could not be loaded

mod analysis;
mod cli;
mod config;
mod error;
mod models;
mod report;
mod section;
mod source;

use analysis::{AggregateOptions, Aggregator};
use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use report::{RenderOptions, SectionReport};
use section::ReviewSummarySection;
use source::{FileReviewSource, GraphQlReviewSource, ReviewSource};
use std::io::IsTerminal;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args)?;

    info!("coaster-reviews v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default config file.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "{} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("Created {} with default settings.", CONFIG_FILE_NAME);
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) -> Result<()> {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Fetch, summarize and render every requested coaster. Returns the exit code.
async fn run(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate().context("Invalid configuration")?;

    let source = build_source(&args, &config)?;
    let aggregator = Aggregator::new(AggregateOptions::from(&config.aggregation));
    debug!("Aggregation options: {:?}", aggregator.options());

    let progress = if args.quiet || !std::io::stderr().is_terminal() {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(args.coaster.len() as u64);
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} Fetching reviews [{pos}/{len}] {msg}")?,
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    };

    // Each coaster gets its own section; `buffered` keeps input order
    let sections: Vec<SectionReport> = stream::iter(args.coaster.iter())
        .map(|coaster_url| {
            let source = source.as_ref();
            let aggregator = aggregator.clone();
            let progress = progress.clone();
            async move {
                let report = load_section(source, aggregator, coaster_url).await;
                progress.set_message(coaster_url.clone());
                progress.inc(1);
                report
            }
        })
        .buffered(config.general.concurrency)
        .collect()
        .await;

    progress.finish_and_clear();

    let options = RenderOptions::from(&config);
    let output = match args.format {
        OutputFormat::Text => report::generate_text_report(&sections, &options),
        OutputFormat::Markdown => report::generate_markdown_report(&sections, &options),
        OutputFormat::Json => report::generate_json_report(&sections, &options)?,
    };

    match args.output {
        Some(ref path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("Failed to write summary to {}", path.display()))?;
            info!("Summary saved to {}", path.display());
        }
        None => print!("{}", output),
    }

    let failed = sections
        .iter()
        .filter(|s| matches!(s.state, models::SectionState::Failed(_)))
        .count();

    if failed > 0 {
        warn!("{} of {} coasters could not be loaded", failed, sections.len());
        return Ok(2);
    }

    Ok(0)
}

/// Pick the review source: a saved file when given, otherwise the endpoint.
fn build_source(args: &Args, config: &Config) -> Result<Box<dyn ReviewSource>> {
    if let Some(ref input) = args.input {
        info!("Reading reviews from {}", input.display());
        return Ok(Box::new(FileReviewSource::new(input.clone())));
    }

    let source = GraphQlReviewSource::new(
        config.endpoint.url.clone(),
        config.endpoint.timeout_seconds,
    )
    .context("Failed to create HTTP client")?;
    debug!("GraphQL source ready at {}", source.endpoint());

    Ok(Box::new(source))
}

/// Load one coaster into a fresh section and snapshot its final state.
async fn load_section(
    source: &dyn ReviewSource,
    aggregator: Aggregator,
    coaster_url: &str,
) -> SectionReport {
    let mut section = ReviewSummarySection::new(aggregator);
    section.load(source, coaster_url).await;

    let state = section.state().clone();
    if let Some(summary) = state.summary() {
        debug!(
            "{}: {} reviews, {} tags",
            coaster_url,
            summary.count,
            summary.tag_stats.len()
        );
    }

    SectionReport {
        coaster_url: coaster_url.to_string(),
        fetched_at: Utc::now(),
        state,
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
