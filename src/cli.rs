//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// coaster-reviews - review summaries for roller coasters
///
/// Fetches every review for one or more coasters and prints the average
/// rating, review count and how many reviewers used each keyword tag.
///
/// Examples:
///   coaster-reviews --coaster steel-vengeance
///   coaster-reviews --coaster fury-325 --coaster maverick --format markdown
///   coaster-reviews --coaster steel-vengeance --input saved.json --format json
///   coaster-reviews --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Coaster identifier (its URL slug). Repeat for several coasters.
    #[arg(
        short = 'C',
        long,
        value_name = "URL",
        required_unless_present = "init_config"
    )]
    pub coaster: Vec<String>,

    /// GraphQL endpoint serving reviews
    ///
    /// Can also be set via COASTER_REVIEWS_ENDPOINT or .coaster-reviews.toml.
    #[arg(short, long, value_name = "URL", env = "COASTER_REVIEWS_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Read reviews from a saved JSON file instead of the endpoint
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Output format (text, markdown, json)
    #[arg(short, long, default_value = "text", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Write the summary to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .coaster-reviews.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Width in pixels of a tag bar at 100%
    #[arg(long, value_name = "PX")]
    pub tag_bar_max_width: Option<f64>,

    /// Count a tag each time it appears, even twice in one review
    #[arg(long)]
    pub count_repeated_tags: bool,

    /// Accept ratings outside the configured scale
    #[arg(long)]
    pub no_validate_ratings: bool,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Number of coasters fetched at the same time
    #[arg(long, value_name = "NUM")]
    pub concurrency: Option<usize>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only, no spinner)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .coaster-reviews.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Plain text with bars (default)
    #[default]
    Text,
    /// Markdown format
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.coaster.is_empty() {
            return Err("At least one --coaster is required".to_string());
        }

        if let Some(blank) = self.coaster.iter().find(|c| c.trim().is_empty()) {
            return Err(format!("Coaster identifier must not be blank: {:?}", blank));
        }

        // Endpoint is not consulted when reading from a file
        if self.input.is_none() {
            if let Some(ref endpoint) = self.endpoint {
                if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                    return Err("Endpoint URL must start with 'http://' or 'https://'".to_string());
                }
            }
        }

        if let Some(width) = self.tag_bar_max_width {
            if width.is_nan() || width <= 0.0 {
                return Err("Tag bar width must be a positive number".to_string());
            }
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(concurrency) = self.concurrency {
            if concurrency == 0 {
                return Err("Concurrency must be at least 1".to_string());
            }
        }

        if let Some(ref input) = self.input {
            if !input.is_file() {
                return Err(format!("Input file does not exist: {}", input.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
impl Args {
    pub fn for_tests() -> Self {
        Args {
            coaster: vec!["steel-vengeance".to_string()],
            endpoint: None,
            input: None,
            format: OutputFormat::Text,
            output: None,
            config: None,
            tag_bar_max_width: None,
            count_repeated_tags: false,
            no_validate_ratings: false,
            timeout: None,
            concurrency: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }
}
