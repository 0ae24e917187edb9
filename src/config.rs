//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.coaster-reviews.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file name, looked up in the current directory.
pub const CONFIG_FILE_NAME: &str = ".coaster-reviews.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Review endpoint settings.
    #[serde(default)]
    pub endpoint: EndpointConfig,

    /// Aggregation settings.
    #[serde(default)]
    pub aggregation: AggregationConfig,

    /// Display settings.
    #[serde(default)]
    pub display: DisplayConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Number of coasters fetched at the same time.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

fn default_concurrency() -> usize {
    4
}

/// GraphQL endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// GraphQL endpoint URL.
    #[serde(default = "default_endpoint_url")]
    pub url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: default_endpoint_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_endpoint_url() -> String {
    "http://localhost:4000/graphql".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Review aggregation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Count a tag every time it appears, even repeatedly within one review.
    #[serde(default)]
    pub count_repeated_tags: bool,

    /// Reject ratings outside `rating_min..=rating_max`.
    #[serde(default = "default_true")]
    pub validate_ratings: bool,

    /// Lowest valid rating.
    #[serde(default = "default_rating_min")]
    pub rating_min: f64,

    /// Highest valid rating, also shown as "out of N".
    #[serde(default = "default_rating_max")]
    pub rating_max: f64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            count_repeated_tags: false,
            validate_ratings: true,
            rating_min: default_rating_min(),
            rating_max: default_rating_max(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_rating_min() -> f64 {
    1.0
}

fn default_rating_max() -> f64 {
    5.0
}

/// Rendering settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Width in pixels of a tag bar at 100%.
    #[serde(default = "default_tag_bar_max_width")]
    pub tag_bar_max_width: f64,

    /// Pixels per terminal cell when drawing bars as text.
    #[serde(default = "default_pixels_per_cell")]
    pub pixels_per_cell: f64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            tag_bar_max_width: default_tag_bar_max_width(),
            pixels_per_cell: default_pixels_per_cell(),
        }
    }
}

fn default_tag_bar_max_width() -> f64 {
    100.0
}

fn default_pixels_per_cell() -> f64 {
    4.0
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load configuration from `dir`.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// Only explicitly provided values override.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref endpoint) = args.endpoint {
            self.endpoint.url = endpoint.clone();
        }
        if let Some(timeout) = args.timeout {
            self.endpoint.timeout_seconds = timeout;
        }
        if let Some(concurrency) = args.concurrency {
            self.general.concurrency = concurrency;
        }
        if let Some(width) = args.tag_bar_max_width {
            self.display.tag_bar_max_width = width;
        }

        // Flags always override
        if args.count_repeated_tags {
            self.aggregation.count_repeated_tags = true;
        }
        if args.no_validate_ratings {
            self.aggregation.validate_ratings = false;
        }
    }

    /// Check values the rest of the program relies on.
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.timeout_seconds == 0 {
            anyhow::bail!("timeout_seconds must be at least 1");
        }
        if !self.aggregation.rating_min.is_finite() || !self.aggregation.rating_max.is_finite() {
            anyhow::bail!("rating_min and rating_max must be finite numbers");
        }
        if self.aggregation.rating_min > self.aggregation.rating_max {
            anyhow::bail!(
                "rating_min ({}) must not exceed rating_max ({})",
                self.aggregation.rating_min,
                self.aggregation.rating_max
            );
        }
        if self.display.tag_bar_max_width.is_nan() || self.display.tag_bar_max_width <= 0.0 {
            anyhow::bail!("tag_bar_max_width must be positive");
        }
        if self.display.pixels_per_cell.is_nan() || self.display.pixels_per_cell <= 0.0 {
            anyhow::bail!("pixels_per_cell must be positive");
        }
        if self.general.concurrency == 0 {
            anyhow::bail!("concurrency must be at least 1");
        }
        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
