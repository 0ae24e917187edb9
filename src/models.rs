//! Data models for coaster review summaries.
//!
//! This module contains the review records handed over by a review source,
//! the summary computed from them, and the state a summary section is in.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single review as delivered by a review source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawReview {
    /// Review headline.
    pub title: String,
    /// Review text.
    pub body: String,
    /// Star rating given by the reviewer.
    pub rating: f64,
    /// Keyword tags attached by the reviewer, in the order given.
    pub tags: Vec<String>,
}

#[cfg(test)]
impl RawReview {
    /// Creates a review with empty title and body.
    pub fn rated(rating: f64, tags: &[&str]) -> Self {
        Self {
            title: String::new(),
            body: String::new(),
            rating,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// Share of reviewers that used a tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagStat {
    /// Tag label.
    pub name: String,
    /// Percentage of reviews carrying the tag, rounded to the nearest integer.
    pub percent: u32,
}

impl TagStat {
    /// Width of the tag's bar for a given maximum width.
    pub fn bar_width(&self, max_width: f64) -> f64 {
        f64::from(self.percent) / 100.0 * max_width
    }

    /// Hover text for the tag's bar.
    pub fn tooltip(&self) -> String {
        format!("{}% of reviewers tagged {}", self.percent, self.name)
    }
}

/// Summary statistics for one coaster's reviews.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewSummary {
    /// Number of reviews.
    pub count: usize,
    /// Mean rating. Only meaningful when `count > 0`.
    pub average_rating: f64,
    /// Tag shares in first-seen order.
    pub tag_stats: Vec<TagStat>,
}

impl ReviewSummary {
    /// Whether there is at least one rating to average.
    pub fn has_ratings(&self) -> bool {
        self.count > 0
    }
}

/// What a review summary section currently shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "detail", rename_all = "lowercase")]
pub enum SectionState {
    /// No summary has been computed yet for the current request.
    Loading,
    /// Summary computed from the most recent fetch.
    Loaded(ReviewSummary),
    /// The most recent fetch or aggregation failed.
    Failed(String),
}

impl SectionState {
    /// Whether a summary is available.
    #[allow(dead_code)] // Used by renderers that only care about loaded/not
    pub fn is_loaded(&self) -> bool {
        matches!(self, SectionState::Loaded(_))
    }

    /// The summary, if loaded.
    pub fn summary(&self) -> Option<&ReviewSummary> {
        match self {
            SectionState::Loaded(summary) => Some(summary),
            _ => None,
        }
    }
}

impl fmt::Display for SectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionState::Loading => write!(f, "loading"),
            SectionState::Loaded(summary) => write!(f, "loaded ({} reviews)", summary.count),
            SectionState::Failed(message) => write!(f, "failed: {}", message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_width_scales_with_percent() {
        let tag = TagStat {
            name: "fast".to_string(),
            percent: 90,
        };
        assert_eq!(tag.bar_width(100.0), 90.0);
        assert_eq!(tag.bar_width(200.0), 180.0);
        assert_eq!(tag.bar_width(0.0), 0.0);
    }

    #[test]
    fn test_tooltip() {
        let tag = TagStat {
            name: "scary".to_string(),
            percent: 50,
        };
        assert_eq!(tag.tooltip(), "50% of reviewers tagged scary");
    }

    #[test]
    fn test_has_ratings() {
        assert!(!ReviewSummary::default().has_ratings());

        let summary = ReviewSummary {
            count: 1,
            average_rating: 4.0,
            tag_stats: vec![],
        };
        assert!(summary.has_ratings());
    }

    #[test]
    fn test_section_state_accessors() {
        assert!(!SectionState::Loading.is_loaded());
        assert!(SectionState::Loading.summary().is_none());

        let loaded = SectionState::Loaded(ReviewSummary::default());
        assert!(loaded.is_loaded());
        assert_eq!(loaded.summary(), Some(&ReviewSummary::default()));

        let failed = SectionState::Failed("boom".to_string());
        assert!(!failed.is_loaded());
        assert_eq!(failed.to_string(), "failed: boom");
    }

    #[test]
    fn test_section_state_serializes_tagged() {
        let json = serde_json::to_value(SectionState::Loading).unwrap();
        assert_eq!(json["state"], "loading");

        let json = serde_json::to_value(SectionState::Failed("x".to_string())).unwrap();
        assert_eq!(json["state"], "failed");
        assert_eq!(json["detail"], "x");
    }
}
