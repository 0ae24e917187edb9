//! Review aggregation and statistics.
//!
//! This module turns a batch of raw reviews into a [`ReviewSummary`]:
//! review count, mean rating and the share of reviews carrying each tag.

use crate::config::AggregationConfig;
use crate::error::ReviewError;
use crate::models::{RawReview, ReviewSummary, TagStat};
use indexmap::IndexMap;
use std::collections::HashSet;
use tracing::debug;

/// How repeated tags inside a single review are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TagCounting {
    /// A review counts at most once per tag.
    #[default]
    PerReview,
    /// Every occurrence counts, so a tag listed twice in one review adds 2.
    /// Percentages can exceed 100 under this policy.
    PerOccurrence,
}

/// Closed range of acceptable ratings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingScale {
    pub min: f64,
    pub max: f64,
}

impl Default for RatingScale {
    fn default() -> Self {
        Self { min: 1.0, max: 5.0 }
    }
}

impl RatingScale {
    /// Whether `rating` lies within the scale, bounds included.
    pub fn contains(&self, rating: f64) -> bool {
        (self.min..=self.max).contains(&rating)
    }
}

/// Options controlling aggregation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregateOptions {
    pub tag_counting: TagCounting,
    pub scale: RatingScale,
    /// Reject ratings that are non-finite or outside `scale`.
    pub validate_ratings: bool,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            tag_counting: TagCounting::PerReview,
            scale: RatingScale::default(),
            validate_ratings: true,
        }
    }
}

impl From<&AggregationConfig> for AggregateOptions {
    fn from(config: &AggregationConfig) -> Self {
        Self {
            tag_counting: if config.count_repeated_tags {
                TagCounting::PerOccurrence
            } else {
                TagCounting::PerReview
            },
            scale: RatingScale {
                min: config.rating_min,
                max: config.rating_max,
            },
            validate_ratings: config.validate_ratings,
        }
    }
}

/// Computes review summaries under a fixed set of options.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    options: AggregateOptions,
}

impl Aggregator {
    pub fn new(options: AggregateOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &AggregateOptions {
        &self.options
    }

    /// Summarize `reviews`, validating ratings first when configured to.
    pub fn summarize(&self, reviews: &[RawReview]) -> Result<ReviewSummary, ReviewError> {
        if self.options.validate_ratings {
            validate_ratings(reviews, &self.options.scale)?;
        }

        let summary = compute(reviews, self.options.tag_counting);
        debug!(
            "Summarized {} reviews into {} tags",
            summary.count,
            summary.tag_stats.len()
        );
        Ok(summary)
    }
}

/// Summarize `reviews` with default counting and no rating validation.
#[allow(dead_code)] // Entry point for callers that trust their ratings
pub fn summarize(reviews: &[RawReview]) -> ReviewSummary {
    compute(reviews, TagCounting::PerReview)
}

/// Check every rating is finite and inside `scale`.
pub fn validate_ratings(reviews: &[RawReview], scale: &RatingScale) -> Result<(), ReviewError> {
    for (index, review) in reviews.iter().enumerate() {
        if !review.rating.is_finite() {
            return Err(ReviewError::NonFiniteRating {
                index,
                rating: review.rating,
            });
        }
        if !scale.contains(review.rating) {
            return Err(ReviewError::RatingOutOfRange {
                index,
                rating: review.rating,
                min: scale.min,
                max: scale.max,
            });
        }
    }
    Ok(())
}

fn compute(reviews: &[RawReview], counting: TagCounting) -> ReviewSummary {
    let count = reviews.len();
    if count == 0 {
        return ReviewSummary::default();
    }

    let rating_sum: f64 = reviews.iter().map(|r| r.rating).sum();
    let average_rating = rating_sum / count as f64;

    let tag_counts = count_tags(reviews, counting);
    let tag_stats = tag_counts
        .into_iter()
        .map(|(name, occurrences)| TagStat {
            name,
            percent: percent_of(occurrences, count),
        })
        .collect();

    ReviewSummary {
        count,
        average_rating,
        tag_stats,
    }
}

/// Count tags across reviews, keyed in first-seen order.
fn count_tags(reviews: &[RawReview], counting: TagCounting) -> IndexMap<String, usize> {
    let mut counts: IndexMap<String, usize> = IndexMap::new();

    for review in reviews {
        match counting {
            TagCounting::PerOccurrence => {
                for tag in &review.tags {
                    *counts.entry(tag.clone()).or_default() += 1;
                }
            }
            TagCounting::PerReview => {
                let mut seen: HashSet<&str> = HashSet::new();
                for tag in &review.tags {
                    if seen.insert(tag.as_str()) {
                        *counts.entry(tag.clone()).or_default() += 1;
                    }
                }
            }
        }
    }

    counts
}

fn percent_of(occurrences: usize, total: usize) -> u32 {
    (occurrences as f64 / total as f64 * 100.0).round() as u32
}
