//! Review sources.
//!
//! A review source resolves a coaster identifier to its reviews. The
//! GraphQL source talks to the review API; the file source reads a saved
//! response for offline runs.

pub mod file;
pub mod graphql;

use crate::error::FetchError;
use crate::models::RawReview;
use async_trait::async_trait;
use serde::Deserialize;

pub use file::FileReviewSource;
pub use graphql::GraphQlReviewSource;

/// Anything that can load the reviews for a coaster.
#[async_trait]
pub trait ReviewSource: Send + Sync {
    /// Fetch every review for the coaster identified by `coaster_url`.
    async fn fetch_reviews(&self, coaster_url: &str) -> Result<Vec<RawReview>, FetchError>;
}

/// A review as it appears on the wire. Required fields are optional here so
/// that missing ones can be reported instead of failing the whole decode.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiReview {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    rating: Option<f64>,
    #[serde(default)]
    review_tags: Option<Vec<ApiReviewTag>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiReviewTag {
    tag: String,
}

/// GraphQL response envelope for the reviews query.
#[derive(Debug, Deserialize)]
pub(crate) struct ReviewsResponse {
    #[serde(default)]
    data: Option<ReviewsData>,
    #[serde(default)]
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct ReviewsData {
    #[serde(default)]
    reviews: Option<Vec<ApiReview>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

impl ReviewsResponse {
    /// Extract the reviews, surfacing GraphQL errors and missing data.
    pub(crate) fn into_reviews(self, coaster_url: &str) -> Result<Vec<RawReview>, FetchError> {
        if let Some(errors) = self.errors.filter(|e| !e.is_empty()) {
            return Err(FetchError::GraphQl(
                errors.into_iter().map(|e| e.message).collect(),
            ));
        }

        let reviews = self
            .data
            .and_then(|d| d.reviews)
            .ok_or_else(|| FetchError::MissingData {
                coaster_url: coaster_url.to_string(),
            })?;

        into_raw_reviews(reviews)
    }
}

/// Convert wire reviews into validated records.
pub(crate) fn into_raw_reviews(reviews: Vec<ApiReview>) -> Result<Vec<RawReview>, FetchError> {
    reviews
        .into_iter()
        .enumerate()
        .map(|(index, review)| {
            let rating = review.rating.ok_or(FetchError::Malformed {
                index,
                field: "rating",
            })?;
            let tags = review.review_tags.ok_or(FetchError::Malformed {
                index,
                field: "reviewTags",
            })?;

            Ok(RawReview {
                title: review.title.unwrap_or_default(),
                body: review.body.unwrap_or_default(),
                rating,
                tags: tags.into_iter().map(|t| t.tag).collect(),
            })
        })
        .collect()
}
