//! File-backed review source.
//!
//! Accepts three layouts: a saved GraphQL response, a bare array of
//! reviews, or an object mapping coaster identifiers to review arrays.

use super::{into_raw_reviews, ApiReview, ReviewSource, ReviewsResponse};
use crate::error::FetchError;
use crate::models::RawReview;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

/// Keys that mark an object as a GraphQL response rather than a coaster map.
const RESPONSE_KEYS: [&str; 3] = ["data", "errors", "extensions"];

enum ReviewFile {
    List(Vec<ApiReview>),
    ByCoaster(HashMap<String, Vec<ApiReview>>),
    Response(ReviewsResponse),
}

impl ReviewFile {
    fn parse(content: &str) -> Result<Self, FetchError> {
        let value: Value = serde_json::from_str(content)?;

        let file = match value {
            Value::Array(_) => ReviewFile::List(serde_json::from_value(value)?),
            Value::Object(ref map) if RESPONSE_KEYS.iter().any(|k| map.contains_key(*k)) => {
                ReviewFile::Response(serde_json::from_value(value)?)
            }
            _ => ReviewFile::ByCoaster(serde_json::from_value(value)?),
        };

        Ok(file)
    }
}

/// Reads reviews from a JSON file on each fetch.
pub struct FileReviewSource {
    path: PathBuf,
}

impl FileReviewSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ReviewSource for FileReviewSource {
    async fn fetch_reviews(&self, coaster_url: &str) -> Result<Vec<RawReview>, FetchError> {
        debug!(
            "Reading reviews for {} from {}",
            coaster_url,
            self.path.display()
        );

        let content =
            tokio::fs::read_to_string(&self.path)
                .await
                .map_err(|source| FetchError::Io {
                    path: self.path.display().to_string(),
                    source,
                })?;

        match ReviewFile::parse(&content)? {
            ReviewFile::List(reviews) => into_raw_reviews(reviews),
            ReviewFile::ByCoaster(mut by_coaster) => {
                let reviews =
                    by_coaster
                        .remove(coaster_url)
                        .ok_or_else(|| FetchError::MissingData {
                            coaster_url: coaster_url.to_string(),
                        })?;
                into_raw_reviews(reviews)
            }
            ReviewFile::Response(response) => response.into_reviews(coaster_url),
        }
    }
}
