//! Error types for review aggregation and review fetching.

use thiserror::Error;

/// Errors raised while turning raw reviews into a summary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReviewError {
    /// A review's rating is not a finite number.
    #[error("review #{index} has a non-numeric rating ({rating})")]
    NonFiniteRating { index: usize, rating: f64 },

    /// A review's rating falls outside the configured scale.
    #[error("review #{index} has rating {rating}, outside the {min}-{max} scale")]
    RatingOutOfRange {
        index: usize,
        rating: f64,
        min: f64,
        max: f64,
    },
}

/// Errors raised by a review source.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure talking to the endpoint.
    #[error("request to review endpoint failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("review endpoint returned HTTP {status}")]
    Status { status: u16 },

    /// The GraphQL response carried one or more errors.
    #[error("GraphQL errors: {}", .0.join("; "))]
    GraphQl(Vec<String>),

    /// The response had no `reviews` payload.
    #[error("response contained no reviews for '{coaster_url}'")]
    MissingData { coaster_url: String },

    /// A review in the payload is missing a required field.
    #[error("review #{index} is missing required field `{field}`")]
    Malformed { index: usize, field: &'static str },

    /// The payload could not be decoded.
    #[error("failed to decode review payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// A local review file could not be read.
    #[error("failed to read review file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
