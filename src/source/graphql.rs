//! GraphQL-backed review source.

use super::{ReviewSource, ReviewsResponse};
use crate::error::FetchError;
use crate::models::RawReview;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Query for every review of one coaster.
const REVIEWS_QUERY: &str = r#"query CoasterReviews($coasterUrl: String!) {
  reviews(coasterUrl: $coasterUrl) {
    title
    body
    rating
    reviewTags {
      tag
    }
  }
}"#;

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'static str,
    variables: ReviewsVariables<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReviewsVariables<'a> {
    coaster_url: &'a str,
}

/// Loads reviews from a GraphQL endpoint.
pub struct GraphQlReviewSource {
    endpoint: String,
    http_client: reqwest::Client,
}

impl GraphQlReviewSource {
    /// Create a source for `endpoint` with the given request timeout.
    pub fn new(endpoint: impl Into<String>, timeout_seconds: u64) -> Result<Self, FetchError> {
        let endpoint = endpoint.into();
        info!("Using review endpoint {}", endpoint);

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;

        Ok(Self {
            endpoint,
            http_client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ReviewSource for GraphQlReviewSource {
    async fn fetch_reviews(&self, coaster_url: &str) -> Result<Vec<RawReview>, FetchError> {
        debug!("Requesting reviews for {}", coaster_url);

        let request = GraphQlRequest {
            query: REVIEWS_QUERY,
            variables: ReviewsVariables { coaster_url },
        };

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("Review endpoint returned {} for {}", status, coaster_url);
            // GraphQL servers often put the real reason in an error body
            if let Ok(parsed) = serde_json::from_str::<ReviewsResponse>(&body) {
                if let Err(err @ FetchError::GraphQl(_)) = parsed.into_reviews(coaster_url) {
                    return Err(err);
                }
            }
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let parsed: ReviewsResponse = serde_json::from_str(&body)?;
        let reviews = parsed.into_reviews(coaster_url)?;

        debug!("Received {} reviews for {}", reviews.len(), coaster_url);
        Ok(reviews)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn source_for(server: &MockServer) -> GraphQlReviewSource {
        GraphQlReviewSource::new(format!("{}/graphql", server.uri()), 5).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_reviews_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(body_partial_json(json!({
                "variables": { "coasterUrl": "steel-vengeance" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "reviews": [
                        { "title": "Best", "body": "So good", "rating": 5, "reviewTags": [{ "tag": "fast" }] },
                        { "title": "Ok", "body": "Fine", "rating": 3, "reviewTags": [{ "tag": "fast" }, { "tag": "scary" }] }
                    ]
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let source = source_for(&server).await;
        let reviews = source.fetch_reviews("steel-vengeance").await.unwrap();

        assert_eq!(reviews.len(), 2);
        assert_eq!(reviews[1].tags, vec!["fast", "scary"]);
    }

    #[tokio::test]
    async fn test_identifier_is_sent_as_variable() {
        let server = MockServer::start().await;
        let tricky = r#"x") { secret }"#;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "query": REVIEWS_QUERY,
                "variables": { "coasterUrl": tricky }
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "data": { "reviews": [] } })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let source = source_for(&server).await;
        let reviews = source.fetch_reviews(tricky).await.unwrap();

        assert!(reviews.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_reviews_graphql_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": null,
                "errors": [{ "message": "Coaster not found" }]
            })))
            .mount(&server)
            .await;

        let source = source_for(&server).await;
        let err = source.fetch_reviews("missing").await.unwrap_err();

        assert_eq!(err.to_string(), "GraphQL errors: Coaster not found");
    }

    #[tokio::test]
    async fn test_fetch_reviews_error_status_with_graphql_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "errors": [{ "message": "Variable \"$coasterUrl\" got invalid value" }]
            })))
            .mount(&server)
            .await;

        let source = source_for(&server).await;
        let err = source.fetch_reviews("bad").await.unwrap_err();

        assert!(matches!(err, FetchError::GraphQl(_)));
    }

    #[tokio::test]
    async fn test_fetch_reviews_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&server)
            .await;

        let source = source_for(&server).await;
        let err = source.fetch_reviews("fury-325").await.unwrap_err();

        assert!(matches!(err, FetchError::Status { status: 503 }));
    }

    #[tokio::test]
    async fn test_fetch_reviews_malformed_review() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "reviews": [{ "title": "No stars", "body": "", "reviewTags": [] }] }
            })))
            .mount(&server)
            .await;

        let source = source_for(&server).await;
        let err = source.fetch_reviews("maverick").await.unwrap_err();

        assert!(matches!(err, FetchError::Malformed { field: "rating", .. }));
    }

    #[tokio::test]
    async fn test_fetch_reviews_invalid_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let source = source_for(&server).await;
        let err = source.fetch_reviews("maverick").await.unwrap_err();

        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[test]
    fn test_endpoint_accessor() {
        let source = GraphQlReviewSource::new("http://localhost:4000/graphql", 10).unwrap();
        assert_eq!(source.endpoint(), "http://localhost:4000/graphql");
    }
}
