//! Review summary section state.
//!
//! A section shows the summary for one coaster at a time. Each request
//! bumps a generation counter and hands out a [`FetchTicket`]; a result is
//! only applied when its ticket is still the latest, so a slow response for
//! a previous coaster can never overwrite the current one.

use crate::analysis::Aggregator;
use crate::error::FetchError;
use crate::models::{RawReview, SectionState};
use crate::source::ReviewSource;
use tracing::{debug, info, warn};

/// Proof of a pending request. Consumed when its result is applied.
#[derive(Debug, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    coaster_url: String,
}

impl FetchTicket {
    pub fn coaster_url(&self) -> &str {
        &self.coaster_url
    }
}

/// Owns the summary state for one section.
#[derive(Debug)]
pub struct ReviewSummarySection {
    aggregator: Aggregator,
    coaster_url: Option<String>,
    generation: u64,
    state: SectionState,
}

impl ReviewSummarySection {
    pub fn new(aggregator: Aggregator) -> Self {
        Self {
            aggregator,
            coaster_url: None,
            generation: 0,
            state: SectionState::Loading,
        }
    }

    pub fn state(&self) -> &SectionState {
        &self.state
    }

    /// Coaster of the most recent request.
    #[allow(dead_code)] // Accessor for long-lived sections
    pub fn coaster_url(&self) -> Option<&str> {
        self.coaster_url.as_deref()
    }

    /// Start a request for `coaster_url`, superseding any pending one.
    pub fn begin(&mut self, coaster_url: &str) -> FetchTicket {
        self.generation += 1;
        self.coaster_url = Some(coaster_url.to_string());
        self.state = SectionState::Loading;

        debug!(
            "Section request #{} for {}",
            self.generation, coaster_url
        );

        FetchTicket {
            generation: self.generation,
            coaster_url: coaster_url.to_string(),
        }
    }

    /// Apply a fetch result. Returns `false` and leaves state untouched when
    /// `ticket` has been superseded by a later [`begin`](Self::begin).
    pub fn resolve(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<RawReview>, FetchError>,
    ) -> bool {
        if ticket.generation != self.generation {
            debug!(
                "Discarding stale result for {} (request #{}, current #{})",
                ticket.coaster_url(),
                ticket.generation,
                self.generation
            );
            return false;
        }

        self.state = match result {
            Ok(reviews) => match self.aggregator.summarize(&reviews) {
                Ok(summary) => {
                    info!(
                        "Loaded {} reviews for {}",
                        summary.count,
                        ticket.coaster_url()
                    );
                    SectionState::Loaded(summary)
                }
                Err(e) => {
                    warn!(
                        "Could not summarize reviews for {}: {}",
                        ticket.coaster_url(),
                        e
                    );
                    SectionState::Failed(e.to_string())
                }
            },
            Err(e) => {
                warn!("Could not fetch reviews for {}: {}", ticket.coaster_url(), e);
                SectionState::Failed(e.to_string())
            }
        };

        true
    }

    /// Fetch reviews for `coaster_url` from `source` and apply them.
    pub async fn load<S>(&mut self, source: &S, coaster_url: &str) -> &SectionState
    where
        S: ReviewSource + ?Sized,
    {
        let ticket = self.begin(coaster_url);
        let result = source.fetch_reviews(coaster_url).await;
        self.resolve(ticket, result);
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AggregateOptions, TagCounting};
    use crate::models::TagStat;
    use async_trait::async_trait;
    use futures::stream::{FuturesUnordered, StreamExt};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// In-memory source with an optional per-coaster delay.
    #[derive(Default)]
    struct StubSource {
        reviews: HashMap<String, Vec<RawReview>>,
        delays: HashMap<String, Duration>,
        calls: AtomicUsize,
    }

    impl StubSource {
        fn with(mut self, coaster_url: &str, reviews: Vec<RawReview>) -> Self {
            self.reviews.insert(coaster_url.to_string(), reviews);
            self
        }

        fn delayed(mut self, coaster_url: &str, millis: u64) -> Self {
            self.delays
                .insert(coaster_url.to_string(), Duration::from_millis(millis));
            self
        }
    }

    #[async_trait]
    impl ReviewSource for StubSource {
        async fn fetch_reviews(&self, coaster_url: &str) -> Result<Vec<RawReview>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delays.get(coaster_url) {
                tokio::time::sleep(*delay).await;
            }
            self.reviews
                .get(coaster_url)
                .cloned()
                .ok_or_else(|| FetchError::MissingData {
                    coaster_url: coaster_url.to_string(),
                })
        }
    }

    fn section() -> ReviewSummarySection {
        ReviewSummarySection::new(Aggregator::default())
    }

    #[test]
    fn test_new_section_is_loading() {
        let section = section();
        assert_eq!(section.state(), &SectionState::Loading);
        assert!(section.coaster_url().is_none());
    }

    #[test]
    fn test_resolve_replaces_state() {
        let mut section = section();

        let ticket = section.begin("fury-325");
        assert!(section.resolve(ticket, Ok(vec![RawReview::rated(5.0, &["tall"])])));

        let summary = section.state().summary().unwrap();
        assert_eq!(summary.count, 1);
        assert_eq!(
            summary.tag_stats,
            vec![TagStat {
                name: "tall".to_string(),
                percent: 100
            }]
        );

        let ticket = section.begin("fury-325");
        assert_eq!(section.state(), &SectionState::Loading);
        assert!(section.resolve(ticket, Ok(vec![])));
        assert_eq!(section.state().summary().unwrap().count, 0);
    }

    #[test]
    fn test_stale_ticket_is_discarded() {
        let mut section = section();

        let stale = section.begin("old-coaster");
        let current = section.begin("new-coaster");
        assert_eq!(current.coaster_url(), "new-coaster");

        assert!(!section.resolve(stale, Ok(vec![RawReview::rated(1.0, &[])])));
        assert_eq!(section.state(), &SectionState::Loading);

        assert!(section.resolve(current, Ok(vec![RawReview::rated(5.0, &[])])));
        assert_eq!(section.state().summary().unwrap().average_rating, 5.0);
        assert_eq!(section.coaster_url(), Some("new-coaster"));
    }

    #[test]
    fn test_stale_result_after_current_does_not_overwrite() {
        let mut section = section();

        let stale = section.begin("old-coaster");
        let current = section.begin("new-coaster");

        assert!(section.resolve(current, Ok(vec![RawReview::rated(4.0, &["smooth"])])));
        assert!(!section.resolve(stale, Err(FetchError::Status { status: 500 })));

        assert_eq!(section.state().summary().unwrap().average_rating, 4.0);
    }

    #[test]
    fn test_fetch_error_is_surfaced() {
        let mut section = section();

        let ticket = section.begin("maverick");
        section.resolve(ticket, Err(FetchError::Status { status: 502 }));

        assert!(matches!(section.state(), SectionState::Failed(msg) if msg.contains("502")));
    }

    #[test]
    fn test_aggregation_error_is_surfaced() {
        let mut section = section();

        let ticket = section.begin("maverick");
        section.resolve(ticket, Ok(vec![RawReview::rated(9.0, &[])]));

        assert!(matches!(section.state(), SectionState::Failed(msg) if msg.contains("outside")));
    }

    #[test]
    fn test_load_uses_configured_counting() {
        let source = StubSource::default().with(
            "el-toro",
            vec![RawReview::rated(4.0, &["scary", "scary"])],
        );
        let mut section = ReviewSummarySection::new(Aggregator::new(AggregateOptions {
            tag_counting: TagCounting::PerOccurrence,
            ..AggregateOptions::default()
        }));

        let state = tokio_test::block_on(section.load(&source, "el-toro"));

        assert_eq!(state.summary().unwrap().tag_stats[0].percent, 200);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_load_missing_coaster_fails() {
        let source = StubSource::default();
        let mut section = section();

        let state = tokio_test::block_on(section.load(&source, "nowhere"));

        assert!(matches!(state, SectionState::Failed(_)));
    }

    #[tokio::test]
    async fn test_out_of_order_arrival_keeps_latest_request() {
        let source = StubSource::default()
            .with("old-coaster", vec![RawReview::rated(1.0, &["rough"])])
            .with("new-coaster", vec![RawReview::rated(5.0, &["smooth"])])
            .delayed("old-coaster", 60)
            .delayed("new-coaster", 5);
        let mut section = section();

        let mut pending = FuturesUnordered::new();
        for coaster in ["old-coaster", "new-coaster"] {
            let ticket = section.begin(coaster);
            let source = &source;
            pending.push(async move {
                let result = source.fetch_reviews(ticket.coaster_url()).await;
                (ticket, result)
            });
        }

        let mut applied = Vec::new();
        while let Some((ticket, result)) = pending.next().await {
            let coaster = ticket.coaster_url().to_string();
            applied.push((coaster, section.resolve(ticket, result)));
        }

        assert_eq!(
            applied,
            vec![
                ("new-coaster".to_string(), true),
                ("old-coaster".to_string(), false),
            ]
        );
        let summary = section.state().summary().unwrap();
        assert_eq!(summary.average_rating, 5.0);
        assert_eq!(summary.tag_stats[0].name, "smooth");
    }
}
