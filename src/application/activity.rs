//! Unified activity feed aggregation.
//!
//! Fan-in over five independent sources with no transactional relationship:
//! correctness here means global recency order across the union, not
//! referential integrity. Every source must supply at least `offset + limit`
//! rows before the merge, otherwise a source with many recent rows would rank
//! its tail events older than they truly are.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tracing::warn;

use crate::application::pagination::{PageParams, PaginatedResult};
use crate::application::repos::{
    CheckoutsRepo, CustomerQueryFilter, CustomersRepo, FormQueryFilter, FormsRepo,
    NewsletterQueryFilter, NewsletterRepo, QuoteQueryFilter, QuotesRepo, RepoError,
};
use crate::domain::activity::{ActivityEvent, ActivitySource};

const SOURCE: &str = "application::activity::ActivityFeedService";

#[derive(Clone)]
pub struct ActivityFeedService {
    quotes: Arc<dyn QuotesRepo>,
    customers: Arc<dyn CustomersRepo>,
    newsletter: Arc<dyn NewsletterRepo>,
    forms: Arc<dyn FormsRepo>,
    checkouts: Arc<dyn CheckoutsRepo>,
    source_timeout: Duration,
}

impl ActivityFeedService {
    pub fn new(
        quotes: Arc<dyn QuotesRepo>,
        customers: Arc<dyn CustomersRepo>,
        newsletter: Arc<dyn NewsletterRepo>,
        forms: Arc<dyn FormsRepo>,
        checkouts: Arc<dyn CheckoutsRepo>,
        source_timeout: Duration,
    ) -> Self {
        Self {
            quotes,
            customers,
            newsletter,
            forms,
            checkouts,
            source_timeout,
        }
    }

    /// Produce one page of the merged, time-ordered activity feed.
    ///
    /// Per-source fetches and counts run concurrently; the merge is strictly
    /// ordered by recency with an id tie-break, so the same underlying rows
    /// always paginate identically. A failed or timed-out source degrades to
    /// empty rows and a zero count for this call and is logged, never
    /// propagated: a partial feed beats a blank dashboard.
    pub async fn activities(&self, page: PageParams) -> PaginatedResult<ActivityEvent> {
        let window = page.fetch_window();
        let quote_filter = QuoteQueryFilter::default();
        let customer_filter = CustomerQueryFilter::default();
        let newsletter_filter = NewsletterQueryFilter::default();
        let form_filter = FormQueryFilter::default();

        let (quotes, customers, newsletter, forms, checkouts) = tokio::join!(
            self.settle_source(
                "quotes",
                self.quotes.list_recent(window),
                self.quotes.count_quotes(&quote_filter),
            ),
            self.settle_source(
                "users",
                self.customers.list_recent(window),
                self.customers.count_customers(&customer_filter),
            ),
            self.settle_source(
                "newsletter",
                self.newsletter.list_recent(window),
                self.newsletter.count_subscribers(&newsletter_filter),
            ),
            self.settle_source(
                "forms",
                self.forms.list_recent(window),
                self.forms.count_submissions(&form_filter),
            ),
            self.settle_source(
                "checkouts",
                self.checkouts.list_recent(window),
                self.checkouts.count_events(),
            ),
        );

        let total = quotes.1 + customers.1 + newsletter.1 + forms.1 + checkouts.1;

        let mut events: Vec<ActivityEvent> = quotes
            .0
            .into_iter()
            .map(ActivitySource::Quote)
            .chain(customers.0.into_iter().map(ActivitySource::Customer))
            .chain(newsletter.0.into_iter().map(ActivitySource::Newsletter))
            .chain(forms.0.into_iter().map(ActivitySource::Form))
            .chain(checkouts.0.into_iter().map(ActivitySource::Checkout))
            .map(ActivitySource::into_event)
            .collect();

        events.sort_by(ActivityEvent::feed_ordering);

        let data: Vec<ActivityEvent> = events
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();

        PaginatedResult::new(data, total, page)
    }

    /// Settle one source's row fetch and count as a unit. The cheap count
    /// query keeps `has_more` correct without fetching every row, but a
    /// source only contributes when both legs succeed inside the timeout;
    /// otherwise it degrades to empty rows and a zero count, so `total`
    /// never claims rows the merge cannot serve.
    async fn settle_source<T>(
        &self,
        source: &'static str,
        rows: impl Future<Output = Result<Vec<T>, RepoError>>,
        count: impl Future<Output = Result<u64, RepoError>>,
    ) -> (Vec<T>, u64) {
        let (rows, count) = tokio::join!(
            self.settle_rows(source, rows),
            self.settle_count(source, count),
        );
        match (rows, count) {
            (Some(rows), Some(count)) => (rows, count),
            _ => (Vec::new(), 0),
        }
    }

    async fn settle_rows<T>(
        &self,
        source: &'static str,
        fut: impl Future<Output = Result<Vec<T>, RepoError>>,
    ) -> Option<Vec<T>> {
        match tokio::time::timeout(self.source_timeout, fut).await {
            Ok(Ok(rows)) => Some(rows),
            Ok(Err(err)) => {
                record_source_failure(source, "query");
                warn!(
                    target = "vetrina::activity",
                    source,
                    error = %err,
                    source_module = SOURCE,
                    "activity source failed, serving partial feed"
                );
                None
            }
            Err(_) => {
                record_source_failure(source, "timeout");
                warn!(
                    target = "vetrina::activity",
                    source,
                    timeout_ms = self.source_timeout.as_millis() as u64,
                    source_module = SOURCE,
                    "activity source timed out, serving partial feed"
                );
                None
            }
        }
    }

    async fn settle_count(
        &self,
        source: &'static str,
        fut: impl Future<Output = Result<u64, RepoError>>,
    ) -> Option<u64> {
        match tokio::time::timeout(self.source_timeout, fut).await {
            Ok(Ok(count)) => Some(count),
            Ok(Err(err)) => {
                record_source_failure(source, "count");
                warn!(
                    target = "vetrina::activity",
                    source,
                    error = %err,
                    source_module = SOURCE,
                    "activity source count failed, treating as empty"
                );
                None
            }
            Err(_) => {
                record_source_failure(source, "count_timeout");
                warn!(
                    target = "vetrina::activity",
                    source,
                    source_module = SOURCE,
                    "activity source count timed out, treating as empty"
                );
                None
            }
        }
    }
}

fn record_source_failure(source: &'static str, reason: &'static str) {
    counter!(
        "vetrina_activity_source_failure_total",
        "source" => source,
        "reason" => reason
    )
    .increment(1);
}
