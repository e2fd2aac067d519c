//! Dashboard data façade: per-entity paginated fetchers, headline stats, and
//! the form-submission status mutation.
//!
//! Every read goes through the cache with a key derived from the logical
//! query, so identical requests within the TTL are served without touching
//! Postgres. The mutation path writes, invalidates the owning entity prefix
//! wholesale, and broadcasts a push event.

use std::sync::Arc;
use std::time::Duration;

use metrics::histogram;
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::OffsetDateTime;
use tokio::time::Instant;
use uuid::Uuid;

use crate::application::activity::ActivityFeedService;
use crate::application::error::AppError;
use crate::application::notify::{DataSet, PushEvent, SharedNotifier};
use crate::application::pagination::{PageParams, PaginatedResult};
use crate::application::repos::{
    CheckoutsRepo, CustomerQueryFilter, CustomersRepo, FormQueryFilter, FormsRepo, FormsWriteRepo,
    NewsletterQueryFilter, NewsletterRepo, QuoteQueryFilter, QuotesRepo,
};
use crate::cache::{Cache, keys};
use crate::domain::activity::ActivityEvent;
use crate::domain::entities::{
    CustomerRecord, FormSubmissionRecord, NewsletterSubscriberRecord, QuoteRecord,
};
use crate::domain::types::{
    CustomerStatus, FormKind, QuoteStatus, SubmissionStatus, SubscriptionStatus,
};

/// Presentation shape for a quote row; selected fields only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSummary {
    pub id: Uuid,
    pub reference: String,
    pub company_name: String,
    pub contact_email: String,
    pub status: QuoteStatus,
    pub amount: i64,
    pub currency: String,
    pub item_count: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<QuoteRecord> for QuoteSummary {
    fn from(record: QuoteRecord) -> Self {
        Self {
            id: record.id,
            reference: record.reference,
            company_name: record.company_name,
            contact_email: record.contact_email,
            status: record.status,
            amount: record.total_amount_cents,
            currency: record.currency,
            item_count: record.item_count,
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub status: CustomerStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub registered_at: OffsetDateTime,
}

impl From<CustomerRecord> for UserSummary {
    fn from(record: CustomerRecord) -> Self {
        Self {
            id: record.id,
            email: record.email,
            name: record.display_name,
            company: record.company_name,
            status: record.status,
            registered_at: record.registered_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberSummary {
    pub id: Uuid,
    pub email: String,
    pub status: SubscriptionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub subscribed_at: OffsetDateTime,
}

impl From<NewsletterSubscriberRecord> for SubscriberSummary {
    fn from(record: NewsletterSubscriberRecord) -> Self {
        Self {
            id: record.id,
            email: record.email,
            status: record.status,
            source: record.source,
            subscribed_at: record.subscribed_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionSummary {
    pub id: Uuid,
    pub form_type: FormKind,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub status: SubmissionStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub submitted_at: OffsetDateTime,
}

impl From<FormSubmissionRecord> for SubmissionSummary {
    fn from(record: FormSubmissionRecord) -> Self {
        Self {
            id: record.id,
            form_type: record.kind,
            email: record.email,
            name: record.name,
            message: record.message,
            status: record.status,
            submitted_at: record.submitted_at,
        }
    }
}

/// Headline counters at the top of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_quotes: u64,
    pub pending_quotes: u64,
    pub total_users: u64,
    pub confirmed_subscribers: u64,
    pub new_form_submissions: u64,
    pub checkout_events: u64,
}

/// Everything one dashboard page needs, assembled in a single pass.
#[derive(Debug, Clone)]
pub struct DashboardOverview {
    pub stats: DashboardStats,
    pub activities: PaginatedResult<ActivityEvent>,
    pub quotes: PaginatedResult<QuoteSummary>,
    pub new_users: PaginatedResult<UserSummary>,
    pub newsletter_subscribers: PaginatedResult<SubscriberSummary>,
    pub form_submissions: PaginatedResult<SubmissionSummary>,
}

#[derive(Clone)]
pub struct DashboardService {
    quotes: Arc<dyn QuotesRepo>,
    customers: Arc<dyn CustomersRepo>,
    newsletter: Arc<dyn NewsletterRepo>,
    forms: Arc<dyn FormsRepo>,
    forms_write: Arc<dyn FormsWriteRepo>,
    checkouts: Arc<dyn CheckoutsRepo>,
    activity: ActivityFeedService,
    cache: Cache,
    notifier: SharedNotifier,
    ttl: Duration,
}

impl DashboardService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        quotes: Arc<dyn QuotesRepo>,
        customers: Arc<dyn CustomersRepo>,
        newsletter: Arc<dyn NewsletterRepo>,
        forms: Arc<dyn FormsRepo>,
        forms_write: Arc<dyn FormsWriteRepo>,
        checkouts: Arc<dyn CheckoutsRepo>,
        activity: ActivityFeedService,
        cache: Cache,
        notifier: SharedNotifier,
        ttl: Duration,
    ) -> Self {
        Self {
            quotes,
            customers,
            newsletter,
            forms,
            forms_write,
            checkouts,
            activity,
            cache,
            notifier,
            ttl,
        }
    }

    /// Assemble the full dashboard payload. Sections are fetched
    /// concurrently; each section caches independently so a burst of
    /// dashboard loads within the TTL costs one set of queries.
    pub async fn overview(&self, page: PageParams) -> Result<DashboardOverview, AppError> {
        let started = Instant::now();
        let quote_filter = QuoteQueryFilter::default();
        let customer_filter = CustomerQueryFilter::default();
        let newsletter_filter = NewsletterQueryFilter::default();
        let form_filter = FormQueryFilter::default();

        let (stats, activities, quotes, new_users, newsletter_subscribers, form_submissions) =
            tokio::try_join!(
                self.stats(),
                self.activities(page),
                self.quotes(&quote_filter, page),
                self.new_users(&customer_filter, page),
                self.newsletter_subscribers(&newsletter_filter, page),
                self.form_submissions(&form_filter, page),
            )?;

        histogram!("vetrina_dashboard_build_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        Ok(DashboardOverview {
            stats,
            activities,
            quotes,
            new_users,
            newsletter_subscribers,
            form_submissions,
        })
    }

    /// Merged activity feed, cached per `(offset, limit)`.
    pub async fn activities(
        &self,
        page: PageParams,
    ) -> Result<PaginatedResult<ActivityEvent>, AppError> {
        self.cache
            .get_or_compute(&keys::activities_key(page), self.ttl, || async {
                Ok(self.activity.activities(page).await)
            })
            .await
    }

    pub async fn quotes(
        &self,
        filter: &QuoteQueryFilter,
        page: PageParams,
    ) -> Result<PaginatedResult<QuoteSummary>, AppError> {
        self.cache
            .get_or_compute(&keys::quotes_key(page, filter), self.ttl, || async {
                let (total, rows) = tokio::try_join!(
                    self.quotes.count_quotes(filter),
                    self.quotes.list_quotes(filter, page),
                )?;
                Ok(summaries(rows, total, page))
            })
            .await
    }

    pub async fn new_users(
        &self,
        filter: &CustomerQueryFilter,
        page: PageParams,
    ) -> Result<PaginatedResult<UserSummary>, AppError> {
        self.cache
            .get_or_compute(&keys::users_key(page, filter), self.ttl, || async {
                let (total, rows) = tokio::try_join!(
                    self.customers.count_customers(filter),
                    self.customers.list_customers(filter, page),
                )?;
                Ok(summaries(rows, total, page))
            })
            .await
    }

    pub async fn newsletter_subscribers(
        &self,
        filter: &NewsletterQueryFilter,
        page: PageParams,
    ) -> Result<PaginatedResult<SubscriberSummary>, AppError> {
        self.cache
            .get_or_compute(&keys::newsletter_key(page, filter), self.ttl, || async {
                let (total, rows) = tokio::try_join!(
                    self.newsletter.count_subscribers(filter),
                    self.newsletter.list_subscribers(filter, page),
                )?;
                Ok(summaries(rows, total, page))
            })
            .await
    }

    pub async fn form_submissions(
        &self,
        filter: &FormQueryFilter,
        page: PageParams,
    ) -> Result<PaginatedResult<SubmissionSummary>, AppError> {
        self.cache
            .get_or_compute(&keys::forms_key(page, filter), self.ttl, || async {
                let (total, rows) = tokio::try_join!(
                    self.forms.count_submissions(filter),
                    self.forms.list_submissions(filter, page),
                )?;
                Ok(summaries(rows, total, page))
            })
            .await
    }

    /// Headline counters, cached under a single key.
    pub async fn stats(&self) -> Result<DashboardStats, AppError> {
        self.cache
            .get_or_compute(keys::STATS_KEY, self.ttl, || async {
                let all_quotes = QuoteQueryFilter::default();
                let all_customers = CustomerQueryFilter::default();
                let pending = QuoteQueryFilter {
                    status: Some(QuoteStatus::Pending),
                    search: None,
                };
                let confirmed = NewsletterQueryFilter {
                    status: Some(SubscriptionStatus::Confirmed),
                };
                let unread = FormQueryFilter {
                    status: Some(SubmissionStatus::New),
                    kind: None,
                };
                let (
                    total_quotes,
                    pending_quotes,
                    total_users,
                    confirmed_subscribers,
                    new_form_submissions,
                    checkout_events,
                ) = tokio::try_join!(
                    self.quotes.count_quotes(&all_quotes),
                    self.quotes.count_quotes(&pending),
                    self.customers.count_customers(&all_customers),
                    self.newsletter.count_subscribers(&confirmed),
                    self.forms.count_submissions(&unread),
                    self.checkouts.count_events(),
                )?;
                Ok(DashboardStats {
                    total_quotes,
                    pending_quotes,
                    total_users,
                    confirmed_subscribers,
                    new_form_submissions,
                    checkout_events,
                })
            })
            .await
    }

    /// Single-row lookup, uncached; the detail pane wants the live row.
    pub async fn find_submission(&self, id: Uuid) -> Result<SubmissionSummary, AppError> {
        let record = self
            .forms
            .find_submission(id)
            .await?
            .ok_or(AppError::NotFound)?;
        Ok(SubmissionSummary::from(record))
    }

    /// Convenience for the common mutation.
    pub async fn mark_submission_read(&self, id: Uuid) -> Result<SubmissionSummary, AppError> {
        self.update_submission_status(id, SubmissionStatus::Read)
            .await
    }

    /// Persist a new submission status, drop every cached forms page, and
    /// notify connected viewers. Invalidation is by prefix, never selective:
    /// counts and unrelated pages shift too when one row changes status.
    pub async fn update_submission_status(
        &self,
        id: Uuid,
        status: SubmissionStatus,
    ) -> Result<SubmissionSummary, AppError> {
        let record = self.forms_write.update_submission_status(id, status).await?;

        // Activity events embed the submission status, so the cached feed
        // goes stale along with the forms pages.
        self.cache.invalidate_prefix(keys::FORMS_PREFIX).await;
        self.cache.invalidate_prefix(keys::ACTIVITIES_PREFIX).await;
        self.cache.delete(keys::STATS_KEY).await;

        let summary = SubmissionSummary::from(record);
        self.notifier.broadcast(PushEvent::data_update(
            DataSet::Forms,
            json!({
                "id": summary.id,
                "status": summary.status,
            }),
        ));

        Ok(summary)
    }
}

fn summaries<R, S: From<R>>(rows: Vec<R>, total: u64, page: PageParams) -> PaginatedResult<S> {
    PaginatedResult::new(rows.into_iter().map(S::from).collect(), total, page)
}
