#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use time::OffsetDateTime;
use time::macros::datetime;
use uuid::Uuid;

use vetrina::application::activity::ActivityFeedService;
use vetrina::application::dashboard::DashboardService;
use vetrina::application::notify::{BroadcastNotifier, SharedNotifier, noop_notifier};
use vetrina::application::pagination::PageParams;
use vetrina::application::repos::{
    CheckoutsRepo, CustomerQueryFilter, CustomersRepo, FormQueryFilter, FormsRepo, FormsWriteRepo,
    NewsletterQueryFilter, NewsletterRepo, QuoteQueryFilter, QuotesRepo, RepoError,
};
use vetrina::cache::Cache;
use vetrina::config::AuthSettings;
use vetrina::domain::entities::{
    CheckoutEventRecord, CustomerRecord, FormSubmissionRecord, NewsletterSubscriberRecord,
    QuoteRecord,
};
use vetrina::domain::types::{
    CheckoutStatus, CustomerStatus, FormKind, QuoteStatus, SubmissionStatus, SubscriptionStatus,
};
use vetrina::infra::http::{ApiRateLimiter, AppState, build_router};

pub const ADMIN_TOKEN: &str = "test-admin-token";
pub const BASE: OffsetDateTime = datetime!(2026-03-01 08:00 UTC);

pub fn at_minutes(minutes: i64) -> OffsetDateTime {
    BASE + time::Duration::minutes(minutes)
}

pub fn quote_at(at: OffsetDateTime) -> QuoteRecord {
    QuoteRecord {
        id: Uuid::new_v4(),
        reference: format!("Q-{}", Uuid::new_v4().simple()),
        company_name: "Nordwerk GmbH".to_string(),
        contact_email: "buyer@nordwerk.example".to_string(),
        contact_name: Some("A. Keller".to_string()),
        customer_id: None,
        status: QuoteStatus::Pending,
        total_amount_cents: 42_000,
        currency: "EUR".to_string(),
        item_count: 3,
        created_at: at,
        updated_at: at,
    }
}

pub fn customer_at(at: OffsetDateTime) -> CustomerRecord {
    CustomerRecord {
        id: Uuid::new_v4(),
        email: format!("{}@acme.example", Uuid::new_v4().simple()),
        display_name: Some("New Buyer".to_string()),
        company_name: Some("Acme Industrial".to_string()),
        status: CustomerStatus::Verified,
        registered_at: at,
    }
}

pub fn subscriber_at(at: OffsetDateTime) -> NewsletterSubscriberRecord {
    NewsletterSubscriberRecord {
        id: Uuid::new_v4(),
        email: format!("{}@news.example", Uuid::new_v4().simple()),
        status: SubscriptionStatus::Confirmed,
        source: Some("footer".to_string()),
        subscribed_at: at,
    }
}

pub fn submission_at(at: OffsetDateTime) -> FormSubmissionRecord {
    FormSubmissionRecord {
        id: Uuid::new_v4(),
        kind: FormKind::Contact,
        email: "lead@client.example".to_string(),
        name: Some("Lead".to_string()),
        message: Some("Please call back".to_string()),
        status: SubmissionStatus::New,
        submitted_at: at,
        updated_at: at,
    }
}

pub fn checkout_at(at: OffsetDateTime) -> CheckoutEventRecord {
    CheckoutEventRecord {
        id: Uuid::new_v4(),
        reference: format!("CO-{}", Uuid::new_v4().simple()),
        customer_email: "buyer@nordwerk.example".to_string(),
        customer_id: None,
        status: CheckoutStatus::Completed,
        total_amount_cents: 99_000,
        currency: "EUR".to_string(),
        items: serde_json::json!([{"sku": "VLV-12", "qty": 4}]),
        occurred_at: at,
    }
}

/// In-memory stand-in for the Postgres repositories; implements every repo
/// trait over seeded rows.
#[derive(Default)]
pub struct SeedRepo {
    pub quotes: Vec<QuoteRecord>,
    pub customers: Vec<CustomerRecord>,
    pub subscribers: Vec<NewsletterSubscriberRecord>,
    pub submissions: Mutex<Vec<FormSubmissionRecord>>,
    pub checkouts: Vec<CheckoutEventRecord>,
    pub fail_quotes: bool,
}

impl SeedRepo {
    pub fn with_submissions(submissions: Vec<FormSubmissionRecord>) -> Self {
        Self {
            submissions: Mutex::new(submissions),
            ..Default::default()
        }
    }
}

fn page_slice<T: Clone>(rows: &[T], page: PageParams) -> Vec<T> {
    rows.iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .cloned()
        .collect()
}

#[async_trait]
impl QuotesRepo for SeedRepo {
    async fn list_recent(&self, window: u64) -> Result<Vec<QuoteRecord>, RepoError> {
        if self.fail_quotes {
            return Err(RepoError::from_persistence("quotes table unavailable"));
        }
        let mut rows = self.quotes.clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(window as usize);
        Ok(rows)
    }

    async fn list_quotes(
        &self,
        filter: &QuoteQueryFilter,
        page: PageParams,
    ) -> Result<Vec<QuoteRecord>, RepoError> {
        if self.fail_quotes {
            return Err(RepoError::from_persistence("quotes table unavailable"));
        }
        let mut rows: Vec<_> = self
            .quotes
            .iter()
            .filter(|q| filter.status.is_none_or(|s| q.status == s))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page_slice(&rows, page))
    }

    async fn count_quotes(&self, filter: &QuoteQueryFilter) -> Result<u64, RepoError> {
        if self.fail_quotes {
            return Err(RepoError::from_persistence("quotes table unavailable"));
        }
        Ok(self
            .quotes
            .iter()
            .filter(|q| filter.status.is_none_or(|s| q.status == s))
            .count() as u64)
    }
}

#[async_trait]
impl CustomersRepo for SeedRepo {
    async fn list_recent(&self, window: u64) -> Result<Vec<CustomerRecord>, RepoError> {
        let mut rows = self.customers.clone();
        rows.sort_by(|a, b| b.registered_at.cmp(&a.registered_at));
        rows.truncate(window as usize);
        Ok(rows)
    }

    async fn list_customers(
        &self,
        filter: &CustomerQueryFilter,
        page: PageParams,
    ) -> Result<Vec<CustomerRecord>, RepoError> {
        let mut rows: Vec<_> = self
            .customers
            .iter()
            .filter(|c| filter.status.is_none_or(|s| c.status == s))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.registered_at.cmp(&a.registered_at));
        Ok(page_slice(&rows, page))
    }

    async fn count_customers(&self, filter: &CustomerQueryFilter) -> Result<u64, RepoError> {
        Ok(self
            .customers
            .iter()
            .filter(|c| filter.status.is_none_or(|s| c.status == s))
            .count() as u64)
    }
}

#[async_trait]
impl NewsletterRepo for SeedRepo {
    async fn list_recent(&self, window: u64) -> Result<Vec<NewsletterSubscriberRecord>, RepoError> {
        let mut rows = self.subscribers.clone();
        rows.sort_by(|a, b| b.subscribed_at.cmp(&a.subscribed_at));
        rows.truncate(window as usize);
        Ok(rows)
    }

    async fn list_subscribers(
        &self,
        filter: &NewsletterQueryFilter,
        page: PageParams,
    ) -> Result<Vec<NewsletterSubscriberRecord>, RepoError> {
        let mut rows: Vec<_> = self
            .subscribers
            .iter()
            .filter(|s| filter.status.is_none_or(|want| s.status == want))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.subscribed_at.cmp(&a.subscribed_at));
        Ok(page_slice(&rows, page))
    }

    async fn count_subscribers(&self, filter: &NewsletterQueryFilter) -> Result<u64, RepoError> {
        Ok(self
            .subscribers
            .iter()
            .filter(|s| filter.status.is_none_or(|want| s.status == want))
            .count() as u64)
    }
}

#[async_trait]
impl FormsRepo for SeedRepo {
    async fn list_recent(&self, window: u64) -> Result<Vec<FormSubmissionRecord>, RepoError> {
        let mut rows = self.submissions.lock().expect("submissions lock").clone();
        rows.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        rows.truncate(window as usize);
        Ok(rows)
    }

    async fn list_submissions(
        &self,
        filter: &FormQueryFilter,
        page: PageParams,
    ) -> Result<Vec<FormSubmissionRecord>, RepoError> {
        let mut rows: Vec<_> = self
            .submissions
            .lock()
            .expect("submissions lock")
            .iter()
            .filter(|f| {
                filter.status.is_none_or(|s| f.status == s)
                    && filter.kind.is_none_or(|k| f.kind == k)
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(page_slice(&rows, page))
    }

    async fn count_submissions(&self, filter: &FormQueryFilter) -> Result<u64, RepoError> {
        Ok(self
            .submissions
            .lock()
            .expect("submissions lock")
            .iter()
            .filter(|f| {
                filter.status.is_none_or(|s| f.status == s)
                    && filter.kind.is_none_or(|k| f.kind == k)
            })
            .count() as u64)
    }

    async fn find_submission(&self, id: Uuid) -> Result<Option<FormSubmissionRecord>, RepoError> {
        Ok(self
            .submissions
            .lock()
            .expect("submissions lock")
            .iter()
            .find(|f| f.id == id)
            .cloned())
    }
}

#[async_trait]
impl FormsWriteRepo for SeedRepo {
    async fn update_submission_status(
        &self,
        id: Uuid,
        status: SubmissionStatus,
    ) -> Result<FormSubmissionRecord, RepoError> {
        let mut rows = self.submissions.lock().expect("submissions lock");
        let row = rows
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or(RepoError::NotFound)?;
        row.status = status;
        row.updated_at = OffsetDateTime::now_utc();
        Ok(row.clone())
    }
}

#[async_trait]
impl CheckoutsRepo for SeedRepo {
    async fn list_recent(&self, window: u64) -> Result<Vec<CheckoutEventRecord>, RepoError> {
        let mut rows = self.checkouts.clone();
        rows.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
        rows.truncate(window as usize);
        Ok(rows)
    }

    async fn count_events(&self) -> Result<u64, RepoError> {
        Ok(self.checkouts.len() as u64)
    }
}

pub fn feed_service(repo: Arc<SeedRepo>) -> ActivityFeedService {
    ActivityFeedService::new(
        repo.clone(),
        repo.clone(),
        repo.clone(),
        repo.clone(),
        repo,
        Duration::from_secs(15),
    )
}

pub fn dashboard_service(repo: Arc<SeedRepo>, notifier: SharedNotifier) -> DashboardService {
    DashboardService::new(
        repo.clone(),
        repo.clone(),
        repo.clone(),
        repo.clone(),
        repo.clone(),
        repo.clone(),
        feed_service(repo),
        Cache::in_memory(),
        notifier,
        Duration::from_secs(10),
    )
}

pub fn app_state(repo: Arc<SeedRepo>) -> (AppState, BroadcastNotifier) {
    let realtime = BroadcastNotifier::new(16);
    let state = AppState {
        dashboard: dashboard_service(repo, Arc::new(realtime.clone())),
        auth: AuthSettings {
            admin_token: Some(ADMIN_TOKEN.to_string()),
        },
        rate_limiter: ApiRateLimiter::new(Duration::from_secs(60), 1000),
        realtime: Some(realtime.clone()),
        db: None,
        default_limit: 20,
    };
    (state, realtime)
}

pub fn router(repo: Arc<SeedRepo>) -> axum::Router {
    build_router(app_state(repo).0)
}

pub fn noop() -> SharedNotifier {
    noop_notifier()
}
