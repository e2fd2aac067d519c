//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::application::pagination::{PageParams, PaginationError};
use crate::domain::entities::{
    CheckoutEventRecord, CustomerRecord, FormSubmissionRecord, NewsletterSubscriberRecord,
    QuoteRecord,
};
use crate::domain::types::{
    CustomerStatus, FormKind, QuoteStatus, SubmissionStatus, SubscriptionStatus,
};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("database timeout")]
    Timeout,
    #[error(transparent)]
    Pagination(#[from] PaginationError),
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuoteQueryFilter {
    pub status: Option<QuoteStatus>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomerQueryFilter {
    pub status: Option<CustomerStatus>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewsletterQueryFilter {
    pub status: Option<SubscriptionStatus>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormQueryFilter {
    pub status: Option<SubmissionStatus>,
    pub kind: Option<FormKind>,
}

#[async_trait]
pub trait QuotesRepo: Send + Sync {
    /// Most-recent quotes, newest first, at most `window` rows.
    async fn list_recent(&self, window: u64) -> Result<Vec<QuoteRecord>, RepoError>;

    async fn list_quotes(
        &self,
        filter: &QuoteQueryFilter,
        page: PageParams,
    ) -> Result<Vec<QuoteRecord>, RepoError>;

    async fn count_quotes(&self, filter: &QuoteQueryFilter) -> Result<u64, RepoError>;
}

#[async_trait]
pub trait CustomersRepo: Send + Sync {
    async fn list_recent(&self, window: u64) -> Result<Vec<CustomerRecord>, RepoError>;

    async fn list_customers(
        &self,
        filter: &CustomerQueryFilter,
        page: PageParams,
    ) -> Result<Vec<CustomerRecord>, RepoError>;

    async fn count_customers(&self, filter: &CustomerQueryFilter) -> Result<u64, RepoError>;
}

#[async_trait]
pub trait NewsletterRepo: Send + Sync {
    async fn list_recent(&self, window: u64) -> Result<Vec<NewsletterSubscriberRecord>, RepoError>;

    async fn list_subscribers(
        &self,
        filter: &NewsletterQueryFilter,
        page: PageParams,
    ) -> Result<Vec<NewsletterSubscriberRecord>, RepoError>;

    async fn count_subscribers(&self, filter: &NewsletterQueryFilter) -> Result<u64, RepoError>;
}

#[async_trait]
pub trait FormsRepo: Send + Sync {
    async fn list_recent(&self, window: u64) -> Result<Vec<FormSubmissionRecord>, RepoError>;

    async fn list_submissions(
        &self,
        filter: &FormQueryFilter,
        page: PageParams,
    ) -> Result<Vec<FormSubmissionRecord>, RepoError>;

    async fn count_submissions(&self, filter: &FormQueryFilter) -> Result<u64, RepoError>;

    async fn find_submission(&self, id: Uuid) -> Result<Option<FormSubmissionRecord>, RepoError>;
}

#[async_trait]
pub trait FormsWriteRepo: Send + Sync {
    /// Persist a new status for one submission; returns the updated record.
    async fn update_submission_status(
        &self,
        id: Uuid,
        status: SubmissionStatus,
    ) -> Result<FormSubmissionRecord, RepoError>;
}

#[async_trait]
pub trait CheckoutsRepo: Send + Sync {
    async fn list_recent(&self, window: u64) -> Result<Vec<CheckoutEventRecord>, RepoError>;

    async fn count_events(&self) -> Result<u64, RepoError>;
}
