use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::pagination::PageParams,
    application::repos::{NewsletterQueryFilter, NewsletterRepo, RepoError},
    domain::entities::NewsletterSubscriberRecord,
    domain::types::SubscriptionStatus,
};

use super::{PostgresRepositories, bind_window, convert_count, map_sqlx_error};

const SUBSCRIBER_COLUMNS: &str = "id, email, status, source, subscribed_at";

#[derive(sqlx::FromRow)]
struct SubscriberRow {
    id: Uuid,
    email: String,
    status: SubscriptionStatus,
    source: Option<String>,
    subscribed_at: OffsetDateTime,
}

impl From<SubscriberRow> for NewsletterSubscriberRecord {
    fn from(row: SubscriberRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            status: row.status,
            source: row.source,
            subscribed_at: row.subscribed_at,
        }
    }
}

fn apply_filter<'q>(qb: &mut QueryBuilder<'q, Postgres>, filter: &'q NewsletterQueryFilter) {
    if let Some(status) = filter.status {
        qb.push(" AND status = ");
        qb.push_bind(status);
    }
}

#[async_trait]
impl NewsletterRepo for PostgresRepositories {
    async fn list_recent(&self, window: u64) -> Result<Vec<NewsletterSubscriberRecord>, RepoError> {
        let rows = sqlx::query_as::<_, SubscriberRow>(&format!(
            "SELECT {SUBSCRIBER_COLUMNS} FROM newsletter_subscribers \
             ORDER BY subscribed_at DESC, id ASC LIMIT $1"
        ))
        .bind(bind_window(window))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(NewsletterSubscriberRecord::from)
            .collect())
    }

    async fn list_subscribers(
        &self,
        filter: &NewsletterQueryFilter,
        page: PageParams,
    ) -> Result<Vec<NewsletterSubscriberRecord>, RepoError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {SUBSCRIBER_COLUMNS} FROM newsletter_subscribers WHERE TRUE"
        ));
        apply_filter(&mut qb, filter);
        qb.push(" ORDER BY subscribed_at DESC, id ASC OFFSET ");
        qb.push_bind(bind_window(page.offset()));
        qb.push(" LIMIT ");
        qb.push_bind(i64::from(page.limit()));

        let rows = qb
            .build_query_as::<SubscriberRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(NewsletterSubscriberRecord::from)
            .collect())
    }

    async fn count_subscribers(&self, filter: &NewsletterQueryFilter) -> Result<u64, RepoError> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM newsletter_subscribers WHERE TRUE");
        apply_filter(&mut qb, filter);

        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(convert_count(count))
    }
}
