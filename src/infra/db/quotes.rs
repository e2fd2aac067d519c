use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::pagination::PageParams,
    application::repos::{QuoteQueryFilter, QuotesRepo, RepoError},
    domain::entities::QuoteRecord,
    domain::types::QuoteStatus,
};

use super::{PostgresRepositories, bind_window, convert_count, map_sqlx_error};

const QUOTE_COLUMNS: &str = "id, reference, company_name, contact_email, contact_name, \
     customer_id, status, total_amount_cents, currency, item_count, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct QuoteRow {
    id: Uuid,
    reference: String,
    company_name: String,
    contact_email: String,
    contact_name: Option<String>,
    customer_id: Option<Uuid>,
    status: QuoteStatus,
    total_amount_cents: i64,
    currency: String,
    item_count: i32,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<QuoteRow> for QuoteRecord {
    fn from(row: QuoteRow) -> Self {
        Self {
            id: row.id,
            reference: row.reference,
            company_name: row.company_name,
            contact_email: row.contact_email,
            contact_name: row.contact_name,
            customer_id: row.customer_id,
            status: row.status,
            total_amount_cents: row.total_amount_cents,
            currency: row.currency,
            item_count: row.item_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn apply_filter<'q>(qb: &mut QueryBuilder<'q, Postgres>, filter: &'q QuoteQueryFilter) {
    if let Some(status) = filter.status {
        qb.push(" AND status = ");
        qb.push_bind(status);
    }

    if let Some(search) = filter.search.as_ref() {
        qb.push(" AND (reference ILIKE ");
        qb.push_bind(format!("%{search}%"));
        qb.push(" OR company_name ILIKE ");
        qb.push_bind(format!("%{search}%"));
        qb.push(" OR contact_email ILIKE ");
        qb.push_bind(format!("%{search}%"));
        qb.push(")");
    }
}

#[async_trait]
impl QuotesRepo for PostgresRepositories {
    async fn list_recent(&self, window: u64) -> Result<Vec<QuoteRecord>, RepoError> {
        let rows = sqlx::query_as::<_, QuoteRow>(&format!(
            "SELECT {QUOTE_COLUMNS} FROM quotes ORDER BY created_at DESC, id ASC LIMIT $1"
        ))
        .bind(bind_window(window))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(QuoteRecord::from).collect())
    }

    async fn list_quotes(
        &self,
        filter: &QuoteQueryFilter,
        page: PageParams,
    ) -> Result<Vec<QuoteRecord>, RepoError> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {QUOTE_COLUMNS} FROM quotes WHERE TRUE"));
        apply_filter(&mut qb, filter);
        qb.push(" ORDER BY created_at DESC, id ASC OFFSET ");
        qb.push_bind(bind_window(page.offset()));
        qb.push(" LIMIT ");
        qb.push_bind(i64::from(page.limit()));

        let rows = qb
            .build_query_as::<QuoteRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(QuoteRecord::from).collect())
    }

    async fn count_quotes(&self, filter: &QuoteQueryFilter) -> Result<u64, RepoError> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM quotes WHERE TRUE");
        apply_filter(&mut qb, filter);

        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(convert_count(count))
    }
}
