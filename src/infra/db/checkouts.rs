use async_trait::async_trait;
use serde_json::Value as JsonValue;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::repos::{CheckoutsRepo, RepoError},
    domain::entities::CheckoutEventRecord,
    domain::types::CheckoutStatus,
};

use super::{PostgresRepositories, bind_window, convert_count, map_sqlx_error};

const CHECKOUT_COLUMNS: &str = "id, reference, customer_email, customer_id, status, \
     total_amount_cents, currency, items, occurred_at";

#[derive(sqlx::FromRow)]
struct CheckoutRow {
    id: Uuid,
    reference: String,
    customer_email: String,
    customer_id: Option<Uuid>,
    status: CheckoutStatus,
    total_amount_cents: i64,
    currency: String,
    items: JsonValue,
    occurred_at: OffsetDateTime,
}

impl From<CheckoutRow> for CheckoutEventRecord {
    fn from(row: CheckoutRow) -> Self {
        Self {
            id: row.id,
            reference: row.reference,
            customer_email: row.customer_email,
            customer_id: row.customer_id,
            status: row.status,
            total_amount_cents: row.total_amount_cents,
            currency: row.currency,
            items: row.items,
            occurred_at: row.occurred_at,
        }
    }
}

#[async_trait]
impl CheckoutsRepo for PostgresRepositories {
    async fn list_recent(&self, window: u64) -> Result<Vec<CheckoutEventRecord>, RepoError> {
        let rows = sqlx::query_as::<_, CheckoutRow>(&format!(
            "SELECT {CHECKOUT_COLUMNS} FROM checkout_events \
             ORDER BY occurred_at DESC, id ASC LIMIT $1"
        ))
        .bind(bind_window(window))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(CheckoutEventRecord::from).collect())
    }

    async fn count_events(&self) -> Result<u64, RepoError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM checkout_events")
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(convert_count(count))
    }
}
