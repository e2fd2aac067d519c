use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::pagination::PageParams,
    application::repos::{CustomerQueryFilter, CustomersRepo, RepoError},
    domain::entities::CustomerRecord,
    domain::types::CustomerStatus,
};

use super::{PostgresRepositories, bind_window, convert_count, map_sqlx_error};

const CUSTOMER_COLUMNS: &str =
    "id, email, display_name, company_name, status, registered_at";

#[derive(sqlx::FromRow)]
struct CustomerRow {
    id: Uuid,
    email: String,
    display_name: Option<String>,
    company_name: Option<String>,
    status: CustomerStatus,
    registered_at: OffsetDateTime,
}

impl From<CustomerRow> for CustomerRecord {
    fn from(row: CustomerRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            display_name: row.display_name,
            company_name: row.company_name,
            status: row.status,
            registered_at: row.registered_at,
        }
    }
}

fn apply_filter<'q>(qb: &mut QueryBuilder<'q, Postgres>, filter: &'q CustomerQueryFilter) {
    if let Some(status) = filter.status {
        qb.push(" AND status = ");
        qb.push_bind(status);
    }
}

#[async_trait]
impl CustomersRepo for PostgresRepositories {
    async fn list_recent(&self, window: u64) -> Result<Vec<CustomerRecord>, RepoError> {
        let rows = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY registered_at DESC, id ASC LIMIT $1"
        ))
        .bind(bind_window(window))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(CustomerRecord::from).collect())
    }

    async fn list_customers(
        &self,
        filter: &CustomerQueryFilter,
        page: PageParams,
    ) -> Result<Vec<CustomerRecord>, RepoError> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE TRUE"));
        apply_filter(&mut qb, filter);
        qb.push(" ORDER BY registered_at DESC, id ASC OFFSET ");
        qb.push_bind(bind_window(page.offset()));
        qb.push(" LIMIT ");
        qb.push_bind(i64::from(page.limit()));

        let rows = qb
            .build_query_as::<CustomerRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(CustomerRecord::from).collect())
    }

    async fn count_customers(&self, filter: &CustomerQueryFilter) -> Result<u64, RepoError> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM customers WHERE TRUE");
        apply_filter(&mut qb, filter);

        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(convert_count(count))
    }
}
