use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::pagination::PageParams,
    application::repos::{FormQueryFilter, FormsRepo, FormsWriteRepo, RepoError},
    domain::entities::FormSubmissionRecord,
    domain::types::{FormKind, SubmissionStatus},
};

use super::{PostgresRepositories, bind_window, convert_count, map_sqlx_error};

const SUBMISSION_COLUMNS: &str =
    "id, kind, email, name, message, status, submitted_at, updated_at";

#[derive(sqlx::FromRow)]
struct SubmissionRow {
    id: Uuid,
    kind: FormKind,
    email: String,
    name: Option<String>,
    message: Option<String>,
    status: SubmissionStatus,
    submitted_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<SubmissionRow> for FormSubmissionRecord {
    fn from(row: SubmissionRow) -> Self {
        Self {
            id: row.id,
            kind: row.kind,
            email: row.email,
            name: row.name,
            message: row.message,
            status: row.status,
            submitted_at: row.submitted_at,
            updated_at: row.updated_at,
        }
    }
}

fn apply_filter<'q>(qb: &mut QueryBuilder<'q, Postgres>, filter: &'q FormQueryFilter) {
    if let Some(status) = filter.status {
        qb.push(" AND status = ");
        qb.push_bind(status);
    }

    if let Some(kind) = filter.kind {
        qb.push(" AND kind = ");
        qb.push_bind(kind);
    }
}

#[async_trait]
impl FormsRepo for PostgresRepositories {
    async fn list_recent(&self, window: u64) -> Result<Vec<FormSubmissionRecord>, RepoError> {
        let rows = sqlx::query_as::<_, SubmissionRow>(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM form_submissions \
             ORDER BY submitted_at DESC, id ASC LIMIT $1"
        ))
        .bind(bind_window(window))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(FormSubmissionRecord::from).collect())
    }

    async fn list_submissions(
        &self,
        filter: &FormQueryFilter,
        page: PageParams,
    ) -> Result<Vec<FormSubmissionRecord>, RepoError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {SUBMISSION_COLUMNS} FROM form_submissions WHERE TRUE"
        ));
        apply_filter(&mut qb, filter);
        qb.push(" ORDER BY submitted_at DESC, id ASC OFFSET ");
        qb.push_bind(bind_window(page.offset()));
        qb.push(" LIMIT ");
        qb.push_bind(i64::from(page.limit()));

        let rows = qb
            .build_query_as::<SubmissionRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(FormSubmissionRecord::from).collect())
    }

    async fn count_submissions(&self, filter: &FormQueryFilter) -> Result<u64, RepoError> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM form_submissions WHERE TRUE");
        apply_filter(&mut qb, filter);

        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(convert_count(count))
    }

    async fn find_submission(&self, id: Uuid) -> Result<Option<FormSubmissionRecord>, RepoError> {
        let row = sqlx::query_as::<_, SubmissionRow>(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM form_submissions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(FormSubmissionRecord::from))
    }
}

#[async_trait]
impl FormsWriteRepo for PostgresRepositories {
    async fn update_submission_status(
        &self,
        id: Uuid,
        status: SubmissionStatus,
    ) -> Result<FormSubmissionRecord, RepoError> {
        let row = sqlx::query_as::<_, SubmissionRow>(&format!(
            "UPDATE form_submissions SET status = $1, updated_at = NOW() \
             WHERE id = $2 RETURNING {SUBMISSION_COLUMNS}"
        ))
        .bind(status)
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(FormSubmissionRecord::from)
            .ok_or(RepoError::NotFound)
    }
}
