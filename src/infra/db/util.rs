use crate::application::repos::RepoError;

pub fn map_sqlx_error(err: sqlx::Error) -> RepoError {
    match err {
        sqlx::Error::RowNotFound => RepoError::NotFound,
        sqlx::Error::Database(db)
            if db.message().contains("violates foreign key constraint")
                || db.message().contains("invalid input syntax") =>
        {
            RepoError::InvalidInput {
                message: db.message().to_string(),
            }
        }
        sqlx::Error::Database(db)
            if db
                .message()
                .contains("canceling statement due to user request") =>
        {
            RepoError::Timeout
        }
        other => RepoError::from_persistence(other),
    }
}

/// Postgres counts come back as `i64`; a negative value can only mean a
/// broken query, so clamp instead of panicking.
pub fn convert_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

/// `OFFSET`/`LIMIT` binds are `i64` on the wire. An offset past `i64::MAX`
/// is reachable from an absurd page number; clamp it so the query returns
/// an empty page instead of a negative-bind error.
pub fn bind_window(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
