//! The dashboard read endpoint.
//!
//! One GET assembles every dashboard section. The entity tag covers the data
//! sections only; `timestamp` and `responseTime` change on every call and
//! would otherwise defeat conditional revalidation.

use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::application::error::ErrorReport;
use crate::application::pagination::{MAX_PAGE_LIMIT, PageParams, PaginatedResult};

use super::{AppState, error::ApiError};

const SOURCE: &str = "infra::http::dashboard";
const CACHE_CONTROL_VALUE: &str = "private, max-age=10, stale-while-revalidate=30";

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    page: Option<String>,
    limit: Option<String>,
}

pub async fn get_dashboard(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
    headers: HeaderMap,
) -> Response {
    let started = std::time::Instant::now();

    let page_number = match parse_page(query.page.as_deref()) {
        Ok(value) => value,
        Err(err) => return err.into_response(),
    };
    let limit = match parse_limit(query.limit.as_deref(), state.default_limit) {
        Ok(value) => value,
        Err(err) => return err.into_response(),
    };
    let page = PageParams::from_page(page_number, limit);

    let overview = match state.dashboard.overview(page).await {
        Ok(overview) => overview,
        Err(err) => {
            let status = err.status();
            let body = json!({
                "code": "dashboard_failed",
                "message": err.presentation_message(),
                "timestamp": now_rfc3339(),
                "elapsed": started.elapsed().as_millis() as u64,
            });
            let mut response = (status, Json(body)).into_response();
            ErrorReport::from_error(SOURCE, status, &err).attach(&mut response);
            return response;
        }
    };

    let mut body = json!({
        "stats": overview.stats,
        "activities": overview.activities.data,
        "activitiesPagination": pagination_meta(&overview.activities),
        "quotes": overview.quotes.data,
        "quotesPagination": pagination_meta(&overview.quotes),
        "newUsers": overview.new_users.data,
        "newUsersPagination": pagination_meta(&overview.new_users),
        "newsletterSubscribers": overview.newsletter_subscribers.data,
        "newsletterPagination": pagination_meta(&overview.newsletter_subscribers),
        "formSubmissions": overview.form_submissions.data,
        "formsPagination": pagination_meta(&overview.form_submissions),
    });

    let etag = format!("\"{}\"", hex::encode(Sha256::digest(body.to_string())));

    if revalidation_matches(&headers, &etag) {
        return cached_headers(StatusCode::NOT_MODIFIED.into_response(), &etag);
    }

    if let Some(map) = body.as_object_mut() {
        map.insert("timestamp".to_string(), json!(now_rfc3339()));
        map.insert(
            "responseTime".to_string(),
            json!(started.elapsed().as_millis() as u64),
        );
    }

    cached_headers(Json(body).into_response(), &etag)
}

fn parse_page(raw: Option<&str>) -> Result<u64, ApiError> {
    match raw {
        None | Some("") => Ok(0),
        Some(value) => value.parse::<u64>().map_err(|_| {
            ApiError::bad_request(
                "Invalid query parameter",
                Some("`page` must be a non-negative integer".to_string()),
            )
        }),
    }
}

fn parse_limit(raw: Option<&str>, default_limit: u32) -> Result<u32, ApiError> {
    let value = match raw {
        None | Some("") => return Ok(default_limit),
        Some(value) => value.parse::<u32>().map_err(|_| {
            ApiError::bad_request(
                "Invalid query parameter",
                Some(format!("`limit` must be between 1 and {MAX_PAGE_LIMIT}")),
            )
        })?,
    };
    if value == 0 {
        return Err(ApiError::bad_request(
            "Invalid query parameter",
            Some(format!("`limit` must be between 1 and {MAX_PAGE_LIMIT}")),
        ));
    }
    // Values above the ceiling are clamped, not rejected.
    Ok(value.min(MAX_PAGE_LIMIT))
}

fn pagination_meta<T>(page: &PaginatedResult<T>) -> JsonValue {
    json!({
        "total": page.total,
        "offset": page.offset,
        "limit": page.limit,
        "hasMore": page.has_more,
    })
}

fn revalidation_matches(headers: &HeaderMap, etag: &str) -> bool {
    headers
        .get(header::IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == "*" || value.split(',').any(|v| v.trim() == etag))
}

fn cached_headers(mut response: Response, etag: &str) -> Response {
    if let Ok(value) = header::HeaderValue::from_str(etag) {
        response.headers_mut().insert(header::ETAG, value);
    }
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static(CACHE_CONTROL_VALUE),
    );
    response
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_to_zero_and_rejects_garbage() {
        assert_eq!(parse_page(None).unwrap(), 0);
        assert_eq!(parse_page(Some("3")).unwrap(), 3);
        assert!(parse_page(Some("-1")).is_err());
        assert!(parse_page(Some("abc")).is_err());
    }

    #[test]
    fn limit_defaults_and_clamps() {
        assert_eq!(parse_limit(None, 20).unwrap(), 20);
        assert_eq!(parse_limit(Some("50"), 20).unwrap(), 50);
        assert_eq!(parse_limit(Some("500"), 20).unwrap(), MAX_PAGE_LIMIT);
        assert!(parse_limit(Some("0"), 20).is_err());
        assert!(parse_limit(Some("ten"), 20).is_err());
    }

    #[test]
    fn if_none_match_understands_lists_and_wildcard() {
        let mut headers = HeaderMap::new();
        headers.insert(header::IF_NONE_MATCH, "\"abc\", \"def\"".parse().unwrap());
        assert!(revalidation_matches(&headers, "\"def\""));
        assert!(!revalidation_matches(&headers, "\"xyz\""));

        let mut headers = HeaderMap::new();
        headers.insert(header::IF_NONE_MATCH, "*".parse().unwrap());
        assert!(revalidation_matches(&headers, "\"anything\""));
    }
}
