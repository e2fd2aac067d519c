mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use vetrina::config::AuthSettings;
use vetrina::infra::http::{ApiRateLimiter, AppState, build_router};

use common::{
    ADMIN_TOKEN, SeedRepo, app_state, at_minutes, customer_at, noop, quote_at, router,
    submission_at,
};

fn seeded_repo() -> Arc<SeedRepo> {
    let mut repo = SeedRepo::default();
    for i in 0..3 {
        repo.quotes.push(quote_at(at_minutes(i)));
        repo.customers.push(customer_at(at_minutes(10 + i)));
    }
    repo.submissions
        .lock()
        .expect("submissions lock")
        .push(submission_at(at_minutes(20)));
    Arc::new(repo)
}

fn authed(request: axum::http::request::Builder) -> axum::http::request::Builder {
    request.header(header::AUTHORIZATION, format!("Bearer {ADMIN_TOKEN}"))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn dashboard_requires_a_credential() {
    let app = router(seeded_repo());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/admin/api/dashboard")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "unauthorized");
}

#[tokio::test]
async fn wrong_token_is_rejected() {
    let app = router(seeded_repo());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/admin/api/dashboard")
                .header("x-admin-token", "nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn missing_token_configuration_fails_closed() {
    let repo = seeded_repo();
    let state = AppState {
        dashboard: common::dashboard_service(repo, noop()),
        auth: AuthSettings { admin_token: None },
        rate_limiter: ApiRateLimiter::new(Duration::from_secs(60), 1000),
        realtime: None,
        db: None,
        default_limit: 20,
    };
    let app = build_router(state);

    let response = app
        .oneshot(
            authed(Request::builder().uri("/admin/api/dashboard"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "misconfigured");
}

#[tokio::test]
async fn malformed_page_parameter_is_a_bad_request() {
    let app = router(seeded_repo());

    let response = app
        .oneshot(
            authed(Request::builder().uri("/admin/api/dashboard?page=abc"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn dashboard_assembles_all_sections_with_cache_headers() {
    let app = router(seeded_repo());

    let response = app
        .oneshot(
            authed(Request::builder().uri("/admin/api/dashboard"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(header::ETAG));
    assert_eq!(
        response.headers()[header::CACHE_CONTROL],
        "private, max-age=10, stale-while-revalidate=30"
    );

    let body = body_json(response).await;
    for key in [
        "stats",
        "activities",
        "activitiesPagination",
        "quotes",
        "quotesPagination",
        "newUsers",
        "newUsersPagination",
        "newsletterSubscribers",
        "newsletterPagination",
        "formSubmissions",
        "formsPagination",
        "timestamp",
        "responseTime",
    ] {
        assert!(body.get(key).is_some(), "missing `{key}` in dashboard body");
    }
    assert_eq!(body["stats"]["totalQuotes"], 3);
    assert_eq!(body["activities"].as_array().unwrap().len(), 7);
    assert_eq!(body["quotesPagination"]["total"], 3);
    assert_eq!(body["quotesPagination"]["hasMore"], false);
}

#[tokio::test]
async fn matching_etag_revalidates_with_304() {
    let repo = seeded_repo();
    let app = router(repo);

    let first = app
        .clone()
        .oneshot(
            authed(Request::builder().uri("/admin/api/dashboard"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let etag = first.headers()[header::ETAG].clone();

    let second = app
        .oneshot(
            authed(Request::builder().uri("/admin/api/dashboard"))
                .header(header::IF_NONE_MATCH, etag.clone())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(second.status(), StatusCode::NOT_MODIFIED);
    assert_eq!(second.headers()[header::ETAG], etag);
    let bytes = second
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn marking_a_submission_read_refreshes_the_dashboard() {
    let repo = seeded_repo();
    let id = repo.submissions.lock().expect("submissions lock")[0].id;
    let (state, realtime) = app_state(repo);
    let mut events = realtime.subscribe();
    let app = build_router(state);

    // Prime the cached forms section.
    let before = app
        .clone()
        .oneshot(
            authed(Request::builder().uri("/admin/api/dashboard"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let before = body_json(before).await;
    assert_eq!(before["formSubmissions"][0]["status"], "new");

    let mutation = app
        .clone()
        .oneshot(
            authed(
                Request::builder()
                    .method("POST")
                    .uri(format!("/admin/api/forms/{id}/read")),
            )
            .body(Body::empty())
            .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(mutation.status(), StatusCode::OK);
    let updated = body_json(mutation).await;
    assert_eq!(updated["status"], "read");

    // The forms section must be served fresh, not from the pre-mutation cache.
    let after = app
        .oneshot(
            authed(Request::builder().uri("/admin/api/dashboard"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let after = body_json(after).await;
    assert_eq!(after["formSubmissions"][0]["status"], "read");

    let event = events.recv().await.expect("push event");
    assert_eq!(event.name, "data:forms:update");
    assert_eq!(event.payload["id"], id.to_string());
}

#[tokio::test]
async fn unknown_submission_is_not_found() {
    let app = router(seeded_repo());

    let response = app
        .oneshot(
            authed(
                Request::builder()
                    .method("POST")
                    .uri(format!("/admin/api/forms/{}/read", Uuid::new_v4())),
            )
            .body(Body::empty())
            .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn patching_a_submission_sets_the_requested_status() {
    let repo = seeded_repo();
    let id = repo.submissions.lock().expect("submissions lock")[0].id;
    let app = router(repo);

    let response = app
        .oneshot(
            authed(
                Request::builder()
                    .method("PATCH")
                    .uri(format!("/admin/api/forms/{id}"))
                    .header(header::CONTENT_TYPE, "application/json"),
            )
            .body(Body::from(r#"{"status":"archived"}"#))
            .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "archived");
}

#[tokio::test]
async fn health_without_a_database_reports_no_content() {
    let app = router(seeded_repo());

    let response = app
        .oneshot(
            authed(Request::builder().uri("/admin/api/health"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}
