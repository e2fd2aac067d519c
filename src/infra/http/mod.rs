pub mod dashboard;
pub mod error;
pub mod events;
pub mod forms;
pub mod middleware;
pub mod rate_limit;

pub use rate_limit::ApiRateLimiter;

use axum::{
    Router,
    http::StatusCode,
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use sqlx::Error as SqlxError;

use crate::application::dashboard::DashboardService;
use crate::application::error::ErrorReport;
use crate::application::notify::BroadcastNotifier;
use crate::config::AuthSettings;
use crate::infra::db::PostgresRepositories;

#[derive(Clone)]
pub struct AppState {
    pub dashboard: DashboardService,
    pub auth: AuthSettings,
    pub rate_limiter: ApiRateLimiter,
    pub realtime: Option<BroadcastNotifier>,
    pub db: Option<PostgresRepositories>,
    pub default_limit: u32,
}

pub fn build_router(state: AppState) -> Router {
    let auth_state = state.clone();
    let rate_state = state.clone();

    Router::new()
        .route("/admin/api/dashboard", get(dashboard::get_dashboard))
        .route(
            "/admin/api/forms/{id}",
            get(forms::get_submission).patch(forms::update_submission_status),
        )
        .route("/admin/api/forms/{id}/read", post(forms::mark_submission_read))
        .route("/admin/api/events", get(events::subscribe))
        .route("/admin/api/health", get(health))
        .with_state(state)
        .layer(axum_middleware::from_fn_with_state(
            rate_state,
            middleware::admin_rate_limit,
        ))
        .layer(axum_middleware::from_fn_with_state(
            auth_state,
            middleware::admin_auth,
        ))
        .layer(axum_middleware::from_fn(middleware::set_request_context))
        .layer(axum_middleware::from_fn(middleware::log_responses))
}

async fn health(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Response {
    match state.db.as_ref() {
        Some(db) => db_health_response(db.health_check().await),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

fn db_health_response(result: Result<(), SqlxError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}
