use std::{process, sync::Arc, time::Duration};

use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;
use vetrina::{
    application::{
        activity::ActivityFeedService,
        dashboard::DashboardService,
        error::AppError,
        notify::{BroadcastNotifier, SharedNotifier, noop_notifier},
        repos::{CheckoutsRepo, CustomersRepo, FormsRepo, FormsWriteRepo, NewsletterRepo, QuotesRepo},
    },
    cache::{Cache, CacheConfig},
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, ApiRateLimiter, AppState},
        telemetry,
    },
};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (_cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    let database_url = settings.database.url.clone().ok_or_else(|| {
        AppError::from(InfraError::configuration(
            "database.url is required (set VETRINA__DATABASE__URL or --database-url)",
        ))
    })?;

    let pool = PostgresRepositories::connect(
        &database_url,
        settings.database.max_connections.get(),
    )
    .await
    .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;
    let repositories = PostgresRepositories::new(pool);

    let cache_config = CacheConfig::from(&settings.cache);
    let cache = if cache_config.is_enabled() {
        Cache::in_memory()
    } else {
        Cache::disabled()
    };

    // Expiry is lazy; the sweeper only reclaims memory between requests.
    let sweeper = cache_config
        .is_enabled()
        .then(|| cache_config.sweep_interval())
        .flatten()
        .map(|interval| {
            let store = cache.store();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(interval);
                ticker.tick().await;
                loop {
                    ticker.tick().await;
                    store.sweep().await;
                }
            })
        });

    let realtime = settings
        .realtime
        .enabled
        .then(|| BroadcastNotifier::new(settings.realtime.channel_capacity));
    let notifier: SharedNotifier = match realtime.clone() {
        Some(broadcast) => Arc::new(broadcast),
        None => noop_notifier(),
    };

    let quotes: Arc<dyn QuotesRepo> = Arc::new(repositories.clone());
    let customers: Arc<dyn CustomersRepo> = Arc::new(repositories.clone());
    let newsletter: Arc<dyn NewsletterRepo> = Arc::new(repositories.clone());
    let forms: Arc<dyn FormsRepo> = Arc::new(repositories.clone());
    let forms_write: Arc<dyn FormsWriteRepo> = Arc::new(repositories.clone());
    let checkouts: Arc<dyn CheckoutsRepo> = Arc::new(repositories.clone());

    let activity = ActivityFeedService::new(
        quotes.clone(),
        customers.clone(),
        newsletter.clone(),
        forms.clone(),
        checkouts.clone(),
        settings.dashboard.source_timeout,
    );
    let dashboard = DashboardService::new(
        quotes,
        customers,
        newsletter,
        forms,
        forms_write,
        checkouts,
        activity,
        cache,
        notifier,
        cache_config.ttl(),
    );

    let rate_limiter = ApiRateLimiter::new(
        Duration::from_secs(u64::from(settings.api_rate_limit.window_seconds.get())),
        settings.api_rate_limit.max_requests.get(),
    );

    let state = AppState {
        dashboard,
        auth: settings.auth.clone(),
        rate_limiter,
        realtime,
        db: Some(repositories),
        default_limit: settings.dashboard.default_limit,
    };

    let result = serve_http(&settings, state).await;

    if let Some(handle) = sweeper {
        handle.abort();
        let _ = handle.await;
    }

    result
}

async fn serve_http(settings: &config::Settings, state: AppState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "vetrina::server",
        addr = %settings.server.addr,
        "admin dashboard listening"
    );

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!(target = "vetrina::server", "shutdown signal received");
    }
}
