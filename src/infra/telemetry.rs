use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "vetrina_cache_hit_total",
            Unit::Count,
            "Total number of dashboard cache hits."
        );
        describe_counter!(
            "vetrina_cache_miss_total",
            Unit::Count,
            "Total number of dashboard cache misses."
        );
        describe_counter!(
            "vetrina_cache_invalidation_total",
            Unit::Count,
            "Total number of prefix invalidations issued against the dashboard cache."
        );
        describe_counter!(
            "vetrina_cache_swept_total",
            Unit::Count,
            "Total number of expired cache entries reclaimed by the sweeper."
        );
        describe_counter!(
            "vetrina_activity_source_failure_total",
            Unit::Count,
            "Total number of activity source fetches that failed or timed out."
        );
        describe_histogram!(
            "vetrina_dashboard_build_duration_seconds",
            Unit::Seconds,
            "Wall time spent assembling the full dashboard payload."
        );
    });
}
