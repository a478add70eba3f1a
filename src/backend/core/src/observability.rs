//! Observability: logging and metrics.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` when set, falling back to the configured log level.
pub fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));

    if config.json_logging {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Install the Prometheus metrics recorder and return the render handle.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    register_metrics();
    Ok(handle)
}

/// Register all metric descriptions.
pub fn register_metrics() {
    use metrics::{describe_counter, describe_histogram};

    describe_counter!(
        "scribe_writes_total",
        "Write operations by operation and commit outcome"
    );
    describe_counter!(
        "scribe_events_published_total",
        "Change events successfully published"
    );
    describe_counter!(
        "scribe_publish_failures_total",
        "Change events that failed to publish after a successful commit"
    );
    describe_counter!(
        "scribe_errors_total",
        "Errors constructed, by code and category"
    );
    describe_counter!(
        "scribe_store_puts_total",
        "Record store put operations"
    );
    describe_counter!(
        "scribe_store_deletes_total",
        "Record store delete operations"
    );
    describe_histogram!(
        "scribe_request_duration_seconds",
        "HTTP request latency"
    );
}
