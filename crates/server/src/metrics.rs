//! Prometheus metrics
//!
//! Counters are recorded through the `metrics` facade across the workspace
//! and rendered here in Prometheus text format.

use axum::http::StatusCode;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the global Prometheus recorder
///
/// Safe to call more than once; only the first call installs. Returns None
/// when another recorder was already installed by someone else.
pub fn init_metrics() -> Option<PrometheusHandle> {
    HANDLE
        .get_or_try_init(|| PrometheusBuilder::new().install_recorder())
        .map_err(|e| tracing::warn!(error = %e, "Failed to install Prometheus recorder"))
        .ok()
        .cloned()
}

/// Count one submitted visitor message by outcome
pub fn record_turn(outcome: &'static str) {
    metrics::counter!("enrollment_turns_total", "outcome" => outcome).increment(1);
}

/// GET /metrics
pub async fn metrics_handler() -> (StatusCode, String) {
    match HANDLE.get() {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "metrics recorder not installed\n".to_string(),
        ),
    }
}
