//! Metrics collection for contact-service.
//!
//! HTTP metrics go through the `metrics` facade; delivery counters live in a
//! `prometheus` registry appended to the same `/metrics` output.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use prometheus::{IntCounterVec, Opts, Registry};
use std::sync::OnceLock;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
pub static PROMETHEUS_REGISTRY: OnceLock<Registry> = OnceLock::new();
pub static CONTACT_SUBMISSIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static CONTACT_PROVIDER_CALLS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize metrics collection. Safe to call more than once; later calls
/// are ignored.
pub fn init_metrics() {
    if METRICS_HANDLE.get().is_some() {
        return;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            let _ = METRICS_HANDLE.set(handle);
        }
        Err(e) => tracing::warn!(error = %e, "Failed to install Prometheus recorder"),
    }

    let registry = Registry::new();

    let submissions_counter = IntCounterVec::new(
        Opts::new(
            "contact_submissions_total",
            "Contact form submissions by outcome",
        ),
        &["outcome"],
    );
    let provider_calls_counter = IntCounterVec::new(
        Opts::new(
            "contact_provider_calls_total",
            "Email provider calls by provider and status",
        ),
        &["provider", "status"],
    );

    let (submissions_counter, provider_calls_counter) =
        match (submissions_counter, provider_calls_counter) {
            (Ok(s), Ok(p)) => (s, p),
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!(error = %e, "Failed to create contact metrics");
                return;
            }
        };

    for collector in [submissions_counter.clone(), provider_calls_counter.clone()] {
        if let Err(e) = registry.register(Box::new(collector)) {
            tracing::warn!(error = %e, "Failed to register contact metric");
        }
    }

    let _ = PROMETHEUS_REGISTRY.set(registry);
    let _ = CONTACT_SUBMISSIONS_TOTAL.set(submissions_counter);
    let _ = CONTACT_PROVIDER_CALLS_TOTAL.set(provider_calls_counter);
}

/// Get metrics output in Prometheus text format.
pub fn get_metrics() -> String {
    let mut output = METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string());

    if let Some(registry) = PROMETHEUS_REGISTRY.get() {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).ok();
        if let Ok(custom_metrics) = String::from_utf8(buffer) {
            output.push_str(&custom_metrics);
        }
    }

    output
}

/// Record the final outcome of a submission: `primary`, `fallback`,
/// `failed` or `invalid`.
pub fn record_submission(outcome: &str) {
    if let Some(counter) = CONTACT_SUBMISSIONS_TOTAL.get() {
        counter.with_label_values(&[outcome]).inc();
    }
}

/// Record a provider call.
pub fn record_provider_call(provider: &str, status: &str) {
    if let Some(counter) = CONTACT_PROVIDER_CALLS_TOTAL.get() {
        counter.with_label_values(&[provider, status]).inc();
    }
}
