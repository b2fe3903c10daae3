//! Prometheus metrics registry for the decision pipeline and HTTP surface.
//!
//! # Design
//! - One registry per process, cloned cheaply through an `Arc`.
//! - Label sets stay bounded: routes come from the router, actions and
//!   failure kinds from fixed enums.

use std::sync::Arc;

use prometheus::core::Collector;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use serde::Serialize;

use crate::error::{Result, TelemetryError};

/// Prometheus-backed metrics registry shared across services.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    http_requests_total: IntCounterVec,
    batches_total: IntCounter,
    files_processed_total: IntCounterVec,
    file_failures_total: IntCounterVec,
    audit_failures_total: IntCounter,
}

/// Snapshot of selected counters for health reporting.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    /// Batches processed since start-up.
    pub batches_total: u64,
    /// Audit records the sink failed to accept.
    pub audit_failures_total: u64,
}

impl Metrics {
    /// Construct a new metrics registry with the standard collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be
    /// built or registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let http_requests_total = counter_vec(
            "http_requests_total",
            "Total HTTP requests received",
            &["route", "code"],
        )?;
        let batches_total = counter("batches_total", "Analyze batches processed")?;
        let files_processed_total = counter_vec(
            "files_processed_total",
            "Files processed by dispatch action",
            &["action"],
        )?;
        let file_failures_total = counter_vec(
            "file_failures_total",
            "Files that finished with an error, by error kind",
            &["kind"],
        )?;
        let audit_failures_total = counter(
            "audit_failures_total",
            "Audit records rejected by the audit sink",
        )?;

        register(&registry, "http_requests_total", &http_requests_total)?;
        register(&registry, "batches_total", &batches_total)?;
        register(&registry, "files_processed_total", &files_processed_total)?;
        register(&registry, "file_failures_total", &file_failures_total)?;
        register(&registry, "audit_failures_total", &audit_failures_total)?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                http_requests_total,
                batches_total,
                files_processed_total,
                file_failures_total,
                audit_failures_total,
            }),
        })
    }

    /// Increment the HTTP request counter for the given route and status code.
    pub fn inc_http_request(&self, route: &str, status: u16) {
        let code = status.to_string();
        self.inner
            .http_requests_total
            .with_label_values(&[route, code.as_str()])
            .inc();
    }

    /// Increment the processed batch counter.
    pub fn inc_batch(&self) {
        self.inner.batches_total.inc();
    }

    /// Increment the processed file counter for a dispatch action.
    pub fn inc_file(&self, action: &str) {
        self.inner
            .files_processed_total
            .with_label_values(&[action])
            .inc();
    }

    /// Increment the failed file counter for an error kind.
    pub fn inc_file_failure(&self, kind: &str) {
        self.inner
            .file_failures_total
            .with_label_values(&[kind])
            .inc();
    }

    /// Increment the rejected audit record counter.
    pub fn inc_audit_failure(&self) {
        self.inner.audit_failures_total.inc();
    }

    /// Current value of the processed file counter for `action`.
    #[must_use]
    pub fn files_processed(&self, action: &str) -> u64 {
        self.inner
            .files_processed_total
            .with_label_values(&[action])
            .get()
    }

    /// Current value of the failed file counter for `kind`.
    #[must_use]
    pub fn file_failures(&self, kind: &str) -> u64 {
        self.inner
            .file_failures_total
            .with_label_values(&[kind])
            .get()
    }

    /// Render the metrics registry using the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics cannot be encoded or if the encoded
    /// buffer is not valid UTF-8.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|source| TelemetryError::Render { source })?;
        String::from_utf8(buffer).map_err(|source| TelemetryError::RenderUtf8 { source })
    }

    /// Take a point-in-time snapshot of the scalar counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            batches_total: self.inner.batches_total.get(),
            audit_failures_total: self.inner.audit_failures_total.get(),
        }
    }
}

fn counter(name: &'static str, help: &str) -> Result<IntCounter> {
    IntCounter::with_opts(Opts::new(name, help))
        .map_err(|source| TelemetryError::Counter {
            name,
            stage: "build",
            source,
        })
}

fn counter_vec(name: &'static str, help: &str, labels: &[&str]) -> Result<IntCounterVec> {
    IntCounterVec::new(Opts::new(name, help), labels)
        .map_err(|source| TelemetryError::Counter {
            name,
            stage: "build",
            source,
        })
}

fn register<C>(registry: &Registry, name: &'static str, collector: &C) -> Result<()>
where
    C: Collector + Clone + 'static,
{
    registry
        .register(Box::new(collector.clone()))
        .map_err(|source| TelemetryError::Counter {
            name,
            stage: "register",
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_and_render() {
        let metrics = Metrics::new().expect("metrics");
        metrics.inc_http_request("/v1/analyze", 200);
        metrics.inc_batch();
        metrics.inc_file("streamed");
        metrics.inc_file("streamed");
        metrics.inc_file_failure("probe_failed");
        metrics.inc_audit_failure();

        assert_eq!(metrics.files_processed("streamed"), 2);
        assert_eq!(metrics.file_failures("probe_failed"), 1);
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.batches_total, 1);
        assert_eq!(snapshot.audit_failures_total, 1);

        let rendered = metrics.render().expect("render");
        assert!(rendered.contains("http_requests_total"));
        assert!(rendered.contains("route=\"/v1/analyze\""));
        assert!(rendered.contains("files_processed_total"));
    }

    #[test]
    fn registries_are_independent() {
        let first = Metrics::new().expect("metrics");
        let second = Metrics::new().expect("metrics");
        first.inc_batch();
        assert_eq!(first.snapshot().batches_total, 1);
        assert_eq!(second.snapshot().batches_total, 0);
    }
}
