//! # Prometheus Metrics
//!
//! Exposes operational metrics for the operator node. Scraped by Prometheus
//! at the `/metrics` HTTP endpoint on the configured metrics port.
//!
//! All metrics are registered in a dedicated [`prometheus::Registry`] so they
//! do not collide with any default global registry consumers.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

use ifc_protocol::ProtocolError;

/// Holds all Prometheus metric handles for the node.
///
/// Clone-friendly (prometheus handles are `Arc`s internally) so it can be
/// shared across request handlers.
#[derive(Clone)]
pub struct NodeMetrics {
    registry: Registry,
    /// Payment commitments signed.
    pub payments_signed_total: IntCounter,
    /// Stage transitions submitted, by kind (commit, finalize, exonerate, penalize).
    pub stage_transitions_total: IntCounterVec,
    /// Exoneration slices that did not reconstruct the committed root.
    pub rejected_slices_total: IntCounter,
    /// Failed calls to the booster or the chain, by target.
    pub upstream_failures_total: IntCounterVec,
    /// Time to encode, hash and sign one payment.
    pub signing_latency_seconds: Histogram,
}

impl NodeMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("ifc".into()), None)?;

        let payments_signed_total = IntCounter::new(
            "payments_signed_total",
            "Total number of payment commitments signed",
        )?;
        registry.register(Box::new(payments_signed_total.clone()))?;

        let stage_transitions_total = IntCounterVec::new(
            Opts::new(
                "stage_transitions_total",
                "Stage transitions submitted to the anchor contract",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(stage_transitions_total.clone()))?;

        let rejected_slices_total = IntCounter::new(
            "rejected_slices_total",
            "Exoneration slices rejected before submission",
        )?;
        registry.register(Box::new(rejected_slices_total.clone()))?;

        let upstream_failures_total = IntCounterVec::new(
            Opts::new(
                "upstream_failures_total",
                "Failed calls to the booster gateway or the chain node",
            ),
            &["target"],
        )?;
        registry.register(Box::new(upstream_failures_total.clone()))?;

        let signing_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "signing_latency_seconds",
                "Payment encode-and-sign latency in seconds",
            )
            .buckets(vec![0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1]),
        )?;
        registry.register(Box::new(signing_latency_seconds.clone()))?;

        Ok(Self {
            registry,
            payments_signed_total,
            stage_transitions_total,
            rejected_slices_total,
            upstream_failures_total,
            signing_latency_seconds,
        })
    }

    /// Count a submitted transition.
    pub fn record_transition(&self, kind: &str) {
        self.stage_transitions_total.with_label_values(&[kind]).inc();
    }

    /// Count the failures worth alerting on. Caller errors are not counted.
    pub fn record_failure(&self, err: &ProtocolError) {
        match err {
            ProtocolError::SliceMismatch(_) => self.rejected_slices_total.inc(),
            ProtocolError::Gateway { .. } => self
                .upstream_failures_total
                .with_label_values(&["gateway"])
                .inc(),
            ProtocolError::ChainSubmission { .. } => self
                .upstream_failures_total
                .with_label_values(&["chain"])
                .inc(),
            _ => {}
        }
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// Shared metrics state passed to axum handlers.
pub type SharedMetrics = Arc<NodeMetrics>;

/// Axum handler that renders `/metrics` in Prometheus text format.
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_are_classified() {
        let metrics = NodeMetrics::new().unwrap();
        metrics.record_failure(&ProtocolError::SliceMismatch("x".into()));
        metrics.record_failure(&ProtocolError::gateway("/slice", Some(503), "down"));
        metrics.record_failure(&ProtocolError::chain("finalize", "reverted"));
        metrics.record_failure(&ProtocolError::InvalidType("x".into()));

        assert_eq!(metrics.rejected_slices_total.get(), 1);
        assert_eq!(
            metrics
                .upstream_failures_total
                .with_label_values(&["gateway"])
                .get(),
            1
        );
        assert_eq!(
            metrics
                .upstream_failures_total
                .with_label_values(&["chain"])
                .get(),
            1
        );
    }

    #[test]
    fn encodes_with_namespace() {
        let metrics = NodeMetrics::new().unwrap();
        metrics.record_transition("commit");
        let text = metrics.encode().unwrap();
        assert!(text.contains("ifc_stage_transitions_total{kind=\"commit\"} 1"));
    }
}
