//! # Prometheus Metrics
//!
//! Ledger metrics for the `run` command, served at `/metrics` when
//! `--metrics` is given. All handles live in a dedicated registry prefixed
//! with `chainlog_`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use prometheus::core::Collector;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};
use std::sync::Arc;

/// Metric handles for one ledger process.
///
/// Prometheus handles are reference counted, so clones update the same
/// series.
#[derive(Clone)]
pub struct LedgerMetrics {
    registry: Registry,
    /// Blocks appended by this process.
    pub blocks_appended_total: IntCounter,
    /// Height of the current tip.
    pub block_height: IntGauge,
    /// Heights flagged by the most recent audit.
    pub validation_errors: IntGauge,
    /// Wall time of a single append, including the store write.
    pub append_latency_seconds: Histogram,
}

fn register<C>(registry: &Registry, collector: C) -> Result<C, prometheus::Error>
where
    C: Collector + Clone + 'static,
{
    registry.register(Box::new(collector.clone()))?;
    Ok(collector)
}

impl LedgerMetrics {
    /// Creates and registers all metrics.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("chainlog".into()), None)?;

        let blocks_appended_total = register(
            &registry,
            IntCounter::new(
                "blocks_appended_total",
                "Total number of blocks appended by this process",
            )?,
        )?;

        let block_height = register(
            &registry,
            IntGauge::new("block_height", "Height of the latest block in the chain")?,
        )?;

        let validation_errors = register(
            &registry,
            IntGauge::new(
                "validation_errors",
                "Number of heights flagged by the last chain audit",
            )?,
        )?;

        let append_latency_seconds = register(
            &registry,
            Histogram::with_opts(
                HistogramOpts::new(
                    "append_latency_seconds",
                    "Time taken to seal and persist one block, in seconds",
                )
                .buckets(vec![
                    0.0001, 0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
                ]),
            )?,
        )?;

        Ok(Self {
            registry,
            blocks_appended_total,
            block_height,
            validation_errors,
            append_latency_seconds,
        })
    }

    /// Renders every registered metric in the Prometheus text format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// Metrics handle shared with the HTTP handler and the append loop.
pub type SharedMetrics = Arc<LedgerMetrics>;

/// Renders `/metrics`. Responds 500 if encoding fails.
pub async fn metrics_handler(State(metrics): State<SharedMetrics>) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}

/// Router exposing `/metrics`.
pub fn router(metrics: SharedMetrics) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics)
}
