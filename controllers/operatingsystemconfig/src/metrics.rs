//! Probe and metrics endpoints.
//!
//! Serves `/healthz`, `/readyz` and the Prometheus text format on `/metrics`.

use crate::error::ControllerError;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use prometheus::{Encoder, IntCounter, Registry, TextEncoder};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Reconciliation counters and readiness flag.
#[derive(Debug)]
pub struct Metrics {
    registry: Registry,
    /// Shoot reconciliations started
    pub reconciliations: IntCounter,
    /// Shoot reconciliations that failed
    pub reconciliation_errors: IntCounter,
    ready: AtomicBool,
}

impl Metrics {
    /// Creates and registers the counters.
    pub fn new() -> Result<Self, ControllerError> {
        let registry = Registry::new();
        let reconciliations = IntCounter::new("osc_reconciliations_total", "Number of Shoot reconciliations")?;
        let reconciliation_errors =
            IntCounter::new("osc_reconciliation_errors_total", "Number of failed Shoot reconciliations")?;
        registry.register(Box::new(reconciliations.clone()))?;
        registry.register(Box::new(reconciliation_errors.clone()))?;

        Ok(Self {
            registry,
            reconciliations,
            reconciliation_errors,
            ready: AtomicBool::new(false),
        })
    }

    /// Marks the controller as ready once its watchers run.
    pub fn set_ready(&self) {
        self.ready.store(true, Ordering::Relaxed);
    }

    fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// Routes of the probe and metrics server.
pub fn router(metrics: Arc<Metrics>) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(metrics)
}

async fn readyz(State(metrics): State<Arc<Metrics>>) -> (StatusCode, &'static str) {
    if metrics.ready.load(Ordering::Relaxed) {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not ready")
    }
}

async fn metrics_handler(State(metrics): State<Arc<Metrics>>) -> Result<String, (StatusCode, String)> {
    metrics
        .encode()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

/// Serves the probe and metrics endpoints until the listener fails.
pub async fn serve(addr: SocketAddr, metrics: Arc<Metrics>) -> Result<(), ControllerError> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "Metrics server started");
    axum::serve(listener, router(metrics)).await?;
    Ok(())
}
