//! OperatingSystemConfig Controller
//!
//! Watches Shoots and bootstraps the nodes of their worker pools:
//! - OperatingSystemConfigs per pool and purpose, fulfilled by a provider extension
//! - Executor payload secrets, bootstrap token and RBAC in the target cluster
//! - Provision user-data handed to the Shoot's Worker
//!
//! Probes and Prometheus metrics are served on `METRICS_ADDR`.

mod backoff;
mod config;
mod controller;
mod error;
mod executor_secrets;
mod metrics;
mod orchestrator;
mod reconciler;
mod watcher;
mod worker;

#[cfg(test)]
mod test_utils;

use crate::config::ControllerConfig;
use crate::error::ControllerError;
use controller::Controller;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if rustls::crypto::ring::default_provider().install_default().is_err() {
        warn!("A rustls crypto provider was already installed");
    }

    info!("Starting OperatingSystemConfig Controller");

    // Load configuration from environment variables
    let config = ControllerConfig::from_env()?;

    info!("Configuration:");
    info!("  Namespace: {}", config.namespace.as_deref().unwrap_or("all namespaces"));
    info!(
        "  Target cluster: {}",
        config
            .target_kubeconfig
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "in-cluster".to_string())
    );
    info!("  Metrics address: {}", config.metrics_addr);
    info!(
        "  Wait: interval {:?}, severe threshold {:?}, timeout {:?}",
        config.wait_interval, config.wait_severe_threshold, config.wait_timeout
    );

    // Initialize and run controller
    let controller = Controller::new(config).await?;
    controller.run().await?;

    Ok(())
}
