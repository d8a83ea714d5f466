//! Main controller implementation.
//!
//! This module contains the `Controller` struct that wires the clients,
//! starts the Shoot watcher and the probe server, and runs until one of
//! them exits.

use crate::config::ControllerConfig;
use crate::error::ControllerError;
use crate::metrics::{self, Metrics};
use crate::reconciler::Reconciler;
use crate::watcher::Watcher;
use cloud_config::ScriptTemplates;
use crds::Shoot;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Api, Client};
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// Main controller for Shoot node bootstrapping.
pub struct Controller {
    shoot_watcher: JoinHandle<Result<(), ControllerError>>,
    metrics_server: JoinHandle<Result<(), ControllerError>>,
}

impl Controller {
    /// Creates a new controller instance.
    pub async fn new(config: ControllerConfig) -> Result<Self, ControllerError> {
        info!("Initializing OperatingSystemConfig Controller");

        let seed = Client::try_default().await?;
        let target = match &config.target_kubeconfig {
            Some(path) => {
                info!(kubeconfig = %path.display(), "Using target cluster kubeconfig");
                target_client(path).await?
            }
            None => seed.clone(),
        };

        let templates = Arc::new(ScriptTemplates::new()?);
        let metrics = Arc::new(Metrics::new()?);
        let shoot_api: Api<Shoot> = match &config.namespace {
            Some(ns) => Api::namespaced(seed.clone(), ns),
            None => Api::all(seed.clone()),
        };
        let metrics_addr = config.metrics_addr;

        let reconciler = Arc::new(Reconciler::new(seed, target, templates, config, metrics.clone()));
        let watcher = Watcher::new(reconciler, shoot_api);

        let shoot_watcher = tokio::spawn(async move { watcher.watch_shoots().await });
        let metrics_server = tokio::spawn(metrics::serve(metrics_addr, metrics));

        Ok(Self {
            shoot_watcher,
            metrics_server,
        })
    }

    /// Runs the controller until shutdown.
    pub async fn run(mut self) -> Result<(), ControllerError> {
        info!("OperatingSystemConfig Controller running");

        // Wait for any task to exit (they should run forever)
        tokio::select! {
            result = &mut self.shoot_watcher => {
                result.map_err(|e| ControllerError::Watch(format!("Shoot watcher panicked: {}", e)))?
                    .map_err(|e| ControllerError::Watch(format!("Shoot watcher error: {}", e)))?;
            }
            result = &mut self.metrics_server => {
                result.map_err(|e| ControllerError::Watch(format!("Metrics server panicked: {}", e)))??;
            }
        }

        Ok(())
    }
}

/// Client for the cluster the nodes join.
async fn target_client(path: &Path) -> Result<Client, ControllerError> {
    let kubeconfig = Kubeconfig::read_from(path)?;
    let config = kube::Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default()).await?;
    Ok(Client::try_from(config)?)
}
