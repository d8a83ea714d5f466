//! Shoot watcher.
//!
//! Drives [`Reconciler::reconcile_shoot`] from a `kube_runtime::Controller`
//! which handles reconnection, queueing and requeues. Failed reconciliations
//! are requeued with the per-Shoot Fibonacci backoff.

use crate::error::ControllerError;
use crate::reconciler::{Reconciler, resource_key};
use crds::Shoot;
use futures::StreamExt;
use kube::Api;
use kube_runtime::controller::{Action, Config as RuntimeConfig};
use kube_runtime::{Controller, watcher};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Watches Shoots and triggers reconciliation.
pub struct Watcher {
    reconciler: Arc<Reconciler>,
    shoot_api: Api<Shoot>,
}

impl Watcher {
    /// Creates a new watcher instance.
    pub fn new(reconciler: Arc<Reconciler>, shoot_api: Api<Shoot>) -> Self {
        Self { reconciler, shoot_api }
    }

    /// Starts watching Shoot resources. Runs until the watch stream ends.
    pub async fn watch_shoots(&self) -> Result<(), ControllerError> {
        info!("Starting Shoot watcher");

        let error_policy = |shoot: Arc<Shoot>, error: &ControllerError, ctx: Arc<Reconciler>| {
            let key = resource_key(&shoot);
            let (backoff, error_count) = ctx.get_backoff_for_resource(&key);
            error!(
                shoot = %key,
                error = %error,
                error_count,
                requeue_seconds = backoff.as_secs(),
                "Reconciliation error, requeueing"
            );
            Action::requeue(backoff)
        };

        let reconcile = |shoot: Arc<Shoot>, ctx: Arc<Reconciler>| async move {
            debug!(shoot = %resource_key(&shoot), "Reconciling Shoot");
            ctx.reconcile_shoot(&shoot).await
        };

        // Debounce batches bursts of events, e.g. our own status patches
        let runtime_config = RuntimeConfig::default()
            .debounce(Duration::from_secs(5))
            .concurrency(3);

        self.reconciler.metrics.set_ready();

        Controller::new(self.shoot_api.clone(), watcher::Config::default())
            .with_config(runtime_config)
            .run(reconcile, error_policy, self.reconciler.clone())
            .for_each(|res| async move {
                match res {
                    Ok((object, _)) => debug!(shoot = %object.name, "Reconciled"),
                    Err(e) => error!("Controller error for Shoot: {}", e),
                }
            })
            .await;

        Ok(())
    }
}
