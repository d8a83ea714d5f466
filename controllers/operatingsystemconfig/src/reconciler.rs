//! Shoot reconciliation.
//!
//! A Shoot reconcile deploys the OperatingSystemConfigs of its pools, waits
//! for the provider extension, writes the executor payload secrets into the
//! target cluster and hands the provision user-data to the Worker. The
//! `gardener.cloud/operation` annotation on the Shoot switches to the restore
//! or migrate flow. Deleting a Shoot removes its configs before the
//! finalizer is released.

use crate::backoff::FibonacciBackoff;
use crate::config::ControllerConfig;
use crate::error::ControllerError;
use crate::executor_secrets;
use crate::metrics::Metrics;
use crate::orchestrator::OperatingSystemConfigOrchestrator;
use crate::orchestrator::spec::{Values, parse_version};
use crate::orchestrator::wait::WaitConfig;
use crate::worker;
use chrono::Utc;
use cloud_config::{ScriptTemplates, downloader};
use crds::{ANNOTATION_OPERATION, OPERATION_MIGRATE, OPERATION_RESTORE, Shoot, ShootPhase, WorkerPoolStatus};
use k8s_openapi::api::core::v1::Secret;
use kube::api::{Api, Patch, PatchParams};
use kube::{Client, Resource, ResourceExt};
use kube_runtime::controller::Action;
use semver::Version;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Finalizer guarding the OperatingSystemConfigs of a Shoot.
pub const FINALIZER: &str = "core.nodeboot.io/operatingsystemconfig";

/// Key of the SSH public keys in the Shoot's SSH secret.
pub const DATA_KEY_SSH_PUBLIC_KEY: &str = "id_rsa.pub";

/// Requeue interval of a healthy Shoot, keeps bootstrap tokens fresh.
const RESYNC_INTERVAL: Duration = Duration::from_secs(3600);

/// Backoff state for a resource
#[derive(Debug, Clone)]
struct BackoffState {
    backoff: FibonacciBackoff,
    error_count: u32,
}

impl BackoffState {
    fn new() -> Self {
        Self {
            backoff: FibonacciBackoff::default(),
            error_count: 0,
        }
    }

    fn increment_error(&mut self) {
        self.error_count += 1;
    }

    fn reset(&mut self) {
        self.error_count = 0;
        self.backoff.reset();
    }
}

/// `namespace/name` of a Shoot.
pub fn resource_key(shoot: &Shoot) -> String {
    format!("{}/{}", shoot.namespace().unwrap_or_default(), shoot.name_any())
}

/// Reconciles Shoots.
pub struct Reconciler {
    seed: Client,
    target: Client,
    templates: Arc<ScriptTemplates>,
    config: ControllerConfig,
    pub(crate) metrics: Arc<Metrics>,
    /// Error count tracking per resource (namespace/name -> BackoffState)
    backoff_states: Arc<Mutex<HashMap<String, BackoffState>>>,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler").field("config", &self.config).finish_non_exhaustive()
    }
}

impl Reconciler {
    /// Creates a reconciler. `seed` hosts Shoots, OperatingSystemConfigs and
    /// Workers, `target` is the cluster the nodes join.
    pub fn new(
        seed: Client,
        target: Client,
        templates: Arc<ScriptTemplates>,
        config: ControllerConfig,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            seed,
            target,
            templates,
            config,
            metrics,
            backoff_states: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn wait_config(&self) -> WaitConfig {
        WaitConfig {
            interval: self.config.wait_interval,
            severe_threshold: self.config.wait_severe_threshold,
            timeout: self.config.wait_timeout,
        }
    }

    /// Reconciles a Shoot and records the outcome in its status.
    pub async fn reconcile_shoot(&self, shoot: &Shoot) -> Result<Action, ControllerError> {
        let name = shoot.name_any();
        let Some(namespace) = shoot.namespace() else {
            return Err(ControllerError::InvalidConfig(format!("Shoot {name} has no namespace")));
        };
        let key = resource_key(shoot);
        let api: Api<Shoot> = Api::namespaced(self.seed.clone(), &namespace);
        self.metrics.reconciliations.inc();

        let result = if shoot.metadata.deletion_timestamp.is_some() {
            self.reconcile_delete(&api, shoot, &namespace).await
        } else {
            self.reconcile_apply(&api, shoot, &namespace).await
        };

        match result {
            Ok(action) => {
                self.reset_error(&key);
                Ok(action)
            }
            Err(e) => {
                self.metrics.reconciliation_errors.inc();
                self.increment_error(&key);
                error!(shoot = %key, error = %e, "Shoot reconciliation failed");
                if let Err(status_err) = self
                    .patch_status(&api, shoot, ShootPhase::Failed, Some(e.to_string()), None)
                    .await
                {
                    warn!(shoot = %key, error = %status_err, "Failed to record failure in status");
                }
                Err(e)
            }
        }
    }

    async fn reconcile_apply(&self, api: &Api<Shoot>, shoot: &Shoot, namespace: &str) -> Result<Action, ControllerError> {
        let name = shoot.name_any();
        self.ensure_finalizer(api, shoot).await?;
        if shoot.status.as_ref().and_then(|s| s.phase.as_ref()).is_none() {
            self.patch_status(api, shoot, ShootPhase::Pending, None, None).await?;
        }

        let operation = shoot.annotations().get(ANNOTATION_OPERATION).cloned();
        let version = parse_version(&shoot.spec.kubernetes.version)?;
        let mut values = self.values(shoot, namespace, version);
        values.ca_bundle = self
            .read_secret_key(namespace, &shoot.spec.ca_secret_name, downloader::DATA_KEY_CA_BUNDLE)
            .await?;
        if values.ca_bundle.is_none() {
            warn!(shoot = %name, secret = %shoot.spec.ca_secret_name, "No CA bundle found");
        }
        if let Some(ssh_secret) = &shoot.spec.ssh_keys_secret_name {
            values.ssh_public_keys = self
                .read_secret_key(namespace, ssh_secret, DATA_KEY_SSH_PUBLIC_KEY)
                .await?
                .map(|keys| split_keys(&keys))
                .unwrap_or_default();
        }

        let orchestrator =
            OperatingSystemConfigOrchestrator::new(self.seed.clone(), self.templates.clone(), values, self.wait_config());

        match operation.as_deref() {
            Some(OPERATION_MIGRATE) => {
                info!(shoot = %name, namespace = %namespace, "Migrating OperatingSystemConfigs");
                orchestrator.migrate().await?;
                orchestrator.wait_migrate().await?;
                self.clear_operation(api, &name).await?;
                return Ok(Action::await_change());
            }
            Some(OPERATION_RESTORE) => {
                info!(shoot = %name, namespace = %namespace, "Restoring OperatingSystemConfigs");
                orchestrator.restore().await?;
            }
            _ => orchestrator.deploy().await?,
        }
        orchestrator.wait().await?;
        orchestrator.delete_stale().await?;

        let results = orchestrator.worker_name_to_operating_system_configs();
        executor_secrets::reconcile(&self.seed, &self.target, &self.templates, orchestrator.values(), &results).await?;
        worker::hand_off_user_data(&self.seed, namespace, &name, &results).await?;

        if operation.is_some() {
            self.clear_operation(api, &name).await?;
        }

        let mut worker_pools = Vec::new();
        for pool in orchestrator.values().deployable_pools() {
            worker_pools.push(WorkerPoolStatus {
                name: pool.name.clone(),
                key: orchestrator.values().pool_key(pool)?,
                units: results.get(&pool.name).map(|o| o.original.units.clone()).unwrap_or_default(),
            });
        }
        self.patch_status(api, shoot, ShootPhase::Ready, None, Some(worker_pools)).await?;

        info!(shoot = %name, namespace = %namespace, "Shoot reconciled");
        Ok(Action::requeue(RESYNC_INTERVAL))
    }

    async fn reconcile_delete(&self, api: &Api<Shoot>, shoot: &Shoot, namespace: &str) -> Result<Action, ControllerError> {
        if !shoot.finalizers().iter().any(|f| f == FINALIZER) {
            return Ok(Action::await_change());
        }
        let name = shoot.name_any();
        self.patch_status(api, shoot, ShootPhase::Deleting, None, None).await?;

        // only the namespace matters when deleting
        let version = parse_version(&shoot.spec.kubernetes.version).unwrap_or_else(|_| Version::new(0, 0, 0));
        let orchestrator = OperatingSystemConfigOrchestrator::new(
            self.seed.clone(),
            self.templates.clone(),
            self.values(shoot, namespace, version),
            self.wait_config(),
        );
        orchestrator.destroy().await?;
        orchestrator.wait_cleanup().await?;

        self.remove_finalizer(api, shoot).await?;
        info!(shoot = %name, namespace = %namespace, "OperatingSystemConfigs removed");
        Ok(Action::await_change())
    }

    fn values(&self, shoot: &Shoot, namespace: &str, kubernetes_version: Version) -> Values {
        Values {
            namespace: namespace.to_string(),
            owner_reference: shoot.controller_owner_ref(&()),
            kubernetes_version,
            workers: shoot.spec.provider.workers.clone(),
            api_server_url: shoot.spec.api_server_url.clone(),
            ca_secret_name: shoot.spec.ca_secret_name.clone(),
            ca_bundle: None,
            ssh_public_keys: Vec::new(),
            cluster_dns: shoot.spec.kubernetes.cluster_dns.clone(),
            cluster_domain: shoot.spec.kubernetes.cluster_domain.clone(),
            hyperkube_image_repository: self.config.hyperkube_image_repository.clone(),
            pause_image: self.config.pause_image.clone(),
            extension_type: self.config.extension_type.clone(),
        }
    }

    async fn read_secret_key(&self, namespace: &str, name: &str, key: &str) -> Result<Option<String>, ControllerError> {
        let api: Api<Secret> = Api::namespaced(self.seed.clone(), namespace);
        Ok(api
            .get_opt(name)
            .await?
            .and_then(|secret| secret.data)
            .and_then(|mut data| data.remove(key))
            .and_then(|value| String::from_utf8(value.0).ok()))
    }

    async fn ensure_finalizer(&self, api: &Api<Shoot>, shoot: &Shoot) -> Result<(), ControllerError> {
        let mut finalizers = shoot.finalizers().to_vec();
        if finalizers.iter().any(|f| f == FINALIZER) {
            return Ok(());
        }
        finalizers.push(FINALIZER.to_string());

        let patch = json!({ "metadata": { "finalizers": finalizers } });
        api.patch(&shoot.name_any(), &PatchParams::default(), &Patch::Merge(&patch)).await?;
        debug!(shoot = %resource_key(shoot), "Added finalizer");
        Ok(())
    }

    async fn remove_finalizer(&self, api: &Api<Shoot>, shoot: &Shoot) -> Result<(), ControllerError> {
        let finalizers: Vec<&String> = shoot.finalizers().iter().filter(|f| *f != FINALIZER).collect();

        let patch = json!({ "metadata": { "finalizers": finalizers } });
        match api.patch(&shoot.name_any(), &PatchParams::default(), &Patch::Merge(&patch)).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(e)) if e.code == 404 => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn clear_operation(&self, api: &Api<Shoot>, name: &str) -> Result<(), ControllerError> {
        let patch = json!({ "metadata": { "annotations": { ANNOTATION_OPERATION: null } } });
        api.patch(name, &PatchParams::default(), &Patch::Merge(&patch)).await?;
        Ok(())
    }

    /// Writes the status unless nothing but the timestamp would change.
    async fn patch_status(
        &self,
        api: &Api<Shoot>,
        shoot: &Shoot,
        phase: ShootPhase,
        message: Option<String>,
        worker_pools: Option<Vec<WorkerPoolStatus>>,
    ) -> Result<(), ControllerError> {
        let current = shoot.status.clone().unwrap_or_default();
        let worker_pools = worker_pools.unwrap_or_else(|| current.worker_pools.clone());
        if current.phase.as_ref() == Some(&phase)
            && current.message == message
            && current.observed_generation == shoot.metadata.generation
            && current.worker_pools == worker_pools
        {
            return Ok(());
        }

        let patch = json!({
            "status": {
                "phase": phase,
                "message": message,
                "observedGeneration": shoot.metadata.generation,
                "workerPools": worker_pools,
                "lastReconciled": Utc::now(),
            }
        });
        api.patch_status(&shoot.name_any(), &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }

    /// Get the Fibonacci backoff duration for a resource based on its error count
    ///
    /// Returns (backoff, error_count)
    pub fn get_backoff_for_resource(&self, resource_key: &str) -> (Duration, u32) {
        match self.backoff_states.lock() {
            Ok(mut states) => {
                let state = states
                    .entry(resource_key.to_string())
                    .or_insert_with(BackoffState::new);
                (state.backoff.next_backoff(), state.error_count)
            }
            Err(e) => {
                warn!("Failed to lock backoff_states: {}, using default backoff", e);
                (Duration::from_secs(60), 0)
            }
        }
    }

    /// Increment error count for a resource
    pub fn increment_error(&self, resource_key: &str) {
        if let Ok(mut states) = self.backoff_states.lock() {
            states
                .entry(resource_key.to_string())
                .or_insert_with(BackoffState::new)
                .increment_error();
        }
    }

    /// Reset error count for a resource (on successful reconciliation)
    pub fn reset_error(&self, resource_key: &str) {
        if let Ok(mut states) = self.backoff_states.lock() {
            if let Some(state) = states.get_mut(resource_key) {
                state.reset();
            }
        }
    }
}

fn split_keys(keys: &str) -> Vec<String> {
    keys.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakeApiServer;
    use base64::prelude::*;
    use serde_json::Value;
    use tokio::task::JoinHandle;

    const NAMESPACE: &str = "shoot--dev--app";
    const SHOOT_PATH: &str = "/apis/core.nodeboot.io/v1alpha1/namespaces/shoot--dev--app/shoots/app";
    const OSC_PATH: &str = "/apis/extensions.gardener.cloud/v1alpha1/namespaces/shoot--dev--app/operatingsystemconfigs";
    const WORKER_PATH: &str = "/apis/extensions.gardener.cloud/v1alpha1/namespaces/shoot--dev--app/workers/app";
    const PAYLOAD_PATH: &str = "/api/v1/namespaces/kube-system/secrets/cloud-config-worker1-8a8eb";

    fn config(timeout: Duration) -> ControllerConfig {
        let mut config = ControllerConfig::from_vars(HashMap::new()).unwrap();
        config.wait_interval = Duration::from_millis(10);
        config.wait_severe_threshold = Duration::from_millis(50);
        config.wait_timeout = timeout;
        config
    }

    fn reconciler(server: &FakeApiServer, timeout: Duration) -> Reconciler {
        Reconciler::new(
            server.client(),
            server.client(),
            Arc::new(ScriptTemplates::new().unwrap()),
            config(timeout),
            Arc::new(Metrics::new().unwrap()),
        )
    }

    fn seed(server: &FakeApiServer) {
        server.put(
            SHOOT_PATH,
            json!({
                "apiVersion": "core.nodeboot.io/v1alpha1",
                "kind": "Shoot",
                "metadata": { "name": "app", "namespace": NAMESPACE, "uid": "shoot-uid", "generation": 1 },
                "spec": {
                    "kubernetes": { "version": "1.27.3", "clusterDns": "100.64.0.10" },
                    "provider": {
                        "type": "aws",
                        "workers": [{
                            "name": "worker1",
                            "machine": { "type": "m5.large", "image": { "name": "gardenlinux" } },
                            "cri": { "name": "containerd" },
                            "minimum": 1,
                            "maximum": 3,
                        }],
                    },
                    "apiServerUrl": "https://api.app.dev.example.com",
                    "sshKeysSecretName": "ssh-keypair",
                },
            }),
        );
        server.put(
            &format!("/api/v1/namespaces/{NAMESPACE}/secrets/ca"),
            json!({
                "apiVersion": "v1",
                "kind": "Secret",
                "metadata": { "name": "ca", "namespace": NAMESPACE },
                "data": { "bundle.crt": BASE64_STANDARD.encode("-----BEGIN CERTIFICATE-----\nMIIB\n-----END CERTIFICATE-----\n") },
            }),
        );
        server.put(
            &format!("/api/v1/namespaces/{NAMESPACE}/secrets/ssh-keypair"),
            json!({
                "apiVersion": "v1",
                "kind": "Secret",
                "metadata": { "name": "ssh-keypair", "namespace": NAMESPACE },
                "data": { "id_rsa.pub": BASE64_STANDARD.encode("ssh-ed25519 AAAA admin\n") },
            }),
        );
        server.put(
            WORKER_PATH,
            json!({
                "apiVersion": "extensions.gardener.cloud/v1alpha1",
                "kind": "Worker",
                "metadata": { "name": "app", "namespace": NAMESPACE },
                "spec": {
                    "type": "aws",
                    "pools": [{ "name": "worker1", "machineType": "m5.large", "minimum": 1, "maximum": 3 }],
                },
            }),
        );
    }

    fn shoot(server: &FakeApiServer) -> Shoot {
        serde_json::from_value(server.get(SHOOT_PATH).unwrap()).unwrap()
    }

    /// Answers every requested operation like a provider extension would.
    fn spawn_extension(server: &FakeApiServer) -> JoinHandle<()> {
        let server = server.clone();
        tokio::spawn(async move {
            loop {
                for osc in server.list(OSC_PATH) {
                    let name = osc["metadata"]["name"].as_str().unwrap_or_default().to_string();
                    let path = format!("{OSC_PATH}/{name}");
                    match osc["metadata"]["annotations"][ANNOTATION_OPERATION].as_str() {
                        Some(OPERATION_MIGRATE) => server.complete_migration(&path),
                        Some(_) => server.fulfil(&path, &format!("#cloud-config {name}")),
                        None => {}
                    }
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
    }

    fn osc_names(server: &FakeApiServer) -> Vec<String> {
        let mut names: Vec<String> = server
            .list(OSC_PATH)
            .iter()
            .filter_map(|o| o["metadata"]["name"].as_str().map(str::to_string))
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_split_keys() {
        assert_eq!(
            split_keys("ssh-ed25519 AAAA a\n\n  ssh-rsa BBBB b  \n"),
            vec!["ssh-ed25519 AAAA a".to_string(), "ssh-rsa BBBB b".to_string()]
        );
    }

    #[tokio::test]
    async fn test_reconcile_bootstraps_pools() {
        let server = FakeApiServer::start();
        seed(&server);
        let extension = spawn_extension(&server);
        let reconciler = reconciler(&server, Duration::from_secs(5));

        let action = reconciler.reconcile_shoot(&shoot(&server)).await.unwrap();
        extension.abort();
        assert_eq!(action, Action::requeue(RESYNC_INTERVAL));

        assert_eq!(
            osc_names(&server),
            vec!["cloud-config-worker1-8a8eb-downloader".to_string(), "cloud-config-worker1-8a8eb-original".to_string()]
        );
        let original = server.get(&format!("{OSC_PATH}/cloud-config-worker1-8a8eb-original")).unwrap();
        assert_eq!(original["metadata"]["ownerReferences"][0]["uid"], "shoot-uid");
        let authorized_keys = original["spec"]["files"]
            .as_array()
            .unwrap()
            .iter()
            .find(|f| f["path"] == "/home/gardener/.ssh/authorized_keys")
            .unwrap();
        assert_eq!(
            authorized_keys["content"]["inline"]["data"],
            BASE64_STANDARD.encode("ssh-ed25519 AAAA admin\n")
        );

        assert!(server.get(PAYLOAD_PATH).is_some());

        let worker = server.get(WORKER_PATH).unwrap();
        let user_data = BASE64_STANDARD
            .decode(worker["spec"]["pools"][0]["userData"].as_str().unwrap())
            .unwrap();
        assert_eq!(user_data, b"#cloud-config cloud-config-worker1-8a8eb-downloader".to_vec());

        let stored = shoot(&server);
        assert!(stored.finalizers().iter().any(|f| f == FINALIZER));
        let status = stored.status.unwrap();
        assert_eq!(status.phase, Some(ShootPhase::Ready));
        assert_eq!(status.worker_pools[0].key, "cloud-config-worker1-8a8eb");
        assert_eq!(status.worker_pools[0].units, vec!["kubelet.service".to_string()]);
        assert_eq!(reconciler.metrics.reconciliations.get(), 1);
    }

    #[tokio::test]
    async fn test_reconcile_failure_sets_status_and_backoff() {
        let server = FakeApiServer::start();
        seed(&server);
        let reconciler = reconciler(&server, Duration::from_millis(100));

        let err = reconciler.reconcile_shoot(&shoot(&server)).await.unwrap_err();
        assert!(matches!(err, ControllerError::Aggregate(_)));

        let status = shoot(&server).status.unwrap();
        assert_eq!(status.phase, Some(ShootPhase::Failed));
        assert!(status.message.unwrap().contains("Timed out waiting for"));
        assert_eq!(reconciler.metrics.reconciliation_errors.get(), 1);
        assert!(server.get(PAYLOAD_PATH).is_none());

        let (backoff, errors) = reconciler.get_backoff_for_resource("shoot--dev--app/app");
        assert_eq!(backoff, Duration::from_secs(15));
        assert_eq!(errors, 1);
    }

    #[tokio::test]
    async fn test_migrate_annotation_skips_deploy() {
        let server = FakeApiServer::start();
        seed(&server);
        let extension = spawn_extension(&server);
        let reconciler = reconciler(&server, Duration::from_secs(5));
        reconciler.reconcile_shoot(&shoot(&server)).await.unwrap();

        server.update(SHOOT_PATH, |shoot| {
            shoot["metadata"]["annotations"] = json!({ ANNOTATION_OPERATION: OPERATION_MIGRATE });
        });
        server.update(PAYLOAD_PATH, |secret| secret["metadata"]["annotations"] = json!({ "marker": "kept" }));

        let action = reconciler.reconcile_shoot(&shoot(&server)).await.unwrap();
        extension.abort();
        assert_eq!(action, Action::await_change());

        let original = server.get(&format!("{OSC_PATH}/cloud-config-worker1-8a8eb-original")).unwrap();
        assert_eq!(original["status"]["lastOperation"]["type"], "Migrate");
        assert!(shoot(&server).annotations().get(ANNOTATION_OPERATION).is_none());
        // payload secrets are not rewritten during migration
        assert_eq!(server.get(PAYLOAD_PATH).unwrap()["metadata"]["annotations"], json!({ "marker": "kept" }));
    }

    #[tokio::test]
    async fn test_restore_annotation_is_cleared() {
        let server = FakeApiServer::start();
        seed(&server);
        server.update(SHOOT_PATH, |shoot| {
            shoot["metadata"]["annotations"] = json!({ ANNOTATION_OPERATION: OPERATION_RESTORE });
        });
        let extension = spawn_extension(&server);
        let reconciler = reconciler(&server, Duration::from_secs(5));

        reconciler.reconcile_shoot(&shoot(&server)).await.unwrap();
        extension.abort();

        assert!(shoot(&server).annotations().get(ANNOTATION_OPERATION).is_none());
        assert_eq!(shoot(&server).status.unwrap().phase, Some(ShootPhase::Ready));
    }

    #[tokio::test]
    async fn test_deletion_removes_configs_and_finalizer() {
        let server = FakeApiServer::start();
        seed(&server);
        let extension = spawn_extension(&server);
        let reconciler = reconciler(&server, Duration::from_secs(5));
        reconciler.reconcile_shoot(&shoot(&server)).await.unwrap();
        extension.abort();
        assert_eq!(osc_names(&server).len(), 2);

        server.update(SHOOT_PATH, |shoot| {
            shoot["metadata"]["deletionTimestamp"] = Value::from("2026-01-01T00:00:00Z");
        });
        let action = reconciler.reconcile_shoot(&shoot(&server)).await.unwrap();

        assert_eq!(action, Action::await_change());
        assert!(osc_names(&server).is_empty());
        let stored = shoot(&server);
        assert!(stored.finalizers().is_empty());
        assert_eq!(stored.status.unwrap().phase, Some(ShootPhase::Deleting));
    }
}
