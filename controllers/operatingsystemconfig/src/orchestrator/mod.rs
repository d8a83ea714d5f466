//! OperatingSystemConfig orchestration.
//!
//! Every worker pool with a machine image gets two OperatingSystemConfigs:
//! `<key>-downloader` (purpose `provision`, the provider user-data) and
//! `<key>-original` (purpose `reconcile`, the full node configuration the
//! executor script applies). A provider extension turns each into encoded
//! user-data stored in a status secret. The orchestrator deploys the objects,
//! waits for the extension, and collects the results per pool.
//!
//! One task runs per (pool, purpose). Deploy and restore fail on the first
//! error, waits collect all of them.

pub mod spec;
pub mod wait;

use crate::error::ControllerError;
use chrono::Utc;
use cloud_config::ScriptTemplates;
use crds::{
    ANNOTATION_CONFIRMATION_DELETION, ANNOTATION_OPERATION, ANNOTATION_TIMESTAMP, OPERATION_MIGRATE,
    OPERATION_RECONCILE, OPERATION_RESTORE, OSC_SECRET_DATA_KEY, OperatingSystemConfig, Purpose, WorkerPool,
};
use futures::future::{join_all, try_join_all};
use k8s_openapi::api::core::v1::Secret;
use kube::api::{DeleteParams, ListParams, Patch, PatchParams, PostParams};
use kube::{Api, Client};
use serde_json::json;
use spec::{LABEL_WORKER_POOL, Values, osc_name};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};
use wait::{Check, WaitConfig, check_deleted, check_migrated, check_ready, poll};

/// User-data produced by the extension for one config.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Data {
    /// Encoded user-data
    pub content: Vec<u8>,
    /// Command that applies the user-data on the node
    pub command: Option<String>,
    /// Units contained in the user-data
    pub units: Vec<String>,
}

/// Results of both configs of a worker pool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperatingSystemConfigs {
    /// Provision purpose, handed to the machines as user-data
    pub downloader: Data,
    /// Reconcile purpose, applied by the executor script
    pub original: Data,
}

/// Deploys and tracks the OperatingSystemConfigs of one Shoot.
pub struct OperatingSystemConfigOrchestrator {
    client: Client,
    api: Api<OperatingSystemConfig>,
    templates: Arc<ScriptTemplates>,
    values: Values,
    wait: WaitConfig,
    worker_name_to_oscs: Mutex<BTreeMap<String, OperatingSystemConfigs>>,
}

impl std::fmt::Debug for OperatingSystemConfigOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperatingSystemConfigOrchestrator")
            .field("namespace", &self.values.namespace)
            .field("wait", &self.wait)
            .finish_non_exhaustive()
    }
}

impl OperatingSystemConfigOrchestrator {
    /// Creates an orchestrator for the pools in `values`.
    pub fn new(client: Client, templates: Arc<ScriptTemplates>, values: Values, wait: WaitConfig) -> Self {
        let api = Api::namespaced(client.clone(), &values.namespace);
        let worker_name_to_oscs = values
            .deployable_pools()
            .map(|pool| (pool.name.clone(), OperatingSystemConfigs::default()))
            .collect();

        Self {
            client,
            api,
            templates,
            values,
            wait,
            worker_name_to_oscs: Mutex::new(worker_name_to_oscs),
        }
    }

    /// Creates or updates both configs of every pool.
    pub async fn deploy(&self) -> Result<(), ControllerError> {
        self.deploy_with_operation(OPERATION_RECONCILE).await
    }

    /// Like [`Self::deploy`], but asks the extension to restore its state.
    pub async fn restore(&self) -> Result<(), ControllerError> {
        self.deploy_with_operation(OPERATION_RESTORE).await
    }

    /// Waits until the extension published the user-data of every config and
    /// records the results per pool.
    pub async fn wait(&self) -> Result<(), ControllerError> {
        let tasks = self.pool_purposes()?.into_iter().map(|(pool, purpose, key)| async move {
            let name = osc_name(&key, purpose);
            let data = self.wait_ready(&name).await?;
            self.store(&pool.name, purpose, data);
            Ok::<(), ControllerError>(())
        });

        let errors: Vec<ControllerError> = join_all(tasks).await.into_iter().filter_map(Result::err).collect();
        match ControllerError::aggregate(errors) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Asks the extension to hand over the state of every existing config.
    pub async fn migrate(&self) -> Result<(), ControllerError> {
        let oscs = self.list().await?;
        try_join_all(oscs.iter().map(|osc| self.annotate_operation(osc, OPERATION_MIGRATE))).await?;
        Ok(())
    }

    /// Waits until every existing config reports a successful migration.
    pub async fn wait_migrate(&self) -> Result<(), ControllerError> {
        let oscs = self.list().await?;
        let tasks = oscs.iter().filter_map(|osc| osc.metadata.name.as_deref()).map(|name| {
            let api = &self.api;
            poll(&self.wait, name, move || async move {
                match api.get_opt(name).await {
                    Ok(Some(osc)) => check_migrated(&osc),
                    Ok(None) => Check::Retry("not found".to_string()),
                    Err(e) => Check::Retry(e.to_string()),
                }
            })
        });

        let errors: Vec<ControllerError> = join_all(tasks).await.into_iter().filter_map(Result::err).collect();
        match ControllerError::aggregate(errors) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Deletes every config.
    pub async fn destroy(&self) -> Result<(), ControllerError> {
        let oscs = self.list().await?;
        try_join_all(oscs.iter().filter_map(|osc| osc.metadata.name.as_deref()).map(|name| self.delete(name))).await?;
        Ok(())
    }

    /// Waits until every config is gone.
    pub async fn wait_cleanup(&self) -> Result<(), ControllerError> {
        poll(&self.wait, &self.values.namespace, move || async move {
            match self.list().await {
                Ok(remaining) => check_deleted(&remaining),
                Err(e) => Check::Retry(e.to_string()),
            }
        })
        .await
    }

    /// Deletes configs that no longer belong to a pool, e.g. after a version
    /// or runtime change produced a new key.
    pub async fn delete_stale(&self) -> Result<(), ControllerError> {
        let wanted = self.values.wanted_names()?;
        let oscs = self.list().await?;
        let stale: Vec<&str> = oscs
            .iter()
            .filter_map(|osc| osc.metadata.name.as_deref())
            .filter(|name| !wanted.contains(*name))
            .collect();

        for name in &stale {
            info!(name = %name, namespace = %self.values.namespace, "Deleting stale OperatingSystemConfig");
        }
        try_join_all(stale.into_iter().map(|name| self.delete(name))).await?;
        Ok(())
    }

    /// Results of the last [`Self::wait`], by pool name.
    pub fn worker_name_to_operating_system_configs(&self) -> BTreeMap<String, OperatingSystemConfigs> {
        self.worker_name_to_oscs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Inputs this orchestrator was created with.
    pub fn values(&self) -> &Values {
        &self.values
    }

    fn pool_purposes(&self) -> Result<Vec<(&WorkerPool, Purpose, String)>, ControllerError> {
        let mut result = Vec::new();
        for pool in self.values.deployable_pools() {
            let key = self.values.pool_key(pool)?;
            for purpose in Purpose::ALL {
                result.push((pool, purpose, key.clone()));
            }
        }
        Ok(result)
    }

    async fn deploy_with_operation(&self, operation: &str) -> Result<(), ControllerError> {
        let tasks = self
            .pool_purposes()?
            .into_iter()
            .map(|(pool, purpose, key)| self.deploy_one(pool, purpose, key, operation));
        try_join_all(tasks).await?;
        Ok(())
    }

    async fn deploy_one(
        &self,
        pool: &WorkerPool,
        purpose: Purpose,
        key: String,
        operation: &str,
    ) -> Result<(), ControllerError> {
        let name = osc_name(&key, purpose);
        let spec = spec::build_spec(&self.templates, &self.values, pool, &key, purpose)?;
        let mut desired = spec::build_object(&self.values, pool, &name, spec);
        let annotations = BTreeMap::from([
            (ANNOTATION_OPERATION.to_string(), operation.to_string()),
            (ANNOTATION_TIMESTAMP.to_string(), Utc::now().to_rfc3339()),
        ]);

        if self.api.get_opt(&name).await?.is_some() {
            let patch = json!({
                "metadata": {
                    "labels": desired.metadata.labels,
                    "annotations": annotations,
                    "ownerReferences": desired.metadata.owner_references,
                },
                "spec": desired.spec,
            });
            self.api
                .patch(&name, &PatchParams::default(), &Patch::Merge(&patch))
                .await?;
            debug!(name = %name, purpose = %purpose, operation = %operation, "Patched OperatingSystemConfig");
        } else {
            desired.metadata.annotations = Some(annotations);
            self.api.create(&PostParams::default(), &desired).await?;
            info!(name = %name, purpose = %purpose, operation = %operation, "Created OperatingSystemConfig");
        }

        Ok(())
    }

    async fn wait_ready(&self, name: &str) -> Result<Data, ControllerError> {
        let api = &self.api;
        let client = &self.client;
        let default_namespace = self.values.namespace.as_str();

        poll(&self.wait, name, move || async move {
            let osc = match api.get_opt(name).await {
                Ok(Some(osc)) => osc,
                Ok(None) => return Check::Retry("not found".to_string()),
                Err(e) => return Check::Retry(e.to_string()),
            };
            let status = match check_ready(&osc) {
                Check::Ready(status) => status,
                Check::Retry(reason) => return Check::Retry(reason),
                Check::Errored(description) => return Check::Errored(description),
            };

            let namespace = if status.secret_ref.namespace.is_empty() {
                default_namespace
            } else {
                status.secret_ref.namespace.as_str()
            };
            let secrets: Api<Secret> = Api::namespaced(client.clone(), namespace);
            let secret = match secrets.get_opt(&status.secret_ref.name).await {
                Ok(Some(secret)) => secret,
                Ok(None) => return Check::Retry(format!("secret {}/{} not found", namespace, status.secret_ref.name)),
                Err(e) => return Check::Retry(e.to_string()),
            };
            let Some(content) = secret.data.and_then(|mut data| data.remove(OSC_SECRET_DATA_KEY)) else {
                return Check::Retry(format!(
                    "secret {}/{} has no {OSC_SECRET_DATA_KEY} data",
                    namespace, status.secret_ref.name
                ));
            };

            Check::Ready(Data { content: content.0, command: status.command, units: status.units })
        })
        .await
    }

    fn store(&self, pool_name: &str, purpose: Purpose, data: Data) {
        let mut map = self.worker_name_to_oscs.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(oscs) = map.get_mut(pool_name) {
            match purpose {
                Purpose::Provision => oscs.downloader = data,
                Purpose::Reconcile => oscs.original = data,
            }
        }
    }

    async fn list(&self) -> Result<Vec<OperatingSystemConfig>, ControllerError> {
        let params = ListParams::default().labels(LABEL_WORKER_POOL);
        Ok(self.api.list(&params).await?.items)
    }

    async fn annotate_operation(&self, osc: &OperatingSystemConfig, operation: &str) -> Result<(), ControllerError> {
        let Some(name) = osc.metadata.name.as_deref() else {
            return Ok(());
        };
        let patch = json!({
            "metadata": {
                "annotations": {
                    ANNOTATION_OPERATION: operation,
                    ANNOTATION_TIMESTAMP: Utc::now().to_rfc3339(),
                }
            }
        });
        self.api.patch(name, &PatchParams::default(), &Patch::Merge(&patch)).await?;
        info!(name = %name, operation = %operation, "Annotated OperatingSystemConfig");
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<(), ControllerError> {
        let patch = json!({
            "metadata": { "annotations": { ANNOTATION_CONFIRMATION_DELETION: "true" } }
        });
        match self.api.patch(name, &PatchParams::default(), &Patch::Merge(&patch)).await {
            Ok(_) => {}
            Err(kube::Error::Api(e)) if e.code == 404 => return Ok(()),
            Err(e) => return Err(e.into()),
        }
        match self.api.delete(name, &DeleteParams::default()).await {
            Ok(_) => {
                info!(name = %name, "Deleted OperatingSystemConfig");
                Ok(())
            }
            Err(kube::Error::Api(e)) if e.code == 404 => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
