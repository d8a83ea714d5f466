//! Executor payload secrets in the target cluster.
//!
//! For every pool the executor script wraps the Reconcile-purpose user-data
//! and lands in a `kube-system` secret named after the pool key. The
//! downloader on the node fetches that secret with the identity the RBAC
//! bundle grants it. Everything is server-side applied.

use crate::error::ControllerError;
use crate::orchestrator::OperatingSystemConfigs;
use crate::orchestrator::spec::{LABEL_WORKER_POOL, Values};
use chrono::{DateTime, Duration, Utc};
use cloud_config::bootstrap_token::{self, BootstrapToken};
use cloud_config::executor::{self, ExecutorInput};
use cloud_config::{NodePaths, ScriptTemplates, downloader, rbac, shoot_access};
use k8s_openapi::ByteString;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{Api, DynamicObject, GroupVersionKind, ListParams, Patch, PatchParams, PostParams};
use kube::discovery::ApiResource;
use kube::Client;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Field manager of all server-side applies.
pub const FIELD_MANAGER: &str = "osc-controller";

/// Label selecting the bootstrap token secrets this controller owns.
pub const LABEL_BOOTSTRAP_TOKEN_PURPOSE: &str = "worker.gardener.cloud/bootstrap-token-purpose";

/// Validity of a newly created bootstrap token.
pub const BOOTSTRAP_TOKEN_VALIDITY_DAYS: i64 = 90;

const BOOTSTRAP_TOKEN_DESCRIPTION: &str = "Used by the cloud-config-downloader to join nodes";

/// Payload secret of one pool, annotated with the checksum of its script.
pub fn payload_secret(key: &str, pool_name: &str, script: Vec<u8>) -> Secret {
    let checksum = hex::encode(Sha256::digest(&script));

    Secret {
        metadata: ObjectMeta {
            name: Some(key.to_string()),
            namespace: Some(rbac::NAMESPACE.to_string()),
            labels: Some(BTreeMap::from([(LABEL_WORKER_POOL.to_string(), pool_name.to_string())])),
            annotations: Some(BTreeMap::from([(downloader::ANNOTATION_KEY_CHECKSUM.to_string(), checksum)])),
            ..Default::default()
        },
        type_: Some("Opaque".to_string()),
        data: Some(BTreeMap::from([(downloader::DATA_KEY_SCRIPT.to_string(), ByteString(script))])),
        ..Default::default()
    }
}

/// Returns a stored bootstrap token with at least half of its validity left,
/// or creates a new one.
pub async fn ensure_bootstrap_token(client: &Client, now: DateTime<Utc>) -> Result<BootstrapToken, ControllerError> {
    let api: Api<Secret> = Api::namespaced(client.clone(), rbac::NAMESPACE);
    let validity = Duration::days(BOOTSTRAP_TOKEN_VALIDITY_DAYS);

    let params = ListParams::default().labels(&format!("{LABEL_BOOTSTRAP_TOKEN_PURPOSE}={}", downloader::NAME));
    let existing = api
        .list(&params)
        .await?
        .items
        .iter()
        .filter(|secret| secret.type_.as_deref() == Some(bootstrap_token::SECRET_TYPE))
        .filter(|secret| bootstrap_token::is_valid_for(secret, now, validity / 2))
        .find_map(BootstrapToken::from_secret);
    if let Some(token) = existing {
        debug!(id = %token.id(), "Reusing bootstrap token");
        return Ok(token);
    }

    let token = BootstrapToken::generate();
    let mut secret = token.to_secret(rbac::NAMESPACE, BOOTSTRAP_TOKEN_DESCRIPTION, now + validity);
    secret.metadata.labels = Some(BTreeMap::from([(
        LABEL_BOOTSTRAP_TOKEN_PURPOSE.to_string(),
        downloader::NAME.to_string(),
    )]));
    api.create(&PostParams::default(), &secret).await?;
    info!(id = %token.id(), "Created bootstrap token");

    Ok(token)
}

/// Executor inputs of one pool from its wait results.
pub fn executor_input(
    values: &Values,
    pool: &crds::WorkerPool,
    oscs: &OperatingSystemConfigs,
    token: &BootstrapToken,
) -> Result<ExecutorInput, ControllerError> {
    let version = values.pool_version(pool)?;
    let Some(reload_config_command) = oscs.original.command.clone() else {
        return Err(ControllerError::MissingCloudConfig(pool.name.clone()));
    };

    Ok(ExecutorInput {
        bootstrap_token: token.token(),
        cloud_config_user_data: oscs.original.content.clone(),
        images: values.images(&version),
        kubelet_data_volume: pool.kubelet_data_volume().cloned(),
        reload_config_command,
        units: oscs.original.units.clone(),
        cri_name: pool.cri.as_ref().map(|c| c.name).unwrap_or_default(),
        kubernetes_version: version,
        paths: NodePaths::default(),
    })
}

/// Renders and applies the payload secrets, RBAC bundle and shoot-access
/// secret of every pool. Returns the payload secret names.
pub async fn reconcile(
    seed: &Client,
    target: &Client,
    templates: &ScriptTemplates,
    values: &Values,
    results: &BTreeMap<String, OperatingSystemConfigs>,
) -> Result<Vec<String>, ControllerError> {
    let token = ensure_bootstrap_token(target, Utc::now()).await?;

    let mut manifests = Vec::new();
    let mut secret_names = Vec::new();
    for pool in values.deployable_pools() {
        let oscs = results
            .get(&pool.name)
            .filter(|oscs| !oscs.original.content.is_empty())
            .ok_or_else(|| ControllerError::MissingCloudConfig(pool.name.clone()))?;
        let key = values.pool_key(pool)?;

        let script = executor::script(templates, &executor_input(values, pool, oscs, &token)?)?;
        manifests.push(serde_json::to_value(payload_secret(&key, &pool.name, script))?);
        secret_names.push(key);
    }

    for data in rbac::generate_rbac_resources_data(&secret_names)?.into_values() {
        manifests.push(serde_yaml::from_slice::<Value>(&data)?);
    }

    for manifest in &manifests {
        apply(target, manifest).await?;
    }
    apply(seed, &serde_json::to_value(shoot_access::secret(&values.namespace))?).await?;

    info!(namespace = %values.namespace, secrets = secret_names.len(), "Applied executor secrets");
    Ok(secret_names)
}

/// Server-side applies a single object.
pub async fn apply(client: &Client, object: &Value) -> Result<(), ControllerError> {
    let field = |pointer: &str| {
        object
            .pointer(pointer)
            .and_then(Value::as_str)
            .ok_or_else(|| ControllerError::InvalidManifest(format!("missing {pointer}")))
    };
    let kind = field("/kind")?;
    let api_version = field("/apiVersion")?;
    let name = field("/metadata/name")?;
    let namespace = object.pointer("/metadata/namespace").and_then(Value::as_str);

    let (group, version) = api_version.split_once('/').unwrap_or(("", api_version));
    let gvk = GroupVersionKind::gvk(group, version, kind);
    let resource = ApiResource::from_gvk(&gvk);
    let api: Api<DynamicObject> = match namespace {
        Some(ns) => Api::namespaced_with(client.clone(), ns, &resource),
        None => Api::all_with(client.clone(), &resource),
    };

    api.patch(name, &PatchParams::apply(FIELD_MANAGER).force(), &Patch::Apply(object))
        .await?;
    debug!(kind = %kind, name = %name, "Applied object");
    Ok(())
}
