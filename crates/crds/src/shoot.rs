//! Shoot CRD
//!
//! The cluster-level resource owning the worker pools. The OperatingSystemConfig
//! controller watches Shoots and reports per-pool bootstrap results in status.

use crate::operating_system_config::CriConfig;
use crate::worker::MachineImage;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "core.nodeboot.io",
    version = "v1alpha1",
    kind = "Shoot",
    namespaced,
    status = "ShootStatus",
    printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#,
    printcolumn = r#"{"name":"Version","type":"string","jsonPath":".spec.kubernetes.version"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ShootSpec {
    /// Cluster-wide Kubernetes settings
    pub kubernetes: KubernetesSettings,

    /// Provider settings and worker pools
    pub provider: Provider,

    /// URL of the shoot API server as seen from the nodes
    pub api_server_url: String,

    /// Secret in the shoot namespace holding the cluster CA (`bundle.crt`)
    #[serde(default = "default_ca_secret_name")]
    pub ca_secret_name: String,

    /// Secret in the shoot namespace holding SSH public keys (`id_rsa.pub`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_keys_secret_name: Option<String>,
}

fn default_ca_secret_name() -> String {
    "ca".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KubernetesSettings {
    /// Kubernetes version (semver, e.g. `1.27.3`)
    pub version: String,

    /// Cluster DNS service IP handed to the kubelet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_dns: Option<String>,

    /// Cluster domain
    #[serde(default = "default_cluster_domain")]
    pub cluster_domain: String,
}

fn default_cluster_domain() -> String {
    "cluster.local".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    /// Provider type, e.g. `aws`
    #[serde(rename = "type")]
    pub type_: String,

    /// Worker pools
    #[serde(default)]
    pub workers: Vec<WorkerPool>,
}

/// A named group of nodes sharing machine type, image and Kubernetes version.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkerPool {
    /// Pool name
    pub name: String,

    /// Machine settings
    pub machine: Machine,

    /// Per-pool Kubernetes override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubernetes: Option<WorkerKubernetes>,

    /// Container runtime
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cri: Option<CriConfig>,

    /// Name of the data volume that should back `/var/lib`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubelet_data_volume_name: Option<String>,

    /// Additional data volumes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_volumes: Vec<DataVolume>,

    /// Minimum number of machines
    #[serde(default)]
    pub minimum: i32,

    /// Maximum number of machines
    #[serde(default)]
    pub maximum: i32,
}

impl WorkerPool {
    /// The data volume backing the kubelet directory, if one is configured.
    pub fn kubelet_data_volume(&self) -> Option<&DataVolume> {
        let name = self.kubelet_data_volume_name.as_deref()?;
        self.data_volumes.iter().find(|v| v.name == name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Machine {
    /// Machine type
    #[serde(rename = "type")]
    pub type_: String,

    /// Machine image, pools without one are skipped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<MachineImage>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkerKubernetes {
    /// Kubernetes version override for this pool
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// A data volume attached to the pool's machines.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DataVolume {
    /// Volume name
    pub name: String,

    /// Size as a Kubernetes quantity, e.g. `50Gi`
    pub size: String,

    /// Provider volume type
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct ShootStatus {
    /// Current phase
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<ShootPhase>,

    /// Human readable message for the current phase
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Last observed generation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// Per-pool bootstrap results
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub worker_pools: Vec<WorkerPoolStatus>,

    /// Last reconciliation timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reconciled: Option<chrono::DateTime<chrono::Utc>>,
}

/// Bootstrap result of one worker pool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkerPoolStatus {
    /// Pool name
    pub name: String,

    /// OperatingSystemConfig key of the pool
    pub key: String,

    /// Units the nodes of this pool run
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub units: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
/// Shoot phase
pub enum ShootPhase {
    /// Bootstrap configs are being created
    Pending,
    /// All pools have bootstrap configs
    Ready,
    /// Last reconciliation failed
    Failed,
    /// Configs are being removed
    Deleting,
}
