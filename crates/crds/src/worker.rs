//! Worker CRD
//!
//! Machine-level description of the worker pools handed to a provider
//! extension. The controller only writes each pool's `userData`.

use crate::common::{LastError, LastOperation, SecretReference};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "extensions.gardener.cloud",
    version = "v1alpha1",
    kind = "Worker",
    namespaced,
    status = "WorkerStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct WorkerSpec {
    /// Type of the provider extension responsible for this object
    #[serde(rename = "type")]
    pub type_: String,

    /// Region the machines are created in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Cloud provider credentials
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<SecretReference>,

    /// Worker pools
    #[serde(default)]
    pub pools: Vec<WorkerPoolSpec>,
}

/// A single machine pool of a Worker.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkerPoolSpec {
    /// Pool name, matches the shoot's worker pool
    pub name: String,

    /// Machine type
    pub machine_type: String,

    /// Machine image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_image: Option<MachineImage>,

    /// Minimum number of machines
    #[serde(default)]
    pub minimum: i32,

    /// Maximum number of machines
    #[serde(default)]
    pub maximum: i32,

    /// Base64 encoded provider user-data
    #[serde(default)]
    pub user_data: String,

    /// Kubernetes version of the pool's nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubernetes_version: Option<String>,
}

/// Operating system image of a machine.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MachineImage {
    /// Image name, also used as the OperatingSystemConfig type
    pub name: String,

    /// Image version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct WorkerStatus {
    /// Generation observed by the extension controller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// Last operation of the extension controller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_operation: Option<LastOperation>,

    /// Last error of the extension controller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<LastError>,
}
