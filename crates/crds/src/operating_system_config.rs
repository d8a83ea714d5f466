//! OperatingSystemConfig CRD
//!
//! Describes what a worker node runs on the unit and file level. The spec is
//! written by the controller, the status is filled in by a provider extension
//! that encodes the units and files into provider user-data.

use crate::common::{LastError, LastOperation, SecretReference};
use base64::prelude::*;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Data key in the status secret holding the encoded cloud-config.
pub const OSC_SECRET_DATA_KEY: &str = "cloud_config";

/// Encoding marker for base64 encoded inline file content.
pub const ENCODING_BASE64: &str = "b64";

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "extensions.gardener.cloud",
    version = "v1alpha1",
    kind = "OperatingSystemConfig",
    shortname = "osc",
    namespaced,
    status = "OperatingSystemConfigStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct OperatingSystemConfigSpec {
    /// Type of the provider extension responsible for this object
    #[serde(rename = "type")]
    pub type_: String,

    /// Provider specific configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_config: Option<serde_json::Value>,

    /// Whether the config is used for provisioning or for reconciling a node
    pub purpose: Purpose,

    /// Path on the node the extension should write its reload configuration to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reload_config_file_path: Option<String>,

    /// Systemd units
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub units: Vec<Unit>,

    /// Files
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<File>,

    /// Container runtime selection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cri_config: Option<CriConfig>,
}

/// Purpose of an OperatingSystemConfig.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Purpose {
    /// Initial user-data of a machine, only the downloader bundle
    Provision,
    /// Full configuration applied on running nodes
    Reconcile,
}

impl Purpose {
    /// Both purposes, in deployment order.
    pub const ALL: [Purpose; 2] = [Purpose::Provision, Purpose::Reconcile];

    /// Suffix appended to the key to name the resource for this purpose.
    pub fn name_suffix(self) -> &'static str {
        match self {
            Purpose::Provision => "downloader",
            Purpose::Reconcile => "original",
        }
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Purpose::Provision => f.write_str("provision"),
            Purpose::Reconcile => f.write_str("reconcile"),
        }
    }
}

/// Container runtime configuration.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CriConfig {
    /// Name of the container runtime
    pub name: CriName,
}

/// Supported container runtimes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum CriName {
    /// Docker (dockershim), the historic default
    #[default]
    Docker,
    /// containerd via CRI
    Containerd,
}

impl CriName {
    /// Name as used in configs and keys.
    pub fn as_str(self) -> &'static str {
        match self {
            CriName::Docker => "docker",
            CriName::Containerd => "containerd",
        }
    }

    /// Systemd unit running this runtime.
    pub fn unit_name(self) -> &'static str {
        match self {
            CriName::Docker => "docker.service",
            CriName::Containerd => "containerd.service",
        }
    }
}

impl fmt::Display for CriName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Command systemd should run for a unit after it was written.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UnitCommand {
    /// `systemctl start`
    Start,
    /// `systemctl restart`
    Restart,
    /// `systemctl stop`
    Stop,
}

/// A systemd unit.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    /// Unit file name, e.g. `kubelet.service`
    pub name: String,

    /// Command to run once the unit was written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<UnitCommand>,

    /// Whether the unit is enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable: Option<bool>,

    /// Raw unit file content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Drop-in files for the unit
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub drop_ins: Vec<DropIn>,
}

impl Unit {
    /// An enabled unit that is started once written.
    pub fn started(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: Some(UnitCommand::Start),
            enable: Some(true),
            content: Some(content.into()),
            drop_ins: Vec::new(),
        }
    }
}

/// A systemd drop-in file.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DropIn {
    /// Drop-in file name
    pub name: String,

    /// Drop-in content
    pub content: String,
}

/// A file written to the node.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct File {
    /// Absolute path on the node
    pub path: String,

    /// POSIX permission bits, defaults to 0644 on the node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<i32>,

    /// File content
    pub content: FileContent,
}

impl File {
    /// A file with base64 encoded inline content.
    pub fn inline_base64(path: impl Into<String>, permissions: i32, data: &str) -> Self {
        Self {
            path: path.into(),
            permissions: Some(permissions),
            content: FileContent {
                inline: Some(FileContentInline {
                    encoding: ENCODING_BASE64.to_string(),
                    data: BASE64_STANDARD.encode(data.as_bytes()),
                }),
                ..Default::default()
            },
        }
    }

    /// A file with raw inline content.
    pub fn inline_plain(path: impl Into<String>, permissions: i32, data: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            permissions: Some(permissions),
            content: FileContent {
                inline: Some(FileContentInline {
                    encoding: String::new(),
                    data: data.into(),
                }),
                ..Default::default()
            },
        }
    }
}

/// Content of a file, either inline or by secret reference.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct FileContent {
    /// Reference to a key in a secret in the same namespace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<FileContentSecretRef>,

    /// Inline content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline: Option<FileContentInline>,

    /// Keep the content unencoded in the user-data so it can be substituted later
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transmit_unencoded: Option<bool>,
}

/// Secret reference for file content.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FileContentSecretRef {
    /// Secret name
    pub name: String,

    /// Key in the secret's data
    pub data_key: String,
}

/// Inline file content.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FileContentInline {
    /// `b64` or empty for raw data
    #[serde(default)]
    pub encoding: String,

    /// File data
    pub data: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OperatingSystemConfigStatus {
    /// Generation observed by the extension controller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// Last operation of the extension controller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_operation: Option<LastOperation>,

    /// Last error of the extension controller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<LastError>,

    /// Where the encoded user-data was stored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_config: Option<CloudConfig>,

    /// Command to reload the configuration on the node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Names of the units contained in the user-data
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub units: Vec<String>,
}

/// Pointer to the secret holding the encoded user-data.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CloudConfig {
    /// Secret reference
    pub secret_ref: SecretReference,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_wire_format() {
        let spec = OperatingSystemConfigSpec {
            type_: "gardenlinux".to_string(),
            provider_config: None,
            purpose: Purpose::Reconcile,
            reload_config_file_path: Some("/var/lib/cloud-config-downloader/downloads/cloud_config".to_string()),
            units: vec![Unit::started("kubelet.service", "[Unit]\n")],
            files: vec![File::inline_base64("/etc/motd", 0o644, "hello")],
            cri_config: Some(CriConfig { name: CriName::Containerd }),
        };

        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(value["type"], "gardenlinux");
        assert_eq!(value["purpose"], "reconcile");
        assert_eq!(value["criConfig"]["name"], "containerd");
        assert_eq!(value["units"][0]["command"], "start");
        assert_eq!(value["files"][0]["content"]["inline"]["encoding"], "b64");
        assert_eq!(value["files"][0]["content"]["inline"]["data"], "aGVsbG8=");
    }

    #[test]
    fn test_purpose_names() {
        assert_eq!(Purpose::Provision.name_suffix(), "downloader");
        assert_eq!(Purpose::Reconcile.to_string(), "reconcile");
        assert_eq!(CriName::default().unit_name(), "docker.service");
    }
}
