//! Executor script generator.
//!
//! The executor script is stored in the payload secret and run by the
//! downloader on every invocation. It stages binaries, materializes the
//! payload, manages bootstrap credentials, throttles itself with a per-node
//! delay and applies the payload only when something changed. Every failure
//! exits non-zero and is retried by the downloader's systemd restart policy.

use crate::downloader;
use crate::error::Result;
use crate::paths::NodePaths;
use crate::quantity;
use crate::template::{EXECUTOR_TEMPLATE, ScriptTemplates};
use base64::prelude::*;
use crds::{CriName, DataVolume};
use minijinja::context;
use semver::Version;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Key of the hyperkube image in the executor images.
pub const IMAGE_NAME_HYPERKUBE: &str = "hyperkube";
/// Node annotation listing systemd services to restart.
pub const ANNOTATION_RESTART_SYSTEMD_SERVICES: &str = "worker.gardener.cloud/restart-systemd-services";
/// Node annotation carrying the `checksum/data-script` of the applied payload secret.
pub const ANNOTATION_CHECKSUM_CLOUD_CONFIG: &str = "checksum/cloud-config-data";
/// Node label carrying the Kubernetes version of the applied payload.
pub const LABEL_KUBERNETES_VERSION: &str = "worker.gardener.cloud/kubernetes-version";
/// Lower bound of the per-node execution delay, matches the downloader restart interval.
pub const EXECUTION_MIN_DELAY_SECONDS: u32 = downloader::RESTART_SEC;
/// Width of the per-node execution delay window.
pub const EXECUTION_MAX_DELAY_SECONDS: u32 = 300;

const UNIT_NAME_VAR_LIB_MOUNT: &str = "var-lib.mount";

/// Inputs of the executor script.
#[derive(Debug, Clone)]
pub struct ExecutorInput {
    /// Bootstrap token written into the bootstrap kubeconfig, empty to read
    /// it from the node
    pub bootstrap_token: String,
    /// Reconcile-purpose user-data to apply
    pub cloud_config_user_data: Vec<u8>,
    /// Images by name, `hyperkube` enables binary staging
    pub images: BTreeMap<String, String>,
    /// Data volume to format and mount on `/var/lib`
    pub kubelet_data_volume: Option<DataVolume>,
    /// Command applying the payload on the node
    pub reload_config_command: String,
    /// Units contained in the payload
    pub units: Vec<String>,
    /// Container runtime of the node
    pub cri_name: CriName,
    /// Kubernetes version the node is labelled with
    pub kubernetes_version: Version,
    /// File-system layout on the node
    pub paths: NodePaths,
}

/// Renders the executor script.
pub fn script(templates: &ScriptTemplates, input: &ExecutorInput) -> Result<Vec<u8>> {
    let kubelet_data_volume_size = input
        .kubelet_data_volume
        .as_ref()
        .map(|volume| quantity::parse_bytes(&volume.size).map(|bytes| bytes.to_string()))
        .transpose()?;

    let hyperkube_image = input.images.get(IMAGE_NAME_HYPERKUBE);
    let hyperkube_image_hash = hyperkube_image
        .map(|image| hex::encode(Sha256::digest(image.as_bytes()))[..16].to_string())
        .unwrap_or_default();

    let script = templates.render(
        EXECUTOR_TEMPLATE,
        context! {
            paths => &input.paths,
            bootstrap_token => &input.bootstrap_token,
            cloud_config_user_data => BASE64_STANDARD.encode(&input.cloud_config_user_data),
            kubelet_data_volume_size,
            hyperkube_image,
            hyperkube_image_hash,
            cri_name => input.cri_name.as_str(),
            reload_config_command => &input.reload_config_command,
            units => units_to_restart(&input.units),
            kubernetes_version => input.kubernetes_version.to_string(),
            downloader_name => downloader::NAME,
            downloader_unit => downloader::UNIT_NAME,
            annotation_restart_systemd_services => ANNOTATION_RESTART_SYSTEMD_SERVICES,
            annotation_restart_systemd_services_jsonpath => ANNOTATION_RESTART_SYSTEMD_SERVICES.replace('.', "\\."),
            annotation_checksum => ANNOTATION_CHECKSUM_CLOUD_CONFIG,
            label_kubernetes_version => LABEL_KUBERNETES_VERSION,
            execution_min_delay_seconds => EXECUTION_MIN_DELAY_SECONDS,
            execution_max_delay_seconds => EXECUTION_MAX_DELAY_SECONDS,
        },
    )?;

    Ok(script.into_bytes())
}

/// Units restarted after an apply. The container runtime, the `/var/lib`
/// mount and the downloader are managed on their own.
fn units_to_restart(units: &[String]) -> Vec<&str> {
    units
        .iter()
        .map(String::as_str)
        .filter(|unit| {
            *unit != CriName::Docker.unit_name()
                && *unit != CriName::Containerd.unit_name()
                && *unit != UNIT_NAME_VAR_LIB_MOUNT
                && *unit != downloader::UNIT_NAME
        })
        .collect()
}
