//! File-system layout on worker nodes.
//!
//! The default layout is a fixed contract shared with node-side tooling and
//! must not change. A rooted layout exists so the generated scripts can be
//! exercised against a scratch directory.

use serde::Serialize;

/// Base directory of the downloader on the node.
pub const DOWNLOADER_DIR: &str = "/var/lib/cloud-config-downloader";
/// Directory receiving the kubelet and kubectl binaries.
pub const BINARIES_DIR: &str = "/opt/bin";
/// Kubelet state directory.
pub const KUBELET_DIR: &str = "/var/lib/kubelet";

/// Absolute paths used by the downloader and executor scripts.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NodePaths {
    /// Downloader base directory
    pub downloader_dir: String,
    /// API server URL
    pub credentials_server: String,
    /// Cluster CA bundle
    pub credentials_ca_cert: String,
    /// Client certificate for the certificate fallback
    pub credentials_client_cert: String,
    /// Client key for the certificate fallback
    pub credentials_client_key: String,
    /// Persisted shoot-access token
    pub credentials_token: String,
    /// Bootstrap token, substituted into the user-data before boot
    pub credentials_bootstrap_token: String,
    /// Downloader script
    pub downloader_script: String,
    /// md5 of the downloader script as seen by the last executor run
    pub downloader_script_checksum: String,
    /// Downloads directory
    pub downloads_dir: String,
    /// Decoded cloud-config payload
    pub cloud_config: String,
    /// Executor script fetched from the payload secret
    pub executor_script: String,
    /// Checksum annotation of the last fetched payload secret
    pub executor_script_checksum: String,
    /// Staging directory for binaries copied out of the hyperkube image
    pub hyperkube_downloads: String,
    /// Persisted per-node execution delay
    pub execution_delay_seconds: String,
    /// Unix timestamp of the last completed executor run
    pub execution_last_date: String,
    /// Binaries directory
    pub binaries_dir: String,
    /// Marker holding the image the kubelet binary was copied from
    pub hyperkube_image_used_for_last_copy_kubelet: String,
    /// Marker holding the image the kubectl binary was copied from
    pub hyperkube_image_used_for_last_copy_kubectl: String,
    /// Kubelet directory
    pub kubelet_dir: String,
    /// Bootstrap kubeconfig of the kubelet
    pub kubelet_kubeconfig_bootstrap: String,
    /// Kubeconfig written by the kubelet after TLS bootstrapping
    pub kubelet_kubeconfig_real: String,
    /// Current kubelet client certificate
    pub kubelet_client_certificate: String,
    /// Cached node name
    pub nodename: String,
}

impl Default for NodePaths {
    fn default() -> Self {
        Self::with_roots(DOWNLOADER_DIR, BINARIES_DIR, KUBELET_DIR)
    }
}

impl NodePaths {
    /// Layout below `prefix` instead of `/`.
    pub fn rooted(prefix: &str) -> Self {
        let prefix = prefix.trim_end_matches('/');
        Self::with_roots(
            &format!("{prefix}{DOWNLOADER_DIR}"),
            &format!("{prefix}{BINARIES_DIR}"),
            &format!("{prefix}{KUBELET_DIR}"),
        )
    }

    fn with_roots(downloader_dir: &str, binaries_dir: &str, kubelet_dir: &str) -> Self {
        let credentials = format!("{downloader_dir}/credentials");
        let downloads = format!("{downloader_dir}/downloads");
        Self {
            downloader_dir: downloader_dir.to_string(),
            credentials_server: format!("{credentials}/server"),
            credentials_ca_cert: format!("{credentials}/ca.crt"),
            credentials_client_cert: format!("{credentials}/client.crt"),
            credentials_client_key: format!("{credentials}/client.key"),
            credentials_token: format!("{credentials}/token"),
            credentials_bootstrap_token: format!("{credentials}/bootstrap-token"),
            downloader_script: format!("{downloader_dir}/download-cloud-config.sh"),
            downloader_script_checksum: format!("{downloader_dir}/download-cloud-config.md5"),
            cloud_config: format!("{downloads}/cloud_config"),
            executor_script: format!("{downloads}/execute-cloud-config.sh"),
            executor_script_checksum: format!("{downloads}/execute-cloud-config-checksum"),
            hyperkube_downloads: format!("{downloads}/hyperkube"),
            execution_delay_seconds: format!("{downloader_dir}/execution_delay_seconds"),
            execution_last_date: format!("{downloader_dir}/execution_last_date"),
            downloads_dir: downloads,
            binaries_dir: binaries_dir.to_string(),
            hyperkube_image_used_for_last_copy_kubelet: format!(
                "{binaries_dir}/hyperkube_image_used_for_last_copy_of_kubelet"
            ),
            hyperkube_image_used_for_last_copy_kubectl: format!(
                "{binaries_dir}/hyperkube_image_used_for_last_copy_of_kubectl"
            ),
            kubelet_dir: kubelet_dir.to_string(),
            kubelet_kubeconfig_bootstrap: format!("{kubelet_dir}/kubeconfig-bootstrap"),
            kubelet_kubeconfig_real: format!("{kubelet_dir}/kubeconfig-real"),
            kubelet_client_certificate: format!("{kubelet_dir}/pki/kubelet-client-current.pem"),
            nodename: format!("{kubelet_dir}/nodename"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let paths = NodePaths::default();
        assert_eq!(paths.credentials_server, "/var/lib/cloud-config-downloader/credentials/server");
        assert_eq!(paths.credentials_bootstrap_token, "/var/lib/cloud-config-downloader/credentials/bootstrap-token");
        assert_eq!(paths.downloader_script_checksum, "/var/lib/cloud-config-downloader/download-cloud-config.md5");
        assert_eq!(paths.cloud_config, "/var/lib/cloud-config-downloader/downloads/cloud_config");
        assert_eq!(paths.executor_script_checksum, "/var/lib/cloud-config-downloader/downloads/execute-cloud-config-checksum");
        assert_eq!(paths.hyperkube_image_used_for_last_copy_kubectl, "/opt/bin/hyperkube_image_used_for_last_copy_of_kubectl");
    }

    #[test]
    fn test_rooted_layout() {
        let paths = NodePaths::rooted("/tmp/node/");
        assert_eq!(paths.credentials_token, "/tmp/node/var/lib/cloud-config-downloader/credentials/token");
        assert_eq!(paths.binaries_dir, "/tmp/node/opt/bin");
        assert_eq!(paths.nodename, "/tmp/node/var/lib/kubelet/nodename");
    }
}
