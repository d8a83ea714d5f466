//! Kubelet unit, configuration file and CA.

use super::{Component, Context, IMAGE_NAME_PAUSE};
use crate::error::{CloudConfigError, Result};
use crate::paths::{BINARIES_DIR, KUBELET_DIR};
use crds::{CriName, File, Unit};
use semver::Version;
use serde::Serialize;

/// Path of the kubelet configuration file.
pub const PATH_KUBELET_CONFIG: &str = "/var/lib/kubelet/config/kubelet";
/// Path of the CA the kubelet uses to authenticate clients.
pub const PATH_KUBELET_CA: &str = "/var/lib/kubelet/ca.crt";
/// CRI endpoint of containerd.
pub const CONTAINERD_ENDPOINT: &str = "unix:///run/containerd/containerd.sock";

/// The kubelet.
#[derive(Debug)]
pub struct Kubelet;

impl Component for Kubelet {
    fn name(&self) -> &'static str {
        "kubelet"
    }

    fn config(&self, ctx: &Context<'_>) -> Result<(Vec<Unit>, Vec<File>)> {
        let flags = cli_flags(
            ctx.kubernetes_version,
            ctx.cri_name,
            ctx.images.get(IMAGE_NAME_PAUSE).map(String::as_str),
        )?;

        let config = KubeletConfiguration::new(ctx);
        let units = vec![Unit::started("kubelet.service", unit_content(ctx.cri_name, &flags))];

        let mut files = vec![File::inline_base64(
            PATH_KUBELET_CONFIG,
            0o644,
            &serde_yaml::to_string(&config)?,
        )];
        if let Some(ca) = ctx.ca_bundle {
            files.push(File::inline_base64(PATH_KUBELET_CA, 0o644, ca));
        }

        Ok((units, files))
    }
}

/// Command line flags of the kubelet for the given version and runtime.
pub fn cli_flags(version: &Version, cri_name: CriName, pause_image: Option<&str>) -> Result<Vec<String>> {
    let below_1_24 = *version < Version::new(1, 24, 0);
    let below_1_27 = *version < Version::new(1, 27, 0);

    let mut flags = vec![
        format!("--bootstrap-kubeconfig={KUBELET_DIR}/kubeconfig-bootstrap"),
        format!("--config={PATH_KUBELET_CONFIG}"),
        format!("--kubeconfig={KUBELET_DIR}/kubeconfig-real"),
    ];

    match cri_name {
        CriName::Containerd => {
            if below_1_24 {
                flags.push("--container-runtime=remote".to_string());
            }
            flags.push(format!("--container-runtime-endpoint={CONTAINERD_ENDPOINT}"));
            flags.push("--runtime-cgroups=/system.slice/containerd.service".to_string());
        }
        CriName::Docker => {
            if !below_1_24 {
                return Err(CloudConfigError::UnsupportedRuntime(format!(
                    "docker is not supported for Kubernetes {version}"
                )));
            }
            flags.push("--network-plugin=cni".to_string());
            flags.push("--cni-bin-dir=/opt/cni/bin/".to_string());
            flags.push("--cni-conf-dir=/etc/cni/net.d/".to_string());
            flags.push("--image-pull-progress-deadline=1m0s".to_string());
        }
    }

    if let Some(image) = pause_image.filter(|_| below_1_27) {
        flags.push(format!("--pod-infra-container-image={image}"));
    }

    flags.push("--v=2".to_string());
    Ok(flags)
}

fn unit_content(cri_name: CriName, flags: &[String]) -> String {
    let mut exec_start = format!("ExecStart={BINARIES_DIR}/kubelet \\\n");
    for flag in flags {
        exec_start.push_str(&format!("    {flag} \\\n"));
    }
    exec_start.push_str("    $KUBELET_EXTRA_ARGS");

    format!(
        "[Unit]
Description=kubelet daemon
Documentation=https://kubernetes.io/docs/admin/kubelet
After={}
[Install]
WantedBy=multi-user.target
[Service]
Restart=always
RestartSec=5
EnvironmentFile=/etc/environment
EnvironmentFile=-{KUBELET_DIR}/extra_args
{exec_start}
",
        cri_name.unit_name()
    )
}

/// Subset of `kubelet.config.k8s.io/v1beta1` KubeletConfiguration.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct KubeletConfiguration {
    api_version: &'static str,
    kind: &'static str,
    authentication: Authentication,
    authorization: Authorization,
    cgroup_driver: &'static str,
    #[serde(rename = "clusterDNS", skip_serializing_if = "Vec::is_empty")]
    cluster_dns: Vec<String>,
    cluster_domain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    container_runtime_endpoint: Option<&'static str>,
    max_pods: i32,
    rotate_certificates: bool,
    #[serde(rename = "serverTLSBootstrap")]
    server_tls_bootstrap: bool,
    eviction_hard: std::collections::BTreeMap<&'static str, &'static str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Authentication {
    anonymous: Enabled,
    webhook: AuthenticationWebhook,
    x509: X509,
}

#[derive(Debug, Serialize)]
struct Enabled {
    enabled: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthenticationWebhook {
    enabled: bool,
    #[serde(rename = "cacheTTL")]
    cache_ttl: &'static str,
}

#[derive(Debug, Serialize)]
struct X509 {
    #[serde(rename = "clientCAFile")]
    client_ca_file: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Authorization {
    mode: &'static str,
    webhook: AuthorizationWebhook,
}

#[derive(Debug, Serialize)]
struct AuthorizationWebhook {
    #[serde(rename = "cacheAuthorizedTTL")]
    cache_authorized_ttl: &'static str,
    #[serde(rename = "cacheUnauthorizedTTL")]
    cache_unauthorized_ttl: &'static str,
}

impl KubeletConfiguration {
    fn new(ctx: &Context<'_>) -> Self {
        let containerd = ctx.cri_name == CriName::Containerd;
        Self {
            api_version: "kubelet.config.k8s.io/v1beta1",
            kind: "KubeletConfiguration",
            authentication: Authentication {
                anonymous: Enabled { enabled: false },
                webhook: AuthenticationWebhook {
                    enabled: true,
                    cache_ttl: "2m0s",
                },
                x509: X509 {
                    client_ca_file: PATH_KUBELET_CA,
                },
            },
            authorization: Authorization {
                mode: "Webhook",
                webhook: AuthorizationWebhook {
                    cache_authorized_ttl: "5m0s",
                    cache_unauthorized_ttl: "30s",
                },
            },
            cgroup_driver: if containerd { "systemd" } else { "cgroupfs" },
            cluster_dns: ctx.cluster_dns.map(str::to_string).into_iter().collect(),
            cluster_domain: ctx.cluster_domain.to_string(),
            container_runtime_endpoint: (containerd && *ctx.kubernetes_version >= Version::new(1, 27, 0))
                .then_some(CONTAINERD_ENDPOINT),
            max_pods: 110,
            rotate_certificates: true,
            server_tls_bootstrap: true,
            eviction_hard: [
                ("imagefs.available", "5%"),
                ("imagefs.inodesFree", "5%"),
                ("memory.available", "100Mi"),
                ("nodefs.available", "5%"),
                ("nodefs.inodesFree", "5%"),
            ]
            .into_iter()
            .collect(),
        }
    }
}
