//! Catalog of the components making up the full node configuration.
//!
//! Each component contributes units and files. The catalog is a fixed list,
//! some entries only apply to one container runtime.

mod containerd;
mod docker_logrotate;
mod journald;
pub mod kubelet;
mod rootcerts;
mod sshkeys;

use crate::error::Result;
use crds::{CriName, File, Unit};
use semver::Version;
use std::collections::BTreeMap;

/// Key of the pause image in [`Context::images`].
pub const IMAGE_NAME_PAUSE: &str = "pause-container";

/// Inputs shared by all components.
#[derive(Debug, Clone)]
pub struct Context<'a> {
    /// Name of the worker pool
    pub worker_pool_name: &'a str,
    /// Effective Kubernetes version of the pool
    pub kubernetes_version: &'a Version,
    /// Container runtime of the pool
    pub cri_name: CriName,
    /// PEM encoded cluster CA bundle
    pub ca_bundle: Option<&'a str>,
    /// SSH public keys allowed to log into the nodes
    pub ssh_public_keys: &'a [String],
    /// Cluster DNS service IP
    pub cluster_dns: Option<&'a str>,
    /// Cluster domain
    pub cluster_domain: &'a str,
    /// Images by name
    pub images: &'a BTreeMap<String, String>,
}

/// A contributor of units and files to the node configuration.
pub trait Component: Send + Sync {
    /// Component name.
    fn name(&self) -> &'static str;

    /// Units and files of this component.
    fn config(&self, ctx: &Context<'_>) -> Result<(Vec<Unit>, Vec<File>)>;
}

/// All components with the runtime they are restricted to.
const CATALOG: &[(Option<CriName>, &dyn Component)] = &[
    (None, &rootcerts::RootCertificates),
    (Some(CriName::Containerd), &containerd::ContainerdInitializer),
    (Some(CriName::Docker), &docker_logrotate::DockerLogrotate),
    (None, &journald::Journald),
    (None, &kubelet::Kubelet),
    (None, &sshkeys::SshdKeys),
];

/// Components that apply to the given container runtime, in catalog order.
pub fn components(cri_name: CriName) -> impl Iterator<Item = &'static dyn Component> {
    CATALOG
        .iter()
        .filter(move |(only, _)| only.is_none_or(|only| only == cri_name))
        .map(|(_, component)| *component)
}

/// Concatenated units and files of all applicable components.
pub fn config(ctx: &Context<'_>) -> Result<(Vec<Unit>, Vec<File>)> {
    let mut units = Vec::new();
    let mut files = Vec::new();

    for component in components(ctx.cri_name) {
        let (u, f) = component.config(ctx)?;
        tracing::debug!(component = component.name(), units = u.len(), files = f.len(), "Generated component config");
        units.extend(u);
        files.extend(f);
    }

    Ok((units, files))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn context<'a>(
        version: &'a Version,
        cri_name: CriName,
        images: &'a BTreeMap<String, String>,
        ssh_public_keys: &'a [String],
    ) -> Context<'a> {
        Context {
            worker_pool_name: "worker1",
            kubernetes_version: version,
            cri_name,
            ca_bundle: Some("-----BEGIN CERTIFICATE-----\nMIIB\n-----END CERTIFICATE-----\n"),
            ssh_public_keys,
            cluster_dns: Some("100.64.0.10"),
            cluster_domain: "cluster.local",
            images,
        }
    }

    #[test]
    fn test_catalog_by_runtime() {
        let containerd: Vec<&str> = components(CriName::Containerd).map(|c| c.name()).collect();
        assert_eq!(containerd, vec!["rootcertificates", "containerd", "journald", "kubelet", "sshdkeys"]);

        let docker: Vec<&str> = components(CriName::Docker).map(|c| c.name()).collect();
        assert_eq!(docker, vec!["rootcertificates", "docker-logrotate", "journald", "kubelet", "sshdkeys"]);
    }

    #[test]
    fn test_config_concatenates_components() {
        let version = Version::new(1, 27, 0);
        let images = BTreeMap::new();
        let keys = vec!["ssh-ed25519 AAAA user".to_string()];
        let (units, files) = config(&context(&version, CriName::Containerd, &images, &keys)).unwrap();

        let unit_names: Vec<&str> = units.iter().map(|u| u.name.as_str()).collect();
        assert!(unit_names.contains(&"kubelet.service"));
        assert!(unit_names.contains(&"containerd-initializer.service"));
        assert!(!unit_names.contains(&"docker-logrotate.service"));
        assert!(files.iter().any(|f| f.path == "/home/gardener/.ssh/authorized_keys"));
    }
}
