//! Desired OperatingSystemConfigs of a Shoot's worker pools.

use crate::error::ControllerError;
use cloud_config::components::{self, Context, IMAGE_NAME_PAUSE};
use cloud_config::executor::IMAGE_NAME_HYPERKUBE;
use cloud_config::userdata::{self, SecretData};
use cloud_config::{NodePaths, ScriptTemplates, downloader};
use crds::{OperatingSystemConfig, OperatingSystemConfigSpec, Purpose, WorkerPool};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use semver::Version;
use std::collections::{BTreeMap, BTreeSet};

/// Label carrying the worker pool an OperatingSystemConfig belongs to.
pub const LABEL_WORKER_POOL: &str = "worker.gardener.cloud/pool";

/// Shoot-wide inputs of the orchestrator, fixed for one reconciliation.
#[derive(Debug, Clone)]
pub struct Values {
    /// Namespace the OperatingSystemConfigs live in
    pub namespace: String,
    /// Owner of the OperatingSystemConfigs
    pub owner_reference: Option<OwnerReference>,
    /// Cluster-wide Kubernetes version
    pub kubernetes_version: Version,
    /// Worker pools
    pub workers: Vec<WorkerPool>,
    /// API server URL as seen from the nodes
    pub api_server_url: String,
    /// Secret holding the cluster CA
    pub ca_secret_name: String,
    /// PEM encoded cluster CA bundle
    pub ca_bundle: Option<String>,
    /// SSH public keys for the nodes
    pub ssh_public_keys: Vec<String>,
    /// Cluster DNS service IP
    pub cluster_dns: Option<String>,
    /// Cluster domain
    pub cluster_domain: String,
    /// Hyperkube image repository, tagged with the pool's version
    pub hyperkube_image_repository: Option<String>,
    /// Pause image
    pub pause_image: Option<String>,
    /// OperatingSystemConfig type overriding the machine image name
    pub extension_type: Option<String>,
}

impl Values {
    /// Pools that have a machine image and therefore get configs.
    pub fn deployable_pools(&self) -> impl Iterator<Item = &WorkerPool> {
        self.workers.iter().filter(|pool| pool.machine.image.is_some())
    }

    /// Effective Kubernetes version of a pool.
    pub fn pool_version(&self, pool: &WorkerPool) -> Result<Version, ControllerError> {
        match pool.kubernetes.as_ref().and_then(|k| k.version.as_deref()) {
            Some(version) => Ok(parse_version(version)?),
            None => Ok(self.kubernetes_version.clone()),
        }
    }

    /// Key of a pool's configs and payload secret.
    pub fn pool_key(&self, pool: &WorkerPool) -> Result<String, ControllerError> {
        let version = self.pool_version(pool)?;
        Ok(cloud_config::key(&pool.name, Some(&version), pool.cri.as_ref().map(|c| &c.name)))
    }

    /// Images by name for a pool running `version`.
    pub fn images(&self, version: &Version) -> BTreeMap<String, String> {
        let mut images = BTreeMap::new();
        if let Some(repository) = &self.hyperkube_image_repository {
            images.insert(IMAGE_NAME_HYPERKUBE.to_string(), format!("{repository}:v{version}"));
        }
        if let Some(pause) = &self.pause_image {
            images.insert(IMAGE_NAME_PAUSE.to_string(), pause.clone());
        }
        images
    }

    /// Names of all configs that should exist.
    pub fn wanted_names(&self) -> Result<BTreeSet<String>, ControllerError> {
        let mut names = BTreeSet::new();
        for pool in self.deployable_pools() {
            let key = self.pool_key(pool)?;
            for purpose in Purpose::ALL {
                names.insert(osc_name(&key, purpose));
            }
        }
        Ok(names)
    }
}

/// Parses a Kubernetes version, tolerating a leading `v` and a missing patch.
pub fn parse_version(version: &str) -> Result<Version, semver::Error> {
    let version = version.trim_start_matches('v');
    if version.matches('.').count() == 1 {
        Version::parse(&format!("{version}.0"))
    } else {
        Version::parse(version)
    }
}

/// Name of the config for `purpose` of the pool with `key`.
pub fn osc_name(key: &str, purpose: Purpose) -> String {
    format!("{key}-{}", purpose.name_suffix())
}

/// Builds the spec of a pool's config for `purpose`.
///
/// The provision bundle is checked against the provider user-data limit.
pub fn build_spec(
    templates: &ScriptTemplates,
    values: &Values,
    pool: &WorkerPool,
    key: &str,
    purpose: Purpose,
) -> Result<OperatingSystemConfigSpec, ControllerError> {
    let (downloader_units, downloader_files) =
        downloader::config(templates, key, &values.api_server_url, &values.ca_secret_name)?;

    let (units, files, reload_config_file_path) = match purpose {
        Purpose::Provision => {
            let mut secrets = SecretData::new();
            secrets.insert(
                values.ca_secret_name.clone(),
                BTreeMap::from([(
                    downloader::DATA_KEY_CA_BUNDLE.to_string(),
                    values.ca_bundle.clone().unwrap_or_default().into_bytes(),
                )]),
            );
            let user_data = userdata::render(&downloader_units, &downloader_files, &secrets)?;
            userdata::ensure_within_limit(&user_data)?;

            (downloader_units, downloader_files, None)
        }
        Purpose::Reconcile => {
            let version = values.pool_version(pool)?;
            let images = values.images(&version);
            let ctx = Context {
                worker_pool_name: &pool.name,
                kubernetes_version: &version,
                cri_name: pool.cri.as_ref().map(|c| c.name).unwrap_or_default(),
                ca_bundle: values.ca_bundle.as_deref(),
                ssh_public_keys: &values.ssh_public_keys,
                cluster_dns: values.cluster_dns.as_deref(),
                cluster_domain: &values.cluster_domain,
                images: &images,
            };
            let (mut units, mut files) = components::config(&ctx)?;
            units.extend(downloader_units);
            files.extend(downloader::files_without_bootstrap_token(&downloader_files));

            (units, files, Some(NodePaths::default().cloud_config))
        }
    };

    let type_ = match (&values.extension_type, &pool.machine.image) {
        (Some(extension_type), _) => extension_type.clone(),
        (None, Some(image)) => image.name.clone(),
        (None, None) => {
            return Err(ControllerError::InvalidConfig(format!("worker pool {} has no machine image", pool.name)));
        }
    };

    Ok(OperatingSystemConfigSpec {
        type_,
        provider_config: None,
        purpose,
        reload_config_file_path,
        units,
        files,
        cri_config: pool.cri.clone(),
    })
}

/// Wraps a spec into an object owned by the Shoot and labelled with the pool.
pub fn build_object(values: &Values, pool: &WorkerPool, name: &str, spec: OperatingSystemConfigSpec) -> OperatingSystemConfig {
    let mut osc = OperatingSystemConfig::new(name, spec);
    osc.metadata = ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(values.namespace.clone()),
        labels: Some(BTreeMap::from([(LABEL_WORKER_POOL.to_string(), pool.name.clone())])),
        owner_references: values.owner_reference.clone().map(|owner| vec![owner]),
        ..Default::default()
    };
    osc
}
