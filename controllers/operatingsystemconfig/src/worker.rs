//! Hands the provision user-data to the Worker of a Shoot.

use crate::error::ControllerError;
use crate::orchestrator::OperatingSystemConfigs;
use base64::prelude::*;
use crds::{Worker, WorkerPoolSpec};
use kube::api::{Api, Patch, PatchParams};
use kube::Client;
use serde_json::json;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Pools of `pools` with `userData` set from the downloader results.
/// Pools without a result keep their user-data.
pub fn with_user_data(pools: &[WorkerPoolSpec], results: &BTreeMap<String, OperatingSystemConfigs>) -> Vec<WorkerPoolSpec> {
    pools
        .iter()
        .cloned()
        .map(|mut pool| {
            if let Some(oscs) = results.get(&pool.name).filter(|o| !o.downloader.content.is_empty()) {
                pool.user_data = BASE64_STANDARD.encode(&oscs.downloader.content);
            }
            pool
        })
        .collect()
}

/// Patches the user-data of the Worker `name`, if it exists.
///
/// Returns whether the Worker was changed.
pub async fn hand_off_user_data(
    client: &Client,
    namespace: &str,
    name: &str,
    results: &BTreeMap<String, OperatingSystemConfigs>,
) -> Result<bool, ControllerError> {
    let api: Api<Worker> = Api::namespaced(client.clone(), namespace);
    let Some(worker) = api.get_opt(name).await? else {
        debug!(namespace = %namespace, name = %name, "No Worker to hand user-data to");
        return Ok(false);
    };

    let pools = with_user_data(&worker.spec.pools, results);
    if pools == worker.spec.pools {
        return Ok(false);
    }

    // merge patches replace lists as a whole
    let patch = json!({ "spec": { "pools": pools } });
    api.patch(name, &PatchParams::default(), &Patch::Merge(&patch)).await?;
    info!(namespace = %namespace, name = %name, "Updated Worker user-data");
    Ok(true)
}
