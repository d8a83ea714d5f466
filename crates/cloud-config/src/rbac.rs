//! RBAC bundle granting the downloader and bootstrapping nodes their access.

use crate::downloader;
use crate::error::Result;
use k8s_openapi::Resource;
use k8s_openapi::api::rbac::v1::{ClusterRoleBinding, PolicyRule, Role, RoleBinding, RoleRef, Subject};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::Serialize;
use std::collections::BTreeMap;

/// Namespace of the downloader's role and secrets.
pub const NAMESPACE: &str = "kube-system";
/// Secret holding the logging agent's token, read by the node as well.
pub const PROMTAIL_SECRET_NAME: &str = "gardener-promtail";
/// Group of bootstrap token identities.
pub const GROUP_BOOTSTRAPPERS: &str = "system:bootstrappers";
/// Group of node identities.
pub const GROUP_NODES: &str = "system:nodes";

const RBAC_API_GROUP: &str = "rbac.authorization.k8s.io";

/// Serializes the role, role binding and cluster role bindings that let the
/// downloader read `secret_names` and let nodes bootstrap their client
/// certificates. Keys are `<kind>__<namespace>__<name>.yaml`.
pub fn generate_rbac_resources_data(secret_names: &[String]) -> Result<BTreeMap<String, Vec<u8>>> {
    let mut resource_names = secret_names.to_vec();
    resource_names.push(downloader::NAME.to_string());
    resource_names.push(PROMTAIL_SECRET_NAME.to_string());

    let role = Role {
        metadata: namespaced_meta(downloader::NAME),
        rules: Some(vec![PolicyRule {
            api_groups: Some(vec![String::new()]),
            resources: Some(vec!["secrets".to_string()]),
            resource_names: Some(resource_names),
            verbs: vec!["get".to_string()],
            ..Default::default()
        }]),
    };

    let role_binding = RoleBinding {
        metadata: namespaced_meta(downloader::NAME),
        role_ref: RoleRef {
            api_group: RBAC_API_GROUP.to_string(),
            kind: Role::KIND.to_string(),
            name: downloader::NAME.to_string(),
        },
        subjects: Some(vec![
            group(GROUP_BOOTSTRAPPERS),
            Subject {
                kind: "ServiceAccount".to_string(),
                name: downloader::NAME.to_string(),
                namespace: Some(NAMESPACE.to_string()),
                ..Default::default()
            },
        ]),
    };

    let mut data = BTreeMap::new();
    insert(&mut data, &role)?;
    insert(&mut data, &role_binding)?;
    insert(&mut data, &cluster_role_binding("system:node-bootstrapper", GROUP_BOOTSTRAPPERS))?;
    insert(
        &mut data,
        &cluster_role_binding("system:certificates.k8s.io:certificatesigningrequests:nodeclient", GROUP_BOOTSTRAPPERS),
    )?;
    insert(
        &mut data,
        &cluster_role_binding("system:certificates.k8s.io:certificatesigningrequests:selfnodeclient", GROUP_NODES),
    )?;

    Ok(data)
}

/// Key of a serialized object in a resource bundle.
pub fn object_key(kind: &str, namespace: &str, name: &str) -> String {
    format!("{}__{}__{}.yaml", kind.to_lowercase(), namespace, name.replace(':', "_"))
}

fn insert<K>(data: &mut BTreeMap<String, Vec<u8>>, object: &K) -> Result<()>
where
    K: Resource + Serialize + k8s_openapi::Metadata<Ty = ObjectMeta>,
{
    let meta = object.metadata();
    let key = object_key(
        K::KIND,
        meta.namespace.as_deref().unwrap_or_default(),
        meta.name.as_deref().unwrap_or_default(),
    );
    data.insert(key, serde_yaml::to_string(object)?.into_bytes());
    Ok(())
}

fn namespaced_meta(name: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(NAMESPACE.to_string()),
        ..Default::default()
    }
}

fn group(name: &str) -> Subject {
    Subject {
        api_group: Some(RBAC_API_GROUP.to_string()),
        kind: "Group".to_string(),
        name: name.to_string(),
        namespace: None,
    }
}

fn cluster_role_binding(name: &str, group_name: &str) -> ClusterRoleBinding {
    ClusterRoleBinding {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        role_ref: RoleRef {
            api_group: RBAC_API_GROUP.to_string(),
            kind: "ClusterRole".to_string(),
            name: name.to_string(),
        },
        subjects: Some(vec![group(group_name)]),
    }
}
