//! Shoot-access secret for the downloader identity.
//!
//! The token requestor watches secrets labelled with the token-requestor
//! purpose, requests a token for the annotated service account and writes it
//! into the annotated target secret in the shoot. The downloader reads the
//! token from that target secret.

use crate::downloader;
use crate::rbac;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;

/// Prefix of shoot-access secret names.
pub const SECRET_NAME_PREFIX: &str = "shoot-access-";
/// Validity of the requested token.
pub const TOKEN_EXPIRATION_DURATION: &str = "720h";

const LABEL_PURPOSE: &str = "resources.gardener.cloud/purpose";
const LABEL_PURPOSE_TOKEN_REQUESTOR: &str = "token-requestor";
const ANNOTATION_SERVICE_ACCOUNT_NAME: &str = "serviceaccount.resources.gardener.cloud/name";
const ANNOTATION_SERVICE_ACCOUNT_NAMESPACE: &str = "serviceaccount.resources.gardener.cloud/namespace";
const ANNOTATION_TOKEN_EXPIRATION_DURATION: &str = "serviceaccount.resources.gardener.cloud/token-expiration-duration";
const ANNOTATION_TARGET_SECRET_NAME: &str = "token-requestor.resources.gardener.cloud/target-secret-name";
const ANNOTATION_TARGET_SECRET_NAMESPACE: &str = "token-requestor.resources.gardener.cloud/target-secret-namespace";

/// Name of the downloader's shoot-access secret.
pub fn secret_name() -> String {
    format!("{SECRET_NAME_PREFIX}{}", downloader::NAME)
}

/// Shoot-access secret for the downloader in the control-plane `namespace`.
pub fn secret(namespace: &str) -> Secret {
    let labels = BTreeMap::from([(LABEL_PURPOSE.to_string(), LABEL_PURPOSE_TOKEN_REQUESTOR.to_string())]);
    let annotations = BTreeMap::from([
        (ANNOTATION_SERVICE_ACCOUNT_NAME.to_string(), downloader::NAME.to_string()),
        (ANNOTATION_SERVICE_ACCOUNT_NAMESPACE.to_string(), rbac::NAMESPACE.to_string()),
        (ANNOTATION_TOKEN_EXPIRATION_DURATION.to_string(), TOKEN_EXPIRATION_DURATION.to_string()),
        (ANNOTATION_TARGET_SECRET_NAME.to_string(), downloader::NAME.to_string()),
        (ANNOTATION_TARGET_SECRET_NAMESPACE.to_string(), rbac::NAMESPACE.to_string()),
    ]);

    Secret {
        metadata: ObjectMeta {
            name: Some(secret_name()),
            namespace: Some(namespace.to_string()),
            labels: Some(labels),
            annotations: Some(annotations),
            ..Default::default()
        },
        type_: Some("Opaque".to_string()),
        ..Default::default()
    }
}
