//! Test utilities for the orchestrator and reconciler
//!
//! `FakeApiServer` answers the kube client from an in-memory object store
//! keyed by API path. It understands get, list (with label-existence
//! selectors), create, merge and apply patches, and delete. That is enough
//! to drive the controller without a cluster.

use base64::prelude::*;
use crds::{ANNOTATION_OPERATION, OSC_SECRET_DATA_KEY};
use http::{Method, Request, Response, StatusCode};
use kube::Client;
use kube::client::Body;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tower_test::mock;

type Store = Arc<Mutex<BTreeMap<String, Value>>>;

/// In-memory API server backing a kube [`Client`].
#[derive(Clone)]
pub struct FakeApiServer {
    objects: Store,
    client: Client,
}

impl FakeApiServer {
    /// Starts serving requests on the current runtime.
    pub fn start() -> Self {
        let (service, mut handle) = mock::pair::<Request<Body>, Response<Body>>();
        let objects: Store = Arc::default();

        let store = objects.clone();
        tokio::spawn(async move {
            while let Some((request, send)) = handle.next_request().await {
                let response = serve(&store, request).await;
                send.send_response(response);
            }
        });

        Self { objects, client: Client::new(service, "default") }
    }

    /// Client talking to this server.
    pub fn client(&self) -> Client {
        self.client.clone()
    }

    /// Object stored at `path`.
    pub fn get(&self, path: &str) -> Option<Value> {
        self.objects.lock().unwrap().get(path).cloned()
    }

    /// Stores `object` at `path`, replacing what was there.
    pub fn put(&self, path: &str, object: Value) {
        self.objects.lock().unwrap().insert(path.to_string(), object);
    }

    /// Objects directly below the collection `path`.
    pub fn list(&self, path: &str) -> Vec<Value> {
        items(&self.objects.lock().unwrap(), path)
    }

    /// Modifies the object at `path` in place. Returns false if it is absent.
    pub fn update(&self, path: &str, f: impl FnOnce(&mut Value)) -> bool {
        match self.objects.lock().unwrap().get_mut(path) {
            Some(object) => {
                f(object);
                true
            }
            None => false,
        }
    }

    /// Plays the provider extension for the OperatingSystemConfig at `path`:
    /// picks up the operation and publishes `content` as its user-data.
    pub fn fulfil(&self, path: &str, content: &str) {
        let mut secret_ref = None;
        self.update(path, |osc| {
            let namespace = osc["metadata"]["namespace"].as_str().unwrap_or_default().to_string();
            let name = osc["metadata"]["name"].as_str().unwrap_or_default().to_string();
            let generation = osc["metadata"]["generation"].clone();
            if let Some(annotations) = osc["metadata"]["annotations"].as_object_mut() {
                annotations.remove(ANNOTATION_OPERATION);
            }
            osc["status"] = json!({
                "observedGeneration": generation,
                "lastOperation": { "description": "", "progress": 100, "state": "Succeeded", "type": "Reconcile" },
                "cloudConfig": { "secretRef": { "name": format!("osc-result-{name}"), "namespace": namespace } },
                "command": "/usr/bin/env bash /var/lib/cloud-config-downloader/downloads/cloud_config",
                "units": ["kubelet.service"],
            });
            secret_ref = Some((namespace, name));
        });

        if let Some((namespace, name)) = secret_ref {
            self.put(
                &format!("/api/v1/namespaces/{namespace}/secrets/osc-result-{name}"),
                json!({
                    "apiVersion": "v1",
                    "kind": "Secret",
                    "metadata": { "name": format!("osc-result-{name}"), "namespace": namespace },
                    "data": { OSC_SECRET_DATA_KEY: BASE64_STANDARD.encode(content) },
                }),
            );
        }
    }

    /// Plays the provider extension handing over the state of the
    /// OperatingSystemConfig at `path`.
    pub fn complete_migration(&self, path: &str) {
        self.update(path, |osc| {
            if let Some(annotations) = osc["metadata"]["annotations"].as_object_mut() {
                annotations.remove(ANNOTATION_OPERATION);
            }
            osc["status"] = json!({
                "lastOperation": { "description": "", "progress": 100, "state": "Succeeded", "type": "Migrate" }
            });
        });
    }
}

fn items(objects: &BTreeMap<String, Value>, collection: &str) -> Vec<Value> {
    let prefix = format!("{collection}/");
    objects
        .iter()
        .filter(|(key, _)| key.strip_prefix(&prefix).is_some_and(|rest| !rest.contains('/')))
        .map(|(_, value)| value.clone())
        .collect()
}

fn is_collection(path: &str) -> bool {
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    let base = if segments.first() == Some(&"api") { 2 } else { 3 };
    matches!(segments.get(base..), Some(["namespaces", _, _]) | Some([_]))
}

fn label_selector(query: &str) -> Option<String> {
    query
        .split('&')
        .find_map(|pair| pair.strip_prefix("labelSelector="))
        .map(percent_decode)
}

fn percent_decode(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let escaped = (bytes[i] == b'%')
            .then(|| value.get(i + 1..i + 3))
            .flatten()
            .and_then(|hex| u8::from_str_radix(hex, 16).ok());
        match escaped {
            Some(byte) => {
                decoded.push(byte);
                i += 3;
            }
            None => {
                decoded.push(if bytes[i] == b'+' { b' ' } else { bytes[i] });
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&decoded).into_owned()
}

fn has_labels(object: &Value, selector: &str) -> bool {
    selector.split(',').all(|requirement| match requirement.split_once('=') {
        Some((key, value)) => object["metadata"]["labels"][key] == value,
        None => object["metadata"]["labels"].get(requirement).is_some(),
    })
}

/// JSON merge patch (RFC 7396).
fn merge(target: &mut Value, patch: &Value) {
    let Value::Object(patch) = patch else {
        *target = patch.clone();
        return;
    };
    if !target.is_object() {
        *target = json!({});
    }
    if let Value::Object(target) = target {
        for (key, value) in patch {
            if value.is_null() {
                target.remove(key);
            } else {
                merge(target.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
    }
}

fn respond(status: StatusCode, body: &Value) -> Response<Body> {
    Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

fn failure(status: StatusCode, reason: &str, message: String) -> Response<Body> {
    respond(
        status,
        &json!({
            "apiVersion": "v1",
            "kind": "Status",
            "metadata": {},
            "status": "Failure",
            "message": message,
            "reason": reason,
            "code": status.as_u16(),
        }),
    )
}

fn bump_generation(object: &mut Value) {
    let generation = object["metadata"]["generation"].as_i64().unwrap_or(0) + 1;
    object["metadata"]["generation"] = json!(generation);
}

async fn serve(store: &Store, request: Request<Body>) -> Response<Body> {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let query = request.uri().query().unwrap_or_default().to_string();
    let content_type = request
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let bytes = request.into_body().collect_bytes().await.unwrap();
    let body: Value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };

    let (path, subresource) = match path.strip_suffix("/status") {
        Some(base) if !is_collection(&path) => (base.to_string(), true),
        _ => (path, false),
    };

    let mut objects = store.lock().unwrap();
    match method {
        Method::GET if is_collection(&path) => {
            let selector = label_selector(&query);
            let items: Vec<Value> = items(&objects, &path)
                .into_iter()
                .filter(|item| selector.as_deref().is_none_or(|s| has_labels(item, s)))
                .collect();
            respond(
                StatusCode::OK,
                &json!({ "apiVersion": "v1", "kind": "List", "metadata": { "resourceVersion": "1" }, "items": items }),
            )
        }
        Method::GET => match objects.get(&path) {
            Some(object) => respond(StatusCode::OK, object),
            None => failure(StatusCode::NOT_FOUND, "NotFound", format!("{path} not found")),
        },
        Method::POST => {
            let name = body["metadata"]["name"].as_str().unwrap_or_default().to_string();
            let key = format!("{path}/{name}");
            if objects.contains_key(&key) {
                return failure(StatusCode::CONFLICT, "AlreadyExists", format!("{key} already exists"));
            }
            let mut object = body;
            object["metadata"]["generation"] = json!(1);
            object["metadata"]["resourceVersion"] = json!("1");
            object["metadata"]["uid"] = json!(format!("uid-{name}"));
            objects.insert(key, object.clone());
            respond(StatusCode::CREATED, &object)
        }
        Method::PATCH if content_type.starts_with("application/apply-patch") => {
            let object = objects.entry(path).or_insert_with(|| json!({}));
            let spec_before = object.get("spec").cloned();
            merge(object, &body);
            if object.get("spec").cloned() != spec_before {
                bump_generation(object);
            }
            respond(StatusCode::OK, object)
        }
        Method::PATCH => match objects.get_mut(&path) {
            Some(object) => {
                let spec_before = object.get("spec").cloned();
                merge(object, &body);
                if !subresource && object.get("spec").cloned() != spec_before {
                    bump_generation(object);
                }
                respond(StatusCode::OK, object)
            }
            None => failure(StatusCode::NOT_FOUND, "NotFound", format!("{path} not found")),
        },
        Method::DELETE => match objects.remove(&path) {
            Some(object) => respond(StatusCode::OK, &object),
            None => failure(StatusCode::NOT_FOUND, "NotFound", format!("{path} not found")),
        },
        _ => failure(StatusCode::METHOD_NOT_ALLOWED, "MethodNotAllowed", format!("{method} {path}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_collection() {
        assert!(is_collection("/api/v1/namespaces/kube-system/secrets"));
        assert!(!is_collection("/api/v1/namespaces/kube-system/secrets/ca"));
        assert!(is_collection("/apis/rbac.authorization.k8s.io/v1/clusterrolebindings"));
        assert!(!is_collection("/apis/rbac.authorization.k8s.io/v1/clusterrolebindings/system:node-bootstrapper"));
    }

    #[test]
    fn test_label_selector_decoding() {
        assert_eq!(
            label_selector("limit=10&labelSelector=worker.gardener.cloud%2Fpurpose%3Dcloud-config-downloader").as_deref(),
            Some("worker.gardener.cloud/purpose=cloud-config-downloader")
        );
        assert!(has_labels(&json!({ "metadata": { "labels": { "a/b": "c" } } }), "a/b"));
        assert!(!has_labels(&json!({ "metadata": { "labels": { "a/b": "c" } } }), "a/b=d"));
    }

    #[test]
    fn test_merge_patch() {
        let mut target = json!({ "a": { "b": 1, "c": 2 }, "d": [1, 2] });
        merge(&mut target, &json!({ "a": { "b": null, "e": 3 }, "d": [3] }));
        assert_eq!(target, json!({ "a": { "c": 2, "e": 3 }, "d": [3] }));
    }
}
