//! Kubernetes bootstrap tokens.
//!
//! Tokens have the form `<id>.<secret>` with a 6 character id and a 16
//! character secret from `[a-z0-9]`, stored in a `bootstrap-token-<id>`
//! secret in `kube-system`.

use chrono::{DateTime, Duration, Utc};
use k8s_openapi::ByteString;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use rand::Rng;
use std::collections::BTreeMap;

/// Secret type of bootstrap tokens.
pub const SECRET_TYPE: &str = "bootstrap.kubernetes.io/token";
/// Prefix of bootstrap token secret names.
pub const SECRET_NAME_PREFIX: &str = "bootstrap-token-";

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const ID_LENGTH: usize = 6;
const SECRET_LENGTH: usize = 16;

const DATA_KEY_ID: &str = "token-id";
const DATA_KEY_SECRET: &str = "token-secret";
const DATA_KEY_EXPIRATION: &str = "expiration";
const DATA_KEY_DESCRIPTION: &str = "description";
const DATA_KEY_USAGE_AUTHENTICATION: &str = "usage-bootstrap-authentication";
const DATA_KEY_USAGE_SIGNING: &str = "usage-bootstrap-signing";

/// A bootstrap token.
#[derive(Clone, PartialEq, Eq)]
pub struct BootstrapToken {
    id: String,
    secret: String,
}

impl BootstrapToken {
    /// Generates a new random token.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let mut random = |len: usize| -> String {
            (0..len)
                .map(|_| char::from(ALPHABET[rng.gen_range(0..ALPHABET.len())]))
                .collect()
        };
        let id = random(ID_LENGTH);
        let secret = random(SECRET_LENGTH);
        Self { id, secret }
    }

    /// Reads the token stored in a bootstrap token secret.
    pub fn from_secret(secret: &Secret) -> Option<Self> {
        let data = secret.data.as_ref()?;
        let read = |key: &str| -> Option<String> { String::from_utf8(data.get(key)?.0.clone()).ok() };
        let id = read(DATA_KEY_ID)?;
        let token_secret = read(DATA_KEY_SECRET)?;
        if id.len() != ID_LENGTH || token_secret.len() != SECRET_LENGTH {
            return None;
        }
        Some(Self { id, secret: token_secret })
    }

    /// Token id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The `<id>.<secret>` token presented to the API server.
    pub fn token(&self) -> String {
        format!("{}.{}", self.id, self.secret)
    }

    /// Name of the secret storing this token.
    pub fn secret_name(&self) -> String {
        format!("{SECRET_NAME_PREFIX}{}", self.id)
    }

    /// Secret storing this token, valid until `expiration`.
    pub fn to_secret(&self, namespace: &str, description: &str, expiration: DateTime<Utc>) -> Secret {
        let data: BTreeMap<String, ByteString> = [
            (DATA_KEY_DESCRIPTION, description.to_string()),
            (DATA_KEY_ID, self.id.clone()),
            (DATA_KEY_SECRET, self.secret.clone()),
            (DATA_KEY_EXPIRATION, expiration.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)),
            (DATA_KEY_USAGE_AUTHENTICATION, "true".to_string()),
            (DATA_KEY_USAGE_SIGNING, "true".to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), ByteString(v.into_bytes())))
        .collect();

        Secret {
            metadata: ObjectMeta {
                name: Some(self.secret_name()),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            type_: Some(SECRET_TYPE.to_string()),
            data: Some(data),
            ..Default::default()
        }
    }
}

impl std::fmt::Debug for BootstrapToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapToken").field("id", &self.id).finish_non_exhaustive()
    }
}

/// Whether a bootstrap token secret is still valid for at least `min_remaining`.
pub fn is_valid_for(secret: &Secret, now: DateTime<Utc>, min_remaining: Duration) -> bool {
    let Some(expiration) = secret
        .data
        .as_ref()
        .and_then(|data| data.get(DATA_KEY_EXPIRATION))
        .and_then(|value| std::str::from_utf8(&value.0).ok())
        .and_then(|value| DateTime::parse_from_rfc3339(value).ok())
    else {
        return false;
    };
    expiration.with_timezone(&Utc) - now >= min_remaining
}
