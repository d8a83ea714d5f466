//! Status types shared by all extension resources.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Type of the last operation performed on an extension resource.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum LastOperationType {
    /// Object was created
    Create,
    /// Object was reconciled
    Reconcile,
    /// Object is being deleted
    Delete,
    /// Object state was handed over for migration
    Migrate,
    /// Object state was restored after migration
    Restore,
}

/// State of the last operation performed on an extension resource.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum LastOperationState {
    /// Operation is running
    Processing,
    /// Operation finished successfully
    Succeeded,
    /// Operation failed and is retried
    Error,
    /// Operation failed permanently
    Failed,
    /// Operation is waiting for an external precondition
    Pending,
    /// Operation was aborted
    Aborted,
}

/// The last operation an extension controller performed.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LastOperation {
    /// Human readable description
    #[serde(default)]
    pub description: String,

    /// Time of the last update (RFC 3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update_time: Option<String>,

    /// Completion percentage
    #[serde(default)]
    pub progress: i32,

    /// Operation state
    pub state: LastOperationState,

    /// Operation type
    #[serde(rename = "type")]
    pub type_: LastOperationType,
}

/// The last error an extension controller reported.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LastError {
    /// Human readable description of the error
    pub description: String,

    /// Machine readable error codes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub codes: Vec<String>,

    /// Time of the last update (RFC 3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update_time: Option<String>,
}

/// Reference to a secret in a given namespace.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SecretReference {
    /// Name of the secret
    pub name: String,

    /// Namespace of the secret
    #[serde(default)]
    pub namespace: String,
}
