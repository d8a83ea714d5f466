//! Error types for the payload generators.

use thiserror::Error;

/// Errors that can occur while generating node bootstrap payloads.
#[derive(Debug, Error)]
pub enum CloudConfigError {
    /// Script template failed to compile or render
    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    /// YAML serialization failed
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Kubernetes version could not be parsed
    #[error("Invalid version: {0}")]
    Version(#[from] semver::Error),

    /// Resource quantity could not be parsed
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    /// Container runtime not supported for the requested Kubernetes version
    #[error("Unsupported container runtime: {0}")]
    UnsupportedRuntime(String),

    /// Secret referenced by a file has no data for the requested key
    #[error("Missing secret data: {0}")]
    MissingSecretData(String),

    /// Rendered user-data exceeds the provider metadata limit
    #[error("User-data is {size} bytes, limit is {limit} bytes")]
    UserDataTooLarge {
        /// Rendered size in bytes
        size: usize,
        /// Allowed size in bytes
        limit: usize,
    },
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, CloudConfigError>;
