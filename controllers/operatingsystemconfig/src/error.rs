//! Controller-specific error types.
//!
//! Errors raised while orchestrating OperatingSystemConfigs fall in two
//! groups: retryable ones that end in [`ControllerError::WaitTimeout`] once
//! the wait budget is spent, and severe ones that abort a wait right away.

use cloud_config::CloudConfigError;
use kube::Error as KubeError;
use thiserror::Error;

/// Errors that can occur in the OperatingSystemConfig controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// Kubeconfig of the target cluster could not be loaded
    #[error("Kubeconfig error: {0}")]
    Kubeconfig(#[from] kube::config::KubeconfigError),

    /// Payload generation failed
    #[error("Payload generation failed: {0}")]
    CloudConfig(#[from] CloudConfigError),

    /// JSON (de)serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML (de)serialization failed
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Kubernetes version could not be parsed
    #[error("Invalid Kubernetes version: {0}")]
    Version(#[from] semver::Error),

    /// Metrics registry error
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// I/O error of the probe server
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// An OperatingSystemConfig reported an error for longer than the severe threshold
    #[error("OperatingSystemConfig {name} failed: {description}")]
    Severe {
        /// Object name
        name: String,
        /// Last error reported by the extension
        description: String,
    },

    /// An object did not become ready in time
    #[error("Timed out waiting for {name}: {reason}")]
    WaitTimeout {
        /// Object name
        name: String,
        /// Last observed problem
        reason: String,
    },

    /// A generated manifest lacks identifying fields
    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    /// The wait result of a pool is incomplete
    #[error("No cloud config data for worker pool {0}")]
    MissingCloudConfig(String),

    /// Several concurrent tasks failed
    #[error("{} errors occurred: {}", .0.len(), join(.0))]
    Aggregate(Vec<ControllerError>),

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),
}

impl ControllerError {
    /// Collapses task errors into one error, `None` when there are none.
    pub fn aggregate(mut errors: Vec<ControllerError>) -> Option<ControllerError> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(ControllerError::Aggregate(errors)),
        }
    }

    /// Whether this error stops a wait before its timeout.
    pub fn is_severe(&self) -> bool {
        match self {
            ControllerError::Severe { .. } => true,
            ControllerError::Aggregate(errors) => errors.iter().any(ControllerError::is_severe),
            _ => false,
        }
    }
}

fn join(errors: &[ControllerError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}
