//! Controller configuration from environment variables.

use crate::error::ControllerError;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration of the controller.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Namespace to watch Shoots in, all namespaces when unset
    pub namespace: Option<String>,
    /// Kubeconfig of the cluster the nodes join, the in-cluster config when unset
    pub target_kubeconfig: Option<PathBuf>,
    /// Listen address of the probe and metrics server
    pub metrics_addr: SocketAddr,
    /// Poll interval while waiting for OperatingSystemConfigs
    pub wait_interval: Duration,
    /// How long an extension error is tolerated before a wait fails
    pub wait_severe_threshold: Duration,
    /// Overall wait budget
    pub wait_timeout: Duration,
    /// Repository of the hyperkube image, binary staging is off when unset
    pub hyperkube_image_repository: Option<String>,
    /// Pause image handed to the kubelet and containerd
    pub pause_image: Option<String>,
    /// OperatingSystemConfig type, the machine image name when unset
    pub extension_type: Option<String>,
}

impl ControllerConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ControllerError> {
        Self::from_vars(std::env::vars().collect())
    }

    /// Reads the configuration from the given variables.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ControllerError> {
        let var = |name: &str| vars.get(name).filter(|v| !v.is_empty()).cloned();

        let metrics_addr = var("METRICS_ADDR")
            .unwrap_or_else(|| "0.0.0.0:8080".to_string())
            .parse()
            .map_err(|e| ControllerError::InvalidConfig(format!("METRICS_ADDR: {e}")))?;

        let seconds = |name: &str, default: u64| -> Result<Duration, ControllerError> {
            match var(name) {
                Some(value) => value
                    .parse()
                    .map(Duration::from_secs)
                    .map_err(|e| ControllerError::InvalidConfig(format!("{name}: {e}"))),
                None => Ok(Duration::from_secs(default)),
            }
        };

        let config = Self {
            namespace: var("WATCH_NAMESPACE"),
            target_kubeconfig: var("TARGET_KUBECONFIG").map(PathBuf::from),
            metrics_addr,
            wait_interval: seconds("OSC_WAIT_INTERVAL_SECONDS", 5)?,
            wait_severe_threshold: seconds("OSC_WAIT_SEVERE_THRESHOLD_SECONDS", 30)?,
            wait_timeout: seconds("OSC_WAIT_TIMEOUT_SECONDS", 180)?,
            hyperkube_image_repository: var("HYPERKUBE_IMAGE_REPOSITORY"),
            pause_image: var("PAUSE_IMAGE"),
            extension_type: var("OSC_EXTENSION_TYPE"),
        };

        if config.wait_interval.is_zero() {
            return Err(ControllerError::InvalidConfig(
                "OSC_WAIT_INTERVAL_SECONDS must be greater than zero".to_string(),
            ));
        }
        if config.wait_timeout < config.wait_interval {
            return Err(ControllerError::InvalidConfig(
                "OSC_WAIT_TIMEOUT_SECONDS must not be shorter than the wait interval".to_string(),
            ));
        }

        Ok(config)
    }
}
