//! Polling of extension objects.
//!
//! A check either succeeds, asks to retry, or reports an error surfaced by the
//! extension. Retries run until the timeout. Extension errors are tolerated
//! for the severe threshold and then fail the wait immediately.

use crate::error::ControllerError;
use crds::{ANNOTATION_OPERATION, LastOperationState, LastOperationType, OperatingSystemConfig, SecretReference};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Outcome of a single check.
#[derive(Debug, Clone, PartialEq)]
pub enum Check<T> {
    /// The object reached the awaited state
    Ready(T),
    /// Not there yet, with the reason
    Retry(String),
    /// The extension reported an error
    Errored(String),
}

/// Timing of a wait.
#[derive(Debug, Clone, Copy)]
pub struct WaitConfig {
    /// Poll interval
    pub interval: Duration,
    /// How long consecutive extension errors are tolerated
    pub severe_threshold: Duration,
    /// Overall budget
    pub timeout: Duration,
}

/// Where the extension stored the encoded user-data.
#[derive(Debug, Clone, PartialEq)]
pub struct CloudConfigStatus {
    /// Status secret
    pub secret_ref: SecretReference,
    /// Reload command
    pub command: Option<String>,
    /// Units contained in the user-data
    pub units: Vec<String>,
}

/// Runs `check` every interval until it is ready, the timeout passes, or an
/// extension error outlives the severe threshold.
pub async fn poll<T, F, Fut>(config: &WaitConfig, name: &str, mut check: F) -> Result<T, ControllerError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Check<T>>,
{
    let start = Instant::now();
    let mut erroring_since: Option<Instant> = None;

    loop {
        let reason = match check().await {
            Check::Ready(value) => return Ok(value),
            Check::Retry(reason) => {
                erroring_since = None;
                reason
            }
            Check::Errored(description) => {
                let since = *erroring_since.get_or_insert_with(Instant::now);
                if since.elapsed() >= config.severe_threshold {
                    return Err(ControllerError::Severe { name: name.to_string(), description });
                }
                description
            }
        };

        let elapsed = start.elapsed();
        if elapsed >= config.timeout {
            return Err(ControllerError::WaitTimeout { name: name.to_string(), reason });
        }

        debug!(name = %name, reason = %reason, "Waiting");
        tokio::time::sleep(config.interval.min(config.timeout - elapsed)).await;
    }
}

fn last_error(osc: &OperatingSystemConfig) -> Option<String> {
    osc.status
        .as_ref()
        .and_then(|s| s.last_error.as_ref())
        .map(|e| e.description.clone())
}

fn operation_pending(osc: &OperatingSystemConfig) -> bool {
    osc.metadata
        .annotations
        .as_ref()
        .is_some_and(|a| a.contains_key(ANNOTATION_OPERATION))
}

/// Whether the extension reconciled the current spec and published the user-data.
pub fn check_ready(osc: &OperatingSystemConfig) -> Check<CloudConfigStatus> {
    if let Some(description) = last_error(osc) {
        return Check::Errored(description);
    }
    let Some(status) = &osc.status else {
        return Check::Retry("no status reported yet".to_string());
    };
    if operation_pending(osc) {
        return Check::Retry("operation annotation not yet picked up".to_string());
    }
    if status.observed_generation != osc.metadata.generation {
        return Check::Retry(format!(
            "observed generation {:?} does not match generation {:?}",
            status.observed_generation, osc.metadata.generation
        ));
    }
    match &status.last_operation {
        Some(op) if op.state == LastOperationState::Succeeded => {}
        Some(op) => return Check::Retry(format!("last operation {:?} is {:?}", op.type_, op.state)),
        None => return Check::Retry("no last operation".to_string()),
    }
    let Some(cloud_config) = &status.cloud_config else {
        return Check::Retry("no cloud config secret reference".to_string());
    };

    Check::Ready(CloudConfigStatus {
        secret_ref: cloud_config.secret_ref.clone(),
        command: status.command.clone(),
        units: status.units.clone(),
    })
}

/// Whether the extension finished handing over its state.
pub fn check_migrated(osc: &OperatingSystemConfig) -> Check<()> {
    if let Some(description) = last_error(osc) {
        return Check::Errored(description);
    }
    match osc.status.as_ref().and_then(|s| s.last_operation.as_ref()) {
        Some(op) if op.type_ == LastOperationType::Migrate && op.state == LastOperationState::Succeeded => {
            Check::Ready(())
        }
        Some(op) => Check::Retry(format!("last operation {:?} is {:?}", op.type_, op.state)),
        None => Check::Retry("no last operation".to_string()),
    }
}

/// Whether all objects are gone.
pub fn check_deleted(remaining: &[OperatingSystemConfig]) -> Check<()> {
    if remaining.is_empty() {
        return Check::Ready(());
    }
    if let Some(description) = remaining.iter().find_map(last_error) {
        return Check::Errored(description);
    }
    let names: Vec<&str> = remaining.iter().filter_map(|osc| osc.metadata.name.as_deref()).collect();
    Check::Retry(format!("still present: {}", names.join(", ")))
}
