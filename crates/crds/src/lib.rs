//! Node bootstrap CRD definitions
//!
//! Kubernetes Custom Resource Definitions shared by the cloud-config
//! generators and the OperatingSystemConfig controller.
//!
//! - `OperatingSystemConfig` and `Worker` follow the extension contract in
//!   `extensions.gardener.cloud/v1alpha1` so that provider extensions can
//!   fulfil them.
//! - `Shoot` is the owning resource that supplies the worker pools.

pub mod common;
pub mod operating_system_config;
pub mod shoot;
pub mod worker;

pub use common::*;
pub use operating_system_config::*;
pub use shoot::*;
pub use worker::*;

/// API group of the extension resources.
pub const EXTENSIONS_GROUP: &str = "extensions.gardener.cloud";

/// Annotation requesting an operation from an extension controller.
pub const ANNOTATION_OPERATION: &str = "gardener.cloud/operation";

/// Timestamp annotation bumped on every requested operation.
pub const ANNOTATION_TIMESTAMP: &str = "gardener.cloud/timestamp";

/// Annotation that must be present before extension objects may be deleted.
pub const ANNOTATION_CONFIRMATION_DELETION: &str = "confirmation.gardener.cloud/deletion";

/// Operation annotation values.
pub const OPERATION_RECONCILE: &str = "reconcile";
/// Ask the extension to restore state after a control-plane migration.
pub const OPERATION_RESTORE: &str = "restore";
/// Ask the extension to hand its state over for a control-plane migration.
pub const OPERATION_MIGRATE: &str = "migrate";
