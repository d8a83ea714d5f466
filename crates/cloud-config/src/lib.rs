//! Node bootstrap payloads
//!
//! Everything a worker node needs to join the cluster, rendered as data:
//! the cloud-config downloader, the executor script it runs, the catalog of
//! node components, the RBAC objects that let nodes fetch their config and
//! the key that identifies a worker pool's configuration.

pub mod bootstrap_token;
pub mod components;
pub mod downloader;
pub mod error;
pub mod executor;
pub mod key;
pub mod paths;
pub mod quantity;
pub mod rbac;
pub mod shoot_access;
pub mod template;
pub mod userdata;

pub use error::{CloudConfigError, Result};
pub use key::key;
pub use paths::NodePaths;
pub use template::ScriptTemplates;
