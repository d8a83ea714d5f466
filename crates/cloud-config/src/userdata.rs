//! Cloud-init user-data rendering.
//!
//! Provider extensions own the real encoding. This renderer produces the
//! equivalent `#cloud-config` document so the size of a bundle can be checked
//! against the provider metadata limit before it is deployed.

use crate::error::{CloudConfigError, Result};
use base64::prelude::*;
use crds::{ENCODING_BASE64, File, Unit, UnitCommand};
use serde::Serialize;
use std::collections::BTreeMap;

/// Provider metadata limit for user-data.
pub const MAX_USER_DATA_BYTES: usize = 16 * 1024;

const SYSTEMD_UNIT_DIR: &str = "/etc/systemd/system";
const DEFAULT_PERMISSIONS: i32 = 0o644;

/// Secret data by secret name and data key, used to resolve file references.
pub type SecretData = BTreeMap<String, BTreeMap<String, Vec<u8>>>;

#[derive(Debug, Serialize)]
struct CloudInit {
    write_files: Vec<WriteFile>,
    runcmd: Vec<String>,
}

#[derive(Debug, Serialize)]
struct WriteFile {
    path: String,
    permissions: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    encoding: Option<&'static str>,
    content: String,
}

/// Renders units and files as `#cloud-config` user-data.
pub fn render(units: &[Unit], files: &[File], secrets: &SecretData) -> Result<String> {
    let mut write_files = Vec::new();

    for file in files {
        write_files.push(write_file(file, secrets)?);
    }

    for unit in units {
        if let Some(content) = &unit.content {
            write_files.push(encoded(format!("{SYSTEMD_UNIT_DIR}/{}", unit.name), DEFAULT_PERMISSIONS, content.as_bytes()));
        }
        for drop_in in &unit.drop_ins {
            write_files.push(encoded(
                format!("{SYSTEMD_UNIT_DIR}/{}.d/{}", unit.name, drop_in.name),
                DEFAULT_PERMISSIONS,
                drop_in.content.as_bytes(),
            ));
        }
    }

    let mut runcmd = vec!["systemctl daemon-reload".to_string()];
    for unit in units {
        if unit.enable.unwrap_or(true) {
            runcmd.push(format!("systemctl enable '{}'", unit.name));
        }
        match unit.command {
            Some(UnitCommand::Start) => runcmd.push(format!("systemctl start '{}'", unit.name)),
            Some(UnitCommand::Restart) => runcmd.push(format!("systemctl restart '{}'", unit.name)),
            Some(UnitCommand::Stop) => runcmd.push(format!("systemctl stop '{}'", unit.name)),
            None => {}
        }
    }

    let document = serde_yaml::to_string(&CloudInit { write_files, runcmd })?;
    Ok(format!("#cloud-config\n\n{document}"))
}

/// Fails if `user_data` exceeds the provider metadata limit.
pub fn ensure_within_limit(user_data: &str) -> Result<()> {
    if user_data.len() > MAX_USER_DATA_BYTES {
        return Err(CloudConfigError::UserDataTooLarge {
            size: user_data.len(),
            limit: MAX_USER_DATA_BYTES,
        });
    }
    Ok(())
}

fn write_file(file: &File, secrets: &SecretData) -> Result<WriteFile> {
    let permissions = file.permissions.unwrap_or(DEFAULT_PERMISSIONS);

    if let Some(secret_ref) = &file.content.secret_ref {
        let data = secrets
            .get(&secret_ref.name)
            .and_then(|data| data.get(&secret_ref.data_key))
            .ok_or_else(|| CloudConfigError::MissingSecretData(format!("{}/{}", secret_ref.name, secret_ref.data_key)))?;
        return Ok(encoded(file.path.clone(), permissions, data));
    }

    let inline = file.content.inline.as_ref();
    let data = inline.map(|i| i.data.as_str()).unwrap_or_default();

    if file.content.transmit_unencoded.unwrap_or(false) {
        return Ok(WriteFile {
            path: file.path.clone(),
            permissions: octal(permissions),
            encoding: None,
            content: data.to_string(),
        });
    }

    if inline.is_some_and(|i| i.encoding == ENCODING_BASE64) {
        return Ok(WriteFile {
            path: file.path.clone(),
            permissions: octal(permissions),
            encoding: Some(ENCODING_BASE64),
            content: data.to_string(),
        });
    }

    Ok(encoded(file.path.clone(), permissions, data.as_bytes()))
}

fn encoded(path: String, permissions: i32, data: &[u8]) -> WriteFile {
    WriteFile {
        path,
        permissions: octal(permissions),
        encoding: Some(ENCODING_BASE64),
        content: BASE64_STANDARD.encode(data),
    }
}

fn octal(permissions: i32) -> String {
    format!("{permissions:04o}")
}
