//! Downloader bundle generator.
//!
//! The downloader bundle is the literal provider user-data of a machine: one
//! systemd unit, the credentials it needs and a script that fetches and runs
//! the executor script from the payload secret. It must stay small, every
//! byte counts against the provider metadata limit.

use crate::error::Result;
use crate::paths::NodePaths;
use crate::template::{DOWNLOADER_TEMPLATE, ScriptTemplates};
use crds::{File, FileContent, FileContentInline, FileContentSecretRef, Unit};
use minijinja::context;

/// Name of the downloader systemd unit.
pub const UNIT_NAME: &str = "cloud-config-downloader.service";
/// Name of the downloader identity (service account and shoot-access secret).
pub const NAME: &str = "cloud-config-downloader";
/// Key of the access token in the shoot-access secret.
pub const DATA_KEY_TOKEN: &str = "token";
/// Key of the executor script in the payload secret.
pub const DATA_KEY_SCRIPT: &str = "script";
/// Annotation on the payload secret carrying the script checksum.
pub const ANNOTATION_KEY_CHECKSUM: &str = "checksum/data-script";
/// Key of the CA bundle in the cluster CA secret.
pub const DATA_KEY_CA_BUNDLE: &str = "bundle.crt";
/// Sentinel substituted with a real bootstrap token before the machine boots.
pub const BOOTSTRAP_TOKEN_PLACEHOLDER: &str = "<<BOOTSTRAP_TOKEN>>";
/// Restart interval of the downloader unit in seconds.
pub const RESTART_SEC: u32 = 30;

const PERMISSIONS_READ: i32 = 0o644;
const PERMISSIONS_EXECUTE: i32 = 0o744;

/// Generates the downloader units and files for the payload secret `key`.
pub fn config(
    templates: &ScriptTemplates,
    key: &str,
    api_server_url: &str,
    cluster_ca_secret_name: &str,
) -> Result<(Vec<Unit>, Vec<File>)> {
    let paths = NodePaths::default();
    let script = script(templates, key, &paths)?;

    let units = vec![Unit::started(UNIT_NAME, unit_content(&paths))];

    let files = vec![
        File::inline_base64(&paths.credentials_server, PERMISSIONS_READ, api_server_url),
        File {
            path: paths.credentials_ca_cert.clone(),
            permissions: Some(PERMISSIONS_READ),
            content: FileContent {
                secret_ref: Some(FileContentSecretRef {
                    name: cluster_ca_secret_name.to_string(),
                    data_key: DATA_KEY_CA_BUNDLE.to_string(),
                }),
                ..Default::default()
            },
        },
        File::inline_base64(&paths.downloader_script, PERMISSIONS_EXECUTE, &script),
        File {
            path: paths.credentials_bootstrap_token.clone(),
            permissions: Some(PERMISSIONS_READ),
            content: FileContent {
                inline: Some(FileContentInline {
                    encoding: String::new(),
                    data: BOOTSTRAP_TOKEN_PLACEHOLDER.to_string(),
                }),
                transmit_unencoded: Some(true),
                ..Default::default()
            },
        },
    ];

    Ok((units, files))
}

/// Renders the downloader script for the given layout.
pub fn script(templates: &ScriptTemplates, key: &str, paths: &NodePaths) -> Result<String> {
    templates.render(
        DOWNLOADER_TEMPLATE,
        context! {
            secret_name => key,
            token_secret_name => NAME,
            paths => paths,
            data_key_token => DATA_KEY_TOKEN,
            data_key_script => DATA_KEY_SCRIPT,
            checksum_annotation_pattern => ANNOTATION_KEY_CHECKSUM.replace('/', "\\/"),
        },
    )
}

/// Downloader files without the bootstrap-token placeholder. Long-lived
/// configs must never carry the sentinel.
pub fn files_without_bootstrap_token(files: &[File]) -> Vec<File> {
    let bootstrap_token_path = NodePaths::default().credentials_bootstrap_token;
    files
        .iter()
        .filter(|f| f.path != bootstrap_token_path)
        .cloned()
        .collect()
}

fn unit_content(paths: &NodePaths) -> String {
    format!(
        "[Unit]
Description=Downloads the actual cloud config from the Shoot API server and executes it
After=docker.service docker.socket containerd.service
Wants=docker.socket
[Service]
Restart=always
RestartSec={RESTART_SEC}
RuntimeMaxSec=1200
EnvironmentFile=/etc/environment
ExecStart={}
[Install]
WantedBy=multi-user.target
",
        paths.downloader_script
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::prelude::*;

    fn generate() -> (Vec<Unit>, Vec<File>) {
        let templates = ScriptTemplates::new().unwrap();
        config(&templates, "cloud-config-worker1-8a8eb", "https://api.example.com", "ca").unwrap()
    }

    fn inline_data(file: &File) -> String {
        let inline = file.content.inline.as_ref().unwrap();
        if inline.encoding == "b64" {
            String::from_utf8(BASE64_STANDARD.decode(&inline.data).unwrap()).unwrap()
        } else {
            inline.data.clone()
        }
    }

    #[test]
    fn test_unit() {
        let (units, _) = generate();
        assert_eq!(units.len(), 1);
        let unit = &units[0];
        assert_eq!(unit.name, "cloud-config-downloader.service");
        assert_eq!(unit.enable, Some(true));
        let content = unit.content.as_deref().unwrap();
        for line in [
            "Restart=always",
            "RestartSec=30",
            "RuntimeMaxSec=1200",
            "After=docker.service docker.socket containerd.service",
            "ExecStart=/var/lib/cloud-config-downloader/download-cloud-config.sh",
        ] {
            assert!(content.lines().any(|l| l == line), "missing {line}");
        }
    }

    #[test]
    fn test_files() {
        let (_, files) = generate();
        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "/var/lib/cloud-config-downloader/credentials/server",
                "/var/lib/cloud-config-downloader/credentials/ca.crt",
                "/var/lib/cloud-config-downloader/download-cloud-config.sh",
                "/var/lib/cloud-config-downloader/credentials/bootstrap-token",
            ]
        );

        assert_eq!(inline_data(&files[0]), "https://api.example.com");
        assert_eq!(files[0].permissions, Some(0o644));

        let ca_ref = files[1].content.secret_ref.as_ref().unwrap();
        assert_eq!(ca_ref.name, "ca");
        assert_eq!(ca_ref.data_key, "bundle.crt");

        assert_eq!(files[2].permissions, Some(0o744));
        assert!(inline_data(&files[2]).starts_with("#!/bin/bash -eu"));

        let token = &files[3];
        assert_eq!(token.permissions, Some(0o644));
        assert_eq!(token.content.transmit_unencoded, Some(true));
        assert_eq!(token.content.inline.as_ref().unwrap().encoding, "");
        assert_eq!(inline_data(token), "<<BOOTSTRAP_TOKEN>>");
    }

    #[test]
    fn test_script_contents() {
        let templates = ScriptTemplates::new().unwrap();
        let script = script(&templates, "cloud-config-worker1-8a8eb", &NodePaths::default()).unwrap();

        assert!(script.contains(r#"SECRET_NAME="cloud-config-worker1-8a8eb""#));
        assert!(script.contains(r#"TOKEN_SECRET_NAME="cloud-config-downloader""#));
        assert!(script.contains(r"checksum\/data-script: (.*)"));
        assert!(script.contains(r#"extractDataKeyFromSecret "$SECRET" "token""#));
        assert!(script.contains(r#"extractDataKeyFromSecret "$SECRET" "script""#));
        assert!(script.contains("/var/lib/cloud-config-downloader/credentials/bootstrap-token"));
        assert!(!script.contains("{{"));
    }

    #[test]
    fn test_files_without_bootstrap_token() {
        let (_, files) = generate();
        let filtered = files_without_bootstrap_token(&files);
        assert_eq!(filtered.len(), 3);
        assert!(filtered.iter().all(|f| !f.path.ends_with("bootstrap-token")));
        assert!(
            filtered
                .iter()
                .all(|f| f.content.inline.as_ref().is_none_or(|i| i.data != BOOTSTRAP_TOKEN_PLACEHOLDER))
        );
    }
}
