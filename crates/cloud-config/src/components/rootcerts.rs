//! Trust the cluster CA on the node.

use super::{Component, Context};
use crate::error::Result;
use crds::{File, Unit};

const PATH_ROOT_CERTS: &str = "/usr/local/share/ca-certificates/ROOTcerts.crt";

/// Installs the cluster CA bundle into the system trust store.
#[derive(Debug)]
pub struct RootCertificates;

impl Component for RootCertificates {
    fn name(&self) -> &'static str {
        "rootcertificates"
    }

    fn config(&self, ctx: &Context<'_>) -> Result<(Vec<Unit>, Vec<File>)> {
        let unit = Unit::started(
            "updatecacerts.service",
            "[Unit]
Description=Update local certificate authorities
# Since other services depend on the certificate store run this early
DefaultDependencies=no
Wants=systemd-tmpfiles-setup.service clean-ca-certificates.service
After=systemd-tmpfiles-setup.service clean-ca-certificates.service
Before=sysinit.target
ConditionPathIsReadWrite=/etc/ssl/certs
[Service]
Type=oneshot
ExecStart=/usr/sbin/update-ca-certificates
ExecStart=/bin/systemctl restart docker containerd
[Install]
WantedBy=multi-user.target
",
        );

        let bundle = ctx.ca_bundle.unwrap_or_default();
        Ok((vec![unit], vec![File::inline_base64(PATH_ROOT_CERTS, 0o644, bundle)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::tests::context;
    use base64::prelude::*;
    use crds::CriName;
    use semver::Version;
    use std::collections::BTreeMap;

    fn decoded(file: &File) -> String {
        let data = &file.content.inline.as_ref().unwrap().data;
        String::from_utf8(BASE64_STANDARD.decode(data).unwrap()).unwrap()
    }

    #[test]
    fn test_bundle_is_written() {
        let version = Version::new(1, 27, 0);
        let images = BTreeMap::new();
        let ctx = context(&version, CriName::Containerd, &images, &[]);
        let (units, files) = RootCertificates.config(&ctx).unwrap();

        assert_eq!(units[0].name, "updatecacerts.service");
        assert_eq!(files[0].path, PATH_ROOT_CERTS);
        assert!(decoded(&files[0]).starts_with("-----BEGIN CERTIFICATE-----"));
    }

    #[test]
    fn test_missing_bundle_writes_empty_file() {
        let version = Version::new(1, 27, 0);
        let images = BTreeMap::new();
        let mut ctx = context(&version, CriName::Containerd, &images, &[]);
        ctx.ca_bundle = None;
        let (_, files) = RootCertificates.config(&ctx).unwrap();

        assert_eq!(decoded(&files[0]), "");
    }
}
