//! containerd initializer.

use super::{Component, Context, IMAGE_NAME_PAUSE};
use crate::error::Result;
use crds::{CriName, DropIn, File, Unit, UnitCommand};

const UNIT_NAME_INITIALIZER: &str = "containerd-initializer.service";
const DROP_IN_NAME: &str = "10-require-containerd-initializer.conf";
const PATH_INIT_SCRIPT: &str = "/opt/bin/init-containerd";

/// Writes a default containerd configuration before containerd starts.
#[derive(Debug)]
pub struct ContainerdInitializer;

impl Component for ContainerdInitializer {
    fn name(&self) -> &'static str {
        "containerd"
    }

    fn config(&self, ctx: &Context<'_>) -> Result<(Vec<Unit>, Vec<File>)> {
        let initializer = Unit {
            name: UNIT_NAME_INITIALIZER.to_string(),
            command: Some(UnitCommand::Start),
            enable: Some(true),
            content: Some(format!(
                "[Unit]
Description=Containerd initializer
[Install]
WantedBy=multi-user.target
[Service]
Type=oneshot
RemainAfterExit=true
ExecStart={PATH_INIT_SCRIPT}
"
            )),
            drop_ins: Vec::new(),
        };

        let containerd = Unit {
            name: CriName::Containerd.unit_name().to_string(),
            command: None,
            enable: Some(true),
            content: None,
            drop_ins: vec![DropIn {
                name: DROP_IN_NAME.to_string(),
                content: format!(
                    "[Unit]
After={UNIT_NAME_INITIALIZER}
Requires={UNIT_NAME_INITIALIZER}
"
                ),
            }],
        };

        let sandbox_image = ctx
            .images
            .get(IMAGE_NAME_PAUSE)
            .map(|image| format!("  sed -i 's|sandbox_image = .*|sandbox_image = \"{image}\"|' \"$CONFIG_FILE\"\n"))
            .unwrap_or_default();

        let script = format!(
            "#!/bin/bash

CONFIG_FILE=/etc/containerd/config.toml
if [[ ! -s \"$CONFIG_FILE\" ]]; then
  mkdir -p /etc/containerd
  containerd config default > \"$CONFIG_FILE\"
  sed -i 's/SystemdCgroup = false/SystemdCgroup = true/' \"$CONFIG_FILE\"
{sandbox_image}  chmod 0644 \"$CONFIG_FILE\"
fi
"
        );

        Ok((
            vec![initializer, containerd],
            vec![File::inline_base64(PATH_INIT_SCRIPT, 0o744, &script)],
        ))
    }
}
