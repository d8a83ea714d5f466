//! journald retention settings.

use super::{Component, Context};
use crate::error::Result;
use crds::{File, Unit, UnitCommand};

const PATH_JOURNALD_CONFIG: &str = "/etc/systemd/journald.conf.d/journald.conf";

/// Caps the journal size and restarts journald to pick up the change.
#[derive(Debug)]
pub struct Journald;

impl Component for Journald {
    fn name(&self) -> &'static str {
        "journald"
    }

    fn config(&self, _ctx: &Context<'_>) -> Result<(Vec<Unit>, Vec<File>)> {
        let unit = Unit {
            name: "systemd-journald.service".to_string(),
            command: Some(UnitCommand::Restart),
            enable: Some(false),
            content: None,
            drop_ins: Vec::new(),
        };

        let config = "[Journal]
SystemMaxUse=5%
SystemMaxFileSize=1G
SystemMaxFiles=5
";

        Ok((vec![unit], vec![File::inline_base64(PATH_JOURNALD_CONFIG, 0o644, config)]))
    }
}
