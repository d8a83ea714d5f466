//! SSH access to the nodes.

use super::{Component, Context};
use crate::error::Result;
use crds::{File, Unit};

const PATH_AUTHORIZED_KEYS: &str = "/home/gardener/.ssh/authorized_keys";

/// Writes the authorized keys of the `gardener` user.
#[derive(Debug)]
pub struct SshdKeys;

impl Component for SshdKeys {
    fn name(&self) -> &'static str {
        "sshdkeys"
    }

    fn config(&self, ctx: &Context<'_>) -> Result<(Vec<Unit>, Vec<File>)> {
        let mut authorized_keys = ctx.ssh_public_keys.join("\n");
        if !authorized_keys.is_empty() {
            authorized_keys.push('\n');
        }

        Ok((Vec::new(), vec![File::inline_base64(PATH_AUTHORIZED_KEYS, 0o644, &authorized_keys)]))
    }
}
