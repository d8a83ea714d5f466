//! Compiled shell script templates.
//!
//! Templates are compiled once into a [`ScriptTemplates`] value that the
//! generators borrow. Undefined variables are errors so a missing input never
//! renders as an empty string inside a script.

use crate::error::Result;
use minijinja::{AutoEscape, Environment, UndefinedBehavior};
use serde::Serialize;

/// Name of the downloader script template.
pub const DOWNLOADER_TEMPLATE: &str = "download-cloud-config.sh";
/// Name of the executor script template.
pub const EXECUTOR_TEMPLATE: &str = "execute-cloud-config.sh";

/// Script templates shared by the downloader and executor generators.
#[derive(Debug)]
pub struct ScriptTemplates {
    env: Environment<'static>,
}

impl ScriptTemplates {
    /// Compiles all script templates.
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_keep_trailing_newline(true);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);

        env.add_template(
            DOWNLOADER_TEMPLATE,
            include_str!("../templates/download-cloud-config.sh.j2"),
        )?;
        env.add_template(
            EXECUTOR_TEMPLATE,
            include_str!("../templates/execute-cloud-config.sh.j2"),
        )?;

        Ok(Self { env })
    }

    /// Renders the named template with `ctx`.
    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String> {
        let template = self.env.get_template(name)?;
        Ok(template.render(ctx)?)
    }
}
