//! Command handlers, one module per subcommand.

pub mod apply;
pub mod config_cmd;
pub mod destroy;
pub mod import;
pub mod plan;
pub mod refresh;
pub mod util;
pub mod validate;

use std::io;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;
use crate::output::{self, Palette};

/// What every handler needs besides its own arguments.
pub struct Ctx<'a> {
    pub global: &'a GlobalOpts,
    /// Styles for stdout.
    pub out: Palette,
    /// Styles for stderr (diagnostics).
    pub err: Palette,
}

impl<'a> Ctx<'a> {
    pub fn new(global: &'a GlobalOpts) -> Self {
        Self {
            global,
            out: Palette::new(output::should_color(global.color, &io::stdout())),
            err: Palette::new(output::should_color(global.color, &io::stderr())),
        }
    }
}

/// Route a parsed command to its handler.
pub async fn dispatch(cmd: &Command, ctx: &Ctx<'_>) -> Result<(), CliError> {
    match cmd {
        Command::Validate(args) => validate::handle(args, ctx),
        Command::Plan(args) => plan::handle(args, ctx).await,
        Command::Apply(args) => apply::handle(args, ctx).await,
        Command::Refresh(args) => refresh::handle(args, ctx).await,
        Command::Import(args) => import::handle(args, ctx).await,
        Command::Destroy(args) => destroy::handle(args, ctx).await,
        Command::Config(args) => config_cmd::handle(args, ctx),
    }
}
