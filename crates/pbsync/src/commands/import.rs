//! `pbsync import`: start tracking an existing collection.

use pbsync_core::desired_from_state;
use tracing::info;

use crate::cli::ImportArgs;
use crate::commands::{Ctx, util};
use crate::error::CliError;
use crate::output;
use crate::state;

pub async fn handle(args: &ImportArgs, ctx: &Ctx<'_>) -> Result<(), CliError> {
    if let Some(path) = args.write_config.as_ref().filter(|p| p.exists()) {
        return Err(CliError::FileExists {
            path: path.display().to_string(),
        });
    }
    if let Some(tracked) = state::load(&args.state.state)? {
        return Err(CliError::AlreadyTracked {
            path: args.state.state.display().to_string(),
            name: tracked.name,
            id: tracked.id,
        });
    }

    let reconciler = util::connect(ctx.global).await?;
    let outcome = reconciler.import(&args.id).await;
    util::check_outcome(&outcome, "import", ctx.err)?;

    state::save(&args.state.state, outcome.state.as_ref())?;

    if let (Some(path), Some(imported)) = (&args.write_config, &outcome.state) {
        util::write_document(path, &desired_from_state(imported))?;
        info!(path = %path.display(), "wrote configuration for imported collection");
    }

    let rendered = output::render(ctx.global.output, &outcome.state, |state| {
        output::render_state(state.as_ref(), ctx.out)
    })?;
    output::print_output(&rendered);
    Ok(())
}
