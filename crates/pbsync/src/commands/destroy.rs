//! `pbsync destroy`: delete the tracked collection.

use crate::cli::DestroyArgs;
use crate::commands::{Ctx, util};
use crate::error::CliError;
use crate::output;
use crate::state;

pub async fn handle(args: &DestroyArgs, ctx: &Ctx<'_>) -> Result<(), CliError> {
    let Some(prior) = state::load(&args.state.state)? else {
        output::print_output("Nothing to destroy.");
        return Ok(());
    };
    if !args.yes {
        return Err(CliError::ConfirmationRequired { name: prior.name });
    }

    let reconciler = util::connect(ctx.global).await?;
    let outcome = reconciler.delete(&prior).await;
    util::check_outcome(&outcome, "destroy", ctx.err)?;

    state::save(&args.state.state, None)?;

    let rendered = output::render(ctx.global.output, &outcome, |_| {
        ctx.out
            .success(&format!("Collection {} ({}) destroyed", prior.name, prior.id))
    })?;
    output::print_output(&rendered);
    Ok(())
}
