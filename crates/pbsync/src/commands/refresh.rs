//! `pbsync refresh`: read the tracked collection back into state.

use pbsync_core::Applied;

use crate::cli::StateArgs;
use crate::commands::{Ctx, util};
use crate::error::CliError;
use crate::output;
use crate::state;

pub async fn handle(args: &StateArgs, ctx: &Ctx<'_>) -> Result<(), CliError> {
    let Some(prior) = state::load(&args.state)? else {
        output::print_output(&output::render(ctx.global.output, &None::<()>, |_| {
            "No collection tracked.".to_owned()
        })?);
        return Ok(());
    };

    let reconciler = util::connect(ctx.global).await?;
    let outcome = reconciler.refresh(&prior).await;
    util::check_outcome(&outcome, "refresh", ctx.err)?;

    if outcome.state.as_ref() != Some(&prior) {
        state::save(&args.state, outcome.state.as_ref())?;
    }

    let rendered = output::render(ctx.global.output, &outcome.state, |state| {
        if outcome.action == Applied::Dropped {
            format!(
                "Collection {} ({}) no longer exists and was removed from state.",
                prior.name, prior.id
            )
        } else {
            output::render_state(state.as_ref(), ctx.out)
        }
    })?;
    output::print_output(&rendered);
    Ok(())
}
