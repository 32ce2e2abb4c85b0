//! `pbsync apply`: converge the server onto the configuration file.

use pbsync_core::{Applied, ReconcileOutcome, diff};

use crate::cli::ApplyArgs;
use crate::commands::{Ctx, util};
use crate::error::CliError;
use crate::output::{self, Palette};
use crate::state;

pub async fn handle(args: &ApplyArgs, ctx: &Ctx<'_>) -> Result<(), CliError> {
    let desired = util::require_desired(&args.file, ctx.err)?;
    let prior = state::load(&args.state.state)?;

    let reconciler = util::connect(ctx.global).await?;
    let outcome = reconciler.reconcile(prior.as_ref(), Some(&desired)).await;

    // failed operations hand back the prior state; only persist real changes
    if outcome.state != prior {
        state::save(&args.state.state, outcome.state.as_ref())?;
    }

    util::check_outcome(&outcome, "apply", ctx.err)?;

    let rendered = output::render(ctx.global.output, &outcome, |o| summary(o, ctx.out))?;
    output::print_output(&rendered);

    if outcome.requires_replacement {
        let attributes = outcome
            .state
            .as_ref()
            .map(|observed| diff(observed, &desired).replace.join(", "))
            .unwrap_or_default();
        return Err(CliError::ReplacementRequired { attributes });
    }
    Ok(())
}

fn summary(outcome: &ReconcileOutcome, palette: Palette) -> String {
    let Some(state) = outcome.state.as_ref() else {
        return palette.success("Nothing to apply.");
    };
    let what = match outcome.action {
        Applied::Created => "created",
        Applied::Updated => "updated",
        Applied::ReplacementRequired => return String::new(),
        Applied::None
        | Applied::Refreshed
        | Applied::Deleted
        | Applied::Dropped => "already up to date",
    };
    palette.success(&format!("Collection {} ({}) {what}", state.name, state.id))
}
