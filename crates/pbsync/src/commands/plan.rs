//! `pbsync plan`: preview without changing anything.
//!
//! Offline by default: the recorded state is taken as current. With
//! `--refresh` the tracked collection is read from the server first, so
//! out-of-band drift shows up in the plan. The state file is never
//! written.

use pbsync_core::plan::plan;

use crate::cli::PlanArgs;
use crate::commands::{Ctx, util};
use crate::error::CliError;
use crate::output;
use crate::state;

pub async fn handle(args: &PlanArgs, ctx: &Ctx<'_>) -> Result<(), CliError> {
    let desired = util::require_desired(&args.file, ctx.err)?;
    let mut prior = state::load(&args.state.state)?;

    if args.refresh {
        if let Some(recorded) = prior.take() {
            let reconciler = util::connect(ctx.global).await?;
            let refreshed = reconciler.refresh(&recorded).await;
            util::check_outcome(&refreshed, "refresh", ctx.err)?;
            prior = refreshed.state;
        }
    }

    let preview = plan(prior.as_ref(), Some(&desired));
    output::print_diagnostics(&preview.diagnostics, ctx.err);

    let name = desired
        .name
        .as_known()
        .cloned()
        .or_else(|| prior.as_ref().map(|p| p.name.clone()))
        .unwrap_or_default();
    let rendered = output::render(ctx.global.output, &preview, |p| {
        output::render_plan(p, &name, ctx.out)
    })?;
    output::print_output(&rendered);

    if preview.diagnostics.has_error() {
        return Err(CliError::Reconcile {
            operation: "plan".into(),
            errors: preview.diagnostics.errors().count(),
        });
    }
    Ok(())
}
