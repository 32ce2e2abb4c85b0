//! `pbsync validate`: offline configuration check.

use serde::Serialize;

use pbsync_core::Diagnostics;

use crate::cli::{OutputFormat, ValidateArgs};
use crate::commands::{Ctx, util};
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct Report<'a> {
    file: String,
    valid: bool,
    diagnostics: &'a Diagnostics,
}

pub fn handle(args: &ValidateArgs, ctx: &Ctx<'_>) -> Result<(), CliError> {
    let (desired, diagnostics) = util::read_desired(&args.file)?;
    let report = Report {
        file: args.file.display().to_string(),
        valid: desired.is_some(),
        diagnostics: &diagnostics,
    };

    if ctx.global.output == OutputFormat::Text {
        output::print_diagnostics(&diagnostics, ctx.err);
    }
    let rendered = output::render(ctx.global.output, &report, |r| {
        if r.valid {
            ctx.out.success(&format!("{} is valid", r.file))
        } else {
            String::new()
        }
    })?;
    output::print_output(&rendered);

    if report.valid {
        Ok(())
    } else {
        Err(CliError::InvalidConfiguration {
            path: report.file,
            errors: diagnostics.errors().count(),
        })
    }
}
