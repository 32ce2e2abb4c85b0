//! Shared helpers for command handlers.

use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use pbsync_core::{DesiredConfig, Diagnostics, PocketBaseClient, ReconcileOutcome, Reconciler};

use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;
use crate::output::{self, Palette};

/// Parse a configuration document by file extension. Unknown extensions
/// are read as JSON.
pub fn read_document(path: &Path) -> Result<Value, CliError> {
    let text = std::fs::read_to_string(path)?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let parsed = match ext.as_deref() {
        Some("yaml" | "yml") => serde_yaml::from_str(&text).map_err(|e| ("YAML", e.to_string())),
        Some("toml") => toml::from_str(&text).map_err(|e| ("TOML", e.to_string())),
        _ => serde_json::from_str(&text).map_err(|e| ("JSON", e.to_string())),
    };
    parsed.map_err(|(format, reason)| CliError::Parse {
        path: path.display().to_string(),
        format,
        reason,
    })
}

/// Write a configuration document, choosing the format by extension the
/// same way [`read_document`] does.
pub fn write_document(path: &Path, document: &impl Serialize) -> Result<(), CliError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let text = match ext.as_deref() {
        Some("yaml" | "yml") => serde_yaml::to_string(document)?,
        Some("toml") => {
            // TOML has no null; an absent key means the same here
            let mut value = serde_json::to_value(document)?;
            drop_nulls(&mut value);
            toml::to_string_pretty(&value)?
        }
        _ => {
            let mut text = serde_json::to_string_pretty(document)?;
            text.push('\n');
            text
        }
    };
    std::fs::write(path, text)?;
    Ok(())
}

fn drop_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(drop_nulls);
        }
        Value::Array(items) => items.iter_mut().for_each(drop_nulls),
        _ => {}
    }
}

/// Read and validate a collection configuration file.
pub fn read_desired(path: &Path) -> Result<(Option<DesiredConfig>, Diagnostics), CliError> {
    let raw = read_document(path)?;
    Ok(DesiredConfig::from_raw(&raw))
}

/// Like [`read_desired`], but any error diagnostic aborts the command
/// after being printed.
pub fn require_desired(path: &Path, palette: Palette) -> Result<DesiredConfig, CliError> {
    let (desired, diagnostics) = read_desired(path)?;
    output::print_diagnostics(&diagnostics, palette);
    desired.ok_or_else(|| CliError::InvalidConfiguration {
        path: path.display().to_string(),
        errors: diagnostics.errors().count(),
    })
}

/// Connect to the configured server and wrap the session in a reconciler.
pub async fn connect(global: &GlobalOpts) -> Result<Reconciler<PocketBaseClient>, CliError> {
    let provider = config::resolve_provider(global)?;
    let client = pbsync_core::connect(&provider).await?;
    Ok(Reconciler::new(client))
}

/// Print an outcome's diagnostics and fail if any of them is an error.
pub fn check_outcome(
    outcome: &ReconcileOutcome,
    operation: &str,
    palette: Palette,
) -> Result<(), CliError> {
    output::print_diagnostics(&outcome.diagnostics, palette);
    if outcome.has_error() {
        return Err(CliError::Reconcile {
            operation: operation.to_owned(),
            errors: outcome.diagnostics.errors().count(),
        });
    }
    Ok(())
}
