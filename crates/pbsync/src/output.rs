//! Output formatting: human-readable text, JSON, YAML.
//!
//! Plans and diagnostics render as colored text by default; structured
//! formats serialize the underlying values via serde.

use std::fmt::Write as _;
use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde::Serialize;

use pbsync_core::{
    AttrValue, AttributeChange, Diagnostic, Diagnostics, PersistedState, Plan, PlanAction,
    Severity,
};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

const KNOWN_AFTER_APPLY: &str = "(known after apply)";

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled for `stream`.
pub fn should_color(mode: ColorMode, stream: &impl IsTerminal) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => stream.is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    }
}

/// Applies styles only when color is enabled.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    color: bool,
}

impl Palette {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    /// A check-marked confirmation line.
    pub fn success(self, message: &str) -> String {
        format!("{} {message}", self.added("✓"))
    }

    fn added(self, s: &str) -> String {
        if self.color { s.green().to_string() } else { s.to_owned() }
    }

    fn removed(self, s: &str) -> String {
        if self.color { s.red().to_string() } else { s.to_owned() }
    }

    fn changed(self, s: &str) -> String {
        if self.color { s.yellow().to_string() } else { s.to_owned() }
    }

    fn strong(self, s: &str) -> String {
        if self.color { s.bold().to_string() } else { s.to_owned() }
    }

    fn faint(self, s: &str) -> String {
        if self.color { s.dimmed().to_string() } else { s.to_owned() }
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render `data` in a structured format, or with `text_fn` for text.
pub fn render<T: Serialize + ?Sized>(
    format: OutputFormat,
    data: &T,
    text_fn: impl FnOnce(&T) -> String,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Text => Ok(text_fn(data)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(data)?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(data)?),
    }
}

/// Print rendered output to stdout.
pub fn print_output(output: &str) {
    if output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{}", output.trim_end());
}

/// Print diagnostics to stderr, errors and warnings alike.
pub fn print_diagnostics(diagnostics: &Diagnostics, palette: Palette) {
    if diagnostics.is_empty() {
        return;
    }
    let mut stderr = io::stderr().lock();
    let _ = writeln!(stderr, "{}", render_diagnostics(diagnostics, palette).trim_end());
}

// ── Diagnostics ──────────────────────────────────────────────────────

pub fn render_diagnostics(diagnostics: &Diagnostics, palette: Palette) -> String {
    let mut out = String::new();
    for diagnostic in diagnostics.iter() {
        render_diagnostic(&mut out, diagnostic, palette);
    }
    out
}

fn render_diagnostic(out: &mut String, diagnostic: &Diagnostic, palette: Palette) {
    let label = match diagnostic.severity {
        Severity::Error => palette.removed("Error:"),
        Severity::Warning => palette.changed("Warning:"),
    };
    let _ = write!(out, "{label} {}", palette.strong(&diagnostic.summary));
    if let Some(path) = diagnostic.path.as_ref().filter(|p| !p.is_empty()) {
        let _ = write!(out, " {}", palette.faint(&format!("(at {path})")));
    }
    let _ = writeln!(out);
    for line in diagnostic.detail.lines() {
        let _ = writeln!(out, "  {line}");
    }
}

// ── Plan ─────────────────────────────────────────────────────────────

pub fn render_plan(plan: &Plan, name: &str, palette: Palette) -> String {
    let mut out = String::new();

    let (symbol, verb) = match plan.action {
        PlanAction::NoOp => {
            let _ = writeln!(
                out,
                "{}",
                palette.success(&format!(
                    "No changes. Collection {} matches the configuration.",
                    palette.strong(name)
                ))
            );
            return out;
        }
        PlanAction::Create => (palette.added("+"), "will be created"),
        PlanAction::Update => (palette.changed("~"), "will be updated in place"),
        PlanAction::Replace => (palette.removed("-/+"), "must be replaced"),
        PlanAction::Delete => (palette.removed("-"), "will be destroyed"),
    };

    let _ = writeln!(out, "{symbol} collection {} {verb}", palette.strong(name));
    for change in &plan.changes {
        render_change(&mut out, change, plan.action, palette);
    }
    if plan.requires_replacement {
        let _ = writeln!(
            out,
            "\n{}",
            palette.removed("Replacing a collection deletes all of its records.")
        );
    }
    out
}

fn render_change(out: &mut String, change: &AttributeChange, action: PlanAction, palette: Palette) {
    let after = match &change.after {
        AttrValue::Known(value) => value.to_string(),
        AttrValue::Null => "null".to_owned(),
        AttrValue::Unknown => palette.faint(KNOWN_AFTER_APPLY),
    };

    match (action, &change.before) {
        (PlanAction::Create, _) | (_, None) => {
            let _ = writeln!(out, "    {} {} = {after}", palette.added("+"), change.path);
        }
        (PlanAction::Delete, Some(before)) => {
            let _ = writeln!(
                out,
                "    {} {} = {}",
                palette.removed("-"),
                change.path,
                before
            );
        }
        (_, Some(before)) => {
            let _ = writeln!(
                out,
                "    {} {}: {} -> {after}",
                palette.changed("~"),
                change.path,
                before
            );
        }
    }
}

// ── State ────────────────────────────────────────────────────────────

pub fn render_state(state: Option<&PersistedState>, palette: Palette) -> String {
    let Some(state) = state else {
        return "No collection tracked.".to_owned();
    };

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {} ({}, {})",
        palette.strong("collection"),
        state.name,
        state.collection_type,
        palette.faint(&state.id)
    );
    for field in &state.schema {
        let mut flags = Vec::new();
        if field.required {
            flags.push("required");
        }
        if field.unique {
            flags.push("unique");
        }
        if field.system {
            flags.push("system");
        }
        let _ = write!(out, "  {:<20} {}", field.name, field.field_type);
        if !flags.is_empty() {
            let _ = write!(out, " [{}]", flags.join(", "));
        }
        let _ = writeln!(out);
    }
    if !state.indexes.is_empty() {
        let _ = writeln!(out, "  indexes: {}", state.indexes.len());
    }
    let _ = writeln!(out, "  updated: {}", state.updated);
    out
}
