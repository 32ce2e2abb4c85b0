//! Clap derive structures for the `pbsync` CLI.
//!
//! Defines the command tree, global flags, and shared argument groups.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// State file used when `--state` is not given.
pub const DEFAULT_STATE_FILE: &str = "pbsync.state.json";

// ── Top-Level CLI ────────────────────────────────────────────────────

/// pbsync -- declarative PocketBase collections
#[derive(Debug, Parser)]
#[command(
    name = "pbsync",
    version,
    about = "Declaratively manage PocketBase collections",
    long_about = "Reconcile PocketBase collections against configuration files.\n\n\
        Describe a collection (schema, access rules, indexes) in JSON, YAML or\n\
        TOML; pbsync plans and applies the smallest set of admin API calls\n\
        that makes the server match, and records the result in a state file.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Server profile to use
    #[arg(long, short = 'p', env = "PBSYNC_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Server URL (overrides profile)
    #[arg(long, short = 'e', env = "PBSYNC_ENDPOINT", global = true)]
    pub endpoint: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "PBSYNC_OUTPUT",
        default_value = "text",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "PBSYNC_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "PBSYNC_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable (default)
    Text,
    /// Pretty-printed JSON
    Json,
    /// YAML
    Yaml,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Command Enum ─────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check a collection configuration file without contacting the server
    Validate(ValidateArgs),

    /// Show what apply would change
    Plan(PlanArgs),

    /// Create, update or delete the collection so it matches the file
    Apply(ApplyArgs),

    /// Read the tracked collection back from the server into state
    Refresh(StateArgs),

    /// Start tracking an existing collection by id or name
    Import(ImportArgs),

    /// Delete the tracked collection from the server
    Destroy(DestroyArgs),

    /// Inspect CLI configuration
    Config(ConfigArgs),
}

// ── Shared argument groups ───────────────────────────────────────────

#[derive(Debug, Args)]
pub struct StateArgs {
    /// State file tracking the collection
    #[arg(long, short = 's', default_value = DEFAULT_STATE_FILE)]
    pub state: PathBuf,
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Collection configuration (.json, .yaml, .yml or .toml)
    pub file: PathBuf,
}

#[derive(Debug, Args)]
pub struct PlanArgs {
    /// Collection configuration (.json, .yaml, .yml or .toml)
    pub file: PathBuf,

    #[command(flatten)]
    pub state: StateArgs,

    /// Read the tracked collection from the server before planning
    #[arg(long)]
    pub refresh: bool,
}

#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Collection configuration (.json, .yaml, .yml or .toml)
    pub file: PathBuf,

    #[command(flatten)]
    pub state: StateArgs,
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Collection id or name on the server
    pub id: String,

    #[command(flatten)]
    pub state: StateArgs,

    /// Also write a configuration file matching the imported collection
    #[arg(long, value_name = "FILE")]
    pub write_config: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct DestroyArgs {
    #[command(flatten)]
    pub state: StateArgs,

    /// Confirm deletion of the collection and all its records
    #[arg(long, short = 'y')]
    pub yes: bool,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the configuration file location
    Path,

    /// Show the effective configuration (secrets masked)
    Show,
}
