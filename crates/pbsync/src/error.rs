//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a process exit code.

use miette::Diagnostic;
use thiserror::Error;

use pbsync_config::ConfigError;
use pbsync_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not connect to PocketBase at {url}")]
    #[diagnostic(
        code(pbsync::connection_failed),
        help(
            "Check that the server is running and reachable: {reason}\n\
             Self-signed certificate? Try --insecure (-k) or set ca_cert in your profile."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(pbsync::timeout),
        help("Increase the timeout with --timeout or check server responsiveness.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(pbsync::auth_failed),
        help(
            "Verify the superuser identity and password, or the admin token.\n\
             Credentials come from the profile, PBSYNC_TOKEN, PBSYNC_IDENTITY or PBSYNC_PASSWORD."
        )
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(pbsync::no_credentials),
        help(
            "Set identity and password_env (or token_env) in the profile,\n\
             or export PBSYNC_TOKEN, or PBSYNC_IDENTITY with PBSYNC_PASSWORD."
        )
    )]
    NoCredentials { profile: String },

    // ── Collections ──────────────────────────────────────────────────

    #[error("Collection '{identifier}' not found")]
    #[diagnostic(
        code(pbsync::not_found),
        help("Check the collection id or name in the PocketBase admin UI.")
    )]
    NotFound { identifier: String },

    #[error("Changing {attributes} requires replacing the collection")]
    #[diagnostic(
        code(pbsync::replacement_required),
        help(
            "These attributes cannot be changed in place. Replacing deletes all records.\n\
             Run: pbsync destroy --yes, then pbsync apply"
        )
    )]
    ReplacementRequired { attributes: String },

    #[error("State file {path} already tracks collection '{name}' ({id})")]
    #[diagnostic(
        code(pbsync::already_tracked),
        help("Use a different --state file, or destroy the tracked collection first.")
    )]
    AlreadyTracked {
        path: String,
        name: String,
        id: String,
    },

    #[error("{operation} failed with {errors} error(s)")]
    #[diagnostic(code(pbsync::reconcile_failed), help("See the diagnostics above."))]
    Reconcile { operation: String, errors: usize },

    // ── API ──────────────────────────────────────────────────────────

    #[error("{message}")]
    #[diagnostic(code(pbsync::api_error))]
    Api { message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(pbsync::validation))]
    Validation { field: String, reason: String },

    #[error("{path} is not a valid collection configuration ({errors} error(s))")]
    #[diagnostic(
        code(pbsync::invalid_configuration),
        help("Fix the problems listed above, then run: pbsync validate {path}")
    )]
    InvalidConfiguration { path: String, errors: usize },

    #[error("Could not parse {path} as {format}: {reason}")]
    #[diagnostic(
        code(pbsync::parse),
        help("Configuration files are read as JSON, YAML (.yaml, .yml) or TOML by extension.")
    )]
    Parse {
        path: String,
        format: &'static str,
        reason: String,
    },

    #[error("Refusing to overwrite {path}")]
    #[diagnostic(
        code(pbsync::file_exists),
        help("Choose another path for --write-config, or remove the existing file.")
    )]
    FileExists { path: String },

    #[error("Destroying '{name}' requires confirmation")]
    #[diagnostic(
        code(pbsync::confirmation_required),
        help("This deletes the collection and all its records. Pass --yes (-y) to proceed.")
    )]
    ConfirmationRequired { name: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(pbsync::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Add [profiles.{name}] to {path}"
        )
    )]
    ProfileNotFound {
        name: String,
        available: String,
        path: String,
    },

    #[error("No server configured")]
    #[diagnostic(
        code(pbsync::no_config),
        help(
            "Pass --endpoint with PBSYNC_TOKEN set, or add a profile to:\n\
             {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(pbsync::config))]
    Config(ConfigError),

    // ── State / IO / Serialization ───────────────────────────────────

    #[error("State file {path} is unreadable: {reason}")]
    #[diagnostic(
        code(pbsync::state),
        help("The state file is written by pbsync; restore it from backup or import again.")
    )]
    State { path: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not render JSON: {0}")]
    #[diagnostic(code(pbsync::json))]
    Json(#[from] serde_json::Error),

    #[error("Could not render YAML: {0}")]
    #[diagnostic(code(pbsync::yaml))]
    Yaml(#[from] serde_yaml::Error),

    #[error("Could not render TOML: {0}")]
    #[diagnostic(code(pbsync::toml))]
    Toml(#[from] toml::ser::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::ReplacementRequired { .. } | Self::AlreadyTracked { .. } => exit_code::CONFLICT,
            Self::Validation { .. }
            | Self::InvalidConfiguration { .. }
            | Self::Parse { .. }
            | Self::FileExists { .. }
            | Self::ConfirmationRequired { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },
            CoreError::Timeout => CliError::Timeout,
            CoreError::NotFound { identifier } => CliError::NotFound { identifier },
            CoreError::ReplacementRequired { attributes } => CliError::ReplacementRequired {
                attributes: attributes.join(", "),
            },
            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
            other => CliError::Api {
                message: other.to_string(),
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_keep_their_exit_class() {
        let not_found: CliError = CoreError::NotFound {
            identifier: "posts".into(),
        }
        .into();
        assert_eq!(not_found.exit_code(), exit_code::NOT_FOUND);

        let auth: CliError = CoreError::AuthenticationFailed {
            message: "bad password".into(),
        }
        .into();
        assert_eq!(auth.exit_code(), exit_code::AUTH);

        let replace: CliError = CoreError::ReplacementRequired {
            attributes: vec!["type".into()],
        }
        .into();
        assert_eq!(replace.exit_code(), exit_code::CONFLICT);
        assert_eq!(
            replace.to_string(),
            "Changing type requires replacing the collection"
        );
    }

    #[test]
    fn config_validation_is_a_usage_error() {
        let err: CliError = ConfigError::Validation {
            field: "endpoint".into(),
            reason: "invalid URL: nope".into(),
        }
        .into();
        assert_eq!(err.exit_code(), exit_code::USAGE);
    }
}
