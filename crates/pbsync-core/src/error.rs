// ── Core error types ──
//
// Errors raised by the reconciliation layer. Transport failures from
// `pbsync-api` are translated here; consumers never match on HTTP
// details directly. Each error can be turned into a `Diagnostic`.

use thiserror::Error;

use crate::diagnostics::Diagnostic;

/// Remote operation names used in error context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Reconciliation ───────────────────────────────────────────────
    #[error("Invalid configuration: {message}")]
    Validation { message: String },

    #[error("Collection not found: {identifier}")]
    NotFound { identifier: String },

    #[error("Failed to {operation} collection {identifier}: {source}")]
    RemoteOperation {
        operation: Operation,
        identifier: String,
        #[source]
        source: Box<CoreError>,
    },

    #[error("Replacement required: {} cannot be changed in place", attributes.join(", "))]
    ReplacementRequired { attributes: Vec<String> },

    #[error("Invalid remote response: {message}")]
    InvalidResponse { message: String },

    // ── Connection ───────────────────────────────────────────────────
    #[error("Cannot connect to {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Request timed out")]
    Timeout,

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
        /// Per-attribute details from the server, rendered as JSON.
        details: Option<String>,
    },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::RemoteOperation { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    /// Attach remote-operation context to a facade error.
    pub fn during(self, operation: Operation, identifier: impl Into<String>) -> Self {
        Self::RemoteOperation {
            operation,
            identifier: identifier.into(),
            source: Box::new(self),
        }
    }

    /// Render as a user-visible diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Self::Validation { message } => Diagnostic::error("Invalid configuration", message),
            Self::NotFound { identifier } => Diagnostic::error(
                "Collection not found",
                format!("No collection with id or name \"{identifier}\" exists on the server."),
            ),
            Self::RemoteOperation {
                operation,
                identifier,
                source,
            } => {
                let mut detail = format!("Could not {operation} collection {identifier}: {source}");
                if let Self::Api {
                    details: Some(details),
                    ..
                } = source.as_ref()
                {
                    detail.push_str(&format!("\n{details}"));
                }
                Diagnostic::error(format!("Error during {operation}"), detail)
            }
            Self::ReplacementRequired { .. } => {
                Diagnostic::warning("Resource replacement required", self.to_string())
            }
            Self::InvalidResponse { message } => {
                Diagnostic::error("Unexpected response from server", message)
            }
            _ => Diagnostic::error("Provider error", self.to_string()),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<pbsync_api::Error> for CoreError {
    fn from(err: pbsync_api::Error) -> Self {
        match err {
            pbsync_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            pbsync_api::Error::NoSession => CoreError::AuthenticationFailed {
                message: "no session -- authenticate first".into(),
            },
            pbsync_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else if err.is_not_found() {
                    CoreError::NotFound {
                        identifier: e.url().map(|u| u.path().to_owned()).unwrap_or_default(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                        details: None,
                    }
                }
            }
            pbsync_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            pbsync_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            pbsync_api::Error::Api {
                status: 404,
                message,
                ..
            } => CoreError::NotFound {
                identifier: message,
            },
            pbsync_api::Error::Api {
                status: 401 | 403,
                message,
                ..
            } => CoreError::AuthenticationFailed { message },
            pbsync_api::Error::Api {
                status,
                message,
                data,
            } => CoreError::Api {
                message,
                status: Some(status),
                details: data.map(|d| d.to_string()),
            },
            pbsync_api::Error::Deserialization { message, body: _ } => {
                CoreError::InvalidResponse { message }
            }
        }
    }
}
