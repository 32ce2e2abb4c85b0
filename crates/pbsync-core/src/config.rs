// ── Runtime connection configuration ──
//
// These types describe *how* to reach a PocketBase server. They carry
// credential data and connection tuning, but never touch disk. The CLI
// constructs a `ProviderConfig` and hands it in.

use std::time::Duration;

use pbsync_api::{Credentials, TlsMode, TransportConfig};
use secrecy::SecretString;
use url::Url;

/// How to open a session with the server.
#[derive(Debug, Clone)]
pub enum AuthCredentials {
    /// Superuser email and password, exchanged for a bearer token.
    Password {
        identity: String,
        password: SecretString,
    },
    /// Pre-issued admin token, used as-is.
    Token(SecretString),
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed certs on a dev server).
    DangerAcceptInvalid,
}

/// Everything needed to connect to one PocketBase server.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Server URL (e.g., `http://127.0.0.1:8090`).
    pub url: Url,
    pub auth: AuthCredentials,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl ProviderConfig {
    pub(crate) fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: match &self.tls {
                TlsVerification::SystemDefaults => TlsMode::System,
                TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
                TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
            },
            timeout: self.timeout,
        }
    }

    pub(crate) fn credentials(&self) -> Credentials {
        match &self.auth {
            AuthCredentials::Password { identity, password } => Credentials::Password {
                identity: identity.clone(),
                password: password.clone(),
            },
            AuthCredentials::Token(token) => Credentials::Token(token.clone()),
        }
    }
}
