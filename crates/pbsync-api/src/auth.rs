use secrecy::SecretString;

/// Credentials for opening a bearer session against a PocketBase server.
///
/// Each variant carries the secret material needed for its auth flow.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Superuser identity (email) and password, exchanged for a token
    /// via the admin password auth endpoint.
    Password {
        identity: String,
        password: SecretString,
    },

    /// A pre-issued admin token, used as-is.
    Token(SecretString),
}

impl Credentials {
    /// Short label for logs (never includes secret material).
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Password { .. } => "password",
            Self::Token(_) => "token",
        }
    }
}
