// pbsync-api: Async Rust client for the PocketBase collections admin API

pub mod auth;
pub mod client;
pub mod error;
pub mod transport;
pub mod types;

pub use auth::Credentials;
pub use client::PocketBaseClient;
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
