// ── Domain model ──
//
// Three independent shapes for one collection: what the user wants
// (`DesiredConfig`), what we last recorded (`PersistedState`), and what
// one remote call returned (`RemoteResource`). `crate::state` holds the
// pure functions that move values between them.

pub mod attributes;
pub mod collection;
pub mod desired;
pub mod remote;

pub use attributes::{CollectionAttributes, FieldAttributes};
pub use collection::{CollectionType, FieldState, PersistedState, RuleKind};
pub use desired::{DesiredConfig, FieldConfig};
pub use remote::{RemoteField, RemoteResource};
