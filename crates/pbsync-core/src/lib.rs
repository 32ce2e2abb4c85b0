//! Declarative reconciliation of PocketBase collections.
//!
//! Given what the user wants a collection to look like and what was last
//! recorded, this crate works out the smallest set of remote calls that
//! makes the server match, performs them through a narrow facade, and
//! returns the new state together with every diagnostic gathered:
//!
//! - **[`schema`]**: The attribute schema of a collection: kinds,
//!   ownership ([`Mutability`]), and which attributes force replacement.
//!   [`ResourceSchema::validate`] reports every violation in one pass.
//!
//! - **Model** ([`model`]): Three independent shapes:
//!   [`DesiredConfig`] (tri-state [`AttrValue`]s), [`PersistedState`]
//!   (concrete), and [`RemoteResource`] (one server response). Pure
//!   functions in [`state`] move values between them.
//!
//! - **[`Diagnostics`]**: Append-only list of errors and warnings with
//!   attribute paths, returned alongside results.
//!
//! - **[`Reconciler`]**: create / refresh / update / delete / import,
//!   plus a pure [`plan`](Reconciler::plan) preview.
//!
//! - **[`CollectionFacade`]**: The single seam to the server,
//!   implemented for [`pbsync_api::PocketBaseClient`].

pub mod config;
pub mod convert;
pub mod diagnostics;
pub mod diff;
pub mod error;
pub mod facade;
pub mod model;
pub mod plan;
pub mod reconciler;
pub mod schema;
pub mod state;
pub mod value;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{AuthCredentials, ProviderConfig, TlsVerification};
pub use diagnostics::{AttrPath, Diagnostic, Diagnostics, Severity};
pub use diff::{CollectionDiff, diff};
pub use error::{CoreError, Operation};
pub use facade::{CollectionFacade, connect};
pub use model::{
    CollectionAttributes, CollectionType, DesiredConfig, FieldAttributes, FieldConfig, FieldState,
    PersistedState, RemoteField, RemoteResource, RuleKind,
};
pub use plan::{AttributeChange, Plan, PlanAction};
pub use reconciler::{Applied, ReconcileOutcome, Reconciler};
pub use schema::{COLLECTION_SCHEMA, Mutability, ResourceSchema};
pub use state::{desired_from_state, merge};
pub use value::AttrValue;

// ── Transport re-export ─────────────────────────────────────────────
pub use pbsync_api::PocketBaseClient;
