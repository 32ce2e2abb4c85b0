// ── Reconciler ──
//
// Drives one collection towards its desired configuration through the
// facade. Every entry point returns a `ReconcileOutcome`: the new state
// (or none), everything diagnosed along the way, and whether the caller
// must destroy and recreate. At most one mutating call is made per
// operation, and on failure the prior state is returned untouched.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::diagnostics::Diagnostics;
use crate::diff::diff;
use crate::error::{CoreError, Operation};
use crate::facade::CollectionFacade;
use crate::model::{CollectionAttributes, DesiredConfig, PersistedState, RemoteResource};
use crate::plan::{Plan, plan};
use crate::state::merge;

/// What a reconcile actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Applied {
    /// Nothing to do, or nothing done because of an error.
    None,
    Created,
    /// Read back without changes.
    Refreshed,
    Updated,
    Deleted,
    /// The collection vanished out of band and was dropped from state.
    Dropped,
    /// A change touches an immutable attribute; nothing was sent.
    ReplacementRequired,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconcileOutcome {
    pub state: Option<PersistedState>,
    pub diagnostics: Diagnostics,
    pub requires_replacement: bool,
    pub action: Applied,
}

impl ReconcileOutcome {
    fn new(state: Option<PersistedState>, action: Applied) -> Self {
        Self {
            state,
            diagnostics: Diagnostics::new(),
            requires_replacement: false,
            action,
        }
    }

    /// Abort with `state` unchanged, keeping what was diagnosed so far.
    fn failed(state: Option<PersistedState>, diagnostics: Diagnostics) -> Self {
        Self {
            state,
            diagnostics,
            requires_replacement: false,
            action: Applied::None,
        }
    }

    pub fn has_error(&self) -> bool {
        self.diagnostics.has_error()
    }

    fn with_leading(mut self, mut earlier: Diagnostics) -> Self {
        earlier.append(self.diagnostics);
        self.diagnostics = earlier;
        self
    }
}

/// Reconciles collections through a [`CollectionFacade`].
///
/// Holds no mutable state; one instance may serve many collections
/// concurrently, but calls for the same identifier must be serialized by
/// the caller.
pub struct Reconciler<F> {
    facade: F,
}

impl<F: CollectionFacade> Reconciler<F> {
    pub fn new(facade: F) -> Self {
        Self { facade }
    }

    pub fn facade(&self) -> &F {
        &self.facade
    }

    /// Preview without touching the server.
    pub fn plan(&self, prior: Option<&PersistedState>, desired: Option<&DesiredConfig>) -> Plan {
        plan(prior, desired)
    }

    /// Converge the collection tracked by `prior` onto `desired`.
    ///
    /// A tracked collection is always read fresh before diffing. If it has
    /// disappeared it is created again.
    pub async fn reconcile(
        &self,
        prior: Option<&PersistedState>,
        desired: Option<&DesiredConfig>,
    ) -> ReconcileOutcome {
        match (prior, desired) {
            (None, None) => ReconcileOutcome::new(None, Applied::None),
            (None, Some(desired)) => self.create(desired).await,
            (Some(prior), None) => self.delete(prior).await,
            (Some(prior), Some(desired)) => {
                let checks = desired.check_applicable();
                if checks.has_error() {
                    return ReconcileOutcome::failed(Some(prior.clone()), checks);
                }

                let refreshed = self.refresh(prior).await;
                if refreshed.has_error() {
                    return ReconcileOutcome::failed(
                        Some(prior.clone()),
                        checks_then(checks, refreshed.diagnostics),
                    );
                }

                let leading = checks_then(checks, refreshed.diagnostics);
                let mut outcome = match refreshed.state {
                    Some(observed) => self.apply_diff(&observed, desired, leading).await,
                    None => {
                        info!(
                            collection = %prior.name,
                            id = %prior.id,
                            "collection disappeared, creating it again"
                        );
                        self.create(desired).await.with_leading(leading)
                    }
                };
                if outcome.has_error() {
                    // all or nothing: neither the refresh nor a drop is kept
                    outcome.state = Some(prior.clone());
                }
                outcome
            }
        }
    }

    /// absent → desired.
    pub async fn create(&self, desired: &DesiredConfig) -> ReconcileOutcome {
        let attributes = match CollectionAttributes::for_create(desired) {
            Ok(attributes) => attributes,
            Err(diagnostics) => return ReconcileOutcome::failed(None, diagnostics),
        };
        let name = attributes.name.clone().unwrap_or_default();

        debug!(collection = %name, action = "create", "sending create");
        let remote = match self.facade.create(&attributes).await {
            Ok(remote) => remote,
            Err(e) => return remote_failure(None, e.during(Operation::Create, &name)),
        };

        settle(None, Some(desired), &remote, Applied::Created)
    }

    /// present → unspecified: read back what the server holds.
    ///
    /// A collection that no longer exists is dropped from state without
    /// any diagnostic.
    pub async fn refresh(&self, prior: &PersistedState) -> ReconcileOutcome {
        match self.facade.read(&prior.id).await {
            Ok(remote) => settle(Some(prior), None, &remote, Applied::Refreshed),
            Err(e) if e.is_not_found() => {
                info!(
                    collection = %prior.name,
                    id = %prior.id,
                    action = "drop",
                    "collection removed out of band"
                );
                ReconcileOutcome::new(None, Applied::Dropped)
            }
            Err(e) => remote_failure(Some(prior), e.during(Operation::Read, &prior.id)),
        }
    }

    /// present, desired differs: diff `observed` against `desired` and
    /// apply the difference in place.
    ///
    /// `observed` is trusted as current; [`reconcile`](Self::reconcile)
    /// refreshes it first. No call is made when nothing differs.
    pub async fn update(
        &self,
        observed: &PersistedState,
        desired: &DesiredConfig,
    ) -> ReconcileOutcome {
        let checks = desired.check_applicable();
        if checks.has_error() {
            return ReconcileOutcome::failed(Some(observed.clone()), checks);
        }
        self.apply_diff(observed, desired, checks).await
    }

    /// Body of [`update`](Self::update) once `desired` has passed its
    /// apply-time checks; `leading` is prepended to the outcome.
    async fn apply_diff(
        &self,
        observed: &PersistedState,
        desired: &DesiredConfig,
        leading: Diagnostics,
    ) -> ReconcileOutcome {
        let diff = diff(observed, desired);
        if diff.is_empty() {
            debug!(collection = %observed.name, id = %observed.id, "in sync");
            return ReconcileOutcome::new(Some(observed.clone()), Applied::None)
                .with_leading(leading);
        }

        if diff.requires_replacement() {
            warn!(
                collection = %observed.name,
                id = %observed.id,
                attributes = ?diff.replace,
                "change requires replacement"
            );
            let mut outcome =
                ReconcileOutcome::new(Some(observed.clone()), Applied::ReplacementRequired)
                    .with_leading(leading);
            outcome.requires_replacement = true;
            outcome.diagnostics.push(
                CoreError::ReplacementRequired {
                    attributes: diff.replace.iter().map(|s| (*s).to_owned()).collect(),
                }
                .to_diagnostic(),
            );
            return outcome;
        }

        debug!(
            collection = %observed.name,
            id = %observed.id,
            action = "update",
            changed = ?diff.changed,
            "sending update"
        );
        let remote = match self.facade.update(&observed.id, &diff.changes).await {
            Ok(remote) => remote,
            Err(e) => {
                return remote_failure(Some(observed), e.during(Operation::Update, &observed.id))
                    .with_leading(leading);
            }
        };

        settle(Some(observed), Some(desired), &remote, Applied::Updated).with_leading(leading)
    }

    /// present → removed from configuration.
    pub async fn delete(&self, prior: &PersistedState) -> ReconcileOutcome {
        debug!(collection = %prior.name, id = %prior.id, action = "delete", "sending delete");
        match self.facade.delete(&prior.id).await {
            Ok(()) => {
                info!(collection = %prior.name, id = %prior.id, action = "delete", "deleted");
                ReconcileOutcome::new(None, Applied::Deleted)
            }
            Err(e) if e.is_not_found() => ReconcileOutcome::new(None, Applied::Deleted),
            Err(e) => remote_failure(Some(prior), e.during(Operation::Delete, &prior.id)),
        }
    }

    /// Start tracking an existing collection by id or name.
    pub async fn import(&self, id: &str) -> ReconcileOutcome {
        match self.facade.read(id).await {
            Ok(remote) => settle(None, None, &remote, Applied::Refreshed),
            Err(e) if e.is_not_found() => {
                let err = CoreError::NotFound {
                    identifier: id.to_owned(),
                };
                ReconcileOutcome::failed(None, err.to_diagnostic().into())
            }
            Err(e) => remote_failure(None, e.during(Operation::Read, id)),
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

fn settle(
    prior: Option<&PersistedState>,
    desired: Option<&DesiredConfig>,
    remote: &RemoteResource,
    action: Applied,
) -> ReconcileOutcome {
    match merge(prior, desired, remote) {
        Ok(state) => {
            info!(collection = %state.name, id = %state.id, %action, "reconciled");
            ReconcileOutcome::new(Some(state), action)
        }
        // the remote write may have happened; keep what we knew
        Err(e) => ReconcileOutcome::failed(prior.cloned(), e.to_diagnostic().into()),
    }
}

fn remote_failure(prior: Option<&PersistedState>, err: CoreError) -> ReconcileOutcome {
    warn!(error = %err, "remote call failed");
    ReconcileOutcome::failed(prior.cloned(), err.to_diagnostic().into())
}

fn checks_then(mut checks: Diagnostics, more: Diagnostics) -> Diagnostics {
    checks.append(more);
    checks
}
