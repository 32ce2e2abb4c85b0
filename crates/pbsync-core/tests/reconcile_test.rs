#![allow(clippy::unwrap_used)]

// Reconciler scenarios against an in-memory facade that records every
// call it receives.

use std::collections::VecDeque;
use std::sync::Mutex;

use pbsync_core::{
    Applied, AttrValue, CollectionAttributes, CollectionFacade, CollectionType, CoreError,
    DesiredConfig, FieldConfig, PersistedState, Reconciler, RemoteField, RemoteResource,
    Severity, merge,
};
use pretty_assertions::assert_eq;
use serde_json::Map;

// ── Recording facade ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Create(CollectionAttributes),
    Read(String),
    Update(String, CollectionAttributes),
    Delete(String),
}

impl Call {
    fn is_mutation(&self) -> bool {
        !matches!(self, Self::Read(_))
    }
}

/// Replies are queued per test; each call pops the next one.
#[derive(Default)]
struct FakeFacade {
    calls: Mutex<Vec<Call>>,
    replies: Mutex<VecDeque<Result<RemoteResource, CoreError>>>,
}

impl FakeFacade {
    fn replying(replies: Vec<Result<RemoteResource, CoreError>>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            replies: Mutex::new(replies.into()),
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutation).collect()
    }

    fn next(&self, call: Call) -> Result<RemoteResource, CoreError> {
        self.calls.lock().unwrap().push(call);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected remote call")
    }
}

impl CollectionFacade for FakeFacade {
    async fn create(&self, attributes: &CollectionAttributes) -> Result<RemoteResource, CoreError> {
        self.next(Call::Create(attributes.clone()))
    }

    async fn read(&self, id: &str) -> Result<RemoteResource, CoreError> {
        self.next(Call::Read(id.to_owned()))
    }

    async fn update(
        &self,
        id: &str,
        changes: &CollectionAttributes,
    ) -> Result<RemoteResource, CoreError> {
        self.next(Call::Update(id.to_owned(), changes.clone()))
    }

    async fn delete(&self, id: &str) -> Result<(), CoreError> {
        self.next(Call::Delete(id.to_owned())).map(|_| ())
    }
}

// ── Fixtures ────────────────────────────────────────────────────────

fn not_found(id: &str) -> CoreError {
    CoreError::NotFound {
        identifier: id.to_owned(),
    }
}

fn server_error() -> CoreError {
    CoreError::Api {
        message: "Something went wrong while processing your request.".into(),
        status: Some(500),
        details: None,
    }
}

fn posts_desired() -> DesiredConfig {
    let mut desired = DesiredConfig::new("posts", CollectionType::Base);
    desired.schema = AttrValue::Known(vec![FieldConfig {
        required: AttrValue::Known(true),
        unique: AttrValue::Known(false),
        options: AttrValue::Known(Map::new()),
        ..FieldConfig::new("title", "text")
    }]);
    desired.list_rule = AttrValue::Known(String::new());
    desired.view_rule = AttrValue::Known(String::new());
    desired.create_rule = AttrValue::Known(String::new());
    desired.update_rule = AttrValue::Known(String::new());
    desired.delete_rule = AttrValue::Known(String::new());
    desired
}

fn title_field(id: &str) -> RemoteField {
    RemoteField {
        id: Some(id.into()),
        name: Some("title".into()),
        field_type: Some("text".into()),
        system: Some(false),
        required: Some(true),
        unique: Some(false),
        options: Some(Map::new()),
    }
}

fn posts_remote(name: &str, updated: &str) -> RemoteResource {
    RemoteResource {
        id: Some("abc123".into()),
        name: Some(name.into()),
        collection_type: Some(CollectionType::Base),
        system: Some(false),
        schema: Some(vec![title_field("fld1")]),
        list_rule: Some(String::new()),
        view_rule: Some(String::new()),
        create_rule: Some(String::new()),
        update_rule: Some(String::new()),
        delete_rule: Some(String::new()),
        options: Some(Map::new()),
        indexes: Some(vec![]),
        created: Some("2024-06-15 10:30:00.000Z".into()),
        updated: Some(updated.into()),
    }
}

fn posts_state() -> PersistedState {
    merge(None, None, &posts_remote("posts", "2024-06-15 10:30:00.000Z")).unwrap()
}

// ── Create ──────────────────────────────────────────────────────────

#[tokio::test]
async fn create_records_server_assigned_fields() {
    let facade = FakeFacade::replying(vec![Ok(posts_remote(
        "posts",
        "2024-06-15 10:30:00.000Z",
    ))]);
    let reconciler = Reconciler::new(facade);

    let outcome = reconciler.reconcile(None, Some(&posts_desired())).await;

    assert!(!outcome.has_error(), "{:?}", outcome.diagnostics);
    assert_eq!(outcome.action, Applied::Created);
    let state = outcome.state.unwrap();
    assert_eq!(state.id, "abc123");
    assert_eq!(state.name, "posts");
    assert_eq!(state.schema.len(), 1);
    assert_eq!(state.created, "2024-06-15 10:30:00.000Z");

    let calls = reconciler.facade().calls();
    assert_eq!(calls.len(), 1);
    let Call::Create(sent) = &calls[0] else {
        panic!("expected create, got {calls:?}");
    };
    assert_eq!(sent.name.as_deref(), Some("posts"));
    assert_eq!(sent.collection_type, Some(CollectionType::Base));
    assert_eq!(sent.schema.as_ref().unwrap()[0].id, None);
}

#[test]
fn create_round_trip_splits_ownership() {
    let desired = posts_desired();
    let created = posts_remote("posts", "2024-06-15 10:30:00.000Z");

    let state = merge(None, Some(&desired), &created).unwrap();

    // server-owned: exactly what create returned
    assert_eq!(Some(state.id.clone()), created.id);
    assert_eq!(Some(state.created.clone()), created.created);
    assert_eq!(Some(state.updated.clone()), created.updated);
    assert_eq!(state.schema[0].id, "fld1");
    // user-owned: exactly the plan
    assert_eq!(AttrValue::Known(state.name.clone()), desired.name);
    assert_eq!(AttrValue::Known(state.collection_type), desired.collection_type);
    assert!(state.schema[0].required);
}

#[tokio::test]
async fn failed_create_leaves_nothing_recorded() {
    let facade = FakeFacade::replying(vec![Err(server_error())]);
    let reconciler = Reconciler::new(facade);

    let outcome = reconciler.reconcile(None, Some(&posts_desired())).await;

    assert!(outcome.state.is_none());
    let errors: Vec<_> = outcome.diagnostics.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].summary, "Error during create");
    assert!(errors[0].detail.contains("posts"));
}

#[tokio::test]
async fn invalid_desired_makes_no_calls() {
    let mut desired = posts_desired();
    desired.name = AttrValue::Null;
    let reconciler = Reconciler::new(FakeFacade::default());

    let outcome = reconciler.reconcile(None, Some(&desired)).await;

    assert!(outcome.has_error());
    assert!(outcome.state.is_none());
    assert!(reconciler.facade().calls().is_empty());
}

#[tokio::test]
async fn unknown_at_apply_time_makes_no_calls() {
    let mut desired = posts_desired();
    desired.view_rule = AttrValue::Unknown;
    let reconciler = Reconciler::new(FakeFacade::default());

    let outcome = reconciler.reconcile(None, Some(&desired)).await;

    let paths: Vec<_> = outcome
        .diagnostics
        .errors()
        .map(|d| d.path.as_ref().unwrap().to_string())
        .collect();
    assert_eq!(paths, ["view_rule"]);
    assert!(reconciler.facade().calls().is_empty());
}

// ── Update ──────────────────────────────────────────────────────────

#[tokio::test]
async fn in_sync_issues_no_mutation_and_keeps_state() {
    let prior = posts_state();
    let facade =
        FakeFacade::replying(vec![Ok(posts_remote("posts", "2024-06-15 10:30:00.000Z"))]);
    let reconciler = Reconciler::new(facade);

    let outcome = reconciler.reconcile(Some(&prior), Some(&posts_desired())).await;

    assert!(outcome.diagnostics.is_empty());
    assert_eq!(outcome.action, Applied::None);
    assert_eq!(outcome.state, Some(prior));
    assert_eq!(reconciler.facade().calls(), [Call::Read("abc123".into())]);
    assert!(reconciler.facade().mutations().is_empty());
}

#[tokio::test]
async fn in_sync_update_makes_no_calls_at_all() {
    let observed = posts_state();
    let reconciler = Reconciler::new(FakeFacade::default());

    let outcome = reconciler.update(&observed, &posts_desired()).await;

    assert_eq!(outcome.state, Some(observed));
    assert!(reconciler.facade().calls().is_empty());
}

#[tokio::test]
async fn reordered_fields_are_in_sync() {
    let mut remote = posts_remote("posts", "2024-06-15 10:30:00.000Z");
    remote.schema = Some(vec![
        RemoteField {
            id: Some("fld2".into()),
            name: Some("body".into()),
            field_type: Some("editor".into()),
            required: Some(false),
            ..title_field("fld2")
        },
        title_field("fld1"),
    ]);
    let observed = merge(None, None, &remote).unwrap();

    let mut desired = posts_desired();
    desired.schema = AttrValue::Known(vec![
        FieldConfig {
            required: AttrValue::Known(true),
            ..FieldConfig::new("title", "text")
        },
        FieldConfig::new("body", "editor"),
    ]);

    let reconciler = Reconciler::new(FakeFacade::default());
    let outcome = reconciler.update(&observed, &desired).await;

    assert_eq!(outcome.action, Applied::None);
    assert!(reconciler.facade().calls().is_empty());
}

#[tokio::test]
async fn rename_sends_only_the_name() {
    let prior = posts_state();
    let facade = FakeFacade::replying(vec![
        Ok(posts_remote("posts", "2024-06-15 10:30:00.000Z")),
        Ok(posts_remote("articles", "2024-06-16 08:00:00.000Z")),
    ]);
    let reconciler = Reconciler::new(facade);
    let mut desired = posts_desired();
    desired.name = AttrValue::Known("articles".into());

    let outcome = reconciler.reconcile(Some(&prior), Some(&desired)).await;

    assert!(!outcome.has_error(), "{:?}", outcome.diagnostics);
    assert_eq!(outcome.action, Applied::Updated);
    assert_eq!(
        reconciler.facade().mutations(),
        [Call::Update(
            "abc123".into(),
            CollectionAttributes {
                name: Some("articles".into()),
                ..CollectionAttributes::default()
            }
        )]
    );
    let state = outcome.state.unwrap();
    assert_eq!(state.id, "abc123");
    assert_eq!(state.name, "articles");
    assert_eq!(state.updated, "2024-06-16 08:00:00.000Z");
    assert_eq!(state.created, prior.created);
}

#[tokio::test]
async fn type_change_requires_replacement_without_update() {
    let prior = posts_state();
    let facade =
        FakeFacade::replying(vec![Ok(posts_remote("posts", "2024-06-15 10:30:00.000Z"))]);
    let reconciler = Reconciler::new(facade);
    let mut desired = posts_desired();
    desired.collection_type = AttrValue::Known(CollectionType::View);

    let outcome = reconciler.reconcile(Some(&prior), Some(&desired)).await;

    assert!(outcome.requires_replacement);
    assert_eq!(outcome.action, Applied::ReplacementRequired);
    assert!(!outcome.has_error());
    assert_eq!(
        outcome.diagnostics.iter().next().unwrap().severity,
        Severity::Warning
    );
    assert!(reconciler.facade().mutations().is_empty());
    assert_eq!(outcome.state, Some(prior));
}

#[tokio::test]
async fn drift_is_detected_by_fresh_read() {
    let prior = posts_state();
    let mut drifted = posts_remote("posts", "2024-06-17 09:00:00.000Z");
    drifted.list_rule = Some("@request.auth.id != ''".into());
    let facade = FakeFacade::replying(vec![
        Ok(drifted),
        Ok(posts_remote("posts", "2024-06-17 09:01:00.000Z")),
    ]);
    let reconciler = Reconciler::new(facade);

    let outcome = reconciler.reconcile(Some(&prior), Some(&posts_desired())).await;

    assert_eq!(outcome.action, Applied::Updated);
    let mutations = reconciler.facade().mutations();
    let [Call::Update(_, changes)] = mutations.as_slice() else {
        panic!("expected one update, got {mutations:?}");
    };
    assert_eq!(changes.list_rule.as_deref(), Some(""));
    assert_eq!(changes.name, None);
}

#[tokio::test]
async fn failed_update_keeps_prior_state() {
    let prior = posts_state();
    let facade = FakeFacade::replying(vec![
        Ok(posts_remote("posts", "2024-06-16 00:00:00.000Z")),
        Err(server_error()),
    ]);
    let reconciler = Reconciler::new(facade);
    let mut desired = posts_desired();
    desired.name = AttrValue::Known("articles".into());

    let outcome = reconciler.reconcile(Some(&prior), Some(&desired)).await;

    assert_eq!(outcome.state, Some(prior));
    let errors: Vec<_> = outcome.diagnostics.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].summary, "Error during update");
    assert!(errors[0].detail.contains("abc123"));
}

#[tokio::test]
async fn failed_read_stops_before_update() {
    let prior = posts_state();
    let facade = FakeFacade::replying(vec![Err(CoreError::Timeout)]);
    let reconciler = Reconciler::new(facade);
    let mut desired = posts_desired();
    desired.name = AttrValue::Known("articles".into());

    let outcome = reconciler.reconcile(Some(&prior), Some(&desired)).await;

    assert!(outcome.has_error());
    assert_eq!(outcome.state, Some(prior));
    assert!(reconciler.facade().mutations().is_empty());
}

#[tokio::test]
async fn vanished_collection_is_created_again() {
    let prior = posts_state();
    let facade = FakeFacade::replying(vec![
        Err(not_found("abc123")),
        Ok(RemoteResource {
            id: Some("def456".into()),
            ..posts_remote("posts", "2024-06-18 00:00:00.000Z")
        }),
    ]);
    let reconciler = Reconciler::new(facade);

    let outcome = reconciler.reconcile(Some(&prior), Some(&posts_desired())).await;

    assert_eq!(outcome.action, Applied::Created);
    assert_eq!(outcome.state.unwrap().id, "def456");
}

#[tokio::test]
async fn failed_recreate_keeps_prior_state() {
    let prior = posts_state();
    let facade = FakeFacade::replying(vec![Err(not_found("abc123")), Err(server_error())]);
    let reconciler = Reconciler::new(facade);

    let outcome = reconciler.reconcile(Some(&prior), Some(&posts_desired())).await;

    assert!(outcome.has_error());
    assert_eq!(outcome.action, Applied::None);
    assert_eq!(outcome.state, Some(prior));
    let errors: Vec<_> = outcome.diagnostics.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].summary, "Error during create");
}

#[tokio::test]
async fn update_rejects_unknown_values_on_its_own() {
    let observed = posts_state();
    let mut desired = posts_desired();
    desired.name = AttrValue::Known("articles".into());
    desired.view_rule = AttrValue::Unknown;
    let reconciler = Reconciler::new(FakeFacade::default());

    let outcome = reconciler.update(&observed, &desired).await;

    assert_eq!(outcome.diagnostics.errors().count(), 1);
    assert_eq!(outcome.state, Some(observed));
    assert!(reconciler.facade().calls().is_empty());
}

#[tokio::test]
async fn unknown_values_on_tracked_collection_are_reported_once() {
    let prior = posts_state();
    let mut desired = posts_desired();
    desired.view_rule = AttrValue::Unknown;
    let reconciler = Reconciler::new(FakeFacade::default());

    let outcome = reconciler.reconcile(Some(&prior), Some(&desired)).await;

    assert_eq!(outcome.diagnostics.errors().count(), 1);
    assert_eq!(outcome.state, Some(prior));
    assert!(reconciler.facade().calls().is_empty());
}

// ── Refresh / import ────────────────────────────────────────────────

#[tokio::test]
async fn refresh_of_missing_collection_drops_it_silently() {
    let prior = posts_state();
    let reconciler = Reconciler::new(FakeFacade::replying(vec![Err(not_found("abc123"))]));

    let outcome = reconciler.refresh(&prior).await;

    assert_eq!(outcome.action, Applied::Dropped);
    assert!(outcome.state.is_none());
    assert!(outcome.diagnostics.is_empty());
}

#[tokio::test]
async fn refresh_keeps_members_the_server_omitted() {
    let prior = posts_state();
    let partial = RemoteResource {
        id: Some("abc123".into()),
        name: Some("posts".into()),
        updated: Some("2024-06-20 00:00:00.000Z".into()),
        ..RemoteResource::default()
    };
    let reconciler = Reconciler::new(FakeFacade::replying(vec![Ok(partial)]));

    let state = reconciler.refresh(&prior).await.state.unwrap();

    assert_eq!(state.updated, "2024-06-20 00:00:00.000Z");
    assert_eq!(state.schema, prior.schema);
    assert_eq!(state.created, prior.created);
}

#[tokio::test]
async fn import_maps_full_state() {
    let reconciler = Reconciler::new(FakeFacade::replying(vec![Ok(posts_remote(
        "posts",
        "2024-06-15 10:30:00.000Z",
    ))]));

    let outcome = reconciler.import("posts").await;

    assert_eq!(outcome.state, Some(posts_state()));
    assert_eq!(reconciler.facade().calls(), [Call::Read("posts".into())]);
}

#[tokio::test]
async fn import_of_missing_collection_is_an_error() {
    let reconciler = Reconciler::new(FakeFacade::replying(vec![Err(not_found("nope"))]));

    let outcome = reconciler.import("nope").await;

    assert!(outcome.state.is_none());
    let errors: Vec<_> = outcome.diagnostics.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].summary, "Collection not found");
    assert!(errors[0].detail.contains("nope"));
}

// ── Delete ──────────────────────────────────────────────────────────

#[tokio::test]
async fn delete_removes_state() {
    let prior = posts_state();
    let reconciler = Reconciler::new(FakeFacade::replying(vec![Ok(RemoteResource::default())]));

    let outcome = reconciler.reconcile(Some(&prior), None).await;

    assert_eq!(outcome.action, Applied::Deleted);
    assert!(outcome.state.is_none());
    assert_eq!(reconciler.facade().calls(), [Call::Delete("abc123".into())]);
}

#[tokio::test]
async fn delete_of_missing_collection_succeeds() {
    let prior = posts_state();
    let reconciler = Reconciler::new(FakeFacade::replying(vec![Err(not_found("abc123"))]));

    let outcome = reconciler.delete(&prior).await;

    assert!(outcome.diagnostics.is_empty());
    assert!(outcome.state.is_none());
}

#[tokio::test]
async fn failed_delete_keeps_state() {
    let prior = posts_state();
    let reconciler = Reconciler::new(FakeFacade::replying(vec![Err(server_error())]));

    let outcome = reconciler.delete(&prior).await;

    assert!(outcome.has_error());
    assert_eq!(outcome.state, Some(prior));
}

// ── Plan ────────────────────────────────────────────────────────────

#[tokio::test]
async fn plan_makes_no_calls() {
    let reconciler = Reconciler::new(FakeFacade::default());
    let mut desired = posts_desired();
    desired.collection_type = AttrValue::Known(CollectionType::Auth);

    let plan = reconciler.plan(Some(&posts_state()), Some(&desired));

    assert!(plan.requires_replacement);
    assert!(reconciler.facade().calls().is_empty());
}
