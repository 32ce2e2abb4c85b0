// ── State merging ──
//
// Pure functions that build the next persisted state from the prior
// state, the plan, and one remote response. Ownership of each attribute
// decides where its value comes from:
//
//   server-computed            remote → prior
//   user-owned                 plan → remote → prior → default
//   server-computed w/ default remote → plan → prior → default
//
// A user-owned attribute that is null in the plan takes its default, not
// the remote value: null is a real answer from the user.

use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::model::{
    CollectionType, DesiredConfig, FieldConfig, FieldState, PersistedState, RemoteField,
    RemoteResource, RuleKind,
};
use crate::value::AttrValue;

fn server_owned<T: Clone>(remote: Option<&T>, prior: Option<&T>) -> Option<T> {
    remote.or(prior).cloned()
}

fn user_owned<T: Clone>(
    plan: Option<&AttrValue<T>>,
    remote: Option<&T>,
    prior: Option<&T>,
    default: impl FnOnce() -> T,
) -> T {
    match plan {
        Some(AttrValue::Known(v)) => v.clone(),
        Some(AttrValue::Null) => default(),
        Some(AttrValue::Unknown) | None => remote.or(prior).cloned().unwrap_or_else(default),
    }
}

fn client_default<T: Clone>(
    plan: Option<&AttrValue<T>>,
    remote: Option<&T>,
    prior: Option<&T>,
    default: impl FnOnce() -> T,
) -> T {
    remote
        .or_else(|| plan.and_then(AttrValue::as_known))
        .or(prior)
        .cloned()
        .unwrap_or_else(default)
}

/// Build the next persisted state.
///
/// `plan` is `None` for a plain refresh or import. Fails only when an
/// identity attribute (`id`, `name`, `type`) has no source at all.
pub fn merge(
    prior: Option<&PersistedState>,
    plan: Option<&DesiredConfig>,
    remote: &RemoteResource,
) -> Result<PersistedState, CoreError> {
    let missing = |attr: &str| CoreError::InvalidResponse {
        message: format!("the server did not return \"{attr}\" and no prior value exists"),
    };

    let id = server_owned(remote.id.as_ref(), prior.map(|p| &p.id)).ok_or_else(|| missing("id"))?;

    let name = match plan.map(|p| &p.name) {
        Some(AttrValue::Known(n)) => n.clone(),
        _ => server_owned(remote.name.as_ref(), prior.map(|p| &p.name))
            .ok_or_else(|| missing("name"))?,
    };

    let collection_type: CollectionType = match plan.map(|p| &p.collection_type) {
        Some(AttrValue::Known(t)) => *t,
        _ => server_owned(
            remote.collection_type.as_ref(),
            prior.map(|p| &p.collection_type),
        )
        .ok_or_else(|| missing("type"))?,
    };

    let mut state = PersistedState {
        id,
        name,
        collection_type,
        system: server_owned(remote.system.as_ref(), prior.map(|p| &p.system)).unwrap_or(false),
        schema: merge_schema(prior, plan, remote),
        list_rule: String::new(),
        view_rule: String::new(),
        create_rule: String::new(),
        update_rule: String::new(),
        delete_rule: String::new(),
        options: client_default(
            plan.map(|p| &p.options),
            remote.options.as_ref(),
            prior.map(|p| &p.options),
            Map::new,
        ),
        indexes: user_owned(
            plan.map(|p| &p.indexes),
            remote.indexes.as_ref(),
            prior.map(|p| &p.indexes),
            Vec::new,
        ),
        created: server_owned(remote.created.as_ref(), prior.map(|p| &p.created))
            .unwrap_or_default(),
        updated: server_owned(remote.updated.as_ref(), prior.map(|p| &p.updated))
            .unwrap_or_default(),
    };

    for kind in <RuleKind as strum::IntoEnumIterator>::iter() {
        *state.rule_mut(kind) = user_owned(
            plan.map(|p| p.rule(kind)),
            remote.rule(kind),
            prior.map(|p| p.rule(kind).to_owned()).as_ref(),
            String::new,
        );
    }

    Ok(state)
}

/// Fields are matched by name across plan, remote, and prior; the plan's
/// order wins when a plan is present, otherwise the server's.
fn merge_schema(
    prior: Option<&PersistedState>,
    plan: Option<&DesiredConfig>,
    remote: &RemoteResource,
) -> Vec<FieldState> {
    let prior_field = |name: &str| prior.and_then(|p| p.field(name));
    let remote_field = |name: &str| {
        remote
            .schema
            .as_ref()
            .and_then(|fields| fields.iter().find(|f| f.name.as_deref() == Some(name)))
    };

    match plan.map(|p| &p.schema) {
        Some(AttrValue::Known(fields)) => fields
            .iter()
            .filter_map(|f| {
                let name = f.name.as_known()?;
                Some(merge_field(f, name, remote_field(name), prior_field(name)))
            })
            .collect(),
        Some(AttrValue::Null) => Vec::new(),
        Some(AttrValue::Unknown) | None => match &remote.schema {
            Some(fields) => fields
                .iter()
                .filter_map(|rf| {
                    let name = rf.name.as_deref()?;
                    Some(field_from_remote(rf, prior_field(name)))
                })
                .collect(),
            None => prior.map(|p| p.schema.clone()).unwrap_or_default(),
        },
    }
}

fn merge_field(
    plan: &FieldConfig,
    name: &str,
    remote: Option<&RemoteField>,
    prior: Option<&FieldState>,
) -> FieldState {
    FieldState {
        id: match &plan.id {
            AttrValue::Known(id) => id.clone(),
            AttrValue::Null | AttrValue::Unknown => {
                server_owned(remote.and_then(|r| r.id.as_ref()), prior.map(|p| &p.id))
                    .unwrap_or_default()
            }
        },
        name: name.to_owned(),
        field_type: user_owned(
            Some(&plan.field_type),
            remote.and_then(|r| r.field_type.as_ref()),
            prior.map(|p| &p.field_type),
            String::new,
        ),
        system: server_owned(
            remote.and_then(|r| r.system.as_ref()),
            prior.map(|p| &p.system),
        )
        .unwrap_or(false),
        required: user_owned(
            Some(&plan.required),
            remote.and_then(|r| r.required.as_ref()),
            prior.map(|p| &p.required),
            || false,
        ),
        unique: user_owned(
            Some(&plan.unique),
            remote.and_then(|r| r.unique.as_ref()),
            prior.map(|p| &p.unique),
            || false,
        ),
        options: client_default(
            Some(&plan.options),
            remote.and_then(|r| r.options.as_ref()),
            prior.map(|p| &p.options),
            Map::new,
        ),
    }
}

fn field_from_remote(remote: &RemoteField, prior: Option<&FieldState>) -> FieldState {
    FieldState {
        id: server_owned(remote.id.as_ref(), prior.map(|p| &p.id)).unwrap_or_default(),
        name: remote.name.clone().unwrap_or_default(),
        field_type: server_owned(remote.field_type.as_ref(), prior.map(|p| &p.field_type))
            .unwrap_or_default(),
        system: server_owned(remote.system.as_ref(), prior.map(|p| &p.system)).unwrap_or(false),
        required: server_owned(remote.required.as_ref(), prior.map(|p| &p.required))
            .unwrap_or(false),
        unique: server_owned(remote.unique.as_ref(), prior.map(|p| &p.unique)).unwrap_or(false),
        options: server_owned(remote.options.as_ref(), prior.map(|p| &p.options))
            .unwrap_or_default(),
    }
}

/// Desired configuration that reproduces `state` exactly; used to seed a
/// configuration file after import.
pub fn desired_from_state(state: &PersistedState) -> DesiredConfig {
    let known = |s: &str| AttrValue::Known(s.to_owned());
    DesiredConfig {
        name: known(&state.name),
        collection_type: AttrValue::Known(state.collection_type),
        schema: AttrValue::Known(
            state
                .schema
                .iter()
                .map(|f| FieldConfig {
                    id: known(&f.id),
                    name: known(&f.name),
                    field_type: known(&f.field_type),
                    required: AttrValue::Known(f.required),
                    unique: AttrValue::Known(f.unique),
                    options: AttrValue::Known(f.options.clone()),
                })
                .collect(),
        ),
        list_rule: known(&state.list_rule),
        view_rule: known(&state.view_rule),
        create_rule: known(&state.create_rule),
        update_rule: known(&state.update_rule),
        delete_rule: known(&state.delete_rule),
        options: AttrValue::Known(state.options.clone()),
        indexes: AttrValue::Known(state.indexes.clone()),
    }
}

/// Render a state attribute as JSON for plan output.
pub(crate) fn state_value(state: &PersistedState, attribute: &str) -> Option<Value> {
    serde_json::to_value(state)
        .ok()?
        .as_object_mut()?
        .remove(attribute)
}
