// ── Plan preview ──
//
// A pure description of what a reconcile would do, computed without any
// remote call. Server-computed attributes of a collection that does not
// exist yet are `Unknown` ("known after apply").

use serde::Serialize;
use serde_json::{Map, Value};
use strum::IntoEnumIterator;

use crate::diagnostics::{AttrPath, Diagnostics};
use crate::diff::diff;
use crate::error::CoreError;
use crate::model::attributes::field_attributes;
use crate::model::{CollectionAttributes, DesiredConfig, PersistedState, RuleKind};
use crate::schema::{COLLECTION_SCHEMA, Mutability};
use crate::state::state_value;
use crate::value::AttrValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PlanAction {
    NoOp,
    Create,
    Update,
    Replace,
    Delete,
}

/// One attribute's planned transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeChange {
    pub path: AttrPath,
    pub before: Option<Value>,
    pub after: AttrValue<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plan {
    pub action: PlanAction,
    pub changes: Vec<AttributeChange>,
    pub requires_replacement: bool,
    pub diagnostics: Diagnostics,
}

impl Plan {
    fn new(action: PlanAction) -> Self {
        Self {
            action,
            changes: Vec::new(),
            requires_replacement: false,
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn is_noop(&self) -> bool {
        self.action == PlanAction::NoOp
    }
}

/// Preview the reconcile of `prior` towards `desired`.
///
/// `prior` is taken as current; a caller wanting drift detection refreshes
/// it first.
pub fn plan(prior: Option<&PersistedState>, desired: Option<&DesiredConfig>) -> Plan {
    match (prior, desired) {
        (None, None) => Plan::new(PlanAction::NoOp),
        (Some(state), None) => plan_delete(state),
        (None, Some(desired)) => plan_create(desired),
        (Some(state), Some(desired)) => plan_update(state, desired),
    }
}

fn plan_create(desired: &DesiredConfig) -> Plan {
    let mut plan = Plan::new(PlanAction::Create);
    plan.diagnostics = desired.check();
    if plan.diagnostics.has_error() {
        return plan;
    }

    for (name, attribute) in COLLECTION_SCHEMA.block.iter() {
        let after = match attribute.mutability {
            Mutability::ServerComputed => AttrValue::Unknown,
            Mutability::ServerComputedWithDefault => match desired_value(desired, name) {
                AttrValue::Known(v) => AttrValue::Known(v),
                AttrValue::Null | AttrValue::Unknown => AttrValue::Unknown,
            },
            Mutability::UserRequired | Mutability::UserOptional => desired_value(desired, name),
        };
        plan.changes.push(AttributeChange {
            path: AttrPath::root(name),
            before: None,
            after,
        });
    }
    plan
}

fn plan_update(state: &PersistedState, desired: &DesiredConfig) -> Plan {
    let mut plan = Plan::new(PlanAction::NoOp);
    plan.diagnostics = desired.check();
    if plan.diagnostics.has_error() {
        return plan;
    }

    let diff = diff(state, desired);
    if diff.is_empty() {
        return plan;
    }

    let after = attribute_values_of(&diff.changes);
    for name in &diff.changed {
        plan.changes.push(AttributeChange {
            path: AttrPath::root(*name),
            before: state_value(state, name),
            after: after
                .get(*name)
                .cloned()
                .map_or(AttrValue::Unknown, AttrValue::Known),
        });
    }

    if diff.requires_replacement() {
        plan.action = PlanAction::Replace;
        plan.requires_replacement = true;
        plan.diagnostics.push(
            CoreError::ReplacementRequired {
                attributes: diff.replace.iter().map(|s| (*s).to_owned()).collect(),
            }
            .to_diagnostic(),
        );
        // everything server-assigned is reissued by the new collection
        for (name, attribute) in COLLECTION_SCHEMA.block.iter() {
            if attribute.mutability == Mutability::ServerComputed {
                plan.changes.push(AttributeChange {
                    path: AttrPath::root(name),
                    before: state_value(state, name),
                    after: AttrValue::Unknown,
                });
            }
        }
    } else {
        plan.action = PlanAction::Update;
        plan.changes.push(AttributeChange {
            path: AttrPath::root("updated"),
            before: Some(Value::String(state.updated.clone())),
            after: AttrValue::Unknown,
        });
    }
    plan
}

fn plan_delete(state: &PersistedState) -> Plan {
    let mut plan = Plan::new(PlanAction::Delete);
    plan.changes.push(AttributeChange {
        path: AttrPath::root("id"),
        before: Some(Value::String(state.id.clone())),
        after: AttrValue::Null,
    });
    plan
}

fn attribute_values_of(attrs: &CollectionAttributes) -> Map<String, Value> {
    match serde_json::to_value(attrs) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

fn json<T: Serialize>(value: &AttrValue<T>) -> AttrValue<Value> {
    match value {
        AttrValue::Known(v) => serde_json::to_value(v).map_or(AttrValue::Unknown, AttrValue::Known),
        AttrValue::Null => AttrValue::Null,
        AttrValue::Unknown => AttrValue::Unknown,
    }
}

/// A desired attribute as it will be persisted: unknowns stay unknown and
/// nulls of user-owned attributes resolve to their default.
fn desired_value(desired: &DesiredConfig, name: &str) -> AttrValue<Value> {
    if let Some(kind) = RuleKind::iter().find(|k| k.attribute() == name) {
        return json(&desired.rule(kind).clone().or_default_with(String::new));
    }
    match name {
        "name" => json(&desired.name),
        "type" => json(&desired.collection_type),
        "options" => json(&desired.options),
        "indexes" => json(&desired.indexes.clone().or_default_with(Vec::new)),
        "schema" => {
            let unresolved = desired
                .unresolved()
                .iter()
                .any(|p| p.top() == Some("schema"));
            if unresolved {
                return AttrValue::Unknown;
            }
            let fields = desired.schema.as_ref().map(|fields| {
                fields
                    .iter()
                    .map(|f| field_attributes(f, None))
                    .collect::<Vec<_>>()
            });
            json(&fields.or_default_with(Vec::new))
        }
        _ => AttrValue::Unknown,
    }
}
