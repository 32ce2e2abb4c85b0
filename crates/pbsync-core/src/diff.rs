// ── Attribute-level diff ──
//
// Compares a freshly observed state against the desired configuration
// and produces the minimal update payload. Unknown desired values never
// produce a change. Schema fields are matched by name, so reordering is
// not a change; indexes are compared as sets; options only have to be a
// subset of what the server holds, since the server fills in defaults.

use std::borrow::Cow;
use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::model::{
    CollectionAttributes, DesiredConfig, FieldConfig, FieldState, PersistedState, RuleKind,
    attributes::field_attributes,
};
use crate::schema::COLLECTION_SCHEMA;
use crate::value::AttrValue;

/// Result of comparing observed against desired.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionDiff {
    /// Desired values for every differing attribute, ready to send.
    pub changes: CollectionAttributes,
    /// Names of differing attributes, in schema order.
    pub changed: Vec<&'static str>,
    /// Subset of `changed` that cannot be updated in place.
    pub replace: Vec<&'static str>,
}

impl CollectionDiff {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty()
    }

    pub fn requires_replacement(&self) -> bool {
        !self.replace.is_empty()
    }

    fn record(&mut self, attribute: &'static str) {
        self.changed.push(attribute);
        if COLLECTION_SCHEMA.requires_replace(attribute) {
            self.replace.push(attribute);
        }
    }
}

/// Compute what must change for `observed` to match `desired`.
pub fn diff(observed: &PersistedState, desired: &DesiredConfig) -> CollectionDiff {
    let mut out = CollectionDiff::default();

    if let AttrValue::Known(name) = &desired.name {
        if *name != observed.name {
            out.changes.name = Some(name.clone());
            out.record("name");
        }
    }

    if let AttrValue::Known(collection_type) = desired.collection_type {
        if collection_type != observed.collection_type {
            out.changes.collection_type = Some(collection_type);
            out.record("type");
        }
    }

    if let Some(fields) = resolve(&desired.schema, Vec::new) {
        if !schema_matches(&observed.schema, &fields) {
            out.changes.schema = Some(
                fields
                    .iter()
                    .map(|f| {
                        let existing = f.name.as_known().and_then(|n| observed.field(n));
                        field_attributes(f, existing)
                    })
                    .collect(),
            );
            out.record("schema");
        }
    }

    for kind in <RuleKind as strum::IntoEnumIterator>::iter() {
        if let Some(rule) = resolve(desired.rule(kind), String::new) {
            if *rule != observed.rule(kind) {
                out.changes.set_rule(kind, rule.into_owned());
                out.record(kind.attribute());
            }
        }
    }

    if let AttrValue::Known(options) = &desired.options {
        if !is_subset(options, &observed.options) {
            let mut merged = observed.options.clone();
            merged.extend(options.iter().map(|(k, v)| (k.clone(), v.clone())));
            out.changes.options = Some(merged);
            out.record("options");
        }
    }

    if let Some(indexes) = resolve(&desired.indexes, Vec::new) {
        let differs = {
            let want: BTreeSet<&String> = indexes.iter().collect();
            let have: BTreeSet<&String> = observed.indexes.iter().collect();
            want != have
        };
        if differs {
            out.changes.indexes = Some(indexes.into_owned());
            out.record("indexes");
        }
    }

    out
}

/// `Known` as-is, `Null` as the attribute's default, `Unknown` as no
/// constraint.
fn resolve<T: Clone>(
    value: &AttrValue<T>,
    default: impl FnOnce() -> T,
) -> Option<Cow<'_, T>> {
    match value {
        AttrValue::Known(v) => Some(Cow::Borrowed(v)),
        AttrValue::Null => Some(Cow::Owned(default())),
        AttrValue::Unknown => None,
    }
}

fn is_subset(want: &Map<String, Value>, have: &Map<String, Value>) -> bool {
    want.iter().all(|(k, v)| have.get(k) == Some(v))
}

fn schema_matches(observed: &[FieldState], desired: &[FieldConfig]) -> bool {
    if observed.len() != desired.len() {
        return false;
    }
    desired.iter().all(|want| match &want.name {
        AttrValue::Known(name) => observed
            .iter()
            .find(|have| have.name == *name)
            .is_some_and(|have| field_matches(have, want)),
        // a field whose name is not known yet cannot be matched; leave it
        AttrValue::Unknown => true,
        AttrValue::Null => false,
    })
}

fn field_matches(have: &FieldState, want: &FieldConfig) -> bool {
    let id_ok = match &want.id {
        AttrValue::Known(id) => *id == have.id,
        AttrValue::Null | AttrValue::Unknown => true,
    };
    let type_ok = match &want.field_type {
        AttrValue::Known(t) => *t == have.field_type,
        AttrValue::Null | AttrValue::Unknown => true,
    };
    let options_ok = match &want.options {
        AttrValue::Known(options) => is_subset(options, &have.options),
        AttrValue::Null | AttrValue::Unknown => true,
    };

    id_ok
        && type_ok
        && options_ok
        && want.required.accepts(&have.required, || false)
        && want.unique.accepts(&have.unique, || false)
}
