// ── Wire ↔ domain conversion ──
//
// Bridges `pbsync-api` wire types into the core model. Unknown enum
// values from the server are logged and treated as absent rather than
// failing the whole response.

use pbsync_api::types::{CollectionRecord, CollectionWrite, SchemaFieldRecord, SchemaFieldWrite};
use serde_json::{Map, Value};
use tracing::warn;

use crate::model::{
    CollectionAttributes, CollectionType, FieldAttributes, RemoteField, RemoteResource,
};

// ── Helpers ──────────────────────────────────────────────────────────

/// Persisted rules are never null; an explicit `null` maps to "".
fn rule(value: Option<Option<String>>) -> Option<String> {
    value.map(Option::unwrap_or_default)
}

/// Rules the server sent as an explicit `null`. PocketBase reads `null` as
/// superusers only and `""` as public, so recording them as `""` loses
/// that restriction.
fn superuser_only_rules(r: &CollectionRecord) -> Vec<&'static str> {
    [
        ("list_rule", &r.list_rule),
        ("view_rule", &r.view_rule),
        ("create_rule", &r.create_rule),
        ("update_rule", &r.update_rule),
        ("delete_rule", &r.delete_rule),
    ]
    .into_iter()
    .filter(|(_, value)| matches!(value, Some(None)))
    .map(|(name, _)| name)
    .collect()
}

/// Field options are an object in practice, but older servers send `[]`
/// or `null` for fields without settings.
fn field_options(value: Option<Value>) -> Option<Map<String, Value>> {
    match value? {
        Value::Object(map) => Some(map),
        Value::Null => Some(Map::new()),
        Value::Array(items) if items.is_empty() => Some(Map::new()),
        other => {
            warn!(options = %other, "ignoring non-object field options");
            None
        }
    }
}

// ── Responses ────────────────────────────────────────────────────────

impl From<SchemaFieldRecord> for RemoteField {
    fn from(f: SchemaFieldRecord) -> Self {
        Self {
            id: f.id,
            name: f.name,
            field_type: f.field_type,
            system: f.system,
            required: f.required,
            unique: f.unique,
            options: field_options(f.options),
        }
    }
}

impl From<CollectionRecord> for RemoteResource {
    fn from(r: CollectionRecord) -> Self {
        let locked = superuser_only_rules(&r);
        if !locked.is_empty() {
            warn!(
                collection = r.name.as_deref().unwrap_or_default(),
                rules = ?locked,
                "superuser-only (null) rules are recorded as empty, which PocketBase treats as public"
            );
        }

        let collection_type = r.collection_type.and_then(|t| match t.parse::<CollectionType>() {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                warn!(collection_type = %t, "unrecognized collection type from server");
                None
            }
        });

        Self {
            id: r.id,
            name: r.name,
            collection_type,
            system: r.system,
            schema: r
                .schema
                .map(|fields| fields.into_iter().map(RemoteField::from).collect()),
            list_rule: rule(r.list_rule),
            view_rule: rule(r.view_rule),
            create_rule: rule(r.create_rule),
            update_rule: rule(r.update_rule),
            delete_rule: rule(r.delete_rule),
            options: r.options,
            indexes: r.indexes,
            created: r.created,
            updated: r.updated,
        }
    }
}

// ── Requests ─────────────────────────────────────────────────────────

impl From<&FieldAttributes> for SchemaFieldWrite {
    fn from(f: &FieldAttributes) -> Self {
        Self {
            id: f.id.clone(),
            name: f.name.clone(),
            field_type: f.field_type.clone(),
            required: f.required,
            unique: f.unique,
            options: f.options.clone(),
        }
    }
}

impl From<&CollectionAttributes> for CollectionWrite {
    fn from(a: &CollectionAttributes) -> Self {
        Self {
            name: a.name.clone(),
            collection_type: a.collection_type.map(|t| t.to_string()),
            schema: a
                .schema
                .as_ref()
                .map(|fields| fields.iter().map(SchemaFieldWrite::from).collect()),
            indexes: a.indexes.clone(),
            list_rule: a.list_rule.clone(),
            view_rule: a.view_rule.clone(),
            create_rule: a.create_rule.clone(),
            update_rule: a.update_rule.clone(),
            delete_rule: a.delete_rule.clone(),
            options: a.options.clone(),
        }
    }
}
