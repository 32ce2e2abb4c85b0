// ── Wire types for the PocketBase collections API ──
//
// Field names follow the server's camelCase JSON. Response types default
// every member so partial payloads still decode; the core layer decides
// what an absent member means.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ── Auth ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct PasswordAuthRequest<'a> {
    pub identity: &'a str,
    pub password: &'a str,
}

/// Response from the admin password auth endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    #[serde(default)]
    pub admin: Option<Value>,
}

// ── Error envelope ──────────────────────────────────────────────────

/// `{"code": 404, "message": "...", "data": {}}`
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

// ── Collections ─────────────────────────────────────────────────────

/// A collection as returned by `GET /api/collections/{idOrName}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CollectionRecord {
    pub id: Option<String>,
    pub created: Option<String>,
    pub updated: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub collection_type: Option<String>,
    pub system: Option<bool>,
    pub schema: Option<Vec<SchemaFieldRecord>>,
    pub indexes: Option<Vec<String>>,
    // Rules are nullable server-side; `Some(None)` is an explicit null.
    #[serde(deserialize_with = "nullable")]
    pub list_rule: Option<Option<String>>,
    #[serde(deserialize_with = "nullable")]
    pub view_rule: Option<Option<String>>,
    #[serde(deserialize_with = "nullable")]
    pub create_rule: Option<Option<String>>,
    #[serde(deserialize_with = "nullable")]
    pub update_rule: Option<Option<String>>,
    #[serde(deserialize_with = "nullable")]
    pub delete_rule: Option<Option<String>>,
    pub options: Option<Map<String, Value>>,
}

/// One entry of a collection's `schema` array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaFieldRecord {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub field_type: Option<String>,
    pub system: Option<bool>,
    pub required: Option<bool>,
    pub unique: Option<bool>,
    pub options: Option<Value>,
}

/// Body of `POST /api/collections` and `PATCH /api/collections/{id}`.
///
/// Every member is optional and skipped when absent, so an update body
/// carries only the attributes that changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionWrite {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub collection_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Vec<SchemaFieldWrite>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indexes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_rule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_rule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_rule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_rule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_rule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SchemaFieldWrite {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub required: bool,
    pub unique: bool,
    pub options: Map<String, Value>,
}

/// Paged list envelope used by the list endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPage<T> {
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
    pub items: Vec<T>,
}

/// Distinguishes an absent member (`None`) from an explicit `null`
/// (`Some(None)`); plain `Option<Option<T>>` would collapse both.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_distinguishes_null_rule_from_missing() {
        let record: CollectionRecord = serde_json::from_value(json!({
            "id": "abc123",
            "name": "posts",
            "listRule": null,
            "viewRule": "@request.auth.id != ''"
        }))
        .unwrap();

        assert_eq!(record.list_rule, Some(None));
        assert_eq!(
            record.view_rule,
            Some(Some("@request.auth.id != ''".to_owned()))
        );
        assert_eq!(record.create_rule, None);
    }

    #[test]
    fn update_body_skips_absent_members() {
        let body = CollectionWrite {
            name: Some("articles".into()),
            ..CollectionWrite::default()
        };
        assert_eq!(serde_json::to_value(&body).unwrap(), json!({"name": "articles"}));
    }

    #[test]
    fn write_field_omits_unassigned_id() {
        let field = SchemaFieldWrite {
            id: None,
            name: "title".into(),
            field_type: "text".into(),
            required: true,
            unique: false,
            options: Map::new(),
        };
        assert_eq!(
            serde_json::to_value(&field).unwrap(),
            json!({"name": "title", "type": "text", "required": true, "unique": false, "options": {}})
        );
    }
}
