// ── Desired configuration ──
//
// What the user asked for. Only user-owned and client-default attributes
// appear here; server-assigned ones (`id`, `system`, timestamps) have no
// field and are dropped during parsing.

use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::diagnostics::{AttrPath, Diagnostics};
use crate::error::CoreError;
use crate::model::collection::{CollectionType, RuleKind};
use crate::schema::COLLECTION_SCHEMA;
use crate::value::AttrValue;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    pub id: AttrValue<String>,
    pub name: AttrValue<String>,
    #[serde(rename = "type")]
    pub field_type: AttrValue<String>,
    pub required: AttrValue<bool>,
    pub unique: AttrValue<bool>,
    #[serde(deserialize_with = "lenient_map")]
    pub options: AttrValue<Map<String, Value>>,
}

impl FieldConfig {
    /// A known field with the given name and type and everything else null.
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: AttrValue::Known(name.into()),
            field_type: AttrValue::Known(field_type.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesiredConfig {
    pub name: AttrValue<String>,
    #[serde(rename = "type")]
    pub collection_type: AttrValue<CollectionType>,
    pub schema: AttrValue<Vec<FieldConfig>>,
    pub list_rule: AttrValue<String>,
    pub view_rule: AttrValue<String>,
    pub create_rule: AttrValue<String>,
    pub update_rule: AttrValue<String>,
    pub delete_rule: AttrValue<String>,
    #[serde(deserialize_with = "lenient_map")]
    pub options: AttrValue<Map<String, Value>>,
    pub indexes: AttrValue<Vec<String>>,
}

impl DesiredConfig {
    /// A known collection with the given name and type, rules and schema null.
    pub fn new(name: impl Into<String>, collection_type: CollectionType) -> Self {
        Self {
            name: AttrValue::Known(name.into()),
            collection_type: AttrValue::Known(collection_type),
            ..Self::default()
        }
    }

    /// Validate a raw configuration document and parse it.
    ///
    /// Returns `None` when any error was found; the configuration is never
    /// partially accepted.
    pub fn from_raw(raw: &Value) -> (Option<Self>, Diagnostics) {
        let mut diags = COLLECTION_SCHEMA.validate(raw);
        if diags.has_error() {
            return (None, diags);
        }

        match serde_json::from_value::<Self>(raw.clone()) {
            Ok(config) => {
                diags.append(config.check());
                if diags.has_error() {
                    (None, diags)
                } else {
                    (Some(config), diags)
                }
            }
            Err(e) => {
                let err = CoreError::Validation {
                    message: e.to_string(),
                };
                diags.push(err.to_diagnostic());
                (None, diags)
            }
        }
    }

    pub fn rule(&self, kind: RuleKind) -> &AttrValue<String> {
        match kind {
            RuleKind::List => &self.list_rule,
            RuleKind::View => &self.view_rule,
            RuleKind::Create => &self.create_rule,
            RuleKind::Update => &self.update_rule,
            RuleKind::Delete => &self.delete_rule,
        }
    }

    /// Invariants that hold for typed values regardless of how they were
    /// built: required attributes present, field names unique.
    pub fn check(&self) -> Diagnostics {
        let mut diags = Diagnostics::new();

        for (name, is_null) in [
            ("name", self.name.is_null()),
            ("type", self.collection_type.is_null()),
        ] {
            if is_null {
                diags.add_attribute_error(
                    AttrPath::root(name),
                    "Missing required argument",
                    format!("The argument \"{name}\" is required, but no definition was found."),
                );
            }
        }

        if let AttrValue::Known(fields) = &self.schema {
            let mut seen = HashSet::new();
            for (idx, field) in fields.iter().enumerate() {
                let path = AttrPath::root("schema").index(idx);
                for (sub, is_null) in [
                    ("name", field.name.is_null()),
                    ("type", field.field_type.is_null()),
                ] {
                    if is_null {
                        diags.add_attribute_error(
                            path.attr(sub),
                            "Missing required argument",
                            format!("The argument \"{sub}\" is required, but no definition was found."),
                        );
                    }
                }
                if let AttrValue::Known(name) = &field.name {
                    if !seen.insert(name.as_str()) {
                        diags.add_attribute_error(
                            path,
                            "Duplicate field name",
                            format!("Field \"{name}\" is declared more than once."),
                        );
                    }
                }
            }
        }

        diags
    }

    /// Paths of user-owned attributes still unknown. Apply refuses to run
    /// while this is non-empty.
    pub fn unresolved(&self) -> Vec<AttrPath> {
        let mut paths = Vec::new();
        let mut note = |unknown: bool, path: AttrPath| {
            if unknown {
                paths.push(path);
            }
        };

        note(self.name.is_unknown(), AttrPath::root("name"));
        note(self.collection_type.is_unknown(), AttrPath::root("type"));
        for kind in <RuleKind as strum::IntoEnumIterator>::iter() {
            note(self.rule(kind).is_unknown(), AttrPath::root(kind.attribute()));
        }
        note(self.indexes.is_unknown(), AttrPath::root("indexes"));
        note(self.schema.is_unknown(), AttrPath::root("schema"));

        if let AttrValue::Known(fields) = &self.schema {
            for (idx, field) in fields.iter().enumerate() {
                let path = AttrPath::root("schema").index(idx);
                note(field.name.is_unknown(), path.attr("name"));
                note(field.field_type.is_unknown(), path.attr("type"));
                note(field.required.is_unknown(), path.attr("required"));
                note(field.unique.is_unknown(), path.attr("unique"));
            }
        }

        paths
    }

    /// Everything that must hold before a remote write: the typed checks
    /// plus no unresolved user-owned values.
    pub fn check_applicable(&self) -> Diagnostics {
        let mut diags = self.check();
        for path in self.unresolved() {
            diags.add_attribute_error(
                path,
                "Value unknown at apply time",
                "All user-owned attributes must be known before changes can be applied.",
            );
        }
        diags
    }
}

/// Options are documented as objects, but an empty list is accepted as an
/// empty object.
fn lenient_map<'de, D>(deserializer: D) -> Result<AttrValue<Map<String, Value>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(AttrValue::Null),
        Value::Object(map) => Ok(AttrValue::Known(map)),
        Value::Array(items) if items.is_empty() => Ok(AttrValue::Known(Map::new())),
        other => Err(serde::de::Error::custom(format!(
            "expected an object, got {other}"
        ))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_raw_parses_valid_config() {
        let raw = json!({
            "name": "posts",
            "type": "base",
            "schema": [{
                "name": "title",
                "type": "text",
                "required": true,
                "unique": false,
                "system": false,
                "options": []
            }],
            "list_rule": "",
            "view_rule": "",
            "create_rule": "",
            "update_rule": "",
            "delete_rule": ""
        });

        let (config, diags) = DesiredConfig::from_raw(&raw);
        assert!(!diags.has_error(), "{diags:?}");
        let config = config.unwrap();

        assert_eq!(config.name, AttrValue::Known("posts".into()));
        assert_eq!(config.collection_type, AttrValue::Known(CollectionType::Base));
        let fields = config.schema.as_known().unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].required, AttrValue::Known(true));
        assert_eq!(fields[0].options, AttrValue::Known(Map::new()));
        assert!(fields[0].id.is_null());
        assert!(config.indexes.is_null());
        // the computed `system` sub-attribute triggered a warning only
        assert_eq!(diags.warnings().count(), 1);
    }

    #[test]
    fn from_raw_rejects_without_partial_result() {
        let (config, diags) = DesiredConfig::from_raw(&json!({"type": "base"}));
        assert!(config.is_none());
        assert!(diags.has_error());
    }

    #[test]
    fn check_flags_duplicates_in_typed_config() {
        let mut config = DesiredConfig::new("posts", CollectionType::Base);
        config.schema = AttrValue::Known(vec![
            FieldConfig::new("title", "text"),
            FieldConfig::new("title", "editor"),
        ]);

        let diags = config.check();
        let paths: Vec<_> = diags
            .errors()
            .map(|d| d.path.as_ref().unwrap().to_string())
            .collect();
        assert_eq!(paths, ["schema[1]"]);
    }

    #[test]
    fn unknown_name_is_unresolved() {
        let mut config = DesiredConfig::new("posts", CollectionType::Base);
        config.name = AttrValue::Unknown;
        config.schema = AttrValue::Known(vec![FieldConfig {
            required: AttrValue::Unknown,
            ..FieldConfig::new("owner", "relation")
        }]);

        let paths: Vec<_> = config.unresolved().iter().map(ToString::to_string).collect();
        assert_eq!(paths, ["name", "schema[0].required"]);
        assert!(!config.check().has_error());
        assert_eq!(config.check_applicable().errors().count(), 2);
    }
}
