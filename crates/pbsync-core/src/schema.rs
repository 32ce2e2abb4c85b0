// ── Schema descriptor ──
//
// Declares which attributes a resource type recognizes, their kind, and
// who owns them. Raw configuration is checked against it before any
// typed parsing or remote call happens.

use std::collections::HashSet;
use std::sync::LazyLock;

use indexmap::IndexMap;
use serde_json::Value;

use crate::diagnostics::{AttrPath, Diagnostics};

/// Shape of an attribute value.
#[derive(Debug, Clone)]
pub enum AttributeKind {
    String,
    Bool,
    /// Ordered list of elements of the inner kind.
    List(Box<AttributeKind>),
    /// Unordered collection; duplicate elements are rejected.
    Set(Box<AttributeKind>),
    /// Free-form JSON object whose keys are not declared.
    Map,
    /// Nested object with its own declared attributes.
    Object(Block),
}

impl AttributeKind {
    fn describe(&self) -> &'static str {
        match self {
            Self::String => "a string",
            Self::Bool => "a bool",
            Self::List(_) => "a list",
            Self::Set(_) => "a set",
            Self::Map => "an object",
            Self::Object(_) => "a nested object",
        }
    }
}

/// Who owns an attribute's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Mutability {
    /// Must be supplied by the user.
    UserRequired,
    /// May be supplied by the user; falls back to a fixed default.
    UserOptional,
    /// Assigned by the server; user values are ignored.
    ServerComputed,
    /// May be supplied by the user; otherwise the server's value is kept
    /// across refreshes until the user sets one.
    ServerComputedWithDefault,
}

#[derive(Debug, Clone)]
pub struct Attribute {
    pub kind: AttributeKind,
    pub mutability: Mutability,
    /// Changing this attribute cannot be done in place.
    pub requires_replace: bool,
    /// Permitted string values; empty means unrestricted.
    pub allowed: &'static [&'static str],
    /// For lists of objects: sub-attribute whose value must be unique.
    pub key: Option<&'static str>,
}

impl Attribute {
    fn new(kind: AttributeKind, mutability: Mutability) -> Self {
        Self {
            kind,
            mutability,
            requires_replace: false,
            allowed: &[],
            key: None,
        }
    }

    pub fn required(kind: AttributeKind) -> Self {
        Self::new(kind, Mutability::UserRequired)
    }

    pub fn optional(kind: AttributeKind) -> Self {
        Self::new(kind, Mutability::UserOptional)
    }

    pub fn computed(kind: AttributeKind) -> Self {
        Self::new(kind, Mutability::ServerComputed)
    }

    pub fn optional_computed(kind: AttributeKind) -> Self {
        Self::new(kind, Mutability::ServerComputedWithDefault)
    }

    pub fn requires_replace(mut self) -> Self {
        self.requires_replace = true;
        self
    }

    pub fn one_of(mut self, allowed: &'static [&'static str]) -> Self {
        self.allowed = allowed;
        self
    }

    pub fn keyed_by(mut self, key: &'static str) -> Self {
        self.key = Some(key);
        self
    }
}

/// A set of named attributes, used both at the top level and for nested
/// objects. Declaration order is kept for documentation output.
#[derive(Debug, Clone, Default)]
pub struct Block {
    attributes: IndexMap<&'static str, Attribute>,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &'static str, attribute: Attribute) -> Self {
        self.attributes.insert(name, attribute);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Attribute)> {
        self.attributes.iter().map(|(k, v)| (*k, v))
    }
}

/// Schema of one resource type.
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    pub block: Block,
}

impl ResourceSchema {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.block.get(name)
    }

    /// Whether a change to the named top-level attribute forces replacement.
    pub fn requires_replace(&self, name: &str) -> bool {
        self.attribute(name).is_some_and(|a| a.requires_replace)
    }

    /// Check a raw configuration document against this schema.
    ///
    /// Every violation is reported; validation never stops at the first.
    pub fn validate(&self, raw: &Value) -> Diagnostics {
        let mut diags = Diagnostics::new();
        validate_block(&self.block, raw, &AttrPath::default(), &mut diags);
        diags
    }
}

// ── Validation ──────────────────────────────────────────────────────

fn validate_block(block: &Block, raw: &Value, path: &AttrPath, diags: &mut Diagnostics) {
    let Some(object) = raw.as_object() else {
        diags.add_attribute_error(
            path.clone(),
            "Incorrect attribute value type",
            format!("Expected an object, got {}.", json_type(raw)),
        );
        return;
    };

    for key in object.keys() {
        if block.get(key).is_none() {
            diags.add_attribute_error(
                child(path, key),
                "Unsupported argument",
                format!("An argument named \"{key}\" is not expected here."),
            );
        }
    }

    for (name, attribute) in block.iter() {
        let attr_path = child(path, name);
        match object.get(name) {
            None | Some(Value::Null) => {
                if attribute.mutability == Mutability::UserRequired {
                    diags.add_attribute_error(
                        attr_path,
                        "Missing required argument",
                        format!("The argument \"{name}\" is required, but no definition was found."),
                    );
                }
            }
            Some(value) => {
                if attribute.mutability == Mutability::ServerComputed {
                    diags.add_attribute_warning(
                        attr_path.clone(),
                        "Value for computed attribute ignored",
                        format!("\"{name}\" is assigned by the server; the supplied value will be replaced."),
                    );
                }
                validate_value(attribute, &attribute.kind, value, &attr_path, diags);
            }
        }
    }
}

fn validate_value(
    attribute: &Attribute,
    kind: &AttributeKind,
    value: &Value,
    path: &AttrPath,
    diags: &mut Diagnostics,
) {
    let type_error = |diags: &mut Diagnostics| {
        diags.add_attribute_error(
            path.clone(),
            "Incorrect attribute value type",
            format!("Expected {}, got {}.", kind.describe(), json_type(value)),
        );
    };

    match kind {
        AttributeKind::String => {
            let Some(s) = value.as_str() else {
                return type_error(diags);
            };
            if !attribute.allowed.is_empty() && !attribute.allowed.contains(&s) {
                diags.add_attribute_error(
                    path.clone(),
                    "Invalid attribute value",
                    format!(
                        "Value must be one of: {}; got \"{s}\".",
                        attribute.allowed.join(", ")
                    ),
                );
            }
        }
        AttributeKind::Bool => {
            if !value.is_boolean() {
                type_error(diags);
            }
        }
        AttributeKind::Map => {
            // An empty list is accepted as an empty object.
            let empty_list = value.as_array().is_some_and(Vec::is_empty);
            if !value.is_object() && !empty_list {
                type_error(diags);
            }
        }
        AttributeKind::Object(block) => validate_block(block, value, path, diags),
        AttributeKind::List(inner) | AttributeKind::Set(inner) => {
            let Some(items) = value.as_array() else {
                return type_error(diags);
            };
            for (idx, item) in items.iter().enumerate() {
                validate_value(attribute, inner, item, &path.index(idx), diags);
            }
            if matches!(kind, AttributeKind::Set(_)) {
                check_unique(items, path, diags, |item| Some(item.to_string()), "element");
            }
            if let Some(key) = attribute.key {
                check_unique(
                    items,
                    path,
                    diags,
                    |item| item.get(key).and_then(Value::as_str).map(str::to_owned),
                    key,
                );
            }
        }
    }
}

fn check_unique(
    items: &[Value],
    path: &AttrPath,
    diags: &mut Diagnostics,
    key_of: impl Fn(&Value) -> Option<String>,
    what: &str,
) {
    let mut seen = HashSet::new();
    for (idx, item) in items.iter().enumerate() {
        if let Some(key) = key_of(item) {
            if !seen.insert(key.clone()) {
                diags.add_attribute_error(
                    path.index(idx),
                    "Duplicate value",
                    format!("Duplicate {what} {key}; each {what} must be unique."),
                );
            }
        }
    }
}

fn child(path: &AttrPath, name: &str) -> AttrPath {
    if path.is_empty() {
        AttrPath::root(name)
    } else {
        path.attr(name)
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

// ── Collection schema ───────────────────────────────────────────────

pub const COLLECTION_TYPES: &[&str] = &["base", "auth", "view"];

pub const FIELD_TYPES: &[&str] = &[
    "text", "editor", "number", "bool", "email", "url", "date", "select", "json", "file",
    "relation",
];

/// Schema of the `collection` resource.
pub static COLLECTION_SCHEMA: LazyLock<ResourceSchema> = LazyLock::new(|| {
    let field = Block::new()
        // assigned by the server when omitted
        .with("id", Attribute::optional_computed(AttributeKind::String))
        .with("name", Attribute::required(AttributeKind::String))
        .with(
            "type",
            Attribute::required(AttributeKind::String).one_of(FIELD_TYPES),
        )
        .with("system", Attribute::computed(AttributeKind::Bool))
        .with("required", Attribute::optional(AttributeKind::Bool))
        .with("unique", Attribute::optional(AttributeKind::Bool))
        .with("options", Attribute::optional_computed(AttributeKind::Map));

    // filter expression; empty means no restriction
    let rule = || Attribute::optional(AttributeKind::String);

    ResourceSchema {
        block: Block::new()
            .with("id", Attribute::computed(AttributeKind::String))
            .with("name", Attribute::required(AttributeKind::String))
            .with(
                "type",
                Attribute::required(AttributeKind::String)
                    .one_of(COLLECTION_TYPES)
                    .requires_replace(),
            )
            .with("system", Attribute::computed(AttributeKind::Bool))
            .with(
                "schema",
                Attribute::optional(AttributeKind::List(Box::new(AttributeKind::Object(field))))
                    .keyed_by("name"),
            )
            .with("list_rule", rule())
            .with("view_rule", rule())
            .with("create_rule", rule())
            .with("update_rule", rule())
            .with("delete_rule", rule())
            .with("options", Attribute::optional_computed(AttributeKind::Map))
            .with(
                "indexes",
                Attribute::optional(AttributeKind::Set(Box::new(AttributeKind::String))),
            )
            .with("created", Attribute::computed(AttributeKind::String))
            .with("updated", Attribute::computed(AttributeKind::String)),
    }
});

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn paths(diags: &Diagnostics) -> Vec<String> {
        diags
            .errors()
            .filter_map(|d| d.path.as_ref().map(ToString::to_string))
            .collect()
    }

    #[test]
    fn valid_config_has_no_errors() {
        let raw = json!({
            "name": "posts",
            "type": "base",
            "schema": [{
                "name": "title",
                "type": "text",
                "required": true,
                "unique": false,
                "options": []
            }],
            "list_rule": "",
            "indexes": ["CREATE INDEX idx_title ON posts (title)"]
        });
        let diags = COLLECTION_SCHEMA.validate(&raw);
        assert!(!diags.has_error(), "{diags:?}");
        assert!(diags.is_empty());
    }

    #[test]
    fn missing_required_attribute_names_path() {
        let diags = COLLECTION_SCHEMA.validate(&json!({"type": "base"}));
        assert_eq!(paths(&diags), ["name"]);
    }

    #[test]
    fn reports_every_violation() {
        let raw = json!({
            "type": "table",
            "list_rule": false,
            "colour": "red"
        });
        let diags = COLLECTION_SCHEMA.validate(&raw);
        let mut found = paths(&diags);
        found.sort();
        assert_eq!(found, ["colour", "list_rule", "name", "type"]);
    }

    #[test]
    fn nested_field_missing_sub_attribute() {
        let raw = json!({
            "name": "posts",
            "type": "base",
            "schema": [{"name": "title"}, {"type": "text"}]
        });
        let diags = COLLECTION_SCHEMA.validate(&raw);
        assert_eq!(paths(&diags), ["schema[0].type", "schema[1].name"]);
    }

    #[test]
    fn unknown_nested_attribute_rejected() {
        let raw = json!({
            "name": "posts",
            "type": "base",
            "schema": [{"name": "title", "type": "text", "hidden": true}]
        });
        assert_eq!(paths(&COLLECTION_SCHEMA.validate(&raw)), ["schema[0].hidden"]);
    }

    #[test]
    fn duplicate_field_names_rejected() {
        let raw = json!({
            "name": "posts",
            "type": "base",
            "schema": [
                {"name": "title", "type": "text"},
                {"name": "title", "type": "editor"}
            ]
        });
        assert_eq!(paths(&COLLECTION_SCHEMA.validate(&raw)), ["schema[1]"]);
    }

    #[test]
    fn duplicate_indexes_rejected() {
        let raw = json!({
            "name": "posts",
            "type": "base",
            "indexes": ["CREATE INDEX a ON posts (x)", "CREATE INDEX a ON posts (x)"]
        });
        assert_eq!(paths(&COLLECTION_SCHEMA.validate(&raw)), ["indexes[1]"]);
    }

    #[test]
    fn computed_attribute_is_a_warning() {
        let raw = json!({"id": "abc123", "name": "posts", "type": "base"});
        let diags = COLLECTION_SCHEMA.validate(&raw);
        assert!(!diags.has_error());
        assert_eq!(diags.warnings().count(), 1);
    }

    #[test]
    fn non_object_root_rejected() {
        let diags = COLLECTION_SCHEMA.validate(&json!(["posts"]));
        assert!(diags.has_error());
    }

    #[test]
    fn type_requires_replace() {
        assert!(COLLECTION_SCHEMA.requires_replace("type"));
        assert!(!COLLECTION_SCHEMA.requires_replace("name"));
        assert!(!COLLECTION_SCHEMA.requires_replace("does_not_exist"));
    }

    #[test]
    fn mutability_display() {
        assert_eq!(
            Mutability::ServerComputedWithDefault.to_string(),
            "server-computed-with-default"
        );
    }
}
