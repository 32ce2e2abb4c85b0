// ── Write payloads handed to the facade ──
//
// One shape serves both create (every user-owned member set) and update
// (only the members that changed).

use serde::Serialize;
use serde_json::{Map, Value};

use crate::diagnostics::Diagnostics;
use crate::model::collection::{CollectionType, FieldState, RuleKind};
use crate::model::desired::{DesiredConfig, FieldConfig};
use crate::value::AttrValue;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub required: bool,
    pub unique: bool,
    pub options: Map<String, Value>,
}

/// Attribute set sent on create or update.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CollectionAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub collection_type: Option<CollectionType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Vec<FieldAttributes>>,
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
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indexes: Option<Vec<String>>,
}

impl CollectionAttributes {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn rule(&self, kind: RuleKind) -> Option<&String> {
        match kind {
            RuleKind::List => self.list_rule.as_ref(),
            RuleKind::View => self.view_rule.as_ref(),
            RuleKind::Create => self.create_rule.as_ref(),
            RuleKind::Update => self.update_rule.as_ref(),
            RuleKind::Delete => self.delete_rule.as_ref(),
        }
    }

    pub(crate) fn set_rule(&mut self, kind: RuleKind, value: String) {
        let slot = match kind {
            RuleKind::List => &mut self.list_rule,
            RuleKind::View => &mut self.view_rule,
            RuleKind::Create => &mut self.create_rule,
            RuleKind::Update => &mut self.update_rule,
            RuleKind::Delete => &mut self.delete_rule,
        };
        *slot = Some(value);
    }

    /// Full attribute set for creating `desired`.
    ///
    /// Null rules become "" and null lists become empty; null options are
    /// left for the server to default. Any unknown value is an error.
    pub fn for_create(desired: &DesiredConfig) -> Result<Self, Diagnostics> {
        let mut diags = desired.check_applicable();
        if diags.has_error() {
            return Err(diags);
        }
        let (AttrValue::Known(name), AttrValue::Known(collection_type)) =
            (&desired.name, &desired.collection_type)
        else {
            diags.add_error("Missing required argument", "name and type must be set");
            return Err(diags);
        };

        let mut attrs = Self {
            name: Some(name.clone()),
            collection_type: Some(*collection_type),
            schema: Some(
                desired
                    .schema
                    .as_known()
                    .map(|fields| fields.iter().map(|f| field_attributes(f, None)).collect())
                    .unwrap_or_default(),
            ),
            options: desired.options.as_known().cloned(),
            indexes: Some(desired.indexes.as_known().cloned().unwrap_or_default()),
            ..Self::default()
        };
        for kind in <RuleKind as strum::IntoEnumIterator>::iter() {
            attrs.set_rule(kind, desired.rule(kind).as_known().cloned().unwrap_or_default());
        }

        Ok(attrs)
    }
}

/// Write form of one desired field. `observed` is the server's field with
/// the same name: its id is kept so the server retains the field's data,
/// and its options stand in when the user left options unset.
pub(crate) fn field_attributes(
    field: &FieldConfig,
    observed: Option<&FieldState>,
) -> FieldAttributes {
    FieldAttributes {
        id: match &field.id {
            AttrValue::Known(id) => Some(id.clone()),
            AttrValue::Null | AttrValue::Unknown => observed.map(|f| f.id.clone()),
        },
        name: field.name.as_known().cloned().unwrap_or_default(),
        field_type: field.field_type.as_known().cloned().unwrap_or_default(),
        required: field.required.as_known().copied().unwrap_or(false),
        unique: field.unique.as_known().copied().unwrap_or(false),
        options: match &field.options {
            AttrValue::Known(options) => options.clone(),
            AttrValue::Null | AttrValue::Unknown => {
                observed.map(|f| f.options.clone()).unwrap_or_default()
            }
        },
    }
}
