// ── Persisted collection state ──
//
// The last materialized view of a collection. Every attribute is
// concrete here: unknowns are resolved by apply, rules default to "".

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Collection type. Fixed at creation; changing it means replacement.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CollectionType {
    Base,
    Auth,
    View,
}

/// The five access rules of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumIter, strum::IntoStaticStr)]
pub enum RuleKind {
    #[strum(serialize = "list_rule")]
    List,
    #[strum(serialize = "view_rule")]
    View,
    #[strum(serialize = "create_rule")]
    Create,
    #[strum(serialize = "update_rule")]
    Update,
    #[strum(serialize = "delete_rule")]
    Delete,
}

impl RuleKind {
    /// Attribute name in configuration and state.
    pub fn attribute(self) -> &'static str {
        self.into()
    }
}

/// One schema field as recorded in state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldState {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub system: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub options: Map<String, Value>,
}

/// A collection as last observed and recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub collection_type: CollectionType,
    #[serde(default)]
    pub system: bool,
    #[serde(default)]
    pub schema: Vec<FieldState>,
    #[serde(default)]
    pub list_rule: String,
    #[serde(default)]
    pub view_rule: String,
    #[serde(default)]
    pub create_rule: String,
    #[serde(default)]
    pub update_rule: String,
    #[serde(default)]
    pub delete_rule: String,
    #[serde(default)]
    pub options: Map<String, Value>,
    #[serde(default)]
    pub indexes: Vec<String>,
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub updated: String,
}

impl PersistedState {
    pub fn rule(&self, kind: RuleKind) -> &str {
        match kind {
            RuleKind::List => &self.list_rule,
            RuleKind::View => &self.view_rule,
            RuleKind::Create => &self.create_rule,
            RuleKind::Update => &self.update_rule,
            RuleKind::Delete => &self.delete_rule,
        }
    }

    pub(crate) fn rule_mut(&mut self, kind: RuleKind) -> &mut String {
        match kind {
            RuleKind::List => &mut self.list_rule,
            RuleKind::View => &mut self.view_rule,
            RuleKind::Create => &mut self.create_rule,
            RuleKind::Update => &mut self.update_rule,
            RuleKind::Delete => &mut self.delete_rule,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldState> {
        self.schema.iter().find(|f| f.name == name)
    }
}
