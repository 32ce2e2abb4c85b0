// ── Remote representation ──
//
// What the service returned for one call. `None` means the member was
// not part of the response, which is different from an empty value.

use serde_json::{Map, Value};

use crate::model::collection::{CollectionType, RuleKind};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteField {
    pub id: Option<String>,
    pub name: Option<String>,
    pub field_type: Option<String>,
    pub system: Option<bool>,
    pub required: Option<bool>,
    pub unique: Option<bool>,
    pub options: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteResource {
    pub id: Option<String>,
    pub name: Option<String>,
    pub collection_type: Option<CollectionType>,
    pub system: Option<bool>,
    pub schema: Option<Vec<RemoteField>>,
    pub list_rule: Option<String>,
    pub view_rule: Option<String>,
    pub create_rule: Option<String>,
    pub update_rule: Option<String>,
    pub delete_rule: Option<String>,
    pub options: Option<Map<String, Value>>,
    pub indexes: Option<Vec<String>>,
    pub created: Option<String>,
    pub updated: Option<String>,
}

impl RemoteResource {
    pub fn rule(&self, kind: RuleKind) -> Option<&String> {
        match kind {
            RuleKind::List => self.list_rule.as_ref(),
            RuleKind::View => self.view_rule.as_ref(),
            RuleKind::Create => self.create_rule.as_ref(),
            RuleKind::Update => self.update_rule.as_ref(),
            RuleKind::Delete => self.delete_rule.as_ref(),
        }
    }
}
