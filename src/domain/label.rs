use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{flag, Entity, InvalidPatch, PatchFields, ResourceType};
use crate::id::Id;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Label {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub item_order: i64,
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub is_deleted: bool,
}

impl Entity for Label {
    const RESOURCE: ResourceType = ResourceType::Labels;

    fn id(&self) -> i64 {
        self.id
    }

    fn is_deleted(&self) -> bool {
        self.is_deleted
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelPatch {
    fields: PatchFields,
}

impl LabelPatch {
    pub fn new() -> Self {
        Self {
            fields: PatchFields::new(None),
        }
    }

    pub fn for_id(id: Id) -> Self {
        Self {
            fields: PatchFields::new(Some(id)),
        }
    }

    pub fn with_name(mut self, value: impl Into<String>) -> Self {
        let value = value.into();
        if value.trim().is_empty() {
            self.fields.poison("label name must not be empty".to_string());
        } else {
            self.fields.set("name", Value::String(value));
        }
        self
    }

    pub fn with_item_order(mut self, value: i64) -> Self {
        self.fields.set("item_order", json!(value));
        self
    }

    pub fn is_poisoned(&self) -> bool {
        self.fields.is_poisoned()
    }

    /// Whether the patch targets an existing entity, as update commands
    /// require.
    pub fn has_id(&self) -> bool {
        self.fields.has_id()
    }

    pub(crate) fn encode(&self) -> Result<Value, InvalidPatch> {
        self.fields.encode("label")
    }
}

impl Default for LabelPatch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::LabelPatch;

    #[test]
    fn name_is_encoded() {
        let patch = LabelPatch::new().with_name("waiting");
        assert_eq!(
            patch.encode().expect("patch should encode"),
            json!({"name": "waiting"})
        );
    }

    #[test]
    fn blank_name_poisons_patch() {
        let patch = LabelPatch::new().with_name("  ").with_item_order(3);
        assert!(patch.is_poisoned());
        assert!(patch.encode().is_err());
    }
}
