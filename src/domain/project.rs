use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{flag, Entity, InvalidPatch, PatchFields, ResourceType};
use crate::id::Id;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Project {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub color: i64,
    #[serde(default)]
    pub child_order: i64,
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub is_deleted: bool,
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub is_archived: bool,
}

impl Entity for Project {
    const RESOURCE: ResourceType = ResourceType::Projects;

    fn id(&self) -> i64 {
        self.id
    }

    fn is_deleted(&self) -> bool {
        self.is_deleted
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectPatch {
    fields: PatchFields,
}

impl ProjectPatch {
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
        self.fields.set("name", Value::String(value.into()));
        self
    }

    pub fn with_color(mut self, value: i64) -> Self {
        self.fields.set("color", json!(value));
        self
    }

    pub fn with_child_order(mut self, value: i64) -> Self {
        self.fields.set("child_order", json!(value));
        self
    }

    pub fn with_parent_id(mut self, value: Id) -> Self {
        self.fields.set_serialized("parent_id", &value);
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
        self.fields.encode("project")
    }
}

impl Default for ProjectPatch {
    fn default() -> Self {
        Self::new()
    }
}
