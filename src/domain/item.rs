use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::due::validate_due_input;
use super::{flag, Due, Entity, InvalidPatch, PatchFields, ResourceType};
use crate::id::Id;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    pub id: i64,
    pub project_id: i64,
    #[serde(default)]
    pub labels: Vec<i64>,
    #[serde(default)]
    pub content: String,
    #[serde(default = "default_priority")]
    pub priority: i64,
    #[serde(default)]
    pub child_order: i64,
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub checked: bool,
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub is_deleted: bool,
    #[serde(default)]
    pub due: Option<Due>,
}

fn default_priority() -> i64 {
    1
}

impl Entity for Item {
    const RESOURCE: ResourceType = ResourceType::Items;

    fn id(&self) -> i64 {
        self.id
    }

    fn is_deleted(&self) -> bool {
        self.is_deleted
    }
}

/// Attributes to set on a new or existing item.
///
/// Only touched attributes are sent, so an update never clobbers fields
/// changed elsewhere. Invalid values poison the patch; the error surfaces
/// when the command queue is encoded for a push.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemPatch {
    fields: PatchFields,
}

impl ItemPatch {
    /// Patch for an `item_add` command.
    pub fn new() -> Self {
        Self {
            fields: PatchFields::new(None),
        }
    }

    /// Patch for an `item_update` command targeting `id`.
    pub fn for_id(id: Id) -> Self {
        Self {
            fields: PatchFields::new(Some(id)),
        }
    }

    pub fn with_project_id(mut self, value: Id) -> Self {
        self.fields.set_serialized("project_id", &value);
        self
    }

    pub fn with_content(mut self, value: impl Into<String>) -> Self {
        self.fields.set("content", Value::String(value.into()));
        self
    }

    /// Replaces the item's label list. Temporary ids may reference labels
    /// queued earlier in the same batch.
    pub fn with_labels<I>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = Id>,
    {
        let labels: Vec<Id> = labels.into_iter().collect();
        self.fields.set_serialized("labels", &labels);
        self
    }

    /// Sets a due date (`2019-08-07`) or date and time
    /// (`2019-08-07T21:20:34Z`).
    pub fn with_due(mut self, date: &str) -> Self {
        match validate_due_input(date) {
            Ok(()) => self.fields.set("due", json!({ "date": date })),
            Err(reason) => self.fields.poison(reason),
        }
        self
    }

    pub fn with_priority(mut self, value: i64) -> Self {
        if (1..=4).contains(&value) {
            self.fields.set("priority", json!(value));
        } else {
            self.fields.poison(format!("priority {} is outside 1..=4", value));
        }
        self
    }

    pub fn with_child_order(mut self, value: i64) -> Self {
        self.fields.set("child_order", json!(value));
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
        self.fields.encode("item")
    }
}

impl Default for ItemPatch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Item, ItemPatch};
    use crate::id::Id;

    #[test]
    fn decodes_integer_flags_and_missing_optionals() {
        let item: Item = serde_json::from_value(json!({
            "id": 10,
            "project_id": 2,
            "content": "Buy milk",
            "checked": 1,
            "is_deleted": 0,
            "due": null
        }))
        .expect("item should decode");
        assert!(item.checked);
        assert!(!item.is_deleted);
        assert!(item.labels.is_empty());
        assert_eq!(item.priority, 1);
        assert_eq!(item.due, None);
    }

    #[test]
    fn update_sends_only_touched_attributes() {
        let patch = ItemPatch::for_id(Id::Permanent(10)).with_content("Buy oat milk");
        assert_eq!(
            patch.encode().expect("patch should encode"),
            json!({"id": 10, "content": "Buy oat milk"})
        );
    }

    #[test]
    fn labels_mix_permanent_and_temporary_ids() {
        let patch = ItemPatch::new().with_labels(vec![
            Id::Permanent(3),
            Id::Temporary("tmp-label".to_string()),
        ]);
        assert_eq!(
            patch.encode().expect("patch should encode"),
            json!({"labels": [3, "tmp-label"]})
        );
    }

    #[test]
    fn empty_label_list_clears_labels() {
        let patch = ItemPatch::for_id(Id::Permanent(1)).with_labels(Vec::new());
        assert_eq!(
            patch.encode().expect("patch should encode"),
            json!({"id": 1, "labels": []})
        );
    }

    #[test]
    fn zero_label_id_poisons_patch() {
        let patch = ItemPatch::new()
            .with_labels(vec![Id::Permanent(0)])
            .with_content("never sent");
        assert!(patch.is_poisoned());
        let err = patch.encode().expect_err("poisoned patch must not encode");
        assert!(err.reason.contains("labels"));
    }

    #[test]
    fn invalid_due_and_priority_poison_patch() {
        assert!(ItemPatch::new().with_due("someday").is_poisoned());
        assert!(ItemPatch::new().with_priority(5).is_poisoned());
        let patch = ItemPatch::new().with_due("2024-05-01").with_priority(4);
        assert_eq!(
            patch.encode().expect("patch should encode"),
            json!({"due": {"date": "2024-05-01"}, "priority": 4})
        );
    }
}
