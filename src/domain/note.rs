use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::warn;

use super::{flag, Entity, InvalidPatch, PatchFields, ResourceType};
use crate::id::Id;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Note {
    pub id: i64,
    pub item_id: i64,
    #[serde(default)]
    pub project_id: i64,
    #[serde(default)]
    pub content: String,
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub is_deleted: bool,
    #[serde(default)]
    pub posted: String,
}

impl Note {
    pub fn posted_at(&self) -> Option<OffsetDateTime> {
        match OffsetDateTime::parse(&self.posted, &Rfc3339) {
            Ok(posted) => Some(posted),
            Err(err) => {
                warn!(
                    note = self.id,
                    posted = %self.posted,
                    error = %err,
                    "could not parse note timestamp"
                );
                None
            }
        }
    }
}

impl Entity for Note {
    const RESOURCE: ResourceType = ResourceType::Notes;

    fn id(&self) -> i64 {
        self.id
    }

    fn is_deleted(&self) -> bool {
        self.is_deleted
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotePatch {
    fields: PatchFields,
}

impl NotePatch {
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

    pub fn with_item_id(mut self, value: Id) -> Self {
        self.fields.set_serialized("item_id", &value);
        self
    }

    pub fn with_content(mut self, value: impl Into<String>) -> Self {
        self.fields.set("content", Value::String(value.into()));
        self
    }

    /// True when no non-empty content has been set.
    pub fn is_empty(&self) -> bool {
        self.fields
            .get("content")
            .and_then(Value::as_str)
            .map_or(true, str::is_empty)
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
        self.fields.encode("note")
    }
}

impl Default for NotePatch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use time::macros::datetime;

    use super::{Note, NotePatch};
    use crate::id::Id;

    #[test]
    fn posted_timestamp_parses() {
        let note: Note = serde_json::from_value(json!({
            "id": 1,
            "item_id": 2,
            "project_id": 3,
            "content": "call back",
            "is_deleted": 0,
            "posted": "2020-01-02T03:04:05Z"
        }))
        .expect("note should decode");
        assert_eq!(note.posted_at(), Some(datetime!(2020-01-02 03:04:05 UTC)));
    }

    #[test]
    fn unparsable_timestamp_resolves_to_none() {
        let note: Note = serde_json::from_value(json!({
            "id": 1,
            "item_id": 2,
            "posted": "yesterday"
        }))
        .expect("note should decode");
        assert_eq!(note.posted_at(), None);
    }

    #[test]
    fn empty_until_content_is_set() {
        let patch = NotePatch::new().with_item_id(Id::Permanent(2));
        assert!(patch.is_empty());
        assert!(!patch.with_content("hi").is_empty());
    }

    #[test]
    fn zero_item_reference_poisons_patch() {
        let patch = NotePatch::new()
            .with_item_id(Id::Temporary(String::new()))
            .with_content("lost");
        assert!(patch.is_poisoned());
        assert!(patch.is_empty());
    }
}
