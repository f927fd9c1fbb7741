use std::error::Error;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::id::Id;

pub mod due;
pub mod item;
pub mod label;
pub mod note;
pub mod project;

pub use due::Due;
pub use item::{Item, ItemPatch};
pub use label::{Label, LabelPatch};
pub use note::{Note, NotePatch};
pub use project::{Project, ProjectPatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    Items,
    Labels,
    Notes,
    Projects,
}

impl ResourceType {
    pub const ALL: [ResourceType; 4] = [
        ResourceType::Items,
        ResourceType::Labels,
        ResourceType::Notes,
        ResourceType::Projects,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::Items => "items",
            ResourceType::Labels => "labels",
            ResourceType::Notes => "notes",
            ResourceType::Projects => "projects",
        }
    }
}

/// A read-only snapshot of one server-side object as last pulled.
pub trait Entity: Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned {
    const RESOURCE: ResourceType;

    fn id(&self) -> i64;

    fn is_deleted(&self) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidPatch {
    pub entity: &'static str,
    pub reason: String,
}

impl fmt::Display for InvalidPatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {} patch: {}", self.entity, self.reason)
    }
}

impl Error for InvalidPatch {}

/// Sparse attribute set shared by all patch builders.
///
/// Setters only record what the caller touched. The first invalid value
/// poisons the patch; later setters are ignored and encoding fails with the
/// recorded reason.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct PatchFields {
    id: Option<Id>,
    attrs: Map<String, Value>,
    poisoned: Option<String>,
}

impl PatchFields {
    pub(crate) fn new(id: Option<Id>) -> Self {
        Self {
            id,
            attrs: Map::new(),
            poisoned: None,
        }
    }

    pub(crate) fn set(&mut self, key: &str, value: Value) {
        if self.poisoned.is_some() {
            return;
        }
        self.attrs.insert(key.to_string(), value);
    }

    pub(crate) fn set_serialized<T>(&mut self, key: &str, value: &T)
    where
        T: Serialize + ?Sized,
    {
        if self.poisoned.is_some() {
            return;
        }
        match serde_json::to_value(value) {
            Ok(encoded) => {
                self.attrs.insert(key.to_string(), encoded);
            }
            Err(err) => self.poison(format!("setting {}: {}", key, err)),
        }
    }

    pub(crate) fn poison(&mut self, reason: String) {
        if self.poisoned.is_none() {
            self.poisoned = Some(reason);
        }
    }

    pub(crate) fn is_poisoned(&self) -> bool {
        self.poisoned.is_some()
    }

    pub(crate) fn has_id(&self) -> bool {
        self.id.is_some()
    }

    pub(crate) fn get(&self, key: &str) -> Option<&Value> {
        self.attrs.get(key)
    }

    pub(crate) fn encode(&self, entity: &'static str) -> Result<Value, InvalidPatch> {
        if let Some(reason) = &self.poisoned {
            return Err(InvalidPatch {
                entity,
                reason: reason.clone(),
            });
        }
        let mut object = Map::new();
        if let Some(id) = &self.id {
            let encoded = serde_json::to_value(id).map_err(|err| InvalidPatch {
                entity,
                reason: format!("id: {}", err),
            })?;
            object.insert("id".to_string(), encoded);
        }
        for (key, value) in &self.attrs {
            object.insert(key.clone(), value.clone());
        }
        Ok(Value::Object(object))
    }
}

/// Deletion and archival flags arrive as `0`/`1` from the sync API but are
/// persisted as booleans.
pub(crate) mod flag {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawFlag {
        Bool(bool),
        Int(i64),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        match RawFlag::deserialize(deserializer)? {
            RawFlag::Bool(value) => Ok(value),
            RawFlag::Int(value) => Ok(value != 0),
        }
    }
}
