use serde::Serialize;
use serde_json::{Map, Value};

use crate::id::Id;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
struct OrderAssignment {
    id: Id,
    child_order: i64,
}

/// New sibling positions for a batch of items or projects, sent as a single
/// `*_reorder` command however many entities moved. Each enqueue of a
/// `Reorder` is its own command; separate reorders are never merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reorder {
    assignments: Vec<OrderAssignment>,
}

impl Reorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a position. A later position for the same id replaces the
    /// earlier one.
    pub fn add(&mut self, id: Id, child_order: i64) -> &mut Self {
        match self.assignments.iter_mut().find(|entry| entry.id == id) {
            Some(entry) => entry.child_order = child_order,
            None => self.assignments.push(OrderAssignment { id, child_order }),
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub(crate) fn encode(&self, collection: &str) -> Result<Value, serde_json::Error> {
        let mut object = Map::new();
        object.insert(
            collection.to_string(),
            serde_json::to_value(&self.assignments)?,
        );
        Ok(Value::Object(object))
    }
}
