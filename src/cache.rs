use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{Entity, Item, Label, Note, Project};
use crate::query::Scan;

/// Sync token that asks the server for everything.
pub const FULL_SYNC_TOKEN: &str = "*";

/// Last known server state: one map per entity type keyed by permanent id,
/// plus the token correlating the last pull with the next one.
///
/// Only the pull protocol mutates a cache. Entities are replaced wholesale
/// when a newer version arrives, never patched in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Cache {
    pub(crate) sync_token: String,
    #[serde(default)]
    pub(crate) labels: BTreeMap<i64, Label>,
    #[serde(default)]
    pub(crate) projects: BTreeMap<i64, Project>,
    #[serde(default)]
    pub(crate) items: BTreeMap<i64, Item>,
    #[serde(default)]
    pub(crate) notes: BTreeMap<i64, Note>,
}

/// Maps an entity type to its table inside a [`Cache`].
pub trait CacheTable: Entity {
    fn table(cache: &Cache) -> &BTreeMap<i64, Self>;

    fn table_mut(cache: &mut Cache) -> &mut BTreeMap<i64, Self>;
}

impl CacheTable for Item {
    fn table(cache: &Cache) -> &BTreeMap<i64, Self> {
        &cache.items
    }

    fn table_mut(cache: &mut Cache) -> &mut BTreeMap<i64, Self> {
        &mut cache.items
    }
}

impl CacheTable for Project {
    fn table(cache: &Cache) -> &BTreeMap<i64, Self> {
        &cache.projects
    }

    fn table_mut(cache: &mut Cache) -> &mut BTreeMap<i64, Self> {
        &mut cache.projects
    }
}

impl CacheTable for Label {
    fn table(cache: &Cache) -> &BTreeMap<i64, Self> {
        &cache.labels
    }

    fn table_mut(cache: &mut Cache) -> &mut BTreeMap<i64, Self> {
        &mut cache.labels
    }
}

impl CacheTable for Note {
    fn table(cache: &Cache) -> &BTreeMap<i64, Self> {
        &cache.notes
    }

    fn table_mut(cache: &mut Cache) -> &mut BTreeMap<i64, Self> {
        &mut cache.notes
    }
}

impl Default for Cache {
    fn default() -> Self {
        Self::new()
    }
}

impl Cache {
    pub fn new() -> Self {
        Self {
            sync_token: FULL_SYNC_TOKEN.to_string(),
            labels: BTreeMap::new(),
            projects: BTreeMap::new(),
            items: BTreeMap::new(),
            notes: BTreeMap::new(),
        }
    }

    pub fn sync_token(&self) -> &str {
        &self.sync_token
    }

    pub fn needs_full_sync(&self) -> bool {
        self.sync_token == FULL_SYNC_TOKEN
    }

    pub fn get<T: CacheTable>(&self, id: i64) -> Option<&T> {
        T::table(self).get(&id)
    }

    /// Starts a linear scan over every entity of type `T`. Predicates added
    /// to the scan are ANDed together.
    pub fn scan<T: CacheTable>(&self) -> Scan<'_, T> {
        Scan::new(T::table(self))
    }

    pub fn len<T: CacheTable>(&self) -> usize {
        T::table(self).len()
    }

    pub fn item(&self, id: i64) -> Option<&Item> {
        self.items.get(&id)
    }

    pub fn project(&self, id: i64) -> Option<&Project> {
        self.projects.get(&id)
    }

    pub fn label(&self, id: i64) -> Option<&Label> {
        self.labels.get(&id)
    }

    pub fn note(&self, id: i64) -> Option<&Note> {
        self.notes.get(&id)
    }

    pub fn label_by_name(&self, name: &str) -> Option<&Label> {
        self.labels.values().find(|label| label.name == name)
    }

    pub(crate) fn set_sync_token(&mut self, token: String) {
        self.sync_token = token;
    }

    /// Inserts or wholesale-replaces each entity by id. Returns how many
    /// entities were written.
    pub(crate) fn upsert_all<T: CacheTable>(&mut self, entities: Vec<T>) -> usize {
        let table = T::table_mut(self);
        let count = entities.len();
        for entity in entities {
            table.insert(entity.id(), entity);
        }
        count
    }
}
