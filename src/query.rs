use std::collections::BTreeMap;

use crate::domain::{Entity, Item, Label, Note, Project};

type Predicate<'a, T> = Box<dyn Fn(&T) -> bool + 'a>;

/// Linear scan over one entity table. Predicates are ANDed; predicates that
/// take several values accept an entity matching any of them.
///
/// Entities flagged as deleted are skipped unless [`Scan::include_deleted`]
/// is called.
pub struct Scan<'a, T> {
    table: &'a BTreeMap<i64, T>,
    predicates: Vec<Predicate<'a, T>>,
    include_deleted: bool,
}

impl<'a, T: Entity> Scan<'a, T> {
    pub(crate) fn new(table: &'a BTreeMap<i64, T>) -> Self {
        Self {
            table,
            predicates: Vec::new(),
            include_deleted: false,
        }
    }

    pub fn include_deleted(mut self) -> Self {
        self.include_deleted = true;
        self
    }

    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + 'a,
    {
        self.predicates.push(Box::new(predicate));
        self
    }

    /// Negates the most recently added predicate. No-op on a scan without
    /// predicates.
    pub fn not(mut self) -> Self {
        if let Some(last) = self.predicates.pop() {
            self.predicates.push(Box::new(move |entity| !last(entity)));
        }
        self
    }

    pub fn results(&self) -> Vec<&'a T> {
        self.table
            .values()
            .filter(|entity| self.matches(entity))
            .collect()
    }

    pub fn count(&self) -> usize {
        self.table
            .values()
            .filter(|entity| self.matches(entity))
            .count()
    }

    fn matches(&self, entity: &T) -> bool {
        if !self.include_deleted && entity.is_deleted() {
            return false;
        }
        self.predicates.iter().all(|predicate| predicate(entity))
    }
}

impl<'a> Scan<'a, Item> {
    pub fn with_project_id(self, ids: &[i64]) -> Self {
        let ids = ids.to_vec();
        self.filter(move |item| ids.contains(&item.project_id))
    }

    pub fn with_checked(self, checked: bool) -> Self {
        self.filter(move |item| item.checked == checked)
    }

    pub fn with_label(self, label: i64) -> Self {
        self.filter(move |item| item.labels.contains(&label))
    }

    pub fn with_content(self, needle: &str) -> Self {
        let needle = needle.to_string();
        self.filter(move |item| item.content.contains(&needle))
    }

    pub fn with_due(self) -> Self {
        self.filter(|item| item.due.is_some())
    }
}

impl<'a> Scan<'a, Project> {
    pub fn with_name(self, needle: &str) -> Self {
        let needle = needle.to_string();
        self.filter(move |project| project.name.contains(&needle))
    }

    pub fn with_archived(self, archived: bool) -> Self {
        self.filter(move |project| project.is_archived == archived)
    }
}

impl<'a> Scan<'a, Note> {
    pub fn with_item_id(self, ids: &[i64]) -> Self {
        let ids = ids.to_vec();
        self.filter(move |note| ids.contains(&note.item_id))
    }

    pub fn with_content(self, needle: &str) -> Self {
        let needle = needle.to_string();
        self.filter(move |note| note.content.contains(&needle))
    }
}

impl<'a> Scan<'a, Label> {
    pub fn with_name(self, needle: &str) -> Self {
        let needle = needle.to_string();
        self.filter(move |label| label.name.contains(&needle))
    }
}
