use crate::models::{TopicEntry, TopicKey};
use std::collections::HashMap;

/// Storage for tracked topics: TopicKey -> TopicEntry.
///
/// Iteration follows insertion order. Nothing here sorts or filters; display
/// order is built by `store::views`.
#[derive(Debug, Default)]
pub struct TopicIndex {
    entries: HashMap<TopicKey, TopicEntry>,
    insertion_order: Vec<TopicKey>,
}

impl TopicIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session reset
    pub fn clear(&mut self) {
        self.entries.clear();
        self.insertion_order.clear();
    }

    // ===== Getters =====

    pub fn get_entry(&self, key: &TopicKey) -> Option<&TopicEntry> {
        self.entries.get(key)
    }

    pub(crate) fn get_entry_mut(&mut self, key: &TopicKey) -> Option<&mut TopicEntry> {
        self.entries.get_mut(key)
    }

    pub fn contains(&self, key: &TopicKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All tracked topics in insertion order.
    pub fn all_entries(&self) -> impl Iterator<Item = (&TopicKey, &TopicEntry)> {
        self.insertion_order
            .iter()
            .filter_map(|key| self.entries.get_key_value(key))
    }

    // ===== Mutations =====

    /// Insert a new entry. An existing entry for the same key is replaced in place
    /// and keeps its position.
    pub(crate) fn insert(&mut self, key: TopicKey, entry: TopicEntry) {
        if self.entries.insert(key.clone(), entry).is_none() {
            self.insertion_order.push(key);
        }
    }

    pub fn delete(&mut self, key: &TopicKey) -> Option<TopicEntry> {
        let removed = self.entries.remove(key)?;
        self.insertion_order.retain(|k| k != key);
        Some(removed)
    }
}
