//! Per-origin property buckets with an explicitly recomputed output value

use crate::cascade::StyleOrigin;
use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

#[derive(Debug, Clone)]
struct Slot<V> {
    buckets: [Option<V>; StyleOrigin::COUNT],
    output: Option<V>,
}

impl<V> Default for Slot<V> {
    fn default() -> Self {
        Self {
            buckets: std::array::from_fn(|_| None),
            output: None,
        }
    }
}

/// Property values of one element, kept separately for every origin.
///
/// Writing a bucket recomputes the merged output of that key only; keys whose
/// output changed are queued until the caller drains them.
#[derive(Debug, Clone)]
pub struct PropertyStore<V, K = String> {
    slots: HashMap<K, Slot<V>>,
    dirty: VecDeque<K>,
}

impl<V: Clone + PartialEq, K: Clone + Eq + Hash> PropertyStore<V, K> {
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
            dirty: VecDeque::new(),
        }
    }

    /// Sets (or with `None`, clears) one origin's value for `key`.
    ///
    /// Returns true when the merged output changed.
    pub fn set(&mut self, origin: StyleOrigin, key: K, value: Option<V>) -> bool {
        if value.is_none() && !self.slots.contains_key(&key) {
            return false;
        }

        let slot = self.slots.entry(key.clone()).or_default();
        slot.buckets[origin.index()] = value;

        let output = slot.buckets.iter().rev().find_map(|v| v.clone());
        let changed = output != slot.output;
        slot.output = output;

        if slot.buckets.iter().all(Option::is_none) {
            self.slots.remove(&key);
        }
        if changed && !self.dirty.contains(&key) {
            self.dirty.push_back(key);
        }
        changed
    }

    pub fn get(&self, origin: StyleOrigin, key: &K) -> Option<&V> {
        self.slots.get(key)?.buckets[origin.index()].as_ref()
    }

    /// The value of the highest-precedence origin that has one.
    pub fn output(&self, key: &K) -> Option<&V> {
        self.slots.get(key)?.output.as_ref()
    }

    /// Keys that currently hold a value in `origin`'s bucket.
    pub fn keys(&self, origin: StyleOrigin) -> Vec<K> {
        self.slots
            .iter()
            .filter(|(_, slot)| slot.buckets[origin.index()].is_some())
            .map(|(key, _)| key.clone())
            .collect()
    }

    pub fn clear_origin(&mut self, origin: StyleOrigin) {
        for key in self.keys(origin) {
            self.set(origin, key, None);
        }
    }

    /// Takes the keys whose output changed, in the order they first changed.
    pub fn drain_dirty(&mut self) -> Vec<K> {
        self.dirty.drain(..).collect()
    }

    pub fn has_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl<V: Clone + PartialEq, K: Clone + Eq + Hash> Default for PropertyStore<V, K> {
    fn default() -> Self {
        Self::new()
    }
}
