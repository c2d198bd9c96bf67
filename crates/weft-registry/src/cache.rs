//! Identity-keyed recognition cache

use std::collections::HashMap;
use std::sync::Arc;

use weft_core::{ObjectId, ObjectRef, WeakObjectRef};

use crate::ThenableAdapter;

/// Entry count that triggers the first sweep of dead entries
const MIN_HIGH_WATER: usize = 64;

struct CacheEntry {
    /// Non-owning; pins the allocation so the id cannot be reused while cached
    object: WeakObjectRef,
    adapter: Arc<dyn ThenableAdapter>,
    /// Registration slot of the matching adapter
    slot: usize,
}

/// Maps candidate identity to the adapter that first matched it
///
/// Entries never keep their candidate alive. Entries whose candidate is gone
/// are swept on insert once the map outgrows its high-water mark, so the
/// cache stays proportional to the live candidates. `purge` and `clear`
/// drop them eagerly.
pub struct RecognitionCache {
    entries: HashMap<ObjectId, CacheEntry>,
    high_water: usize,
}

impl Default for RecognitionCache {
    fn default() -> Self {
        Self::new()
    }
}

impl RecognitionCache {
    pub fn new() -> Self {
        RecognitionCache {
            entries: HashMap::new(),
            high_water: MIN_HIGH_WATER,
        }
    }

    /// Adapter cached for `candidate`
    pub fn get(&self, candidate: &ObjectRef) -> Option<Arc<dyn ThenableAdapter>> {
        self.entries
            .get(&candidate.identity())
            .map(|entry| Arc::clone(&entry.adapter))
    }

    /// Registration slot cached for `candidate`
    pub fn slot(&self, candidate: &ObjectRef) -> Option<usize> {
        self.entries
            .get(&candidate.identity())
            .map(|entry| entry.slot)
    }

    pub fn insert(&mut self, candidate: &ObjectRef, adapter: Arc<dyn ThenableAdapter>, slot: usize) {
        if self.entries.len() >= self.high_water {
            self.purge();
            self.high_water = MIN_HIGH_WATER.max(self.entries.len() * 2);
        }

        self.entries.insert(
            candidate.identity(),
            CacheEntry {
                object: candidate.downgrade(),
                adapter,
                slot,
            },
        );
    }

    /// Drop entries whose object is gone; returns how many were removed
    pub fn purge(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.object.is_alive());
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.high_water = MIN_HIGH_WATER;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
