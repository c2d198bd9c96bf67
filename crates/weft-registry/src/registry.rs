//! Thenable adapter registry

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace};

use weft_core::{BridgeError, BridgeResult, ObjectRef, Value};
use weft_future::Thenable;

use crate::{RecognitionCache, ThenableAdapter, TypeDescriptor};

/// One registration: descriptor and the adapter serving it
#[derive(Clone)]
pub struct AdapterEntry {
    pub descriptor: TypeDescriptor,
    pub adapter: Arc<dyn ThenableAdapter>,
}

/// Registry counters
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegistryStats {
    pub registrations: u64,
    /// Full scans of the registration list
    pub scans: u64,
    pub cache_hits: u64,
    pub conversions: u64,
}

/// Ordered type-to-adapter table with a recognition cache
///
/// Registration is expected to finish during setup, before recognition
/// starts. Matching is first-registered-wins, not most-specific-wins.
#[derive(Default)]
pub struct ThenableAdapterRegistry {
    entries: RwLock<Vec<AdapterEntry>>,
    cache: Mutex<RecognitionCache>,
    stats: Mutex<RegistryStats>,
}

impl ThenableAdapterRegistry {
    pub fn new() -> Self {
        ThenableAdapterRegistry {
            entries: RwLock::new(Vec::new()),
            cache: Mutex::new(RecognitionCache::new()),
            stats: Mutex::new(RegistryStats::default()),
        }
    }

    /// Append an adapter; duplicate descriptors are kept, earlier ones win
    pub fn register<A>(&self, descriptor: TypeDescriptor, adapter: A)
    where
        A: ThenableAdapter + 'static,
    {
        self.register_arc(descriptor, Arc::new(adapter));
    }

    pub fn register_arc(&self, descriptor: TypeDescriptor, adapter: Arc<dyn ThenableAdapter>) {
        let mut entries = self.entries.write();
        debug!(descriptor = ?descriptor, slot = entries.len(), "registering thenable adapter");
        entries.push(AdapterEntry {
            descriptor,
            adapter,
        });
        self.stats.lock().registrations += 1;
    }

    /// Is `candidate` an object some registered adapter accepts?
    pub fn can_convert(&self, candidate: &Value) -> bool {
        match candidate.as_object() {
            Some(object) => self.can_convert_object(object),
            None => false,
        }
    }

    pub fn can_convert_object(&self, candidate: &ObjectRef) -> bool {
        if self.cache.lock().get(candidate).is_some() {
            self.stats.lock().cache_hits += 1;
            trace!(object = ?candidate.identity(), "recognition cache hit");
            return true;
        }

        let Some((slot, adapter)) = self.find_adapter(candidate) else {
            trace!(type_name = candidate.type_name(), "no adapter matches");
            return false;
        };

        trace!(type_name = candidate.type_name(), slot, "caching matched adapter");
        self.cache.lock().insert(candidate, adapter, slot);
        true
    }

    /// First registration the candidate satisfies, in registration order
    fn find_adapter(&self, candidate: &ObjectRef) -> Option<(usize, Arc<dyn ThenableAdapter>)> {
        self.stats.lock().scans += 1;

        self.entries
            .read()
            .iter()
            .enumerate()
            .find(|(_, entry)| entry.descriptor.matches(candidate))
            .map(|(slot, entry)| (slot, Arc::clone(&entry.adapter)))
    }

    /// Convert a candidate previously accepted by `can_convert`
    ///
    /// Calling this without a prior successful `can_convert` is a caller bug.
    pub fn convert_thenable(&self, candidate: &ObjectRef) -> BridgeResult<Thenable> {
        let adapter = self
            .cache
            .lock()
            .get(candidate)
            .ok_or(BridgeError::NotRecognized(candidate.type_name()))?;

        self.stats.lock().conversions += 1;
        Ok(adapter.convert(candidate))
    }

    /// Registration slot that recognized `candidate`
    pub fn matched_slot(&self, candidate: &ObjectRef) -> Option<usize> {
        self.cache.lock().slot(candidate)
    }

    pub fn descriptors(&self) -> Vec<TypeDescriptor> {
        self.entries
            .read()
            .iter()
            .map(|entry| entry.descriptor.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn stats(&self) -> RegistryStats {
        self.stats.lock().clone()
    }

    pub fn cached(&self) -> usize {
        self.cache.lock().len()
    }

    /// Drop cache entries for objects that are gone
    pub fn purge(&self) -> usize {
        self.cache.lock().purge()
    }

    /// End of an execution scope: forget every recognition
    pub fn clear_cache(&self) {
        self.cache.lock().clear();
    }
}
