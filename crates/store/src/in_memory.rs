//! In-memory record store for tests/dev.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::RwLock;

use dukkan_core::{DomainResult, OwnerId};

use crate::record_store::{RecordStore, StoreError, StoreResult, UpdateOutcome};

/// In-memory owner-isolated store.
///
/// Intended for tests/dev. Not optimized for performance. Write exclusion is
/// a single `RwLock`, which makes `update_with` atomic with respect to every
/// other writer.
#[derive(Debug)]
pub struct InMemoryRecordStore<K, V> {
    inner: RwLock<HashMap<(OwnerId, K), V>>,
}

impl<K, V> InMemoryRecordStore<K, V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> Default for InMemoryRecordStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("lock poisoned".to_string())
}

impl<K, V> RecordStore<K, V> for InMemoryRecordStore<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn insert(&self, owner: OwnerId, key: K, value: V) -> StoreResult<()> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        let slot = (owner, key);
        if map.contains_key(&slot) {
            return Err(StoreError::Conflict("record already exists".to_string()));
        }
        map.insert(slot, value);
        Ok(())
    }

    fn get(&self, owner: OwnerId, key: &K) -> StoreResult<Option<V>> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(&(owner, key.clone())).cloned())
    }

    fn list(&self, owner: OwnerId) -> StoreResult<Vec<V>> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map
            .iter()
            .filter_map(|((o, _k), v)| if *o == owner { Some(v.clone()) } else { None })
            .collect())
    }

    fn update_with<F>(&self, owner: OwnerId, key: &K, apply: F) -> StoreResult<UpdateOutcome<V>>
    where
        F: FnOnce(&mut V) -> DomainResult<()>,
    {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        let Some(existing) = map.get_mut(&(owner, key.clone())) else {
            return Ok(UpdateOutcome::Missing);
        };

        // Mutate a working copy; commit only if the guard accepts.
        let mut candidate = existing.clone();
        match apply(&mut candidate) {
            Ok(()) => {
                *existing = candidate.clone();
                Ok(UpdateOutcome::Updated(candidate))
            }
            Err(e) => Ok(UpdateOutcome::Rejected(e)),
        }
    }

    fn remove(&self, owner: OwnerId, key: &K) -> StoreResult<bool> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        Ok(map.remove(&(owner, key.clone())).is_some())
    }
}
