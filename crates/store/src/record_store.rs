use thiserror::Error;

use dukkan_core::{DomainError, DomainResult, OwnerId};
use std::sync::Arc;

/// Store operation error.
///
/// These are **infrastructure errors** (reachability, write conflicts) as
/// opposed to domain errors (validation, invariants).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backing store could not be reached or its state is unusable.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A write conflicted with existing data (e.g. duplicate key).
    #[error("store conflict: {0}")]
    Conflict(String),
}

impl From<StoreError> for DomainError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Unavailable(msg) => DomainError::Storage(msg),
            StoreError::Conflict(msg) => DomainError::Conflict(msg),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Result of a conditional update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome<V> {
    /// The guard accepted the mutation; the updated record is returned.
    Updated(V),
    /// No record exists under this owner and key.
    Missing,
    /// The guard rejected the mutation; the record is untouched.
    Rejected(DomainError),
}

/// Owner-isolated record store.
///
/// Every method is scoped by `OwnerId`; a wrong owner behaves exactly like a
/// missing key, so callers learn nothing about other accounts' records.
///
/// `update_with` is the conditional-write primitive: the closure runs while
/// the store holds write exclusion for the record, so a guard such as
/// "decrement stock only if enough remains" cannot interleave with another
/// writer between its read and its write. If the closure returns `Err`, the
/// record is left exactly as it was and the error is surfaced as
/// `UpdateOutcome::Rejected`.
pub trait RecordStore<K, V>: Send + Sync {
    /// Insert a new record. Fails with `StoreError::Conflict` if the key is
    /// already present for this owner.
    fn insert(&self, owner: OwnerId, key: K, value: V) -> StoreResult<()>;

    /// Fetch one record.
    fn get(&self, owner: OwnerId, key: &K) -> StoreResult<Option<V>>;

    /// List all records for an owner (unordered; callers sort).
    fn list(&self, owner: OwnerId) -> StoreResult<Vec<V>>;

    /// Conditionally mutate one record under write exclusion.
    fn update_with<F>(&self, owner: OwnerId, key: &K, apply: F) -> StoreResult<UpdateOutcome<V>>
    where
        F: FnOnce(&mut V) -> DomainResult<()>;

    /// Physically remove one record. Returns whether a record was removed.
    fn remove(&self, owner: OwnerId, key: &K) -> StoreResult<bool>;
}

impl<K, V, S> RecordStore<K, V> for Arc<S>
where
    S: RecordStore<K, V> + ?Sized,
{
    fn insert(&self, owner: OwnerId, key: K, value: V) -> StoreResult<()> {
        (**self).insert(owner, key, value)
    }

    fn get(&self, owner: OwnerId, key: &K) -> StoreResult<Option<V>> {
        (**self).get(owner, key)
    }

    fn list(&self, owner: OwnerId) -> StoreResult<Vec<V>> {
        (**self).list(owner)
    }

    fn update_with<F>(&self, owner: OwnerId, key: &K, apply: F) -> StoreResult<UpdateOutcome<V>>
    where
        F: FnOnce(&mut V) -> DomainResult<()>,
    {
        (**self).update_with(owner, key, apply)
    }

    fn remove(&self, owner: OwnerId, key: &K) -> StoreResult<bool> {
        (**self).remove(owner, key)
    }
}
