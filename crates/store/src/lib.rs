//! `dukkan-store` — owner-scoped record storage abstraction.
//!
//! The hosted data store behind the application is modelled as a key/value
//! record store scoped by owning account. The trait deliberately mirrors the
//! remote CRUD surface (insert-one, select-many, update-one, delete-one) and
//! adds the one primitive CRUD alone cannot express safely: a conditional
//! update that runs its guard and mutation under the store's write exclusion.

pub mod in_memory;
pub mod record_store;

pub use in_memory::InMemoryRecordStore;
pub use record_store::{RecordStore, StoreError, StoreResult, UpdateOutcome};
