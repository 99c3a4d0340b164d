//! `dukkan-trash` — the unified trash view over tombstoned records.
//!
//! Products, orders, and transactions each tombstone through their own
//! service; this crate surfaces all of them per owner, grouped by entity
//! kind, and dispatches restore/purge requests coming from a single trash
//! surface. Every record follows the same lifecycle:
//! `Active --delete--> Tombstoned --restore--> Active`,
//! `Tombstoned --purge--> Gone`.

pub mod bin;

pub use bin::{TrashBin, TrashKind, TrashListing};
