use serde::{Deserialize, Serialize};

use dukkan_core::{DomainError, DomainResult, EntityId, OwnerId, Tombstone};
use dukkan_inventory::{Product, ProductId};
use dukkan_ledger::{Transaction, TransactionId};
use dukkan_orders::{Order, OrderId};
use dukkan_store::{RecordStore, UpdateOutcome};

/// Which entity type a trash entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrashKind {
    Product,
    Order,
    Transaction,
}

/// Per-owner trash contents, grouped by entity kind.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrashListing {
    pub products: Vec<Product>,
    pub orders: Vec<Order>,
    pub transactions: Vec<Transaction>,
}

impl TrashListing {
    pub fn is_empty(&self) -> bool {
        self.products.is_empty() && self.orders.is_empty() && self.transactions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.products.len() + self.orders.len() + self.transactions.len()
    }
}

/// Unified trash surface over the three entity stores.
///
/// Holds the same stores the services use (share them via `Arc`), so a
/// record deleted through any service is immediately visible here.
#[derive(Debug)]
pub struct TrashBin<PS, OS, TS> {
    products: PS,
    orders: OS,
    transactions: TS,
}

impl<PS, OS, TS> TrashBin<PS, OS, TS> {
    pub fn new(products: PS, orders: OS, transactions: TS) -> Self {
        Self {
            products,
            orders,
            transactions,
        }
    }
}

impl<PS, OS, TS> TrashBin<PS, OS, TS>
where
    PS: RecordStore<ProductId, Product>,
    OS: RecordStore<OrderId, Order>,
    TS: RecordStore<TransactionId, Transaction>,
{
    /// Everything the owner has deleted, per entity kind.
    pub fn list(&self, owner: OwnerId) -> DomainResult<TrashListing> {
        Ok(TrashListing {
            products: trashed_of(&self.products, owner)?,
            orders: trashed_of(&self.orders, owner)?,
            transactions: trashed_of(&self.transactions, owner)?,
        })
    }

    /// Tombstoned entries of one kind only.
    pub fn list_kind(&self, owner: OwnerId, kind: TrashKind) -> DomainResult<TrashListing> {
        let mut listing = TrashListing::default();
        match kind {
            TrashKind::Product => listing.products = trashed_of(&self.products, owner)?,
            TrashKind::Order => listing.orders = trashed_of(&self.orders, owner)?,
            TrashKind::Transaction => {
                listing.transactions = trashed_of(&self.transactions, owner)?
            }
        }
        Ok(listing)
    }

    /// Bring a tombstoned record back to its active, pre-delete state.
    pub fn restore(&self, owner: OwnerId, kind: TrashKind, id: EntityId) -> DomainResult<()> {
        match kind {
            TrashKind::Product => restore_record(&self.products, owner, &ProductId::new(id)),
            TrashKind::Order => restore_record(&self.orders, owner, &OrderId::new(id)),
            TrashKind::Transaction => {
                restore_record(&self.transactions, owner, &TransactionId::new(id))
            }
        }
    }

    /// Permanently remove an already-tombstoned record.
    pub fn purge(&self, owner: OwnerId, kind: TrashKind, id: EntityId) -> DomainResult<()> {
        match kind {
            TrashKind::Product => purge_record(&self.products, owner, &ProductId::new(id)),
            TrashKind::Order => purge_record(&self.orders, owner, &OrderId::new(id)),
            TrashKind::Transaction => {
                purge_record(&self.transactions, owner, &TransactionId::new(id))
            }
        }
    }
}

fn trashed_of<K, V, S>(store: &S, owner: OwnerId) -> DomainResult<Vec<V>>
where
    S: RecordStore<K, V>,
    V: Tombstone,
{
    Ok(store
        .list(owner)
        .map_err(DomainError::from)?
        .into_iter()
        .filter(Tombstone::is_deleted)
        .collect())
}

fn restore_record<K, V, S>(store: &S, owner: OwnerId, key: &K) -> DomainResult<()>
where
    S: RecordStore<K, V>,
    V: Tombstone,
{
    match store.update_with(owner, key, |v| {
        if !v.is_deleted() {
            return Err(DomainError::not_found());
        }
        v.set_deleted(false);
        Ok(())
    })? {
        UpdateOutcome::Updated(_) => Ok(()),
        UpdateOutcome::Missing => Err(DomainError::not_found()),
        UpdateOutcome::Rejected(e) => Err(e),
    }
}

fn purge_record<K, V, S>(store: &S, owner: OwnerId, key: &K) -> DomainResult<()>
where
    S: RecordStore<K, V>,
    V: Tombstone,
{
    let existing = store
        .get(owner, key)
        .map_err(DomainError::from)?
        .ok_or_else(DomainError::not_found)?;

    if !existing.is_deleted() {
        return Err(DomainError::conflict(
            "cannot purge an active record; delete it first",
        ));
    }

    if store.remove(owner, key).map_err(DomainError::from)? {
        Ok(())
    } else {
        Err(DomainError::not_found())
    }
}
