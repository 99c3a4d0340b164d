//! Inventory store service: owner-facing product operations.

use chrono::Utc;

use dukkan_core::{DomainError, DomainResult, OwnerId, Tombstone};
use dukkan_store::{RecordStore, UpdateOutcome};

use crate::product::{NewProduct, Product, ProductId, ProductKind, ProductPatch};

/// Inventory service over a product record store.
///
/// Share the store (e.g. via `Arc`) with the order workflow so both see the
/// same stock.
#[derive(Debug)]
pub struct Inventory<S> {
    store: S,
}

impl<S> Inventory<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S> Inventory<S>
where
    S: RecordStore<ProductId, Product>,
{
    pub fn add_product(&self, owner: OwnerId, fields: NewProduct) -> DomainResult<Product> {
        let now = Utc::now();
        let id = ProductId::new(dukkan_core::EntityId::new());
        let product = Product::new(id, owner, fields, now)?;

        self.store
            .insert(owner, id, product.clone())
            .map_err(DomainError::from)?;

        tracing::info!(product_id = %id, owner = %owner, "product added");
        Ok(product)
    }

    /// Fetch one active product.
    pub fn get_product(&self, owner: OwnerId, id: ProductId) -> DomainResult<Product> {
        self.store
            .get(owner, &id)
            .map_err(DomainError::from)?
            .filter(|p| !p.is_deleted())
            .ok_or_else(DomainError::not_found)
    }

    /// List active products, newest first.
    ///
    /// `kind` filters ready products vs raw materials; `search` is a
    /// case-insensitive substring match on the name.
    pub fn list_products(
        &self,
        owner: OwnerId,
        kind: Option<ProductKind>,
        search: Option<&str>,
    ) -> DomainResult<Vec<Product>> {
        let needle = search.map(str::to_lowercase);
        let mut products: Vec<Product> = self
            .store
            .list(owner)
            .map_err(DomainError::from)?
            .into_iter()
            .filter(|p| !p.is_deleted())
            .filter(|p| kind.is_none_or(|k| p.kind() == k))
            .filter(|p| {
                needle
                    .as_deref()
                    .is_none_or(|n| p.name().to_lowercase().contains(n))
            })
            .collect();

        products.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(products)
    }

    pub fn update_product(
        &self,
        owner: OwnerId,
        id: ProductId,
        patch: ProductPatch,
    ) -> DomainResult<Product> {
        let now = Utc::now();
        match self
            .store
            .update_with(owner, &id, |p| p.apply_patch(patch, now))?
        {
            UpdateOutcome::Updated(product) => Ok(product),
            UpdateOutcome::Missing => Err(DomainError::not_found()),
            UpdateOutcome::Rejected(e) => Err(e),
        }
    }

    /// Shift stock by a signed delta (manual correction, re-stock).
    pub fn adjust_stock(&self, owner: OwnerId, id: ProductId, delta: i64) -> DomainResult<Product> {
        let now = Utc::now();
        match self
            .store
            .update_with(owner, &id, |p| p.adjust_stock(delta, now))?
        {
            UpdateOutcome::Updated(product) => Ok(product),
            UpdateOutcome::Missing => Err(DomainError::not_found()),
            UpdateOutcome::Rejected(e) => Err(e),
        }
    }

    /// Tombstone a product. Stock is left as-is.
    pub fn soft_delete(&self, owner: OwnerId, id: ProductId) -> DomainResult<()> {
        match self.store.update_with(owner, &id, |p| {
            if p.is_deleted() {
                return Err(DomainError::not_found());
            }
            p.set_deleted(true);
            Ok(())
        })? {
            UpdateOutcome::Updated(_) => Ok(()),
            UpdateOutcome::Missing => Err(DomainError::not_found()),
            UpdateOutcome::Rejected(e) => Err(e),
        }
    }

    /// Clear a tombstone; the product reappears with its pre-delete fields.
    pub fn restore(&self, owner: OwnerId, id: ProductId) -> DomainResult<()> {
        match self.store.update_with(owner, &id, |p| {
            if !p.is_deleted() {
                return Err(DomainError::not_found());
            }
            p.set_deleted(false);
            Ok(())
        })? {
            UpdateOutcome::Updated(_) => Ok(()),
            UpdateOutcome::Missing => Err(DomainError::not_found()),
            UpdateOutcome::Rejected(e) => Err(e),
        }
    }

    /// Irreversibly remove an already-tombstoned product.
    pub fn purge(&self, owner: OwnerId, id: ProductId) -> DomainResult<()> {
        let existing = self
            .store
            .get(owner, &id)
            .map_err(DomainError::from)?
            .ok_or_else(DomainError::not_found)?;

        if !existing.is_deleted() {
            return Err(DomainError::conflict(
                "cannot purge an active product; delete it first",
            ));
        }

        if self.store.remove(owner, &id).map_err(DomainError::from)? {
            Ok(())
        } else {
            Err(DomainError::not_found())
        }
    }

    /// Tombstoned products, most recently touched first.
    pub fn list_trashed(&self, owner: OwnerId) -> DomainResult<Vec<Product>> {
        let mut products: Vec<Product> = self
            .store
            .list(owner)
            .map_err(DomainError::from)?
            .into_iter()
            .filter(Tombstone::is_deleted)
            .collect();

        products.sort_by(|a, b| b.updated_at().cmp(&a.updated_at()));
        Ok(products)
    }
}
