use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dukkan_core::{DomainError, DomainResult, Entity, EntityId, OwnerId, Tombstone};

/// Product identifier (owner-scoped via the store).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub EntityId);

impl ProductId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Kind of stocked item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    /// Finished goods offered for sale; must carry a photo.
    ReadyProduct,
    /// Materials consumed in production; no photo, may carry unit/supplier.
    RawMaterial,
}

/// Fields for creating a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub kind: ProductKind,
    /// Price in smallest currency unit.
    pub unit_price: u64,
    pub stock_quantity: u64,
    pub photo_reference: Option<String>,
    pub description: Option<String>,
    /// Measurement unit for raw materials (e.g. "meter", "piece").
    pub unit: Option<String>,
    pub supplier: Option<String>,
}

/// Partial update for a product. `None` fields are left unchanged.
///
/// Kind is fixed at creation; changing a ready product into a raw material
/// (or back) is a delete-and-recreate, not an edit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub unit_price: Option<u64>,
    pub stock_quantity: Option<u64>,
    pub photo_reference: Option<String>,
    pub description: Option<String>,
    pub unit: Option<String>,
    pub supplier: Option<String>,
}

/// A stocked item: ready product or raw material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    owner: OwnerId,
    name: String,
    kind: ProductKind,
    unit_price: u64,
    stock_quantity: u64,
    photo_reference: Option<String>,
    description: Option<String>,
    unit: Option<String>,
    supplier: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted: bool,
}

impl Product {
    /// Validate and build a new product.
    pub fn new(
        id: ProductId,
        owner: OwnerId,
        fields: NewProduct,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if fields.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if fields.kind == ProductKind::ReadyProduct && fields.photo_reference.is_none() {
            return Err(DomainError::validation(
                "ready products must carry a photo reference",
            ));
        }

        Ok(Self {
            id,
            owner,
            name: fields.name,
            kind: fields.kind,
            unit_price: fields.unit_price,
            stock_quantity: fields.stock_quantity,
            photo_reference: fields.photo_reference,
            description: fields.description,
            unit: fields.unit,
            supplier: fields.supplier,
            created_at: now,
            updated_at: now,
            deleted: false,
        })
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ProductKind {
        self.kind
    }

    pub fn unit_price(&self) -> u64 {
        self.unit_price
    }

    pub fn stock_quantity(&self) -> u64 {
        self.stock_quantity
    }

    pub fn photo_reference(&self) -> Option<&str> {
        self.photo_reference.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    pub fn supplier(&self) -> Option<&str> {
        self.supplier.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Apply a partial edit. Tombstoned products cannot be edited.
    pub fn apply_patch(&mut self, patch: ProductPatch, now: DateTime<Utc>) -> DomainResult<()> {
        if self.deleted {
            return Err(DomainError::not_found());
        }

        if let Some(name) = &patch.name {
            if name.trim().is_empty() {
                return Err(DomainError::validation("name cannot be empty"));
            }
        }

        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(price) = patch.unit_price {
            self.unit_price = price;
        }
        if let Some(stock) = patch.stock_quantity {
            self.stock_quantity = stock;
        }
        if let Some(photo) = patch.photo_reference {
            self.photo_reference = Some(photo);
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(unit) = patch.unit {
            self.unit = Some(unit);
        }
        if let Some(supplier) = patch.supplier {
            self.supplier = Some(supplier);
        }

        self.updated_at = now;
        Ok(())
    }

    /// Shift stock by a signed delta. Stock never goes negative.
    pub fn adjust_stock(&mut self, delta: i64, now: DateTime<Utc>) -> DomainResult<()> {
        if self.deleted {
            return Err(DomainError::not_found());
        }

        if delta < 0 {
            let decrement = delta.unsigned_abs();
            if decrement > self.stock_quantity {
                return Err(DomainError::insufficient_stock(
                    decrement,
                    self.stock_quantity,
                ));
            }
            self.stock_quantity -= decrement;
        } else {
            self.stock_quantity = self
                .stock_quantity
                .checked_add(delta as u64)
                .ok_or_else(|| DomainError::validation("stock quantity overflow"))?;
        }

        self.updated_at = now;
        Ok(())
    }

    /// Take `quantity` out of stock for an order line, failing the whole
    /// reservation if less than `quantity` remains.
    pub fn reserve(&mut self, quantity: u64, now: DateTime<Utc>) -> DomainResult<()> {
        if self.deleted {
            return Err(DomainError::not_found());
        }
        if quantity > self.stock_quantity {
            return Err(DomainError::insufficient_stock(
                quantity,
                self.stock_quantity,
            ));
        }
        self.stock_quantity -= quantity;
        self.updated_at = now;
        Ok(())
    }

    /// Return previously reserved stock (compensation path).
    pub fn release(&mut self, quantity: u64, now: DateTime<Utc>) {
        self.stock_quantity = self.stock_quantity.saturating_add(quantity);
        self.updated_at = now;
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn owner(&self) -> OwnerId {
        self.owner
    }
}

impl Tombstone for Product {
    fn is_deleted(&self) -> bool {
        self.deleted
    }

    fn set_deleted(&mut self, deleted: bool) {
        self.deleted = deleted;
    }
}
