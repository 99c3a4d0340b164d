use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use dukkan_core::{DomainError, DomainResult, Entity, EntityId, OwnerId, Tombstone};
use dukkan_inventory::ProductId;

/// Maximum attachments per order.
pub const MAX_ATTACHMENTS: usize = 5;

/// Order identifier (owner-scoped via the store).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub EntityId);

impl OrderId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for OrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Order status lifecycle.
///
/// Permitted transitions: Pending -> Completed, Pending -> Cancelled,
/// Completed -> Pending (reopen), Cancelled -> Pending (revive). A cancelled
/// order cannot jump straight to completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Completed) | (Pending, Cancelled) | (Completed, Pending) | (Cancelled, Pending)
        )
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One requested line in an order draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftLine {
    pub product_id: ProductId,
    pub quantity: u64,
}

/// What a customer order looks like before validation and pricing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    pub customer_name: String,
    pub phone: String,
    pub shipping_location: String,
    pub deadline: Option<NaiveDate>,
    pub lines: Vec<DraftLine>,
    pub notes: Option<String>,
    pub attachments: Vec<String>,
}

impl OrderDraft {
    /// Structural validation only; stock and product existence are checked
    /// against live inventory by the workflow.
    pub fn validate(&self) -> DomainResult<()> {
        if self.customer_name.trim().is_empty() {
            return Err(DomainError::validation("customer name cannot be empty"));
        }
        if self.phone.trim().is_empty() {
            return Err(DomainError::validation("phone cannot be empty"));
        }
        if self.shipping_location.trim().is_empty() {
            return Err(DomainError::validation("shipping location cannot be empty"));
        }
        if self.lines.is_empty() {
            return Err(DomainError::validation("order must have at least one line"));
        }
        if self.lines.iter().any(|l| l.quantity == 0) {
            return Err(DomainError::validation("line quantity must be positive"));
        }
        if self.attachments.len() > MAX_ATTACHMENTS {
            return Err(DomainError::validation(format!(
                "at most {MAX_ATTACHMENTS} attachments allowed"
            )));
        }

        // One line per product keeps reservation all-or-nothing per product.
        for (i, line) in self.lines.iter().enumerate() {
            if self.lines[..i].iter().any(|l| l.product_id == line.product_id) {
                return Err(DomainError::validation(
                    "duplicate product in order lines; merge quantities",
                ));
            }
        }

        Ok(())
    }
}

/// A priced order line. `unit_price` and `product_name` are snapshots taken
/// at placement time and never recomputed from live products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u64,
    /// Price in smallest currency unit at order time.
    pub unit_price: u64,
}

impl LineItem {
    pub fn line_total(&self) -> DomainResult<u64> {
        self.quantity
            .checked_mul(self.unit_price)
            .ok_or_else(|| DomainError::validation("order line total overflow"))
    }
}

/// Sum all line totals with overflow checking.
pub fn total_of(items: &[LineItem]) -> DomainResult<u64> {
    items.iter().try_fold(0u64, |acc, item| {
        acc.checked_add(item.line_total()?)
            .ok_or_else(|| DomainError::validation("order total overflow"))
    })
}

/// A placed customer order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    owner: OwnerId,
    customer_name: String,
    phone: String,
    shipping_location: String,
    deadline: Option<NaiveDate>,
    line_items: Vec<LineItem>,
    /// Fixed at placement; never recomputed from live product prices.
    total_amount: u64,
    status: OrderStatus,
    notes: Option<String>,
    attachments: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted: bool,
}

impl Order {
    /// Build a pending order from an already-validated draft and priced lines.
    pub fn new(
        id: OrderId,
        owner: OwnerId,
        draft: OrderDraft,
        line_items: Vec<LineItem>,
        total_amount: u64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner,
            customer_name: draft.customer_name,
            phone: draft.phone,
            shipping_location: draft.shipping_location,
            deadline: draft.deadline,
            line_items,
            total_amount,
            status: OrderStatus::Pending,
            notes: draft.notes,
            attachments: draft.attachments,
            created_at: now,
            updated_at: now,
            deleted: false,
        }
    }

    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn shipping_location(&self) -> &str {
        &self.shipping_location
    }

    pub fn deadline(&self) -> Option<NaiveDate> {
        self.deadline
    }

    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    pub fn total_amount(&self) -> u64 {
        self.total_amount
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn attachments(&self) -> &[String] {
        &self.attachments
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Move the order through its status machine. Tombstoned orders accept
    /// no transitions.
    pub fn transition(&mut self, next: OrderStatus, now: DateTime<Utc>) -> DomainResult<()> {
        if self.deleted {
            return Err(DomainError::not_found());
        }
        if !self.status.can_transition_to(next) {
            return Err(DomainError::invalid_transition(
                self.status.as_str(),
                next.as_str(),
            ));
        }
        self.status = next;
        self.updated_at = now;
        Ok(())
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn owner(&self) -> OwnerId {
        self.owner
    }
}

impl Tombstone for Order {
    fn is_deleted(&self) -> bool {
        self.deleted
    }

    fn set_deleted(&mut self, deleted: bool) {
        self.deleted = deleted;
    }
}
