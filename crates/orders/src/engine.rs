//! Order placement workflow.
//!
//! The engine is the only component coordinating more than one entity: it
//! validates a draft against live inventory, snapshots prices, reserves
//! stock, persists the order, and emits the outbound notification.
//!
//! Reservation and persistence succeed or fail together. Stock is taken line
//! by line through the store's conditional update; if any line fails (or the
//! order insert itself fails), every decrement already applied is returned
//! before the error surfaces, so a failed placement leaves stock and orders
//! exactly as they were. Notification delivery happens only after the order
//! is durably written and never rolls it back.

use chrono::{SecondsFormat, Utc};

use dukkan_core::{DomainError, DomainResult, EntityId, OwnerId, Tombstone};
use dukkan_inventory::{Product, ProductId};
use dukkan_notify::{NotificationLine, NotificationOutcome, NotificationSink, OrderNotification};
use dukkan_store::{RecordStore, UpdateOutcome};

use crate::order::{total_of, LineItem, Order, OrderDraft, OrderId, OrderStatus};

/// Result of a successful placement: the persisted order plus what happened
/// to its notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderPlacement {
    pub order: Order,
    pub notification: NotificationOutcome,
}

/// Order workflow over a product store, an order store, and a notification
/// sink. Share the product store with `Inventory` so both see the same stock.
#[derive(Debug)]
pub struct OrderEngine<P, O, N> {
    products: P,
    orders: O,
    sink: N,
}

impl<P, O, N> OrderEngine<P, O, N> {
    pub fn new(products: P, orders: O, sink: N) -> Self {
        Self {
            products,
            orders,
            sink,
        }
    }
}

impl<P, O, N> OrderEngine<P, O, N>
where
    P: RecordStore<ProductId, Product>,
    O: RecordStore<OrderId, Order>,
    N: NotificationSink,
{
    /// Place an order: all-or-nothing across every line.
    pub fn place_order(&self, owner: OwnerId, draft: OrderDraft) -> DomainResult<OrderPlacement> {
        draft.validate()?;
        let now = Utc::now();

        // Resolve every line against live inventory before touching stock,
        // so an order that cannot fully succeed mutates nothing.
        let mut line_items = Vec::with_capacity(draft.lines.len());
        for line in &draft.lines {
            let product = self
                .products
                .get(owner, &line.product_id)
                .map_err(DomainError::from)?
                .filter(|p| !p.is_deleted())
                .ok_or_else(DomainError::not_found)?;

            if line.quantity > product.stock_quantity() {
                return Err(DomainError::insufficient_stock(
                    line.quantity,
                    product.stock_quantity(),
                ));
            }

            line_items.push(LineItem {
                product_id: line.product_id,
                product_name: product.name().to_string(),
                quantity: line.quantity,
                unit_price: product.unit_price(),
            });
        }
        let total_amount = total_of(&line_items)?;

        // Reserve stock line by line via conditional updates. The pre-check
        // above does not hold any lock, so each decrement re-checks under
        // write exclusion; a concurrent placement loses cleanly here.
        let mut reserved: Vec<(ProductId, u64)> = Vec::new();
        for item in &line_items {
            let outcome = self
                .products
                .update_with(owner, &item.product_id, |p| p.reserve(item.quantity, now));

            match outcome {
                Ok(UpdateOutcome::Updated(_)) => reserved.push((item.product_id, item.quantity)),
                Ok(UpdateOutcome::Missing) => {
                    self.release_reserved(owner, &reserved);
                    return Err(DomainError::not_found());
                }
                Ok(UpdateOutcome::Rejected(e)) => {
                    self.release_reserved(owner, &reserved);
                    return Err(e);
                }
                Err(e) => {
                    self.release_reserved(owner, &reserved);
                    return Err(e.into());
                }
            }
        }

        let order = Order::new(
            OrderId::new(EntityId::new()),
            owner,
            draft,
            line_items,
            total_amount,
            now,
        );

        if let Err(e) = self.orders.insert(owner, order.id_typed(), order.clone()) {
            self.release_reserved(owner, &reserved);
            return Err(e.into());
        }

        tracing::info!(
            order_id = %order.id_typed(),
            owner = %owner,
            total = order.total_amount(),
            lines = order.line_items().len(),
            "order placed"
        );

        let notification = self.notify(&order);
        Ok(OrderPlacement { order, notification })
    }

    /// Move an order through its status machine.
    ///
    /// Cancellation does not return reserved stock; re-stock explicitly via
    /// the inventory service if the goods come back.
    pub fn update_status(
        &self,
        owner: OwnerId,
        id: OrderId,
        next: OrderStatus,
    ) -> DomainResult<Order> {
        let now = Utc::now();
        match self.orders.update_with(owner, &id, |o| o.transition(next, now))? {
            UpdateOutcome::Updated(order) => Ok(order),
            UpdateOutcome::Missing => Err(DomainError::not_found()),
            UpdateOutcome::Rejected(e) => Err(e),
        }
    }

    /// Fetch one active order.
    pub fn get_order(&self, owner: OwnerId, id: OrderId) -> DomainResult<Order> {
        self.orders
            .get(owner, &id)
            .map_err(DomainError::from)?
            .filter(|o| !o.is_deleted())
            .ok_or_else(DomainError::not_found)
    }

    /// List active orders, newest first. `status` filters by lifecycle
    /// state; `search` matches customer name (case-insensitive) or phone.
    pub fn list_orders(
        &self,
        owner: OwnerId,
        status: Option<OrderStatus>,
        search: Option<&str>,
    ) -> DomainResult<Vec<Order>> {
        let needle = search.map(str::to_lowercase);
        let mut orders: Vec<Order> = self
            .orders
            .list(owner)
            .map_err(DomainError::from)?
            .into_iter()
            .filter(|o| !o.is_deleted())
            .filter(|o| status.is_none_or(|s| o.status() == s))
            .filter(|o| {
                needle.as_deref().is_none_or(|n| {
                    o.customer_name().to_lowercase().contains(n) || o.phone().contains(n)
                })
            })
            .collect();

        orders.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(orders)
    }

    /// Tombstone an order. The stock it reserved stays reserved.
    pub fn soft_delete(&self, owner: OwnerId, id: OrderId) -> DomainResult<()> {
        match self.orders.update_with(owner, &id, |o| {
            if o.is_deleted() {
                return Err(DomainError::not_found());
            }
            o.set_deleted(true);
            Ok(())
        })? {
            UpdateOutcome::Updated(_) => Ok(()),
            UpdateOutcome::Missing => Err(DomainError::not_found()),
            UpdateOutcome::Rejected(e) => Err(e),
        }
    }

    /// Clear a tombstone; the order reappears with its pre-delete fields.
    pub fn restore(&self, owner: OwnerId, id: OrderId) -> DomainResult<()> {
        match self.orders.update_with(owner, &id, |o| {
            if !o.is_deleted() {
                return Err(DomainError::not_found());
            }
            o.set_deleted(false);
            Ok(())
        })? {
            UpdateOutcome::Updated(_) => Ok(()),
            UpdateOutcome::Missing => Err(DomainError::not_found()),
            UpdateOutcome::Rejected(e) => Err(e),
        }
    }

    /// Irreversibly remove an already-tombstoned order.
    pub fn purge(&self, owner: OwnerId, id: OrderId) -> DomainResult<()> {
        let existing = self
            .orders
            .get(owner, &id)
            .map_err(DomainError::from)?
            .ok_or_else(DomainError::not_found)?;

        if !existing.is_deleted() {
            return Err(DomainError::conflict(
                "cannot purge an active order; delete it first",
            ));
        }

        if self.orders.remove(owner, &id).map_err(DomainError::from)? {
            Ok(())
        } else {
            Err(DomainError::not_found())
        }
    }

    /// Tombstoned orders, most recently touched first.
    pub fn list_trashed(&self, owner: OwnerId) -> DomainResult<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .orders
            .list(owner)
            .map_err(DomainError::from)?
            .into_iter()
            .filter(Tombstone::is_deleted)
            .collect();

        orders.sort_by(|a, b| b.updated_at().cmp(&a.updated_at()));
        Ok(orders)
    }

    fn notify(&self, order: &Order) -> NotificationOutcome {
        let payload = notification_payload(order);
        match self.sink.deliver(&payload) {
            Ok(()) => NotificationOutcome::Delivered,
            Err(e) => {
                tracing::warn!(
                    order_id = %order.id_typed(),
                    error = ?e,
                    "order notification delivery failed; order remains placed"
                );
                NotificationOutcome::Failed {
                    reason: format!("{e:?}"),
                }
            }
        }
    }

    fn release_reserved(&self, owner: OwnerId, reserved: &[(ProductId, u64)]) {
        let now = Utc::now();
        for (product_id, quantity) in reserved {
            let result = self.products.update_with(owner, product_id, |p| {
                p.release(*quantity, now);
                Ok(())
            });
            match result {
                Ok(UpdateOutcome::Updated(_)) => {}
                Ok(UpdateOutcome::Missing | UpdateOutcome::Rejected(_)) => {
                    tracing::warn!(
                        product_id = %product_id,
                        quantity,
                        "reserved product disappeared during rollback"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        product_id = %product_id,
                        quantity,
                        error = %e,
                        "failed to return reserved stock"
                    );
                }
            }
        }
    }
}

fn notification_payload(order: &Order) -> OrderNotification {
    OrderNotification {
        order_id: order.id_typed().to_string(),
        customer_name: order.customer_name().to_string(),
        phone_number: order.phone().to_string(),
        shipping_location: order.shipping_location().to_string(),
        deadline: order.deadline().map(|d| d.to_string()),
        products: order
            .line_items()
            .iter()
            .map(|item| NotificationLine {
                id: item.product_id.to_string(),
                name: item.product_name.clone(),
                price: item.unit_price,
                quantity: item.quantity,
                total: item.quantity.saturating_mul(item.unit_price),
            })
            .collect(),
        attachments: order.attachments().to_vec(),
        notes: order.notes().unwrap_or_default().to_string(),
        total_price: order.total_amount(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    }
}
