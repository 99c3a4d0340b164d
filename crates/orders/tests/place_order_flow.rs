//! End-to-end placement workflow tests over in-memory infrastructure.

use std::sync::Arc;

use chrono::NaiveDate;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;

use dukkan_core::{DomainError, EntityId, OwnerId};
use dukkan_inventory::{Inventory, NewProduct, Product, ProductId, ProductKind};
use dukkan_notify::{InMemorySink, NotificationOutcome};
use dukkan_orders::{DraftLine, Order, OrderDraft, OrderEngine, OrderId, OrderStatus};
use dukkan_store::{InMemoryRecordStore, RecordStore, StoreError, StoreResult, UpdateOutcome};

type ProductStore = Arc<InMemoryRecordStore<ProductId, Product>>;
type OrderStore = Arc<InMemoryRecordStore<OrderId, Order>>;

struct Fixture {
    inventory: Inventory<ProductStore>,
    engine: OrderEngine<ProductStore, OrderStore, Arc<InMemorySink>>,
    sink: Arc<InMemorySink>,
    owner: OwnerId,
}

fn fixture() -> Fixture {
    let products: ProductStore = Arc::new(InMemoryRecordStore::new());
    let orders: OrderStore = Arc::new(InMemoryRecordStore::new());
    let sink = Arc::new(InMemorySink::new());

    Fixture {
        inventory: Inventory::new(Arc::clone(&products)),
        engine: OrderEngine::new(products, orders, Arc::clone(&sink)),
        sink,
        owner: OwnerId::new(),
    }
}

fn ready_product(name: &str, price: u64, stock: u64) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        kind: ProductKind::ReadyProduct,
        unit_price: price,
        stock_quantity: stock,
        photo_reference: Some(format!("{name}.jpg")),
        description: None,
        unit: None,
        supplier: None,
    }
}

fn draft_for(lines: Vec<DraftLine>) -> OrderDraft {
    OrderDraft {
        customer_name: "Sara Ahmed".to_string(),
        phone: "0551234567".to_string(),
        shipping_location: "Damascus".to_string(),
        deadline: None,
        lines,
        notes: Some("Express delivery".to_string()),
        attachments: vec!["measurements.pdf".to_string()],
    }
}

#[test]
fn placing_an_order_reserves_stock_and_snapshots_totals() {
    let fx = fixture();
    let dress = fx
        .inventory
        .add_product(fx.owner, ready_product("Blue Dress", 52_000, 5))
        .unwrap();

    let placement = fx
        .engine
        .place_order(
            fx.owner,
            draft_for(vec![DraftLine {
                product_id: dress.id_typed(),
                quantity: 3,
            }]),
        )
        .unwrap();

    assert_eq!(placement.order.status(), OrderStatus::Pending);
    assert_eq!(placement.order.total_amount(), 156_000);
    assert!(placement.notification.is_delivered());

    let remaining = fx.inventory.get_product(fx.owner, dress.id_typed()).unwrap();
    assert_eq!(remaining.stock_quantity(), 2);

    // A second order for the same quantity no longer fits.
    let err = fx
        .engine
        .place_order(
            fx.owner,
            draft_for(vec![DraftLine {
                product_id: dress.id_typed(),
                quantity: 3,
            }]),
        )
        .unwrap_err();
    assert_eq!(err, DomainError::insufficient_stock(3, 2));

    let remaining = fx.inventory.get_product(fx.owner, dress.id_typed()).unwrap();
    assert_eq!(remaining.stock_quantity(), 2);
    assert_eq!(fx.engine.list_orders(fx.owner, None, None).unwrap().len(), 1);
}

#[test]
fn later_price_changes_do_not_touch_placed_orders() {
    let fx = fixture();
    let dress = fx
        .inventory
        .add_product(fx.owner, ready_product("Blue Dress", 52_000, 5))
        .unwrap();

    let placement = fx
        .engine
        .place_order(
            fx.owner,
            draft_for(vec![DraftLine {
                product_id: dress.id_typed(),
                quantity: 2,
            }]),
        )
        .unwrap();

    fx.inventory
        .update_product(
            fx.owner,
            dress.id_typed(),
            dukkan_inventory::ProductPatch {
                unit_price: Some(99_000),
                ..Default::default()
            },
        )
        .unwrap();

    let stored = fx
        .engine
        .get_order(fx.owner, placement.order.id_typed())
        .unwrap();
    assert_eq!(stored.total_amount(), 104_000);
    assert_eq!(stored.line_items()[0].unit_price, 52_000);
}

#[test]
fn failed_line_rolls_back_every_earlier_reservation() {
    let fx = fixture();
    let dress = fx
        .inventory
        .add_product(fx.owner, ready_product("Blue Dress", 52_000, 5))
        .unwrap();
    let suit = fx
        .inventory
        .add_product(fx.owner, ready_product("Formal Suit", 167_000, 1))
        .unwrap();

    let err = fx
        .engine
        .place_order(
            fx.owner,
            draft_for(vec![
                DraftLine {
                    product_id: dress.id_typed(),
                    quantity: 4,
                },
                DraftLine {
                    product_id: suit.id_typed(),
                    quantity: 2,
                },
            ]),
        )
        .unwrap_err();
    assert_eq!(err, DomainError::insufficient_stock(2, 1));

    // No order row, no stock movement.
    assert!(fx.engine.list_orders(fx.owner, None, None).unwrap().is_empty());
    assert_eq!(
        fx.inventory
            .get_product(fx.owner, dress.id_typed())
            .unwrap()
            .stock_quantity(),
        5
    );
    assert_eq!(
        fx.inventory
            .get_product(fx.owner, suit.id_typed())
            .unwrap()
            .stock_quantity(),
        1
    );
    assert!(fx.sink.delivered().is_empty());
}

#[test]
fn drafts_referencing_missing_or_deleted_products_mutate_nothing() {
    let fx = fixture();
    let dress = fx
        .inventory
        .add_product(fx.owner, ready_product("Blue Dress", 52_000, 5))
        .unwrap();

    let ghost = ProductId::new(EntityId::new());
    let err = fx
        .engine
        .place_order(
            fx.owner,
            draft_for(vec![
                DraftLine {
                    product_id: dress.id_typed(),
                    quantity: 1,
                },
                DraftLine {
                    product_id: ghost,
                    quantity: 1,
                },
            ]),
        )
        .unwrap_err();
    assert_eq!(err, DomainError::NotFound);

    fx.inventory.soft_delete(fx.owner, dress.id_typed()).unwrap();
    let err = fx
        .engine
        .place_order(
            fx.owner,
            draft_for(vec![DraftLine {
                product_id: dress.id_typed(),
                quantity: 1,
            }]),
        )
        .unwrap_err();
    assert_eq!(err, DomainError::NotFound);

    assert!(fx.engine.list_orders(fx.owner, None, None).unwrap().is_empty());
    assert!(fx.sink.delivered().is_empty());
}

#[test]
fn notification_failure_keeps_the_order() {
    let fx = fixture();
    let dress = fx
        .inventory
        .add_product(fx.owner, ready_product("Blue Dress", 52_000, 5))
        .unwrap();
    fx.sink.fail_next(1);

    let placement = fx
        .engine
        .place_order(
            fx.owner,
            draft_for(vec![DraftLine {
                product_id: dress.id_typed(),
                quantity: 1,
            }]),
        )
        .unwrap();

    assert!(matches!(
        placement.notification,
        NotificationOutcome::Failed { .. }
    ));
    assert_eq!(placement.order.status(), OrderStatus::Pending);

    let stored = fx
        .engine
        .get_order(fx.owner, placement.order.id_typed())
        .unwrap();
    assert_eq!(stored.total_amount(), 52_000);
    assert_eq!(
        fx.inventory
            .get_product(fx.owner, dress.id_typed())
            .unwrap()
            .stock_quantity(),
        4
    );
}

#[test]
fn notification_payload_carries_the_order_snapshot() {
    let fx = fixture();
    let dress = fx
        .inventory
        .add_product(fx.owner, ready_product("Blue Dress", 52_000, 5))
        .unwrap();

    let mut draft = draft_for(vec![DraftLine {
        product_id: dress.id_typed(),
        quantity: 3,
    }]);
    draft.deadline = NaiveDate::from_ymd_opt(2024, 2, 1);

    let placement = fx.engine.place_order(fx.owner, draft).unwrap();

    let delivered = fx.sink.delivered();
    assert_eq!(delivered.len(), 1);
    let payload = &delivered[0];

    assert_eq!(payload.order_id, placement.order.id_typed().to_string());
    assert_eq!(payload.customer_name, "Sara Ahmed");
    assert_eq!(payload.phone_number, "0551234567");
    assert_eq!(payload.shipping_location, "Damascus");
    assert_eq!(payload.deadline.as_deref(), Some("2024-02-01"));
    assert_eq!(payload.notes, "Express delivery");
    assert_eq!(payload.attachments, vec!["measurements.pdf".to_string()]);
    assert_eq!(payload.total_price, 156_000);
    assert_eq!(payload.products.len(), 1);
    assert_eq!(payload.products[0].name, "Blue Dress");
    assert_eq!(payload.products[0].price, 52_000);
    assert_eq!(payload.products[0].quantity, 3);
    assert_eq!(payload.products[0].total, 156_000);
}

#[test]
fn status_updates_follow_the_machine() {
    let fx = fixture();
    let dress = fx
        .inventory
        .add_product(fx.owner, ready_product("Blue Dress", 52_000, 5))
        .unwrap();
    let placement = fx
        .engine
        .place_order(
            fx.owner,
            draft_for(vec![DraftLine {
                product_id: dress.id_typed(),
                quantity: 1,
            }]),
        )
        .unwrap();
    let id = placement.order.id_typed();

    let completed = fx
        .engine
        .update_status(fx.owner, id, OrderStatus::Completed)
        .unwrap();
    assert_eq!(completed.status(), OrderStatus::Completed);

    let reopened = fx
        .engine
        .update_status(fx.owner, id, OrderStatus::Pending)
        .unwrap();
    assert_eq!(reopened.status(), OrderStatus::Pending);

    fx.engine
        .update_status(fx.owner, id, OrderStatus::Cancelled)
        .unwrap();
    let err = fx
        .engine
        .update_status(fx.owner, id, OrderStatus::Completed)
        .unwrap_err();
    assert_eq!(
        err,
        DomainError::invalid_transition("cancelled", "completed")
    );
}

#[test]
fn cancelling_does_not_return_stock() {
    let fx = fixture();
    let dress = fx
        .inventory
        .add_product(fx.owner, ready_product("Blue Dress", 52_000, 5))
        .unwrap();
    let placement = fx
        .engine
        .place_order(
            fx.owner,
            draft_for(vec![DraftLine {
                product_id: dress.id_typed(),
                quantity: 3,
            }]),
        )
        .unwrap();

    fx.engine
        .update_status(fx.owner, placement.order.id_typed(), OrderStatus::Cancelled)
        .unwrap();

    // Re-stock is an explicit inventory adjustment, never implicit.
    assert_eq!(
        fx.inventory
            .get_product(fx.owner, dress.id_typed())
            .unwrap()
            .stock_quantity(),
        2
    );
    fx.inventory
        .adjust_stock(fx.owner, dress.id_typed(), 3)
        .unwrap();
    assert_eq!(
        fx.inventory
            .get_product(fx.owner, dress.id_typed())
            .unwrap()
            .stock_quantity(),
        5
    );
}

#[test]
fn deleted_orders_leave_listings_and_accept_no_status_changes() {
    let fx = fixture();
    let dress = fx
        .inventory
        .add_product(fx.owner, ready_product("Blue Dress", 52_000, 5))
        .unwrap();
    let placement = fx
        .engine
        .place_order(
            fx.owner,
            draft_for(vec![DraftLine {
                product_id: dress.id_typed(),
                quantity: 1,
            }]),
        )
        .unwrap();
    let id = placement.order.id_typed();

    fx.engine.soft_delete(fx.owner, id).unwrap();

    assert!(fx.engine.list_orders(fx.owner, None, None).unwrap().is_empty());
    assert_eq!(fx.engine.list_trashed(fx.owner).unwrap().len(), 1);
    assert_eq!(
        fx.engine
            .update_status(fx.owner, id, OrderStatus::Completed)
            .unwrap_err(),
        DomainError::NotFound
    );

    // Stock reserved by the order is untouched by deletion.
    assert_eq!(
        fx.inventory
            .get_product(fx.owner, dress.id_typed())
            .unwrap()
            .stock_quantity(),
        4
    );

    fx.engine.restore(fx.owner, id).unwrap();
    let restored = fx.engine.get_order(fx.owner, id).unwrap();
    assert_eq!(restored, placement.order);

    fx.engine.soft_delete(fx.owner, id).unwrap();
    fx.engine.purge(fx.owner, id).unwrap();
    assert_eq!(fx.engine.purge(fx.owner, id).unwrap_err(), DomainError::NotFound);
}

#[test]
fn listing_filters_by_status_and_search() {
    let fx = fixture();
    let dress = fx
        .inventory
        .add_product(fx.owner, ready_product("Blue Dress", 52_000, 9))
        .unwrap();

    let mut first = draft_for(vec![DraftLine {
        product_id: dress.id_typed(),
        quantity: 1,
    }]);
    first.customer_name = "Sara Ahmed".to_string();
    first.phone = "0551234567".to_string();
    let first = fx.engine.place_order(fx.owner, first).unwrap();

    let mut second = draft_for(vec![DraftLine {
        product_id: dress.id_typed(),
        quantity: 1,
    }]);
    second.customer_name = "Mohammed Ali".to_string();
    second.phone = "0559876543".to_string();
    let second = fx.engine.place_order(fx.owner, second).unwrap();

    fx.engine
        .update_status(fx.owner, second.order.id_typed(), OrderStatus::Completed)
        .unwrap();

    let pending = fx
        .engine
        .list_orders(fx.owner, Some(OrderStatus::Pending), None)
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id_typed(), first.order.id_typed());

    let by_name = fx.engine.list_orders(fx.owner, None, Some("sara")).unwrap();
    assert_eq!(by_name.len(), 1);
    assert_eq!(by_name[0].customer_name(), "Sara Ahmed");

    let by_phone = fx
        .engine
        .list_orders(fx.owner, None, Some("055987"))
        .unwrap();
    assert_eq!(by_phone.len(), 1);
    assert_eq!(by_phone[0].customer_name(), "Mohammed Ali");
}

/// Order store that fails every insert, for exercising the rollback path.
struct RejectingOrderStore {
    inner: InMemoryRecordStore<OrderId, Order>,
}

impl RecordStore<OrderId, Order> for RejectingOrderStore {
    fn insert(&self, _owner: OwnerId, _key: OrderId, _value: Order) -> StoreResult<()> {
        Err(StoreError::Unavailable("insert refused".to_string()))
    }

    fn get(&self, owner: OwnerId, key: &OrderId) -> StoreResult<Option<Order>> {
        self.inner.get(owner, key)
    }

    fn list(&self, owner: OwnerId) -> StoreResult<Vec<Order>> {
        self.inner.list(owner)
    }

    fn update_with<F>(
        &self,
        owner: OwnerId,
        key: &OrderId,
        apply: F,
    ) -> StoreResult<UpdateOutcome<Order>>
    where
        F: FnOnce(&mut Order) -> Result<(), DomainError>,
    {
        self.inner.update_with(owner, key, apply)
    }

    fn remove(&self, owner: OwnerId, key: &OrderId) -> StoreResult<bool> {
        self.inner.remove(owner, key)
    }
}

#[test]
fn order_write_failure_rolls_back_reservations() {
    let products: ProductStore = Arc::new(InMemoryRecordStore::new());
    let inventory = Inventory::new(Arc::clone(&products));
    let sink = Arc::new(InMemorySink::new());
    let engine = OrderEngine::new(
        Arc::clone(&products),
        RejectingOrderStore {
            inner: InMemoryRecordStore::new(),
        },
        Arc::clone(&sink),
    );
    let owner = OwnerId::new();

    let dress = inventory
        .add_product(owner, ready_product("Blue Dress", 52_000, 5))
        .unwrap();

    let err = engine
        .place_order(
            owner,
            draft_for(vec![DraftLine {
                product_id: dress.id_typed(),
                quantity: 3,
            }]),
        )
        .unwrap_err();
    assert!(matches!(err, DomainError::Storage(_)));

    assert_eq!(
        inventory
            .get_product(owner, dress.id_typed())
            .unwrap()
            .stock_quantity(),
        5
    );
    assert!(sink.delivered().is_empty());
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        ..ProptestConfig::default()
    })]

    /// Property: no sequence of placements and manual adjustments drives
    /// stock negative, and failed operations never move it.
    #[test]
    fn stock_never_goes_negative(
        initial in 0u64..30,
        ops in prop::collection::vec((0u8..2, 1i64..10), 1..25)
    ) {
        let fx = fixture();
        let product = fx
            .inventory
            .add_product(fx.owner, ready_product("Blue Dress", 52_000, initial))
            .unwrap();

        let mut expected = initial;
        for (kind, magnitude) in ops {
            match kind {
                0 => {
                    let quantity = magnitude as u64;
                    let result = fx.engine.place_order(
                        fx.owner,
                        draft_for(vec![DraftLine {
                            product_id: product.id_typed(),
                            quantity,
                        }]),
                    );
                    match result {
                        Ok(_) => {
                            prop_assert!(quantity <= expected);
                            expected -= quantity;
                        }
                        Err(DomainError::InsufficientStock { requested, available }) => {
                            prop_assert_eq!(requested, quantity);
                            prop_assert_eq!(available, expected);
                        }
                        Err(e) => return Err(TestCaseError::fail(format!("unexpected error: {e}"))),
                    }
                }
                _ => {
                    let delta = -magnitude;
                    match fx.inventory.adjust_stock(fx.owner, product.id_typed(), delta) {
                        Ok(updated) => {
                            prop_assert!(magnitude as u64 <= expected);
                            expected -= magnitude as u64;
                            prop_assert_eq!(updated.stock_quantity(), expected);
                        }
                        Err(DomainError::InsufficientStock { .. }) => {
                            prop_assert!(magnitude as u64 > expected);
                        }
                        Err(e) => return Err(TestCaseError::fail(format!("unexpected error: {e}"))),
                    }
                }
            }

            let live = fx
                .inventory
                .get_product(fx.owner, product.id_typed())
                .unwrap();
            prop_assert_eq!(live.stock_quantity(), expected);
        }
    }
}
