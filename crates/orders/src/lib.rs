//! `dukkan-orders` — customer orders and the placement workflow.

pub mod engine;
pub mod order;

pub use engine::{OrderEngine, OrderPlacement};
pub use order::{DraftLine, LineItem, Order, OrderDraft, OrderId, OrderStatus};
