//! `dukkan-inventory` — products, raw materials, and stock.

pub mod product;
pub mod service;

pub use product::{NewProduct, Product, ProductId, ProductKind, ProductPatch};
pub use service::Inventory;
