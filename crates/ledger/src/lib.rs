//! `dukkan-ledger` — income/expense transactions and the running balance.

pub mod service;
pub mod transaction;

pub use service::{BalanceSummary, Ledger};
pub use transaction::{Transaction, TransactionId, TransactionKind};
