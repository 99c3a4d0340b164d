//! `dukkan-notify` — outbound order notifications.
//!
//! The order workflow emits one notification per successfully placed order.
//! Delivery is a message-passing boundary: the workflow only knows the
//! [`NotificationSink`] trait, so the transport (HTTP webhook, test capture,
//! retry wrapper) is an injected dependency.

pub mod http;
pub mod payload;
pub mod retry;
pub mod sink;

pub use http::{HttpSink, HttpSinkConfig, HttpSinkError};
pub use payload::{NotificationLine, OrderNotification};
pub use retry::{RetryPolicy, RetryingSink};
pub use sink::{InMemorySink, InMemorySinkError, NotificationOutcome, NotificationSink};
