//! Notification delivery abstraction (mechanics only).

use std::sync::{Arc, Mutex};

use crate::payload::OrderNotification;

/// Outbound notification sink.
///
/// Delivery is **best-effort, at-most-once** from the workflow's point of
/// view: the order is already persisted before delivery is attempted, and a
/// delivery failure never rolls it back. Implementations may retry
/// internally (see `RetryingSink`) but must not block indefinitely.
pub trait NotificationSink: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn deliver(&self, notification: &OrderNotification) -> Result<(), Self::Error>;
}

impl<S> NotificationSink for Arc<S>
where
    S: NotificationSink + ?Sized,
{
    type Error = S::Error;

    fn deliver(&self, notification: &OrderNotification) -> Result<(), Self::Error> {
        (**self).deliver(notification)
    }
}

/// What happened to the notification for a placed order.
///
/// A `Failed` outcome accompanies a successfully persisted order; it is a
/// warning for the caller, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    Delivered,
    Failed { reason: String },
}

impl NotificationOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, NotificationOutcome::Delivered)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InMemorySinkError {
    /// Delivery failed due to internal lock poisoning.
    Poisoned,
    /// A test-injected failure.
    Injected,
}

/// In-memory sink for tests/dev.
///
/// Records every delivered notification and can be primed to fail the next
/// N deliveries.
#[derive(Debug, Default)]
pub struct InMemorySink {
    delivered: Mutex<Vec<OrderNotification>>,
    fail_next: Mutex<u32>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` deliveries fail with `Injected`.
    pub fn fail_next(&self, count: u32) {
        if let Ok(mut n) = self.fail_next.lock() {
            *n = count;
        }
    }

    pub fn delivered(&self) -> Vec<OrderNotification> {
        self.delivered
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }
}

impl NotificationSink for InMemorySink {
    type Error = InMemorySinkError;

    fn deliver(&self, notification: &OrderNotification) -> Result<(), Self::Error> {
        {
            let mut remaining = self.fail_next.lock().map_err(|_| InMemorySinkError::Poisoned)?;
            if *remaining > 0 {
                *remaining -= 1;
                return Err(InMemorySinkError::Injected);
            }
        }

        self.delivered
            .lock()
            .map_err(|_| InMemorySinkError::Poisoned)?
            .push(notification.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::OrderNotification;

    fn sample(order_id: &str) -> OrderNotification {
        OrderNotification {
            order_id: order_id.to_string(),
            customer_name: "Sara Ahmed".to_string(),
            phone_number: "0551234567".to_string(),
            shipping_location: "Damascus".to_string(),
            deadline: None,
            products: vec![],
            attachments: vec![],
            notes: String::new(),
            total_price: 0,
            timestamp: "2024-01-20T10:00:00Z".to_string(),
        }
    }

    #[test]
    fn records_deliveries_in_order() {
        let sink = InMemorySink::new();
        sink.deliver(&sample("a")).unwrap();
        sink.deliver(&sample("b")).unwrap();

        let delivered = sink.delivered();
        assert_eq!(delivered.len(), 2);
        assert_eq!(delivered[0].order_id, "a");
        assert_eq!(delivered[1].order_id, "b");
    }

    #[test]
    fn injected_failures_are_consumed() {
        let sink = InMemorySink::new();
        sink.fail_next(1);

        assert_eq!(
            sink.deliver(&sample("a")).unwrap_err(),
            InMemorySinkError::Injected
        );
        sink.deliver(&sample("b")).unwrap();
        assert_eq!(sink.delivered().len(), 1);
    }
}
