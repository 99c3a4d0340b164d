use serde::{Deserialize, Serialize};

/// One order line as reported to the external endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationLine {
    pub id: String,
    pub name: String,
    /// Unit price at order time, smallest currency unit.
    pub price: u64,
    pub quantity: u64,
    /// `price * quantity`.
    pub total: u64,
}

/// Payload posted once per successful order placement.
///
/// Field names on the wire are fixed by the receiving endpoint; do not
/// rename without coordinating with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderNotification {
    pub order_id: String,
    pub customer_name: String,
    pub phone_number: String,
    pub shipping_location: String,
    /// ISO date, or null when the order has no deadline.
    pub deadline: Option<String>,
    pub products: Vec<NotificationLine>,
    /// Attachment filenames only, never binary content.
    pub attachments: Vec<String>,
    pub notes: String,
    pub total_price: u64,
    /// ISO-8601 placement time.
    pub timestamp: String,
}
