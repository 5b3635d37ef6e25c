//! Lifecycle events.
//!
//! One envelope is emitted per successful mutation. It is a propagation
//! record only; the store remains the system of record.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::aggregate::Order;
use crate::domain::shared::OrderId;

/// Mutation that produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleAction {
    /// Order created.
    Create,
    /// Order cancelled.
    Cancel,
    /// Fill applied.
    Fill,
}

impl LifecycleAction {
    /// Wire name of the action.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Cancel => "cancel",
            Self::Fill => "fill",
        }
    }
}

impl fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `{ "action", "order_id", "data" }` envelope carrying the order snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    /// Mutation kind.
    pub action: LifecycleAction,
    /// Order the event belongs to; also the partition key.
    pub order_id: OrderId,
    /// Order snapshot after the mutation.
    pub data: Order,
}

impl LifecycleEvent {
    /// Build an event for `order` after `action` was applied.
    #[must_use]
    pub fn new(action: LifecycleAction, order: &Order) -> Self {
        Self {
            action,
            order_id: order.order_id().clone(),
            data: order.clone(),
        }
    }

    /// Serialize to the JSON wire payload.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Parse a JSON wire payload.
    ///
    /// # Errors
    ///
    /// Returns error if the payload is not a valid event.
    pub fn decode(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order_lifecycle::aggregate::NewOrder;
    use crate::domain::shared::UserId;
    use rust_decimal_macros::dec;

    fn order() -> Order {
        Order::create(NewOrder {
            order_id: OrderId::new("O1"),
            user_id: UserId::new("7"),
            symbol: None,
            order_type: None,
            order_side: None,
            price: dec!(100),
            amount: dec!(10),
        })
        .unwrap()
    }

    #[test]
    fn wire_shape() {
        let event = LifecycleEvent::new(LifecycleAction::Create, &order());
        let json: serde_json::Value = serde_json::from_slice(&event.encode().unwrap()).unwrap();

        assert_eq!(json["action"], "create");
        assert_eq!(json["order_id"], "O1");
        assert_eq!(json["data"]["order_id"], "O1");
        assert_eq!(json["data"]["status"], "pending");
    }

    #[test]
    fn decode_accepts_encoded_payload() {
        let event = LifecycleEvent::new(LifecycleAction::Fill, &order());
        let decoded = LifecycleEvent::decode(&event.encode().unwrap()).unwrap();
        assert_eq!(decoded, event);
    }

    #[test]
    fn decode_rejects_garbage_and_unknown_action() {
        assert!(LifecycleEvent::decode(b"not json").is_err());
        assert!(LifecycleEvent::decode(br#"{"action":"delete","order_id":"O1","data":{}}"#).is_err());
    }
}
