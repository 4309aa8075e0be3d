pub mod memory;
pub mod websocket;

pub use memory::*;
pub use websocket::*;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::order::{NewOrder, OrderCompletion, OrderStatusChange, OrderStatusRecord};

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Not connected to the order server")]
    Disconnected,

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Disconnected,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::Disconnected => write!(f, "disconnected"),
        }
    }
}

/// Events the client sends. Framed as `{"event": <name>, "data": <payload>}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum OutboundEvent {
    NewOrder(NewOrder),
}

impl OutboundEvent {
    pub fn name(&self) -> &'static str {
        match self {
            OutboundEvent::NewOrder(_) => "new_order",
        }
    }
}

/// Events the server pushes, using the same framing as [`OutboundEvent`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum InboundEvent {
    UpdateOrders(Vec<OrderStatusRecord>),
    OrderStatusUpdated(OrderStatusChange),
    OrderCompleted(OrderCompletion),
}

pub fn encode_outbound(event: &OutboundEvent) -> Result<String, TransportError> {
    Ok(serde_json::to_string(event)?)
}

pub fn decode_inbound(frame: &str) -> Result<InboundEvent, TransportError> {
    Ok(serde_json::from_str(frame)?)
}

/// Publish side of the live connection.
///
/// `emit` is fire-and-forget: it returns once the frame is handed off and
/// never waits for a reply from the server.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn emit(&self, event: OutboundEvent) -> Result<(), TransportError>;
    fn state(&self) -> ConnectionState;

    fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::order::ProductLine;

    #[test]
    fn test_encode_new_order_frame() {
        let event = OutboundEvent::NewOrder(NewOrder {
            table_id: "5".to_string(),
            products: vec![ProductLine::new("a", 2), ProductLine::new("c", 1)],
        });
        let encoded = encode_outbound(&event).unwrap();
        let frame: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(
            frame,
            serde_json::json!({
                "event": "new_order",
                "data": {
                    "table_id": "5",
                    "products": [{"id": "a", "qty": 2}, {"id": "c", "qty": 1}]
                }
            })
        );
        assert_eq!(event.name(), "new_order");
    }

    #[test]
    fn test_decode_update_orders_frame() {
        let frame = r#"{"event": "update_orders", "data": [{"table": "5", "status": "cooking"}]}"#;
        let event = decode_inbound(frame).unwrap();
        assert_eq!(
            event,
            InboundEvent::UpdateOrders(vec![OrderStatusRecord::new("5", "cooking")])
        );
    }

    #[test]
    fn test_decode_order_completed_frame() {
        let frame = r#"{"event": "order_completed", "data": {"order_id": 12, "table_id": 3}}"#;
        let event = decode_inbound(frame).unwrap();
        assert_eq!(
            event,
            InboundEvent::OrderCompleted(OrderCompletion {
                order_id: 12,
                table_id: "3".to_string()
            })
        );
    }

    #[test]
    fn test_decode_unknown_event_fails() {
        let result = decode_inbound(r#"{"event": "reload", "data": null}"#);
        assert!(matches!(result, Err(TransportError::Serialization(_))));
    }
}
