use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::{
    models::{
        catalog::Catalog,
        notice::{Notice, NoticeQueue},
        order::{NewOrder, OrderStatusRecord, ProductLine},
    },
    transport::{ConnectionState, InboundEvent, OutboundEvent, Transport, TransportError},
};

#[derive(Error, Debug)]
pub enum LiveOrderServiceError {
    #[error("Select at least one product")]
    EmptySelection,

    #[error("No table selected")]
    NoTableSelected,

    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error("Unknown product: {0}")]
    UnknownProduct(String),

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Not connected to the order server")]
    Disconnected,

    #[error("Transport error: {0}")]
    TransportError(#[from] TransportError),
}

/// Raw text of one product-quantity field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantityInput {
    pub product_id: String,
    pub raw: String,
}

/// View-model for the live ordering page: the order form, the status board
/// fed by the server, and the connection banner.
pub struct LiveOrderService {
    catalog: Arc<Catalog>,
    inputs: Vec<QuantityInput>,
    selected_table: Option<String>,
    rendered: Vec<String>,
    connection: ConnectionState,
    notices: NoticeQueue,
}

impl LiveOrderService {
    /// Builds the form from the catalog: one quantity field per product in
    /// catalog order, all at zero, with the first table preselected.
    pub fn new(catalog: Arc<Catalog>) -> Self {
        let inputs = catalog
            .products
            .iter()
            .map(|p| QuantityInput {
                product_id: p.id.clone(),
                raw: "0".to_string(),
            })
            .collect();
        let selected_table = catalog.tables.first().map(|t| t.id.clone());

        Self {
            catalog,
            inputs,
            selected_table,
            rendered: Vec::new(),
            connection: ConnectionState::Connecting,
            notices: NoticeQueue::default(),
        }
    }

    pub fn set_quantity(
        &mut self,
        product_id: &str,
        raw: impl Into<String>,
    ) -> Result<(), LiveOrderServiceError> {
        let input = self
            .inputs
            .iter_mut()
            .find(|i| i.product_id == product_id)
            .ok_or_else(|| LiveOrderServiceError::UnknownProduct(product_id.to_string()))?;
        input.raw = raw.into();
        Ok(())
    }

    pub fn select_table(&mut self, table_id: &str) -> Result<(), LiveOrderServiceError> {
        if self.catalog.table(table_id).is_none() {
            return Err(LiveOrderServiceError::UnknownTable(table_id.to_string()));
        }
        self.selected_table = Some(table_id.to_string());
        Ok(())
    }

    pub fn selected_table(&self) -> Option<&str> {
        self.selected_table.as_deref()
    }

    pub fn inputs(&self) -> &[QuantityInput] {
        &self.inputs
    }

    /// Products with a positive quantity, in form order.
    pub fn selected_products(&self) -> Vec<ProductLine> {
        self.inputs
            .iter()
            .filter_map(|input| {
                parse_quantity(&input.product_id, &input.raw)
                    .map(|qty| ProductLine::new(input.product_id.clone(), qty))
            })
            .collect()
    }

    /// Sends the current selection as a `new_order` event.
    ///
    /// Nothing is sent when no product has a positive quantity or when the
    /// transport is down; both raise a notice. The form is left as is.
    pub async fn submit(
        &mut self,
        transport: &dyn Transport,
    ) -> Result<NewOrder, LiveOrderServiceError> {
        let products = self.selected_products();
        if products.is_empty() {
            self.notices.push(Notice::warning("Select at least one product"));
            return Err(LiveOrderServiceError::EmptySelection);
        }

        let table_id = match &self.selected_table {
            Some(table_id) => table_id.clone(),
            None => {
                self.notices.push(Notice::warning("Select a table"));
                return Err(LiveOrderServiceError::NoTableSelected);
            }
        };

        if !transport.is_connected() {
            warn!("Order for table {} not sent: transport disconnected", table_id);
            self.mark_disconnected();
            return Err(LiveOrderServiceError::Disconnected);
        }

        let order = NewOrder { table_id, products };
        order
            .validate_lines()
            .map_err(|e| LiveOrderServiceError::ValidationError {
                message: format!("Order validation failed: {}", e),
            })?;

        if let Err(e) = transport.emit(OutboundEvent::NewOrder(order.clone())).await {
            error!("Failed to send order for table {}: {}", order.table_id, e);
            self.mark_disconnected();
            return Err(LiveOrderServiceError::TransportError(e));
        }

        info!(
            "Sent new_order for table {} with {} products",
            order.table_id,
            order.products.len()
        );
        Ok(order)
    }

    /// Replaces the whole status board with `records`.
    pub fn apply_update(&mut self, records: &[OrderStatusRecord]) {
        self.rendered = records.iter().map(|r| r.to_string()).collect();
        debug!("Status board now shows {} orders", self.rendered.len());
    }

    pub fn handle_inbound(&mut self, event: InboundEvent) {
        match event {
            InboundEvent::UpdateOrders(records) => self.apply_update(&records),
            InboundEvent::OrderStatusUpdated(change) => {
                self.notices.push(Notice::info(format!(
                    "Order #{} is now {}",
                    change.order_id, change.status
                )));
            }
            InboundEvent::OrderCompleted(done) => {
                self.notices.push(Notice::info(format!(
                    "Order #{} for table {} completed",
                    done.order_id, done.table_id
                )));
            }
        }
    }

    pub fn on_connection_change(&mut self, state: ConnectionState) {
        if state == self.connection {
            return;
        }
        info!("Connection {} -> {}", self.connection, state);
        match state {
            ConnectionState::Disconnected => self.mark_disconnected(),
            ConnectionState::Connected => {
                self.connection = state;
                self.notices.push(Notice::info("Connected to order server"));
            }
            ConnectionState::Connecting => self.connection = state,
        }
    }

    fn mark_disconnected(&mut self) {
        self.connection = ConnectionState::Disconnected;
        self.notices.push(Notice::disconnected());
    }

    pub fn rendered_lines(&self) -> &[String] {
        &self.rendered
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.drain()
    }
}

/// Reads a quantity field. Only strictly positive integers count; text that
/// is not an integer or does not fit a `u32` is left out with a warning.
fn parse_quantity(product_id: &str, raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let value: i64 = match trimmed.parse() {
        Ok(value) => value,
        Err(_) => {
            warn!("Ignoring unreadable quantity {:?} for product {}", raw, product_id);
            return None;
        }
    };

    if value <= 0 {
        return None;
    }

    match u32::try_from(value) {
        Ok(qty) => Some(qty),
        Err(_) => {
            warn!("Ignoring oversized quantity {} for product {}", value, product_id);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        catalog::{DiningTable, Product},
        notice::NoticeKind,
        order::{OrderCompletion, OrderStatusChange},
    };
    use async_trait::async_trait;
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    };

    struct MockTransport {
        sent: Mutex<Vec<OutboundEvent>>,
        connected: AtomicBool,
        fail_emit: bool,
    }

    impl MockTransport {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                connected: AtomicBool::new(true),
                fail_emit: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail_emit: true,
                ..Self::new()
            }
        }

        fn sent(&self) -> Vec<OutboundEvent> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn emit(&self, event: OutboundEvent) -> Result<(), TransportError> {
            if self.fail_emit {
                self.connected.store(false, Ordering::SeqCst);
                return Err(TransportError::Disconnected);
            }
            self.sent.lock().unwrap().push(event);
            Ok(())
        }

        fn state(&self) -> ConnectionState {
            if self.connected.load(Ordering::SeqCst) {
                ConnectionState::Connected
            } else {
                ConnectionState::Disconnected
            }
        }
    }

    fn product(id: &str) -> Product {
        Product {
            id: id.to_string(),
            name: id.to_uppercase(),
            price: 1.0,
            category: None,
        }
    }

    fn service() -> LiveOrderService {
        let catalog = Catalog::new(
            vec![],
            vec![
                DiningTable {
                    id: "5".to_string(),
                    name: "Table 5".to_string(),
                },
                DiningTable {
                    id: "6".to_string(),
                    name: "Table 6".to_string(),
                },
            ],
            vec![product("a"), product("b"), product("c")],
        )
        .unwrap();
        LiveOrderService::new(Arc::new(catalog))
    }

    #[test]
    fn test_form_defaults() {
        let service = service();
        assert_eq!(service.selected_table(), Some("5"));
        assert_eq!(service.inputs().len(), 3);
        assert!(service.inputs().iter().all(|i| i.raw == "0"));
        assert!(service.selected_products().is_empty());
    }

    #[test]
    fn test_parse_quantity_policy() {
        assert_eq!(parse_quantity("a", " 3 "), Some(3));
        assert_eq!(parse_quantity("a", "0"), None);
        assert_eq!(parse_quantity("a", "-2"), None);
        assert_eq!(parse_quantity("a", ""), None);
        assert_eq!(parse_quantity("a", "two"), None);
        assert_eq!(parse_quantity("a", "1.5"), None);
        assert_eq!(parse_quantity("a", "99999999999"), None);
    }

    #[tokio::test]
    async fn test_submit_filters_zero_quantities_in_order() {
        let transport = MockTransport::new();
        let mut service = service();
        service.set_quantity("a", "2").unwrap();
        service.set_quantity("b", "0").unwrap();
        service.set_quantity("c", "1").unwrap();

        let order = service.submit(&transport).await.unwrap();
        assert_eq!(
            order.products,
            vec![ProductLine::new("a", 2), ProductLine::new("c", 1)]
        );
        assert_eq!(order.table_id, "5");
        assert_eq!(transport.sent(), vec![OutboundEvent::NewOrder(order)]);
        assert!(service.take_notices().is_empty());
    }

    #[tokio::test]
    async fn test_submit_empty_selection_sends_nothing() {
        let transport = MockTransport::new();
        let mut service = service();
        service.set_quantity("b", "0").unwrap();

        let result = service.submit(&transport).await;
        assert!(matches!(result, Err(LiveOrderServiceError::EmptySelection)));
        assert!(transport.sent().is_empty());

        let notices = service.take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].to_string(), "Select at least one product");
    }

    #[tokio::test]
    async fn test_submit_uses_selected_table() {
        let transport = MockTransport::new();
        let mut service = service();
        service.select_table("6").unwrap();
        service.set_quantity("b", "4").unwrap();

        let order = service.submit(&transport).await.unwrap();
        assert_eq!(order.table_id, "6");
    }

    #[tokio::test]
    async fn test_submit_while_disconnected() {
        let transport = MockTransport::new();
        transport.connected.store(false, Ordering::SeqCst);
        let mut service = service();
        service.set_quantity("a", "1").unwrap();

        let result = service.submit(&transport).await;
        assert!(matches!(result, Err(LiveOrderServiceError::Disconnected)));
        assert!(transport.sent().is_empty());
        assert_eq!(service.connection_state(), ConnectionState::Disconnected);

        let notices = service.take_notices();
        assert!(matches!(notices[0].kind, NoticeKind::Disconnected));
    }

    #[tokio::test]
    async fn test_submit_emit_failure_surfaces_disconnect() {
        let transport = MockTransport::failing();
        let mut service = service();
        service.set_quantity("a", "1").unwrap();

        let result = service.submit(&transport).await;
        assert!(matches!(result, Err(LiveOrderServiceError::TransportError(_))));
        assert_eq!(service.connection_state(), ConnectionState::Disconnected);
        assert!(service.take_notices().iter().any(|n| n.is_warning()));
    }

    #[test]
    fn test_unknown_ids_rejected() {
        let mut service = service();
        assert!(matches!(
            service.set_quantity("zzz", "1"),
            Err(LiveOrderServiceError::UnknownProduct(_))
        ));
        assert!(matches!(
            service.select_table("99"),
            Err(LiveOrderServiceError::UnknownTable(_))
        ));
        assert_eq!(service.selected_table(), Some("5"));
    }

    #[test]
    fn test_update_replaces_rendered_list() {
        let mut service = service();
        service.apply_update(&[
            OrderStatusRecord::new("1", "pending"),
            OrderStatusRecord::new("2", "preparing"),
        ]);
        assert_eq!(service.rendered_lines().len(), 2);

        service.handle_inbound(InboundEvent::UpdateOrders(vec![OrderStatusRecord::new(
            "5", "cooking",
        )]));
        assert_eq!(service.rendered_lines(), ["Table: 5 | Status: cooking"]);

        service.apply_update(&[]);
        assert!(service.rendered_lines().is_empty());
    }

    #[test]
    fn test_other_events_only_notify() {
        let mut service = service();
        service.apply_update(&[OrderStatusRecord::new("3", "pending")]);

        service.handle_inbound(InboundEvent::OrderStatusUpdated(OrderStatusChange {
            order_id: 7,
            status: "preparing".to_string(),
        }));
        service.handle_inbound(InboundEvent::OrderCompleted(OrderCompletion {
            order_id: 7,
            table_id: "3".to_string(),
        }));

        assert_eq!(service.rendered_lines(), ["Table: 3 | Status: pending"]);
        let notices: Vec<String> = service.take_notices().iter().map(|n| n.to_string()).collect();
        assert_eq!(
            notices,
            vec!["Order #7 is now preparing", "Order #7 for table 3 completed"]
        );
    }

    #[test]
    fn test_connection_changes() {
        let mut service = service();
        assert_eq!(service.connection_state(), ConnectionState::Connecting);

        service.on_connection_change(ConnectionState::Connected);
        service.on_connection_change(ConnectionState::Connected);
        assert_eq!(service.take_notices().len(), 1);

        service.on_connection_change(ConnectionState::Disconnected);
        assert_eq!(service.connection_state(), ConnectionState::Disconnected);
        let notices = service.take_notices();
        assert_eq!(notices.len(), 1);
        assert!(matches!(notices[0].kind, NoticeKind::Disconnected));
    }
}
