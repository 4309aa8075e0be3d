use std::collections::BTreeSet;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::{
    catalog::Catalog,
    notice::{Notice, NoticeQueue},
    order::OrderDraft,
};

#[derive(Error, Debug)]
pub enum CartServiceError {
    #[error("Cart is empty")]
    EmptyCart,
}

/// A priced draft entry, as shown on the cart page.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub id: String,
    pub name: String,
    pub qty: u32,
    pub unit_price: f64,
    pub subtotal: f64,
}

/// View-model for the menu page: owns the draft and keeps the displayed
/// total in step with it.
pub struct CartService {
    catalog: Arc<Catalog>,
    draft: OrderDraft,
    total_display: String,
    unpriced: BTreeSet<String>,
    notices: NoticeQueue,
}

impl CartService {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            draft: OrderDraft::new(),
            total_display: format_total(0.0),
            unpriced: BTreeSet::new(),
            notices: NoticeQueue::default(),
        }
    }

    pub fn add_to_order(&mut self, id: &str) {
        let qty = self.draft.increment(id);
        debug!("Added {} to order, quantity now {}", id, qty);
        self.update_total();
    }

    pub fn remove_from_order(&mut self, id: &str) {
        match self.draft.decrement(id) {
            Some(remaining) => debug!("Removed one {} from order, {} left", id, remaining),
            None => debug!("Ignoring removal of {}, not in order", id),
        }
        self.update_total();
    }

    /// Drops every unit of `id` at once.
    pub fn remove_line(&mut self, id: &str) {
        if let Some(qty) = self.draft.remove(id) {
            debug!("Removed line {} ({} units)", id, qty);
        }
        self.update_total();
    }

    pub fn clear(&mut self) {
        self.draft.clear();
        self.update_total();
    }

    /// Confirms the current draft with a non-blocking snapshot notice, then
    /// discards the draft.
    pub fn submit_order(&mut self) -> Result<OrderDraft, CartServiceError> {
        if self.draft.is_empty() {
            self.notices.push(Notice::warning("Cart is empty!"));
            return Err(CartServiceError::EmptyCart);
        }

        let snapshot = std::mem::take(&mut self.draft);
        info!(
            "Order submitted: {} lines, {} items, total {}",
            snapshot.len(),
            snapshot.total_items(),
            self.total_display
        );
        self.notices.push(Notice::order_snapshot(snapshot.clone()));
        self.update_total();
        Ok(snapshot)
    }

    fn update_total(&mut self) {
        let mut total = 0.0;
        self.unpriced.clear();

        for (id, qty) in self.draft.iter() {
            match self.catalog.price_of(id) {
                Some(price) => total += f64::from(qty) * price,
                None => {
                    warn!("No price for item {}, leaving it out of the total", id);
                    self.unpriced.insert(id.to_string());
                }
            }
        }

        self.total_display = format_total(total);
    }

    pub fn draft(&self) -> &OrderDraft {
        &self.draft
    }

    pub fn quantity(&self, id: &str) -> u32 {
        self.draft.quantity(id)
    }

    pub fn item_count(&self) -> u64 {
        self.draft.total_items()
    }

    /// The total as displayed: always exactly two decimals.
    pub fn total_display(&self) -> &str {
        &self.total_display
    }

    /// Draft ids that had no catalog price at the last recomputation.
    pub fn unpriced(&self) -> &BTreeSet<String> {
        &self.unpriced
    }

    pub fn lines(&self) -> Vec<CartLine> {
        self.draft
            .iter()
            .filter_map(|(id, qty)| {
                let product = self.catalog.product(id)?;
                Some(CartLine {
                    id: id.to_string(),
                    name: product.name.clone(),
                    qty,
                    unit_price: product.price,
                    subtotal: f64::from(qty) * product.price,
                })
            })
            .collect()
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.drain()
    }
}

fn format_total(total: f64) -> String {
    format!("{:.2}", total)
}
