use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

/// Client-local draft of an order: item id to selected quantity.
///
/// An id is either absent or maps to a quantity of at least one; reaching
/// zero removes the entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderDraft {
    entries: BTreeMap<String, u32>,
}

impl OrderDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one unit of `id` and returns the new quantity.
    pub fn increment(&mut self, id: &str) -> u32 {
        let qty = self.entries.entry(id.to_string()).or_insert(0);
        *qty = qty.saturating_add(1);
        *qty
    }

    /// Takes one unit of `id` away. Returns the remaining quantity, or `None`
    /// when the id was not in the draft.
    pub fn decrement(&mut self, id: &str) -> Option<u32> {
        let qty = self.entries.get_mut(id)?;
        *qty -= 1;
        let remaining = *qty;
        if remaining == 0 {
            self.entries.remove(id);
        }
        Some(remaining)
    }

    /// Drops the whole line for `id`, returning the quantity it had.
    pub fn remove(&mut self, id: &str) -> Option<u32> {
        self.entries.remove(id)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn quantity(&self, id: &str) -> u32 {
        self.entries.get(id).copied().unwrap_or(0)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.entries.iter().map(|(id, qty)| (id.as_str(), *qty))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_items(&self) -> u64 {
        self.entries.values().map(|qty| u64::from(*qty)).sum()
    }
}

impl fmt::Display for OrderDraft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (id, qty)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "\"{}\": {}", id, qty)?;
        }
        write!(f, "}}")
    }
}

/// One selected product in an outbound order.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq, Eq)]
pub struct ProductLine {
    #[validate(length(min = 1, message = "Product id is required"))]
    pub id: String,
    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub qty: u32,
}

impl ProductLine {
    pub fn new(id: impl Into<String>, qty: u32) -> Self {
        Self { id: id.into(), qty }
    }
}

/// Payload of the `new_order` event.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq, Eq)]
pub struct NewOrder {
    #[validate(length(min = 1, message = "A table must be selected"))]
    pub table_id: String,
    #[validate(length(min = 1, message = "Select at least one product"))]
    pub products: Vec<ProductLine>,
}

impl NewOrder {
    pub fn validate_lines(&self) -> Result<(), validator::ValidationErrors> {
        self.validate()?;
        for line in &self.products {
            line.validate()?;
        }
        Ok(())
    }
}

/// Server-supplied state of one active order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderStatusRecord {
    #[serde(deserialize_with = "string_or_integer")]
    pub table: String,
    pub status: String,
}

impl OrderStatusRecord {
    pub fn new(table: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            status: status.into(),
        }
    }
}

impl fmt::Display for OrderStatusRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Table: {} | Status: {}", self.table, self.status)
    }
}

/// Payload of `order_status_updated`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderStatusChange {
    pub order_id: i64,
    pub status: String,
}

/// Payload of `order_completed`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderCompletion {
    pub order_id: i64,
    #[serde(deserialize_with = "string_or_integer")]
    pub table_id: String,
}

// Table ids come over the wire either as strings or as integers.
fn string_or_integer<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Identifier {
        Text(String),
        Integer(i64),
    }

    Ok(match Identifier::deserialize(deserializer)? {
        Identifier::Text(text) => text,
        Identifier::Integer(n) => n.to_string(),
    })
}
