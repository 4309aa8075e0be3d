use chrono::Local;
use console::style;
use tabled::{Table, Tabled, settings::{Style, Alignment}};

use crate::{
    models::{
        catalog::Catalog,
        notice::{Notice, NoticeKind},
    },
    services::cart_service::CartLine,
    transport::ConnectionState,
};

#[derive(Tabled)]
struct ProductTableRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Price")]
    price: String,
}

#[derive(Tabled)]
struct DiningTableRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Table")]
    name: String,
}

#[derive(Tabled)]
struct CartTableRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Item")]
    name: String,
    #[tabled(rename = "Qty")]
    qty: u32,
    #[tabled(rename = "Price")]
    unit_price: String,
    #[tabled(rename = "Subtotal")]
    subtotal: String,
}

pub fn format_money(currency: &str, amount: f64) -> String {
    format!("{}{:.2}", currency, amount)
}

pub fn format_product_table(catalog: &Catalog, currency: &str) -> String {
    if catalog.products.is_empty() {
        return String::new();
    }

    let rows: Vec<ProductTableRow> = catalog
        .products
        .iter()
        .map(|product| ProductTableRow {
            id: product.id.clone(),
            name: if product.name.chars().count() > 30 {
                format!("{}...", product.name.chars().take(27).collect::<String>())
            } else {
                product.name.clone()
            },
            category: product.category.clone().unwrap_or_else(|| "-".to_string()),
            price: format_money(currency, product.price),
        })
        .collect();

    let mut table = Table::new(rows);
    table
        .with(Style::rounded())
        .with(Alignment::left());

    table.to_string()
}

pub fn format_dining_tables(catalog: &Catalog) -> String {
    if catalog.tables.is_empty() {
        return String::new();
    }

    let rows: Vec<DiningTableRow> = catalog
        .tables
        .iter()
        .map(|table| DiningTableRow {
            id: table.id.clone(),
            name: table.name.clone(),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table.to_string()
}

pub fn format_cart_table(lines: &[CartLine], currency: &str) -> String {
    if lines.is_empty() {
        return String::new();
    }

    let rows: Vec<CartTableRow> = lines
        .iter()
        .map(|line| CartTableRow {
            id: line.id.clone(),
            name: line.name.clone(),
            qty: line.qty,
            unit_price: format_money(currency, line.unit_price),
            subtotal: format_money(currency, line.subtotal),
        })
        .collect();

    let mut table = Table::new(rows);
    table
        .with(Style::rounded())
        .with(Alignment::left());

    table.to_string()
}

pub fn format_status_board(lines: &[String]) -> String {
    if lines.is_empty() {
        return style("No active orders").dim().to_string();
    }

    lines
        .iter()
        .map(|line| format!("  • {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_notice(notice: &Notice) -> String {
    let time = notice.raised_at.with_timezone(&Local).format("%H:%M:%S");
    let body = match &notice.kind {
        NoticeKind::OrderSnapshot { .. } => style(notice.to_string()).green(),
        NoticeKind::Warning { .. } => style(notice.to_string()).yellow(),
        NoticeKind::Info { .. } => style(notice.to_string()).cyan(),
        NoticeKind::Disconnected => style(notice.to_string()).red().bold(),
    };
    format!("{} {}", style(time).dim(), body)
}

pub fn format_connection(state: ConnectionState) -> String {
    match state {
        ConnectionState::Connecting => style("Connecting...").yellow().to_string(),
        ConnectionState::Connected => style("Connected").green().to_string(),
        ConnectionState::Disconnected => style("Disconnected").red().bold().to_string(),
    }
}
