use std::sync::Arc;
use anyhow::{Context, Result};
use console::{style, Emoji};
use dialoguer::{Select, theme::ColorfulTheme};
use tokio::sync::mpsc::UnboundedReceiver;

use tracing::{error, info, warn};

use crate::{
    cli::args::*,
    models::{catalog::Catalog, notice::Notice},
    services::{CartService, LiveOrderService},
    transport::{
        encode_outbound, ChannelTransport, ConnectionState, InboundEvent, Transport,
        WebSocketTransport,
    },
    utils::{
        formatting::{
            format_cart_table, format_connection, format_dining_tables, format_money, format_notice,
            format_product_table, format_status_board,
        },
        Config,
    },
};

static CHECKMARK: Emoji<'_, '_> = Emoji("✅ ", "");
static CROSS: Emoji<'_, '_> = Emoji("❌ ", "");
static WARNING: Emoji<'_, '_> = Emoji("⚠️ ", "");
static INFO: Emoji<'_, '_> = Emoji("ℹ️ ", "");
static PLATE: Emoji<'_, '_> = Emoji("🍽️ ", "");

const MENU_ACTIONS: [&str; 7] = [
    "Add item",
    "Remove one",
    "Remove line",
    "Show cart",
    "Clear cart",
    "Submit order",
    "Quit",
];

pub struct CliApp {
    config: Config,
    catalog: Arc<Catalog>,
}

impl CliApp {
    pub fn new(config: Config) -> Result<Self> {
        let catalog = Catalog::load(&config.catalog_path).with_context(|| {
            format!("Failed to load catalog from {}", config.catalog_path.display())
        })?;

        Ok(Self {
            config,
            catalog: Arc::new(catalog),
        })
    }

    pub async fn run(&self, args: Args) -> Result<()> {
        match args.command {
            Commands::Catalog => self.handle_catalog(),
            Commands::Menu => self.handle_menu(),
            Commands::Live { command } => self.handle_live_command(command).await,
        }
    }

    fn handle_catalog(&self) -> Result<()> {
        println!("{} {}", PLATE, style("Tables").bold().cyan());
        let tables = format_dining_tables(&self.catalog);
        if tables.is_empty() {
            println!("{} No tables configured", INFO);
        } else {
            println!("{}", tables);
        }

        println!("{} {}", PLATE, style("Menu").bold().cyan());
        let products = format_product_table(&self.catalog, &self.config.currency_symbol);
        if products.is_empty() {
            println!("{} No products configured", INFO);
        } else {
            println!("{}", products);
        }

        Ok(())
    }

    // Menu (cart) commands
    fn handle_menu(&self) -> Result<()> {
        let theme = ColorfulTheme::default();
        let mut cart = CartService::new(self.catalog.clone());

        println!("{} {}", PLATE, style("Menu").bold().cyan());

        loop {
            self.print_total(&cart);

            let choice = Select::with_theme(&theme)
                .with_prompt("What next?")
                .items(&MENU_ACTIONS[..])
                .default(0)
                .interact_opt()?;

            match choice {
                Some(0) => {
                    if let Some(id) = self.pick_product(&theme)? {
                        cart.add_to_order(&id);
                    }
                }
                Some(1) => {
                    if let Some(id) = self.pick_draft_item(&theme, &cart)? {
                        cart.remove_from_order(&id);
                    }
                }
                Some(2) => {
                    if let Some(id) = self.pick_draft_item(&theme, &cart)? {
                        cart.remove_line(&id);
                    }
                }
                Some(3) => {
                    let table = format_cart_table(&cart.lines(), &self.config.currency_symbol);
                    if table.is_empty() {
                        println!("{} Cart is empty", INFO);
                    } else {
                        println!("{}", table);
                    }
                }
                Some(4) => cart.clear(),
                Some(5) => match cart.submit_order() {
                    Ok(snapshot) => info!("Submitted draft with {} lines", snapshot.len()),
                    Err(e) => warn!("Submit refused: {}", e),
                },
                _ => break,
            }

            self.print_notices(cart.take_notices());
        }

        Ok(())
    }

    fn print_total(&self, cart: &CartService) {
        println!(
            "Total: {}{} ({} items)",
            style(&self.config.currency_symbol).bold(),
            style(cart.total_display()).bold().green(),
            cart.item_count()
        );
        if !cart.unpriced().is_empty() {
            let ids: Vec<&str> = cart.unpriced().iter().map(String::as_str).collect();
            println!(
                "{} Not priced, left out of total: {}",
                WARNING,
                style(ids.join(", ")).yellow()
            );
        }
    }

    fn pick_product(&self, theme: &ColorfulTheme) -> Result<Option<String>> {
        let items: Vec<String> = self
            .catalog
            .products
            .iter()
            .map(|p| {
                format!("{} ({})", p.name, format_money(&self.config.currency_symbol, p.price))
            })
            .collect();
        if items.is_empty() {
            println!("{} No products configured", INFO);
            return Ok(None);
        }

        let choice = Select::with_theme(theme)
            .with_prompt("Add which item?")
            .items(&items[..])
            .default(0)
            .interact_opt()?;
        Ok(choice.map(|i| self.catalog.products[i].id.clone()))
    }

    fn pick_draft_item(&self, theme: &ColorfulTheme, cart: &CartService) -> Result<Option<String>> {
        let ids: Vec<String> = cart.draft().iter().map(|(id, _)| id.to_string()).collect();
        if ids.is_empty() {
            println!("{} Cart is empty", INFO);
            return Ok(None);
        }

        let items: Vec<String> = cart
            .draft()
            .iter()
            .map(|(id, qty)| {
                let name = self
                    .catalog
                    .product(id)
                    .map(|p| p.name.as_str())
                    .unwrap_or(id);
                format!("{} x{}", name, qty)
            })
            .collect();

        let choice = Select::with_theme(theme)
            .with_prompt("Which item?")
            .items(&items[..])
            .default(0)
            .interact_opt()?;
        Ok(choice.map(|i| ids[i].clone()))
    }

    // Live commands
    async fn handle_live_command(&self, command: LiveCommands) -> Result<()> {
        match command {
            LiveCommands::Submit { table, quantities, dry_run } => {
                self.handle_submit(table, quantities, dry_run).await
            }
            LiveCommands::Watch => self.handle_watch().await,
        }
    }

    async fn handle_submit(
        &self,
        table: Option<String>,
        quantities: Vec<String>,
        dry_run: bool,
    ) -> Result<()> {
        let mut service = LiveOrderService::new(self.catalog.clone());

        if let Some(table) = table {
            service.select_table(&table)?;
        }
        for arg in &quantities {
            let (id, raw) = split_quantity_arg(arg)
                .ok_or_else(|| anyhow::anyhow!("Expected ID=QTY, got '{}'", arg))?;
            service.set_quantity(id, raw)?;
        }

        let result = if dry_run {
            let (transport, mut sent) = ChannelTransport::pair();
            service.on_connection_change(transport.state());
            let result = service.submit(&transport).await;
            while let Ok(event) = sent.try_recv() {
                println!("{} {}", INFO, encode_outbound(&event)?);
            }
            result
        } else {
            // The reader task stops once the inbound receiver is dropped.
            let (transport, _inbound) = self.connect(&mut service).await?;
            let result = service.submit(&transport).await;
            if let Err(e) = transport.close().await {
                warn!("Failed to close connection cleanly: {}", e);
            }
            result
        };

        self.print_notices(service.take_notices());

        match result {
            Ok(order) => {
                println!(
                    "{} Order sent for table {} ({} products)",
                    CHECKMARK,
                    style(&order.table_id).cyan(),
                    order.products.len()
                );
                for line in &order.products {
                    let name = self
                        .catalog
                        .product(&line.id)
                        .map(|p| p.name.as_str())
                        .unwrap_or(line.id.as_str());
                    println!("  {} x{}", style(name).green(), line.qty);
                }
            }
            Err(e) => {
                println!("{} Order not sent: {}", CROSS, style(&e).red());
                error!("Order not sent: {}", e);
            }
        }

        Ok(())
    }

    async fn handle_watch(&self) -> Result<()> {
        let mut service = LiveOrderService::new(self.catalog.clone());
        let (transport, mut inbound) = self.connect(&mut service).await?;

        println!("{} {}", PLATE, style("Orders").bold().cyan());
        println!("{}", format_status_board(service.rendered_lines()));

        loop {
            tokio::select! {
                event = inbound.recv() => match event {
                    Some(event) => {
                        service.handle_inbound(event);
                        println!("{} {}", PLATE, style("Orders").bold().cyan());
                        println!("{}", format_status_board(service.rendered_lines()));
                        self.print_notices(service.take_notices());
                    }
                    None => {
                        service.on_connection_change(ConnectionState::Disconnected);
                        println!("{}", format_connection(service.connection_state()));
                        self.print_notices(service.take_notices());
                        break;
                    }
                },
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted, closing connection");
                    if let Err(e) = transport.close().await {
                        warn!("Failed to close connection cleanly: {}", e);
                    }
                    break;
                }
            }
        }

        Ok(())
    }

    async fn connect(
        &self,
        service: &mut LiveOrderService,
    ) -> Result<(WebSocketTransport, UnboundedReceiver<InboundEvent>)> {
        match WebSocketTransport::connect(&self.config.server_url).await {
            Ok((transport, inbound)) => {
                service.on_connection_change(transport.state());
                println!("{}", format_connection(service.connection_state()));
                self.print_notices(service.take_notices());
                Ok((transport, inbound))
            }
            Err(e) => {
                service.on_connection_change(ConnectionState::Disconnected);
                println!("{}", format_connection(service.connection_state()));
                self.print_notices(service.take_notices());
                Err(e).with_context(|| format!("Failed to connect to {}", self.config.server_url))
            }
        }
    }

    fn print_notices(&self, notices: Vec<Notice>) {
        for notice in notices {
            println!("{}", format_notice(&notice));
        }
    }
}
