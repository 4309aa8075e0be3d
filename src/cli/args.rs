use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "order-cli")]
#[command(about = "Terminal front end for placing and following restaurant table orders")]
#[command(version = "0.1.0")]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Env file to load configuration from
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the tables and products of the catalog
    Catalog,
    /// Build an order interactively and watch the total
    Menu,
    /// Talk to the live order server
    Live {
        #[command(subcommand)]
        command: LiveCommands,
    },
}

#[derive(Subcommand)]
pub enum LiveCommands {
    /// Send a new order for a table
    Submit {
        /// Table the order is for (defaults to the first catalog table)
        #[arg(short, long)]
        table: Option<String>,
        /// Product quantity as ID=QTY, repeatable
        #[arg(short, long = "qty", value_name = "ID=QTY")]
        quantities: Vec<String>,
        /// Print the outgoing event instead of sending it
        #[arg(long)]
        dry_run: bool,
    },
    /// Follow order status updates until the connection closes
    Watch,
}

/// Splits an `ID=QTY` argument. The quantity text is kept raw so the order
/// form applies its own parsing rules to it.
pub fn split_quantity_arg(arg: &str) -> Option<(&str, &str)> {
    let (id, qty) = arg.split_once('=')?;
    let id = id.trim();
    if id.is_empty() {
        return None;
    }
    Some((id, qty))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_quantity_arg() {
        assert_eq!(split_quantity_arg("a=2"), Some(("a", "2")));
        assert_eq!(split_quantity_arg(" b = x"), Some(("b", " x")));
        assert_eq!(split_quantity_arg("c"), None);
        assert_eq!(split_quantity_arg("=3"), None);
    }

    #[test]
    fn test_parse_submit_args() {
        let args = Args::try_parse_from([
            "order-cli", "live", "submit", "--table", "5", "-q", "a=2", "-q", "c=1", "--dry-run",
        ])
        .unwrap();
        match args.command {
            Commands::Live {
                command: LiveCommands::Submit { table, quantities, dry_run },
            } => {
                assert_eq!(table.as_deref(), Some("5"));
                assert_eq!(quantities, vec!["a=2", "c=1"]);
                assert!(dry_run);
            }
            _ => panic!("expected live submit"),
        }
    }
}
