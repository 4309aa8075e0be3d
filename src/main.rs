use anyhow::Result;
use clap::Parser;
use restaurant_order_client::{
    cli::{Args, CliApp},
    utils::Config,
};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::from_env_file(path)?,
        None => Config::from_env()?,
    };

    let filter = if args.verbose {
        "debug".to_string()
    } else {
        config.log_level.clone()
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .init();

    tracing::info!("🍽️ Order CLI starting...");
    tracing::info!(
        "Configuration loaded for {} environment, server {}",
        config.environment,
        config.server_url
    );

    let app = CliApp::new(config).map_err(|e| {
        tracing::error!("Failed to start: {:#}", e);
        e
    })?;
    app.run(args).await?;

    tracing::info!("🍽️ Order CLI stopped");
    Ok(())
}
