//! parley-server: interaction webhook endpoint for the sample application.
//!
//! Verifies signed interaction webhooks, routes them to the handlers in
//! [`app`], and optionally pushes the command definitions to the platform
//! before serving.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

use parley_http::{router, AppState, CommandRegistrar, Config};

mod app;

#[derive(Parser, Debug)]
#[command(
    name = "parley-server",
    version,
    about = "Verify signed interaction webhooks and dispatch them to registered handlers"
)]
struct Args {
    /// HTTP bind address (overrides PARLEY_BIND_ADDR)
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log output format ("text" or "json")
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    log_format: String,

    /// Guilds that get the development variant of /echo (comma-separated)
    #[arg(long, value_delimiter = ',')]
    dev_guild: Vec<String>,

    /// Push command definitions to the platform before serving
    #[arg(long)]
    register_commands: bool,

    /// Push command definitions and exit without serving
    #[arg(long)]
    register_only: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, &args.log_format);

    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }

    let registry = app::registry(args.dev_guild.iter().map(String::as_str))
        .context("Invalid command declarations")?;
    let registry = Arc::new(registry);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        bind = %config.bind_addr,
        path = %config.interactions_path,
        global_commands = registry.global_len(),
        guild_commands = registry.guild_len(),
        "Starting parley-server"
    );
    if config.public_key.is_none() {
        warn!("DISCORD_PUBLIC_KEY is not set; every interaction will be refused with 500");
    }

    if args.register_commands || args.register_only {
        let registrar = CommandRegistrar::from_config(&config)?;
        registrar
            .register(&registry)
            .await
            .context("Failed to register commands")?;
        if args.register_only {
            return Ok(());
        }
    }

    let app = router(
        AppState::new(Arc::clone(&registry), config.public_key.clone()),
        &config.interactions_path,
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    info!("Listening on http://{}{}", config.bind_addr, config.interactions_path);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("parley-server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("received Ctrl+C, shutting down..."),
        Err(e) => {
            error!("failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    }
}

fn init_logging(level: &str, format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_level(true))
            .init();
    }
}
