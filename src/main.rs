//! Gateway binary: load configuration, compile templates, serve.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use request_gateway::{load_config, GatewayServer, Shutdown};

#[derive(Parser)]
#[command(name = "request-gateway")]
#[command(about = "HTTP gateway that synthesizes outbound requests from inbound ones", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "gateway.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "request_gateway=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = load_config(&cli.config)?;
    tracing::info!(
        config = %cli.config.display(),
        bind_address = %config.listener.bind_address,
        locations = config.locations.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    shutdown.trigger_on_ctrl_c();
    let rx = shutdown.subscribe();

    let server = GatewayServer::new(config)?;
    server.run(listener, rx).await?;

    tracing::info!("shutdown complete");
    Ok(())
}
