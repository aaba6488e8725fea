//! Studio admin server.
//!
//! ```text
//!     Client ──▶ request id ─▶ trace ─▶ timeout ─▶ security headers
//!                                                     │
//!                     ┌───────────────────────────────┼──────────────────────┐
//!                     ▼                               ▼                      ▼
//!              /api/auth/login                 /api/upload*           /api/* (other)
//!         lockout ▶ login throttle      upload throttle ▶ session      api throttle
//!                     │                               │                      │
//!                     ▼                               ▼                      ▼
//!              sessions (cookie)              media store (disk)     media, youtube,
//!                                                                    admin report
//!
//!     everything else ──▶ admin page guard ──▶ static files (public/)
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use studio_server::config::load_or_default;
use studio_server::lifecycle::Shutdown;
use studio_server::observability::{logging, metrics};
use studio_server::StudioServer;

#[derive(Parser)]
#[command(name = "studio-server", version, about = "Studio site and admin API server")]
struct Args {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(short, long, env = "STUDIO_CONFIG")]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = load_or_default(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    logging::init(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "studio-server starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        public_dir = %config.site.public_dir,
        uploads_dir = %config.uploads.dir,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.auth.uses_default_password() {
        tracing::warn!("Admin password is the built-in placeholder; set STUDIO_ADMIN_PASSWORD");
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = StudioServer::new(config);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
