//! TagSense Reader - Main entry point
//!
//! Runs the inventory-tag reading service: session controller plus the HTTP
//! control API and event stream.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tagsense_common::EventBus;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tagsense_reader::api::{self, AppState};
use tagsense_reader::config::{Config, ConfigOverrides, ReaderDriver};
use tagsense_reader::notify::NotificationDispatcher;
use tagsense_reader::reader::build_adapter;
use tagsense_reader::session::{SessionController, SessionSettings};

/// Command-line arguments for tagsense-reader
#[derive(Parser, Debug)]
#[command(name = "tagsense-reader")]
#[command(about = "Inventory-tag reading service")]
#[command(version)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, env = "TAGSENSE_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind the HTTP server to
    #[arg(long, env = "TAGSENSE_BIND")]
    bind: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "TAGSENSE_PORT")]
    port: Option<u16>,

    /// Reader adapter to use
    #[arg(long, value_enum, env = "TAGSENSE_DRIVER")]
    driver: Option<ReaderDriver>,

    /// Initial notification threshold
    #[arg(long, env = "TAGSENSE_THRESHOLD")]
    threshold: Option<u32>,

    /// Threshold notification URL (empty disables notifications)
    #[arg(long, env = "TAGSENSE_NOTIFY_URL")]
    notify_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load(ConfigOverrides {
        config_path: args.config,
        bind: args.bind,
        port: args.port,
        driver: args.driver,
        threshold: args.threshold,
        notify_url: args.notify_url,
    })
    .context("Failed to load configuration")?;

    // Initialize tracing; RUST_LOG takes precedence over the configured level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting TagSense Reader (tagsense-reader) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!(
        "Reader driver: {:?}, port COM{}, {} baud, address 0x{:02X}",
        config.reader.driver,
        config.reader.com_port,
        config.reader.baud_rate.bits_per_second(),
        config.reader.address
    );

    let events = Arc::new(EventBus::new(config.server.event_capacity));
    let notifier = NotificationDispatcher::new(&config.notification, Arc::clone(&events))
        .context("Failed to initialize notification client")?;
    if !notifier.is_enabled() {
        info!("Threshold notifications disabled");
    }

    let controller = Arc::new(SessionController::new(
        build_adapter(&config.reader),
        events,
        notifier,
        SessionSettings::from_config(&config),
    ));

    if config.session.autostart {
        controller
            .start()
            .await
            .context("Failed to start reading session")?;
    }

    let app = api::build_router(AppState::new(Arc::clone(&controller)));

    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "Invalid bind address {}:{}",
                config.server.bind, config.server.port
            )
        })?;

    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    controller.shutdown().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
