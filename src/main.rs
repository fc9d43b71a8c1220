use anyhow::{Context, Result};
use clap::Parser;
use miku::config::Config;
use miku::handler::MessageHandler;
use miku::registry::ProviderRegistry;
use miku::resolver::Resolver;
use miku::server;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG overrides, e.g. RUST_LOG=miku=debug,streaming_providers=debug
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    let config = Config::parse();

    tracing::info!("Starting Miku v{}", miku::VERSION);
    match &config.channel_id {
        Some(channel_id) => tracing::info!("Listening to channel {}", channel_id),
        None => tracing::info!("Listening to all channels"),
    }

    let registry = ProviderRegistry::from_config(&config)
        .await
        .context("Failed to initialize streaming providers")?;
    let resolver = Arc::new(Resolver::new(Arc::new(registry), config.resolver_options()));
    let handler = Arc::new(MessageHandler::new(resolver.clone(), config.handler_config()));

    let app = server::create_router(resolver, handler);
    let addr = config.listen_addr();

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("API endpoints:");
    tracing::info!("  GET  /              - API info");
    tracing::info!("  GET  /providers     - Enabled providers");
    tracing::info!("  POST /messages      - Reply to a chat message");
    tracing::info!("  POST /resolve       - Resolve a single link");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutting down...");
}
