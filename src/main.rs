use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use nceda_hub::api::api_routes;
use nceda_hub::config::{AppConfig, StoreLocation};
use nceda_hub::hub::Hub;
use nceda_hub::store::{DocumentStore, LibSqlStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("Invalid configuration")?;

    // Initialize tracing; keep the appender guard alive for the whole run
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (file_layer, _log_guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "nceda-hub.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(file_layer)
        .init();

    eprintln!("🏪 NcedaHub v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   API: http://0.0.0.0:{}/api", config.port);
    match &config.store {
        StoreLocation::Local(path) => eprintln!("   Database: {}", path.display()),
        StoreLocation::Remote { url, .. } => eprintln!("   Database: {url} (remote)"),
    }
    if let Some(dir) = &config.log_dir {
        eprintln!("   Logs: {}", dir.display());
    }

    // ── Document store ──────────────────────────────────────────────────
    let store: Arc<dyn DocumentStore> = Arc::new(
        LibSqlStore::open(&config.store)
            .await
            .context("Failed to open document store")?,
    );

    // ── API server ──────────────────────────────────────────────────────
    let hub = Arc::new(Hub::new(store, config.recent_limit));
    let app = api_routes(hub);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;
    tracing::info!(port = config.port, "API server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await
        .context("API server failed")?;

    Ok(())
}
