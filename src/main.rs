use catalog_search::api::{QueryService, router};
use catalog_search::config::{CliArgs, ServiceConfig};
use catalog_search::sync::CatalogSynchronizer;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        eprintln!("Usage: catalog-search [--bind <addr:port>] [--catalog <file.json>]");
        eprintln!("Example: SHEET_ID=... SHEETS_API_KEY=... catalog-search --bind 127.0.0.1:8081");
        eprintln!("Example: catalog-search --catalog ./catalog.json");
        std::process::exit(1);
    }

    let cli = CliArgs::parse(&args)?;
    let config = ServiceConfig::from_env(&cli)?;

    // 1. Catalog synchronizer:
    let source = config.source.build();
    tracing::info!("Catalog source: {}", source.describe());
    let synchronizer = CatalogSynchronizer::new(source, config.sync_options());

    // 2. Polling loop (first tick loads the catalog):
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let poller = synchronizer.clone().spawn_polling(shutdown_rx);

    // 3. HTTP router:
    let app = router(QueryService::new(synchronizer, config.default_limit));

    // 4. Start HTTP server:
    tracing::info!("HTTP server listening on {}", config.bind_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
            tracing::info!("Shutting down");
            let _ = shutdown_tx.send(true);
        })
        .await?;

    poller.await?;

    Ok(())
}
