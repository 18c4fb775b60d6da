use aggregator::StockAggregator;
use api_client::StockExchangeClient;
use axum::{routing::get, Router};
use configuration::Settings;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;
pub mod mock;

/// The shared application state that all handlers can access.
#[derive(Clone)]
pub struct AppState {
    pub aggregator: StockAggregator,
}

/// Builds the application router over an already-wired aggregator.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any());

    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/stocks", get(handlers::get_stocks))
        .route("/stocks/:ticker", get(handlers::get_stock))
        .route("/stockcorrelation", get(handlers::get_stock_correlation))
        .with_state(state)
        .layer(cors)
        // Logs every incoming request and its latency.
        .layer(TraceLayer::new_for_http())
}

/// Wires the live upstream client into a router according to `settings`.
pub fn build_app(settings: &Settings) -> anyhow::Result<Router> {
    let client = StockExchangeClient::new(&settings.upstream)?;
    let aggregator = StockAggregator::new(
        Arc::new(client),
        settings.aggregation.default_window_minutes,
    );
    Ok(router(Arc::new(AppState { aggregator })))
}

/// The main function to configure and run the web server.
///
/// Tracing must already be initialised by the caller.
pub async fn run_server(settings: &Settings) -> anyhow::Result<()> {
    let app = build_app(settings)?;
    tracing::info!(
        upstream = %settings.upstream.base_url,
        timeout_secs = settings.upstream.timeout_secs,
        max_retries = settings.upstream.max_retries,
        "Upstream client configured."
    );

    let listener = TcpListener::bind(settings.server.socket_addr()).await?;
    tracing::info!("Web server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Web server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for the shutdown signal.");
        // Without a signal handler, keep serving rather than exiting at once.
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received.");
}
