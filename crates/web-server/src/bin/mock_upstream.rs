use configuration::{telemetry::init_tracing, LoggingSettings};
use std::net::SocketAddr;
use web_server::mock::MockUpstream;

/// Port used when `MOCK_UPSTREAM_PORT` is not set.
const DEFAULT_PORT: u16 = 3001;

// Serves the NVDA fixture on the provider's paths, for running the service
// locally with `--upstream-url http://localhost:3001`.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _guard = init_tracing(&LoggingSettings {
        filter: "info".to_string(),
        directory: None,
    })?;

    let port = match std::env::var("MOCK_UPSTREAM_PORT") {
        Ok(raw) => raw.parse::<u16>()?,
        Err(_) => DEFAULT_PORT,
    };
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Mock stock service running at http://{}", listener.local_addr()?);
    axum::serve(listener, MockUpstream::nvda_fixture().router()).await?;
    Ok(())
}
