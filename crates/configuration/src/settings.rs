use crate::error::ConfigError;
use core_types::WindowMinutes;
use serde::Deserialize;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub upstream: UpstreamSettings,
    pub aggregation: AggregationSettings,
    pub logging: LoggingSettings,
}

/// Where the HTTP server listens.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: IpAddr,
    pub port: u16,
}

impl ServerSettings {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Connection parameters for the upstream price-history provider.
#[derive(Clone, Deserialize)]
pub struct UpstreamSettings {
    /// Base URL of the provider, e.g. `http://host/evaluation-service`.
    pub base_url: String,
    /// Bearer token sent with every upstream request. Must never be logged.
    pub token: String,
    /// Per-request timeout, covering connect through to the end of the body.
    pub timeout_secs: u64,
    /// Extra attempts after a failed request. Zero means a single attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubled on every further attempt.
    pub retry_backoff_ms: u64,
}

// Hand-written so the token never reaches the logs through `{:?}`.
impl fmt::Debug for UpstreamSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamSettings")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .finish()
    }
}

/// Parameters for the aggregation endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct AggregationSettings {
    /// Window used by the average and correlation endpoints when the
    /// request does not carry `minutes`.
    pub default_window_minutes: WindowMinutes,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// An `EnvFilter` directive. `RUST_LOG` takes precedence when set.
    pub filter: String,
    /// When set, logs are also written to a daily rolling file in this directory.
    pub directory: Option<PathBuf>,
}

impl Settings {
    /// Checks the invariants that serde alone cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upstream.token.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "upstream.token must be set (e.g. via STOCKAGG__UPSTREAM__TOKEN)".to_string(),
            ));
        }
        if !(self.upstream.base_url.starts_with("http://")
            || self.upstream.base_url.starts_with("https://"))
        {
            return Err(ConfigError::ValidationError(format!(
                "upstream.base_url must be an http(s) URL, got '{}'",
                self.upstream.base_url
            )));
        }
        if self.upstream.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "upstream.timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Command-line overrides for the few settings an operator changes per run.
#[cfg(feature = "clap")]
#[derive(Debug, Clone, Default, clap::Args)]
pub struct CliOverrides {
    /// Port to listen on, overriding `server.port`.
    #[arg(long)]
    pub port: Option<u16>,

    /// Base URL of the upstream price provider, overriding `upstream.base_url`.
    #[arg(long)]
    pub upstream_url: Option<String>,
}

#[cfg(feature = "clap")]
impl CliOverrides {
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if let Some(url) = &self.upstream_url {
            settings.upstream.base_url = url.clone();
        }
    }
}
