use crate::error::ConfigError;
use config::builder::DefaultState;
use config::ConfigBuilder;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;
pub mod telemetry;

// Re-export the core types to provide a clean public API.
#[cfg(feature = "clap")]
pub use settings::CliOverrides;
pub use settings::{
    AggregationSettings, LoggingSettings, ServerSettings, Settings, UpstreamSettings,
};

/// Prefix of the environment variables that override file settings,
/// e.g. `STOCKAGG__UPSTREAM__TOKEN` or `STOCKAGG__SERVER__PORT`.
pub const ENV_PREFIX: &str = "STOCKAGG";

/// Loads the application configuration.
///
/// Sources are layered from lowest to highest precedence: built-in defaults,
/// the TOML file (`path`, or an optional `config.toml` in the working
/// directory), then `STOCKAGG__*` environment variables. The result is
/// validated before it is returned.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let file = match path {
        Some(path) => config::File::from(path).required(true),
        None => config::File::with_name("config").required(false),
    };

    let builder = with_defaults(config::Config::builder())?
        .add_source(file)
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        );

    finish(builder)
}

/// Registers the defaults that let the service start with only a token set.
fn with_defaults(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 3000)?
        .set_default("upstream.base_url", "http://20.244.56.144/evaluation-service")?
        .set_default("upstream.token", "")?
        .set_default("upstream.timeout_secs", 5)?
        .set_default("upstream.max_retries", 0)?
        .set_default("upstream.retry_backoff_ms", 200)?
        .set_default("aggregation.default_window_minutes", 5)?
        .set_default("logging.filter", "info")?)
}

fn finish(builder: ConfigBuilder<DefaultState>) -> Result<Settings, ConfigError> {
    let settings = builder.build()?.try_deserialize::<Settings>()?;
    settings.validate()?;
    Ok(settings)
}
