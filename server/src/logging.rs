use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};
use crate::error::ServerError;

/// Builds the event filter: `RUST_LOG` when set, otherwise the configured level.
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter, ServerError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| ServerError::Logging(format!("invalid level {:?}: {e}", config.level))),
    }
}

/// Installs the global `tracing` subscriber. Logs go to stderr so that stdout stays
/// free for command output.
pub fn init_logging(config: &LoggingConfig) -> Result<(), ServerError> {
    let filter = env_filter(config)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let result = match config.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|e| ServerError::Logging(e.to_string()))
}
