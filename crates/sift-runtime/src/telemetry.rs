use sift_core::errors::{SiftError, SiftResult};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global tracing subscriber. `RUST_LOG` overrides the default
/// `info` filter. Fails if a subscriber is already installed.
pub fn init_tracing(json: bool) -> SiftResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if json {
        registry
            .with(fmt::layer().json().with_target(true).with_current_span(true))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .try_init()
    };

    installed.map_err(|e| SiftError::ConfigError(format!("tracing already initialized: {e}")))?;
    tracing::info!(json, "tracing initialized");
    Ok(())
}
