//! `tracing` subscriber setup for binaries and tests embedding the engine.
//!
//! The library only emits events; nothing is printed unless a subscriber is installed. The
//! filter is taken from `TAPEGRAPH_LOG`, then `RUST_LOG`, and defaults to `warn`.

use std::env;

use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding tracing directives, e.g. `tapegraph=debug`.
pub const LOG_ENV: &str = "TAPEGRAPH_LOG";

const DEFAULT_DIRECTIVE: &str = "warn";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid tracing directive: {0}")]
    InvalidFilter(String),
    #[error("failed to install global tracing subscriber: {0}")]
    SubscriberInit(#[from] TryInitError),
}

/// Installs a process-wide fmt subscriber filtered by the environment.
pub fn init_tracing() -> Result<(), LoggingError> {
    init_tracing_with(None)
}

/// Installs a process-wide fmt subscriber, preferring explicit `directives` when given.
///
/// Fails with [`LoggingError::SubscriberInit`] when a global subscriber already exists.
pub fn init_tracing_with(directives: Option<&str>) -> Result<(), LoggingError> {
    let filter = resolve_filter(directives)?;
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .try_init()?;
    Ok(())
}

fn resolve_filter(directives: Option<&str>) -> Result<EnvFilter, LoggingError> {
    let explicit = directives.map(str::to_owned).or_else(|| {
        env::var(LOG_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
    });
    match explicit {
        Some(directives) => EnvFilter::try_new(&directives)
            .map_err(|err| LoggingError::InvalidFilter(err.to_string())),
        None => Ok(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))),
    }
}
