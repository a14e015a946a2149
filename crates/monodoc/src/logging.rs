//! Tracing subscriber bootstrap for hosts without their own.

use monodoc_common::{OdmError, Result};
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;

fn default_directive() -> &'static str {
    if cfg!(debug_assertions) {
        "monodoc=debug"
    } else {
        "monodoc=info"
    }
}

/// `RUST_LOG` wins, then the configured filter, then the build default.
fn env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if std::env::var_os("RUST_LOG").is_some() {
        return Ok(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directive())));
    }
    match config.filter.as_deref() {
        Some(directive) => EnvFilter::try_new(directive)
            .map_err(|e| OdmError::Config(format!("invalid log filter {directive:?}: {e}"))),
        None => Ok(EnvFilter::new(default_directive())),
    }
}

/// Install a global subscriber writing compact lines to stderr.
///
/// Fails when the filter does not parse or a subscriber is already set.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_timer(tracing_subscriber::fmt::time::time())
        .compact();

    Registry::default()
        .with(env_filter(config)?)
        .with(stderr_layer)
        .try_init()
        .map_err(|e| OdmError::Config(format!("logging already initialised: {e}")))
}
