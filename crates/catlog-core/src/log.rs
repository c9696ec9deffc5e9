//! Diagnostics for the logging engine itself.
//!
//! Sink failures, listener panics, timer lifecycle and configuration
//! changes are reported through `tracing`. Applications that don't install
//! a subscriber of their own can use these helpers.

use catlog_types::{CatlogError, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_DIRECTIVE: &str = "catlog_core=warn";

/// Install a stderr subscriber filtered by `RUST_LOG`, falling back to
/// [`DEFAULT_DIRECTIVE`].
pub fn init_default() -> Result<()> {
    init_from_env(DEFAULT_DIRECTIVE)
}

/// Install a stderr subscriber filtered by `RUST_LOG`, falling back to
/// `default_directive`.
///
/// # Errors
///
/// `Config` if the fallback directive does not parse; `Other` if a global
/// subscriber is already installed.
pub fn init_from_env(default_directive: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .map_err(|e| {
            CatlogError::Config(format!("Invalid log filter '{}': {}", default_directive, e))
        })?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(filter)
        .try_init()
        .map_err(|e| CatlogError::Other(format!("Failed to initialize diagnostics: {}", e)))
}
