//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::config::ServiceSettings;
use crate::error::{Result, ServiceError};

/// Install the global subscriber. `RUST_LOG` overrides `settings.log_level`.
///
/// # Errors
///
/// [`ServiceError::Config`] for an invalid filter, or if a global
/// subscriber is already installed.
pub fn init_tracing(settings: &ServiceSettings) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_level))
        .map_err(|e| ServiceError::Config(format!("log filter: {e}")))?;

    let installed = if settings.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).try_init()
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).try_init()
    };
    installed.map_err(|e| ServiceError::Config(format!("tracing init: {e}")))
}
