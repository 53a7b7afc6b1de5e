//! Diagnostic logging setup.
//!
//! Log lines go to stderr. Stdout is reserved for the decoded packet lines the
//! capture tap prints, so the two can be redirected separately.

use std::io::IsTerminal;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::{ProxyError, Result};

/// Install the global tracing subscriber.
///
/// `filter` (an `EnvFilter` directive such as `"info"` or `"csp_zmqproxy=debug"`)
/// takes precedence over `RUST_LOG`, which takes precedence over the configured level.
pub fn init_logging(config: &LoggingConfig, filter: Option<&str>) -> Result<()> {
    let filter = match filter {
        Some(directive) => EnvFilter::try_new(directive)
            .map_err(|e| ProxyError::ConfigError(format!("Invalid log filter: {e}")))?,
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str().to_lowercase())),
    };

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if config.json_format {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_ansi(std::io::stderr().is_terminal())
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };

    installed.map_err(|e| ProxyError::ConfigError(format!("Failed to initialize logging: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_filter_is_a_config_error() {
        let err = init_logging(&LoggingConfig::default(), Some("csp_zmqproxy=loud")).unwrap_err();
        assert!(matches!(err, ProxyError::ConfigError(_)));
    }
}
