//! Tracing setup.
//!
//! Diagnostics go to stderr only; stdout carries answers and chat
//! output. Filtering follows `RUST_LOG` unless the configuration
//! supplies an explicit level.

use tracing_subscriber::EnvFilter;

use crate::error::{AppError, AppResult};

/// Install the global tracing subscriber.
///
/// An explicit `log_level` wins over `RUST_LOG`; with neither, "info".
/// ANSI escapes are dropped when `no_color` is set or the `NO_COLOR`
/// convention is present in the environment.
pub fn init_logging(log_level: Option<&str>, no_color: bool) -> AppResult<()> {
    let directives = log_level
        .map(str::to_owned)
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| "info".to_string());

    let filter = EnvFilter::try_new(&directives)
        .map_err(|e| AppError::Config(format!("Bad log filter '{}': {}", directives, e)))?;

    let ansi = !no_color && std::env::var_os("NO_COLOR").is_none();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_ansi(ansi)
        .try_init()
        .map_err(|e| AppError::Config(format!("Failed to install tracing subscriber: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging() {
        // Only one subscriber can be installed per process; a second
        // call reports the conflict instead of panicking
        let result = init_logging(None, false);
        assert!(result.is_ok() || result.is_err());
    }

    #[test]
    fn test_invalid_filter_rejected() {
        assert!(init_logging(Some("not==a=filter"), true).is_err());
    }
}
