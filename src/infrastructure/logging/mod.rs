//! Tracing-based logging setup.

use std::io;

use anyhow::{bail, Result};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::domain::models::LoggingConfig;

/// Holds the appender guard so buffered log lines flush on drop.
pub struct Logging {
    _guard: Option<WorkerGuard>,
}

impl Logging {
    /// Initialize the global subscriber: a stderr layer in the
    /// configured format, plus a daily-rolling JSON file layer when a
    /// log directory is set. `RUST_LOG` overrides the configured level.
    pub fn init(config: &LoggingConfig) -> Result<Self> {
        let default_level = parse_log_level(&config.level)?;
        let env_filter = EnvFilter::builder()
            .with_default_directive(default_level.into())
            .from_env_lossy();

        let guard = if let Some(ref log_dir) = config.log_dir {
            let file_appender = rolling::daily(log_dir, "cadence.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let file_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_filter(env_filter.clone());

            match config.format.as_str() {
                "json" => {
                    let stderr_layer = tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(io::stderr)
                        .with_filter(env_filter);
                    tracing_subscriber::registry()
                        .with(file_layer)
                        .with(stderr_layer)
                        .init();
                }
                _ => {
                    let stderr_layer = tracing_subscriber::fmt::layer()
                        .with_writer(io::stderr)
                        .with_filter(env_filter);
                    tracing_subscriber::registry()
                        .with(file_layer)
                        .with(stderr_layer)
                        .init();
                }
            }
            Some(guard)
        } else {
            match config.format.as_str() {
                "json" => {
                    let stderr_layer = tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(io::stderr)
                        .with_filter(env_filter);
                    tracing_subscriber::registry().with(stderr_layer).init();
                }
                _ => {
                    let stderr_layer = tracing_subscriber::fmt::layer()
                        .with_writer(io::stderr)
                        .with_filter(env_filter);
                    tracing_subscriber::registry().with(stderr_layer).init();
                }
            }
            None
        };

        Ok(Self { _guard: guard })
    }
}

fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        other => bail!("invalid log level: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("info").unwrap(), Level::INFO);
        assert_eq!(parse_log_level("WARN").unwrap(), Level::WARN);
        assert!(parse_log_level("loud").is_err());
    }
}
