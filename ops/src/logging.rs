//! # Structured Logging
//!
//! Sets up the `tracing` subscriber for the operator binary: pretty or JSON
//! lines, filtered by `RUST_LOG` when set.
//!
//! Logs go to stderr. Stdout carries the command's own output (vault
//! descriptions, generated passwords) so it can be piped.

use clap::ValueEnum;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable output for interactive runs.
    Pretty,
    /// One JSON object per line, for CI and log collectors.
    Json,
}

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "credbull_ops=info,credbull_sdk=info";

/// Installs the global subscriber. Call once, first thing in `main()`.
///
/// `RUST_LOG` overrides `default_filter`, e.g.
///
/// ```text
/// RUST_LOG=credbull_ops=debug,credbull_sdk=debug
/// ```
pub fn init_logging(default_filter: &str, format: LogFormat) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    match format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(false)
                        .with_file(false),
                )
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr).with_target(true))
                .init();
        }
    }

    tracing::debug!(?format, "logging initialized");
}
