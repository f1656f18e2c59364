//! Log output for test runs.
//!
//! Element actions emit `tracing` events with `element`, `action` and
//! `condition` fields. This module installs the subscriber that prints them.

use crate::config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output format for log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human readable, one line per event
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

impl LogFormat {
    /// Parse a format name; anything other than `json` is pretty
    #[must_use]
    pub fn parse(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    /// Output format
    pub format: LogFormat,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl LogSettings {
    /// Settings taken from `logLevel` and `logFormat`
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            level: config.log_level(),
            format: LogFormat::parse(&config.log_format()),
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.level))
            .unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Install the global subscriber
///
/// Safe to call from every test: only the first call installs anything, and
/// a subscriber set up elsewhere is left alone. Output goes to the test
/// writer so `cargo test` captures it per test.
pub fn init(settings: &LogSettings) {
    let registry = tracing_subscriber::registry().with(settings.filter());
    let _ = match settings.format {
        LogFormat::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .compact()
                    .with_test_writer(),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_test_writer(),
            )
            .try_init(),
    };
}

/// Install the subscriber using the configured level and format
pub fn init_from_config(config: &Config) {
    init(&LogSettings::from_config(config));
}
