//! Logging setup for the container
//!
//! The container emits structured `tracing` events under the `servitor`
//! target at registration and resolution points. This module wires up a
//! subscriber for hosts that do not bring their own.
//!
//! # Features
//!
//! - `logging` - emit tracing events (default)
//! - `logging-json` - JSON subscriber output (production)
//! - `logging-pretty` - colorful subscriber output (development)
//!
//! # Example
//!
//! ```rust,ignore
//! use servitor::logging;
//!
//! logging::builder()
//!     .with_level(tracing::Level::TRACE)
//!     .container_only()
//!     .pretty()
//!     .init();
//! ```

#[cfg(feature = "logging")]
use tracing::Level;

/// Subscriber output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// JSON structured output
    #[default]
    Json,
    /// Colorful human-readable output
    Pretty,
    /// Compact single-line output
    Compact,
}

/// Builder for subscriber configuration
#[cfg(feature = "logging")]
#[derive(Debug, Clone)]
pub struct LoggingBuilder {
    level: Level,
    format: LogFormat,
    target: Option<&'static str>,
}

#[cfg(feature = "logging")]
impl Default for LoggingBuilder {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            format: LogFormat::Json,
            target: None,
        }
    }
}

#[cfg(feature = "logging")]
impl LoggingBuilder {
    /// Create a builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum log level
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Only show logs from a specific target
    pub fn with_target_filter(mut self, target: &'static str) -> Self {
        self.target = Some(target);
        self
    }

    /// Only show this container's logs
    pub fn container_only(self) -> Self {
        self.with_target_filter("servitor")
    }

    /// Use JSON output
    pub fn json(mut self) -> Self {
        self.format = LogFormat::Json;
        self
    }

    /// Use pretty output
    pub fn pretty(mut self) -> Self {
        self.format = LogFormat::Pretty;
        self
    }

    /// Use compact single-line output
    pub fn compact(mut self) -> Self {
        self.format = LogFormat::Compact;
        self
    }

    /// Install the subscriber with the configured settings.
    ///
    /// Requires either the `logging-json` or `logging-pretty` feature.
    #[cfg(any(feature = "logging-json", feature = "logging-pretty"))]
    pub fn init(self) {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        let filter = if let Some(target) = self.target {
            EnvFilter::new(format!("{}={}", target, self.level))
        } else {
            EnvFilter::new(self.level.to_string())
        };

        match self.format {
            LogFormat::Json => {
                #[cfg(feature = "logging-json")]
                {
                    let layer = fmt::layer().json().with_target(true);
                    tracing_subscriber::registry().with(filter).with(layer).init();
                }
                #[cfg(not(feature = "logging-json"))]
                {
                    let layer = fmt::layer().with_target(true);
                    tracing_subscriber::registry().with(filter).with(layer).init();
                }
            }
            LogFormat::Pretty => {
                let layer = fmt::layer().pretty().with_target(true);
                tracing_subscriber::registry().with(filter).with(layer).init();
            }
            LogFormat::Compact => {
                let layer = fmt::layer().compact().with_target(true);
                tracing_subscriber::registry().with(filter).with(layer).init();
            }
        }
    }

    /// Install the subscriber (no-op without a subscriber feature)
    #[cfg(not(any(feature = "logging-json", feature = "logging-pretty")))]
    pub fn init(self) {
        // No subscriber compiled in; events still flow to whatever
        // subscriber the host installed.
    }
}

/// Create a new logging builder
#[cfg(feature = "logging")]
pub fn builder() -> LoggingBuilder {
    LoggingBuilder::new()
}

/// Install a JSON subscriber at DEBUG level
#[cfg(feature = "logging")]
pub fn init_json() {
    builder().json().init();
}

/// Install a pretty subscriber at DEBUG level
#[cfg(feature = "logging")]
pub fn init_pretty() {
    builder().pretty().init();
}
