//! Logging utilities and configuration for survey sweeps.
//!
//! Per-test narration goes through [`narrate!`](crate::narrate): it is emitted
//! at `info` when the sweep runs verbosely and at `debug` otherwise, so the
//! verbosity flag only ever changes what is logged, never what is computed.

use tracing::Level;

/// Logging configuration for a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogConfig {
    /// Base log level for sweep components
    pub base_level: Level,
    /// Whether per-test narration is promoted to `info`
    pub narrate_tests: bool,
    /// Whether to log data source operations
    pub log_data_operations: bool,
    /// Maximum length for logged field values (to prevent huge logs)
    pub max_field_length: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            base_level: Level::INFO,
            narrate_tests: false,
            log_data_operations: true,
            max_field_length: 256,
        }
    }
}

impl LogConfig {
    /// Narrates every test decision and result.
    pub fn verbose() -> Self {
        Self {
            base_level: Level::DEBUG,
            narrate_tests: true,
            log_data_operations: true,
            max_field_length: 1024,
        }
    }

    /// Minimal configuration for batch runs.
    pub fn quiet() -> Self {
        Self {
            base_level: Level::WARN,
            narrate_tests: false,
            log_data_operations: false,
            max_field_length: 128,
        }
    }
}

/// Narrates a statistical step: `info` when narration is on, `debug` otherwise.
#[macro_export]
macro_rules! narrate {
    ($config:expr, $($arg:tt)*) => {
        if $config.narrate_tests {
            tracing::info!($($arg)*);
        } else {
            tracing::debug!($($arg)*);
        }
    };
}

/// Macro for conditional data operation logging.
#[macro_export]
macro_rules! log_data_op {
    ($config:expr, $($arg:tt)*) => {
        if $config.log_data_operations {
            tracing::info!($($arg)*);
        }
    };
}

/// Truncates a string to the maximum field length if needed.
pub fn truncate_field(value: &str, max_length: usize) -> String {
    if value.len() <= max_length {
        return value.to_string();
    }
    let mut end = max_length;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...(truncated)", &value[..end])
}

/// Subscriber setup for binaries and tests.
pub mod setup {
    use tracing::Level;

    /// Configuration for the global `tracing` subscriber.
    #[derive(Debug, Clone)]
    pub struct LoggingConfig {
        /// Log level for the application
        pub level: Level,
        /// Log level for `survey_sweep` specifically
        pub sweep_level: Level,
        /// Whether to use JSON output format
        pub json_format: bool,
        /// Environment filter override
        pub env_filter: Option<String>,
    }

    impl Default for LoggingConfig {
        fn default() -> Self {
            Self {
                level: Level::INFO,
                sweep_level: Level::DEBUG,
                json_format: false,
                env_filter: None,
            }
        }
    }

    impl LoggingConfig {
        /// JSON lines at `warn`, sweep components at `info`.
        pub fn production() -> Self {
            Self {
                level: Level::WARN,
                sweep_level: Level::INFO,
                json_format: true,
                env_filter: None,
            }
        }

        pub fn development() -> Self {
            Self {
                level: Level::DEBUG,
                sweep_level: Level::DEBUG,
                json_format: false,
                env_filter: None,
            }
        }

        pub fn with_level(mut self, level: Level) -> Self {
            self.level = level;
            self
        }

        pub fn with_sweep_level(mut self, level: Level) -> Self {
            self.sweep_level = level;
            self
        }

        pub fn with_json_format(mut self, enabled: bool) -> Self {
            self.json_format = enabled;
            self
        }

        pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
            self.env_filter = Some(filter.into());
            self
        }

        /// Builds the filter directive string.
        pub fn env_filter(&self) -> String {
            if let Some(filter) = &self.env_filter {
                return filter.clone();
            }
            format!(
                "{},survey_sweep={}",
                self.level.as_str().to_lowercase(),
                self.sweep_level.as_str().to_lowercase()
            )
        }
    }

    /// Installs a global subscriber. `RUST_LOG` wins over the configured filter.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use survey_sweep::logging::setup::{init_logging, LoggingConfig};
    ///
    /// init_logging(LoggingConfig::development().with_json_format(true)).unwrap();
    /// ```
    pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.env_filter()));

        let fmt_layer = if config.json_format {
            tracing_subscriber::fmt::layer().json().boxed()
        } else {
            tracing_subscriber::fmt::layer().boxed()
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::setup::LoggingConfig;
    use super::*;

    #[test]
    fn test_log_config_defaults() {
        let config = LogConfig::default();
        assert_eq!(config.base_level, Level::INFO);
        assert!(!config.narrate_tests);
        assert!(config.log_data_operations);
        assert_eq!(config.max_field_length, 256);
    }

    #[test]
    fn test_log_config_verbose() {
        let config = LogConfig::verbose();
        assert_eq!(config.base_level, Level::DEBUG);
        assert!(config.narrate_tests);
        assert_eq!(config.max_field_length, 1024);
    }

    #[test]
    fn test_truncate_field() {
        assert_eq!(truncate_field("hello", 10), "hello");
        assert_eq!(
            truncate_field("this is a very long text that should be truncated", 10),
            "this is a ...(truncated)"
        );
        // never splits a multi-byte character
        assert_eq!(truncate_field("ééé", 3), "é...(truncated)");
    }

    #[test]
    fn test_env_filter_directive() {
        let config = LoggingConfig::default();
        assert_eq!(config.env_filter(), "info,survey_sweep=debug");

        let custom = LoggingConfig::default().with_env_filter("warn");
        assert_eq!(custom.env_filter(), "warn");
    }
}
