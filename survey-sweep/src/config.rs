//! Sweep and study configuration.
//!
//! Both configurations are plain values passed explicitly into the sweep; no
//! global state is read at analysis time. They deserialize from JSON with
//! every field optional.
//!
//! ```rust
//! use survey_sweep::config::StudyConfig;
//!
//! let config: StudyConfig = serde_json::from_str(
//!     r#"{ "year": "2020", "sweep": { "alpha": 0.01, "verbose": true } }"#,
//! ).unwrap();
//! assert_eq!(config.id_column, "Response ID");
//! assert_eq!(config.sweep.alpha, 0.01);
//! ```

use crate::error::{ErrorContext, Result, SweepError};
use crate::logging::LogConfig;
use crate::variable::ContingencyMode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default significance level.
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Settings shared by every test in a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Significance level for tests and prechecks.
    pub alpha: f64,
    /// Narrate each test at `info` instead of `debug`.
    pub verbose: bool,
    /// How categorical-by-categorical tables are counted.
    pub contingency: ContingencyMode,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            verbose: false,
            contingency: ContingencyMode::default(),
        }
    }
}

impl SweepConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_contingency(mut self, mode: ContingencyMode) -> Self {
        self.contingency = mode;
        self
    }

    /// Rejects an alpha outside the open interval (0, 1).
    pub fn validate(&self) -> Result<()> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(SweepError::Configuration(format!(
                "alpha must lie strictly between 0 and 1, got {}",
                self.alpha
            )));
        }
        Ok(())
    }

    /// The logging behaviour implied by the verbosity flag.
    pub fn log_config(&self) -> LogConfig {
        if self.verbose {
            LogConfig::verbose()
        } else {
            LogConfig::default()
        }
    }
}

/// Settings for a model-versus-model study over merged survey tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyConfig {
    /// Column joining the per-question tables.
    pub id_column: String,
    /// Appended to a right-hand column whose name collides with a left-hand one.
    pub duplicate_suffix: String,
    /// Survey year whose raw columns are swept.
    pub year: String,
    pub sweep: SweepConfig,
    /// Lower bound for [`top_correlations`](crate::study::SurveyStudy::top_correlations).
    pub min_correlation: f64,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            id_column: "Response ID".to_string(),
            duplicate_suffix: "_duplicated".to_string(),
            year: "2021".to_string(),
            sweep: SweepConfig::default(),
            min_correlation: 0.3,
        }
    }
}

impl StudyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_year(mut self, year: impl Into<String>) -> Self {
        self.year = year.into();
        self
    }

    pub fn with_id_column(mut self, column: impl Into<String>) -> Self {
        self.id_column = column.into();
        self
    }

    pub fn with_sweep(mut self, sweep: SweepConfig) -> Self {
        self.sweep = sweep;
        self
    }

    pub fn with_min_correlation(mut self, min: f64) -> Self {
        self.min_correlation = min;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.id_column.trim().is_empty() {
            return Err(SweepError::Configuration(
                "id_column must not be empty".to_string(),
            ));
        }
        if self.duplicate_suffix.is_empty() {
            return Err(SweepError::Configuration(
                "duplicate_suffix must not be empty".to_string(),
            ));
        }
        self.sweep.validate()
    }

    /// Loads and validates a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: Self = load_json_file(path, "study configuration")?;
        config
            .validate()
            .with_context(|| format!("Invalid study configuration in {}", path.display()))?;
        Ok(config)
    }
}

/// Reads and parses a JSON file. Read failures are configuration errors;
/// both kinds of failure name the file.
pub(crate) fn load_json_file<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| SweepError::Configuration(e.to_string()))
        .with_context(|| format!("Failed to read {what} {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid {what} in {}", path.display()))
}
