//! Error types for the survey sweep library.
//!
//! All fallible operations in this crate return [`SweepError`] through the
//! [`Result`] alias. Two families of errors exist side by side:
//!
//! - **Contract violations** ([`SweepError::UnsupportedKind`],
//!   [`SweepError::MisalignedPair`]) mean the data handed to the statistical
//!   core is malformed. They abort the sweep.
//! - **Degenerate input** ([`SweepError::DegenerateInput`]) is raised by the
//!   statistics kernels when a test is undefined for the given numbers (too
//!   few groups, zero variance everywhere, identical values). The hypothesis
//!   router turns it into a NaN outcome so a sweep over thousands of pairs
//!   keeps going.

use crate::variable::Kind;
use thiserror::Error;

/// The main error type for the survey sweep library.
#[derive(Error, Debug)]
pub enum SweepError {
    /// A variable of unknown kind reached the hypothesis router.
    #[error("Unsupported variable kind for '{variable}': {kind}")]
    UnsupportedKind {
        /// Name of the offending variable
        variable: String,
        /// The kind that could not be routed
        kind: Kind,
    },

    /// The two variables of a pair (or the id column) have different lengths.
    #[error("Variables '{first}' ({first_len} rows) and '{second}' ({second_len} rows) are not aligned")]
    MisalignedPair {
        first: String,
        first_len: usize,
        second: String,
        second_len: usize,
    },

    /// A statistical test is undefined for the supplied numbers.
    #[error("Degenerate input for {test}: {message}")]
    DegenerateInput {
        /// Name of the test or measure
        test: String,
        /// What made the input degenerate
        message: String,
    },

    /// Error from DataFusion operations.
    #[error("DataFusion error: {0}")]
    DataFusion(#[from] datafusion::error::DataFusionError),

    /// Error from Arrow operations.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Error from data source operations.
    #[error("Data source error: {message}")]
    DataSource {
        /// Type of data source (e.g., "CSV", "Merge")
        source_type: String,
        /// Detailed error message
        message: String,
        /// Optional underlying error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Error from I/O operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error related to configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Error from serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A question id is not present in the catalog.
    #[error("Question '{qid}' not found in catalog")]
    QuestionNotFound { qid: String },

    /// A required column is not found in the dataset.
    #[error("Column '{column}' not found in dataset")]
    ColumnNotFound { column: String },

    /// Security-related error.
    #[error("Security error: {0}")]
    SecurityError(String),

    /// Generic internal error for unexpected conditions.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A type alias for `Result<T, SweepError>`.
pub type Result<T> = std::result::Result<T, SweepError>;

impl SweepError {
    /// Creates a degenerate-input error for the named test.
    pub fn degenerate(test: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DegenerateInput {
            test: test.into(),
            message: message.into(),
        }
    }

    /// Creates a new data source error.
    pub fn data_source(source_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DataSource {
            source_type: source_type.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new data source error with a source error.
    pub fn data_source_with_source(
        source_type: impl Into<String>,
        message: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::DataSource {
            source_type: source_type.into(),
            message: message.into(),
            source: Some(source),
        }
    }

    /// Returns true when the error only invalidates a single pair's test.
    pub fn is_degenerate(&self) -> bool {
        matches!(self, Self::DegenerateInput { .. })
    }
}

impl From<serde_json::Error> for SweepError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<csv::Error> for SweepError {
    fn from(err: csv::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Adds context to an error.
    fn context(self, msg: &str) -> Result<T>;

    /// Adds context with a lazy message.
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

// Configuration and serialization errors keep their variant; anything else
// becomes an internal error carrying the original message.
fn with_message(err: SweepError, msg: &str) -> SweepError {
    match err {
        SweepError::Configuration(inner) => SweepError::Configuration(format!("{msg}: {inner}")),
        SweepError::Serialization(inner) => SweepError::Serialization(format!("{msg}: {inner}")),
        SweepError::Internal(inner) => SweepError::Internal(format!("{msg}: {inner}")),
        other => SweepError::Internal(format!("{msg}: {other}")),
    }
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<SweepError>,
{
    fn context(self, msg: &str) -> Result<T> {
        self.map_err(|e| with_message(e.into(), msg))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| with_message(e.into(), &f()))
    }
}
