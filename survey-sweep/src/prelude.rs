//! Prelude for commonly used types and traits in survey-sweep.

pub use crate::config::{StudyConfig, SweepConfig};
pub use crate::error::{ErrorContext, Result, SweepError};
pub use crate::formatters::{FormatterConfig, ReportFormatter};
pub use crate::logging::LogConfig;
pub use crate::sweep::{PairProvider, PairSpec, ResultRow, SweepReport};
pub use crate::variable::{Kind, OrdinalReference, Scale};
