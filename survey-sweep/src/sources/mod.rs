//! Survey data sources.
//!
//! Each survey year is one table in a DataFusion [`SessionContext`]. A
//! [`DataSource`] registers such a table; [`merge_questions`] then joins the
//! table with itself on the response id so that the columns of two questions
//! line up row by row, and hands the result back as a [`MergedFrame`] that
//! the sweep can pull pairs from.

use crate::error::Result;
use async_trait::async_trait;
use datafusion::arrow::datatypes::Schema;
use datafusion::prelude::SessionContext;
use std::fmt::Debug;
use std::sync::Arc;

mod csv;
mod merge;

pub use csv::{CsvOptions, CsvSource};
pub use merge::{merge_questions, question_combinations, ColumnPlan, MergedFrame};

/// A data source that can be registered with a DataFusion context.
///
/// # Examples
///
/// ```rust,no_run
/// use survey_sweep::sources::{CsvSource, DataSource};
/// use datafusion::prelude::SessionContext;
///
/// # async fn example() -> survey_sweep::error::Result<()> {
/// let source = CsvSource::new("data/survey_2021.csv")?;
/// let ctx = SessionContext::new();
/// source.register(&ctx, "survey_2021").await?;
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait DataSource: Debug + Send + Sync {
    /// Registers this data source with the given session context under
    /// `table_name`.
    async fn register(&self, ctx: &SessionContext, table_name: &str) -> Result<()>;

    /// Returns the schema of this data source if known.
    fn schema(&self) -> Option<&Arc<Schema>>;

    /// Returns a human-readable description of this data source.
    fn description(&self) -> String;
}
