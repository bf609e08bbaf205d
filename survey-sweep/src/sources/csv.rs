//! CSV file source for one survey year.

use super::DataSource;
use crate::error::{Result, SweepError};
use crate::security::SqlSecurity;
use async_trait::async_trait;
use datafusion::arrow::datatypes::{Field, Schema};
use datafusion::common::TableReference;
use datafusion::prelude::*;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Options for configuring CSV file reading.
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Whether the CSV file has a header row
    pub has_header: bool,
    /// Field delimiter (default: ',')
    pub delimiter: u8,
    /// Quote character (default: '"')
    pub quote: u8,
    /// Escape character (default: None)
    pub escape: Option<u8>,
    /// Comment prefix (lines starting with this are ignored)
    pub comment: Option<u8>,
    /// Schema to use (if None, will be inferred)
    pub schema: Option<Arc<Schema>>,
    /// Maximum records to read for schema inference
    pub schema_infer_max_records: usize,
    /// Strip leading and trailing whitespace from header names
    pub trim_column_names: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            has_header: true,
            delimiter: b',',
            quote: b'"',
            escape: None,
            comment: None,
            schema: None,
            schema_infer_max_records: 1000,
            trim_column_names: true,
        }
    }
}

/// A survey export in CSV form.
///
/// Survey tools often pad header cells with spaces. With
/// [`CsvOptions::trim_column_names`] set, the file is registered under a
/// hidden raw name and `table_name` becomes a view renaming every column to
/// its trimmed header.
///
/// # Examples
///
/// ```rust,no_run
/// use survey_sweep::sources::{CsvOptions, CsvSource};
///
/// let source = CsvSource::new("data/survey_2021.csv").unwrap();
///
/// let options = CsvOptions {
///     delimiter: b'\t',
///     ..Default::default()
/// };
/// let source = CsvSource::with_options("data/survey_2022.tsv", options).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: String,
    options: CsvOptions,
    inferred_schema: Option<Arc<Schema>>,
}

impl CsvSource {
    /// Creates a new CSV source from a file path.
    pub fn new(path: impl Into<String>) -> Result<Self> {
        Self::with_options(path, CsvOptions::default())
    }

    /// Creates a new CSV source with custom options.
    pub fn with_options(path: impl Into<String>, options: CsvOptions) -> Result<Self> {
        let path = path.into();
        if path.trim().is_empty() {
            return Err(SweepError::Configuration(
                "CSV path cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            path,
            options,
            inferred_schema: None,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn options(&self) -> &CsvOptions {
        &self.options
    }

    /// Name of the table holding the untouched file when headers are trimmed.
    pub fn raw_table_name(table_name: &str) -> String {
        format!("__raw_{table_name}")
    }

    /// Infers the schema of the file, with header names trimmed when the
    /// options ask for it, and remembers it for [`DataSource::schema`].
    #[instrument(skip(self), fields(path = %self.path))]
    pub async fn infer_schema(&mut self) -> Result<Arc<Schema>> {
        if let Some(schema) = &self.options.schema {
            return Ok(schema.clone());
        }
        if let Some(schema) = &self.inferred_schema {
            return Ok(schema.clone());
        }

        let ctx = SessionContext::new();
        let extension = self.file_extension();
        let df = ctx
            .read_csv(self.path.as_str(), self.read_options(&extension))
            .await?;
        let raw = df.schema().inner().clone();

        let schema = if self.options.trim_column_names {
            let fields: Vec<Field> = raw
                .fields()
                .iter()
                .map(|f| f.as_ref().clone().with_name(f.name().trim()))
                .collect();
            Arc::new(Schema::new(fields))
        } else {
            raw
        };

        self.inferred_schema = Some(schema.clone());
        Ok(schema)
    }

    fn file_extension(&self) -> String {
        Path::new(&self.path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{ext}"))
            .unwrap_or_else(|| ".csv".to_string())
    }

    fn read_options<'a>(&'a self, extension: &'a str) -> CsvReadOptions<'a> {
        let mut csv_options = CsvReadOptions::new()
            .has_header(self.options.has_header)
            .delimiter(self.options.delimiter)
            .quote(self.options.quote)
            .file_extension(extension)
            .schema_infer_max_records(self.options.schema_infer_max_records);

        if let Some(escape) = self.options.escape {
            csv_options = csv_options.escape(escape);
        }
        if let Some(comment) = self.options.comment {
            csv_options = csv_options.comment(comment);
        }
        if let Some(schema) = &self.options.schema {
            csv_options = csv_options.schema(schema);
        }
        csv_options
    }

    /// Builds the view renaming raw header names to their trimmed form.
    fn trimmed_view_sql(table_name: &str, raw_table: &str, schema: &Schema) -> Result<String> {
        let mut seen = HashSet::new();
        let mut projections = Vec::with_capacity(schema.fields().len());

        for field in schema.fields() {
            let trimmed = field.name().trim();
            if !seen.insert(trimmed.to_string()) {
                return Err(SweepError::Configuration(format!(
                    "Column '{trimmed}' appears more than once after trimming header names"
                )));
            }
            projections.push(format!(
                "{} AS {}",
                SqlSecurity::escape_identifier(field.name())?,
                SqlSecurity::escape_identifier(trimmed)?
            ));
        }

        Ok(format!(
            "CREATE OR REPLACE VIEW {} AS SELECT {} FROM {}",
            SqlSecurity::escape_table_name(table_name)?,
            projections.join(", "),
            SqlSecurity::escape_table_name(raw_table)?
        ))
    }
}

#[async_trait]
impl DataSource for CsvSource {
    #[instrument(skip(self, ctx), fields(
        table.name = %table_name,
        source.type = "csv",
        csv.delimiter = %self.options.delimiter as char,
        csv.has_header = self.options.has_header
    ))]
    async fn register(&self, ctx: &SessionContext, table_name: &str) -> Result<()> {
        info!(
            table.name = %table_name,
            source.path = %self.path,
            csv.trim_column_names = self.options.trim_column_names,
            "Registering CSV data source"
        );

        SqlSecurity::escape_table_name(table_name)?;
        let extension = self.file_extension();
        if !self.options.trim_column_names {
            ctx.register_csv(
                TableReference::bare(table_name),
                &self.path,
                self.read_options(&extension),
            )
            .await?;
            return Ok(());
        }

        let raw_table = Self::raw_table_name(table_name);
        ctx.register_csv(
            TableReference::bare(raw_table.as_str()),
            &self.path,
            self.read_options(&extension),
        )
        .await?;

        let raw_schema = ctx
            .table(TableReference::bare(raw_table.as_str()))
            .await?
            .schema()
            .inner()
            .clone();
        let sql = Self::trimmed_view_sql(table_name, &raw_table, &raw_schema)?;
        ctx.sql(&sql).await.map_err(|e| {
            SweepError::data_source_with_source(
                "csv",
                format!("Failed to create view '{table_name}'"),
                Box::new(e),
            )
        })?;

        debug!(
            table.name = %table_name,
            columns = raw_schema.fields().len(),
            "CSV data source registered with trimmed column names"
        );
        Ok(())
    }

    fn schema(&self) -> Option<&Arc<Schema>> {
        self.options
            .schema
            .as_ref()
            .or(self.inferred_schema.as_ref())
    }

    fn description(&self) -> String {
        format!("CSV file: {}", self.path)
    }
}
