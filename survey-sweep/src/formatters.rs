//! Report formatting for sweep results.
//!
//! Formatters turn a [`SweepReport`] into JSON for downstream tooling, an
//! aligned text summary for the console, or CSV for spreadsheets.
//!
//! # Examples
//!
//! ```rust
//! use survey_sweep::formatters::{CsvFormatter, ReportFormatter};
//! use survey_sweep::sweep::SweepReport;
//!
//! let output = CsvFormatter::new().format(&SweepReport::new()).unwrap();
//! assert!(output.starts_with("question1,question2,year"));
//! ```

use crate::error::{Result, SweepError};
use crate::sweep::{ResultRow, SweepReport};
use std::collections::BTreeMap;
use std::fmt::{self, Write};

/// Configuration options for formatting sweep reports.
#[derive(Debug, Clone)]
pub struct FormatterConfig {
    /// Include the per-method summary block (human formatter)
    pub include_summary: bool,
    /// Include rows whose test p-value is undefined
    pub include_undefined: bool,
    /// Keep only rows with a significant test
    pub significant_only: bool,
    /// Maximum number of rows to display (-1 for all)
    pub max_rows: i32,
    /// Whether to use colorized output (human formatter)
    pub use_colors: bool,
    /// Digits after the decimal point for statistics
    pub precision: usize,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            include_summary: true,
            include_undefined: true,
            significant_only: false,
            max_rows: -1,
            use_colors: true,
            precision: 4,
        }
    }
}

impl FormatterConfig {
    /// Summary only, no rows.
    pub fn minimal() -> Self {
        Self {
            include_summary: true,
            include_undefined: false,
            significant_only: false,
            max_rows: 0,
            use_colors: false,
            precision: 3,
        }
    }

    /// Every row at full precision.
    pub fn detailed() -> Self {
        Self {
            include_summary: true,
            include_undefined: true,
            significant_only: false,
            max_rows: -1,
            use_colors: true,
            precision: 6,
        }
    }

    /// Plain text, significant rows, bounded output.
    pub fn ci() -> Self {
        Self {
            include_summary: true,
            include_undefined: false,
            significant_only: true,
            max_rows: 50,
            use_colors: false,
            precision: 4,
        }
    }

    pub fn with_summary(mut self, include: bool) -> Self {
        self.include_summary = include;
        self
    }

    pub fn with_significant_only(mut self, significant_only: bool) -> Self {
        self.significant_only = significant_only;
        self
    }

    pub fn with_max_rows(mut self, max: i32) -> Self {
        self.max_rows = max;
        self
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    /// The rows this configuration displays, before the row limit.
    fn selected<'a>(&self, report: &'a SweepReport) -> Vec<&'a ResultRow> {
        report
            .rows()
            .iter()
            .filter(|row| self.include_undefined || !row.test_p_value.is_nan())
            .filter(|row| !self.significant_only || row.test_significant == Some(true))
            .collect()
    }

    fn limit<'a>(&self, rows: &'a [&'a ResultRow]) -> &'a [&'a ResultRow] {
        if self.max_rows < 0 {
            rows
        } else {
            &rows[..rows.len().min(self.max_rows as usize)]
        }
    }
}

/// Trait for formatting sweep reports into different output formats.
///
/// # Examples
///
/// ```rust
/// use survey_sweep::formatters::ReportFormatter;
/// use survey_sweep::sweep::SweepReport;
///
/// struct RowCount;
///
/// impl ReportFormatter for RowCount {
///     fn format(&self, report: &SweepReport) -> survey_sweep::error::Result<String> {
///         Ok(format!("{} rows", report.len()))
///     }
/// }
///
/// assert_eq!(RowCount.format(&SweepReport::new()).unwrap(), "0 rows");
/// ```
pub trait ReportFormatter {
    /// Formats a report with the formatter's own configuration.
    fn format(&self, report: &SweepReport) -> Result<String>;

    /// Formats a report with a custom configuration.
    fn format_with_config(&self, report: &SweepReport, _config: &FormatterConfig) -> Result<String> {
        self.format(report)
    }
}

fn render_error(e: fmt::Error) -> SweepError {
    SweepError::Internal(format!("Failed to render report: {e}"))
}

/// Formats reports as a JSON array of rows. Undefined statistics become
/// `null`.
#[derive(Debug, Clone)]
pub struct JsonFormatter {
    config: FormatterConfig,
    pretty: bool,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default(),
            pretty: true,
        }
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self {
            config,
            pretty: true,
        }
    }

    /// Sets whether to use pretty-printed JSON.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for JsonFormatter {
    fn format(&self, report: &SweepReport) -> Result<String> {
        self.format_with_config(report, &self.config)
    }

    fn format_with_config(&self, report: &SweepReport, config: &FormatterConfig) -> Result<String> {
        let selected = config.selected(report);
        let rows = config.limit(&selected);
        let json = if self.pretty {
            serde_json::to_string_pretty(rows)
        } else {
            serde_json::to_string(rows)
        };
        json.map_err(|e| SweepError::Internal(format!("Failed to serialize report to JSON: {e}")))
    }
}

/// Formats reports as aligned console text with a per-method summary.
#[derive(Debug, Clone)]
pub struct HumanFormatter {
    config: FormatterConfig,
}

impl HumanFormatter {
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default(),
        }
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self { config }
    }

    fn render_into(out: &mut String, report: &SweepReport, config: &FormatterConfig) -> fmt::Result {
        let precision = config.precision;
        let significant = report
            .rows()
            .iter()
            .filter(|r| r.test_significant == Some(true))
            .count();
        let undefined = report
            .rows()
            .iter()
            .filter(|r| r.test_p_value.is_nan())
            .count();

        writeln!(out)?;
        writeln!(out, "Survey sweep: {} pairs", report.len())?;

        if config.include_summary {
            writeln!(out)?;
            if config.use_colors {
                writeln!(out, "   Significant: \x1b[32m{significant}\x1b[0m")?;
                writeln!(out, "   Undefined:   \x1b[33m{undefined}\x1b[0m")?;
            } else {
                writeln!(out, "   Significant: {significant}")?;
                writeln!(out, "   Undefined:   {undefined}")?;
            }

            let mut by_test: BTreeMap<&str, usize> = BTreeMap::new();
            let mut by_corr: BTreeMap<&str, usize> = BTreeMap::new();
            for row in report.rows() {
                *by_test.entry(row.test_method.name()).or_default() += 1;
                *by_corr.entry(row.corr_method.name()).or_default() += 1;
            }
            writeln!(out, "   Tests:")?;
            for (name, count) in &by_test {
                writeln!(out, "      {name}: {count}")?;
            }
            writeln!(out, "   Correlations:")?;
            for (name, count) in &by_corr {
                writeln!(out, "      {name}: {count}")?;
            }
        }

        let selected = config.selected(report);
        let rows = config.limit(&selected);
        if !rows.is_empty() {
            writeln!(out)?;
        }
        for (i, row) in rows.iter().enumerate() {
            let marker = match (row.test_significant, config.use_colors) {
                (Some(true), true) => "\x1b[32m*\x1b[0m",
                (Some(true), false) => "*",
                (None, true) => "\x1b[33m?\x1b[0m",
                (None, false) => "?",
                (Some(false), _) => " ",
            };
            writeln!(
                out,
                "{marker} #{}: {} x {} ({})",
                i + 1,
                row.question1,
                row.question2,
                row.year
            )?;
            writeln!(
                out,
                "      {}: p = {}",
                row.test_method,
                fixed(row.test_p_value, precision)
            )?;
            writeln!(
                out,
                "      {}: {} (p = {})",
                row.corr_method,
                fixed(row.corr_statistic, precision),
                fixed(row.corr_p_value, precision)
            )?;
        }

        if selected.len() > rows.len() {
            writeln!(out)?;
            writeln!(out, "   ... and {} more rows", selected.len() - rows.len())?;
        }
        Ok(())
    }
}

fn fixed(value: f64, precision: usize) -> String {
    if value.is_nan() {
        "n/a".to_string()
    } else {
        format!("{value:.precision$}")
    }
}

impl Default for HumanFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for HumanFormatter {
    fn format(&self, report: &SweepReport) -> Result<String> {
        self.format_with_config(report, &self.config)
    }

    fn format_with_config(&self, report: &SweepReport, config: &FormatterConfig) -> Result<String> {
        let mut output = String::new();
        Self::render_into(&mut output, report, config).map_err(render_error)?;
        Ok(output)
    }
}

/// Formats reports as CSV with a header row. Undefined values are empty
/// fields.
#[derive(Debug, Clone)]
pub struct CsvFormatter {
    config: FormatterConfig,
    delimiter: u8,
}

const CSV_HEADER: [&str; 9] = [
    "question1",
    "question2",
    "year",
    "test_method",
    "test_p_value",
    "test_significant",
    "corr_statistic",
    "corr_p_value",
    "corr_method",
];

impl CsvFormatter {
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default(),
            delimiter: b',',
        }
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self {
            config,
            delimiter: b',',
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    fn number(value: f64) -> String {
        if value.is_nan() {
            String::new()
        } else {
            value.to_string()
        }
    }
}

impl Default for CsvFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for CsvFormatter {
    fn format(&self, report: &SweepReport) -> Result<String> {
        self.format_with_config(report, &self.config)
    }

    fn format_with_config(&self, report: &SweepReport, config: &FormatterConfig) -> Result<String> {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(true)
            .delimiter(self.delimiter)
            .from_writer(Vec::new());
        wtr.write_record(CSV_HEADER)?;

        let selected = config.selected(report);
        for row in config.limit(&selected) {
            wtr.write_record([
                row.question1.clone(),
                row.question2.clone(),
                row.year.clone(),
                row.test_method.name().to_string(),
                Self::number(row.test_p_value),
                row.test_significant
                    .map(|s| s.to_string())
                    .unwrap_or_default(),
                Self::number(row.corr_statistic),
                Self::number(row.corr_p_value),
                row.corr_method.name().to_string(),
            ])?;
        }

        let bytes = wtr
            .into_inner()
            .map_err(|e| SweepError::Serialization(format!("CSV flush failed: {e}")))?;
        String::from_utf8(bytes)
            .map_err(|e| SweepError::Serialization(format!("CSV output is not UTF-8: {e}")))
    }
}
