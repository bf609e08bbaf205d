//! SQL identifier validation and escaping.
//!
//! Survey column headers are full question texts ("How many days did you
//! work remotely?"), so column identifiers accept any printable text and are
//! always emitted double-quoted. Table names stay restricted to plain
//! identifiers.

use crate::error::{Result, SweepError};
use once_cell::sync::Lazy;
use regex::Regex;

/// Longest accepted column identifier, in bytes.
pub const MAX_COLUMN_LENGTH: usize = 1024;

/// Longest accepted table name, in bytes.
pub const MAX_TABLE_LENGTH: usize = 128;

static CONTROL_CHARS: Lazy<Regex> = Lazy::new(|| {
    // Hard-coded pattern
    #[allow(clippy::expect_used)]
    Regex::new(r"[\x00-\x08\x0A-\x1F\x7F]").expect("Hard-coded regex pattern should be valid")
});

static TABLE_NAME: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").expect("Hard-coded regex pattern should be valid")
});

/// SQL identifier validation and escaping utilities.
pub struct SqlSecurity;

impl SqlSecurity {
    /// Validates and double-quotes a column identifier.
    ///
    /// # Examples
    /// ```rust
    /// use survey_sweep::security::SqlSecurity;
    ///
    /// assert_eq!(
    ///     SqlSecurity::escape_identifier("Response ID").unwrap(),
    ///     "\"Response ID\""
    /// );
    /// assert_eq!(
    ///     SqlSecurity::escape_identifier("say \"hi\"").unwrap(),
    ///     "\"say \"\"hi\"\"\""
    /// );
    /// assert!(SqlSecurity::escape_identifier("   ").is_err());
    /// ```
    pub fn escape_identifier(identifier: &str) -> Result<String> {
        Self::validate_identifier(identifier)?;
        let escaped = identifier.replace('"', "\"\"");
        Ok(format!("\"{escaped}\""))
    }

    /// Checks a column identifier without escaping it.
    pub fn validate_identifier(identifier: &str) -> Result<()> {
        if identifier.trim().is_empty() {
            return Err(SweepError::SecurityError(
                "SQL identifier cannot be empty or whitespace-only".to_string(),
            ));
        }
        if identifier.len() > MAX_COLUMN_LENGTH {
            return Err(SweepError::SecurityError(format!(
                "SQL identifier too long (max {MAX_COLUMN_LENGTH} bytes)"
            )));
        }
        if CONTROL_CHARS.is_match(identifier) {
            return Err(SweepError::SecurityError(
                "SQL identifier cannot contain control characters".to_string(),
            ));
        }
        Ok(())
    }

    /// Validates a table name: a letter or underscore followed by letters,
    /// digits and underscores. Returns it double-quoted.
    pub fn escape_table_name(name: &str) -> Result<String> {
        if name.len() > MAX_TABLE_LENGTH {
            return Err(SweepError::SecurityError(format!(
                "Table name too long (max {MAX_TABLE_LENGTH} characters)"
            )));
        }
        if !TABLE_NAME.is_match(name) {
            return Err(SweepError::SecurityError(format!(
                "Invalid table name '{name}'. Table names must start with a letter or underscore and contain only letters, numbers and underscores"
            )));
        }
        Ok(format!("\"{name}\""))
    }
}
