//! The ordinal (Likert) reference vocabulary.

use crate::config::load_json_file;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Maps raw answer labels to ordinal codes.
///
/// A variable whose distinct values are all labels of this mapping, or all
/// codes of it, is treated as rank scale. The rank-order correlation reads a
/// rank-scale label through its code.
///
/// # Examples
///
/// ```rust
/// use survey_sweep::variable::OrdinalReference;
///
/// let likert = OrdinalReference::new()
///     .with_level("Strongly disagree", 1)
///     .with_level("Disagree", 2)
///     .with_level("Agree", 3)
///     .with_level("Strongly agree", 4);
///
/// assert_eq!(likert.code("Agree"), Some(3));
/// assert!(likert.contains_code(4.0));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrdinalReference {
    levels: BTreeMap<String, i64>,
}

impl OrdinalReference {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a label with its ordinal code.
    pub fn with_level(mut self, label: impl Into<String>, code: i64) -> Self {
        self.levels.insert(label.into(), code);
        self
    }

    /// Builds a reference from `(label, code)` pairs.
    pub fn from_levels<S: Into<String>>(levels: impl IntoIterator<Item = (S, i64)>) -> Self {
        Self {
            levels: levels.into_iter().map(|(l, c)| (l.into(), c)).collect(),
        }
    }

    /// Parses a JSON object of `label: code` entries.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads a JSON object of `label: code` entries from disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        load_json_file(path.as_ref(), "ordinal reference")
    }

    /// Returns the code of a label.
    pub fn code(&self, label: &str) -> Option<i64> {
        self.levels.get(label).copied()
    }

    pub fn contains_label(&self, label: &str) -> bool {
        self.levels.contains_key(label)
    }

    /// Returns true when `value` is exactly one of the integer codes.
    pub fn contains_code(&self, value: f64) -> bool {
        value.fract() == 0.0 && self.levels.values().any(|&code| code as f64 == value)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn levels(&self) -> impl Iterator<Item = (&str, i64)> {
        self.levels.iter().map(|(l, &c)| (l.as_str(), c))
    }
}
