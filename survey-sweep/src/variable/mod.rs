//! Survey variables and the shapes derived from them.
//!
//! A [`Variable`] is one question column: a name, an ordered sequence of
//! optional observations, and a [`Kind`] tag fixed at ingestion time from the
//! Arrow data type of the source column. The statistical core never looks at
//! raw storage types; it only reads the tag.
//!
//! The remaining types are derived views used by the tests:
//!
//! - [`QuestionPair`]: two aligned variables (plus an optional response-id
//!   column) evaluated together
//! - [`GroupedSamples`]: a numeric variable partitioned by a categorical one
//! - [`ContingencyTable`]: a cross-tabulation of two categorical variables
//! - [`OrdinalReference`]: the Likert vocabulary deciding rank vs nominal scale

mod pair;
mod reference;
mod table;

pub use pair::{GroupedSamples, QuestionPair};
pub use reference::OrdinalReference;
pub use table::{ContingencyMode, ContingencyTable};

use crate::error::{Result, SweepError};
use arrow::array::{Array, ArrayRef, BooleanArray, Float64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::util::display::array_value_to_string;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The value kind of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    /// Discrete labels (text, boolean, dictionary-encoded columns).
    Categorical,
    /// Real-valued measurements (integer, floating-point and decimal columns).
    Numeric,
    /// Anything else. Routing treats this as a dead end.
    Unknown,
}

impl Kind {
    /// Derives the kind from an Arrow data type.
    pub fn from_data_type(data_type: &DataType) -> Self {
        match data_type {
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float16
            | DataType::Float32
            | DataType::Float64
            | DataType::Decimal128(_, _)
            | DataType::Decimal256(_, _) => Kind::Numeric,
            DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View | DataType::Boolean => {
                Kind::Categorical
            }
            DataType::Dictionary(_, value_type) => match value_type.as_ref() {
                DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => Kind::Categorical,
                _ => Kind::Unknown,
            },
            _ => Kind::Unknown,
        }
    }

    /// Returns the label used in reports and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Kind::Categorical => "qualified",
            Kind::Numeric => "quantified",
            Kind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The measurement scale of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scale {
    /// Unordered labels.
    Nominal,
    /// Ordered labels or codes recognized by the ordinal reference.
    Rank,
    /// Measurements with meaningful differences.
    IntervalRatio,
}

impl Scale {
    /// Returns the label used in reports and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Scale::Nominal => "nominal scale",
            Scale::Rank => "rank scale",
            Scale::IntervalRatio => "ratio scale/ interval scale",
        }
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single non-missing observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Number(f64),
    Text(String),
    Flag(bool),
}

impl Value {
    /// Returns the numeric value, if this is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the textual form used for grouping and cross-tabulation.
    pub fn label(&self) -> String {
        match self {
            Value::Number(v) => v.to_string(),
            Value::Text(s) => s.clone(),
            Value::Flag(b) => b.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// One survey question column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    name: String,
    kind: Kind,
    values: Vec<Option<Value>>,
}

impl Variable {
    /// Creates a variable with an explicit kind tag.
    pub fn new(name: impl Into<String>, kind: Kind, values: Vec<Option<Value>>) -> Self {
        Self {
            name: name.into(),
            kind,
            values,
        }
    }

    /// Creates a numeric variable. `NaN` counts as missing, as it does for
    /// Arrow float columns.
    pub fn numeric(name: impl Into<String>, values: impl IntoIterator<Item = Option<f64>>) -> Self {
        Self::new(
            name,
            Kind::Numeric,
            values
                .into_iter()
                .map(|v| v.filter(|x| !x.is_nan()).map(Value::Number))
                .collect(),
        )
    }

    /// Creates a categorical variable from text labels.
    pub fn categorical<S: Into<String>>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = Option<S>>,
    ) -> Self {
        Self::new(
            name,
            Kind::Categorical,
            values
                .into_iter()
                .map(|v| v.map(|s| Value::Text(s.into())))
                .collect(),
        )
    }

    /// Builds a variable from an Arrow array, tagging its kind from the
    /// array's data type.
    pub fn from_array(name: impl Into<String>, array: &ArrayRef) -> Result<Self> {
        let name = name.into();
        let kind = Kind::from_data_type(array.data_type());

        let values = match (kind, array.data_type()) {
            (Kind::Numeric, _) => {
                let casted = cast(array, &DataType::Float64)?;
                let floats = casted
                    .as_any()
                    .downcast_ref::<Float64Array>()
                    .ok_or_else(|| {
                        SweepError::Internal(format!("'{name}' did not cast to Float64"))
                    })?;
                floats
                    .iter()
                    .map(|v| v.filter(|x| !x.is_nan()).map(Value::Number))
                    .collect()
            }
            (Kind::Categorical, DataType::Boolean) => {
                let flags = array
                    .as_any()
                    .downcast_ref::<BooleanArray>()
                    .ok_or_else(|| {
                        SweepError::Internal(format!("'{name}' is not a boolean array"))
                    })?;
                flags.iter().map(|v| v.map(Value::Flag)).collect()
            }
            (Kind::Categorical, _) => {
                let casted = cast(array, &DataType::Utf8)?;
                let strings = casted
                    .as_any()
                    .downcast_ref::<StringArray>()
                    .ok_or_else(|| SweepError::Internal(format!("'{name}' did not cast to Utf8")))?;
                strings
                    .iter()
                    .map(|v| v.map(|s| Value::Text(s.to_string())))
                    .collect()
            }
            (Kind::Unknown, _) => (0..array.len())
                .map(|i| {
                    if array.is_null(i) {
                        Ok(None)
                    } else {
                        array_value_to_string(array, i).map(|s| Some(Value::Text(s)))
                    }
                })
                .collect::<std::result::Result<Vec<_>, _>>()?,
        };

        Ok(Self { name, kind, values })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn values(&self) -> &[Option<Value>] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of missing entries.
    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }

    /// Iterates over the non-missing observations.
    pub fn present(&self) -> impl Iterator<Item = &Value> {
        self.values.iter().flatten()
    }

    /// Returns the non-missing numeric observations.
    pub fn numbers(&self) -> Vec<f64> {
        self.present().filter_map(Value::as_f64).collect()
    }

    /// Returns the distinct labels of the non-missing observations in
    /// first-appearance order.
    pub fn distinct_labels(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.present()
            .map(Value::label)
            .filter(|label| seen.insert(label.clone()))
            .collect()
    }

    /// Returns a copy restricted to the given row positions.
    pub(crate) fn select(&self, rows: &[usize]) -> Self {
        Self {
            name: self.name.clone(),
            kind: self.kind,
            values: rows.iter().map(|&i| self.values[i].clone()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Date32Array, Int64Array};
    use std::sync::Arc;

    #[test]
    fn test_kind_from_data_type() {
        assert_eq!(Kind::from_data_type(&DataType::Int32), Kind::Numeric);
        assert_eq!(Kind::from_data_type(&DataType::Float64), Kind::Numeric);
        assert_eq!(
            Kind::from_data_type(&DataType::Decimal128(10, 2)),
            Kind::Numeric
        );
        assert_eq!(Kind::from_data_type(&DataType::Utf8), Kind::Categorical);
        assert_eq!(Kind::from_data_type(&DataType::Boolean), Kind::Categorical);
        assert_eq!(
            Kind::from_data_type(&DataType::Dictionary(
                Box::new(DataType::Int32),
                Box::new(DataType::Utf8)
            )),
            Kind::Categorical
        );
        assert_eq!(Kind::from_data_type(&DataType::Date32), Kind::Unknown);
        assert_eq!(Kind::from_data_type(&DataType::Null), Kind::Unknown);
    }

    #[test]
    fn test_from_int_array() {
        let array: ArrayRef = Arc::new(Int64Array::from(vec![Some(1), None, Some(3)]));
        let var = Variable::from_array("age", &array).unwrap();
        assert_eq!(var.kind(), Kind::Numeric);
        assert_eq!(var.numbers(), vec![1.0, 3.0]);
        assert_eq!(var.missing_count(), 1);
    }

    #[test]
    fn test_numeric_nan_is_missing() {
        let var = Variable::numeric("hours", vec![Some(1.0), Some(f64::NAN), None, Some(4.0)]);
        assert_eq!(var.len(), 4);
        assert_eq!(var.missing_count(), 2);
        assert_eq!(var.numbers(), vec![1.0, 4.0]);
    }

    #[test]
    fn test_from_string_array() {
        let array: ArrayRef = Arc::new(StringArray::from(vec![Some("Agree"), None, Some("Agree")]));
        let var = Variable::from_array("q1", &array).unwrap();
        assert_eq!(var.kind(), Kind::Categorical);
        assert_eq!(var.distinct_labels(), vec!["Agree".to_string()]);
    }

    #[test]
    fn test_from_boolean_array() {
        let array: ArrayRef = Arc::new(BooleanArray::from(vec![Some(true), Some(false), None]));
        let var = Variable::from_array("remote", &array).unwrap();
        assert_eq!(var.kind(), Kind::Categorical);
        assert_eq!(var.values()[0], Some(Value::Flag(true)));
        assert_eq!(var.values()[2], None);
    }

    #[test]
    fn test_from_date_array_is_unknown() {
        let array: ArrayRef = Arc::new(Date32Array::from(vec![Some(0), None]));
        let var = Variable::from_array("submitted", &array).unwrap();
        assert_eq!(var.kind(), Kind::Unknown);
        assert_eq!(var.values()[0], Some(Value::Text("1970-01-01".to_string())));
    }

    #[test]
    fn test_distinct_labels_keep_first_appearance_order() {
        let var = Variable::categorical("q", vec![Some("b"), Some("a"), None, Some("b")]);
        assert_eq!(var.distinct_labels(), vec!["b".to_string(), "a".to_string()]);
    }
}
