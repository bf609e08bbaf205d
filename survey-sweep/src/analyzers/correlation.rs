//! Correlation engine.
//!
//! Picks an association measure from the kinds and scales of a pair:
//!
//! | first \ second | Nominal text | Rank text | Rank number | Interval number |
//! |----------------|--------------|-----------|-------------|-----------------|
//! | Nominal text   | Cramér's V   | Spearman  | Spearman    | η²              |
//! | Rank text      | Spearman     | Spearman  | Spearman    | Spearman        |
//! | Rank number    | Spearman     | Spearman  | Spearman    | Spearman        |
//! | Interval number| η²           | Spearman  | Spearman    | Pearson         |
//!
//! Unknown kinds and anything outside the table yield the
//! [`CorrelationMethod::BadRequest`] sentinel instead of an error.

use super::classifier::classify_scale;
use crate::config::SweepConfig;
use crate::error::Result;
use crate::narrate;
use crate::stats::{correlation_ratio, cramers_v, pearson, spearman, TestStatistic};
use crate::variable::{
    ContingencyTable, GroupedSamples, Kind, OrdinalReference, QuestionPair, Scale, Value, Variable,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::{instrument, warn};

/// The association measure chosen for a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CorrelationMethod {
    Pearson,
    Spearman,
    CramersV,
    CorrelationRatio,
    /// The kind/scale combination has no measure.
    BadRequest,
}

impl CorrelationMethod {
    pub fn name(&self) -> &'static str {
        match self {
            CorrelationMethod::Pearson => "Pearson",
            CorrelationMethod::Spearman => "Spearman",
            CorrelationMethod::CramersV => "Cramers V",
            CorrelationMethod::CorrelationRatio => "correlation ratio",
            CorrelationMethod::BadRequest => "Bad request",
        }
    }
}

impl fmt::Display for CorrelationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The strength of association between two variables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrelationOutcome {
    pub statistic: f64,
    /// Always `NaN` for Cramér's V and the correlation ratio.
    pub p_value: f64,
    pub method: CorrelationMethod,
}

impl CorrelationOutcome {
    fn undefined(method: CorrelationMethod) -> Self {
        Self {
            statistic: f64::NAN,
            p_value: f64::NAN,
            method,
        }
    }
}

/// Selects and computes the association measure for a pair.
///
/// Scales are classified on the rows where both variables are present, and
/// the measure is computed on those rows only.
#[instrument(skip_all, fields(first = %pair.first().name(), second = %pair.second().name()))]
pub fn compute_correlation(
    pair: &QuestionPair,
    reference: &OrdinalReference,
    config: &SweepConfig,
) -> CorrelationOutcome {
    let complete = pair.complete_rows();
    let (first, second) = (complete.first(), complete.second());
    let scales = (
        classify_scale(first, reference),
        classify_scale(second, reference),
    );
    let method = select_method(complete.kinds(), scales);

    let outcome = match method {
        CorrelationMethod::BadRequest => CorrelationOutcome::undefined(method),
        CorrelationMethod::Pearson => {
            from_statistic(method, pearson(&first.numbers(), &second.numbers()))
        }
        CorrelationMethod::Spearman => {
            let x = spearman_encoding(first, scales.0, reference);
            let y = spearman_encoding(second, scales.1, reference);
            from_statistic(method, spearman(&x, &y))
        }
        CorrelationMethod::CramersV => CorrelationOutcome {
            statistic: ContingencyTable::crosstab(first, second)
                .map(|table| cramers_v(&table))
                .unwrap_or(f64::NAN),
            p_value: f64::NAN,
            method,
        },
        CorrelationMethod::CorrelationRatio => {
            let (categorical, numeric) = if first.kind() == Kind::Categorical {
                (first, second)
            } else {
                (second, first)
            };
            let statistic = GroupedSamples::partition(categorical, numeric)
                .map(|grouped| correlation_ratio(&grouped.as_slices()))
                .unwrap_or(f64::NAN);
            CorrelationOutcome {
                statistic,
                p_value: f64::NAN,
                method,
            }
        }
    };

    narrate!(
        config.log_config(),
        method = %outcome.method,
        first_scale = %scales.0,
        second_scale = %scales.1,
        statistic = outcome.statistic,
        p_value = outcome.p_value,
        "correlation computed"
    );
    outcome
}

fn select_method(kinds: (Kind, Kind), scales: (Scale, Scale)) -> CorrelationMethod {
    use CorrelationMethod::*;
    use Kind::*;
    use Scale::*;

    match (kinds, scales) {
        ((Categorical, Categorical), (Rank, _) | (_, Rank)) => Spearman,
        ((Categorical, Categorical), (Nominal, Nominal)) => CramersV,
        ((Categorical, Numeric), (Nominal, IntervalRatio))
        | ((Numeric, Categorical), (IntervalRatio, Nominal)) => CorrelationRatio,
        ((Categorical, Numeric), (Nominal | Rank, Rank))
        | ((Categorical, Numeric), (Rank, IntervalRatio))
        | ((Numeric, Categorical), (Rank, Nominal | Rank))
        | ((Numeric, Categorical), (IntervalRatio, Rank)) => Spearman,
        ((Numeric, Numeric), (Rank, _) | (_, Rank)) => Spearman,
        ((Numeric, Numeric), _) => Pearson,
        _ => BadRequest,
    }
}

/// Numeric codes fed to the rank correlation.
///
/// Numbers are used as they are. Rank-scale labels go through the reference
/// codes; nominal labels are ranked by their lexicographic order.
fn spearman_encoding(
    variable: &Variable,
    scale: Scale,
    reference: &OrdinalReference,
) -> Vec<f64> {
    let present: Vec<&Value> = variable.present().collect();

    if scale == Scale::Rank {
        let coded: Option<Vec<f64>> = present
            .iter()
            .map(|value| match value {
                Value::Number(x) => Some(*x),
                other => reference.code(&other.label()).map(|c| c as f64),
            })
            .collect();
        if let Some(coded) = coded {
            return coded;
        }
    }

    let order: BTreeSet<String> = present
        .iter()
        .filter(|v| v.as_f64().is_none())
        .map(|v| v.label())
        .collect();
    present
        .iter()
        .map(|value| match value {
            Value::Number(x) => *x,
            other => {
                let label = other.label();
                order.iter().position(|l| *l == label).unwrap_or(0) as f64
            }
        })
        .collect()
}

fn from_statistic(method: CorrelationMethod, result: Result<TestStatistic>) -> CorrelationOutcome {
    match result {
        Ok(stat) => CorrelationOutcome {
            statistic: stat.statistic,
            p_value: stat.p_value,
            method,
        },
        Err(e) => {
            warn!(method = %method, error = %e, "correlation undefined for this pair");
            CorrelationOutcome::undefined(method)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn likert() -> OrdinalReference {
        OrdinalReference::from_levels([("Low", 1), ("Mid", 2), ("High", 3)])
    }

    fn correlate(a: Variable, b: Variable) -> CorrelationOutcome {
        compute_correlation(
            &QuestionPair::new(a, b).unwrap(),
            &likert(),
            &SweepConfig::default(),
        )
    }

    #[test]
    fn test_dispatch_table() {
        use CorrelationMethod::*;
        use Kind::*;
        use Scale::*;

        let cases = [
            ((Categorical, Categorical), (Nominal, Nominal), CramersV),
            ((Categorical, Categorical), (Rank, Nominal), Spearman),
            ((Categorical, Categorical), (Nominal, Rank), Spearman),
            ((Categorical, Categorical), (Rank, Rank), Spearman),
            ((Categorical, Numeric), (Nominal, IntervalRatio), CorrelationRatio),
            ((Numeric, Categorical), (IntervalRatio, Nominal), CorrelationRatio),
            ((Categorical, Numeric), (Nominal, Rank), Spearman),
            ((Categorical, Numeric), (Rank, Rank), Spearman),
            ((Categorical, Numeric), (Rank, IntervalRatio), Spearman),
            ((Numeric, Categorical), (Rank, Nominal), Spearman),
            ((Numeric, Categorical), (IntervalRatio, Rank), Spearman),
            ((Numeric, Numeric), (IntervalRatio, IntervalRatio), Pearson),
            ((Numeric, Numeric), (Rank, IntervalRatio), Spearman),
            ((Numeric, Numeric), (IntervalRatio, Rank), Spearman),
            ((Unknown, Numeric), (Nominal, IntervalRatio), BadRequest),
            ((Categorical, Unknown), (Nominal, Nominal), BadRequest),
            ((Categorical, Numeric), (Nominal, Nominal), BadRequest),
        ];
        for (kinds, scales, expected) in cases {
            assert_eq!(select_method(kinds, scales), expected, "{kinds:?} {scales:?}");
        }
    }

    #[test]
    fn test_correlation_ratio_value() {
        let outcome = correlate(
            Variable::numeric("hours", [1.0, 2.0, 3.0, 4.0, 5.0].map(Some)),
            Variable::categorical("team", ["a", "a", "b", "b", "b"].map(Some)),
        );
        assert_eq!(outcome.method, CorrelationMethod::CorrelationRatio);
        assert!((outcome.statistic - 0.75).abs() < 1e-12);
        assert!(outcome.p_value.is_nan());
    }

    #[test]
    fn test_cramers_v_for_nominal_pair() {
        let outcome = correlate(
            Variable::categorical("a", ["x", "x", "y", "y"].map(Some)),
            Variable::categorical("b", ["p", "p", "q", "q"].map(Some)),
        );
        assert_eq!(outcome.method, CorrelationMethod::CramersV);
        assert!((outcome.statistic - 1.0).abs() < 1e-12);
        assert!(outcome.p_value.is_nan());
    }

    #[test]
    fn test_spearman_uses_likert_codes() {
        // Lexicographic order would be High < Low < Mid; the codes say Low < Mid < High.
        let outcome = correlate(
            Variable::categorical("q", ["Low", "Mid", "High", "Low", "High"].map(Some)),
            Variable::numeric("hours", [1.0, 2.0, 3.0, 1.5, 3.5].map(Some)),
        );
        assert_eq!(outcome.method, CorrelationMethod::Spearman);
        assert!(outcome.statistic > 0.9);
    }

    #[test]
    fn test_pearson_for_measurements() {
        let outcome = correlate(
            Variable::numeric("a", [1.5, 2.5, 3.5, 4.5].map(Some)),
            Variable::numeric("b", [2.5, 4.5, 6.5, 8.5].map(Some)),
        );
        assert_eq!(outcome.method, CorrelationMethod::Pearson);
        assert!((outcome.statistic - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_too_few_points_give_nan_with_method() {
        let outcome = correlate(
            Variable::numeric("a", [1.5, 2.5].map(Some)),
            Variable::numeric("b", [2.5, 4.5].map(Some)),
        );
        assert_eq!(outcome.method, CorrelationMethod::Pearson);
        assert!(outcome.statistic.is_nan());
        assert!(outcome.p_value.is_nan());
    }

    #[test]
    fn test_pearson_on_huge_measurements_stays_defined() {
        let outcome = correlate(
            Variable::numeric("a", [1e200, 2e200, 3e200, 5e200].map(Some)),
            Variable::numeric("b", [1e200, 2e200, 4e200, 3e200].map(Some)),
        );
        let reference = correlate(
            Variable::numeric("a", [1.0, 2.0, 3.0, 5.0].map(Some)),
            Variable::numeric("b", [1.0, 2.0, 4.0, 3.0].map(Some)),
        );
        assert_eq!(outcome.method, CorrelationMethod::Pearson);
        assert!((outcome.statistic - reference.statistic).abs() < 1e-12);
        assert!(outcome.p_value.is_finite());
    }

    #[test]
    fn test_unknown_kind_is_bad_request() {
        let outcome = correlate(
            Variable::new("when", Kind::Unknown, vec![Some(Value::Text("x".into())); 3]),
            Variable::numeric("b", [1.0, 2.0, 3.0].map(Some)),
        );
        assert_eq!(outcome.method, CorrelationMethod::BadRequest);
        assert!(outcome.statistic.is_nan());
    }

    #[test]
    fn test_nominal_text_ranked_lexicographically() {
        let var = Variable::categorical("c", ["b", "a", "c"].map(Some));
        assert_eq!(
            spearman_encoding(&var, Scale::Nominal, &likert()),
            vec![1.0, 0.0, 2.0]
        );
    }
}
