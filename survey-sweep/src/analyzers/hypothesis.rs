//! Hypothesis-test router.

use super::precheck::{distribution_variance_test, PrecheckOutcome};
use crate::config::SweepConfig;
use crate::error::{Result, SweepError};
use crate::narrate;
use crate::stats::{chi2_contingency, kruskal_wallis, one_way_anova, t_test, TTestKind};
use crate::variable::{
    ContingencyMode, ContingencyTable, GroupedSamples, Kind, QuestionPair, Variable,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{instrument, warn};

/// The test chosen for a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestMethod {
    /// Chi-square test of independence on a contingency table.
    ChiSquare,
    /// Welch's two-sample t-test.
    WelchT,
    /// One-way ANOVA across the groups of a categorical variable.
    Anova,
    /// Kruskal-Wallis H test across the groups of a categorical variable.
    KruskalWallis,
    /// The prechecks did not lead to any test.
    Undetermined,
}

impl TestMethod {
    pub fn name(&self) -> &'static str {
        match self {
            TestMethod::ChiSquare => "chi2 independence test",
            TestMethod::WelchT => "welch t-test",
            TestMethod::Anova => "one-way ANOVA",
            TestMethod::KruskalWallis => "Kruskal-Wallis",
            TestMethod::Undetermined => "undetermined",
        }
    }
}

impl fmt::Display for TestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The result of a routed hypothesis test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestOutcome {
    pub method: TestMethod,
    /// `NaN` when the test could not be evaluated.
    pub p_value: f64,
    /// `p_value <= alpha`; `None` when the p-value is undefined.
    pub significant: Option<bool>,
}

impl TestOutcome {
    /// An outcome from a p-value; significance is `p <= alpha`.
    pub fn from_p_value(method: TestMethod, p_value: f64, alpha: f64) -> Self {
        Self {
            method,
            p_value,
            significant: (!p_value.is_nan()).then(|| p_value <= alpha),
        }
    }

    /// An outcome without a p-value.
    pub fn undefined(method: TestMethod) -> Self {
        Self {
            method,
            p_value: f64::NAN,
            significant: None,
        }
    }
}

/// Runs the difference or independence test matching the pair's kinds.
///
/// Tests see only the rows where both variables are present. A test that is
/// undefined for the numbers at hand yields a `NaN` outcome; a variable of
/// unknown kind is an error.
#[instrument(skip(pair, config), fields(first = %pair.first().name(), second = %pair.second().name()))]
pub fn route(pair: &QuestionPair, config: &SweepConfig) -> Result<TestOutcome> {
    for variable in [pair.first(), pair.second()] {
        if variable.kind() == Kind::Unknown {
            return Err(SweepError::UnsupportedKind {
                variable: variable.name().to_string(),
                kind: Kind::Unknown,
            });
        }
    }

    let log = config.log_config();
    let complete = pair.complete_rows();

    let (method, result) = match complete.kinds() {
        (Kind::Categorical, Kind::Categorical) => {
            (TestMethod::ChiSquare, independence_p(&complete, config))
        }
        (Kind::Numeric, Kind::Numeric) => (
            TestMethod::WelchT,
            t_test(
                &complete.first().numbers(),
                &complete.second().numbers(),
                TTestKind::Welch,
            )
            .map(|r| r.p_value),
        ),
        (Kind::Categorical, Kind::Numeric) => {
            return group_difference(complete.first(), complete.second(), config)
        }
        (Kind::Numeric, Kind::Categorical) => {
            return group_difference(complete.second(), complete.first(), config)
        }
        (Kind::Unknown, _) | (_, Kind::Unknown) => {
            return Err(SweepError::Internal("unknown kind after check".to_string()))
        }
    };

    let outcome = finish(method, result, config.alpha)?;
    narrate!(
        log,
        method = %outcome.method,
        p_value = outcome.p_value,
        significant = ?outcome.significant,
        "hypothesis test finished"
    );
    Ok(outcome)
}

fn independence_p(pair: &QuestionPair, config: &SweepConfig) -> Result<f64> {
    let table = match (config.contingency, pair.ids()) {
        (ContingencyMode::DistinctIds, Some(ids)) => {
            ContingencyTable::crosstab_distinct(pair.first(), pair.second(), ids)?
        }
        _ => ContingencyTable::crosstab(pair.first(), pair.second())?,
    };
    Ok(chi2_contingency(&table, true)?.p_value)
}

fn group_difference(
    categorical: &Variable,
    numeric: &Variable,
    config: &SweepConfig,
) -> Result<TestOutcome> {
    let log = config.log_config();
    let grouped = GroupedSamples::partition(categorical, numeric)?;
    let groups = grouped.as_slices();

    let precheck = match distribution_variance_test(config.alpha, &groups) {
        Ok(precheck) => precheck,
        Err(e) if e.is_degenerate() => {
            warn!(error = %e, "precheck undefined; no test selected");
            return Ok(TestOutcome::undefined(TestMethod::Undetermined));
        }
        Err(e) => return Err(e),
    };
    narrate!(
        log,
        groups = grouped.len(),
        normal_all = precheck.normal_all,
        equal_variance = ?precheck.equal_variance,
        "precheck finished"
    );

    let (method, result) = match precheck {
        PrecheckOutcome {
            normal_all: true,
            equal_variance: Some(true),
        } => (TestMethod::Anova, one_way_anova(&groups)),
        PrecheckOutcome {
            normal_all: true,
            equal_variance: Some(false),
        }
        | PrecheckOutcome {
            normal_all: false, ..
        } => (TestMethod::KruskalWallis, kruskal_wallis(&groups)),
        PrecheckOutcome {
            normal_all: true,
            equal_variance: None,
        } => return Ok(TestOutcome::undefined(TestMethod::Undetermined)),
    };

    let outcome = finish(method, result.map(|r| r.p_value), config.alpha)?;
    narrate!(
        log,
        method = %outcome.method,
        p_value = outcome.p_value,
        significant = ?outcome.significant,
        "hypothesis test finished"
    );
    Ok(outcome)
}

fn finish(method: TestMethod, p_value: Result<f64>, alpha: f64) -> Result<TestOutcome> {
    match p_value {
        Ok(p) => Ok(TestOutcome::from_p_value(method, p, alpha)),
        Err(e) if e.is_degenerate() => {
            warn!(method = %method, error = %e, "test undefined for this pair");
            Ok(TestOutcome::undefined(method))
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::normal_sample;
    use crate::variable::Value;

    fn grouped_pair(groups: &[(&str, Vec<f64>)]) -> QuestionPair {
        let mut labels = Vec::new();
        let mut values = Vec::new();
        for (label, sample) in groups {
            for v in sample {
                labels.push(Some(label.to_string()));
                values.push(Some(*v));
            }
        }
        QuestionPair::new(
            Variable::categorical("group", labels),
            Variable::numeric("score", values),
        )
        .unwrap()
    }

    #[test]
    fn test_categorical_pair_uses_chi_square() {
        let a = Variable::categorical("a", ["x", "x", "y", "y", "x", "y"].map(Some));
        let b = Variable::categorical("b", ["p", "q", "p", "q", "p", "q"].map(Some));
        let outcome = route(&QuestionPair::new(a, b).unwrap(), &SweepConfig::default()).unwrap();
        assert_eq!(outcome.method, TestMethod::ChiSquare);
        assert!(outcome.p_value >= 0.0 && outcome.p_value <= 1.0);
        assert_eq!(outcome.significant, Some(false));
    }

    #[test]
    fn test_numeric_pair_uses_welch() {
        let a = Variable::numeric("a", [1.0, 2.0, 3.0, 4.0].map(Some));
        let b = Variable::numeric("b", [11.0, 12.0, 13.0, 14.5].map(Some));
        let outcome = route(&QuestionPair::new(a, b).unwrap(), &SweepConfig::default()).unwrap();
        assert_eq!(outcome.method, TestMethod::WelchT);
        assert_eq!(outcome.significant, Some(true));
    }

    #[test]
    fn test_normal_equal_spread_groups_use_anova() {
        let pair = grouped_pair(&[
            ("a", normal_sample(30, 0.0, 1.0)),
            ("b", normal_sample(30, 3.0, 1.0)),
        ]);
        let outcome = route(&pair, &SweepConfig::default()).unwrap();
        assert_eq!(outcome.method, TestMethod::Anova);
        assert_eq!(outcome.significant, Some(true));
    }

    #[test]
    fn test_three_normal_equal_spread_groups_use_anova() {
        let pair = grouped_pair(&[
            ("a", normal_sample(30, 0.0, 1.0)),
            ("b", normal_sample(30, 0.5, 1.0)),
            ("c", normal_sample(30, 1.0, 1.0)),
        ]);
        let config = SweepConfig::default();
        let outcome = route(&pair, &config).unwrap();
        assert_eq!(outcome.method, TestMethod::Anova);
        assert!(outcome.p_value.is_finite());
        assert_eq!(outcome.significant, Some(outcome.p_value <= config.alpha));
    }

    #[test]
    fn test_unequal_spread_groups_use_kruskal_wallis() {
        let pair = grouped_pair(&[
            ("a", normal_sample(30, 0.0, 1.0)),
            ("b", normal_sample(30, 0.0, 20.0)),
        ]);
        let outcome = route(&pair, &SweepConfig::default()).unwrap();
        assert_eq!(outcome.method, TestMethod::KruskalWallis);
    }

    #[test]
    fn test_numeric_first_is_routed_like_categorical_first() {
        let a = normal_sample(20, 0.0, 1.0);
        let b = normal_sample(20, 1.0, 1.0);
        let forward = grouped_pair(&[("a", a), ("b", b)]);
        let reversed =
            QuestionPair::new(forward.second().clone(), forward.first().clone()).unwrap();

        let config = SweepConfig::default();
        let x = route(&forward, &config).unwrap();
        let y = route(&reversed, &config).unwrap();
        assert_eq!(x.method, y.method);
        assert_eq!(x.p_value, y.p_value);
    }

    #[test]
    fn test_identical_values_give_nan_outcome() {
        let pair = grouped_pair(&[("a", vec![2.0; 5]), ("b", vec![2.0; 5])]);
        let outcome = route(&pair, &SweepConfig::default()).unwrap();
        assert!(outcome.p_value.is_nan());
        assert_eq!(outcome.significant, None);
    }

    #[test]
    fn test_single_group_gives_nan_outcome() {
        let pair = grouped_pair(&[("only", vec![1.0, 2.0, 3.0, 4.0])]);
        let outcome = route(&pair, &SweepConfig::default()).unwrap();
        assert!(outcome.p_value.is_nan());
        assert_eq!(outcome.significant, None);
    }

    #[test]
    fn test_nan_measurement_is_treated_as_missing() {
        let a = Variable::numeric("a", [Some(1.0), Some(2.0), Some(f64::NAN), Some(4.0)]);
        let b = Variable::numeric("b", [11.0, 12.0, 13.0, 14.5].map(Some));
        let outcome = route(&QuestionPair::new(a, b).unwrap(), &SweepConfig::default()).unwrap();
        assert_eq!(outcome.method, TestMethod::WelchT);
        assert!(outcome.p_value.is_finite());
    }

    #[test]
    fn test_non_finite_numbers_give_nan_outcome() {
        let values = [1.0, 2.0, f64::INFINITY, 4.0]
            .map(|v| Some(Value::Number(v)))
            .to_vec();
        let a = Variable::new("a", Kind::Numeric, values);
        let b = Variable::numeric("b", [11.0, 12.0, 13.0, 14.5].map(Some));
        let outcome = route(&QuestionPair::new(a, b).unwrap(), &SweepConfig::default()).unwrap();
        assert_eq!(outcome.method, TestMethod::WelchT);
        assert!(outcome.p_value.is_nan());
        assert_eq!(outcome.significant, None);
    }

    #[test]
    fn test_overflowing_measurements_give_nan_outcome() {
        let a = Variable::numeric("a", [1e300, -1e300, 1e300, -1e300].map(Some));
        let b = Variable::numeric("b", [1.0, 2.0, 3.0, 4.0].map(Some));
        let outcome = route(&QuestionPair::new(a, b).unwrap(), &SweepConfig::default()).unwrap();
        assert!(outcome.p_value.is_nan());
        assert_eq!(outcome.significant, None);
    }

    #[test]
    fn test_unknown_kind_is_fatal() {
        let a = Variable::new("when", Kind::Unknown, vec![None, None]);
        let b = Variable::numeric("b", [1.0, 2.0].map(Some));
        let err = route(&QuestionPair::new(a, b).unwrap(), &SweepConfig::default()).unwrap_err();
        assert!(matches!(err, SweepError::UnsupportedKind { .. }));
    }

    #[test]
    fn test_significance_follows_alpha() {
        let outcome = TestOutcome::from_p_value(TestMethod::ChiSquare, 0.05, 0.05);
        assert_eq!(outcome.significant, Some(true));
        let outcome = TestOutcome::from_p_value(TestMethod::ChiSquare, f64::NAN, 0.05);
        assert_eq!(outcome.significant, None);
    }

    #[test]
    fn test_distinct_id_counting() {
        // The same responder repeated across joined rows counts once per cell.
        let a = Variable::categorical("a", ["x", "x", "x", "y"].map(Some));
        let b = Variable::categorical("b", ["p", "p", "p", "q"].map(Some));
        let ids = Variable::categorical("id", ["1", "1", "1", "2"].map(Some));
        let pair = QuestionPair::new(a, b).unwrap().with_ids(ids).unwrap();

        let rows = route(&pair, &SweepConfig::default()).unwrap();
        let distinct = route(
            &pair,
            &SweepConfig::default().with_contingency(ContingencyMode::DistinctIds),
        )
        .unwrap();
        assert!(distinct.p_value > rows.p_value);
    }
}
