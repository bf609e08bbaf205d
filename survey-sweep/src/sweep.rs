//! Pairwise sweep orchestration.
//!
//! A [`PairSweep`] runs the hypothesis router and the correlation engine over
//! a list of [`PairSpec`]s, fetching each aligned pair from a
//! [`PairProvider`] and appending one [`ResultRow`] per spec. Pairs share no
//! state: the output order is the input order and the same inputs always
//! produce the same rows.
//!
//! ```rust
//! use survey_sweep::sweep::{InMemoryProvider, PairSpec, PairSweep};
//! use survey_sweep::variable::{OrdinalReference, Variable};
//! use survey_sweep::config::SweepConfig;
//!
//! let provider = InMemoryProvider::new()
//!     .with_variable(Variable::numeric("age", [23.0, 35.0, 41.0, 52.0, 29.0].map(Some)))
//!     .with_variable(Variable::numeric("hours", [40.0, 38.0, 45.0, 50.0, 36.0].map(Some)));
//!
//! let sweep = PairSweep::new(SweepConfig::default(), OrdinalReference::new());
//! let report = sweep
//!     .run(&provider, &[PairSpec::new("age", "hours", "2021")])
//!     .unwrap();
//!
//! assert_eq!(report.len(), 1);
//! assert_eq!(report.rows()[0].corr_method.name(), "Pearson");
//! ```

use crate::analyzers::{compute_correlation, route, CorrelationMethod, TestMethod};
use crate::config::SweepConfig;
use crate::error::{Result, SweepError};
use crate::narrate;
use crate::variable::{OrdinalReference, QuestionPair, Variable};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{info, instrument};

/// One pair of raw question columns to evaluate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PairSpec {
    pub question1: String,
    pub question2: String,
    /// Survey year the columns belong to; carried into the result row.
    pub year: String,
}

impl PairSpec {
    pub fn new(
        question1: impl Into<String>,
        question2: impl Into<String>,
        year: impl Into<String>,
    ) -> Self {
        Self {
            question1: question1.into(),
            question2: question2.into(),
            year: year.into(),
        }
    }
}

/// Supplies the aligned data for a pair spec.
pub trait PairProvider {
    /// Returns the two columns named by `spec`, aligned row by row.
    fn pair(&self, spec: &PairSpec) -> Result<QuestionPair>;
}

/// A provider over variables already held in memory.
///
/// All variables must share one row alignment. An optional id variable is
/// attached to every pair for distinct-id cross-tabulation.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    variables: HashMap<String, Variable>,
    ids: Option<Variable>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a variable under its own name.
    pub fn with_variable(mut self, variable: Variable) -> Self {
        self.variables.insert(variable.name().to_string(), variable);
        self
    }

    pub fn with_ids(mut self, ids: Variable) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    fn variable(&self, name: &str) -> Result<&Variable> {
        self.variables
            .get(name)
            .ok_or_else(|| SweepError::ColumnNotFound {
                column: name.to_string(),
            })
    }
}

impl PairProvider for InMemoryProvider {
    fn pair(&self, spec: &PairSpec) -> Result<QuestionPair> {
        let pair = QuestionPair::new(
            self.variable(&spec.question1)?.clone(),
            self.variable(&spec.question2)?.clone(),
        )?;
        match &self.ids {
            Some(ids) => pair.with_ids(ids.clone()),
            None => Ok(pair),
        }
    }
}

/// One evaluated pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub question1: String,
    pub question2: String,
    pub year: String,
    pub test_method: TestMethod,
    pub test_p_value: f64,
    pub test_significant: Option<bool>,
    pub corr_statistic: f64,
    pub corr_p_value: f64,
    pub corr_method: CorrelationMethod,
}

type DedupKey = (
    String,
    String,
    String,
    TestMethod,
    u64,
    Option<bool>,
    u64,
    u64,
    CorrelationMethod,
);

impl ResultRow {
    // NaN compares equal to NaN here, as duplicate detection expects.
    fn dedup_key(&self) -> DedupKey {
        fn bits(v: f64) -> u64 {
            if v.is_nan() {
                f64::NAN.to_bits()
            } else {
                v.to_bits()
            }
        }
        (
            self.question1.clone(),
            self.question2.clone(),
            self.year.clone(),
            self.test_method,
            bits(self.test_p_value),
            self.test_significant,
            bits(self.corr_statistic),
            bits(self.corr_p_value),
            self.corr_method,
        )
    }
}

/// The rows of one or more sweeps, in evaluation order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SweepReport {
    rows: Vec<ResultRow>,
}

impl SweepReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: Vec<ResultRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<ResultRow> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn push(&mut self, row: ResultRow) {
        self.rows.push(row);
    }

    /// Appends the rows of another report.
    pub fn extend(&mut self, other: SweepReport) {
        self.rows.extend(other.rows);
    }

    /// Drops exact duplicate rows, keeping the first occurrence.
    pub fn dedup(mut self) -> Self {
        let mut seen = HashSet::new();
        self.rows.retain(|row| seen.insert(row.dedup_key()));
        self
    }
}

impl IntoIterator for SweepReport {
    type Item = ResultRow;
    type IntoIter = std::vec::IntoIter<ResultRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

/// Runs router and engine over a list of pairs.
#[derive(Debug, Clone)]
pub struct PairSweep {
    config: SweepConfig,
    reference: OrdinalReference,
}

impl PairSweep {
    pub fn new(config: SweepConfig, reference: OrdinalReference) -> Self {
        Self { config, reference }
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    pub fn reference(&self) -> &OrdinalReference {
        &self.reference
    }

    /// Evaluates one pair.
    pub fn evaluate(&self, spec: &PairSpec, pair: &QuestionPair) -> Result<ResultRow> {
        let test = route(pair, &self.config)?;
        let corr = compute_correlation(pair, &self.reference, &self.config);
        narrate!(
            self.config.log_config(),
            question1 = %spec.question1,
            question2 = %spec.question2,
            test = %test.method,
            correlation = %corr.method,
            "pair evaluated"
        );
        Ok(ResultRow {
            question1: spec.question1.clone(),
            question2: spec.question2.clone(),
            year: spec.year.clone(),
            test_method: test.method,
            test_p_value: test.p_value,
            test_significant: test.significant,
            corr_statistic: corr.statistic,
            corr_p_value: corr.p_value,
            corr_method: corr.method,
        })
    }

    /// Evaluates every spec in order.
    ///
    /// Undefined tests produce `NaN` rows; unknown kinds, misaligned pairs and
    /// provider failures abort the sweep.
    #[instrument(skip(self, provider, specs), fields(pairs = specs.len()))]
    pub fn run<P: PairProvider + ?Sized>(
        &self,
        provider: &P,
        specs: &[PairSpec],
    ) -> Result<SweepReport> {
        self.config.validate()?;

        let mut report = SweepReport::new();
        for spec in specs {
            let pair = provider.pair(spec)?;
            report.push(self.evaluate(spec, &pair)?);
        }

        info!(rows = report.len(), "sweep finished");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable::Kind;

    fn provider() -> InMemoryProvider {
        InMemoryProvider::new()
            .with_variable(Variable::numeric(
                "age",
                [23.0, 35.0, 41.0, 52.0, 29.0, 61.0].map(Some),
            ))
            .with_variable(Variable::numeric(
                "hours",
                [40.0, 38.0, 45.0, 50.0, 36.0, 55.0].map(Some),
            ))
            .with_variable(Variable::categorical(
                "team",
                ["a", "b", "a", "b", "a", "b"].map(Some),
            ))
    }

    #[test]
    fn test_rows_follow_spec_order() {
        let specs = vec![
            PairSpec::new("team", "hours", "2021"),
            PairSpec::new("age", "hours", "2021"),
            PairSpec::new("hours", "team", "2021"),
        ];
        let sweep = PairSweep::new(SweepConfig::default(), OrdinalReference::new());
        let report = sweep.run(&provider(), &specs).unwrap();

        let names: Vec<(&str, &str)> = report
            .rows()
            .iter()
            .map(|r| (r.question1.as_str(), r.question2.as_str()))
            .collect();
        assert_eq!(
            names,
            vec![("team", "hours"), ("age", "hours"), ("hours", "team")]
        );
        assert_eq!(report.rows()[1].corr_method, CorrelationMethod::Pearson);
        assert_eq!(report.rows()[0].corr_method, CorrelationMethod::CorrelationRatio);
    }

    #[test]
    fn test_sweep_is_idempotent() {
        let specs = vec![
            PairSpec::new("team", "hours", "2021"),
            PairSpec::new("age", "team", "2021"),
        ];
        let sweep = PairSweep::new(SweepConfig::default(), OrdinalReference::new());
        let first = sweep.run(&provider(), &specs).unwrap();
        let second = sweep.run(&provider(), &specs).unwrap();
        assert_eq!(first.clone().dedup().len(), 2);
        for (a, b) in first.rows().iter().zip(second.rows()) {
            assert_eq!(a.dedup_key(), b.dedup_key());
        }
    }

    #[test]
    fn test_dedup_keeps_first_and_treats_nan_as_equal() {
        let row = ResultRow {
            question1: "a".into(),
            question2: "b".into(),
            year: "2021".into(),
            test_method: TestMethod::Undetermined,
            test_p_value: f64::NAN,
            test_significant: None,
            corr_statistic: f64::NAN,
            corr_p_value: f64::NAN,
            corr_method: CorrelationMethod::BadRequest,
        };
        let mut other = row.clone();
        other.question2 = "c".into();

        let report = SweepReport::from_rows(vec![row.clone(), other, row]).dedup();
        assert_eq!(report.len(), 2);
        assert_eq!(report.rows()[1].question2, "c");
    }

    #[test]
    fn test_missing_column_aborts() {
        let sweep = PairSweep::new(SweepConfig::default(), OrdinalReference::new());
        let err = sweep
            .run(&provider(), &[PairSpec::new("age", "nope", "2021")])
            .unwrap_err();
        assert!(matches!(err, SweepError::ColumnNotFound { .. }));
    }

    #[test]
    fn test_unknown_kind_aborts() {
        let provider =
            provider().with_variable(Variable::new("submitted", Kind::Unknown, vec![None; 6]));
        let sweep = PairSweep::new(SweepConfig::default(), OrdinalReference::new());
        let err = sweep
            .run(&provider, &[PairSpec::new("submitted", "age", "2021")])
            .unwrap_err();
        assert!(matches!(err, SweepError::UnsupportedKind { .. }));
    }

    #[test]
    fn test_invalid_alpha_is_rejected() {
        let sweep = PairSweep::new(SweepConfig::new().with_alpha(1.5), OrdinalReference::new());
        assert!(sweep.run(&provider(), &[]).is_err());
    }
}
