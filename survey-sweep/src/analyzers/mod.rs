//! Test selection and execution for a single question pair.
//!
//! The analyzers turn an aligned [`QuestionPair`](crate::variable::QuestionPair)
//! into a hypothesis-test outcome and a correlation outcome:
//!
//! - **Classifier** (`classifier`): kind and measurement scale of a variable
//! - **Precheck** (`precheck`): normality and equal-variance gates in front of
//!   the group-difference tests
//! - **Hypothesis router** (`hypothesis`): picks chi-square, Welch's t,
//!   one-way ANOVA or Kruskal-Wallis from the pair's kinds
//! - **Correlation engine** (`correlation`): picks Pearson, Spearman,
//!   Cramér's V or the correlation ratio from kinds and scales
//!
//! ## Example Usage
//!
//! ```rust
//! use survey_sweep::analyzers::{compute_correlation, route, CorrelationMethod, TestMethod};
//! use survey_sweep::config::SweepConfig;
//! use survey_sweep::variable::{OrdinalReference, QuestionPair, Variable};
//!
//! let hours = Variable::numeric("hours", [8.0, 9.0, 7.5, 10.0, 6.0, 6.5].map(Some));
//! let team = Variable::categorical("team", ["a", "a", "a", "b", "b", "b"].map(Some));
//! let pair = QuestionPair::new(team, hours).unwrap();
//! let config = SweepConfig::default();
//!
//! let test = route(&pair, &config).unwrap();
//! assert!(matches!(test.method, TestMethod::Anova | TestMethod::KruskalWallis));
//!
//! let corr = compute_correlation(&pair, &OrdinalReference::new(), &config);
//! assert_eq!(corr.method, CorrelationMethod::CorrelationRatio);
//! assert!(corr.p_value.is_nan());
//! ```

pub mod classifier;
pub mod correlation;
pub mod hypothesis;
pub mod precheck;

pub use classifier::{classify_kind, classify_scale};
pub use correlation::{compute_correlation, CorrelationMethod, CorrelationOutcome};
pub use hypothesis::{route, TestMethod, TestOutcome};
pub use precheck::{
    distribution_variance_test, normality_all, normality_check, variance_homogeneity_check,
    PrecheckOutcome,
};
