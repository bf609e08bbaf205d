//! # survey-sweep - Pairwise statistics for survey questions
//!
//! survey-sweep runs an exploratory sweep over pairs of survey question
//! columns. For every pair it picks a hypothesis test from the kinds of the
//! two variables, gates the group-difference tests on normality and equal
//! variance, and picks an association measure from their measurement scales.
//! The result is one row per pair with the test, its p-value, the measure and
//! its value.
//!
//! ## Quick Start
//!
//! ```rust
//! use survey_sweep::prelude::*;
//! use survey_sweep::sweep::{InMemoryProvider, PairSpec, PairSweep};
//! use survey_sweep::variable::Variable;
//!
//! # fn example() -> Result<()> {
//! let provider = InMemoryProvider::new()
//!     .with_variable(Variable::categorical(
//!         "Team",
//!         ["a", "a", "a", "b", "b", "b"].map(Some),
//!     ))
//!     .with_variable(Variable::numeric(
//!         "Hours worked",
//!         [38.0, 40.0, 39.5, 45.0, 47.0, 44.0].map(Some),
//!     ));
//!
//! let sweep = PairSweep::new(SweepConfig::default(), OrdinalReference::new());
//! let report = sweep.run(&provider, &[PairSpec::new("Team", "Hours worked", "2021")])?;
//!
//! let row = &report.rows()[0];
//! println!("{}: p = {}", row.test_method, row.test_p_value);
//! println!("{}: {}", row.corr_method, row.corr_statistic);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Decision rules
//!
//! | Kinds                    | Test                                   |
//! |--------------------------|----------------------------------------|
//! | categorical, categorical | chi-square independence (Yates on 2x2) |
//! | numeric, numeric         | Welch t-test                           |
//! | categorical, numeric     | ANOVA or Kruskal-Wallis, by precheck   |
//!
//! The precheck runs Shapiro-Wilk on every group at a Bonferroni-corrected
//! level and, if all groups pass, Bartlett's test. ANOVA runs only when both
//! pass. See [`analyzers`] for the correlation table.
//!
//! ## Studies over survey tables
//!
//! With a [`catalog::QuestionCatalog`] and a survey year registered in a
//! DataFusion context (see [`sources::CsvSource`]), a [`study::SurveyStudy`]
//! sweeps every question of one data model against every question of
//! another, and reports the strongest significant associations.
//!
//! ```rust,no_run
//! use survey_sweep::prelude::*;
//! use survey_sweep::catalog::QuestionCatalog;
//! use survey_sweep::sources::{CsvSource, DataSource};
//! use survey_sweep::study::SurveyStudy;
//! use datafusion::prelude::SessionContext;
//!
//! # async fn example() -> Result<()> {
//! let ctx = SessionContext::new();
//! CsvSource::new("data/rws_2021.csv")?
//!     .register(&ctx, "rws_2021")
//!     .await?;
//!
//! let catalog = QuestionCatalog::from_json_file("questions.json")?;
//! let membership = catalog.membership("2021");
//! let study = SurveyStudy::new(
//!     catalog,
//!     OrdinalReference::from_json_file("likert.json")?,
//!     StudyConfig::from_json_file("study.json")?,
//! );
//!
//! let findings = study
//!     .findings(&ctx, "rws_2021", "WPB", "TMS", &membership)
//!     .await?;
//! for finding in &findings {
//!     println!("{} x {}: {}", finding.row.question1, finding.row.question2, finding.row.corr_statistic);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **`variable`**: variables, kinds, scales, pairs, groups and contingency tables
//! - **`stats`**: the test and association kernels
//! - **`analyzers`**: classifier, prechecks, test router and correlation engine
//! - **`sweep`**: pairwise orchestration and the result rows
//! - **`sources`**: CSV registration and the response-id merge
//! - **`catalog`** / **`study`**: question catalog and model-versus-model studies
//! - **`formatters`**: JSON, text and CSV output
//! - **`logging`**: narration macros and subscriber setup

pub mod analyzers;
pub mod catalog;
pub mod config;
pub mod error;
pub mod formatters;
pub mod logging;
pub mod prelude;
pub mod security;
pub mod sources;
pub mod stats;
pub mod study;
pub mod sweep;
pub mod variable;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_fixtures;
