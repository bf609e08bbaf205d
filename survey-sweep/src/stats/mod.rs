//! Statistics kernels.
//!
//! Pure, synchronous functions over `f64` slices and contingency tables. Every
//! test returns a [`TestStatistic`] or fails with
//! [`SweepError::DegenerateInput`](crate::error::SweepError::DegenerateInput)
//! when the numbers do not define the test. Distribution functions come from
//! `statrs`.
//!
//! | Kernel | Module |
//! |--------|--------|
//! | mean, sample variance, average ranks | [`descriptive`] |
//! | Shapiro-Wilk | [`normality`] |
//! | Bartlett | [`variance`] |
//! | one-way ANOVA, Kruskal-Wallis | [`groups`] |
//! | Student, Welch and paired t-tests | [`ttest`] |
//! | chi-square contingency, Cramér's V, residuals | [`contingency`] |
//! | Pearson, Spearman, correlation ratio | [`association`] |

pub mod association;
pub mod contingency;
pub mod descriptive;
mod distribution;
pub mod groups;
pub mod normality;
pub mod ttest;
pub mod variance;

pub use association::{correlation_ratio, pearson, spearman};
pub use contingency::{chi2_contingency, cramers_v, standardized_residuals};
pub use descriptive::{average_ranks, mean, sample_variance, sum_of_squares};
pub use groups::{kruskal_wallis, one_way_anova};
pub use normality::shapiro_wilk;
pub use ttest::{t_test, TTestKind};
pub use variance::bartlett;

use serde::{Deserialize, Serialize};

/// The result of a hypothesis test or an association measure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestStatistic {
    /// Test statistic (W, F, H, t, χ², r, ρ or η² depending on the kernel).
    pub statistic: f64,
    /// Degrees of freedom; fractional for Welch, `NaN` where undefined.
    pub dof: f64,
    /// p-value; `NaN` for measures without a null distribution.
    pub p_value: f64,
}

impl TestStatistic {
    pub fn new(statistic: f64, dof: f64, p_value: f64) -> Self {
        Self {
            statistic,
            dof,
            p_value,
        }
    }
}
