//! Two-sample t-tests.

use super::descriptive::{mean, sample_variance};
use super::distribution::students_t_two_sided;
use super::TestStatistic;
use crate::error::{Result, SweepError};
use serde::{Deserialize, Serialize};

/// Which t-test variant to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TTestKind {
    /// Independent samples, pooled variance.
    Student,
    /// Independent samples, unequal variances (Welch-Satterthwaite dof).
    #[default]
    Welch,
    /// Related samples; the two slices must have the same length.
    Paired,
}

impl TTestKind {
    pub fn name(&self) -> &'static str {
        match self {
            TTestKind::Student => "student t-test",
            TTestKind::Welch => "welch t-test",
            TTestKind::Paired => "related t-test",
        }
    }
}

/// Two-sided t-test of equal means.
///
/// Two constant samples with different means give an infinite statistic and
/// p = 0 for the Student and paired variants. Welch's degrees of freedom are
/// undefined there, so that case is degenerate.
pub fn t_test(a: &[f64], b: &[f64], kind: TTestKind) -> Result<TestStatistic> {
    let test = kind.name();
    if a.len() < 2 || b.len() < 2 {
        return Err(SweepError::degenerate(
            test,
            format!("needs 2 observations per sample, got {} and {}", a.len(), b.len()),
        ));
    }
    if a.iter().chain(b).any(|v| !v.is_finite()) {
        return Err(SweepError::degenerate(test, "non-finite observation"));
    }

    let (diff, se_sq, dof) = match kind {
        TTestKind::Paired => {
            if a.len() != b.len() {
                return Err(SweepError::degenerate(
                    test,
                    format!("samples differ in length: {} vs {}", a.len(), b.len()),
                ));
            }
            let d: Vec<f64> = a.iter().zip(b).map(|(x, y)| x - y).collect();
            let n = d.len() as f64;
            (mean(&d), sample_variance(&d) / n, n - 1.0)
        }
        TTestKind::Student => {
            let (n1, n2) = (a.len() as f64, b.len() as f64);
            let dof = n1 + n2 - 2.0;
            let pooled = ((n1 - 1.0) * sample_variance(a) + (n2 - 1.0) * sample_variance(b)) / dof;
            (mean(a) - mean(b), pooled * (1.0 / n1 + 1.0 / n2), dof)
        }
        TTestKind::Welch => {
            let v1 = sample_variance(a) / a.len() as f64;
            let v2 = sample_variance(b) / b.len() as f64;
            let dof = (v1 + v2).powi(2)
                / (v1 * v1 / (a.len() as f64 - 1.0) + v2 * v2 / (b.len() as f64 - 1.0));
            (mean(a) - mean(b), v1 + v2, dof)
        }
    };

    if se_sq <= 0.0 {
        if diff == 0.0 {
            return Err(SweepError::degenerate(test, "both samples are constant and equal"));
        }
        if kind == TTestKind::Welch {
            return Err(SweepError::degenerate(
                test,
                "both samples are constant; Welch degrees of freedom are undefined",
            ));
        }
        return Ok(TestStatistic::new(
            diff.signum() * f64::INFINITY,
            f64::NAN,
            0.0,
        ));
    }

    let t = diff / se_sq.sqrt();
    let p_value = students_t_two_sided(test, t, dof)?;
    Ok(TestStatistic::new(t, dof, p_value))
}
