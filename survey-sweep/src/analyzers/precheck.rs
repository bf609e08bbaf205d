//! Normality and equal-variance gates for the group-difference tests.
//!
//! Prechecks read "p >= alpha" as the good outcome (normal, equal variance),
//! the opposite reading of the router's "p <= alpha is significant".

use crate::error::{Result, SweepError};
use crate::stats::{bartlett, descriptive::is_constant, shapiro_wilk};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// The combined verdict of the prechecks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrecheckOutcome {
    /// Every group passed the Bonferroni-corrected normality check.
    pub normal_all: bool,
    /// Bartlett's verdict; only evaluated when `normal_all` holds.
    pub equal_variance: Option<bool>,
}

/// Shapiro-Wilk normality check of one sample.
///
/// Fewer than three observations, or all observations identical, count as
/// normal with p = 1.
pub fn normality_check(sample: &[f64], alpha: f64) -> Result<(f64, bool)> {
    if sample.len() < 3 || is_constant(sample) {
        return Ok((1.0, true));
    }
    let p = shapiro_wilk(sample)?.p_value;
    Ok((p, p >= alpha))
}

/// True when every sample passes [`normality_check`] at `alpha / samples.len()`.
pub fn normality_all(samples: &[&[f64]], alpha: f64) -> Result<bool> {
    if samples.is_empty() {
        return Err(SweepError::degenerate("normality", "no samples to check"));
    }
    let threshold = alpha / samples.len() as f64;
    for sample in samples {
        if !normality_check(sample, threshold)?.1 {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Bartlett's test for equal variances.
///
/// The variances count as equal unless `p <= alpha`, so an undefined
/// p-value (returned as `NaN`) reads as equal.
pub fn variance_homogeneity_check(alpha: f64, samples: &[&[f64]]) -> Result<(f64, bool)> {
    let p = match bartlett(samples) {
        Ok(result) => result.p_value,
        Err(e) if e.is_degenerate() => {
            warn!(error = %e, "Bartlett's test undefined; treating variances as equal");
            f64::NAN
        }
        Err(e) => return Err(e),
    };
    Ok((p, !(p <= alpha)))
}

/// Runs the normality gate and, if it passes, the variance gate.
pub fn distribution_variance_test(alpha: f64, samples: &[&[f64]]) -> Result<PrecheckOutcome> {
    let normal_all = normality_all(samples, alpha)?;
    let equal_variance = if normal_all {
        Some(variance_homogeneity_check(alpha, samples)?.1)
    } else {
        None
    };
    Ok(PrecheckOutcome {
        normal_all,
        equal_variance,
    })
}
