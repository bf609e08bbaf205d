//! Association measures between two variables.

use super::descriptive::{average_ranks, is_constant, mean, rescaled, sum_of_squares};
use super::distribution::students_t_two_sided;
use super::TestStatistic;
use crate::error::{Result, SweepError};

/// Pearson's r with a two-sided p-value from Student's t(n - 2).
pub fn pearson(x: &[f64], y: &[f64]) -> Result<TestStatistic> {
    linear_correlation("Pearson", x, y)
}

/// Spearman's rank correlation: Pearson's r over average ranks.
pub fn spearman(x: &[f64], y: &[f64]) -> Result<TestStatistic> {
    check_finite("Spearman", x, y)?;
    linear_correlation("Spearman", &average_ranks(x), &average_ranks(y))
}

fn check_finite(test: &str, x: &[f64], y: &[f64]) -> Result<()> {
    if x.iter().chain(y).any(|v| !v.is_finite()) {
        return Err(SweepError::degenerate(test, "non-finite observation"));
    }
    Ok(())
}

fn linear_correlation(test: &str, x: &[f64], y: &[f64]) -> Result<TestStatistic> {
    if x.len() != y.len() {
        return Err(SweepError::degenerate(
            test,
            format!("samples differ in length: {} vs {}", x.len(), y.len()),
        ));
    }
    let n = x.len();
    if n < 3 {
        return Err(SweepError::degenerate(
            test,
            format!("needs at least 3 points, got {n}"),
        ));
    }
    check_finite(test, x, y)?;
    if is_constant(x) || is_constant(y) {
        return Err(SweepError::degenerate(test, "constant input"));
    }

    let (x, y) = (rescaled(x), rescaled(y));
    let (mx, my) = (mean(&x), mean(&y));
    let cross: f64 = x.iter().zip(&y).map(|(a, b)| (a - mx) * (b - my)).sum();
    let r = (cross / (sum_of_squares(&x) * sum_of_squares(&y)).sqrt()).clamp(-1.0, 1.0);
    if r.is_nan() {
        return Err(SweepError::degenerate(test, "correlation is undefined"));
    }

    let dof = (n - 2) as f64;
    let p_value = if r.abs() == 1.0 {
        0.0
    } else {
        let t = r * (dof / (1.0 - r * r)).sqrt();
        students_t_two_sided(test, t, dof)?
    };
    Ok(TestStatistic::new(r, dof, p_value))
}

/// Correlation ratio η² of a numeric variable grouped by a categorical one:
/// (total SS - Σ within-group SS) / total SS.
///
/// Returns `NaN` when there are no observations or no spread at all.
pub fn correlation_ratio(groups: &[&[f64]]) -> f64 {
    let pooled: Vec<f64> = groups.iter().flat_map(|g| g.iter().copied()).collect();
    if pooled.is_empty() {
        return f64::NAN;
    }
    let total = sum_of_squares(&pooled);
    let within: f64 = groups.iter().map(|g| sum_of_squares(g)).sum();
    (total - within) / total
}
