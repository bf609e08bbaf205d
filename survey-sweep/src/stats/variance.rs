//! Tests for equality of variances across groups.

use super::descriptive::sample_variance;
use super::distribution::chi_squared_sf;
use super::TestStatistic;
use crate::error::{Result, SweepError};

/// Bartlett's test. H0: every group has the same variance.
///
/// A group with zero variance next to groups that vary makes the statistic
/// infinite, so the p-value is 0. Zero variance everywhere is degenerate.
pub fn bartlett(groups: &[&[f64]]) -> Result<TestStatistic> {
    const TEST: &str = "Bartlett";

    let k = groups.len();
    if k < 2 {
        return Err(SweepError::degenerate(TEST, format!("needs at least 2 groups, got {k}")));
    }
    if let Some(small) = groups.iter().find(|g| g.len() < 2) {
        return Err(SweepError::degenerate(
            TEST,
            format!("every group needs at least 2 observations, found {}", small.len()),
        ));
    }

    let sizes: Vec<f64> = groups.iter().map(|g| g.len() as f64).collect();
    let variances: Vec<f64> = groups.iter().map(|g| sample_variance(g)).collect();
    let n_total: f64 = sizes.iter().sum();
    let nk = n_total - k as f64;
    let dof = (k - 1) as f64;

    let pooled = sizes
        .iter()
        .zip(&variances)
        .map(|(n, v)| (n - 1.0) * v)
        .sum::<f64>()
        / nk;
    if pooled <= 0.0 {
        return Err(SweepError::degenerate(TEST, "every group has zero variance"));
    }
    if variances.iter().any(|&v| v <= 0.0) {
        return Ok(TestStatistic::new(f64::INFINITY, dof, 0.0));
    }

    let numerator = nk * pooled.ln()
        - sizes
            .iter()
            .zip(&variances)
            .map(|(n, v)| (n - 1.0) * v.ln())
            .sum::<f64>();
    let reciprocal: f64 = sizes.iter().map(|n| 1.0 / (n - 1.0)).sum();
    let correction = 1.0 + (reciprocal - 1.0 / nk) / (3.0 * dof);

    let statistic = numerator / correction;
    let p_value = chi_squared_sf(TEST, statistic, dof)?;
    Ok(TestStatistic::new(statistic, dof, p_value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bartlett_detects_unequal_spread() {
        let tight = [2.0, 3.0, 4.0, 5.0, 6.0];
        let wide = [10.0, 20.0, 30.0, 40.0, 50.0];
        let result = bartlett(&[&tight, &wide]).unwrap();
        assert!(result.p_value < 0.01);
        assert_eq!(result.dof, 1.0);
    }

    #[test]
    fn test_bartlett_equal_spread() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0];
        let b = [11.0, 12.0, 13.0, 14.0, 15.0];
        let result = bartlett(&[&a, &b]).unwrap();
        assert!(result.statistic.abs() < 1e-12);
        assert!((result.p_value - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_bartlett_one_constant_group() {
        let flat = [3.0, 3.0, 3.0];
        let varied = [1.0, 2.0, 4.0];
        let result = bartlett(&[&flat, &varied]).unwrap();
        assert_eq!(result.p_value, 0.0);
    }

    #[test]
    fn test_bartlett_degenerate() {
        let flat = [3.0, 3.0];
        assert!(bartlett(&[&flat, &flat]).unwrap_err().is_degenerate());
        assert!(bartlett(&[&[1.0, 2.0]]).unwrap_err().is_degenerate());
        assert!(bartlett(&[&[1.0], &[1.0, 2.0]]).unwrap_err().is_degenerate());
    }
}
