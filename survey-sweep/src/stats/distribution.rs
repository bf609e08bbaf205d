//! Thin wrappers over `statrs` distributions.

use crate::error::{Result, SweepError};
use statrs::distribution::{ChiSquared, ContinuousCDF, FisherSnedecor, Normal, StudentsT};

// statrs panics on NaN arguments to the incomplete beta and gamma functions.
fn ensure_finite(test: &str, statistic: f64, dofs: &[f64]) -> Result<()> {
    if !statistic.is_finite() {
        return Err(SweepError::degenerate(
            test,
            format!("statistic is not finite: {statistic}"),
        ));
    }
    if let Some(dof) = dofs.iter().find(|d| !d.is_finite()) {
        return Err(SweepError::degenerate(
            test,
            format!("degrees of freedom are not finite: {dof}"),
        ));
    }
    Ok(())
}

/// Upper tail of χ²(dof) at `x`.
pub(crate) fn chi_squared_sf(test: &str, x: f64, dof: f64) -> Result<f64> {
    ensure_finite(test, x, &[dof])?;
    let dist = ChiSquared::new(dof)
        .map_err(|e| SweepError::degenerate(test, format!("chi-square with {dof} dof: {e}")))?;
    Ok(dist.sf(x))
}

/// Upper tail of F(dof1, dof2) at `x`.
pub(crate) fn fisher_sf(test: &str, x: f64, dof1: f64, dof2: f64) -> Result<f64> {
    ensure_finite(test, x, &[dof1, dof2])?;
    let dist = FisherSnedecor::new(dof1, dof2).map_err(|e| {
        SweepError::degenerate(test, format!("F distribution with ({dof1}, {dof2}) dof: {e}"))
    })?;
    Ok(dist.sf(x))
}

/// Two-sided tail probability of Student's t(dof) at `t`.
pub(crate) fn students_t_two_sided(test: &str, t: f64, dof: f64) -> Result<f64> {
    ensure_finite(test, t, &[dof])?;
    let dist = StudentsT::new(0.0, 1.0, dof)
        .map_err(|e| SweepError::degenerate(test, format!("Student t with {dof} dof: {e}")))?;
    Ok((2.0 * dist.sf(t.abs())).min(1.0))
}

/// Standard normal upper tail at `z`.
pub(crate) fn standard_normal_sf(z: f64) -> Result<f64> {
    let dist = Normal::new(0.0, 1.0)
        .map_err(|e| SweepError::Internal(format!("standard normal: {e}")))?;
    Ok(dist.sf(z))
}

/// Standard normal quantile.
pub(crate) fn standard_normal_quantile(p: f64) -> Result<f64> {
    let dist = Normal::new(0.0, 1.0)
        .map_err(|e| SweepError::Internal(format!("standard normal: {e}")))?;
    Ok(dist.inverse_cdf(p))
}
