//! Difference tests across k independent groups.

use super::descriptive::{average_ranks, is_constant, mean, tie_correction};
use super::distribution::{chi_squared_sf, fisher_sf};
use super::TestStatistic;
use crate::error::{Result, SweepError};

fn check_groups(test: &str, groups: &[&[f64]]) -> Result<usize> {
    if groups.len() < 2 {
        return Err(SweepError::degenerate(
            test,
            format!("needs at least 2 groups, got {}", groups.len()),
        ));
    }
    if groups.iter().any(|g| g.is_empty()) {
        return Err(SweepError::degenerate(test, "empty group"));
    }
    if groups.iter().flat_map(|g| g.iter()).any(|v| !v.is_finite()) {
        return Err(SweepError::degenerate(test, "non-finite observation"));
    }
    Ok(groups.iter().map(|g| g.len()).sum())
}

/// One-way ANOVA. H0: all group means are equal.
///
/// `dof` is the between-groups degrees of freedom. When every group is
/// constant but the means differ, F is infinite and p is 0.
pub fn one_way_anova(groups: &[&[f64]]) -> Result<TestStatistic> {
    const TEST: &str = "one-way ANOVA";

    let total_n = check_groups(TEST, groups)?;
    let k = groups.len();
    if total_n <= k {
        return Err(SweepError::degenerate(
            TEST,
            format!("{total_n} observations leave no within-group degrees of freedom"),
        ));
    }

    let grand_mean = groups.iter().flat_map(|g| g.iter()).sum::<f64>() / total_n as f64;
    let means: Vec<f64> = groups.iter().map(|g| mean(g)).collect();

    let ss_between: f64 = groups
        .iter()
        .zip(&means)
        .map(|(g, m)| g.len() as f64 * (m - grand_mean).powi(2))
        .sum();
    let ss_within: f64 = groups
        .iter()
        .zip(&means)
        .map(|(g, m)| g.iter().map(|x| (x - m).powi(2)).sum::<f64>())
        .sum();

    let dof_between = (k - 1) as f64;
    let dof_within = (total_n - k) as f64;
    let ms_between = ss_between / dof_between;
    let ms_within = ss_within / dof_within;

    if ms_within <= 0.0 {
        if ms_between <= 0.0 {
            return Err(SweepError::degenerate(TEST, "all observations are identical"));
        }
        return Ok(TestStatistic::new(f64::INFINITY, dof_between, 0.0));
    }

    let f = ms_between / ms_within;
    let p_value = fisher_sf(TEST, f, dof_between, dof_within)?;
    Ok(TestStatistic::new(f, dof_between, p_value))
}

/// Kruskal-Wallis H test with tie correction. H0: all groups share one
/// distribution.
pub fn kruskal_wallis(groups: &[&[f64]]) -> Result<TestStatistic> {
    const TEST: &str = "Kruskal-Wallis";

    let total_n = check_groups(TEST, groups)?;
    let pooled: Vec<f64> = groups.iter().flat_map(|g| g.iter().copied()).collect();
    if is_constant(&pooled) {
        return Err(SweepError::degenerate(TEST, "all numbers are identical"));
    }

    let ranks = average_ranks(&pooled);
    let nf = total_n as f64;

    let mut offset = 0;
    let mut h = 0.0;
    for g in groups {
        let rank_sum: f64 = ranks[offset..offset + g.len()].iter().sum();
        h += rank_sum * rank_sum / g.len() as f64;
        offset += g.len();
    }
    h = 12.0 / (nf * (nf + 1.0)) * h - 3.0 * (nf + 1.0);
    h /= 1.0 - tie_correction(&pooled) / (nf * nf * nf - nf);

    let dof = (groups.len() - 1) as f64;
    let p_value = chi_squared_sf(TEST, h, dof)?;
    Ok(TestStatistic::new(h, dof, p_value))
}
