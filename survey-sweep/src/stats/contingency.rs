//! Chi-square analysis of contingency tables.

use super::distribution::chi_squared_sf;
use super::TestStatistic;
use crate::error::{Result, SweepError};
use crate::variable::ContingencyTable;

const TEST: &str = "chi-square independence";

/// Chi-square test of independence.
///
/// Applies Yates' continuity correction when `yates` is set and the table has
/// exactly one degree of freedom. A table with zero degrees of freedom (a
/// single row or column) yields statistic 0 and p-value 1.
pub fn chi2_contingency(table: &ContingencyTable, yates: bool) -> Result<TestStatistic> {
    let expected = checked_expected(table)?;
    let dof = (table.nrows().saturating_sub(1) * table.ncols().saturating_sub(1)) as f64;
    if dof == 0.0 {
        return Ok(TestStatistic::new(0.0, 0.0, 1.0));
    }

    let correct = yates && dof == 1.0;
    let mut statistic = 0.0;
    for (observed_row, expected_row) in table.counts().iter().zip(&expected) {
        for (&o, &e) in observed_row.iter().zip(expected_row) {
            let diff = if correct {
                ((o - e).abs() - 0.5).max(0.0)
            } else {
                o - e
            };
            statistic += diff * diff / e;
        }
    }

    let p_value = chi_squared_sf(TEST, statistic, dof)?;
    Ok(TestStatistic::new(statistic, dof, p_value))
}

/// Cramér's V from the uncorrected chi-square statistic; `NaN` when the
/// table is empty or has a single row or column.
pub fn cramers_v(table: &ContingencyTable) -> f64 {
    let k = table.nrows().min(table.ncols());
    if k < 2 {
        return f64::NAN;
    }
    match chi2_contingency(table, false) {
        Ok(result) => (result.statistic / (table.total() * (k - 1) as f64)).sqrt(),
        Err(_) => f64::NAN,
    }
}

/// Pearson residuals `(observed - expected) / sqrt(expected)` per cell.
///
/// Cells with an absolute residual above 1.96 deviate from independence at
/// the 95% level.
pub fn standardized_residuals(table: &ContingencyTable) -> Result<Vec<Vec<f64>>> {
    let expected = checked_expected(table)?;
    Ok(table
        .counts()
        .iter()
        .zip(&expected)
        .map(|(observed_row, expected_row)| {
            observed_row
                .iter()
                .zip(expected_row)
                .map(|(o, e)| (o - e) / e.sqrt())
                .collect()
        })
        .collect())
}

fn checked_expected(table: &ContingencyTable) -> Result<Vec<Vec<f64>>> {
    if table.nrows() == 0 || table.ncols() == 0 || table.total() <= 0.0 {
        return Err(SweepError::degenerate(TEST, "empty contingency table"));
    }
    let expected = table.expected();
    if expected.iter().flatten().any(|&e| e <= 0.0) {
        return Err(SweepError::degenerate(
            TEST,
            "a row or column of the table sums to zero",
        ));
    }
    Ok(expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(counts: Vec<Vec<f64>>) -> ContingencyTable {
        let rows = (0..counts.len()).map(|i| format!("r{i}")).collect();
        let cols = (0..counts[0].len()).map(|j| format!("c{j}")).collect();
        ContingencyTable::from_counts(rows, cols, counts).unwrap()
    }

    #[test]
    fn test_yates_correction_on_two_by_two() {
        // expected = 20 everywhere, |o - e| = 10 -> (9.5^2 / 20) * 4 = 18.05
        let t = table(vec![vec![30.0, 10.0], vec![10.0, 30.0]]);
        let corrected = chi2_contingency(&t, true).unwrap();
        assert!((corrected.statistic - 18.05).abs() < 1e-9);
        assert_eq!(corrected.dof, 1.0);

        let raw = chi2_contingency(&t, false).unwrap();
        assert!((raw.statistic - 20.0).abs() < 1e-9);
        assert!(raw.p_value < corrected.p_value);
    }

    #[test]
    fn test_larger_table_ignores_yates() {
        let t = table(vec![
            vec![10.0, 20.0, 30.0],
            vec![20.0, 20.0, 20.0],
            vec![30.0, 20.0, 10.0],
        ]);
        let a = chi2_contingency(&t, true).unwrap();
        let b = chi2_contingency(&t, false).unwrap();
        assert_eq!(a.statistic, b.statistic);
        assert_eq!(a.dof, 4.0);
    }

    #[test]
    fn test_single_column_has_no_dof() {
        let t = table(vec![vec![3.0], vec![5.0]]);
        let result = chi2_contingency(&t, true).unwrap();
        assert_eq!(result.statistic, 0.0);
        assert_eq!(result.p_value, 1.0);
        assert!(cramers_v(&t).is_nan());
    }

    #[test]
    fn test_cramers_v_bounds() {
        let perfect = table(vec![vec![10.0, 0.0], vec![0.0, 10.0]]);
        assert!((cramers_v(&perfect) - 1.0).abs() < 1e-12);

        let independent = table(vec![vec![10.0, 10.0], vec![10.0, 10.0]]);
        assert_eq!(cramers_v(&independent), 0.0);
    }

    #[test]
    fn test_residuals() {
        let t = table(vec![vec![30.0, 10.0], vec![10.0, 30.0]]);
        let residuals = standardized_residuals(&t).unwrap();
        let expected = 10.0 / 20.0_f64.sqrt();
        assert!((residuals[0][0] - expected).abs() < 1e-12);
        assert!((residuals[0][1] + expected).abs() < 1e-12);
    }

    #[test]
    fn test_zero_margin_is_degenerate() {
        let t = table(vec![vec![0.0, 0.0], vec![1.0, 2.0]]);
        assert!(chi2_contingency(&t, true).unwrap_err().is_degenerate());
    }
}
