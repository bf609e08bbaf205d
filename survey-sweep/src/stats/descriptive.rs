//! Descriptive helpers shared by the tests.

use std::cmp::Ordering;

/// Arithmetic mean; `NaN` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sum of squared deviations from the mean.
pub fn sum_of_squares(values: &[f64]) -> f64 {
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum()
}

/// Unbiased sample variance (n - 1 denominator); `NaN` below two values.
pub fn sample_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    sum_of_squares(values) / (values.len() - 1) as f64
}

// Squared deviations of magnitudes above this overflow once summed.
const RESCALE_ABOVE: f64 = 1e100;

/// Values divided by their largest magnitude when that magnitude is large
/// enough for squared deviations to overflow; otherwise a plain copy.
/// Scale-free statistics are unchanged either way.
pub(crate) fn rescaled(values: &[f64]) -> Vec<f64> {
    let scale = values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if scale <= RESCALE_ABOVE || !scale.is_finite() {
        return values.to_vec();
    }
    values.iter().map(|v| v / scale).collect()
}

/// 1-based ranks in input order, ties sharing the average of their positions.
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal));

    let mut ranks = vec![0.0; values.len()];
    for (start, end) in tie_runs(values, &order) {
        let avg = (start + 1 + end) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = avg;
        }
    }
    ranks
}

/// Σ t(t² - 1) over every run of tied values.
pub(crate) fn tie_correction(values: &[f64]) -> f64 {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal));

    tie_runs(values, &order)
        .into_iter()
        .map(|(start, end)| {
            let t = (end - start) as f64;
            t * (t * t - 1.0)
        })
        .sum()
}

// Half-open position ranges of equal values within the sorted order.
fn tie_runs(values: &[f64], order: &[usize]) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut i = 0;
    while i < order.len() {
        let mut j = i + 1;
        while j < order.len() && values[order[j]] == values[order[i]] {
            j += 1;
        }
        runs.push((i, j));
        i = j;
    }
    runs
}

/// True when every value equals the first one.
pub(crate) fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}
