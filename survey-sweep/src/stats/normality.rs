//! Shapiro-Wilk normality test (Royston's AS R94 approximation).

use super::descriptive::{is_constant, rescaled, sum_of_squares};
use super::distribution::{standard_normal_quantile, standard_normal_sf};
use super::TestStatistic;
use crate::error::{Result, SweepError};
use std::cmp::Ordering;

const TEST: &str = "Shapiro-Wilk";

const SW_C1: [f64; 6] = [0.0, 0.221157, -0.147981, -2.07119, 4.434685, -2.706056];
const SW_C2: [f64; 6] = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];
const SW_C3: [f64; 4] = [0.544, -0.39978, 0.025054, -6.714e-4];
const SW_C4: [f64; 4] = [1.3822, -0.77857, 0.062767, -0.0020322];
const SW_C5: [f64; 4] = [-1.5861, -0.31082, -0.083751, 0.0038915];
const SW_C6: [f64; 3] = [-0.4803, -0.082676, 0.0030302];
const SW_G: [f64; 2] = [-2.273, 0.459];

/// Computes W and its p-value for a sample of at least three values.
///
/// Samples above 5000 values are still evaluated; the approximation is only
/// calibrated up to that size.
pub fn shapiro_wilk(sample: &[f64]) -> Result<TestStatistic> {
    let n = sample.len();
    if n < 3 {
        return Err(SweepError::degenerate(
            TEST,
            format!("needs at least 3 observations, got {n}"),
        ));
    }
    if sample.iter().any(|v| !v.is_finite()) {
        return Err(SweepError::degenerate(TEST, "non-finite observation"));
    }
    if is_constant(sample) {
        return Err(SweepError::degenerate(TEST, "all observations are identical"));
    }

    let mut x = rescaled(sample);
    x.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let ss = sum_of_squares(&x);

    if n == 3 {
        let a1 = std::f64::consts::FRAC_1_SQRT_2;
        let w = ((a1 * (x[2] - x[0])).powi(2) / ss).clamp(0.75, 1.0);
        let p = 1.0 - (6.0 / std::f64::consts::PI) * w.sqrt().acos();
        return Ok(TestStatistic::new(w, f64::NAN, p.clamp(0.0, 1.0)));
    }

    let a = coefficients(n)?;
    let numerator: f64 = a
        .iter()
        .enumerate()
        .map(|(i, ai)| ai * (x[n - 1 - i] - x[i]))
        .sum();
    let w = (numerator * numerator / ss).min(1.0);
    let p = p_value(w, n)?;

    Ok(TestStatistic::new(w, f64::NAN, p.clamp(0.0, 1.0)))
}

// c[0] + c[1] x + c[2] x^2 + ...
fn poly(c: &[f64], x: f64) -> f64 {
    c.iter().rev().fold(0.0, |acc, ci| acc * x + ci)
}

fn coefficients(n: usize) -> Result<Vec<f64>> {
    let half = n / 2;
    let nf = n as f64;

    let mut m = Vec::with_capacity(half);
    for i in 0..half {
        m.push(standard_normal_quantile((i as f64 + 1.0 - 0.375) / (nf + 0.25))?);
    }
    let summ2 = 2.0 * m.iter().map(|v| v * v).sum::<f64>();
    let ssumm2 = summ2.sqrt();
    let rsn = 1.0 / nf.sqrt();

    let a1 = poly(&SW_C1, rsn) - m[0] / ssumm2;
    let corrected = if n <= 5 { 1 } else { 2 };

    let (fac_sq, one_minus, head) = if corrected == 1 {
        (
            summ2 - 2.0 * m[0] * m[0],
            1.0 - 2.0 * a1 * a1,
            vec![a1],
        )
    } else {
        let a2 = -m[1] / ssumm2 + poly(&SW_C2, rsn);
        (
            summ2 - 2.0 * m[0] * m[0] - 2.0 * m[1] * m[1],
            1.0 - 2.0 * a1 * a1 - 2.0 * a2 * a2,
            vec![a1, a2],
        )
    };
    if fac_sq <= 0.0 || one_minus <= 0.0 {
        return Err(SweepError::degenerate(TEST, "coefficient normalization failed"));
    }
    let fac = (fac_sq / one_minus).sqrt();

    let mut a = head;
    a.extend(m[corrected..].iter().map(|mi| -mi / fac));
    Ok(a)
}

fn p_value(w: f64, n: usize) -> Result<f64> {
    let nf = n as f64;
    let w1 = 1.0 - w;
    if w1 <= 0.0 {
        return Ok(1.0);
    }
    let y = w1.ln();

    let z = if n <= 11 {
        let gamma = poly(&SW_G, nf);
        if y >= gamma {
            return Ok(0.0);
        }
        let y = -(gamma - y).ln();
        let m = poly(&SW_C3, nf);
        let s = poly(&SW_C4, nf).exp();
        (y - m) / s
    } else {
        let ln_n = nf.ln();
        let m = poly(&SW_C5, ln_n);
        let s = poly(&SW_C6, ln_n).exp();
        (y - m) / s
    };
    standard_normal_sf(z)
}
