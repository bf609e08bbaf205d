//! Property and repeated-trial tests for the statistics behind the sweep.

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use statrs::distribution::{ContinuousCDF, Normal};
use survey_sweep::analyzers::{
    distribution_variance_test, normality_all, normality_check, route, TestMethod,
};
use survey_sweep::config::SweepConfig;
use survey_sweep::stats::{correlation_ratio, cramers_v};
use survey_sweep::variable::{ContingencyTable, QuestionPair, Variable};

// Exact normal quantiles with unit spread.
fn normal_scores(n: usize, mean: f64) -> Vec<f64> {
    let normal = Normal::new(mean, 1.0).unwrap();
    (0..n)
        .map(|i| normal.inverse_cdf((i as f64 + 0.5) / n as f64))
        .collect()
}

fn table(counts: &[Vec<u32>]) -> ContingencyTable {
    let rows = (0..counts.len()).map(|i| format!("r{i}")).collect();
    let cols = (0..counts[0].len()).map(|j| format!("c{j}")).collect();
    let counts = counts
        .iter()
        .map(|row| row.iter().map(|&c| c as f64).collect())
        .collect();
    ContingencyTable::from_counts(rows, cols, counts).unwrap()
}

proptest! {
    #[test]
    fn prop_correlation_ratio_is_bounded(
        groups in prop::collection::vec(prop::collection::vec(-1e3f64..1e3, 1..12), 1..6)
    ) {
        let slices: Vec<&[f64]> = groups.iter().map(Vec::as_slice).collect();
        let eta = correlation_ratio(&slices);
        prop_assert!(eta.is_nan() || (-1e-9..=1.0 + 1e-9).contains(&eta), "eta = {}", eta);
    }

    #[test]
    fn prop_cramers_v_is_bounded(
        (rows, cols) in (2usize..5, 2usize..5),
        seed in any::<u64>(),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let counts: Vec<Vec<u32>> = (0..rows)
            .map(|_| (0..cols).map(|_| rng.random_range(0..30)).collect())
            .collect();
        let v = cramers_v(&table(&counts));
        prop_assert!(v.is_nan() || (-1e-9..=1.0 + 1e-9).contains(&v), "V = {}", v);
    }

    #[test]
    fn prop_single_sample_normality_uses_full_alpha(
        sample in prop::collection::vec(-50.0f64..50.0, 3..40),
        alpha in 0.001f64..0.2,
    ) {
        let single = normality_check(&sample, alpha).ok().map(|(_, normal)| normal);
        prop_assert_eq!(normality_all(&[&sample], alpha).ok(), single);
    }

    #[test]
    fn prop_three_normal_groups_select_anova(
        means in prop::collection::vec(-5.0f64..5.0, 3),
        n in 12usize..30,
        alpha in 0.01f64..0.1,
    ) {
        let samples: Vec<Vec<f64>> = means.iter().map(|&m| normal_scores(n, m)).collect();
        let slices: Vec<&[f64]> = samples.iter().map(Vec::as_slice).collect();
        let precheck = distribution_variance_test(alpha, &slices).unwrap();
        prop_assert!(precheck.normal_all);
        prop_assert_eq!(precheck.equal_variance, Some(true));

        let labels = ["a", "b", "c"]
            .iter()
            .flat_map(|label| std::iter::repeat(Some(*label)).take(n));
        let values = samples.iter().flatten().copied().map(Some);
        let pair = QuestionPair::new(
            Variable::categorical("group", labels),
            Variable::numeric("score", values),
        )
        .unwrap();
        let config = SweepConfig::default().with_alpha(alpha);
        let outcome = route(&pair, &config).unwrap();
        prop_assert_eq!(outcome.method, TestMethod::Anova);
        prop_assert_eq!(outcome.significant, Some(outcome.p_value <= alpha));
    }

    #[test]
    fn prop_significance_matches_alpha(
        values in prop::collection::vec(0.0f64..10.0, 8..30),
    ) {
        let half = values.len() / 2;
        let labels: Vec<Option<&str>> = (0..values.len())
            .map(|i| Some(if i < half { "a" } else { "b" }))
            .collect();
        let pair = QuestionPair::new(
            Variable::categorical("group", labels),
            Variable::numeric("score", values.iter().copied().map(Some)),
        )
        .unwrap();
        let outcome = route(&pair, &SweepConfig::default()).unwrap();
        match outcome.significant {
            Some(significant) => prop_assert_eq!(significant, outcome.p_value <= 0.05),
            None => prop_assert!(outcome.p_value.is_nan()),
        }
    }
}

#[test]
fn test_correlation_ratio_worked_example() {
    // Total SS 10, within SS 0.5 + 2.0.
    let eta = correlation_ratio(&[&[1.0, 2.0], &[3.0, 4.0, 5.0]]);
    assert!((eta - 0.75).abs() < 1e-12);
}

#[test]
fn test_independent_categories_rarely_rejected() {
    let mut rng = StdRng::seed_from_u64(20_210_401);
    let config = SweepConfig::default();
    let trials = 200;
    let mut rejections = 0;

    for _ in 0..trials {
        let a: Vec<Option<String>> = (0..300)
            .map(|_| Some(format!("a{}", rng.random_range(0..3))))
            .collect();
        let b: Vec<Option<String>> = (0..300)
            .map(|_| Some(format!("b{}", rng.random_range(0..4))))
            .collect();
        let pair = QuestionPair::new(
            Variable::categorical("first", a),
            Variable::categorical("second", b),
        )
        .unwrap();

        let outcome = route(&pair, &config).unwrap();
        assert_eq!(outcome.method, TestMethod::ChiSquare);
        if outcome.significant == Some(true) {
            rejections += 1;
        }
    }

    let rate = rejections as f64 / trials as f64;
    assert!(rate < 0.15, "rejection rate {rate}");
}
