//! Common test fixtures for survey sweep scenarios.
//!
//! The survey table is deterministic: the same call always produces the same
//! rows, so tests can assert exact pair orders and stable statistics.

use crate::error::Result;
use crate::variable::OrdinalReference;
use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use datafusion::common::TableReference;
use datafusion::datasource::MemTable;
use datafusion::prelude::*;
use statrs::distribution::{ContinuousCDF, Normal};
use std::sync::Arc;

/// Number of responders in [`survey_batch`].
pub const SURVEY_ROWS: usize = 40;

/// Likert labels used by the `Satisfaction` column, lowest first.
pub const LIKERT_LABELS: [&str; 5] = [
    "Very dissatisfied",
    "Dissatisfied",
    "Neutral",
    "Satisfied",
    "Very satisfied",
];

/// A sample whose empirical quantiles follow a normal distribution exactly:
/// the `i`-th value is the `(i + 0.5) / n` quantile. A non-positive `sd`
/// yields `NaN`s.
pub fn normal_sample(n: usize, mean: f64, sd: f64) -> Vec<f64> {
    let Ok(normal) = Normal::new(mean, sd) else {
        return vec![f64::NAN; n];
    };
    (0..n)
        .map(|i| normal.inverse_cdf((i as f64 + 0.5) / n as f64))
        .collect()
}

/// The five-level satisfaction scale coded 1 to 5.
pub fn likert_reference() -> OrdinalReference {
    OrdinalReference::from_levels(
        LIKERT_LABELS
            .iter()
            .enumerate()
            .map(|(i, label)| (*label, i as i64 + 1)),
    )
}

/// One survey year: `Response ID`, `Team`, `Hours worked`, `Remote days`
/// and `Satisfaction`, with a few missing answers.
pub fn survey_batch() -> Result<RecordBatch> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("Response ID", DataType::Int64, true),
        Field::new("Team", DataType::Utf8, true),
        Field::new("Hours worked", DataType::Float64, true),
        Field::new("Remote days", DataType::Float64, true),
        Field::new("Satisfaction", DataType::Utf8, true),
    ]));

    let teams = ["Sales", "Engineering", "Support", "Finance"];
    let ids: Vec<Option<i64>> = (0..SURVEY_ROWS).map(|i| Some(i as i64 + 1)).collect();
    let team: Vec<Option<&str>> = (0..SURVEY_ROWS)
        .map(|i| (i % 13 != 12).then_some(teams[i % 4]))
        .collect();
    let hours: Vec<Option<f64>> = (0..SURVEY_ROWS)
        .map(|i| (i % 11 != 10).then_some(35.0 + ((i * 7) % 13) as f64 + (i % 4) as f64 * 2.5))
        .collect();
    let remote: Vec<Option<f64>> = (0..SURVEY_ROWS)
        .map(|i| Some(((i * 3) % 6) as f64))
        .collect();
    let satisfaction: Vec<Option<&str>> = (0..SURVEY_ROWS)
        .map(|i| (i % 17 != 16).then_some(LIKERT_LABELS[(i * 5 + i / 4) % 5]))
        .collect();

    Ok(RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int64Array::from(ids)),
            Arc::new(StringArray::from(team)),
            Arc::new(Float64Array::from(hours)),
            Arc::new(Float64Array::from(remote)),
            Arc::new(StringArray::from(satisfaction)),
        ],
    )?)
}

/// A context with [`survey_batch`] registered as `table_name`.
pub async fn create_survey_context(table_name: &str) -> Result<SessionContext> {
    let ctx = SessionContext::new();
    let batch = survey_batch()?;
    let table = MemTable::try_new(batch.schema(), vec![vec![batch]])?;
    ctx.register_table(TableReference::bare(table_name), Arc::new(table))?;
    Ok(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_sample_is_symmetric() {
        let sample = normal_sample(21, 10.0, 2.0);
        assert_eq!(sample.len(), 21);
        assert!((sample[10] - 10.0).abs() < 1e-9);
        assert!((sample[0] - 10.0 + (sample[20] - 10.0)).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_survey_context() {
        let ctx = create_survey_context("survey_2021").await.unwrap();
        let batches = ctx
            .table("survey_2021")
            .await
            .unwrap()
            .collect()
            .await
            .unwrap();
        assert_eq!(batches[0].num_rows(), SURVEY_ROWS);
        assert_eq!(batches[0].num_columns(), 5);
    }
}
