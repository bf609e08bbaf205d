//! Response-id merge of two questions' columns.
//!
//! Both questions live in the same survey-year table. The merge joins that
//! table with itself on the response id, keeps the left question's columns
//! under their own names, and renames any right-hand column whose name is
//! already taken on the left by appending a suffix (`"_duplicated"` by
//! default). Rows without an id drop out of the inner join; repeated ids
//! multiply.

use crate::error::{Result, SweepError};
use crate::logging::truncate_field;
use crate::security::SqlSecurity;
use crate::sweep::{PairProvider, PairSpec};
use crate::variable::{QuestionPair, Variable};
use arrow::compute::concat_batches;
use arrow::record_batch::RecordBatch;
use datafusion::common::TableReference;
use datafusion::prelude::SessionContext;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, instrument};

/// How the columns of the two questions appear in a merged frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnPlan {
    /// Raw left-hand column names, also their output names.
    pub left: Vec<String>,
    /// `(raw name, output name)` of every right-hand column.
    pub right: Vec<(String, String)>,
}

impl ColumnPlan {
    /// Plans the output names. Repeated names within one side are dropped.
    ///
    /// Fails if a suffixed name still collides with another output column.
    pub fn new(left: &[String], right: &[String], suffix: &str) -> Result<Self> {
        let plan = Self::plan(left, right, suffix);

        let mut outputs: HashSet<&str> = plan.left.iter().map(String::as_str).collect();
        for (raw, output) in &plan.right {
            if !outputs.insert(output.as_str()) {
                return Err(SweepError::Configuration(format!(
                    "Column '{raw}' cannot be renamed to '{output}': name already in use"
                )));
            }
        }
        Ok(plan)
    }

    fn plan(left: &[String], right: &[String], suffix: &str) -> Self {
        let left = unique(left);
        let taken: HashSet<&str> = left.iter().map(String::as_str).collect();
        let right = unique(right)
            .into_iter()
            .map(|raw| {
                let output = if taken.contains(raw.as_str()) {
                    format!("{raw}{suffix}")
                } else {
                    raw.clone()
                };
                (raw, output)
            })
            .collect();
        Self { left, right }
    }

    /// Output names of the right-hand columns.
    pub fn right_outputs(&self) -> impl Iterator<Item = &str> {
        self.right.iter().map(|(_, output)| output.as_str())
    }

    /// Every (left, right) output-name pair, left-major.
    pub fn combinations(&self) -> Vec<(String, String)> {
        self.left
            .iter()
            .flat_map(|l| self.right_outputs().map(move |r| (l.clone(), r.to_string())))
            .collect()
    }
}

fn unique(names: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .iter()
        .filter(|name| seen.insert(name.as_str()))
        .cloned()
        .collect()
}

/// Every pairing of a left-hand column with a right-hand column, with
/// right-hand names suffixed where they collide with a left-hand name.
///
/// ```rust
/// use survey_sweep::sources::question_combinations;
///
/// let left = vec!["Q1".to_string()];
/// let right = vec!["Q1".to_string(), "Q2".to_string()];
/// assert_eq!(
///     question_combinations(&left, &right, "_duplicated"),
///     vec![
///         ("Q1".to_string(), "Q1_duplicated".to_string()),
///         ("Q1".to_string(), "Q2".to_string()),
///     ]
/// );
/// ```
pub fn question_combinations(
    left: &[String],
    right: &[String],
    suffix: &str,
) -> Vec<(String, String)> {
    ColumnPlan::plan(left, right, suffix).combinations()
}

/// The joined columns of two questions, held in memory.
#[derive(Debug, Clone)]
pub struct MergedFrame {
    batch: RecordBatch,
    plan: ColumnPlan,
    id_column: String,
}

impl MergedFrame {
    /// Wraps an already merged batch. Every planned output column and the id
    /// column must be present.
    pub fn new(batch: RecordBatch, plan: ColumnPlan, id_column: impl Into<String>) -> Result<Self> {
        let id_column = id_column.into();
        let schema = batch.schema();
        let required = std::iter::once(id_column.as_str())
            .chain(plan.left.iter().map(String::as_str))
            .chain(plan.right_outputs());
        for column in required {
            if schema.index_of(column).is_err() {
                return Err(SweepError::ColumnNotFound {
                    column: column.to_string(),
                });
            }
        }
        Ok(Self {
            batch,
            plan,
            id_column,
        })
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn plan(&self) -> &ColumnPlan {
        &self.plan
    }

    pub fn id_column(&self) -> &str {
        &self.id_column
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// Reads one output column as a variable, tagging its kind from the
    /// Arrow type.
    pub fn variable(&self, column: &str) -> Result<Variable> {
        let array = self
            .batch
            .column_by_name(column)
            .ok_or_else(|| SweepError::ColumnNotFound {
                column: column.to_string(),
            })?;
        Variable::from_array(column, array)
    }

    /// One pair spec per column combination, in plan order.
    pub fn specs(&self, year: &str) -> Vec<PairSpec> {
        self.plan
            .combinations()
            .into_iter()
            .map(|(q1, q2)| PairSpec::new(q1, q2, year))
            .collect()
    }
}

impl PairProvider for MergedFrame {
    fn pair(&self, spec: &PairSpec) -> Result<QuestionPair> {
        QuestionPair::new(
            self.variable(&spec.question1)?,
            self.variable(&spec.question2)?,
        )?
        .with_ids(self.variable(&self.id_column)?)
    }
}

/// Joins `table` with itself on `id_column` and selects the id plus the
/// planned left and right columns.
#[instrument(skip(ctx, left_cols, right_cols), fields(
    table = %table,
    left = left_cols.len(),
    right = right_cols.len()
))]
pub async fn merge_questions(
    ctx: &SessionContext,
    table: &str,
    id_column: &str,
    left_cols: &[String],
    right_cols: &[String],
    suffix: &str,
) -> Result<MergedFrame> {
    let left_cols: Vec<String> = left_cols
        .iter()
        .filter(|c| c.as_str() != id_column)
        .cloned()
        .collect();
    let right_cols: Vec<String> = right_cols
        .iter()
        .filter(|c| c.as_str() != id_column)
        .cloned()
        .collect();
    let plan = ColumnPlan::new(&left_cols, &right_cols, suffix)?;

    let source = ctx.table(TableReference::bare(table)).await?;
    let available = source.schema();
    for column in std::iter::once(id_column)
        .chain(plan.left.iter().map(String::as_str))
        .chain(plan.right.iter().map(|(raw, _)| raw.as_str()))
    {
        if !available.has_column_with_unqualified_name(column) {
            return Err(SweepError::ColumnNotFound {
                column: column.to_string(),
            });
        }
    }

    let sql = merge_sql(table, id_column, &plan)?;
    debug!(sql = %truncate_field(&sql, 512), "merging question columns");

    let df = ctx.sql(&sql).await.map_err(|e| {
        SweepError::data_source_with_source(
            "merge",
            format!("Failed to merge questions in '{table}'"),
            Box::new(e),
        )
    })?;
    let schema = df.schema().inner().clone();
    let batches = df.collect().await?;
    let batch = concat_batches(&schema, &batches)?;

    info!(
        rows = batch.num_rows(),
        columns = batch.num_columns(),
        "questions merged"
    );
    MergedFrame::new(batch, plan, id_column)
}

fn merge_sql(table: &str, id_column: &str, plan: &ColumnPlan) -> Result<String> {
    let table = SqlSecurity::escape_table_name(table)?;
    let id = SqlSecurity::escape_identifier(id_column)?;

    let mut projections = vec![format!("l.{id} AS {id}")];
    for column in &plan.left {
        let column = SqlSecurity::escape_identifier(column)?;
        projections.push(format!("l.{column} AS {column}"));
    }
    for (raw, output) in &plan.right {
        projections.push(format!(
            "r.{} AS {}",
            SqlSecurity::escape_identifier(raw)?,
            SqlSecurity::escape_identifier(output)?
        ));
    }

    Ok(format!(
        "SELECT {} FROM {table} AS l INNER JOIN {table} AS r ON l.{id} = r.{id}",
        projections.join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable::Kind;
    use arrow::array::{Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn survey_context() -> SessionContext {
        let schema = Arc::new(Schema::new(vec![
            Field::new("Response ID", DataType::Int64, true),
            Field::new("Team", DataType::Utf8, true),
            Field::new("Hours worked", DataType::Float64, true),
            Field::new("Remote days", DataType::Float64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from(vec![Some(1), Some(2), Some(3), None, Some(5)])),
                Arc::new(StringArray::from(vec![
                    Some("a"),
                    Some("b"),
                    None,
                    Some("a"),
                    Some("b"),
                ])),
                Arc::new(Float64Array::from(vec![
                    Some(40.0),
                    Some(38.5),
                    Some(45.0),
                    Some(50.0),
                    None,
                ])),
                Arc::new(Float64Array::from(vec![
                    Some(2.0),
                    Some(3.0),
                    Some(5.0),
                    Some(1.0),
                    Some(0.0),
                ])),
            ],
        )
        .unwrap();
        let ctx = SessionContext::new();
        ctx.register_batch("survey_2021", batch).unwrap();
        ctx
    }

    #[test]
    fn test_combinations_suffix_only_collisions() {
        let combos = question_combinations(
            &names(&["A", "B"]),
            &names(&["B", "C", "C"]),
            "_duplicated",
        );
        assert_eq!(
            combos,
            vec![
                ("A".to_string(), "B_duplicated".to_string()),
                ("A".to_string(), "C".to_string()),
                ("B".to_string(), "B_duplicated".to_string()),
                ("B".to_string(), "C".to_string()),
            ]
        );
    }

    #[test]
    fn test_combinations_with_empty_side() {
        assert!(question_combinations(&[], &names(&["A"]), "_dup").is_empty());
        assert!(question_combinations(&names(&["A"]), &[], "_dup").is_empty());
    }

    #[test]
    fn test_plan_rejects_suffix_collision() {
        let err = ColumnPlan::new(&names(&["A", "A_dup"]), &names(&["A"]), "_dup").unwrap_err();
        assert!(matches!(err, SweepError::Configuration(_)));
    }

    #[test]
    fn test_merge_sql_quotes_every_identifier() {
        let plan = ColumnPlan::new(&names(&["Team"]), &names(&["Team"]), "_duplicated").unwrap();
        let sql = merge_sql("survey_2021", "Response ID", &plan).unwrap();
        assert_eq!(
            sql,
            "SELECT l.\"Response ID\" AS \"Response ID\", l.\"Team\" AS \"Team\", \
             r.\"Team\" AS \"Team_duplicated\" FROM \"survey_2021\" AS l \
             INNER JOIN \"survey_2021\" AS r ON l.\"Response ID\" = r.\"Response ID\""
        );
    }

    #[tokio::test]
    async fn test_merge_drops_rows_without_id() {
        let ctx = survey_context();
        let frame = merge_questions(
            &ctx,
            "survey_2021",
            "Response ID",
            &names(&["Team"]),
            &names(&["Hours worked", "Remote days"]),
            "_duplicated",
        )
        .await
        .unwrap();

        assert_eq!(frame.num_rows(), 4);
        assert_eq!(frame.batch().num_columns(), 4);
        assert_eq!(
            frame.plan().combinations(),
            vec![
                ("Team".to_string(), "Hours worked".to_string()),
                ("Team".to_string(), "Remote days".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_merged_frame_provides_pairs_with_ids() {
        let ctx = survey_context();
        let frame = merge_questions(
            &ctx,
            "survey_2021",
            "Response ID",
            &names(&["Team"]),
            &names(&["Team", "Hours worked"]),
            "_duplicated",
        )
        .await
        .unwrap();

        let specs = frame.specs("2021");
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].question2, "Team_duplicated");

        let pair = frame.pair(&specs[0]).unwrap();
        assert_eq!(pair.kinds(), (Kind::Categorical, Kind::Categorical));
        assert_eq!(pair.first().values(), pair.second().values());
        assert_eq!(pair.ids().map(|ids| ids.len()), Some(4));

        let pair = frame.pair(&specs[1]).unwrap();
        assert_eq!(pair.kinds(), (Kind::Categorical, Kind::Numeric));
    }

    #[tokio::test]
    async fn test_missing_column_is_reported() {
        let ctx = survey_context();
        let err = merge_questions(
            &ctx,
            "survey_2021",
            "Response ID",
            &names(&["Team"]),
            &names(&["Salary"]),
            "_duplicated",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, SweepError::ColumnNotFound { column } if column == "Salary"));
    }

    #[tokio::test]
    async fn test_id_column_in_question_list_is_ignored() {
        let ctx = survey_context();
        let frame = merge_questions(
            &ctx,
            "survey_2021",
            "Response ID",
            &names(&["Response ID", "Team"]),
            &names(&["Remote days"]),
            "_duplicated",
        )
        .await
        .unwrap();
        assert_eq!(frame.plan().left, names(&["Team"]));
    }
}
