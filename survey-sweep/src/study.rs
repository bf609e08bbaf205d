//! Model-versus-model survey studies.
//!
//! A study takes two data models of the [`QuestionCatalog`], pairs every
//! question of the first with every question of the second, merges each
//! pair's raw columns on the response id, and sweeps all column
//! combinations. The concatenated rows are then tagged with model
//! membership and filtered down to the strongest significant associations.

use crate::catalog::{ModelMembership, QuestionCatalog};
use crate::config::StudyConfig;
use crate::error::Result;
use crate::log_data_op;
use crate::sources::merge_questions;
use crate::sweep::{PairSweep, ResultRow, SweepReport};
use crate::variable::OrdinalReference;
use datafusion::prelude::SessionContext;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// A result row tagged with the data model of each question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedRow {
    #[serde(flatten)]
    pub row: ResultRow,
    /// First model, when `question1` is one of its columns.
    pub is_q1: Option<String>,
    /// Second model, when `question2` is one of its columns.
    pub is_q2: Option<String>,
}

/// Runs sweeps across the questions of two data models.
#[derive(Debug, Clone)]
pub struct SurveyStudy {
    catalog: QuestionCatalog,
    reference: OrdinalReference,
    config: StudyConfig,
}

impl SurveyStudy {
    pub fn new(catalog: QuestionCatalog, reference: OrdinalReference, config: StudyConfig) -> Self {
        Self {
            catalog,
            reference,
            config,
        }
    }

    pub fn catalog(&self) -> &QuestionCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &StudyConfig {
        &self.config
    }

    /// Sweeps every column combination of every catalog question pair
    /// across `model_a` and `model_b`, reading the survey year registered as
    /// `table`. Exact duplicate rows are dropped.
    #[instrument(skip(self, ctx), fields(year = %self.config.year))]
    pub async fn execute(
        &self,
        ctx: &SessionContext,
        table: &str,
        model_a: &str,
        model_b: &str,
    ) -> Result<SweepReport> {
        self.config.validate()?;
        let log = self.config.sweep.log_config();
        let sweep = PairSweep::new(self.config.sweep.clone(), self.reference.clone());

        let question_pairs = self.catalog.model_pairs(model_a, model_b);
        info!(pairs = question_pairs.len(), "starting study");

        let mut report = SweepReport::new();
        for (qid1, qid2) in &question_pairs {
            let left = self.catalog.columns_for(qid1, &self.config.year)?;
            let right = self.catalog.columns_for(qid2, &self.config.year)?;
            if left.is_empty() || right.is_empty() {
                debug!(qid1 = %qid1, qid2 = %qid2, "question not asked this year; skipping");
                continue;
            }

            let frame = merge_questions(
                ctx,
                table,
                &self.config.id_column,
                left,
                right,
                &self.config.duplicate_suffix,
            )
            .await?;
            let specs = frame.specs(&self.config.year);
            log_data_op!(
                log,
                qid1 = %qid1,
                qid2 = %qid2,
                rows = frame.num_rows(),
                combinations = specs.len(),
                "question pair merged"
            );

            report.extend(sweep.run(&frame, &specs)?);
        }

        let before = report.len();
        let report = report.dedup();
        info!(
            rows = report.len(),
            duplicates = before - report.len(),
            "study finished"
        );
        Ok(report)
    }

    /// Tags each row with `model_a` when its first question is one of the
    /// model's columns, and with `model_b` likewise for the second.
    pub fn annotate(
        report: SweepReport,
        membership: &ModelMembership,
        model_a: &str,
        model_b: &str,
    ) -> Vec<AnnotatedRow> {
        report
            .into_iter()
            .map(|row| AnnotatedRow {
                is_q1: membership
                    .contains(model_a, &row.question1)
                    .then(|| model_a.to_string()),
                is_q2: membership
                    .contains(model_b, &row.question2)
                    .then(|| model_b.to_string()),
                row,
            })
            .collect()
    }

    /// Rows tagged with both models whose test was significant and whose
    /// association reaches `min_strength`, strongest first.
    pub fn top_correlations(
        annotated: &[AnnotatedRow],
        model_a: &str,
        model_b: &str,
        min_strength: f64,
    ) -> Vec<AnnotatedRow> {
        let mut top: Vec<AnnotatedRow> = annotated
            .iter()
            .filter(|a| {
                a.is_q1.as_deref() == Some(model_a)
                    && a.is_q2.as_deref() == Some(model_b)
                    && a.row.test_significant == Some(true)
                    && a.row.corr_statistic >= min_strength
            })
            .cloned()
            .collect();
        top.sort_by(|a, b| b.row.corr_statistic.total_cmp(&a.row.corr_statistic));
        top
    }

    /// [`execute`](Self::execute), [`annotate`](Self::annotate) and
    /// [`top_correlations`](Self::top_correlations) at the configured
    /// minimum strength.
    pub async fn findings(
        &self,
        ctx: &SessionContext,
        table: &str,
        model_a: &str,
        model_b: &str,
        membership: &ModelMembership,
    ) -> Result<Vec<AnnotatedRow>> {
        let report = self.execute(ctx, table, model_a, model_b).await?;
        let annotated = Self::annotate(report, membership, model_a, model_b);
        Ok(Self::top_correlations(
            &annotated,
            model_a,
            model_b,
            self.config.min_correlation,
        ))
    }
}
