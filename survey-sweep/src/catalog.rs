//! Question catalog.
//!
//! Survey questions are identified by a stable catalog id (`"Q12"`) that maps
//! to the raw column headers used for that question in each survey year. One
//! catalog question can span several columns (multi-part questions), and can
//! belong to several data models (`"WPB"`, `"TMS"`, ...).
//!
//! ```rust
//! use survey_sweep::catalog::{QuestionCatalog, QuestionInfo};
//!
//! let catalog = QuestionCatalog::new()
//!     .with_question(
//!         "Q1",
//!         QuestionInfo::new("Remote days per week", "quantified")
//!             .with_model("WPB")
//!             .with_columns("2021", ["How many days did you work remotely?"]),
//!     )
//!     .with_question(
//!         "Q2",
//!         QuestionInfo::new("Team support", "qualified")
//!             .with_model("TMS")
//!             .with_columns("2021", ["My team supports me"]),
//!     );
//!
//! assert_eq!(catalog.ids_by_model("WPB"), vec!["Q1"]);
//! assert_eq!(
//!     catalog.model_pairs("WPB", "TMS"),
//!     vec![("Q1".to_string(), "Q2".to_string())]
//! );
//! ```

use crate::config::load_json_file;
use crate::error::{Result, SweepError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// What the catalog knows about one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionInfo {
    /// Short question wording.
    pub text: String,
    /// Free-form type tag, e.g. `"qualified"` or `"quantified"`.
    #[serde(rename = "type")]
    pub question_type: String,
    /// Data models the question contributes to.
    #[serde(default)]
    pub data_models: Vec<String>,
    /// Raw column headers per survey year.
    #[serde(default)]
    pub columns: BTreeMap<String, Vec<String>>,
}

impl QuestionInfo {
    pub fn new(text: impl Into<String>, question_type: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            question_type: question_type.into(),
            data_models: Vec::new(),
            columns: BTreeMap::new(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.data_models.push(model.into());
        self
    }

    pub fn with_columns<S: Into<String>>(
        mut self,
        year: impl Into<String>,
        columns: impl IntoIterator<Item = S>,
    ) -> Self {
        self.columns
            .insert(year.into(), columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn belongs_to(&self, model: &str) -> bool {
        self.data_models.iter().any(|m| m == model)
    }
}

/// All catalog questions, keyed and iterated by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionCatalog {
    questions: BTreeMap<String, QuestionInfo>,
}

impl QuestionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_question(mut self, qid: impl Into<String>, info: QuestionInfo) -> Self {
        self.questions.insert(qid.into(), info);
        self
    }

    /// Parses a catalog from a JSON object of `qid -> question`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        load_json_file(path.as_ref(), "question catalog")
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &QuestionInfo)> {
        self.questions.iter().map(|(qid, info)| (qid.as_str(), info))
    }

    pub fn get(&self, qid: &str) -> Result<&QuestionInfo> {
        self.questions
            .get(qid)
            .ok_or_else(|| SweepError::QuestionNotFound {
                qid: qid.to_string(),
            })
    }

    /// Ids of the questions with the given type tag.
    pub fn ids_by_type(&self, question_type: &str) -> Vec<&str> {
        self.iter()
            .filter(|(_, info)| info.question_type == question_type)
            .map(|(qid, _)| qid)
            .collect()
    }

    /// Ids of the questions belonging to the given data model.
    pub fn ids_by_model(&self, model: &str) -> Vec<&str> {
        self.iter()
            .filter(|(_, info)| info.belongs_to(model))
            .map(|(qid, _)| qid)
            .collect()
    }

    /// Every (model A id, model B id) pair, A-major. A question belonging to
    /// both models is never paired with itself.
    pub fn model_pairs(&self, model_a: &str, model_b: &str) -> Vec<(String, String)> {
        let right = self.ids_by_model(model_b);
        self.ids_by_model(model_a)
            .into_iter()
            .flat_map(|a| {
                right
                    .iter()
                    .filter(move |b| **b != a)
                    .map(move |b| (a.to_string(), b.to_string()))
            })
            .collect()
    }

    /// Raw column headers of a question in a survey year. A question not
    /// asked that year has no columns.
    pub fn columns_for(&self, qid: &str, year: &str) -> Result<&[String]> {
        Ok(self
            .get(qid)?
            .columns
            .get(year)
            .map(Vec::as_slice)
            .unwrap_or(&[]))
    }

    /// Column membership of each data model in a survey year.
    pub fn membership(&self, year: &str) -> ModelMembership {
        let mut membership = ModelMembership::new();
        for (_, info) in self.iter() {
            let columns = info.columns.get(year).map(Vec::as_slice).unwrap_or(&[]);
            for model in &info.data_models {
                membership = membership.with_columns(model.clone(), columns.iter().cloned());
            }
        }
        membership
    }
}

/// Which raw columns each data model claims.
///
/// Catalog assignment and model membership can differ: a question filed
/// under a model need not have all its columns count toward it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelMembership {
    models: BTreeMap<String, BTreeSet<String>>,
}

impl ModelMembership {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_columns<S: Into<String>>(
        mut self,
        model: impl Into<String>,
        columns: impl IntoIterator<Item = S>,
    ) -> Self {
        self.models
            .entry(model.into())
            .or_default()
            .extend(columns.into_iter().map(Into::into));
        self
    }

    /// Parses a JSON object of `model -> [column, ...]`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        load_json_file(path.as_ref(), "model membership")
    }

    pub fn contains(&self, model: &str, column: &str) -> bool {
        self.models
            .get(model)
            .is_some_and(|columns| columns.contains(column))
    }

    pub fn models(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }
}
