//! Cross-tabulation of two categorical variables.

use super::Variable;
use crate::error::{Result, SweepError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// How cells of a contingency table are counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContingencyMode {
    /// Each aligned row counts once.
    #[default]
    RowCount,
    /// Each cell counts the distinct response ids falling into it.
    DistinctIds,
}

/// A two-way table of counts with sorted row and column labels.
#[derive(Debug, Clone, PartialEq)]
pub struct ContingencyTable {
    row_labels: Vec<String>,
    col_labels: Vec<String>,
    counts: Vec<Vec<f64>>,
}

impl ContingencyTable {
    /// Builds a table from explicit counts.
    pub fn from_counts(
        row_labels: Vec<String>,
        col_labels: Vec<String>,
        counts: Vec<Vec<f64>>,
    ) -> Result<Self> {
        if counts.len() != row_labels.len()
            || counts.iter().any(|row| row.len() != col_labels.len())
        {
            return Err(SweepError::Internal(format!(
                "contingency counts do not match a {}x{} shape",
                row_labels.len(),
                col_labels.len()
            )));
        }
        Ok(Self {
            row_labels,
            col_labels,
            counts,
        })
    }

    /// Counts aligned rows where both variables are present.
    pub fn crosstab(rows: &Variable, cols: &Variable) -> Result<Self> {
        Self::tabulate(rows, cols, None)
    }

    /// Counts distinct response ids per cell. Rows without an id are skipped.
    pub fn crosstab_distinct(rows: &Variable, cols: &Variable, ids: &Variable) -> Result<Self> {
        Self::tabulate(rows, cols, Some(ids))
    }

    fn tabulate(rows: &Variable, cols: &Variable, ids: Option<&Variable>) -> Result<Self> {
        if rows.len() != cols.len() || ids.is_some_and(|ids| ids.len() != rows.len()) {
            return Err(SweepError::MisalignedPair {
                first: rows.name().to_string(),
                first_len: rows.len(),
                second: cols.name().to_string(),
                second_len: cols.len(),
            });
        }

        let mut row_set = BTreeSet::new();
        let mut col_set = BTreeSet::new();
        let mut cells: BTreeMap<(String, String), HashSet<String>> = BTreeMap::new();
        let mut plain: BTreeMap<(String, String), f64> = BTreeMap::new();

        for i in 0..rows.len() {
            let (Some(r), Some(c)) = (&rows.values()[i], &cols.values()[i]) else {
                continue;
            };
            let key = (r.label(), c.label());
            match ids {
                Some(ids) => {
                    let Some(id) = &ids.values()[i] else {
                        continue;
                    };
                    row_set.insert(key.0.clone());
                    col_set.insert(key.1.clone());
                    cells.entry(key).or_default().insert(id.label());
                }
                None => {
                    row_set.insert(key.0.clone());
                    col_set.insert(key.1.clone());
                    *plain.entry(key).or_insert(0.0) += 1.0;
                }
            }
        }

        let row_labels: Vec<String> = row_set.into_iter().collect();
        let col_labels: Vec<String> = col_set.into_iter().collect();
        let counts = row_labels
            .iter()
            .map(|r| {
                col_labels
                    .iter()
                    .map(|c| {
                        let key = (r.clone(), c.clone());
                        match ids {
                            Some(_) => cells.get(&key).map_or(0.0, |set| set.len() as f64),
                            None => plain.get(&key).copied().unwrap_or(0.0),
                        }
                    })
                    .collect()
            })
            .collect();

        Ok(Self {
            row_labels,
            col_labels,
            counts,
        })
    }

    pub fn row_labels(&self) -> &[String] {
        &self.row_labels
    }

    pub fn col_labels(&self) -> &[String] {
        &self.col_labels
    }

    pub fn counts(&self) -> &[Vec<f64>] {
        &self.counts
    }

    pub fn nrows(&self) -> usize {
        self.row_labels.len()
    }

    pub fn ncols(&self) -> usize {
        self.col_labels.len()
    }

    pub fn cell(&self, row: usize, col: usize) -> f64 {
        self.counts[row][col]
    }

    pub fn total(&self) -> f64 {
        self.counts.iter().flatten().sum()
    }

    pub fn row_sums(&self) -> Vec<f64> {
        self.counts.iter().map(|row| row.iter().sum()).collect()
    }

    pub fn col_sums(&self) -> Vec<f64> {
        (0..self.ncols())
            .map(|j| self.counts.iter().map(|row| row[j]).sum())
            .collect()
    }

    /// Expected counts under independence: outer(row sums, col sums) / total.
    pub fn expected(&self) -> Vec<Vec<f64>> {
        let total = self.total();
        let col_sums = self.col_sums();
        self.row_sums()
            .iter()
            .map(|r| col_sums.iter().map(|c| r * c / total).collect())
            .collect()
    }
}
