//! Aligned question pairs and numeric groupings.

use super::{Kind, Value, Variable};
use crate::error::{Result, SweepError};
use std::collections::HashMap;

/// Two variables sharing the same row alignment, optionally with the
/// response-id column of the joined rows.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionPair {
    first: Variable,
    second: Variable,
    ids: Option<Variable>,
}

impl QuestionPair {
    /// Creates a pair, rejecting variables of different lengths.
    pub fn new(first: Variable, second: Variable) -> Result<Self> {
        ensure_aligned(&first, &second)?;
        Ok(Self {
            first,
            second,
            ids: None,
        })
    }

    /// Attaches the response-id column used by distinct-id cross-tabulation.
    pub fn with_ids(mut self, ids: Variable) -> Result<Self> {
        ensure_aligned(&self.first, &ids)?;
        self.ids = Some(ids);
        Ok(self)
    }

    pub fn first(&self) -> &Variable {
        &self.first
    }

    pub fn second(&self) -> &Variable {
        &self.second
    }

    pub fn ids(&self) -> Option<&Variable> {
        self.ids.as_ref()
    }

    pub fn len(&self) -> usize {
        self.first.len()
    }

    pub fn is_empty(&self) -> bool {
        self.first.is_empty()
    }

    pub fn kinds(&self) -> (Kind, Kind) {
        (self.first.kind(), self.second.kind())
    }

    /// Returns the pair restricted to rows where neither variable is missing.
    ///
    /// A missing response id does not exclude a row here; distinct-id counting
    /// skips such rows on its own.
    pub fn complete_rows(&self) -> Self {
        let rows: Vec<usize> = self
            .first
            .values()
            .iter()
            .zip(self.second.values())
            .enumerate()
            .filter(|(_, (a, b))| a.is_some() && b.is_some())
            .map(|(i, _)| i)
            .collect();

        Self {
            first: self.first.select(&rows),
            second: self.second.select(&rows),
            ids: self.ids.as_ref().map(|ids| ids.select(&rows)),
        }
    }
}

fn ensure_aligned(a: &Variable, b: &Variable) -> Result<()> {
    if a.len() != b.len() {
        return Err(SweepError::MisalignedPair {
            first: a.name().to_string(),
            first_len: a.len(),
            second: b.name().to_string(),
            second_len: b.len(),
        });
    }
    Ok(())
}

/// Numeric observations partitioned by the labels of a categorical variable.
///
/// Groups appear in the order their label first occurs. A label only becomes
/// a group when at least one aligned row carries both the label and a number,
/// so no group is ever empty.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedSamples {
    labels: Vec<String>,
    groups: Vec<Vec<f64>>,
}

impl GroupedSamples {
    /// Splits `numeric` by the labels of `categorical`.
    pub fn partition(categorical: &Variable, numeric: &Variable) -> Result<Self> {
        ensure_aligned(categorical, numeric)?;

        let mut index: HashMap<String, usize> = HashMap::new();
        let mut labels = Vec::new();
        let mut groups: Vec<Vec<f64>> = Vec::new();

        for (label, value) in categorical.values().iter().zip(numeric.values()) {
            let (Some(label), Some(Value::Number(x))) = (label, value) else {
                continue;
            };
            let label = label.label();
            let slot = *index.entry(label.clone()).or_insert_with(|| {
                labels.push(label);
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[slot].push(*x);
        }

        Ok(Self { labels, groups })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn groups(&self) -> &[Vec<f64>] {
        &self.groups
    }

    /// Borrows every group as a slice, in group order.
    pub fn as_slices(&self) -> Vec<&[f64]> {
        self.groups.iter().map(Vec::as_slice).collect()
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Returns the group for a label.
    pub fn group(&self, label: &str) -> Option<&[f64]> {
        self.labels
            .iter()
            .position(|l| l == label)
            .map(|i| self.groups[i].as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_misaligned_pair_is_rejected() {
        let a = Variable::numeric("a", vec![Some(1.0), Some(2.0)]);
        let b = Variable::numeric("b", vec![Some(1.0)]);
        let err = QuestionPair::new(a, b).unwrap_err();
        assert!(matches!(err, SweepError::MisalignedPair { .. }));
    }

    #[test]
    fn test_complete_rows_drop_missing_in_either() {
        let a = Variable::numeric("a", vec![Some(1.0), None, Some(3.0), Some(4.0)]);
        let b = Variable::categorical("b", vec![Some("x"), Some("y"), None, Some("z")]);
        let ids = Variable::categorical("id", vec![Some("r1"), Some("r2"), Some("r3"), None]);
        let pair = QuestionPair::new(a, b).unwrap().with_ids(ids).unwrap();

        let complete = pair.complete_rows();
        assert_eq!(complete.len(), 2);
        assert_eq!(complete.first().numbers(), vec![1.0, 4.0]);
        assert_eq!(complete.ids().unwrap().values()[1], None);
    }

    #[test]
    fn test_partition_groups_by_label() {
        let numeric = Variable::numeric("n", (1..=5).map(|i| Some(i as f64)));
        let categorical =
            Variable::categorical("c", vec![Some("a"), Some("a"), Some("b"), Some("b"), Some("b")]);
        let grouped = GroupedSamples::partition(&categorical, &numeric).unwrap();

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped.group("a"), Some(&[1.0, 2.0][..]));
        assert_eq!(grouped.group("b"), Some(&[3.0, 4.0, 5.0][..]));
    }

    #[test]
    fn test_partition_skips_labels_without_numbers() {
        let numeric = Variable::numeric("n", vec![Some(1.0), None, Some(2.0)]);
        let categorical = Variable::categorical("c", vec![Some("a"), Some("ghost"), Some("a")]);
        let grouped = GroupedSamples::partition(&categorical, &numeric).unwrap();

        assert_eq!(grouped.labels(), &["a".to_string()]);
        assert!(grouped.groups().iter().all(|g| !g.is_empty()));
    }
}
