//! Categorical records and datasets.

use crate::error::ForestError;
use crate::node::AttributeIndex;

/// One row of categorical fields. The last field is the class label; every
/// preceding field is an attribute addressed by a zero-based index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Record {
    fields: Vec<String>,
}

impl Record {
    /// Create a record from its fields, label last.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::EmptyRecord`] when `fields` is empty.
    pub fn new(fields: Vec<String>) -> Result<Self, ForestError> {
        if fields.is_empty() {
            return Err(ForestError::EmptyRecord { record_index: 0 });
        }
        Ok(Self { fields })
    }

    /// Return every field, label included.
    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Return the attribute fields (all but the label).
    #[must_use]
    pub fn attributes(&self) -> &[String] {
        &self.fields[..self.fields.len() - 1]
    }

    /// Return the class label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.fields[self.fields.len() - 1]
    }

    /// Return the value of one attribute column.
    ///
    /// Panics if `attribute` is not a valid attribute column; callers inside
    /// the crate validate indices against the dataset first.
    #[must_use]
    pub fn value(&self, attribute: AttributeIndex) -> &str {
        &self.attributes()[attribute.index()]
    }

    /// Return the number of fields, label included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Always `false`: a record holds at least its label.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// An ordered, immutable sequence of equally wide records.
///
/// Derived datasets (bootstrap samples, holdout partitions) are new
/// `Dataset` values; an existing dataset is never mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    records: Vec<Record>,
    n_fields: usize,
}

impl Dataset {
    /// Build a dataset, checking that every record has the same width.
    ///
    /// An empty dataset is allowed here; algorithms that need records
    /// reject it with [`ForestError::EmptyDataset`].
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::RaggedRecord`] for the first record whose
    /// field count differs from the first record's.
    pub fn new(records: Vec<Record>) -> Result<Self, ForestError> {
        let n_fields = records.first().map_or(0, Record::len);
        for (record_index, record) in records.iter().enumerate() {
            if record.len() != n_fields {
                return Err(ForestError::RaggedRecord {
                    record_index,
                    expected: n_fields,
                    got: record.len(),
                });
            }
        }
        Ok(Self { records, n_fields })
    }

    /// Build a dataset from raw rows of fields, label last.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ForestError::EmptyRecord`] | A row has no fields |
    /// | [`ForestError::RaggedRecord`] | Rows have inconsistent widths |
    pub fn from_rows<I, R, S>(rows: I) -> Result<Self, ForestError>
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let records = rows
            .into_iter()
            .enumerate()
            .map(|(record_index, row)| {
                let fields: Vec<String> = row.into_iter().map(Into::into).collect();
                Record::new(fields).map_err(|_| ForestError::EmptyRecord { record_index })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(records)
    }

    /// Build a derived dataset from positions into this one. Positions may repeat.
    ///
    /// Panics if any index is out of bounds.
    #[must_use]
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            records: indices.iter().map(|&i| self.records[i].clone()).collect(),
            n_fields: if indices.is_empty() { 0 } else { self.n_fields },
        }
    }

    /// Return the records in order.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Iterate over the class labels in record order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(Record::label)
    }

    /// Return the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Return `true` when the dataset holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Return the number of attribute columns (0 for an empty dataset).
    #[must_use]
    pub fn n_attributes(&self) -> usize {
        self.n_fields.saturating_sub(1)
    }

    /// Return every attribute index in ascending order.
    pub fn attribute_indices(&self) -> impl Iterator<Item = AttributeIndex> + use<> {
        (0..self.n_attributes()).map(AttributeIndex::new)
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_splits_attributes_and_label() {
        let record = Record::new(vec!["sunny".into(), "hot".into(), "no".into()]).unwrap();
        assert_eq!(record.attributes(), &["sunny".to_string(), "hot".to_string()]);
        assert_eq!(record.label(), "no");
        assert_eq!(record.value(AttributeIndex::new(1)), "hot");
    }

    #[test]
    fn label_only_record_has_no_attributes() {
        let record = Record::new(vec!["yes".into()]).unwrap();
        assert!(record.attributes().is_empty());
        assert_eq!(record.label(), "yes");
    }

    #[test]
    fn empty_record_rejected() {
        let err = Record::new(vec![]).unwrap_err();
        assert!(matches!(err, ForestError::EmptyRecord { .. }));
    }

    #[test]
    fn ragged_rows_rejected() {
        let err = Dataset::from_rows([vec!["a", "b", "yes"], vec!["a", "no"]]).unwrap_err();
        assert!(matches!(
            err,
            ForestError::RaggedRecord {
                record_index: 1,
                expected: 3,
                got: 2
            }
        ));
    }

    #[test]
    fn empty_row_reports_its_position() {
        let rows: Vec<Vec<&str>> = vec![vec!["a", "yes"], vec![]];
        let err = Dataset::from_rows(rows).unwrap_err();
        assert!(matches!(err, ForestError::EmptyRecord { record_index: 1 }));
    }

    #[test]
    fn empty_dataset_is_representable() {
        let ds = Dataset::new(vec![]).unwrap();
        assert!(ds.is_empty());
        assert_eq!(ds.n_attributes(), 0);
    }

    #[test]
    fn select_repeats_records() {
        let ds = Dataset::from_rows([vec!["x", "yes"], vec!["y", "no"]]).unwrap();
        let derived = ds.select(&[1, 1, 0]);
        let labels: Vec<&str> = derived.labels().collect();
        assert_eq!(labels, vec!["no", "no", "yes"]);
        assert_eq!(derived.n_attributes(), 1);
        // The source is untouched.
        assert_eq!(ds.len(), 2);
    }

    #[test]
    fn attribute_indices_ascending() {
        let ds = Dataset::from_rows([vec!["a", "b", "c", "yes"]]).unwrap();
        let idx: Vec<usize> = ds.attribute_indices().map(AttributeIndex::index).collect();
        assert_eq!(idx, vec![0, 1, 2]);
    }
}
