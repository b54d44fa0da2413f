//! Domain types for sylva-io.

use serde::Serialize;
use sylva_forest::{Dataset, Prediction};

use crate::IoError;

/// A validated experiment name for output file naming.
///
/// Must match `[a-zA-Z0-9_-]+`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentName(String);

impl ExperimentName {
    /// Parse and validate an experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidExperimentName`] if the name is empty or
    /// contains characters outside `[a-zA-Z0-9_-]`.
    pub fn new(name: String) -> Result<Self, IoError> {
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(IoError::InvalidExperimentName { name });
        }
        Ok(Self(name))
    }

    /// Return the experiment name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExperimentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A categorical table read from CSV: column names plus the records.
///
/// Produced by [`DatasetReader`](crate::DatasetReader). The last column is
/// the class label.
#[derive(Debug)]
pub struct CategoricalTable {
    column_names: Vec<String>,
    dataset: Dataset,
}

impl CategoricalTable {
    pub(crate) fn new(column_names: Vec<String>, dataset: Dataset) -> Self {
        Self {
            column_names,
            dataset,
        }
    }

    /// Return every column name, label column last.
    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Return the attribute column names (all but the label column).
    #[must_use]
    pub fn attribute_names(&self) -> &[String] {
        let n = self.column_names.len().saturating_sub(1);
        &self.column_names[..n]
    }

    /// Return the label column name.
    #[must_use]
    pub fn label_name(&self) -> Option<&str> {
        self.column_names.last().map(String::as_str)
    }

    /// Borrow the records.
    #[must_use]
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Consume the table and return the records.
    #[must_use]
    pub fn into_dataset(self) -> Dataset {
        self.dataset
    }

    /// Return the number of data rows.
    #[must_use]
    pub fn n_records(&self) -> usize {
        self.dataset.len()
    }
}

/// One classified row as written to `{experiment}_predictions.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictedRecord {
    /// Zero-based row index in the input.
    pub record_index: usize,
    /// Predicted class label.
    pub predicted: String,
    /// True label, when the input row carried one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
    /// Share of trees voting for the predicted label, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Highest-voted labels with their tree counts.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub top_votes: Vec<(String, usize)>,
}

impl From<&Prediction> for PredictedRecord {
    fn from(p: &Prediction) -> Self {
        Self {
            record_index: p.record_index,
            predicted: p.predicted.clone(),
            actual: Some(p.actual.clone()),
            confidence: None,
            top_votes: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn experiment_name_valid() {
        let name = ExperimentName::new("my-experiment_01".to_string());
        assert!(name.is_ok());
        assert_eq!(name.unwrap().as_str(), "my-experiment_01");
    }

    #[test]
    fn experiment_name_rejects_empty() {
        let name = ExperimentName::new(String::new());
        assert!(matches!(name, Err(IoError::InvalidExperimentName { .. })));
    }

    #[test]
    fn experiment_name_rejects_special_chars() {
        let name = ExperimentName::new("my experiment!".to_string());
        assert!(matches!(name, Err(IoError::InvalidExperimentName { .. })));
    }

    #[test]
    fn table_splits_attribute_and_label_names() {
        let dataset = Dataset::from_rows([["sunny", "hot", "no"]]).unwrap();
        let names = vec!["outlook".into(), "temp".into(), "play".into()];
        let table = CategoricalTable::new(names, dataset);
        assert_eq!(table.attribute_names(), ["outlook", "temp"]);
        assert_eq!(table.label_name(), Some("play"));
        assert_eq!(table.n_records(), 1);
    }

    #[test]
    fn predicted_record_from_prediction() {
        let p = Prediction {
            record_index: 3,
            predicted: "yes".into(),
            actual: "no".into(),
        };
        let record = PredictedRecord::from(&p);
        assert_eq!(record.actual.as_deref(), Some("no"));
        assert!(record.top_votes.is_empty());
    }
}
