//! CSV reader for categorical tables.

use std::path::{Path, PathBuf};

use sylva_forest::Dataset;
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::CategoricalTable;

/// Reads a delimited file of categorical tokens into a [`CategoricalTable`].
///
/// Every field is kept as a trimmed string token; the last column is the
/// class label. With headers (the default) the first row names the columns;
/// without, attributes are named `attr_0..attr_{n-1}` and the label column
/// `label`.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::EmptyDataset`] | Zero data rows |
/// | [`IoError::InconsistentRowLength`] | Row has a different column count than the header or first row |
/// | [`IoError::InvalidDataset`] | Rows cannot form a dataset |
#[derive(Debug, Clone)]
pub struct DatasetReader {
    path: PathBuf,
    has_headers: bool,
    delimiter: u8,
}

impl DatasetReader {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            has_headers: true,
            delimiter: b',',
        }
    }

    /// Set whether the first row is a header row.
    #[must_use]
    pub fn with_headers(mut self, has_headers: bool) -> Self {
        self.has_headers = has_headers;
        self
    }

    /// Set the field delimiter byte.
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Read and validate the file.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<CategoricalTable, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) so the InconsistentRowLength check fires instead of a CsvParse error.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(self.has_headers)
            .delimiter(self.delimiter)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(file);

        let mut column_names: Option<Vec<String>> = None;
        if self.has_headers {
            let header = rdr.headers().map_err(|e| self.csv_error(e))?;
            debug!(n_columns = header.len(), "read CSV header");
            column_names = Some(header.iter().map(str::to_string).collect());
        }

        let mut rows: Vec<Vec<String>> = Vec::new();
        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.csv_error(e))?;
            let expected = column_names
                .as_ref()
                .map_or_else(|| rows.first().map_or(record.len(), Vec::len), Vec::len);
            if record.len() != expected {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    expected,
                    got: record.len(),
                });
            }
            rows.push(record.iter().map(str::to_string).collect());
        }

        if rows.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        let column_names = column_names.unwrap_or_else(|| positional_column_names(rows[0].len()));
        let dataset = Dataset::from_rows(rows).map_err(|e| IoError::InvalidDataset {
            path: self.path.clone(),
            source: e,
        })?;

        info!(
            n_records = dataset.len(),
            n_attributes = dataset.n_attributes(),
            "dataset loaded"
        );

        Ok(CategoricalTable::new(column_names, dataset))
    }

    fn csv_error(&self, e: csv::Error) -> IoError {
        IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, csv::Position::byte),
            source: e,
        }
    }
}

/// `attr_0..attr_{n-2}` followed by `label`.
fn positional_column_names(n_columns: usize) -> Vec<String> {
    let n_attributes = n_columns.saturating_sub(1);
    (0..n_attributes)
        .map(|i| format!("attr_{i}"))
        .chain(std::iter::once("label".to_string()))
        .collect()
}
