use std::path::PathBuf;

/// Errors from tree induction, forest training, and evaluation.
#[derive(Debug, thiserror::Error)]
pub enum ForestError {
    /// Returned when n_trees is zero.
    #[error("n_trees must be at least 1, got {n_trees}")]
    InvalidTreeCount {
        /// The invalid n_trees value provided.
        n_trees: usize,
    },

    /// Returned when max_features resolves to 0 or exceeds the attribute count.
    #[error("max_features resolved to {max_features}, but must be in [1, {n_attributes}]")]
    InvalidMaxFeatures {
        /// The resolved max_features value.
        max_features: usize,
        /// The number of attribute columns in the dataset.
        n_attributes: usize,
    },

    /// Returned when bootstrap_fraction is not in (0.0, 1.0].
    #[error("bootstrap_fraction must be in (0.0, 1.0], got {fraction}")]
    InvalidBootstrapFraction {
        /// The invalid bootstrap_fraction value provided.
        fraction: f64,
    },

    /// Returned when a holdout train fraction is not in (0.0, 1.0).
    #[error("train_fraction must be in (0.0, 1.0), got {fraction}")]
    InvalidTrainFraction {
        /// The invalid train_fraction value provided.
        fraction: f64,
    },

    /// Returned when an operation that needs records receives none.
    #[error("dataset has zero records")]
    EmptyDataset,

    /// Returned when a record has no fields at all (not even a label).
    #[error("record {record_index} has no fields")]
    EmptyRecord {
        /// The zero-based index of the offending record.
        record_index: usize,
    },

    /// Returned when a record's field count differs from the dataset's.
    #[error("record {record_index} has {got} fields, expected {expected}")]
    RaggedRecord {
        /// The zero-based index of the offending record.
        record_index: usize,
        /// The field count shared by the preceding records.
        expected: usize,
        /// The field count of the offending record.
        got: usize,
    },

    /// Returned when a candidate attribute index does not address an attribute column.
    #[error("attribute {attribute} is out of range for {n_attributes} attribute columns")]
    AttributeOutOfRange {
        /// The offending attribute index.
        attribute: usize,
        /// The number of attribute columns in the dataset.
        n_attributes: usize,
    },

    /// Returned when a record passed for classification has the wrong width.
    #[error("classification input has {got} attributes, expected {expected}")]
    FieldCountMismatch {
        /// The attribute count the model was trained on.
        expected: usize,
        /// The attribute count of the input.
        got: usize,
    },

    /// Returned when OOB evaluation fails (no record has any OOB tree).
    #[error("OOB evaluation failed: {reason}")]
    OobEvaluationFailed {
        /// Human-readable description of why OOB evaluation failed.
        reason: String,
    },

    /// Returned when model serialization fails.
    #[error("failed to serialize model")]
    SerializeModel {
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when model deserialization fails.
    #[error("failed to deserialize model from {path}")]
    DeserializeModel {
        /// Path to the model file that could not be deserialized.
        path: PathBuf,
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when writing the model file fails.
    #[error("failed to write model to {path}")]
    WriteModel {
        /// Path to the file that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when reading the model file fails.
    #[error("failed to read model from {path}")]
    ReadModel {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when loading a model with an incompatible format version.
    #[error("incompatible model version in {path}: expected {expected}, found {found}")]
    IncompatibleModelVersion {
        /// The model format version this build expects.
        expected: u32,
        /// The model format version found in the file.
        found: u32,
        /// Path to the model file with the incompatible version.
        path: PathBuf,
    },

    /// Returned when a decoded model is internally inconsistent: the
    /// envelope disagrees with the forest, or a tree's arena is malformed.
    #[error("corrupt model in {path}: {reason}")]
    CorruptModel {
        /// Path to the model file.
        path: PathBuf,
        /// Which consistency check failed.
        reason: String,
    },
}
