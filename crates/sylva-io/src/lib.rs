//! CSV loading and JSON result writing for the sylva pipeline.

mod domain;
mod error;
mod reader;
mod writer;

pub use domain::{CategoricalTable, ExperimentName, PredictedRecord};
pub use error::IoError;
pub use reader::DatasetReader;
pub use writer::ResultWriter;
