//! JSON result writer for evaluation and prediction outputs.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use sylva_forest::{ClassMetrics, Evaluation, ForestResult, RankedAttribute};
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::{ExperimentName, PredictedRecord};

/// Writes evaluation and prediction results to JSON files.
///
/// Creates the output directory on construction if it does not exist.
/// Output files are named `{experiment}_evaluation.json` and
/// `{experiment}_predictions.json`.
pub struct ResultWriter {
    output_dir: PathBuf,
    experiment: ExperimentName,
}

impl ResultWriter {
    /// Create a new writer targeting the given directory and experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), experiment = %experiment))]
    pub fn new(output_dir: &Path, experiment: ExperimentName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            experiment,
        })
    }

    /// Write a training and holdout evaluation summary to `{experiment}_evaluation.json`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all)]
    pub fn write_evaluation(
        &self,
        result: &ForestResult,
        evaluation: &Evaluation,
    ) -> Result<PathBuf, IoError> {
        let path = self.file_path("evaluation.json");
        let metadata = result.metadata();
        let class_metrics = evaluation.confusion.class_metrics();

        let artifact = EvaluationArtifact {
            experiment: self.experiment.as_str(),
            n_train: metadata.n_samples,
            n_test: evaluation.n_total,
            n_trees: metadata.n_trees,
            max_features: metadata.max_features_resolved,
            draw_count: metadata.draw_count,
            accuracy: evaluation.accuracy,
            n_correct: evaluation.n_correct,
            oob_accuracy: result.oob_score().map(|s| s.accuracy),
            attribute_importances: result.importances(),
            classes: evaluation.confusion.classes(),
            confusion_matrix: evaluation.confusion.as_rows(),
            class_metrics: &class_metrics,
        };

        write_json(&path, &artifact)?;
        info!(path = %path.display(), "evaluation result written");
        Ok(path)
    }

    /// Write per-record predictions to `{experiment}_predictions.json`.
    ///
    /// Accuracy is reported over the records that carry a true label.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all, fields(n_records = predictions.len()))]
    pub fn write_predictions(&self, predictions: &[PredictedRecord]) -> Result<PathBuf, IoError> {
        let path = self.file_path("predictions.json");

        let labelled: Vec<bool> = predictions
            .iter()
            .filter_map(|p| p.actual.as_ref().map(|a| *a == p.predicted))
            .collect();
        let accuracy = (!labelled.is_empty())
            .then(|| labelled.iter().filter(|&&hit| hit).count() as f64 / labelled.len() as f64);

        let artifact = PredictionsArtifact {
            experiment: self.experiment.as_str(),
            n_records: predictions.len(),
            n_labelled: labelled.len(),
            accuracy,
            predictions,
        };

        write_json(&path, &artifact)?;
        info!(path = %path.display(), "predictions written");
        Ok(path)
    }

    /// Return the path where the model binary should be saved.
    ///
    /// Does not write anything; just computes `{output_dir}/{experiment}_model.bin`.
    #[must_use]
    pub fn model_path(&self) -> PathBuf {
        self.file_path("model.bin")
    }

    fn file_path(&self, suffix: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_{suffix}", self.experiment.as_str()))
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), IoError> {
    let write = || -> std::io::Result<()> {
        let mut out = BufWriter::new(fs::File::create(path)?);
        serde_json::to_writer_pretty(&mut out, value)?;
        out.write_all(b"\n")?;
        out.flush()
    };
    write().map_err(|e| IoError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })
}

// --- Shadow structs for JSON serialization ---

#[derive(Serialize)]
struct EvaluationArtifact<'a> {
    experiment: &'a str,
    n_train: usize,
    n_test: usize,
    n_trees: usize,
    max_features: usize,
    draw_count: usize,
    accuracy: f64,
    n_correct: usize,
    oob_accuracy: Option<f64>,
    attribute_importances: &'a [RankedAttribute],
    classes: &'a [String],
    confusion_matrix: &'a [Vec<usize>],
    class_metrics: &'a [ClassMetrics],
}

#[derive(Serialize)]
struct PredictionsArtifact<'a> {
    experiment: &'a str,
    n_records: usize,
    n_labelled: usize,
    accuracy: Option<f64>,
    predictions: &'a [PredictedRecord],
}
