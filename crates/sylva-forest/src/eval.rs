//! Holdout splitting and evaluation of a trained forest.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::{info, instrument};

use crate::confusion::ConfusionMatrix;
use crate::dataset::Dataset;
use crate::error::ForestError;
use crate::forest::RandomForest;

/// Train/test partitioning by ratio.
///
/// Construct via [`HoldoutSplit::new`], then chain `with_shuffle` to
/// shuffle the row order before cutting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoldoutSplit {
    train_fraction: f64,
    shuffle_seed: Option<u64>,
}

impl HoldoutSplit {
    /// Create a split keeping `train_fraction` of the records for training.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::InvalidTrainFraction`] unless `0.0 < train_fraction < 1.0`.
    pub fn new(train_fraction: f64) -> Result<Self, ForestError> {
        if !(train_fraction > 0.0 && train_fraction < 1.0) {
            return Err(ForestError::InvalidTrainFraction {
                fraction: train_fraction,
            });
        }
        Ok(Self {
            train_fraction,
            shuffle_seed: None,
        })
    }

    /// Shuffle the row order with a seeded generator before splitting.
    #[must_use]
    pub fn with_shuffle(mut self, seed: u64) -> Self {
        self.shuffle_seed = Some(seed);
        self
    }

    /// Return the train fraction.
    #[must_use]
    pub fn train_fraction(&self) -> f64 {
        self.train_fraction
    }

    /// Return the shuffle seed, if shuffling is enabled.
    #[must_use]
    pub fn shuffle_seed(&self) -> Option<u64> {
        self.shuffle_seed
    }

    /// Split `dataset` into `(train, test)`.
    ///
    /// The first `floor(n * train_fraction)` records (after the optional
    /// shuffle) form the training partition. Either side may be empty.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::EmptyDataset`] if `dataset` has no records.
    pub fn split(&self, dataset: &Dataset) -> Result<(Dataset, Dataset), ForestError> {
        if dataset.is_empty() {
            return Err(ForestError::EmptyDataset);
        }
        let mut order: Vec<usize> = (0..dataset.len()).collect();
        if let Some(seed) = self.shuffle_seed {
            order.shuffle(&mut ChaCha8Rng::seed_from_u64(seed));
        }
        let n_train = (dataset.len() as f64 * self.train_fraction).floor() as usize;
        let (train, test) = order.split_at(n_train);
        Ok((dataset.select(train), dataset.select(test)))
    }
}

/// One evaluated record.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Prediction {
    /// Position of the record in the evaluated dataset.
    pub record_index: usize,
    /// Label predicted by the forest.
    pub predicted: String,
    /// True label of the record.
    pub actual: String,
}

impl Prediction {
    /// Whether the prediction matches the true label.
    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.predicted == self.actual
    }
}

/// Accuracy report over a labelled dataset.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Evaluation {
    /// Number of correctly classified records.
    pub n_correct: usize,
    /// Number of evaluated records.
    pub n_total: usize,
    /// `n_correct / n_total`.
    pub accuracy: f64,
    /// Per-record predictions, in dataset order.
    pub predictions: Vec<Prediction>,
    /// Confusion matrix over actual vs. predicted labels.
    pub confusion: ConfusionMatrix,
}

/// Classify every record of `dataset` and compare against its label.
///
/// # Errors
///
/// | Variant                              | When                                       |
/// |--------------------------------------|--------------------------------------------|
/// | [`ForestError::EmptyDataset`]        | `dataset` has no records                   |
/// | [`ForestError::FieldCountMismatch`]  | record width differs from the forest's     |
#[instrument(skip_all, fields(n_records = dataset.len(), n_trees = forest.n_trees()))]
pub fn evaluate(forest: &RandomForest, dataset: &Dataset) -> Result<Evaluation, ForestError> {
    if dataset.is_empty() {
        return Err(ForestError::EmptyDataset);
    }
    let predicted = forest.classify_batch(dataset.records())?;
    let actual: Vec<&str> = dataset.labels().collect();
    let confusion = ConfusionMatrix::from_labels(&actual, &predicted)?;

    let predictions: Vec<Prediction> = predicted
        .into_iter()
        .zip(&actual)
        .enumerate()
        .map(|(record_index, (predicted, actual))| Prediction {
            record_index,
            predicted,
            actual: (*actual).to_string(),
        })
        .collect();
    let n_correct = predictions.iter().filter(|p| p.is_correct()).count();
    let n_total = predictions.len();
    let accuracy = n_correct as f64 / n_total as f64;

    info!(n_correct, n_total, accuracy, "evaluation complete");

    Ok(Evaluation {
        n_correct,
        n_total,
        accuracy,
        predictions,
        confusion,
    })
}
