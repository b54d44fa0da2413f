//! Training result types for the random forest.

use crate::forest::RandomForest;
use crate::importance::RankedAttribute;
use crate::oob::OobScore;

/// Metadata about the training run.
#[derive(Debug, Clone)]
pub struct TrainingMetadata {
    /// Number of trees trained.
    pub n_trees: usize,
    /// Number of attribute columns in the dataset.
    pub n_attributes: usize,
    /// Number of training records.
    pub n_samples: usize,
    /// Attributes sampled per tree.
    pub max_features_resolved: usize,
    /// Bootstrap sample size per tree.
    pub draw_count: usize,
}

/// Result of random forest training.
///
/// Holds the fitted forest, attribute importances, the optional OOB score,
/// per-tree OOB indices, and training metadata.
#[derive(Debug)]
pub struct ForestResult {
    forest: RandomForest,
    importances: Vec<RankedAttribute>,
    oob_score: Option<OobScore>,
    oob_indices_per_tree: Vec<Vec<usize>>,
    metadata: TrainingMetadata,
}

impl ForestResult {
    pub(crate) fn new(
        forest: RandomForest,
        importances: Vec<RankedAttribute>,
        oob_score: Option<OobScore>,
        oob_indices_per_tree: Vec<Vec<usize>>,
        metadata: TrainingMetadata,
    ) -> Self {
        Self {
            forest,
            importances,
            oob_score,
            oob_indices_per_tree,
            metadata,
        }
    }

    /// Borrow the fitted forest.
    #[must_use]
    pub fn forest(&self) -> &RandomForest {
        &self.forest
    }

    /// Consume the result and return the fitted forest.
    #[must_use]
    pub fn into_forest(self) -> RandomForest {
        self.forest
    }

    /// Return the ranked attribute importances.
    #[must_use]
    pub fn importances(&self) -> &[RankedAttribute] {
        &self.importances
    }

    /// Return the OOB score, if computed.
    #[must_use]
    pub fn oob_score(&self) -> Option<&OobScore> {
        self.oob_score.as_ref()
    }

    /// Return training metadata.
    #[must_use]
    pub fn metadata(&self) -> &TrainingMetadata {
        &self.metadata
    }

    /// Return, per tree, the positions of training records left out of its bootstrap.
    #[must_use]
    pub fn oob_indices_per_tree(&self) -> &[Vec<usize>] {
        &self.oob_indices_per_tree
    }
}
