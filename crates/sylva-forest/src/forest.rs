//! Random forest training with parallel tree construction.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, info, instrument};

use crate::config::{ForestConfig, MaxFeatures, OobMode};
use crate::dataset::Dataset;
use crate::error::ForestError;
use crate::importance::aggregate_importances;
use crate::oob::compute_oob;
use crate::result::{ForestResult, TrainingMetadata};
use crate::sample::{bootstrap_indices, sample_attributes};
use crate::tree::DecisionTree;

/// A fitted random forest: an ordered ensemble of ID3 trees.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RandomForest {
    pub(crate) trees: Vec<DecisionTree>,
    pub(crate) n_attributes: usize,
    pub(crate) attribute_names: Vec<String>,
}

impl RandomForest {
    /// Assemble a forest from already-built trees.
    ///
    /// # Errors
    ///
    /// | Variant | When |
    /// |---|---|
    /// | [`ForestError::InvalidTreeCount`] | `trees` is empty |
    /// | [`ForestError::FieldCountMismatch`] | trees disagree on attribute count |
    pub fn from_trees(trees: Vec<DecisionTree>) -> Result<Self, ForestError> {
        let Some(first) = trees.first() else {
            return Err(ForestError::InvalidTreeCount { n_trees: 0 });
        };
        let n_attributes = first.n_attributes();
        if let Some(other) = trees.iter().find(|t| t.n_attributes() != n_attributes) {
            return Err(ForestError::FieldCountMismatch {
                expected: n_attributes,
                got: other.n_attributes(),
            });
        }
        Ok(Self {
            trees,
            n_attributes,
            attribute_names: positional_names(n_attributes),
        })
    }

    /// Return the member trees in insertion order.
    #[must_use]
    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }
}

fn positional_names(n_attributes: usize) -> Vec<String> {
    (0..n_attributes).map(|i| format!("attr_{i}")).collect()
}

/// Resolve `MaxFeatures` to a concrete count.
pub(crate) fn resolve_max_features(
    max_features: MaxFeatures,
    n_attributes: usize,
) -> Result<usize, ForestError> {
    let resolved = match max_features {
        MaxFeatures::Sqrt => (n_attributes as f64).sqrt().ceil() as usize,
        MaxFeatures::Log2 => (n_attributes as f64).log2().ceil().max(1.0) as usize,
        MaxFeatures::Fraction(f) if f > 0.0 && f <= 1.0 => (n_attributes as f64 * f).ceil() as usize,
        MaxFeatures::Fraction(_) => 0,
        MaxFeatures::Fixed(n) => n,
        MaxFeatures::All => n_attributes,
    };
    if resolved == 0 || resolved > n_attributes {
        return Err(ForestError::InvalidMaxFeatures {
            max_features: resolved,
            n_attributes,
        });
    }
    Ok(resolved)
}

/// Train the random forest ensemble.
#[instrument(skip_all, fields(n_trees = config.n_trees, n_samples = dataset.len()))]
pub(crate) fn train(
    config: &ForestConfig,
    dataset: &Dataset,
    attribute_names: &[String],
) -> Result<ForestResult, ForestError> {
    if dataset.is_empty() {
        return Err(ForestError::EmptyDataset);
    }
    let n_samples = dataset.len();
    let n_attributes = dataset.n_attributes();

    let max_features = resolve_max_features(config.max_features, n_attributes)?;

    if config.bootstrap_fraction <= 0.0 || config.bootstrap_fraction > 1.0 {
        return Err(ForestError::InvalidBootstrapFraction {
            fraction: config.bootstrap_fraction,
        });
    }
    let draw_count = ((n_samples as f64) * config.bootstrap_fraction).ceil() as usize;

    let attribute_names = if attribute_names.len() == n_attributes {
        attribute_names.to_vec()
    } else {
        positional_names(n_attributes)
    };

    info!(
        n_trees = config.n_trees,
        n_samples,
        n_attributes,
        max_features,
        draw_count,
        "training random forest"
    );

    // One independent generator per tree, seeded from the master stream.
    let mut master_rng = ChaCha8Rng::seed_from_u64(config.seed);
    let tree_seeds: Vec<u64> = (0..config.n_trees).map(|_| master_rng.r#gen()).collect();

    let tree_results: Vec<(DecisionTree, Vec<usize>)> = tree_seeds
        .into_par_iter()
        .map(|seed| -> Result<(DecisionTree, Vec<usize>), ForestError> {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let (in_bag, out_of_bag) = bootstrap_indices(n_samples, draw_count, &mut rng);
            let sample = dataset.select(&in_bag);
            let candidates = sample_attributes(n_attributes, max_features, &mut rng)?;
            let tree = DecisionTree::fit(&sample, &candidates)?;
            debug!(
                seed,
                n_nodes = tree.n_nodes(),
                depth = tree.depth(),
                n_out_of_bag = out_of_bag.len(),
                "tree trained"
            );
            Ok((tree, out_of_bag))
        })
        .collect::<Result<_, _>>()?;

    let (trees, oob_indices_per_tree): (Vec<DecisionTree>, Vec<Vec<usize>>) =
        tree_results.into_iter().unzip();

    let per_tree_importances: Vec<Vec<f64>> =
        trees.iter().map(DecisionTree::attribute_importances).collect();
    let importances = aggregate_importances(&per_tree_importances, &attribute_names);

    let oob_score = match config.oob_mode {
        OobMode::Enabled => Some(compute_oob(&trees, dataset, &oob_indices_per_tree)?),
        OobMode::Disabled => None,
    };

    let forest = RandomForest {
        trees,
        n_attributes,
        attribute_names,
    };

    info!(
        oob_accuracy = oob_score.as_ref().map(|s| s.accuracy),
        "random forest training complete"
    );

    let metadata = TrainingMetadata {
        n_trees: config.n_trees,
        n_attributes,
        n_samples,
        max_features_resolved: max_features,
        draw_count,
    };

    Ok(ForestResult::new(forest, importances, oob_score, oob_indices_per_tree, metadata))
}
