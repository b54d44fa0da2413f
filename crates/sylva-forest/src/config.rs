//! Configuration builder for random forest training.

use crate::dataset::Dataset;
use crate::error::ForestError;
use crate::result::ForestResult;

/// Strategy for determining how many attributes each tree may split on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaxFeatures {
    /// Square root of total attributes, rounded up.
    Sqrt,
    /// Log base 2 of total attributes, rounded up (at least 1).
    Log2,
    /// A fraction of total attributes, rounded up (must be in (0.0, 1.0]).
    Fraction(f64),
    /// A fixed count.
    Fixed(usize),
    /// All attributes (no subspace sampling).
    All,
}

/// Whether to compute out-of-bag evaluation during training.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OobMode {
    /// Compute OOB accuracy.
    Enabled,
    /// Skip OOB evaluation.
    Disabled,
}

/// Configuration for random forest training.
///
/// Construct via [`ForestConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter            | Default     |
/// |----------------------|-------------|
/// | `max_features`       | `Sqrt`      |
/// | `bootstrap_fraction` | 1.0         |
/// | `seed`               | 42          |
/// | `oob_mode`           | `Disabled`  |
#[derive(Debug, Clone)]
pub struct ForestConfig {
    pub(crate) n_trees: usize,
    pub(crate) max_features: MaxFeatures,
    pub(crate) bootstrap_fraction: f64,
    pub(crate) seed: u64,
    pub(crate) oob_mode: OobMode,
}

impl ForestConfig {
    /// Create a new config with the given number of trees.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::InvalidTreeCount`] if `n_trees` is zero.
    pub fn new(n_trees: usize) -> Result<Self, ForestError> {
        if n_trees == 0 {
            return Err(ForestError::InvalidTreeCount { n_trees });
        }
        Ok(Self {
            n_trees,
            max_features: MaxFeatures::Sqrt,
            bootstrap_fraction: 1.0,
            seed: 42,
            oob_mode: OobMode::Disabled,
        })
    }

    /// Set the attribute subspace size strategy.
    #[must_use]
    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    /// Set the bootstrap fraction (sample size relative to the training set).
    #[must_use]
    pub fn with_bootstrap_fraction(mut self, bootstrap_fraction: f64) -> Self {
        self.bootstrap_fraction = bootstrap_fraction;
        self
    }

    /// Set the random seed for reproducibility.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the OOB evaluation mode.
    #[must_use]
    pub fn with_oob_mode(mut self, oob_mode: OobMode) -> Self {
        self.oob_mode = oob_mode;
        self
    }

    /// Return the number of trees.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    /// Return the attribute subspace size strategy.
    #[must_use]
    pub fn max_features(&self) -> MaxFeatures {
        self.max_features
    }

    /// Return the bootstrap fraction.
    #[must_use]
    pub fn bootstrap_fraction(&self) -> f64 {
        self.bootstrap_fraction
    }

    /// Return the random seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Return the OOB evaluation mode.
    #[must_use]
    pub fn oob_mode(&self) -> OobMode {
        self.oob_mode
    }

    /// Train a random forest on `dataset`.
    ///
    /// `attribute_names` labels the attribute columns in importance
    /// rankings; when its length does not match the attribute count,
    /// positional names `attr_{i}` are used instead.
    ///
    /// # Errors
    ///
    /// | Variant                                   | When                                                |
    /// |-------------------------------------------|-----------------------------------------------------|
    /// | [`ForestError::EmptyDataset`]             | `dataset` has no records                            |
    /// | [`ForestError::InvalidMaxFeatures`]       | resolved max_features is outside [1, n_attributes]  |
    /// | [`ForestError::InvalidBootstrapFraction`] | bootstrap_fraction is not in (0.0, 1.0]             |
    /// | [`ForestError::OobEvaluationFailed`]      | OOB enabled but no record has any OOB tree          |
    pub fn fit(
        &self,
        dataset: &Dataset,
        attribute_names: &[String],
    ) -> Result<ForestResult, ForestError> {
        crate::forest::train(self, dataset, attribute_names)
    }
}
