//! Bootstrap resampling and random attribute subspaces.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::dataset::Dataset;
use crate::error::ForestError;
use crate::node::{AttributeIndex, AttributeSet};

/// Draw `n` records uniformly at random, with replacement, from `dataset`.
///
/// # Errors
///
/// Returns [`ForestError::EmptyDataset`] when `dataset` has no records.
pub fn bootstrap_sample(
    dataset: &Dataset,
    n: usize,
    rng: &mut impl Rng,
) -> Result<Dataset, ForestError> {
    if dataset.is_empty() {
        return Err(ForestError::EmptyDataset);
    }
    let (in_bag, _) = bootstrap_indices(dataset.len(), n, rng);
    Ok(dataset.select(&in_bag))
}

/// Draw `draw_count` positions in `0..n_records` with replacement.
///
/// Returns the drawn positions and the sorted positions never drawn
/// (the out-of-bag set). `n_records` must be non-zero.
pub(crate) fn bootstrap_indices(
    n_records: usize,
    draw_count: usize,
    rng: &mut impl Rng,
) -> (Vec<usize>, Vec<usize>) {
    let mut drawn = vec![false; n_records];
    let mut in_bag = Vec::with_capacity(draw_count);
    for _ in 0..draw_count {
        let idx = rng.gen_range(0..n_records);
        in_bag.push(idx);
        drawn[idx] = true;
    }
    let out_of_bag: Vec<usize> = (0..n_records).filter(|&i| !drawn[i]).collect();
    (in_bag, out_of_bag)
}

/// Choose `k` distinct attributes out of `0..n_attributes` uniformly at random.
///
/// Shuffles a fresh index vector and keeps the first `k`, so no state is
/// shared between calls.
///
/// # Errors
///
/// Returns [`ForestError::InvalidMaxFeatures`] unless `1 <= k <= n_attributes`.
pub fn sample_attributes(
    n_attributes: usize,
    k: usize,
    rng: &mut impl Rng,
) -> Result<AttributeSet, ForestError> {
    if k == 0 || k > n_attributes {
        return Err(ForestError::InvalidMaxFeatures {
            max_features: k,
            n_attributes,
        });
    }
    let mut order: Vec<usize> = (0..n_attributes).collect();
    order.shuffle(rng);
    Ok(order.into_iter().take(k).map(AttributeIndex::new).collect())
}
