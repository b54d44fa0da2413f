//! Out-of-bag (OOB) evaluation for the random forest.

use std::collections::BTreeMap;

use crate::dataset::Dataset;
use crate::error::ForestError;
use crate::predict::Votes;
use crate::tree::DecisionTree;

/// Out-of-bag evaluation result.
#[derive(Debug, Clone)]
pub struct OobScore {
    /// OOB accuracy (fraction of correctly predicted OOB records).
    pub accuracy: f64,
    /// Number of records that had at least one OOB tree.
    pub n_oob_samples: usize,
}

/// Compute out-of-bag predictions and accuracy.
///
/// Each record is voted on only by the trees whose bootstrap sample did
/// not contain it. Records with no OOB tree are skipped.
pub(crate) fn compute_oob(
    trees: &[DecisionTree],
    dataset: &Dataset,
    oob_indices_per_tree: &[Vec<usize>],
) -> Result<OobScore, ForestError> {
    let records = dataset.records();
    let mut tallies: Vec<BTreeMap<String, usize>> = vec![BTreeMap::new(); records.len()];
    let mut n_voters = vec![0usize; records.len()];

    for (tree, oob_indices) in trees.iter().zip(oob_indices_per_tree) {
        for &record_idx in oob_indices {
            let predicted = tree.classify_record(&records[record_idx])?;
            *tallies[record_idx].entry(predicted.to_string()).or_insert(0) += 1;
            n_voters[record_idx] += 1;
        }
    }

    let n_oob_samples = n_voters.iter().filter(|&&n| n > 0).count();
    if n_oob_samples == 0 {
        return Err(ForestError::OobEvaluationFailed {
            reason: "no record has any OOB tree".to_string(),
        });
    }

    let correct = tallies
        .into_iter()
        .zip(n_voters)
        .zip(records)
        .filter(|&((_, n), _)| n > 0)
        .map(|((tally, n), record)| Votes::new(tally, n).winner() == record.label())
        .filter(|&hit| hit)
        .count();

    Ok(OobScore {
        accuracy: correct as f64 / n_oob_samples as f64,
        n_oob_samples,
    })
}
