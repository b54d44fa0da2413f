//! Entropy, information gain, and split-attribute selection.

use std::collections::BTreeMap;

use crate::dataset::{Dataset, Record};
use crate::error::ForestError;
use crate::node::{AttributeIndex, AttributeSet, Entropy};

/// Compute the Shannon entropy, in bits, of a sequence of class labels.
///
/// `-Σ p · log2(p)` over the distinct labels, where `p` is each label's
/// empirical frequency. A sequence with a single distinct label has
/// entropy 0.0.
///
/// # Errors
///
/// Returns [`ForestError::EmptyDataset`] when `labels` yields nothing.
pub fn entropy<'a, I>(labels: I) -> Result<Entropy, ForestError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    let mut total = 0usize;
    for label in labels {
        *counts.entry(label).or_insert(0) += 1;
        total += 1;
    }
    if total == 0 {
        return Err(ForestError::EmptyDataset);
    }
    Ok(entropy_of_counts(&counts, total))
}

/// Compute the information gain of splitting `dataset` on `attribute`.
///
/// The parent entropy minus the size-weighted entropy of each group of
/// records sharing one value of `attribute`.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`ForestError::EmptyDataset`] | `dataset` has no records |
/// | [`ForestError::AttributeOutOfRange`] | `attribute` is not an attribute column |
pub fn information_gain(dataset: &Dataset, attribute: AttributeIndex) -> Result<f64, ForestError> {
    if dataset.is_empty() {
        return Err(ForestError::EmptyDataset);
    }
    if attribute.index() >= dataset.n_attributes() {
        return Err(ForestError::AttributeOutOfRange {
            attribute: attribute.index(),
            n_attributes: dataset.n_attributes(),
        });
    }
    let records: Vec<&Record> = dataset.records().iter().collect();
    let parent = entropy_of(&records);
    Ok(gain_of(&records, parent, attribute))
}

/// Count occurrences of each label. Keys iterate in ascending label order.
pub(crate) fn label_counts<'a>(records: &[&'a Record]) -> BTreeMap<&'a str, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        *counts.entry(record.label()).or_insert(0) += 1;
    }
    counts
}

/// Entropy of a non-empty record group.
pub(crate) fn entropy_of(records: &[&Record]) -> Entropy {
    debug_assert!(!records.is_empty(), "entropy of an empty group");
    entropy_of_counts(&label_counts(records), records.len())
}

fn entropy_of_counts(counts: &BTreeMap<&str, usize>, total: usize) -> Entropy {
    let n = total as f64;
    let value = -counts
        .values()
        .map(|&c| {
            let p = c as f64 / n;
            p * p.log2()
        })
        .sum::<f64>();
    Entropy::new(value)
}

/// Pick the most frequent label. Ties go to the smallest label.
///
/// Returns `None` only for an empty map.
pub(crate) fn majority_label<'a>(counts: &BTreeMap<&'a str, usize>) -> Option<&'a str> {
    plurality(counts.iter().map(|(&label, &count)| (label, count))).map(|(label, _)| label)
}

/// Pick the `(label, count)` pair with the highest count from pairs given
/// in ascending label order. Equal counts keep the earlier (smaller) label.
///
/// Shared by leaf majorities, split fallbacks, and ensemble votes.
pub(crate) fn plurality<'a, I>(counts: I) -> Option<(&'a str, usize)>
where
    I: IntoIterator<Item = (&'a str, usize)>,
{
    let mut best: Option<(&str, usize)> = None;
    for (label, count) in counts {
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((label, count));
        }
    }
    best
}

/// Group records by their value of `attribute`. Every group is non-empty.
pub(crate) fn partition<'a>(
    records: &[&'a Record],
    attribute: AttributeIndex,
) -> BTreeMap<&'a str, Vec<&'a Record>> {
    let mut groups: BTreeMap<&str, Vec<&Record>> = BTreeMap::new();
    for &record in records {
        groups.entry(record.value(attribute)).or_default().push(record);
    }
    groups
}

fn gain_of(records: &[&Record], parent: Entropy, attribute: AttributeIndex) -> f64 {
    let n = records.len() as f64;
    let mut terms: Vec<f64> = partition(records, attribute)
        .values()
        .map(|group| group.len() as f64 / n * entropy_of(group).value())
        .collect();
    // Summation order must not depend on how the values are spelled, so
    // attributes inducing the same partition score bit-identical gains.
    terms.sort_by(f64::total_cmp);
    parent.value() - terms.iter().sum::<f64>()
}

/// The attribute chosen for a split.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BestSplit {
    pub(crate) attribute: AttributeIndex,
    pub(crate) gain: f64,
}

/// Find the candidate with the strictly greatest information gain.
///
/// Candidates are scanned in ascending order, so equal gains keep the
/// lowest index. Returns `None` when `candidates` is empty.
pub(crate) fn best_attribute(
    records: &[&Record],
    parent: Entropy,
    candidates: &AttributeSet,
) -> Option<BestSplit> {
    let mut best: Option<BestSplit> = None;
    for attribute in candidates.iter() {
        let gain = gain_of(records, parent, attribute);
        if best.is_none_or(|b| gain > b.gain) {
            best = Some(BestSplit { attribute, gain });
        }
    }
    best
}
