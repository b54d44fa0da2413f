//! Majority-vote prediction for the random forest ensemble.

use std::collections::BTreeMap;

use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::dataset::Record;
use crate::error::ForestError;
use crate::forest::RandomForest;
use crate::split::plurality;

/// Per-label tree votes for one record, ordered by label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Votes {
    counts: BTreeMap<String, usize>,
    n_trees: usize,
}

impl Votes {
    pub(crate) fn new(counts: BTreeMap<String, usize>, n_trees: usize) -> Self {
        Self { counts, n_trees }
    }

    /// Return the label with the most votes; ties go to the smallest label.
    #[must_use]
    pub fn winner(&self) -> &str {
        plurality(self.iter()).map_or("", |(label, _)| label)
    }

    /// Return the vote count for `label` (0 if no tree predicted it).
    #[must_use]
    pub fn count(&self, label: &str) -> usize {
        self.counts.get(label).copied().unwrap_or(0)
    }

    /// Return the share of trees that voted for `label`.
    #[must_use]
    pub fn fraction(&self, label: &str) -> f64 {
        self.count(label) as f64 / self.n_trees.max(1) as f64
    }

    /// Return the top-k labels by descending vote count, ties by label.
    #[must_use]
    pub fn top_k(&self, k: usize) -> Vec<(&str, usize)> {
        let mut ranked: Vec<(&str, usize)> =
            self.counts.iter().map(|(l, &c)| (l.as_str(), c)).collect();
        // Stable sort keeps ascending label order among equal counts.
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(k);
        ranked
    }

    /// Iterate over `(label, count)` pairs in ascending label order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(l, &c)| (l.as_str(), c))
    }

    /// Return the number of trees that voted.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.n_trees
    }
}

impl RandomForest {
    /// Tally each tree's prediction for one record's attribute values.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::FieldCountMismatch`] when `attributes.len() != n_attributes`.
    pub fn votes<S: AsRef<str>>(&self, attributes: &[S]) -> Result<Votes, ForestError> {
        if attributes.len() != self.n_attributes {
            return Err(ForestError::FieldCountMismatch {
                expected: self.n_attributes,
                got: attributes.len(),
            });
        }
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for tree in &self.trees {
            let label = tree.classify(attributes)?;
            match counts.get_mut(label) {
                Some(count) => *count += 1,
                None => {
                    counts.insert(label.to_string(), 1);
                }
            }
        }
        Ok(Votes::new(counts, self.trees.len()))
    }

    /// Predict the class label for one record's attribute values by majority vote.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::FieldCountMismatch`] when `attributes.len() != n_attributes`.
    pub fn classify<S: AsRef<str>>(&self, attributes: &[S]) -> Result<String, ForestError> {
        Ok(self.votes(attributes)?.winner().to_string())
    }

    /// Predict the class label for a full record, ignoring its label field.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::FieldCountMismatch`] when the record's attribute count is wrong.
    pub fn classify_record(&self, record: &Record) -> Result<String, ForestError> {
        self.classify(record.attributes())
    }

    /// Predict labels for a batch of records in parallel, preserving order.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::FieldCountMismatch`] if any record has the wrong width.
    pub fn classify_batch(&self, records: &[Record]) -> Result<Vec<String>, ForestError> {
        records
            .into_par_iter()
            .map(|record| self.classify_record(record))
            .collect()
    }

    /// Return vote tallies for a batch of records in parallel, preserving order.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::FieldCountMismatch`] if any record has the wrong width.
    pub fn votes_batch(&self, records: &[Record]) -> Result<Vec<Votes>, ForestError> {
        records
            .into_par_iter()
            .map(|record| self.votes(record.attributes()))
            .collect()
    }

    /// Return the number of attribute columns this forest was trained on.
    #[must_use]
    pub fn n_attributes(&self) -> usize {
        self.n_attributes
    }

    /// Return the number of trees in the ensemble.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Return the attribute column names.
    #[must_use]
    pub fn attribute_names(&self) -> &[String] {
        &self.attribute_names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use crate::node::AttributeSet;
    use crate::tree::DecisionTree;

    fn ds(rows: &[&[&str]]) -> Dataset {
        Dataset::from_rows(rows.iter().map(|r| r.iter().copied())).unwrap()
    }

    /// A single-leaf tree predicting `label`, over one attribute.
    fn constant_tree(label: &str) -> DecisionTree {
        DecisionTree::fit(&ds(&[&["_", label]]), &AttributeSet::all(1)).unwrap()
    }

    #[test]
    fn majority_wins() {
        let forest = RandomForest::from_trees(vec![
            constant_tree("no"),
            constant_tree("yes"),
            constant_tree("yes"),
        ])
        .unwrap();
        let votes = forest.votes(&["x"]).unwrap();
        assert_eq!(votes.winner(), "yes");
        assert_eq!(votes.count("yes"), 2);
        assert!((votes.fraction("no") - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(forest.classify(&["x"]).unwrap(), "yes");
    }

    #[test]
    fn tie_goes_to_smallest_label() {
        for order in [["beta", "alpha"], ["alpha", "beta"]] {
            let forest =
                RandomForest::from_trees(order.iter().map(|l| constant_tree(l)).collect()).unwrap();
            assert_eq!(forest.classify(&["x"]).unwrap(), "alpha");
        }
    }

    #[test]
    fn top_k_orders_by_count_then_label() {
        let forest = RandomForest::from_trees(vec![
            constant_tree("c"),
            constant_tree("b"),
            constant_tree("a"),
            constant_tree("c"),
        ])
        .unwrap();
        let votes = forest.votes(&["x"]).unwrap();
        assert_eq!(votes.top_k(2), vec![("c", 2), ("a", 1)]);
        assert_eq!(votes.n_trees(), 4);
    }

    #[test]
    fn single_tree_forest_matches_tree() {
        let data = ds(&[
            &["X", "p", "yes"],
            &["X", "q", "no"],
            &["Y", "p", "no"],
            &["Y", "q", "no"],
            &["Z", "q", "maybe"],
        ]);
        let tree = DecisionTree::fit_all(&data).unwrap();
        let forest = RandomForest::from_trees(vec![tree.clone()]).unwrap();
        let queries: [[&str; 2]; 4] = [["X", "p"], ["Y", "q"], ["Z", "p"], ["W", "w"]];
        for query in &queries {
            assert_eq!(forest.classify(query).unwrap(), tree.classify(query).unwrap());
        }
    }

    #[test]
    fn batch_matches_individual() {
        let data = ds(&[&["X", "yes"], &["Y", "no"], &["X", "yes"]]);
        let forest = RandomForest::from_trees(vec![DecisionTree::fit_all(&data).unwrap()]).unwrap();
        let batch = forest.classify_batch(data.records()).unwrap();
        let votes = forest.votes_batch(data.records()).unwrap();
        for (i, record) in data.records().iter().enumerate() {
            assert_eq!(batch[i], forest.classify_record(record).unwrap());
            assert_eq!(votes[i].winner(), batch[i]);
        }
    }

    #[test]
    fn width_mismatch_error() {
        let forest = RandomForest::from_trees(vec![constant_tree("yes")]).unwrap();
        let err = forest.classify(&["a", "b"]).unwrap_err();
        assert!(matches!(
            err,
            ForestError::FieldCountMismatch { expected: 1, got: 2 }
        ));
    }
}
