use std::collections::BTreeMap;

use tracing::{debug, instrument};

use crate::{
    ForestError,
    dataset::{Dataset, Record},
    node::{AttributeIndex, AttributeSet, Node, NodeIndex},
    split::{best_attribute, entropy_of, label_counts, majority_label, partition},
};

/// A fitted ID3 decision tree over categorical attributes.
///
/// Stored as an arena-based `Vec<Node>` with the root at index 0. A tree
/// is immutable once built.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DecisionTree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) n_attributes: usize,
}

impl DecisionTree {
    /// Induce a tree from `dataset`, splitting only on `candidates`.
    ///
    /// At each node: a pure label set becomes a leaf; an exhausted
    /// candidate set becomes a majority-label leaf; otherwise the node
    /// splits on the candidate with the highest information gain and
    /// recurses into one child per observed value, with that attribute
    /// removed from the candidates.
    ///
    /// # Errors
    ///
    /// | Variant | When |
    /// |---|---|
    /// | [`ForestError::EmptyDataset`] | `dataset` has no records |
    /// | [`ForestError::AttributeOutOfRange`] | a candidate is not an attribute column |
    #[instrument(skip_all, fields(n_samples = dataset.len(), n_candidates = candidates.len()))]
    pub fn fit(dataset: &Dataset, candidates: &AttributeSet) -> Result<Self, ForestError> {
        if dataset.is_empty() {
            return Err(ForestError::EmptyDataset);
        }
        let n_attributes = dataset.n_attributes();
        candidates.validate(n_attributes)?;

        let records: Vec<&Record> = dataset.records().iter().collect();
        let mut arena: Vec<Node> = Vec::new();
        let root = build_tree(&records, candidates, &mut arena);

        debug!(
            root_index = root.index(),
            n_nodes = arena.len(),
            "decision tree built"
        );

        Ok(Self {
            nodes: arena,
            n_attributes,
        })
    }

    /// Induce a tree that may split on every attribute of `dataset`.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::EmptyDataset`] when `dataset` has no records.
    pub fn fit_all(dataset: &Dataset) -> Result<Self, ForestError> {
        Self::fit(dataset, &AttributeSet::all(dataset.n_attributes()))
    }

    /// Predict the class label for one record's attribute values.
    ///
    /// Walks from the root following the child for each tested value. When
    /// a split node has no child for the record's value (it never saw that
    /// value in training), the node's fallback label is returned: the
    /// majority class of the training records that reached it.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::FieldCountMismatch`] when
    /// `attributes.len()` differs from the training attribute count.
    pub fn classify<S: AsRef<str>>(&self, attributes: &[S]) -> Result<&str, ForestError> {
        if attributes.len() != self.n_attributes {
            return Err(ForestError::FieldCountMismatch {
                expected: self.n_attributes,
                got: attributes.len(),
            });
        }
        Ok(self.descend(attributes))
    }

    /// Classify a full record, label field included.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::FieldCountMismatch`] when the record's
    /// attribute count differs from the training attribute count.
    pub fn classify_record(&self, record: &Record) -> Result<&str, ForestError> {
        self.classify(record.attributes())
    }

    fn descend<S: AsRef<str>>(&self, attributes: &[S]) -> &str {
        let mut idx = 0usize;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { label, .. } => return label,
                Node::Split {
                    attribute,
                    children,
                    fallback,
                    ..
                } => match children.get(attributes[attribute.index()].as_ref()) {
                    Some(child) => idx = child.index(),
                    None => return fallback,
                },
            }
        }
    }

    /// Information-gain importance of each attribute column.
    ///
    /// Each split contributes `n_samples / n_root * information_gain` to its
    /// attribute; totals are normalized to sum to 1.0. All zeros when the
    /// tree is a single leaf or every split gained nothing.
    #[must_use]
    pub fn attribute_importances(&self) -> Vec<f64> {
        let mut totals = vec![0.0f64; self.n_attributes];
        let n_root = self.nodes.first().map_or(0, Node::n_samples).max(1) as f64;
        for node in &self.nodes {
            if let Node::Split {
                attribute,
                n_samples,
                information_gain,
                ..
            } = node
            {
                totals[attribute.index()] += *n_samples as f64 / n_root * information_gain;
            }
        }
        let sum: f64 = totals.iter().sum();
        if sum > 0.0 {
            totals.iter_mut().for_each(|v| *v /= sum);
        }
        totals
    }

    /// Return the root node.
    #[must_use]
    pub fn root(&self) -> &Node {
        &self.nodes[0]
    }

    /// Return the attribute tested at the root, or `None` for a lone leaf.
    #[must_use]
    pub fn root_attribute(&self) -> Option<AttributeIndex> {
        match self.root() {
            Node::Split { attribute, .. } => Some(*attribute),
            Node::Leaf { .. } => None,
        }
    }

    /// Return the node at `index`, if it exists.
    #[must_use]
    pub fn node(&self, index: NodeIndex) -> Option<&Node> {
        self.nodes.get(index.index())
    }

    /// Return the number of attribute columns the tree was trained on.
    #[must_use]
    pub fn n_attributes(&self) -> usize {
        self.n_attributes
    }

    /// Return the total number of nodes in the tree (both splits and leaves).
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Return the number of leaf nodes.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Return the maximum depth of the tree. A lone root leaf has depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut max_depth = 0usize;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((node_idx, d)) = stack.pop() {
            match &self.nodes[node_idx] {
                Node::Leaf { .. } => max_depth = max_depth.max(d),
                Node::Split { children, .. } => {
                    stack.extend(children.values().map(|c| (c.index(), d + 1)));
                }
            }
        }
        max_depth
    }

    /// Check the arena invariants a decoded tree must satisfy before it is
    /// walked: a root exists, every split tests an attribute below
    /// `n_attributes`, and every child index points forward into the arena.
    ///
    /// Forward-only children rule out cycles, so `descend` and `depth`
    /// terminate and never index out of bounds.
    pub(crate) fn check_structure(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            let Node::Split {
                attribute,
                children,
                ..
            } = node
            else {
                continue;
            };
            if attribute.index() >= self.n_attributes {
                return Err(format!(
                    "node {idx} splits on attribute {} of {}",
                    attribute.index(),
                    self.n_attributes
                ));
            }
            if children.is_empty() {
                return Err(format!("split node {idx} has no children"));
            }
            if let Some(child) = children
                .values()
                .find(|c| c.index() <= idx || c.index() >= self.nodes.len())
            {
                return Err(format!(
                    "node {idx} has child {} outside {}..{}",
                    child.index(),
                    idx + 1,
                    self.nodes.len()
                ));
            }
        }
        Ok(())
    }
}

/// Recursively build the arena; returns the index of the node just created.
fn build_tree(records: &[&Record], candidates: &AttributeSet, arena: &mut Vec<Node>) -> NodeIndex {
    let n_samples = records.len();
    let entropy = entropy_of(records);
    let counts = label_counts(records);
    // Non-empty by construction: every group handed down holds a record.
    let majority = majority_label(&counts).unwrap_or_default().to_string();

    let push_leaf = |arena: &mut Vec<Node>, label: String| -> NodeIndex {
        let idx = arena.len();
        arena.push(Node::Leaf {
            label,
            entropy,
            n_samples,
        });
        NodeIndex::new(idx)
    };

    if entropy.is_pure() {
        return push_leaf(arena, records[0].label().to_string());
    }

    let Some(best) = best_attribute(records, entropy, candidates) else {
        return push_leaf(arena, majority);
    };

    // Reserve this node's slot so it precedes its children, then overwrite.
    let node_idx = arena.len();
    arena.push(Node::Leaf {
        label: String::new(),
        entropy,
        n_samples,
    });

    let remaining = candidates.without(best.attribute);
    let mut children = BTreeMap::new();
    for (value, group) in partition(records, best.attribute) {
        let child = build_tree(&group, &remaining, arena);
        children.insert(value.to_string(), child);
    }

    arena[node_idx] = Node::Split {
        attribute: best.attribute,
        children,
        fallback: majority,
        entropy,
        n_samples,
        information_gain: best.gain,
    };

    NodeIndex::new(node_idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ds(rows: &[&[&str]]) -> Dataset {
        Dataset::from_rows(rows.iter().map(|r| r.iter().copied())).unwrap()
    }

    /// Two binary attributes, label = A AND B, each combination twice.
    fn and_dataset() -> Dataset {
        ds(&[
            &["0", "0", "0"],
            &["0", "1", "0"],
            &["1", "0", "0"],
            &["1", "1", "1"],
            &["0", "0", "0"],
            &["0", "1", "0"],
            &["1", "0", "0"],
            &["1", "1", "1"],
        ])
    }

    #[test]
    fn empty_dataset_error() {
        let err = DecisionTree::fit_all(&Dataset::default()).unwrap_err();
        assert!(matches!(err, ForestError::EmptyDataset));
    }

    #[test]
    fn out_of_range_candidate_error() {
        let data = ds(&[&["a", "yes"]]);
        let candidates: AttributeSet = [AttributeIndex::new(3)].into_iter().collect();
        let err = DecisionTree::fit(&data, &candidates).unwrap_err();
        assert!(matches!(err, ForestError::AttributeOutOfRange { attribute: 3, .. }));
    }

    #[test]
    fn pure_dataset_single_leaf() {
        let data = ds(&[&["a", "x", "yes"], &["b", "y", "yes"], &["c", "z", "yes"]]);
        let tree = DecisionTree::fit_all(&data).unwrap();
        assert_eq!(tree.n_nodes(), 1);
        assert!(matches!(tree.root(), Node::Leaf { label, .. } if label == "yes"));
        assert_eq!(tree.classify(&["q", "r"]).unwrap(), "yes");
    }

    #[test]
    fn determining_attribute_splits_root_into_leaves() {
        // Attribute 0 determines the label; attribute 1 is noise.
        let data = ds(&[
            &["X", "p", "yes"],
            &["X", "q", "yes"],
            &["Y", "p", "no"],
            &["Y", "q", "no"],
        ]);
        let tree = DecisionTree::fit_all(&data).unwrap();
        assert_eq!(tree.root_attribute(), Some(AttributeIndex::new(0)));
        let Node::Split { children, .. } = tree.root() else {
            panic!("root should split");
        };
        assert_eq!(children.len(), 2);
        for child in children.values() {
            assert!(tree.node(*child).unwrap().is_leaf());
        }
        assert_eq!(tree.depth(), 1);
    }

    #[test]
    fn exhausted_attributes_vote_majority() {
        // No candidates: majority over [no, yes, yes].
        let data = ds(&[&["a", "no"], &["a", "yes"], &["b", "yes"]]);
        let tree = DecisionTree::fit(&data, &AttributeSet::default()).unwrap();
        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.classify(&["a"]).unwrap(), "yes");
    }

    #[test]
    fn exhausted_attributes_tie_goes_to_smallest_label() {
        let data = ds(&[&["a", "zebra"], &["a", "apple"], &["a", "zebra"], &["a", "apple"]]);
        let tree = DecisionTree::fit(&data, &AttributeSet::default()).unwrap();
        assert_eq!(tree.classify(&["a"]).unwrap(), "apple");
    }

    #[test]
    fn contradictory_records_end_in_majority_leaf() {
        // Same attributes, different labels: splits exhaust, majority wins.
        let data = ds(&[&["a", "b", "no"], &["a", "b", "yes"], &["a", "b", "yes"]]);
        let tree = DecisionTree::fit_all(&data).unwrap();
        assert_eq!(tree.classify(&["a", "b"]).unwrap(), "yes");
        assert!(tree.depth() <= 2);
    }

    #[test]
    fn and_function_reclassified_perfectly() {
        let data = and_dataset();
        let tree = DecisionTree::fit_all(&data).unwrap();
        for record in &data {
            assert_eq!(tree.classify_record(record).unwrap(), record.label());
        }
    }

    #[test]
    fn training_records_reproduce_their_labels() {
        let data = ds(&[
            &["sunny", "hot", "high", "weak", "no"],
            &["sunny", "hot", "high", "strong", "no"],
            &["overcast", "hot", "high", "weak", "yes"],
            &["rain", "mild", "high", "weak", "yes"],
            &["rain", "cool", "normal", "weak", "yes"],
            &["rain", "cool", "normal", "strong", "no"],
            &["overcast", "cool", "normal", "strong", "yes"],
            &["sunny", "mild", "high", "weak", "no"],
            &["sunny", "cool", "normal", "weak", "yes"],
            &["rain", "mild", "normal", "weak", "yes"],
            &["sunny", "mild", "normal", "strong", "yes"],
            &["overcast", "mild", "high", "strong", "yes"],
            &["overcast", "hot", "normal", "weak", "yes"],
            &["rain", "mild", "high", "strong", "no"],
        ]);
        let tree = DecisionTree::fit_all(&data).unwrap();
        // Outlook has the highest gain on this classic table.
        assert_eq!(tree.root_attribute(), Some(AttributeIndex::new(0)));
        for record in &data {
            assert_eq!(tree.classify_record(record).unwrap(), record.label());
        }
    }

    #[test]
    fn unseen_value_falls_back_to_node_majority() {
        let data = ds(&[&["X", "yes"], &["X", "yes"], &["Y", "no"]]);
        let tree = DecisionTree::fit_all(&data).unwrap();
        let Node::Split { fallback, .. } = tree.root() else {
            panic!("root should split");
        };
        assert_eq!(fallback, "yes");
        assert_eq!(tree.classify(&["never-seen"]).unwrap(), "yes");
    }

    #[test]
    fn prediction_width_mismatch() {
        let tree = DecisionTree::fit_all(&and_dataset()).unwrap();
        let err = tree.classify(&["1"]).unwrap_err();
        assert!(matches!(
            err,
            ForestError::FieldCountMismatch { expected: 2, got: 1 }
        ));
    }

    #[test]
    fn split_attribute_not_reused_below() {
        let tree = DecisionTree::fit_all(&and_dataset()).unwrap();
        let Node::Split { attribute, children, .. } = tree.root() else {
            panic!("root should split");
        };
        for child in children.values() {
            if let Some(Node::Split { attribute: below, .. }) = tree.node(*child) {
                assert_ne!(below, attribute);
            }
        }
        assert!(tree.depth() <= 2);
    }

    #[test]
    fn importances_sum_to_one() {
        let tree = DecisionTree::fit_all(&and_dataset()).unwrap();
        let importances = tree.attribute_importances();
        let sum: f64 = importances.iter().sum();
        assert!((sum - 1.0).abs() < 1e-10, "sum = {sum}");
    }

    #[test]
    fn leaf_only_tree_has_zero_importances() {
        let data = ds(&[&["a", "yes"], &["b", "yes"]]);
        let tree = DecisionTree::fit_all(&data).unwrap();
        assert_eq!(tree.attribute_importances(), vec![0.0]);
        assert_eq!(tree.n_leaves(), 1);
        assert_eq!(tree.depth(), 0);
    }
}
