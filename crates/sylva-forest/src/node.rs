use std::collections::BTreeMap;
use std::fmt;

use crate::error::ForestError;

/// Zero-based attribute column index (the label column is never addressed).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    serde::Serialize, serde::Deserialize,
)]
pub struct AttributeIndex(usize);

impl AttributeIndex {
    /// Create an attribute index from a zero-based column position.
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based column position.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for AttributeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index into a `Vec<Node>` arena, identifying a specific node in a decision tree.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    serde::Serialize, serde::Deserialize,
)]
pub struct NodeIndex(usize);

impl NodeIndex {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based arena index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Shannon entropy of a label distribution, in bits.
#[derive(
    Debug, Clone, Copy, PartialEq, PartialOrd,
    serde::Serialize, serde::Deserialize,
)]
pub struct Entropy(f64);

impl Entropy {
    pub(crate) fn new(value: f64) -> Self {
        Self(value)
    }

    /// Return the raw entropy in bits.
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    /// Return `true` when every label in the measured set was identical.
    #[must_use]
    pub fn is_pure(self) -> bool {
        self.0 == 0.0
    }
}

impl fmt::Display for Entropy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}

/// Candidate split attributes, kept sorted ascending without duplicates.
///
/// Ascending order is the canonical iteration order for split selection,
/// so equal gains resolve to the lowest index.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AttributeSet(Vec<AttributeIndex>);

impl AttributeSet {
    /// Every attribute index in `0..n_attributes`.
    #[must_use]
    pub fn all(n_attributes: usize) -> Self {
        Self((0..n_attributes).map(AttributeIndex::new).collect())
    }

    /// Return a copy of this set without `attribute`.
    #[must_use]
    pub fn without(&self, attribute: AttributeIndex) -> Self {
        Self(self.0.iter().copied().filter(|&a| a != attribute).collect())
    }

    /// Check that every member addresses one of `n_attributes` columns.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::AttributeOutOfRange`] for the first member
    /// that is `>= n_attributes`.
    pub fn validate(&self, n_attributes: usize) -> Result<(), ForestError> {
        match self.0.iter().find(|a| a.index() >= n_attributes) {
            Some(a) => Err(ForestError::AttributeOutOfRange {
                attribute: a.index(),
                n_attributes,
            }),
            None => Ok(()),
        }
    }

    /// Iterate over the members in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = AttributeIndex> + '_ {
        self.0.iter().copied()
    }

    /// Return `true` if `attribute` is a member.
    #[must_use]
    pub fn contains(&self, attribute: AttributeIndex) -> bool {
        self.0.binary_search(&attribute).is_ok()
    }

    /// Return the number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return `true` when no candidate attributes remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<AttributeIndex> for AttributeSet {
    fn from_iter<I: IntoIterator<Item = AttributeIndex>>(iter: I) -> Self {
        let mut members: Vec<AttributeIndex> = iter.into_iter().collect();
        members.sort_unstable();
        members.dedup();
        Self(members)
    }
}

/// A node in a decision tree arena.
///
/// Trees are stored as `Vec<Node>` where children are referenced by
/// [`NodeIndex`] rather than pointers, so a tree is trivially serializable
/// and cannot contain cycles.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum Node {
    /// An interior node with one child per attribute value seen in training.
    Split {
        /// Attribute tested at this node.
        attribute: AttributeIndex,
        /// Child for each observed value of `attribute`. Never empty.
        children: BTreeMap<String, NodeIndex>,
        /// Majority class of the training records that reached this node,
        /// predicted when a record carries a value with no child.
        fallback: String,
        /// Label entropy of the records that reached this node.
        entropy: Entropy,
        /// Number of training records that reached this node.
        n_samples: usize,
        /// Information gain of splitting on `attribute` here.
        information_gain: f64,
    },
    /// A terminal node.
    Leaf {
        /// Predicted class label.
        label: String,
        /// Label entropy of the records in this leaf.
        entropy: Entropy,
        /// Number of training records in this leaf.
        n_samples: usize,
    },
}

impl Node {
    /// Return the label entropy at this node.
    #[must_use]
    pub fn entropy(&self) -> Entropy {
        match self {
            Node::Split { entropy, .. } | Node::Leaf { entropy, .. } => *entropy,
        }
    }

    /// Return the number of training records that reached this node.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        match self {
            Node::Split { n_samples, .. } | Node::Leaf { n_samples, .. } => *n_samples,
        }
    }

    /// Return `true` if this node is a leaf.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }
}
