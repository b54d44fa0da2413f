//! ID3 decision trees and bagged random forests over categorical data.
//!
//! Records are rows of string tokens whose last field is the class label.
//! Trees split on the attribute with the highest information gain and
//! never reuse an attribute along a path. The forest trains each tree on a
//! bootstrap sample with a random attribute subspace (in parallel via
//! rayon) and classifies by majority vote. Also provides out-of-bag
//! scoring, attribute importances, holdout evaluation, and model
//! serialization.

mod config;
mod confusion;
mod dataset;
mod error;
mod eval;
mod forest;
mod importance;
mod node;
mod oob;
mod predict;
mod result;
mod sample;
mod serialize;
mod split;
mod tree;

pub use config::{ForestConfig, MaxFeatures, OobMode};
pub use confusion::{ClassMetrics, ConfusionMatrix};
pub use dataset::{Dataset, Record};
pub use error::ForestError;
pub use eval::{Evaluation, HoldoutSplit, Prediction, evaluate};
pub use forest::RandomForest;
pub use importance::RankedAttribute;
pub use node::{AttributeIndex, AttributeSet, Entropy, Node, NodeIndex};
pub use oob::OobScore;
pub use predict::Votes;
pub use result::{ForestResult, TrainingMetadata};
pub use sample::{bootstrap_sample, sample_attributes};
pub use split::{entropy, information_gain};
pub use tree::DecisionTree;
