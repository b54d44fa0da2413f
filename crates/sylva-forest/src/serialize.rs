//! Model persistence via bincode.

use std::path::Path;

use tracing::{debug, info, instrument};

use crate::error::ForestError;
use crate::forest::RandomForest;

/// Current binary format version.
const FORMAT_VERSION: u32 = 1;

/// Versioned envelope around the serialized forest.
#[derive(serde::Serialize, serde::Deserialize)]
struct ModelEnvelope<F> {
    format_version: u32,
    n_trees: usize,
    n_attributes: usize,
    attribute_names: Vec<String>,
    forest: F,
}

impl RandomForest {
    /// Save the forest to a binary file.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ForestError::SerializeModel`] | bincode encoding failed |
    /// | [`ForestError::WriteModel`] | file write failed |
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ForestError> {
        let path = path.as_ref();
        let envelope = ModelEnvelope {
            format_version: FORMAT_VERSION,
            n_trees: self.trees.len(),
            n_attributes: self.n_attributes,
            attribute_names: self.attribute_names.clone(),
            forest: self,
        };

        let bytes =
            bincode::serialize(&envelope).map_err(|source| ForestError::SerializeModel { source })?;
        std::fs::write(path, &bytes).map_err(|source| ForestError::WriteModel {
            path: path.to_path_buf(),
            source,
        })?;

        info!(size_bytes = bytes.len(), n_trees = self.trees.len(), "model saved");
        Ok(())
    }

    /// Load a forest saved with [`RandomForest::save`].
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ForestError::ReadModel`] | file read failed |
    /// | [`ForestError::DeserializeModel`] | bincode decoding failed |
    /// | [`ForestError::IncompatibleModelVersion`] | format version mismatch |
    /// | [`ForestError::InvalidTreeCount`] | the forest holds no trees |
    /// | [`ForestError::CorruptModel`] | envelope and forest disagree, or a tree is malformed |
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ForestError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| ForestError::ReadModel {
            path: path.to_path_buf(),
            source,
        })?;

        let envelope: ModelEnvelope<RandomForest> =
            bincode::deserialize(&bytes).map_err(|source| ForestError::DeserializeModel {
                path: path.to_path_buf(),
                source,
            })?;

        if envelope.format_version != FORMAT_VERSION {
            return Err(ForestError::IncompatibleModelVersion {
                expected: FORMAT_VERSION,
                found: envelope.format_version,
                path: path.to_path_buf(),
            });
        }
        if envelope.forest.trees.is_empty() {
            return Err(ForestError::InvalidTreeCount { n_trees: 0 });
        }

        check_envelope(&envelope).map_err(|reason| ForestError::CorruptModel {
            path: path.to_path_buf(),
            reason,
        })?;

        debug!(
            n_trees = envelope.n_trees,
            n_attributes = envelope.n_attributes,
            "model loaded"
        );
        Ok(envelope.forest)
    }
}

/// Cross-check the envelope header against the decoded forest and each
/// tree's arena.
fn check_envelope(envelope: &ModelEnvelope<RandomForest>) -> Result<(), String> {
    let forest = &envelope.forest;
    if envelope.n_trees != forest.trees.len() {
        return Err(format!(
            "header declares {} trees, forest holds {}",
            envelope.n_trees,
            forest.trees.len()
        ));
    }
    if envelope.n_attributes != forest.n_attributes {
        return Err(format!(
            "header declares {} attributes, forest has {}",
            envelope.n_attributes, forest.n_attributes
        ));
    }
    if envelope.attribute_names != forest.attribute_names
        || forest.attribute_names.len() != forest.n_attributes
    {
        return Err("attribute names do not match the attribute count".to_string());
    }
    for (i, tree) in forest.trees.iter().enumerate() {
        if tree.n_attributes != forest.n_attributes {
            return Err(format!(
                "tree {i} has {} attributes, forest has {}",
                tree.n_attributes, forest.n_attributes
            ));
        }
        tree.check_structure()
            .map_err(|reason| format!("tree {i}: {reason}"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::config::ForestConfig;
    use crate::dataset::Dataset;

    fn train_simple_model() -> RandomForest {
        let data = Dataset::from_rows([
            ["red", "small", "cherry"],
            ["red", "large", "apple"],
            ["green", "large", "apple"],
            ["yellow", "small", "lemon"],
            ["yellow", "large", "banana"],
            ["red", "small", "cherry"],
        ])
        .unwrap();
        let names = vec!["colour".to_string(), "size".to_string()];
        ForestConfig::new(5)
            .unwrap()
            .fit(&data, &names)
            .unwrap()
            .into_forest()
    }

    #[test]
    fn round_trip_identical_predictions() {
        let dir = TempDir::new().unwrap();
        let model_path = dir.path().join("model.bin");
        let forest = train_simple_model();
        forest.save(&model_path).unwrap();
        let loaded = RandomForest::load(&model_path).unwrap();

        assert_eq!(loaded.attribute_names(), ["colour", "size"]);
        assert_eq!(loaded.n_trees(), 5);
        for query in [["red", "small"], ["yellow", "large"], ["purple", "tiny"]] {
            assert_eq!(
                forest.votes(&query).unwrap(),
                loaded.votes(&query).unwrap(),
                "votes differ for {query:?}"
            );
        }
    }

    #[test]
    fn load_nonexistent_file_error() {
        let dir = TempDir::new().unwrap();
        let err = RandomForest::load(dir.path().join("missing.bin")).unwrap_err();
        assert!(matches!(err, ForestError::ReadModel { .. }));
    }

    #[test]
    fn load_corrupt_file_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("corrupt.bin");
        std::fs::write(&path, b"not a model").unwrap();
        let err = RandomForest::load(&path).unwrap_err();
        assert!(matches!(err, ForestError::DeserializeModel { .. }));
    }

    #[test]
    fn version_mismatch_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("future.bin");
        let forest = train_simple_model();
        let envelope = ModelEnvelope {
            format_version: FORMAT_VERSION + 1,
            n_trees: forest.n_trees(),
            n_attributes: forest.n_attributes(),
            attribute_names: forest.attribute_names().to_vec(),
            forest: &forest,
        };
        std::fs::write(&path, bincode::serialize(&envelope).unwrap()).unwrap();
        let err = RandomForest::load(&path).unwrap_err();
        assert!(matches!(
            err,
            ForestError::IncompatibleModelVersion { expected: 1, found: 2, .. }
        ));
    }

    fn write_envelope(path: &Path, forest: &RandomForest, n_trees: usize) {
        let envelope = ModelEnvelope {
            format_version: FORMAT_VERSION,
            n_trees,
            n_attributes: forest.n_attributes,
            attribute_names: forest.attribute_names.clone(),
            forest,
        };
        std::fs::write(path, bincode::serialize(&envelope).unwrap()).unwrap();
    }

    #[test]
    fn empty_forest_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.bin");
        let mut forest = train_simple_model();
        forest.trees.clear();
        write_envelope(&path, &forest, 0);
        let err = RandomForest::load(&path).unwrap_err();
        assert!(matches!(err, ForestError::InvalidTreeCount { n_trees: 0 }));
    }

    #[test]
    fn header_tree_count_mismatch_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("header.bin");
        let forest = train_simple_model();
        write_envelope(&path, &forest, forest.n_trees() + 1);
        let err = RandomForest::load(&path).unwrap_err();
        assert!(matches!(err, ForestError::CorruptModel { .. }));
    }

    #[test]
    fn out_of_range_split_attribute_is_corrupt() {
        use std::collections::BTreeMap;

        use crate::node::{AttributeIndex, Entropy, Node, NodeIndex};

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("attr.bin");
        let mut forest = train_simple_model();
        let tree = &mut forest.trees[0];
        let leaf = tree.nodes.len();
        tree.nodes.push(Node::Leaf {
            label: "apple".to_string(),
            entropy: Entropy::new(0.0),
            n_samples: 1,
        });
        // Attribute 9 does not exist; walking this node would index past
        // the record's fields.
        tree.nodes[0] = Node::Split {
            attribute: AttributeIndex::new(9),
            children: BTreeMap::from([("red".to_string(), NodeIndex::new(leaf))]),
            fallback: "apple".to_string(),
            entropy: Entropy::new(1.0),
            n_samples: 6,
            information_gain: 0.5,
        };
        write_envelope(&path, &forest, forest.n_trees());
        let err = RandomForest::load(&path).unwrap_err();
        match err {
            ForestError::CorruptModel { reason, .. } => {
                assert!(reason.contains("attribute 9"), "{reason}");
            }
            other => panic!("expected CorruptModel, got {other:?}"),
        }
    }

    #[test]
    fn cyclic_child_index_is_corrupt() {
        use std::collections::BTreeMap;

        use crate::node::{AttributeIndex, Entropy, Node, NodeIndex};

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cycle.bin");
        let mut forest = train_simple_model();
        forest.trees[0].nodes[0] = Node::Split {
            attribute: AttributeIndex::new(0),
            children: BTreeMap::from([("red".to_string(), NodeIndex::new(0))]),
            fallback: "apple".to_string(),
            entropy: Entropy::new(1.0),
            n_samples: 6,
            information_gain: 0.5,
        };
        write_envelope(&path, &forest, forest.n_trees());
        let err = RandomForest::load(&path).unwrap_err();
        assert!(matches!(err, ForestError::CorruptModel { .. }));
    }
}
