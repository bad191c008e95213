use crate::error::{ModelError, StageError};
use crate::pipeline::types::{ClassificationResult, FEATURE_LEN, FeatureVector};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Trained gesture classifier. Must be a pure function of its input.
pub trait GestureClassifier: Send + Sync {
    fn classify(&self, features: &FeatureVector) -> Result<ClassificationResult, StageError>;
    fn class_count(&self) -> usize;
    fn name(&self) -> &'static str;
}

/// Serialized classifier artifact, selected by its `kind` field.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierArtifact {
    RandomForest(RandomForest),
    LinearSoftmax(LinearSoftmax),
}

impl ClassifierArtifact {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        if !path.exists() {
            return Err(ModelError::MissingArtifact(path.to_path_buf()));
        }
        let raw = fs::read_to_string(path).map_err(|e| ModelError::Load {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let artifact: ClassifierArtifact =
            serde_json::from_str(&raw).map_err(|e| ModelError::Load {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        artifact.validate()?;
        Ok(artifact)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        match self {
            ClassifierArtifact::RandomForest(forest) => forest.validate(),
            ClassifierArtifact::LinearSoftmax(linear) => linear.validate(),
        }
    }
}

impl GestureClassifier for ClassifierArtifact {
    fn classify(&self, features: &FeatureVector) -> Result<ClassificationResult, StageError> {
        match self {
            ClassifierArtifact::RandomForest(forest) => forest.classify(features),
            ClassifierArtifact::LinearSoftmax(linear) => linear.classify(features),
        }
    }

    fn class_count(&self) -> usize {
        match self {
            ClassifierArtifact::RandomForest(forest) => forest.n_classes,
            ClassifierArtifact::LinearSoftmax(linear) => linear.bias.len(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            ClassifierArtifact::RandomForest(_) => "random-forest",
            ClassifierArtifact::LinearSoftmax(_) => "linear-softmax",
        }
    }
}

/// Tree ensemble. Class probabilities are the mean of the per-tree leaf distributions.
#[derive(Debug, Clone, Deserialize)]
pub struct RandomForest {
    pub n_classes: usize,
    pub trees: Vec<DecisionTree>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    /// Go `left` when `features[feature] <= threshold`, else `right`
    Split {
        feature: usize,
        threshold: f32,
        left: usize,
        right: usize,
    },
    Leaf {
        value: Vec<f32>,
    },
}

impl RandomForest {
    fn validate(&self) -> Result<(), ModelError> {
        if self.n_classes == 0 {
            return Err(ModelError::InvalidArtifact(
                "random forest has no classes".to_string(),
            ));
        }
        if self.trees.is_empty() {
            return Err(ModelError::InvalidArtifact(
                "random forest has no trees".to_string(),
            ));
        }
        for (t, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(ModelError::InvalidArtifact(format!("tree {t} is empty")));
            }
            for (n, node) in tree.nodes.iter().enumerate() {
                match node {
                    TreeNode::Split {
                        feature,
                        left,
                        right,
                        ..
                    } => {
                        if *feature >= FEATURE_LEN
                            || *left >= tree.nodes.len()
                            || *right >= tree.nodes.len()
                        {
                            return Err(ModelError::InvalidArtifact(format!(
                                "tree {t} node {n} points outside the tree or feature range"
                            )));
                        }
                    }
                    TreeNode::Leaf { value } => {
                        if value.len() != self.n_classes {
                            return Err(ModelError::InvalidArtifact(format!(
                                "tree {t} leaf {n} has {} values, expected {}",
                                value.len(),
                                self.n_classes
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn classify(&self, features: &FeatureVector) -> Result<ClassificationResult, StageError> {
        let x = checked_input(features)?;
        let mut probabilities = vec![0.0f32; self.n_classes];

        for tree in &self.trees {
            let leaf = tree.leaf_for(x)?;
            let total: f32 = leaf.iter().sum();
            if total <= 0.0 || !total.is_finite() {
                return Err(StageError::ClassifierFault(
                    "leaf with an empty class distribution".to_string(),
                ));
            }
            for (acc, v) in probabilities.iter_mut().zip(leaf) {
                *acc += v / total;
            }
        }

        let trees = self.trees.len() as f32;
        probabilities.iter_mut().for_each(|p| *p /= trees);
        ClassificationResult::from_probabilities(probabilities)
    }
}

impl DecisionTree {
    fn leaf_for(&self, x: &[f32]) -> Result<&[f32], StageError> {
        let mut idx = 0;
        // Each step visits a new node in a well formed tree
        for _ in 0..=self.nodes.len() {
            match self.nodes.get(idx) {
                Some(TreeNode::Leaf { value }) => return Ok(value),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let v = x.get(*feature).copied().ok_or_else(|| {
                        StageError::ClassifierFault(format!("feature {feature} out of range"))
                    })?;
                    idx = if v <= *threshold { *left } else { *right };
                }
                None => {
                    return Err(StageError::ClassifierFault(format!(
                        "node {idx} does not exist"
                    )));
                }
            }
        }
        Err(StageError::ClassifierFault("cycle in decision tree".to_string()))
    }
}

/// Multinomial logistic model: `softmax(W x + b)`.
#[derive(Debug, Clone, Deserialize)]
pub struct LinearSoftmax {
    /// One row of `FEATURE_LEN` weights per class
    pub weights: Vec<Vec<f32>>,
    pub bias: Vec<f32>,
}

impl LinearSoftmax {
    fn validate(&self) -> Result<(), ModelError> {
        if self.bias.is_empty() || self.weights.len() != self.bias.len() {
            return Err(ModelError::InvalidArtifact(format!(
                "linear model has {} weight rows and {} biases",
                self.weights.len(),
                self.bias.len()
            )));
        }
        if let Some(row) = self.weights.iter().find(|row| row.len() != FEATURE_LEN) {
            return Err(ModelError::InvalidArtifact(format!(
                "weight row has {} entries, expected {FEATURE_LEN}",
                row.len()
            )));
        }
        Ok(())
    }

    fn classify(&self, features: &FeatureVector) -> Result<ClassificationResult, StageError> {
        let x = checked_input(features)?;
        let logits: Vec<f32> = self
            .weights
            .iter()
            .zip(&self.bias)
            .map(|(row, b)| row.iter().zip(x).map(|(w, v)| w * v).sum::<f32>() + b)
            .collect();

        let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let exps: Vec<f32> = logits.iter().map(|l| (l - max).exp()).collect();
        let total: f32 = exps.iter().sum();
        ClassificationResult::from_probabilities(exps.into_iter().map(|e| e / total).collect())
    }
}

fn checked_input(features: &FeatureVector) -> Result<&[f32], StageError> {
    let x = features.as_slice();
    if x.len() != FEATURE_LEN {
        return Err(StageError::FeatureLengthMismatch {
            expected: FEATURE_LEN,
            actual: x.len(),
        });
    }
    if x.iter().any(|v| !v.is_finite()) {
        return Err(StageError::ClassifierFault(
            "non-finite feature value".to_string(),
        ));
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn features(fill: f32) -> FeatureVector {
        FeatureVector::try_from(vec![fill; FEATURE_LEN]).unwrap()
    }

    fn stump_forest() -> ClassifierArtifact {
        serde_json::from_value(json!({
            "kind": "random_forest",
            "n_classes": 3,
            "trees": [
                { "nodes": [
                    { "feature": 0, "threshold": 0.5, "left": 1, "right": 2 },
                    { "value": [8.0, 2.0, 0.0] },
                    { "value": [0.0, 1.0, 9.0] }
                ]},
                { "nodes": [
                    { "feature": 5, "threshold": 0.5, "left": 1, "right": 2 },
                    { "value": [1.0, 0.0, 0.0] },
                    { "value": [0.0, 0.0, 1.0] }
                ]}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn forest_averages_normalized_leaves() {
        let forest = stump_forest();
        forest.validate().unwrap();
        assert_eq!(forest.class_count(), 3);

        let low = forest.classify(&features(0.1)).unwrap();
        assert_eq!(low.class_index(), 0);
        assert!((low.confidence() - 0.9).abs() < 1e-6);

        let high = forest.classify(&features(0.9)).unwrap();
        assert_eq!(high.class_index(), 2);
        assert!((high.confidence() - 0.95).abs() < 1e-6);
        assert!((high.probabilities().iter().sum::<f32>() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn classification_is_deterministic() {
        let forest = stump_forest();
        let input = features(0.3);
        let first = forest.classify(&input).unwrap();
        let second = forest.classify(&input).unwrap();
        assert_eq!(first, second);
        assert!(first
            .probabilities()
            .iter()
            .zip(second.probabilities())
            .all(|(a, b)| a.to_bits() == b.to_bits()));
    }

    #[test]
    fn linear_softmax_picks_the_largest_logit() {
        let mut weights = vec![vec![0.0; FEATURE_LEN]; 2];
        weights[1][0] = 10.0;
        let model = ClassifierArtifact::LinearSoftmax(LinearSoftmax {
            weights,
            bias: vec![0.0, 0.0],
        });
        model.validate().unwrap();

        let result = model.classify(&features(1.0)).unwrap();
        assert_eq!(result.class_index(), 1);
        assert!(result.confidence() > 0.99);
    }

    #[test]
    fn rejects_malformed_artifacts() {
        let cyclic: ClassifierArtifact = serde_json::from_value(json!({
            "kind": "random_forest",
            "n_classes": 2,
            "trees": [{ "nodes": [
                { "feature": 0, "threshold": 0.5, "left": 0, "right": 0 }
            ]}]
        }))
        .unwrap();
        // Structurally valid indices, but the walk never reaches a leaf
        assert!(cyclic.validate().is_ok());
        assert!(matches!(
            cyclic.classify(&features(0.1)),
            Err(StageError::ClassifierFault(_))
        ));

        let bad_leaf: ClassifierArtifact = serde_json::from_value(json!({
            "kind": "random_forest",
            "n_classes": 2,
            "trees": [{ "nodes": [{ "value": [1.0] }] }]
        }))
        .unwrap();
        assert!(bad_leaf.validate().is_err());

        let short_rows = ClassifierArtifact::LinearSoftmax(LinearSoftmax {
            weights: vec![vec![0.0; 3]],
            bias: vec![0.0],
        });
        assert!(short_rows.validate().is_err());
    }

    #[test]
    fn non_finite_features_are_a_fault() {
        let mut values = vec![0.1; FEATURE_LEN];
        values[7] = f32::NAN;
        let input = FeatureVector::try_from(values).unwrap();
        assert!(matches!(
            stump_forest().classify(&input),
            Err(StageError::ClassifierFault(_))
        ));
    }

    #[test]
    fn missing_artifact_is_reported() {
        let err = ClassifierArtifact::load(Path::new("no/such/model.json")).unwrap_err();
        assert!(matches!(err, ModelError::MissingArtifact(_)));
    }
}
