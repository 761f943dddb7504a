//! Gradient-boosted tree inference
//!
//! Binary classifier made of a sequence of regression trees. Each tree
//! contributes a log-odds correction; the final score is the initial
//! log-odds plus all tree outputs scaled by the learning rate, mapped to a
//! probability with the logistic function.
//!
//! Trees use the flat parallel-array layout of fitted scikit-learn trees:
//! a node is a leaf when its left child is `-1`, and samples whose feature
//! value is `<= threshold` descend to the left child.

use super::Classifier;
use crate::error::{ArtifactKind, InferenceError, StartupError};
use crate::models::{
    ClassProbabilities, FeatureImportances, FeatureVector, Label, NUM_FEATURES,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Child index marking a leaf node
const LEAF: i64 = -1;

/// On-disk form of one regression tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeArtifact {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<f64>,
}

/// On-disk form of a fitted gradient boosting classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierArtifact {
    pub learning_rate: f64,
    pub init_log_odds: f64,
    pub feature_importances: Vec<f64>,
    pub trees: Vec<TreeArtifact>,
}

#[derive(Debug, Clone, Copy)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// A validated regression tree
#[derive(Debug, Clone)]
pub struct GbmTree {
    nodes: Vec<Node>,
}

impl GbmTree {
    /// Build from parallel arrays.
    ///
    /// Children must point forward in the array, which rules out cycles.
    pub fn from_artifact(tree: TreeArtifact) -> Result<Self, String> {
        let n = tree.children_left.len();
        if n == 0 {
            return Err("tree has no nodes".into());
        }
        if tree.children_right.len() != n
            || tree.feature.len() != n
            || tree.threshold.len() != n
            || tree.value.len() != n
        {
            return Err("inconsistent array lengths".into());
        }

        let mut nodes = Vec::with_capacity(n);
        for i in 0..n {
            let (left, right) = (tree.children_left[i], tree.children_right[i]);
            if left == LEAF {
                let value = tree.value[i];
                if !value.is_finite() {
                    return Err(format!("leaf {} has non-finite value", i));
                }
                nodes.push(Node::Leaf { value });
                continue;
            }

            let child = |c: i64| -> Result<usize, String> {
                usize::try_from(c)
                    .ok()
                    .filter(|&c| c > i && c < n)
                    .ok_or_else(|| format!("node {} has invalid child index {}", i, c))
            };
            let feature = usize::try_from(tree.feature[i])
                .ok()
                .filter(|&f| f < NUM_FEATURES)
                .ok_or_else(|| format!("node {} splits on unknown feature {}", i, tree.feature[i]))?;
            let threshold = tree.threshold[i];
            if !threshold.is_finite() {
                return Err(format!("node {} has non-finite threshold", i));
            }
            nodes.push(Node::Split {
                feature,
                threshold,
                left: child(left)?,
                right: child(right)?,
            });
        }
        Ok(Self { nodes })
    }

    /// Leaf value reached by a sample.
    ///
    /// Feature values are rounded to `f32` before each comparison, the
    /// precision the fitted thresholds were learned against.
    pub fn predict(&self, features: &[f64; NUM_FEATURES]) -> f64 {
        let mut idx = 0usize;
        loop {
            match self.nodes[idx] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = features[feature] as f32 as f64;
                    idx = if value <= threshold { left } else { right };
                }
            }
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Binary gradient boosting classifier
#[derive(Debug, Clone)]
pub struct GbmClassifier {
    trees: Vec<GbmTree>,
    learning_rate: f64,
    init_log_odds: f64,
    importances: FeatureImportances,
}

impl GbmClassifier {
    pub fn new(
        trees: Vec<GbmTree>,
        learning_rate: f64,
        init_log_odds: f64,
        importances: FeatureImportances,
    ) -> Result<Self, StartupError> {
        if trees.is_empty() {
            return Err(StartupError::invalid(ArtifactKind::Classifier, "ensemble has no trees"));
        }
        if !learning_rate.is_finite() || learning_rate <= 0.0 {
            return Err(StartupError::invalid(
                ArtifactKind::Classifier,
                format!("learning rate must be positive, got {}", learning_rate),
            ));
        }
        if !init_log_odds.is_finite() {
            return Err(StartupError::invalid(
                ArtifactKind::Classifier,
                "initial log-odds is not finite",
            ));
        }
        Ok(Self {
            trees,
            learning_rate,
            init_log_odds,
            importances,
        })
    }

    pub fn from_artifact(artifact: ClassifierArtifact) -> Result<Self, StartupError> {
        let len = artifact.feature_importances.len();
        let importances: [f64; NUM_FEATURES] =
            artifact.feature_importances.try_into().map_err(|_| {
                StartupError::invalid(
                    ArtifactKind::Classifier,
                    format!("feature_importances has {} values, expected {}", len, NUM_FEATURES),
                )
            })?;
        let importances = FeatureImportances::new(importances)
            .map_err(|reason| StartupError::invalid(ArtifactKind::Classifier, reason))?;

        let trees = artifact
            .trees
            .into_iter()
            .enumerate()
            .map(|(i, t)| {
                GbmTree::from_artifact(t).map_err(|reason| {
                    StartupError::invalid(ArtifactKind::Classifier, format!("tree {}: {}", i, reason))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(trees, artifact.learning_rate, artifact.init_log_odds, importances)
    }

    /// Raw log-odds of the potable class
    pub fn decision_function(&self, features: &FeatureVector) -> f64 {
        let x = features.as_array();
        let boost: f64 = self.trees.iter().map(|t| t.predict(x)).sum();
        self.init_log_odds + self.learning_rate * boost
    }

    /// Number of boosting rounds
    pub fn n_estimators(&self) -> usize {
        self.trees.len()
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }
}

impl Classifier for GbmClassifier {
    fn predict(&self, features: &FeatureVector) -> Result<Label, InferenceError> {
        Ok(self.predict_probability(features)?.argmax())
    }

    fn predict_probability(
        &self,
        features: &FeatureVector,
    ) -> Result<ClassProbabilities, InferenceError> {
        let score = self.decision_function(features);
        if !score.is_finite() {
            return Err(InferenceError::Classifier(format!(
                "decision function produced {}",
                score
            )));
        }
        debug!(score, trees = self.trees.len(), "Evaluated boosted ensemble");
        Ok(ClassProbabilities::from_potable(sigmoid(score)))
    }

    fn feature_importances(&self) -> &FeatureImportances {
        &self.importances
    }
}
