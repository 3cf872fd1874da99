//! Tree Ensemble Back-end
//!
//! Native scoring for random forests and gradient boosted trees exported
//! to JSON. Random forest leaves hold class-1 probabilities and are
//! averaged; boosted leaves hold margins that are summed and squashed.

use serde::{Deserialize, Serialize};

use super::types::{AlgorithmKind, InferenceError, RawScore, ThreatModel};

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// One node of a decision tree (flat array encoding)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f32,
        left: usize,
        right: usize,
    },
    Leaf {
        leaf: f32,
    },
}

/// Decision tree; node 0 is the root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Walk from the root to a leaf.
    ///
    /// Children always have a higher index than their parent (checked by
    /// `validate`), so the walk terminates within `nodes.len()` steps.
    fn evaluate(&self, algorithm: AlgorithmKind, input: &[f32]) -> f32 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                TreeNode::Leaf { leaf } => return *leaf,
                TreeNode::Split { feature, threshold, left, right } => {
                    index = if algorithm.goes_left(input[*feature], *threshold) {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    fn validate(&self, algorithm: AlgorithmKind, input_len: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }

        for (index, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Leaf { leaf } => {
                    if !leaf.is_finite() {
                        return Err(format!("node {}: non-finite leaf", index));
                    }
                    if !algorithm.is_boosted() && !(0.0..=1.0).contains(leaf) {
                        return Err(format!("node {}: probability leaf {} outside [0, 1]", index, leaf));
                    }
                }
                TreeNode::Split { feature, threshold, left, right } => {
                    if *feature >= input_len {
                        return Err(format!(
                            "node {}: feature {} out of range (input_len {})",
                            index, feature, input_len
                        ));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {}: non-finite threshold", index));
                    }
                    for child in [left, right] {
                        if *child <= index || *child >= self.nodes.len() {
                            return Err(format!("node {}: invalid child index {}", index, child));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// Serialized ensemble payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsembleSpec {
    /// Initial margin for boosted ensembles
    #[serde(default)]
    pub base_score: f32,
    pub trees: Vec<DecisionTree>,
}

// ============================================================================
// MODEL
// ============================================================================

/// Validated tree ensemble, ready for inference
#[derive(Debug, Clone)]
pub struct TreeEnsembleModel {
    algorithm: AlgorithmKind,
    input_len: usize,
    threshold: f32,
    ensemble: TreeEnsembleSpec,
}

impl TreeEnsembleModel {
    pub fn new(
        algorithm: AlgorithmKind,
        input_len: usize,
        threshold: f32,
        ensemble: TreeEnsembleSpec,
    ) -> Result<Self, String> {
        if ensemble.trees.is_empty() {
            return Err("ensemble has no trees".to_string());
        }
        if !ensemble.base_score.is_finite() {
            return Err("non-finite base_score".to_string());
        }
        for (i, tree) in ensemble.trees.iter().enumerate() {
            tree.validate(algorithm, input_len)
                .map_err(|e| format!("tree {}: {}", i, e))?;
        }

        Ok(Self { algorithm, input_len, threshold, ensemble })
    }

    pub fn tree_count(&self) -> usize {
        self.ensemble.trees.len()
    }

    /// Probability of the positive class
    fn probability(&self, input: &[f32]) -> f32 {
        let leaves = self.ensemble.trees.iter().map(|t| t.evaluate(self.algorithm, input));

        if self.algorithm.is_boosted() {
            let margin = self.ensemble.base_score + leaves.sum::<f32>();
            sigmoid(margin)
        } else {
            leaves.sum::<f32>() / self.ensemble.trees.len() as f32
        }
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

impl ThreatModel for TreeEnsembleModel {
    fn algorithm(&self) -> AlgorithmKind {
        self.algorithm
    }

    fn input_len(&self) -> usize {
        self.input_len
    }

    fn backend(&self) -> &'static str {
        "tree_ensemble"
    }

    fn predict(&self, input: &[f32]) -> Result<RawScore, InferenceError> {
        if input.len() != self.input_len {
            return Err(InferenceError::InputLength {
                expected: self.input_len,
                actual: input.len(),
            });
        }

        let probability = self.probability(input);
        if !probability.is_finite() {
            return Err(InferenceError::NonFiniteOutput);
        }

        Ok(RawScore::from_probability(probability, self.threshold))
    }
}

// ============================================================================
// TESTS
// ============================================================================
