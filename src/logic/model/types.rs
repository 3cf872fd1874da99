//! Model Types
//!
//! The single polymorphic capability every model back-end implements.
//! No loading logic here - only the trait and its data structures.

use serde::{Deserialize, Serialize};

// ============================================================================
// ALGORITHM KIND
// ============================================================================

/// Algorithm family a model artifact was trained with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AlgorithmKind {
    #[serde(rename = "random_forest")]
    RandomForest,
    #[serde(rename = "lightgbm")]
    LightGbm,
    #[serde(rename = "xgboost")]
    XgBoost,
}

impl AlgorithmKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlgorithmKind::RandomForest => "random_forest",
            AlgorithmKind::LightGbm => "lightgbm",
            AlgorithmKind::XgBoost => "xgboost",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AlgorithmKind::RandomForest => "Random Forest",
            AlgorithmKind::LightGbm => "LightGBM",
            AlgorithmKind::XgBoost => "XGBoost",
        }
    }

    /// Gradient boosted families sum leaf margins instead of averaging votes
    pub fn is_boosted(&self) -> bool {
        matches!(self, AlgorithmKind::LightGbm | AlgorithmKind::XgBoost)
    }

    /// Tree split rule: XGBoost sends `x < t` left, the others `x <= t`
    pub fn goes_left(&self, value: f32, threshold: f32) -> bool {
        match self {
            AlgorithmKind::XgBoost => value < threshold,
            AlgorithmKind::RandomForest | AlgorithmKind::LightGbm => value <= threshold,
        }
    }
}

impl std::fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// RAW SCORE
// ============================================================================

/// Output of one model invocation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawScore {
    /// Match / no-match
    pub label: bool,
    /// Probability of the positive class, if the model exposes one
    pub probability: Option<f32>,
}

impl RawScore {
    pub fn from_probability(probability: f32, threshold: f32) -> Self {
        Self {
            label: probability >= threshold,
            probability: Some(probability),
        }
    }

    pub fn hard_label(label: bool) -> Self {
        Self { label, probability: None }
    }

    /// Probability of the predicted label; hard-label models report 1.0
    pub fn confidence(&self) -> f32 {
        match self.probability {
            Some(p) if self.label => p.clamp(0.0, 1.0),
            Some(p) => (1.0 - p).clamp(0.0, 1.0),
            None => 1.0,
        }
    }
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InferenceError {
    #[error("Expected {expected} inputs, got {actual}")]
    InputLength { expected: usize, actual: usize },

    #[error("Non-finite model output")]
    NonFiniteOutput,

    #[error("Runtime error: {0}")]
    Runtime(String),
}

// ============================================================================
// THREAT MODEL TRAIT
// ============================================================================

/// Loaded, inference-ready binary classifier.
///
/// Implementations are read-only during inference and may be shared across
/// threads.
pub trait ThreatModel: Send + Sync {
    fn algorithm(&self) -> AlgorithmKind;

    fn input_len(&self) -> usize;

    /// Back-end name for status reporting ("tree_ensemble", "onnx")
    fn backend(&self) -> &'static str;

    fn predict(&self, input: &[f32]) -> Result<RawScore, InferenceError>;
}
