//! Ensemble Types - predictions and abstentions

use serde::{Deserialize, Serialize};

use crate::logic::category::ThreatCategory;
use crate::logic::model::AlgorithmKind;
use crate::logic::registry::NotReady;

// ============================================================================
// ABSTAIN REASON
// ============================================================================

/// Why a model could not contribute. An outcome, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum AbstainReason {
    /// Load still in flight
    NotReady,
    /// Nothing registered under the key
    NotLoaded,
    LoadFailed { detail: String },
    ShapeMismatch { expected: usize, actual: usize },
    LayoutMismatch { detail: String },
    SchemaMismatch { detail: String },
    InferenceFailed { detail: String },
}

impl AbstainReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            AbstainReason::NotReady => "not_ready",
            AbstainReason::NotLoaded => "not_loaded",
            AbstainReason::LoadFailed { .. } => "load_failed",
            AbstainReason::ShapeMismatch { .. } => "shape_mismatch",
            AbstainReason::LayoutMismatch { .. } => "layout_mismatch",
            AbstainReason::SchemaMismatch { .. } => "schema_mismatch",
            AbstainReason::InferenceFailed { .. } => "inference_failed",
        }
    }
}

impl From<NotReady> for AbstainReason {
    fn from(value: NotReady) -> Self {
        match value {
            NotReady::Loading => AbstainReason::NotReady,
            NotReady::Unknown => AbstainReason::NotLoaded,
            NotReady::Failed(detail) => AbstainReason::LoadFailed { detail },
        }
    }
}

impl std::fmt::Display for AbstainReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AbstainReason::ShapeMismatch { expected, actual } => {
                write!(f, "shape_mismatch (expected {}, got {})", expected, actual)
            }
            AbstainReason::LoadFailed { detail }
            | AbstainReason::LayoutMismatch { detail }
            | AbstainReason::SchemaMismatch { detail }
            | AbstainReason::InferenceFailed { detail } => write!(f, "{} ({})", self.as_str(), detail),
            _ => write!(f, "{}", self.as_str()),
        }
    }
}

// ============================================================================
// PREDICTION
// ============================================================================

/// One model's output for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub category: ThreatCategory,
    pub algorithm: AlgorithmKind,
    /// Match / no-match
    pub label: bool,
    /// In [0, 1]; 0 when abstained
    pub confidence: f32,
    pub abstained: bool,
    pub abstain_reason: Option<AbstainReason>,
    /// Raw positive-class probability, if the model exposes one
    pub probability: Option<f32>,
    /// Handle generation that produced this prediction
    pub model_generation: Option<u64>,
}

impl Prediction {
    pub fn scored(
        category: ThreatCategory,
        algorithm: AlgorithmKind,
        label: bool,
        confidence: f32,
        probability: Option<f32>,
    ) -> Self {
        Self {
            category,
            algorithm,
            label,
            confidence: clamp_unit(confidence),
            abstained: false,
            abstain_reason: None,
            probability,
            model_generation: None,
        }
    }

    pub fn abstain(category: ThreatCategory, algorithm: AlgorithmKind, reason: AbstainReason) -> Self {
        Self {
            category,
            algorithm,
            label: false,
            confidence: 0.0,
            abstained: true,
            abstain_reason: Some(reason),
            probability: None,
            model_generation: None,
        }
    }

    pub(crate) fn with_generation(mut self, generation: u64) -> Self {
        self.model_generation = Some(generation);
        self
    }

    /// Non-abstaining positive label
    pub fn is_match(&self) -> bool {
        !self.abstained && self.label
    }

    pub fn source(&self) -> String {
        format!("{}/{}", self.category, self.algorithm)
    }
}

fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

// ============================================================================
// STATISTICS
// ============================================================================

/// Snapshot of classifier counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EnsembleStats {
    pub inferences: u64,
    pub abstentions: u64,
    pub avg_latency_us: f64,
}
