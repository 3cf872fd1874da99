//! Verdict Types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::logic::category::ThreatCategory;
use crate::logic::ensemble::Prediction;

/// Whether any model was able to contribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionStatus {
    Available,
    /// Every prediction abstained (or none were produced)
    Unavailable,
}

/// Single resolved outcome for one navigation attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// Winning category, `None` when nothing matched
    pub category: Option<ThreatCategory>,
    /// Precedence rank of `category` (0 = none)
    pub severity: u8,
    /// Prediction that decided the verdict
    pub winner: Option<Prediction>,
    /// Every prediction considered, abstentions included
    pub predictions: Vec<Prediction>,
    pub detection: DetectionStatus,
    /// Audit trail, in evaluation order
    pub reasons: Vec<String>,
    pub resolved_at: DateTime<Utc>,
}

impl Verdict {
    pub fn is_threat(&self) -> bool {
        self.category.is_some()
    }

    pub fn category_label(&self) -> &'static str {
        self.category.map(|c| c.as_str()).unwrap_or("none")
    }

    /// Confidence of the deciding prediction
    pub fn confidence(&self) -> Option<f32> {
        self.winner.as_ref().map(|p| p.confidence)
    }

    pub fn contributing(&self) -> impl Iterator<Item = &Prediction> {
        self.predictions.iter().filter(|p| !p.abstained)
    }

    pub fn abstentions(&self) -> usize {
        self.predictions.iter().filter(|p| p.abstained).count()
    }

    /// Convert to log entry
    pub fn to_log_entry(&self) -> serde_json::Value {
        serde_json::json!({
            "timestamp": self.resolved_at.to_rfc3339(),
            "category": self.category_label(),
            "severity": self.severity,
            "detection": self.detection,
            "winner": self.winner.as_ref().map(|p| serde_json::json!({
                "model": p.source(),
                "confidence": p.confidence,
            })),
            "predictions": self.predictions,
            "abstentions": self.abstentions(),
            "reasons": self.reasons,
        })
    }
}
