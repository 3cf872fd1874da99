//! Verdict Resolver
//!
//! Decision logic only - no type definitions.
//! Input: every Prediction for one navigation attempt + PrecedencePolicy
//! Output: Verdict

use chrono::Utc;

use crate::logic::category::ThreatCategory;
use crate::logic::ensemble::Prediction;
use super::policy::{PolicyError, PrecedencePolicy};
use super::types::{DetectionStatus, Verdict};

// ============================================================================
// MAIN RESOLVE FUNCTION
// ============================================================================

/// Resolve with the default precedence (ransomware > phishing > trojan)
pub fn resolve(predictions: Vec<Prediction>) -> Verdict {
    resolve_with_policy(predictions, &PrecedencePolicy::default())
}

/// Resolve with an explicit precedence policy.
///
/// Categories are walked in precedence order and the first one with a
/// qualifying match wins. Within it, the highest confidence wins; ties go
/// to the earliest prediction, which is the first-registered model.
/// An invalid policy falls back to the default order so no category is
/// ever skipped.
pub fn resolve_with_policy(predictions: Vec<Prediction>, policy: &PrecedencePolicy) -> Verdict {
    let mut reasons = Vec::new();

    let fallback;
    let policy = match policy.validate() {
        Ok(()) => policy,
        Err(e) => {
            log::warn!("Invalid precedence policy ({}), using default order", e);
            reasons.push(format!("Invalid precedence policy ({}): default order used", e));
            fallback = PrecedencePolicy::default();
            &fallback
        }
    };

    for p in predictions.iter().filter(|p| p.abstained) {
        let reason = p.abstain_reason
            .as_ref()
            .map(|r| r.to_string())
            .unwrap_or_else(|| "unspecified".to_string());
        reasons.push(format!("{} abstained: {}", p.source(), reason));
    }

    let detection = if predictions.iter().any(|p| !p.abstained) {
        DetectionStatus::Available
    } else {
        reasons.push("No model produced a prediction - detection unavailable".to_string());
        DetectionStatus::Unavailable
    };

    let mut winner: Option<&Prediction> = None;
    for category in &policy.order {
        let Some(best) = best_match(&predictions, *category, policy.min_confidence, &mut reasons) else {
            continue;
        };
        match winner {
            None => {
                reasons.push(format!(
                    "{} matched with confidence {:.3}",
                    best.source(), best.confidence
                ));
                winner = Some(best);
            }
            Some(w) => reasons.push(format!(
                "{} matched but is outranked by {}",
                best.category, w.category
            )),
        }
    }

    let winner = winner.cloned();
    let category = winner.as_ref().map(|p| p.category);
    if category.is_none() && detection == DetectionStatus::Available {
        reasons.push("No category matched".to_string());
    }

    let verdict = Verdict {
        category,
        severity: policy.rank(category),
        winner,
        predictions,
        detection,
        reasons,
        resolved_at: Utc::now(),
    };

    log::info!(
        "Verdict: {} (severity {}, {} predictions, {} abstained)",
        verdict.category_label(),
        verdict.severity,
        verdict.predictions.len(),
        verdict.abstentions()
    );
    verdict
}

/// Highest-confidence qualifying match of one category
fn best_match<'a>(
    predictions: &'a [Prediction],
    category: ThreatCategory,
    min_confidence: f32,
    reasons: &mut Vec<String>,
) -> Option<&'a Prediction> {
    let mut best: Option<&Prediction> = None;

    for p in predictions.iter().filter(|p| p.category == category && p.is_match()) {
        if p.confidence < min_confidence {
            reasons.push(format!(
                "{} match ignored: confidence {:.3} below {:.3}",
                p.source(), p.confidence, min_confidence
            ));
            continue;
        }
        match best {
            None => best = Some(p),
            Some(b) if p.confidence > b.confidence => best = Some(p),
            Some(b) if p.confidence == b.confidence => reasons.push(format!(
                "Tie at {:.3} between {} and {}: first registered wins",
                p.confidence, b.source(), p.source()
            )),
            Some(_) => {}
        }
    }
    best
}

// ============================================================================
// RESOLVER WITH VALIDATED POLICY
// ============================================================================

/// Holds a validated policy for repeated use
#[derive(Debug, Clone, Default)]
pub struct VerdictResolver {
    policy: PrecedencePolicy,
}

impl VerdictResolver {
    pub fn new(policy: PrecedencePolicy) -> Result<Self, PolicyError> {
        policy.validate()?;
        Ok(Self { policy })
    }

    pub fn policy(&self) -> &PrecedencePolicy {
        &self.policy
    }

    pub fn resolve(&self, predictions: Vec<Prediction>) -> Verdict {
        resolve_with_policy(predictions, &self.policy)
    }
}
