//! Precedence Policy
//!
//! Which category wins when several match. The default order
//! (ransomware > phishing > trojan) is an assumed severity ranking, so it
//! stays configuration rather than code.

use serde::{Deserialize, Serialize};

use crate::logic::category::ThreatCategory;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PolicyError {
    #[error("Precedence order is missing category '{0}'")]
    MissingCategory(ThreatCategory),

    #[error("Category '{0}' appears more than once in precedence order")]
    DuplicateCategory(ThreatCategory),

    #[error("Unknown category '{0}' in precedence order")]
    UnknownCategory(String),

    #[error("min_confidence {0} outside [0, 1]")]
    MinConfidenceOutOfRange(f32),
}

/// Category precedence and match threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrecedencePolicy {
    /// Highest severity first
    pub order: Vec<ThreatCategory>,
    /// Matches below this confidence are treated as no-match
    pub min_confidence: f32,
}

impl Default for PrecedencePolicy {
    fn default() -> Self {
        Self {
            order: ThreatCategory::ALL.to_vec(),
            min_confidence: 0.0,
        }
    }
}

impl PrecedencePolicy {
    pub fn with_order(order: Vec<ThreatCategory>) -> Result<Self, PolicyError> {
        let policy = Self { order, ..Default::default() };
        policy.validate()?;
        Ok(policy)
    }

    /// Parse a comma list such as `phishing,ransomware,trojan`
    pub fn parse_order(value: &str) -> Result<Self, PolicyError> {
        let order = value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| ThreatCategory::parse(s).ok_or_else(|| PolicyError::UnknownCategory(s.to_string())))
            .collect::<Result<Vec<_>, _>>()?;
        Self::with_order(order)
    }

    pub fn validate(&self) -> Result<(), PolicyError> {
        for (i, category) in self.order.iter().enumerate() {
            if self.order[..i].contains(category) {
                return Err(PolicyError::DuplicateCategory(*category));
            }
        }
        for category in ThreatCategory::ALL {
            if !self.order.contains(&category) {
                return Err(PolicyError::MissingCategory(category));
            }
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(PolicyError::MinConfidenceOutOfRange(self.min_confidence));
        }
        Ok(())
    }

    /// Severity rank: highest-precedence category = `order.len()`, none = 0
    pub fn rank(&self, category: Option<ThreatCategory>) -> u8 {
        category
            .and_then(|c| self.order.iter().position(|o| *o == c))
            .map(|pos| (self.order.len() - pos) as u8)
            .unwrap_or(0)
    }
}
