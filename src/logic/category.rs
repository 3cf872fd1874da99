//! Threat Category
//!
//! The three behavioral signatures a page can be matched against.

use serde::{Deserialize, Serialize};

/// Threat category a model is trained to detect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatCategory {
    Ransomware,
    Phishing,
    Trojan,
}

impl ThreatCategory {
    /// All categories, in default precedence order
    pub const ALL: [ThreatCategory; 3] = [
        ThreatCategory::Ransomware,
        ThreatCategory::Phishing,
        ThreatCategory::Trojan,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatCategory::Ransomware => "ransomware",
            ThreatCategory::Phishing => "phishing",
            ThreatCategory::Trojan => "trojan",
        }
    }

    /// Human readable label for warning prompts
    pub fn display_name(&self) -> &'static str {
        match self {
            ThreatCategory::Ransomware => "Ransomware",
            ThreatCategory::Phishing => "Phishing",
            ThreatCategory::Trojan => "Trojan",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ransomware" => Some(ThreatCategory::Ransomware),
            "phishing" => Some(ThreatCategory::Phishing),
            "trojan" => Some(ThreatCategory::Trojan),
            _ => None,
        }
    }
}

impl std::fmt::Display for ThreatCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
