//! Gate Configuration

use std::time::Duration;
use serde::{Deserialize, Serialize};

use crate::constants;

/// Decision gate configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// How long to wait for the user before blocking
    pub decision_timeout_secs: u64,

    /// Route "detection unavailable" verdicts through the warning too
    pub warn_when_unavailable: bool,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            decision_timeout_secs: constants::DEFAULT_DECISION_TIMEOUT_SECS,
            warn_when_unavailable: true,
        }
    }
}

impl GateConfig {
    /// Short timeout, warn when no model could run
    pub fn strict() -> Self {
        Self {
            decision_timeout_secs: 30,
            warn_when_unavailable: true,
        }
    }

    /// Allow silently when no model could run
    pub fn permissive_when_unavailable() -> Self {
        Self {
            warn_when_unavailable: false,
            ..Default::default()
        }
    }

    pub fn decision_timeout(&self) -> Duration {
        Duration::from_secs(self.decision_timeout_secs)
    }
}
