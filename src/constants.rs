//! Central Configuration Constants
//!
//! Single source of truth for configuration defaults and the environment
//! variables that override them.

use std::path::PathBuf;

/// How long the warning waits for the user (seconds)
pub const DEFAULT_DECISION_TIMEOUT_SECS: u64 = 120;

/// Directory name under the platform data dir
pub const MODEL_DIR_NAME: &str = "web-threat-guard";

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "Web Threat Guard";

// Environment variables
pub const ENV_MODEL_DIR: &str = "WEB_THREAT_MODEL_DIR";
pub const ENV_DECISION_TIMEOUT: &str = "WEB_THREAT_DECISION_TIMEOUT_SECS";
pub const ENV_PRECEDENCE: &str = "WEB_THREAT_PRECEDENCE";

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Model artifact directory from environment, else `<data_local_dir>/web-threat-guard/models`
pub fn get_model_dir() -> PathBuf {
    std::env::var(ENV_MODEL_DIR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(MODEL_DIR_NAME)
                .join("models")
        })
}

/// Decision timeout from environment or default
pub fn get_decision_timeout_secs() -> u64 {
    std::env::var(ENV_DECISION_TIMEOUT)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_DECISION_TIMEOUT_SECS)
}

/// Precedence override, e.g. `phishing,ransomware,trojan`
pub fn get_precedence_override() -> Option<String> {
    std::env::var(ENV_PRECEDENCE)
        .ok()
        .filter(|s| !s.trim().is_empty())
}
