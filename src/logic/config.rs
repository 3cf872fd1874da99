//! Engine Configuration
//!
//! Which artifacts to load, category precedence, and gate behavior.
//! Read from a JSON file or built from defaults plus environment overrides.

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

use crate::constants;
use crate::logic::category::ThreatCategory;
use crate::logic::gate::GateConfig;
use crate::logic::model::AlgorithmKind;
use crate::logic::registry::ModelKey;
use crate::logic::verdict::{PolicyError, PrecedencePolicy};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid precedence policy: {0}")]
    Policy(#[from] PolicyError),
}

/// One artifact to load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub category: ThreatCategory,
    pub algorithm: AlgorithmKind,
    pub path: PathBuf,
}

impl ModelSpec {
    pub fn key(&self) -> ModelKey {
        ModelKey::new(self.category, self.algorithm)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Load order is registration order (tie-breaks)
    #[serde(default)]
    pub models: Vec<ModelSpec>,
    #[serde(default)]
    pub precedence: PrecedencePolicy,
    #[serde(default)]
    pub gate: GateConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::with_model_dir(&constants::get_model_dir())
    }
}

impl EngineConfig {
    /// Default configuration reading artifacts from `dir`
    pub fn with_model_dir(dir: &Path) -> Self {
        Self {
            models: Self::default_models(dir),
            precedence: PrecedencePolicy::default(),
            gate: GateConfig::default(),
        }
    }

    /// The three shipped artifacts, one per category
    pub fn default_models(dir: &Path) -> Vec<ModelSpec> {
        vec![
            ModelSpec {
                category: ThreatCategory::Ransomware,
                algorithm: AlgorithmKind::RandomForest,
                path: dir.join("random_forest_model.onnx"),
            },
            ModelSpec {
                category: ThreatCategory::Phishing,
                algorithm: AlgorithmKind::LightGbm,
                path: dir.join("LGBM_model.json"),
            },
            ModelSpec {
                category: ThreatCategory::Trojan,
                algorithm: AlgorithmKind::XgBoost,
                path: dir.join("xgBoost_model.json"),
            },
        ]
    }

    /// Load from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        log::info!("Loaded engine config from {} ({} models)", path.display(), config.models.len());
        Ok(config)
    }

    /// Defaults with environment overrides applied
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::with_model_dir(&constants::get_model_dir());
        config.gate.decision_timeout_secs = constants::get_decision_timeout_secs();
        if let Some(order) = constants::get_precedence_override() {
            config.precedence = PrecedencePolicy {
                min_confidence: config.precedence.min_confidence,
                ..PrecedencePolicy::parse_order(&order)?
            };
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.precedence.validate()?;
        Ok(())
    }

    /// Save to a JSON file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
