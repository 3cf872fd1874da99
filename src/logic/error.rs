//! Crate-level error type

use crate::logic::config::ConfigError;
use crate::logic::features::FeatureError;
use crate::logic::gate::GateError;
use crate::logic::model::{InferenceError, ModelLoadError};
use crate::logic::verdict::PolicyError;

pub type Result<T> = std::result::Result<T, ThreatError>;

#[derive(Debug, thiserror::Error)]
pub enum ThreatError {
    #[error(transparent)]
    Feature(#[from] FeatureError),

    #[error(transparent)]
    ModelLoad(#[from] ModelLoadError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    Gate(#[from] GateError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
