//! Ensemble Module - per-category predictions
//!
//! ## Structure
//! - `types`: `Prediction`, `AbstainReason`, `EnsembleStats`
//! - `classifier`: `EnsembleClassifier`

pub mod types;
pub mod classifier;


pub use types::{AbstainReason, EnsembleStats, Prediction};
pub use classifier::EnsembleClassifier;
