//! Logic Module - Classification Pipeline & Engines
//!
//! ## Architecture
//! - `features/` - raw bag -> versioned feature vector
//! - `model/` - model back-ends (tree ensembles, ONNX) and artifacts
//! - `registry/` - model handle lifecycle
//! - `ensemble/` - per-category predictions, abstentions
//! - `verdict/` - precedence resolution
//! - `gate/` - per-navigation decision checkpoint
//! - `engine/` - end-to-end `ThreatEngine`

pub mod category;
pub mod config;
pub mod error;

pub mod features;
pub mod model;
pub mod registry;
pub mod ensemble;
pub mod verdict;
pub mod gate;
pub mod engine;
