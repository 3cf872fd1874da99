//! Model Module - ML Inference Back-ends
//!
//! Every artifact decodes to a `Box<dyn ThreatModel>`, so the ensemble never
//! needs to know which algorithm family or runtime is behind a handle.
//!
//! ## Structure
//! - `types`: `ThreatModel` trait, `AlgorithmKind`, `RawScore`
//! - `forest`: native random forest / gradient boosted trees
//! - `onnx`: ONNX Runtime sessions
//! - `artifact`: manifest, checksum, format detection

pub mod types;
pub mod forest;
pub mod onnx;
pub mod artifact;

#[cfg(test)]
pub(crate) mod testing;

// Re-export common types
pub use types::{AlgorithmKind, InferenceError, RawScore, ThreatModel};
pub use artifact::{load_artifact, LoadedArtifact, ModelLoadError, ModelManifest, SUPPORTED_FORMAT_VERSION};
pub use forest::{DecisionTree, TreeEnsembleModel, TreeEnsembleSpec, TreeNode};
pub use onnx::OnnxModel;
