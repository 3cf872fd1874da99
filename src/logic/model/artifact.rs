//! Model Artifacts - on-disk formats and loading
//!
//! Two artifact formats are understood:
//! - Tree ensemble JSON: manifest embedded next to the trees
//! - ONNX: manifest in a sidecar `<artifact>.json`
//!
//! An optional `<artifact>.sha256` (sha256sum format) is verified before
//! any decoding happens. ONNX sidecar manifests may also pin `sha256`.

use std::path::{Path, PathBuf};
use std::fs;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::logic::category::ThreatCategory;
use crate::logic::features::layout;
use super::forest::{TreeEnsembleModel, TreeEnsembleSpec};
use super::onnx::OnnxModel;
use super::types::{AlgorithmKind, ThreatModel};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Manifest format version this build understands
pub const SUPPORTED_FORMAT_VERSION: u32 = 1;

/// Default decision threshold on the positive-class probability
pub const DEFAULT_THRESHOLD: f32 = 0.5;

const TREE_ENSEMBLE_FORMAT: &str = "tree_ensemble";

// ============================================================================
// MANIFEST
// ============================================================================

fn default_threshold() -> f32 {
    DEFAULT_THRESHOLD
}

/// Describes what a model artifact expects and produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelManifest {
    pub format_version: u32,
    #[serde(default)]
    pub name: Option<String>,
    pub category: ThreatCategory,
    pub algorithm: AlgorithmKind,
    pub input_len: usize,
    pub layout_version: u8,
    #[serde(default)]
    pub layout_hash: Option<u32>,
    #[serde(default = "default_threshold")]
    pub threshold: f32,
    /// Digest of the model bytes; only meaningful in sidecar manifests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

impl ModelManifest {
    fn validate(&self) -> Result<(), ModelLoadError> {
        if self.format_version != SUPPORTED_FORMAT_VERSION {
            return Err(ModelLoadError::UnsupportedVersion {
                found: self.format_version,
                supported: SUPPORTED_FORMAT_VERSION,
            });
        }
        if self.input_len == 0 {
            return Err(ModelLoadError::InvalidModel("input_len must be > 0".to_string()));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ModelLoadError::InvalidModel(format!(
                "threshold {} outside [0, 1]",
                self.threshold
            )));
        }

        match layout::layout(self.category, self.layout_version) {
            None => {
                return Err(ModelLoadError::InvalidModel(format!(
                    "unknown {} layout v{}",
                    self.category, self.layout_version
                )));
            }
            // Shape/hash disagreements are tolerated here; inference abstains on them
            Some(l) => {
                if l.len() != self.input_len {
                    log::warn!(
                        "Model expects {} inputs but {} layout v{} has {}",
                        self.input_len, self.category, l.version, l.len()
                    );
                }
                if let Some(hash) = self.layout_hash {
                    if hash != l.hash() {
                        log::warn!(
                            "Model layout hash {:08x} differs from {} v{} ({:08x})",
                            hash, self.category, l.version, l.hash()
                        );
                    }
                }
            }
        }
        Ok(())
    }
}

/// Tree ensemble artifact file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeEnsembleArtifact {
    pub format: String,
    pub manifest: ModelManifest,
    #[serde(flatten)]
    pub ensemble: TreeEnsembleSpec,
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    #[error("Model artifact not found: {0}")]
    NotFound(PathBuf),

    #[error("IO error reading artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed artifact: {0}")]
    Malformed(String),

    #[error("Unsupported artifact format: {0}")]
    UnsupportedFormat(String),

    #[error("Unsupported format version {found} (supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("Artifact is for {found}, requested {requested}")]
    CategoryMismatch {
        requested: ThreatCategory,
        found: ThreatCategory,
    },

    #[error("Invalid model: {0}")]
    InvalidModel(String),

    #[error("ONNX runtime error: {0}")]
    Runtime(String),

    #[error("Load task failed: {0}")]
    TaskFailed(String),
}

impl From<serde_json::Error> for ModelLoadError {
    fn from(err: serde_json::Error) -> Self {
        ModelLoadError::Malformed(err.to_string())
    }
}

// ============================================================================
// LOADING
// ============================================================================

/// Fully decoded artifact
pub struct LoadedArtifact {
    pub manifest: ModelManifest,
    pub model: Box<dyn ThreatModel>,
    pub source: PathBuf,
    pub sha256: String,
}

impl std::fmt::Debug for LoadedArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedArtifact")
            .field("manifest", &self.manifest)
            .field("backend", &self.model.backend())
            .field("source", &self.source)
            .field("sha256", &self.sha256)
            .finish()
    }
}

/// Sidecar manifest path for ONNX artifacts
pub fn manifest_path(artifact: &Path) -> PathBuf {
    PathBuf::from(format!("{}.json", artifact.display()))
}

/// Sidecar checksum path
pub fn checksum_path(artifact: &Path) -> PathBuf {
    PathBuf::from(format!("{}.sha256", artifact.display()))
}

/// Hex SHA-256 of artifact bytes
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Read, verify and decode a model artifact
pub fn load_artifact(path: &Path) -> Result<LoadedArtifact, ModelLoadError> {
    log::info!("Loading model artifact from: {}", path.display());

    if !path.exists() {
        return Err(ModelLoadError::NotFound(path.to_path_buf()));
    }

    let bytes = fs::read(path)?;
    let digest = sha256_hex(&bytes);
    verify_checksum(path, &digest)?;

    let (manifest, model) = match detect_format(path, &bytes)? {
        ArtifactFormat::TreeEnsemble => decode_tree_ensemble(&bytes)?,
        ArtifactFormat::Onnx => decode_onnx(path, &bytes)?,
    };

    log::info!(
        "Loaded {} {} model ({}, {} inputs, layout v{})",
        manifest.category, manifest.algorithm, model.backend(),
        manifest.input_len, manifest.layout_version
    );

    Ok(LoadedArtifact {
        manifest,
        model,
        source: path.to_path_buf(),
        sha256: digest,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArtifactFormat {
    TreeEnsemble,
    Onnx,
}

fn detect_format(path: &Path, bytes: &[u8]) -> Result<ArtifactFormat, ModelLoadError> {
    let extension = path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "onnx" => Ok(ArtifactFormat::Onnx),
        "json" => Ok(ArtifactFormat::TreeEnsemble),
        "pkl" | "joblib" => Err(ModelLoadError::UnsupportedFormat(
            "pickled scikit-learn models must be converted to ONNX or tree JSON".to_string(),
        )),
        _ if bytes.iter().find(|b| !b.is_ascii_whitespace()) == Some(&b'{') => {
            Ok(ArtifactFormat::TreeEnsemble)
        }
        other => Err(ModelLoadError::UnsupportedFormat(format!("extension '{}'", other))),
    }
}

fn verify_checksum(path: &Path, actual: &str) -> Result<(), ModelLoadError> {
    let sidecar = checksum_path(path);
    if !sidecar.exists() {
        return Ok(());
    }

    let contents = fs::read_to_string(&sidecar)?;
    let expected = contents
        .split_whitespace()
        .next()
        .map(|s| s.to_ascii_lowercase())
        .ok_or_else(|| ModelLoadError::Malformed(format!("empty checksum file {}", sidecar.display())))?;

    if expected != actual {
        return Err(ModelLoadError::ChecksumMismatch {
            expected,
            actual: actual.to_string(),
        });
    }
    Ok(())
}

fn decode_tree_ensemble(bytes: &[u8]) -> Result<(ModelManifest, Box<dyn ThreatModel>), ModelLoadError> {
    let artifact: TreeEnsembleArtifact = serde_json::from_slice(bytes)?;

    if artifact.format != TREE_ENSEMBLE_FORMAT {
        return Err(ModelLoadError::UnsupportedFormat(artifact.format));
    }
    artifact.manifest.validate()?;

    let manifest = artifact.manifest;
    let model = TreeEnsembleModel::new(
        manifest.algorithm,
        manifest.input_len,
        manifest.threshold,
        artifact.ensemble,
    )
    .map_err(ModelLoadError::InvalidModel)?;

    Ok((manifest, Box::new(model)))
}

fn decode_onnx(path: &Path, bytes: &[u8]) -> Result<(ModelManifest, Box<dyn ThreatModel>), ModelLoadError> {
    let sidecar = manifest_path(path);
    if !sidecar.exists() {
        return Err(ModelLoadError::Malformed(format!(
            "ONNX artifact needs manifest {}",
            sidecar.display()
        )));
    }

    let manifest: ModelManifest = serde_json::from_slice(&fs::read(&sidecar)?)?;
    manifest.validate()?;

    if let Some(expected) = &manifest.sha256 {
        let actual = sha256_hex(bytes);
        if !expected.eq_ignore_ascii_case(&actual) {
            return Err(ModelLoadError::ChecksumMismatch {
                expected: expected.to_ascii_lowercase(),
                actual,
            });
        }
    }

    let model = OnnxModel::from_bytes(bytes, manifest.algorithm, manifest.input_len, manifest.threshold)
        .map_err(ModelLoadError::Runtime)?;

    Ok((manifest, Box::new(model)))
}
