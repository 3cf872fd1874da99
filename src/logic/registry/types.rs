//! Registry Types
//!
//! Handles, slots and status snapshots. No loading logic here.

use std::path::PathBuf;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::logic::category::ThreatCategory;
use crate::logic::model::{AlgorithmKind, ModelManifest, ThreatModel};

/// Registry key: one model per (category, algorithm)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModelKey {
    pub category: ThreatCategory,
    pub algorithm: AlgorithmKind,
}

impl ModelKey {
    pub fn new(category: ThreatCategory, algorithm: AlgorithmKind) -> Self {
        Self { category, algorithm }
    }
}

impl std::fmt::Display for ModelKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.category, self.algorithm)
    }
}

// ============================================================================
// MODEL HANDLE
// ============================================================================

/// Loaded, inference-ready classifier.
///
/// Immutable after construction; the registry hands out `Arc` clones so a
/// borrower keeps a consistent handle even if the slot is replaced.
pub struct ModelHandle {
    pub key: ModelKey,
    pub manifest: ModelManifest,
    pub source: PathBuf,
    pub sha256: String,
    pub loaded_at: DateTime<Utc>,
    /// Monotonic per registry; distinguishes reloads of the same key
    pub generation: u64,
    model: Box<dyn ThreatModel>,
}

impl ModelHandle {
    pub(crate) fn new(
        key: ModelKey,
        manifest: ModelManifest,
        source: PathBuf,
        sha256: String,
        generation: u64,
        model: Box<dyn ThreatModel>,
    ) -> Self {
        Self {
            key,
            manifest,
            source,
            sha256,
            loaded_at: Utc::now(),
            generation,
            model,
        }
    }

    pub fn category(&self) -> ThreatCategory {
        self.key.category
    }

    pub fn algorithm(&self) -> AlgorithmKind {
        self.key.algorithm
    }

    pub fn expected_input_len(&self) -> usize {
        self.model.input_len()
    }

    pub fn layout_version(&self) -> u8 {
        self.manifest.layout_version
    }

    pub fn model(&self) -> &dyn ThreatModel {
        self.model.as_ref()
    }

    pub fn backend(&self) -> &'static str {
        self.model.backend()
    }
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("key", &self.key)
            .field("backend", &self.backend())
            .field("input_len", &self.expected_input_len())
            .field("layout_version", &self.layout_version())
            .field("generation", &self.generation)
            .field("source", &self.source)
            .finish()
    }
}

// ============================================================================
// SLOTS & READINESS
// ============================================================================

/// Why a handle could not be served
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotReady {
    /// Declared, load still in flight
    Loading,
    /// Never declared or loaded
    Unknown,
    /// Load failed and nothing older is available
    Failed(String),
}

impl NotReady {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotReady::Loading => "loading",
            NotReady::Unknown => "unknown",
            NotReady::Failed(_) => "failed",
        }
    }
}

/// Registry readiness per key, for UI / diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Readiness {
    Loading,
    Ready,
    Failed,
}

/// Snapshot of one registry entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelStatus {
    pub key: ModelKey,
    pub readiness: Readiness,
    pub backend: Option<String>,
    pub source: Option<PathBuf>,
    pub generation: Option<u64>,
    pub loaded_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}
