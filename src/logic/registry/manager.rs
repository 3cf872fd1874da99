//! Model Registry - owns every loaded model handle
//!
//! Entries are independent: one artifact failing to load never affects
//! another key. Artifacts are decoded off the lock and the finished
//! `Arc<ModelHandle>` is swapped in under a single write, so readers see
//! either the old handle or the new one, never something in between.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use parking_lot::RwLock;

use crate::logic::category::ThreatCategory;
use crate::logic::model::{load_artifact, AlgorithmKind, LoadedArtifact, ModelLoadError};
use super::types::{ModelHandle, ModelKey, ModelStatus, NotReady, Readiness};

// ============================================================================
// SLOTS
// ============================================================================

#[derive(Debug, Clone)]
enum Slot {
    Loading,
    Ready(Arc<ModelHandle>),
    Failed(String),
}

#[derive(Debug, Clone)]
struct Entry {
    slot: Slot,
    /// Most recent load error, kept even while an older handle still serves
    last_error: Option<String>,
}

#[derive(Debug, Default)]
struct RegistryInner {
    entries: HashMap<ModelKey, Entry>,
    /// Registration order per category; drives tie-breaks downstream
    order: HashMap<ThreatCategory, Vec<AlgorithmKind>>,
}

impl RegistryInner {
    fn register(&mut self, key: ModelKey) {
        let algorithms = self.order.entry(key.category).or_default();
        if !algorithms.contains(&key.algorithm) {
            algorithms.push(key.algorithm);
        }
    }
}

// ============================================================================
// MODEL REGISTRY
// ============================================================================

/// Owner of all model handles. Share it behind an `Arc`.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    inner: RwLock<RegistryInner>,
    generation: AtomicU64,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a key before its artifact arrives; `get` reports `Loading`
    /// until the load completes.
    pub fn declare(&self, category: ThreatCategory, algorithm: AlgorithmKind) {
        let key = ModelKey::new(category, algorithm);
        let mut inner = self.inner.write();
        inner.register(key);
        inner.entries.entry(key).or_insert(Entry {
            slot: Slot::Loading,
            last_error: None,
        });
    }

    /// Load the artifact for one key on the blocking pool. The artifact's
    /// manifest must name the same category and algorithm; any failure is
    /// recorded against the key.
    pub async fn load(
        &self,
        category: ThreatCategory,
        algorithm: AlgorithmKind,
        path: impl Into<PathBuf>,
    ) -> Result<Arc<ModelHandle>, ModelLoadError> {
        let path = path.into();
        let generation = self.reserve_generation();
        let result = Self::read_off_thread(path.clone()).await;
        self.install(ModelKey::new(category, algorithm), generation, &path, result)
    }

    /// Synchronous load, for hosts without a runtime
    pub fn load_blocking(
        &self,
        category: ThreatCategory,
        algorithm: AlgorithmKind,
        path: &Path,
    ) -> Result<Arc<ModelHandle>, ModelLoadError> {
        let generation = self.reserve_generation();
        self.install(ModelKey::new(category, algorithm), generation, path, load_artifact(path))
    }

    async fn read_off_thread(path: PathBuf) -> Result<LoadedArtifact, ModelLoadError> {
        tokio::task::spawn_blocking(move || load_artifact(&path))
            .await
            .map_err(|e| ModelLoadError::TaskFailed(e.to_string()))?
    }

    /// Generations are taken when a load starts, so the most recently
    /// started load wins no matter which one finishes decoding first.
    pub(super) fn reserve_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(super) fn install(
        &self,
        key: ModelKey,
        generation: u64,
        path: &Path,
        result: Result<LoadedArtifact, ModelLoadError>,
    ) -> Result<Arc<ModelHandle>, ModelLoadError> {
        let checked = result.and_then(|artifact| {
            if artifact.manifest.category != key.category {
                return Err(ModelLoadError::CategoryMismatch {
                    requested: key.category,
                    found: artifact.manifest.category,
                });
            }
            if artifact.manifest.algorithm != key.algorithm {
                return Err(ModelLoadError::InvalidModel(format!(
                    "artifact is {}, expected {}",
                    artifact.manifest.algorithm, key.algorithm
                )));
            }
            Ok(artifact)
        });

        match checked {
            Ok(artifact) => Ok(self.swap_in(key, generation, artifact)),
            Err(err) => {
                log::warn!("Failed to load {} model from {}: {}", key, path.display(), err);
                self.mark_failed(key, err.to_string());
                Err(err)
            }
        }
    }

    fn swap_in(&self, key: ModelKey, generation: u64, artifact: LoadedArtifact) -> Arc<ModelHandle> {
        let handle = Arc::new(ModelHandle::new(
            key,
            artifact.manifest,
            artifact.source,
            artifact.sha256,
            generation,
            artifact.model,
        ));

        let mut inner = self.inner.write();
        inner.register(key);

        if let Some(Entry { slot: Slot::Ready(current), .. }) = inner.entries.get(&key) {
            if current.generation > generation {
                log::debug!(
                    "Discarded stale load of {} (generation {} < {})",
                    key, generation, current.generation
                );
                return current.clone();
            }
        }

        let previous = inner.entries.insert(key, Entry {
            slot: Slot::Ready(handle.clone()),
            last_error: None,
        });
        drop(inner);

        match previous.map(|e| e.slot) {
            Some(Slot::Ready(old)) => log::info!(
                "Replaced model {} (generation {} -> {})",
                key, old.generation, generation
            ),
            _ => log::info!("Model {} ready (generation {})", key, generation),
        }
        handle
    }

    fn mark_failed(&self, key: ModelKey, reason: String) {
        let mut inner = self.inner.write();
        inner.register(key);
        let entry = inner.entries.entry(key).or_insert(Entry {
            slot: Slot::Loading,
            last_error: None,
        });
        // A ready handle keeps serving; only the error is recorded
        if !matches!(entry.slot, Slot::Ready(_)) {
            entry.slot = Slot::Failed(reason.clone());
        }
        entry.last_error = Some(reason);
    }

    /// Current handle for a key. Never waits on an in-flight load.
    pub fn get(&self, category: ThreatCategory, algorithm: AlgorithmKind) -> Result<Arc<ModelHandle>, NotReady> {
        let inner = self.inner.read();
        match inner.entries.get(&ModelKey::new(category, algorithm)).map(|e| &e.slot) {
            Some(Slot::Ready(handle)) => Ok(handle.clone()),
            Some(Slot::Loading) => Err(NotReady::Loading),
            Some(Slot::Failed(reason)) => Err(NotReady::Failed(reason.clone())),
            None => Err(NotReady::Unknown),
        }
    }

    /// Algorithms registered against a category, in registration order
    pub fn algorithms_for(&self, category: ThreatCategory) -> Vec<AlgorithmKind> {
        self.inner.read().order.get(&category).cloned().unwrap_or_default()
    }

    /// Remove a key entirely, returning the handle it was serving
    pub fn unload(&self, category: ThreatCategory, algorithm: AlgorithmKind) -> Option<Arc<ModelHandle>> {
        let key = ModelKey::new(category, algorithm);
        let removed = {
            let mut inner = self.inner.write();
            if let Some(algorithms) = inner.order.get_mut(&category) {
                algorithms.retain(|a| *a != algorithm);
            }
            inner.entries.remove(&key)
        };

        match removed.map(|e| e.slot) {
            Some(Slot::Ready(handle)) => {
                log::info!("Unloaded model {}", key);
                Some(handle)
            }
            _ => None,
        }
    }

    /// Drop every entry (shutdown)
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        let count = inner.entries.len();
        inner.entries.clear();
        inner.order.clear();
        log::info!("Model registry cleared ({} entries)", count);
    }

    /// Snapshot of every entry, in precedence then registration order
    pub fn status(&self) -> Vec<ModelStatus> {
        let inner = self.inner.read();
        let mut statuses = Vec::with_capacity(inner.entries.len());

        for category in ThreatCategory::ALL {
            let Some(algorithms) = inner.order.get(&category) else { continue };
            for algorithm in algorithms {
                let key = ModelKey::new(category, *algorithm);
                let Some(entry) = inner.entries.get(&key) else { continue };
                statuses.push(entry_status(key, entry));
            }
        }
        statuses
    }

    /// Number of keys currently serving a handle
    pub fn ready_count(&self) -> usize {
        self.inner.read()
            .entries
            .values()
            .filter(|e| matches!(e.slot, Slot::Ready(_)))
            .count()
    }

    /// False when no model at all can contribute
    pub fn detection_available(&self) -> bool {
        self.ready_count() > 0
    }
}

fn entry_status(key: ModelKey, entry: &Entry) -> ModelStatus {
    match &entry.slot {
        Slot::Ready(handle) => ModelStatus {
            key,
            readiness: Readiness::Ready,
            backend: Some(handle.backend().to_string()),
            source: Some(handle.source.clone()),
            generation: Some(handle.generation),
            loaded_at: Some(handle.loaded_at),
            last_error: entry.last_error.clone(),
        },
        Slot::Loading => ModelStatus {
            key,
            readiness: Readiness::Loading,
            backend: None,
            source: None,
            generation: None,
            loaded_at: None,
            last_error: None,
        },
        Slot::Failed(reason) => ModelStatus {
            key,
            readiness: Readiness::Failed,
            backend: None,
            source: None,
            generation: None,
            loaded_at: None,
            last_error: Some(reason.clone()),
        },
    }
}
