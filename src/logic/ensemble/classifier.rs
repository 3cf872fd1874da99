//! Ensemble Classifier
//!
//! Runs every model registered for a category against the matching feature
//! vector. Anything that prevents a model from scoring (not loaded, wrong
//! shape, wrong layout, runtime failure) becomes an abstaining `Prediction`;
//! nothing here returns an error to the caller.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::logic::category::ThreatCategory;
use crate::logic::features::{self, FeatureError, FeatureVector, RawFeatureBag};
use crate::logic::model::AlgorithmKind;
use crate::logic::registry::{ModelHandle, ModelRegistry};
use super::types::{AbstainReason, EnsembleStats, Prediction};

pub struct EnsembleClassifier {
    registry: Arc<ModelRegistry>,
    inference_count: AtomicU64,
    abstain_count: AtomicU64,
    latency_sum_us: AtomicU64,
}

impl EnsembleClassifier {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self {
            registry,
            inference_count: AtomicU64::new(0),
            abstain_count: AtomicU64::new(0),
            latency_sum_us: AtomicU64::new(0),
        }
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    // ========================================================================
    // SINGLE MODEL
    // ========================================================================

    /// Score one vector with a borrowed handle
    pub fn classify_with(&self, handle: &ModelHandle, vector: &FeatureVector) -> Prediction {
        let category = handle.category();
        let algorithm = handle.algorithm();

        let expected = handle.expected_input_len();
        if vector.len() != expected {
            return self.abstained(category, algorithm, AbstainReason::ShapeMismatch {
                expected,
                actual: vector.len(),
            });
        }

        if let Some(detail) = layout_conflict(handle, vector) {
            return self.abstained(category, algorithm, AbstainReason::LayoutMismatch { detail });
        }

        let start_time = std::time::Instant::now();
        let result = handle.model().predict(vector.as_slice());
        let elapsed_us = start_time.elapsed().as_micros() as u64;

        self.latency_sum_us.fetch_add(elapsed_us, Ordering::Relaxed);
        self.inference_count.fetch_add(1, Ordering::Relaxed);

        match result {
            Ok(score) => {
                log::debug!(
                    "{}/{}: label={} confidence={:.3} ({}us)",
                    category, algorithm, score.label, score.confidence(), elapsed_us
                );
                Prediction::scored(category, algorithm, score.label, score.confidence(), score.probability)
                    .with_generation(handle.generation)
            }
            Err(e) => self.abstained(category, algorithm, AbstainReason::InferenceFailed {
                detail: e.to_string(),
            }),
        }
    }

    /// Score one vector with the registry's current handle for a key
    pub fn classify(
        &self,
        category: ThreatCategory,
        algorithm: AlgorithmKind,
        vector: &FeatureVector,
    ) -> Prediction {
        match self.registry.get(category, algorithm) {
            Ok(handle) => self.classify_with(&handle, vector),
            Err(not_ready) => self.abstained(category, algorithm, not_ready.into()),
        }
    }

    // ========================================================================
    // WHOLE ENSEMBLE
    // ========================================================================

    /// Every registered model of every category present in `vectors`.
    ///
    /// Output is grouped by category in default precedence order, then by
    /// registration order within a category.
    pub fn classify_all(&self, vectors: &HashMap<ThreatCategory, FeatureVector>) -> Vec<Prediction> {
        let mut predictions = Vec::new();
        for category in ThreatCategory::ALL {
            let Some(vector) = vectors.get(&category) else { continue };
            for algorithm in self.registry.algorithms_for(category) {
                predictions.push(self.classify(category, algorithm, vector));
            }
        }
        predictions
    }

    /// Build and score a raw bag for every model of one category.
    ///
    /// One vector is built per layout version the loaded models need, so a
    /// model trained on an older layout keeps working next to a newer one.
    pub fn classify_bag(&self, category: ThreatCategory, bag: &RawFeatureBag) -> Vec<Prediction> {
        let mut vectors: BTreeMap<u8, Result<FeatureVector, FeatureError>> = BTreeMap::new();
        let mut predictions = Vec::new();

        for algorithm in self.registry.algorithms_for(category) {
            let handle = match self.registry.get(category, algorithm) {
                Ok(handle) => handle,
                Err(not_ready) => {
                    predictions.push(self.abstained(category, algorithm, not_ready.into()));
                    continue;
                }
            };

            let version = handle.layout_version();
            let built = vectors
                .entry(version)
                .or_insert_with(|| features::build_with_version(category, version, bag));

            let prediction = match built {
                Ok(vector) => self.classify_with(&handle, vector),
                Err(e) => self.abstained(category, algorithm, AbstainReason::SchemaMismatch {
                    detail: e.to_string(),
                }),
            };
            predictions.push(prediction);
        }
        predictions
    }

    fn abstained(&self, category: ThreatCategory, algorithm: AlgorithmKind, reason: AbstainReason) -> Prediction {
        log::warn!("{}/{} abstained: {}", category, algorithm, reason);
        self.abstain_count.fetch_add(1, Ordering::Relaxed);
        Prediction::abstain(category, algorithm, reason)
    }

    // ========================================================================
    // STATISTICS
    // ========================================================================

    pub fn stats(&self) -> EnsembleStats {
        let inferences = self.inference_count.load(Ordering::Relaxed);
        let sum = self.latency_sum_us.load(Ordering::Relaxed);
        EnsembleStats {
            inferences,
            abstentions: self.abstain_count.load(Ordering::Relaxed),
            avg_latency_us: if inferences > 0 { sum as f64 / inferences as f64 } else { 0.0 },
        }
    }
}

/// Vector built for a different layout than the model was trained on
fn layout_conflict(handle: &ModelHandle, vector: &FeatureVector) -> Option<String> {
    if vector.category != handle.category() {
        return Some(format!("{} vector for {} model", vector.category, handle.category()));
    }
    if vector.version != handle.layout_version() {
        return Some(format!(
            "layout v{} vector for v{} model",
            vector.version,
            handle.layout_version()
        ));
    }
    match handle.manifest.layout_hash {
        Some(hash) if hash != vector.layout_hash => Some(format!(
            "layout hash {:08x} != {:08x}",
            vector.layout_hash, hash
        )),
        _ => None,
    }
}
