//! Threat Engine - end-to-end pipeline
//!
//! raw bags -> vectors -> ensemble predictions -> verdict -> decision gate
//!
//! All category predictions are collected before the resolver runs, so a
//! partial result never reaches the gate.

use std::sync::Arc;

use crate::constants;
use crate::logic::category::ThreatCategory;
use crate::logic::config::{EngineConfig, ModelSpec};
use crate::logic::ensemble::EnsembleClassifier;
use crate::logic::error::Result;
use crate::logic::features::CategoryBags;
use crate::logic::gate::{
    await_user_choice, DecisionGate, GateAction, GateConfig, GateCounters, GateError, GateOutcome,
};
use crate::logic::model::ModelLoadError;
use crate::logic::registry::ModelRegistry;
use crate::logic::verdict::{PolicyError, PrecedencePolicy, Verdict, VerdictResolver};
use super::types::{EngineStatus, LoadReport, NavigationDecision, WarningPresenter};

pub struct ThreatEngine {
    registry: Arc<ModelRegistry>,
    classifier: EnsembleClassifier,
    resolver: VerdictResolver,
    gate_config: GateConfig,
    gate_counters: Arc<GateCounters>,
}

impl ThreatEngine {
    pub fn new(
        registry: Arc<ModelRegistry>,
        policy: PrecedencePolicy,
        gate_config: GateConfig,
    ) -> std::result::Result<Self, PolicyError> {
        Ok(Self {
            classifier: EnsembleClassifier::new(registry.clone()),
            registry,
            resolver: VerdictResolver::new(policy)?,
            gate_config,
            gate_counters: Arc::new(GateCounters::default()),
        })
    }

    /// Engine with every configured model declared (not yet loaded)
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let engine = Self::new(
            Arc::new(ModelRegistry::new()),
            config.precedence.clone(),
            config.gate.clone(),
        )?;
        for spec in &config.models {
            engine.registry.declare(spec.category, spec.algorithm);
        }
        log::info!(
            "{} v{} engine initialized ({} models declared)",
            constants::APP_NAME, constants::APP_VERSION, config.models.len()
        );
        Ok(engine)
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    pub fn classifier(&self) -> &EnsembleClassifier {
        &self.classifier
    }

    pub fn policy(&self) -> &PrecedencePolicy {
        self.resolver.policy()
    }

    pub fn gate_config(&self) -> &GateConfig {
        &self.gate_config
    }

    // ========================================================================
    // MODEL LOADING
    // ========================================================================

    /// Load all specs concurrently and wait for every one to finish
    pub async fn load_models(&self, specs: &[ModelSpec]) -> Vec<LoadReport> {
        self.declare_all(specs);
        load_all(self.registry.clone(), specs.to_vec()).await
    }

    /// Start loading in the background; evaluation keeps working meanwhile
    /// with not-yet-loaded models abstaining.
    pub fn spawn_model_loads(&self, specs: &[ModelSpec]) -> tokio::task::JoinHandle<Vec<LoadReport>> {
        self.declare_all(specs);
        tokio::spawn(load_all(self.registry.clone(), specs.to_vec()))
    }

    /// Fixes registration order before concurrent loads race
    fn declare_all(&self, specs: &[ModelSpec]) {
        for spec in specs {
            self.registry.declare(spec.category, spec.algorithm);
        }
    }

    // ========================================================================
    // EVALUATION
    // ========================================================================

    /// Classify every supplied category and resolve one verdict.
    /// Categories without a bag are not evaluated.
    pub fn evaluate(&self, bags: &CategoryBags) -> Verdict {
        let mut predictions = Vec::new();
        for category in ThreatCategory::ALL {
            match bags.get(&category) {
                Some(bag) => predictions.extend(self.classifier.classify_bag(category, bag)),
                None => log::debug!("No {} features supplied, not evaluated", category),
            }
        }
        self.resolver.resolve(predictions)
    }

    pub fn open_gate(&self) -> DecisionGate {
        DecisionGate::with_counters(self.gate_config.clone(), self.gate_counters.clone())
    }

    /// Full navigation check: evaluate, gate, and (when needed) wait for the
    /// user through `presenter`.
    pub async fn navigate(
        &self,
        bags: &CategoryBags,
        presenter: &dyn WarningPresenter,
    ) -> std::result::Result<NavigationDecision, GateError> {
        let verdict = self.evaluate(bags);
        let mut gate = self.open_gate();

        let (outcome, warned) = match gate.on_verdict(verdict.clone())? {
            GateAction::PresentWarning(shown) => {
                let choice = presenter.present_warning(gate.id(), &shown);
                let outcome = await_user_choice(&mut gate, choice, self.gate_config.decision_timeout()).await?;
                (outcome, true)
            }
            GateAction::Allow => (GateOutcome::Allow, false),
            GateAction::Block(reason) => (GateOutcome::Block(reason), false),
        };

        log::info!("Navigation decision: {}", gate.to_log_entry());
        Ok(NavigationDecision {
            gate_id: gate.id(),
            outcome,
            verdict,
            warned,
        })
    }

    // ========================================================================
    // STATUS
    // ========================================================================

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            version: constants::APP_VERSION.to_string(),
            detection_available: self.registry.detection_available(),
            models: self.registry.status(),
            precedence: self.policy().order.clone(),
            ensemble: self.classifier.stats(),
            gate: self.gate_counters.snapshot(),
        }
    }
}

async fn load_all(registry: Arc<ModelRegistry>, specs: Vec<ModelSpec>) -> Vec<LoadReport> {
    let tasks: Vec<_> = specs
        .into_iter()
        .map(|spec| {
            let registry = registry.clone();
            let key = spec.key();
            let task = tokio::spawn(async move {
                registry.load(key.category, key.algorithm, spec.path).await.map(|h| h.generation)
            });
            (key, task)
        })
        .collect();

    let mut reports = Vec::with_capacity(tasks.len());
    for (key, task) in tasks {
        let result = match task.await {
            Ok(result) => result,
            Err(e) => Err(ModelLoadError::TaskFailed(e.to_string())),
        };
        reports.push(LoadReport { key, result });
    }

    let loaded = reports.iter().filter(|r| r.is_ok()).count();
    if loaded < reports.len() {
        log::warn!("Loaded {}/{} models; failed models will abstain", loaded, reports.len());
    } else {
        log::info!("Loaded {}/{} models", loaded, reports.len());
    }
    reports
}
