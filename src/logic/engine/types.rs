//! Engine Types - host-facing results and the presentation seam

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::logic::category::ThreatCategory;
use crate::logic::ensemble::EnsembleStats;
use crate::logic::gate::{GateOutcome, GateStats, UserChoice};
use crate::logic::model::ModelLoadError;
use crate::logic::registry::{ModelKey, ModelStatus};
use crate::logic::verdict::Verdict;

/// Renders the warning; the engine never draws UI itself.
///
/// Send the user's answer on the returned channel. Dropping the sender
/// (page closed) blocks the navigation.
pub trait WarningPresenter: Send + Sync {
    fn present_warning(&self, gate_id: Uuid, verdict: &Verdict) -> oneshot::Receiver<UserChoice>;
}

/// Final answer for one navigation attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationDecision {
    pub gate_id: Uuid,
    pub outcome: GateOutcome,
    pub verdict: Verdict,
    /// A warning was presented
    pub warned: bool,
}

impl NavigationDecision {
    pub fn is_allowed(&self) -> bool {
        self.outcome.is_allowed()
    }
}

/// Result of loading one configured artifact
#[derive(Debug)]
pub struct LoadReport {
    pub key: ModelKey,
    pub result: Result<u64, ModelLoadError>,
}

impl LoadReport {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Engine status snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStatus {
    pub version: String,
    pub detection_available: bool,
    pub models: Vec<ModelStatus>,
    pub precedence: Vec<ThreatCategory>,
    pub ensemble: EnsembleStats,
    pub gate: GateStats,
}
