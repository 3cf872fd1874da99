//! Decision Gate State Machine
//!
//! ```text
//! Idle --verdict(none)--> Allowed
//! Idle --verdict(threat)--> AwaitingUserChoice --continue--> Allowed
//!                                              --go back / timeout / abandon--> Blocked
//! ```
//!
//! A threat verdict can only leave `Idle` through `AwaitingUserChoice`.
//! Terminal states reject every further event.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::logic::verdict::{DetectionStatus, Verdict};
use super::config::GateConfig;
use super::types::{BlockReason, DecisionState, GateAction, GateError, GateOutcome, UserChoice};

// ============================================================================
// OUTCOME COUNTERS
// ============================================================================

/// Shared tally of gate outcomes, including gates dropped mid-wait
#[derive(Debug, Default)]
pub struct GateCounters {
    allowed: AtomicU64,
    blocked: AtomicU64,
    warned: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateStats {
    pub allowed: u64,
    pub blocked: u64,
    pub warned: u64,
}

impl GateCounters {
    pub fn snapshot(&self) -> GateStats {
        GateStats {
            allowed: self.allowed.load(Ordering::Relaxed),
            blocked: self.blocked.load(Ordering::Relaxed),
            warned: self.warned.load(Ordering::Relaxed),
        }
    }
}

// ============================================================================
// DECISION GATE
// ============================================================================

/// One navigation attempt's checkpoint
#[derive(Debug)]
pub struct DecisionGate {
    id: Uuid,
    opened_at: DateTime<Utc>,
    decided_at: Option<DateTime<Utc>>,
    config: GateConfig,
    state: DecisionState,
    counters: Option<Arc<GateCounters>>,
}

impl DecisionGate {
    pub fn new(config: GateConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            opened_at: Utc::now(),
            decided_at: None,
            config,
            state: DecisionState::Idle,
            counters: None,
        }
    }

    /// Gate that reports its outcome into shared counters
    pub fn with_counters(config: GateConfig, counters: Arc<GateCounters>) -> Self {
        let mut gate = Self::new(config);
        gate.counters = Some(counters);
        gate
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    pub fn decided_at(&self) -> Option<DateTime<Utc>> {
        self.decided_at
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn state(&self) -> &DecisionState {
        &self.state
    }

    pub fn is_awaiting(&self) -> bool {
        matches!(self.state, DecisionState::AwaitingUserChoice(_))
    }

    /// Final decision, once terminal
    pub fn outcome(&self) -> Option<GateOutcome> {
        match self.state {
            DecisionState::Allowed => Some(GateOutcome::Allow),
            DecisionState::Blocked(reason) => Some(GateOutcome::Block(reason)),
            _ => None,
        }
    }

    // ========================================================================
    // EVENTS
    // ========================================================================

    /// Feed the resolved verdict. Only valid from `Idle`.
    pub fn on_verdict(&mut self, verdict: Verdict) -> Result<GateAction, GateError> {
        self.expect_state("verdict", |s| matches!(s, DecisionState::Idle))?;

        let unavailable = verdict.detection == DetectionStatus::Unavailable;
        if verdict.is_threat() || (unavailable && self.config.warn_when_unavailable) {
            log::info!(
                "Gate {}: awaiting user choice for {} verdict",
                self.id,
                if unavailable { "detection-unavailable" } else { verdict.category_label() }
            );
            self.state = DecisionState::AwaitingUserChoice(verdict.clone());
            if let Some(counters) = &self.counters {
                counters.warned.fetch_add(1, Ordering::Relaxed);
            }
            return Ok(GateAction::PresentWarning(verdict));
        }

        if unavailable {
            log::warn!("Gate {}: detection unavailable, allowing per configuration", self.id);
        }
        Ok(self.finish(GateOutcome::Allow).into())
    }

    /// User answered the warning
    pub fn choose(&mut self, choice: UserChoice) -> Result<GateOutcome, GateError> {
        self.expect_awaiting("choose")?;
        let outcome = match choice {
            UserChoice::Continue => GateOutcome::Allow,
            UserChoice::GoBack => GateOutcome::Block(BlockReason::UserWentBack),
        };
        log::info!("Gate {}: user chose {:?}", self.id, choice);
        Ok(self.finish(outcome))
    }

    /// Decision timeout elapsed
    pub fn time_out(&mut self) -> Result<GateOutcome, GateError> {
        self.expect_awaiting("time_out")?;
        log::warn!(
            "Gate {}: no decision within {}s, blocking",
            self.id, self.config.decision_timeout_secs
        );
        Ok(self.finish(GateOutcome::Block(BlockReason::DecisionTimeout)))
    }

    /// Navigation went away. Valid from `Idle` and `AwaitingUserChoice`.
    pub fn abandon(&mut self) -> Result<GateOutcome, GateError> {
        self.expect_state("abandon", |s| !s.is_terminal())?;
        log::warn!("Gate {}: navigation abandoned in state {}, blocking", self.id, self.state.name());
        Ok(self.finish(GateOutcome::Block(BlockReason::Abandoned)))
    }

    // ========================================================================
    // HELPERS
    // ========================================================================

    fn expect_awaiting(&self, event: &'static str) -> Result<(), GateError> {
        self.expect_state(event, |s| matches!(s, DecisionState::AwaitingUserChoice(_)))
    }

    fn expect_state(
        &self,
        event: &'static str,
        allowed: impl Fn(&DecisionState) -> bool,
    ) -> Result<(), GateError> {
        if allowed(&self.state) {
            Ok(())
        } else {
            Err(GateError::InvalidTransition { from: self.state.name(), event })
        }
    }

    fn finish(&mut self, outcome: GateOutcome) -> GateOutcome {
        self.state = match outcome {
            GateOutcome::Allow => DecisionState::Allowed,
            GateOutcome::Block(reason) => DecisionState::Blocked(reason),
        };
        self.decided_at = Some(Utc::now());
        if let Some(counters) = &self.counters {
            let counter = match outcome {
                GateOutcome::Allow => &counters.allowed,
                GateOutcome::Block(_) => &counters.blocked,
            };
            counter.fetch_add(1, Ordering::Relaxed);
        }
        outcome
    }

    /// Convert to log entry
    pub fn to_log_entry(&self) -> serde_json::Value {
        serde_json::json!({
            "gate_id": self.id.to_string(),
            "opened_at": self.opened_at.to_rfc3339(),
            "decided_at": self.decided_at.map(|t| t.to_rfc3339()),
            "state": self.state.name(),
            "outcome": self.outcome(),
        })
    }
}

impl Drop for DecisionGate {
    fn drop(&mut self) {
        if self.is_awaiting() {
            log::warn!("Gate {} torn down while awaiting user choice, treating as blocked", self.id);
            self.finish(GateOutcome::Block(BlockReason::Abandoned));
        }
    }
}
