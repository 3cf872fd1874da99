//! Decision Gate Types

use serde::{Deserialize, Serialize};

use crate::logic::verdict::Verdict;

/// User's answer to the warning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserChoice {
    Continue,
    GoBack,
}

/// Why navigation was blocked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockReason {
    UserWentBack,
    /// No answer before the decision timeout
    DecisionTimeout,
    /// Page or tab went away while waiting
    Abandoned,
}

impl BlockReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockReason::UserWentBack => "user_went_back",
            BlockReason::DecisionTimeout => "decision_timeout",
            BlockReason::Abandoned => "abandoned",
        }
    }
}

/// Per-navigation state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum DecisionState {
    Idle,
    AwaitingUserChoice(Verdict),
    Allowed,
    Blocked(BlockReason),
}

impl DecisionState {
    pub fn name(&self) -> &'static str {
        match self {
            DecisionState::Idle => "idle",
            DecisionState::AwaitingUserChoice(_) => "awaiting_user_choice",
            DecisionState::Allowed => "allowed",
            DecisionState::Blocked(_) => "blocked",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DecisionState::Allowed | DecisionState::Blocked(_))
    }
}

/// External effect requested from the navigation hook
#[derive(Debug, Clone, PartialEq)]
pub enum GateAction {
    /// Show the warning; a decision follows via `choose` / `time_out` / `abandon`
    PresentWarning(Verdict),
    Allow,
    Block(BlockReason),
}

/// Final allow/block decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", content = "reason", rename_all = "snake_case")]
pub enum GateOutcome {
    Allow,
    Block(BlockReason),
}

impl GateOutcome {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GateOutcome::Allow)
    }
}

impl From<GateOutcome> for GateAction {
    fn from(outcome: GateOutcome) -> Self {
        match outcome {
            GateOutcome::Allow => GateAction::Allow,
            GateOutcome::Block(reason) => GateAction::Block(reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    #[error("Event '{event}' is not valid in state '{from}'")]
    InvalidTransition { from: &'static str, event: &'static str },
}
