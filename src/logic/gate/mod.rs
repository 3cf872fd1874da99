//! Gate Module - per-navigation decision checkpoint
//!
//! ## Structure
//! - `types`: states, actions, outcomes
//! - `config`: `GateConfig` + presets
//! - `machine`: `DecisionGate`
//! - `wait`: `await_user_choice()` (timeout / abandonment)

pub mod types;
pub mod config;
pub mod machine;
pub mod wait;


pub use types::{BlockReason, DecisionState, GateAction, GateError, GateOutcome, UserChoice};
pub use config::GateConfig;
pub use machine::{DecisionGate, GateCounters, GateStats};
pub use wait::await_user_choice;
