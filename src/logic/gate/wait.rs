//! Waiting for the user without busy-polling

use std::time::Duration;
use tokio::sync::oneshot;

use super::machine::DecisionGate;
use super::types::{GateError, GateOutcome, UserChoice};

/// Suspend until the user answers, the timeout elapses, or the sender is
/// dropped (page closed). The last two block.
pub async fn await_user_choice(
    gate: &mut DecisionGate,
    choice: oneshot::Receiver<UserChoice>,
    timeout: Duration,
) -> Result<GateOutcome, GateError> {
    if !gate.is_awaiting() {
        return Err(GateError::InvalidTransition {
            from: gate.state().name(),
            event: "await_user_choice",
        });
    }

    match tokio::time::timeout(timeout, choice).await {
        Ok(Ok(choice)) => gate.choose(choice),
        Ok(Err(_closed)) => gate.abandon(),
        Err(_elapsed) => gate.time_out(),
    }
}
