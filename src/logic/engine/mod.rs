//! Engine Module - host entry point
//!
//! ## Structure
//! - `types`: `NavigationDecision`, `WarningPresenter`, `EngineStatus`
//! - `pipeline`: `ThreatEngine`

pub mod types;
pub mod pipeline;

#[cfg(test)]
mod tests;

pub use types::{EngineStatus, LoadReport, NavigationDecision, WarningPresenter};
pub use pipeline::ThreatEngine;
