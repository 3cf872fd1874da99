//! Web Threat Guard - Ensemble Threat Classification Core
//!
//! Turns per-category feature observations into a single verdict and an
//! allow / warn decision for one navigation attempt.
//!
//! ```no_run
//! # async fn run(bags: web_threat_core::CategoryBags, presenter: &dyn web_threat_core::WarningPresenter)
//! # -> web_threat_core::Result<()> {
//! use web_threat_core::{EngineConfig, ThreatEngine};
//!
//! web_threat_core::init_logging();
//! let config = EngineConfig::from_env()?;
//! let engine = ThreatEngine::from_config(&config)?;
//! engine.load_models(&config.models).await;
//!
//! let decision = engine.navigate(&bags, presenter).await?;
//! if !decision.is_allowed() {
//!     // halt the page load
//! }
//! # Ok(())
//! # }
//! ```

pub mod constants;
pub mod logic;

pub use logic::category::ThreatCategory;
pub use logic::config::{ConfigError, EngineConfig, ModelSpec};
pub use logic::engine::{EngineStatus, LoadReport, NavigationDecision, ThreatEngine, WarningPresenter};
pub use logic::ensemble::{AbstainReason, EnsembleClassifier, Prediction};
pub use logic::error::{Result, ThreatError};
pub use logic::features::{CategoryBags, FeatureError, FeatureVector, RawFeatureBag, RawValue};
pub use logic::gate::{
    await_user_choice, BlockReason, DecisionGate, DecisionState, GateAction, GateConfig, GateError,
    GateOutcome, UserChoice,
};
pub use logic::model::{AlgorithmKind, InferenceError, ModelLoadError, ThreatModel};
pub use logic::registry::{ModelHandle, ModelRegistry, NotReady};
pub use logic::verdict::{resolve, DetectionStatus, PolicyError, PrecedencePolicy, Verdict, VerdictResolver};

/// Install `env_logger` (honors `RUST_LOG`, defaults to `info`).
/// Safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
