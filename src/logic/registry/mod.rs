//! Registry Module - Model lifecycle
//!
//! ## Structure
//! - `types`: `ModelHandle`, `ModelKey`, readiness snapshots
//! - `manager`: `ModelRegistry` (load / get / unload)

pub mod types;
pub mod manager;

#[cfg(test)]
mod tests;

pub use types::{ModelHandle, ModelKey, ModelStatus, NotReady, Readiness};
pub use manager::ModelRegistry;
