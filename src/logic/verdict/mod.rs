//! Verdict Module - precedence resolution
//!
//! ## Structure
//! - `types`: `Verdict`, `DetectionStatus`
//! - `policy`: `PrecedencePolicy` (configurable category order)
//! - `resolver`: `resolve()` / `VerdictResolver`

pub mod types;
pub mod policy;
pub mod resolver;


pub use types::{DetectionStatus, Verdict};
pub use policy::{PolicyError, PrecedencePolicy};
pub use resolver::{resolve, resolve_with_policy, VerdictResolver};
