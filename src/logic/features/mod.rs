//! Features Module - Feature Vector Builder
//!
//! Turns per-category observation bags into fixed-order numeric vectors.
//! Layouts are versioned so models keep the input shape they were trained on.

pub mod bag;
pub mod builder;
pub mod layout;
pub mod vector;

#[cfg(test)]
mod tests;

// Re-export common types
pub use bag::{CategoryBags, RawFeatureBag, RawValue};
pub use builder::{build, build_for_layout, build_with_version, FeatureError};
pub use layout::{current_layout, CategoryLayout, FieldKind, LayoutInfo, LayoutMismatchError};
pub use vector::FeatureVector;
