//! FeatureVector Builder
//!
//! Pure transformation RawFeatureBag → FeatureVector, driven by the
//! category layout. No hidden state: the same bag always yields the
//! same vector.

use crate::logic::category::ThreatCategory;
use super::bag::{RawFeatureBag, RawValue};
use super::layout::{self, CategoryLayout, FieldKind, FieldSpec, UNKNOWN_LEVEL_CODE};
use super::vector::FeatureVector;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FeatureError {
    #[error("Schema mismatch for {category}.{field}: {reason}")]
    SchemaMismatch {
        category: ThreatCategory,
        field: String,
        reason: String,
    },

    #[error("Unknown layout version {version} for {category}")]
    UnknownLayoutVersion {
        category: ThreatCategory,
        version: u8,
    },
}

impl FeatureError {
    fn mismatch(category: ThreatCategory, field: &str, reason: String) -> Self {
        FeatureError::SchemaMismatch {
            category,
            field: field.to_string(),
            reason,
        }
    }
}

// ============================================================================
// BUILD
// ============================================================================

/// Build a vector against the current layout of the category
pub fn build(category: ThreatCategory, bag: &RawFeatureBag) -> Result<FeatureVector, FeatureError> {
    build_for_layout(layout::current_layout(category), bag)
}

/// Build a vector against a historical layout version
pub fn build_with_version(
    category: ThreatCategory,
    version: u8,
    bag: &RawFeatureBag,
) -> Result<FeatureVector, FeatureError> {
    let layout = layout::layout(category, version)
        .ok_or(FeatureError::UnknownLayoutVersion { category, version })?;
    build_for_layout(layout, bag)
}

/// Build a vector for an explicit layout.
///
/// Fields the layout doesn't name are ignored.
pub fn build_for_layout(
    layout: &CategoryLayout,
    bag: &RawFeatureBag,
) -> Result<FeatureVector, FeatureError> {
    let values = layout
        .fields
        .iter()
        .map(|field| encode_field(layout.category, field, bag))
        .collect::<Result<Vec<f32>, FeatureError>>()?;

    Ok(FeatureVector::from_layout(layout, values))
}

fn encode_field(
    category: ThreatCategory,
    field: &FieldSpec,
    bag: &RawFeatureBag,
) -> Result<f32, FeatureError> {
    let value = bag.get(field.name).ok_or_else(|| {
        FeatureError::mismatch(category, field.name, "required field missing".to_string())
    })?;

    match (field.kind, value) {
        (FieldKind::Flag, RawValue::Bool(b)) => Ok(if *b { 1.0 } else { 0.0 }),

        (FieldKind::Numeric, RawValue::Number(n)) => {
            if !n.is_finite() {
                return Err(FeatureError::mismatch(
                    category,
                    field.name,
                    format!("non-finite number {}", n),
                ));
            }
            let encoded = *n as f32;
            if !encoded.is_finite() {
                return Err(FeatureError::mismatch(
                    category,
                    field.name,
                    format!("{} is out of f32 range", n),
                ));
            }
            Ok(encoded)
        }

        (FieldKind::Categorical(levels), RawValue::Category(level)) => {
            match levels.iter().position(|l| l.eq_ignore_ascii_case(level)) {
                Some(code) => Ok(code as f32),
                None => {
                    log::debug!(
                        "Unseen level '{}' for {}.{} encoded as {}",
                        level, category, field.name, UNKNOWN_LEVEL_CODE
                    );
                    Ok(UNKNOWN_LEVEL_CODE)
                }
            }
        }

        (kind, other) => Err(FeatureError::mismatch(
            category,
            field.name,
            format!("expected {}, got {}", kind.as_str(), other.kind_name()),
        )),
    }
}
