//! Feature Vector - Core data structure for ML input
//!
//! **Versioned feature vector with layout validation**
//!
//! Every vector remembers the category layout it was built against, so a
//! model can reject input laid out for a different schema.

use serde::{Deserialize, Serialize};

use crate::logic::category::ThreatCategory;
use super::layout::{self, CategoryLayout, LayoutMismatchError};

// ============================================================================
// VERSIONED FEATURE VECTOR
// ============================================================================

/// Versioned Feature Vector with layout metadata
///
/// Only produced by the builder; values follow the order of the layout
/// named by `(category, version)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub category: ThreatCategory,
    /// Feature layout version
    pub version: u8,
    /// CRC32 hash of the feature layout (for mismatch detection)
    pub layout_hash: u32,
    /// Feature values in layout order
    pub values: Vec<f32>,
}

impl FeatureVector {
    pub(crate) fn from_layout(layout: &CategoryLayout, values: Vec<f32>) -> Self {
        Self {
            category: layout.category,
            version: layout.version,
            layout_hash: layout.hash(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get values as slice
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    /// Get feature by index
    pub fn get(&self, index: usize) -> Option<f32> {
        self.values.get(index).copied()
    }

    /// Get feature by name
    pub fn get_by_name(&self, name: &str) -> Option<f32> {
        self.layout()
            .and_then(|l| l.field_index(name))
            .and_then(|i| self.get(i))
    }

    /// Layout this vector was built against
    pub fn layout(&self) -> Option<&'static CategoryLayout> {
        layout::layout(self.category, self.version)
    }

    /// Validate that this vector matches a known layout
    pub fn validate(&self) -> Result<(), LayoutMismatchError> {
        layout::validate_layout(self.category, self.version, self.layout_hash).map(|_| ())
    }

    /// Check if this vector is compatible with a known layout
    pub fn is_compatible(&self) -> bool {
        self.validate().is_ok()
    }

    /// Convert to JSON-serializable format for logging
    pub fn to_log_entry(&self) -> serde_json::Value {
        let names = self.layout().map(|l| l.field_names()).unwrap_or_default();
        serde_json::json!({
            "category": self.category,
            "feature_version": self.version,
            "layout_hash": self.layout_hash,
            "values": self.values,
            "named_values": names.iter()
                .zip(self.values.iter())
                .map(|(name, value)| (name.to_string(), *value))
                .collect::<std::collections::BTreeMap<_, _>>(),
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
