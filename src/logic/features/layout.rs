//! Feature Layout - Per-Category Feature Schemas
//!
//! **CRITICAL: This file controls the model input schema**
//!
//! ## Rules (NEVER break these):
//! 1. Add field → add a new layout version, keep the old one
//! 2. Change order → add a new layout version
//! 3. Remove field → add a new layout version
//!
//! Old versions stay in the tables so models trained against them keep
//! receiving the exact vector they were trained on.

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

use crate::logic::category::ThreatCategory;

// ============================================================================
// FIELD DEFINITIONS
// ============================================================================

/// Kind of observation expected for a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Boolean observation, encoded as 0.0 / 1.0
    Flag,
    /// Finite numeric observation, encoded as-is
    Numeric,
    /// String observation, encoded as the index of its level
    Categorical(&'static [&'static str]),
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Flag => "flag",
            FieldKind::Numeric => "numeric",
            FieldKind::Categorical(_) => "categorical",
        }
    }
}

/// One named slot of a layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

const fn flag(name: &'static str) -> FieldSpec {
    FieldSpec { name, kind: FieldKind::Flag }
}

const fn numeric(name: &'static str) -> FieldSpec {
    FieldSpec { name, kind: FieldKind::Numeric }
}

const fn categorical(name: &'static str, levels: &'static [&'static str]) -> FieldSpec {
    FieldSpec { name, kind: FieldKind::Categorical(levels) }
}

/// Code used for a categorical level the layout does not know
pub const UNKNOWN_LEVEL_CODE: f32 = -1.0;

/// PE machine types seen in the ransomware training set
pub const MACHINE_LEVELS: &[&str] = &["i386", "amd64", "arm", "arm64"];

// ============================================================================
// LAYOUT TABLES (Authoritative source)
// ============================================================================

const RANSOMWARE_V1: &[FieldSpec] = &[
    flag("fileDownloadBehavior"),  // 0
    flag("encryptionPatterns"),    // 1
    flag("networkProtocols"),      // 2
    flag("fileSystemActivities"),  // 3
];

const RANSOMWARE_V2: &[FieldSpec] = &[
    flag("fileDownloadBehavior"),  // 0
    flag("encryptionPatterns"),    // 1
    flag("networkProtocols"),      // 2
    flag("fileSystemActivities"),  // 3
    // === Downloaded artifact statistics (4-8) ===
    categorical("machine", MACHINE_LEVELS), // 4
    numeric("fileSizeKb"),         // 5
    numeric("byteEntropy"),        // 6: Shannon entropy, 0-8 bits
    flag("suspiciousStrings"),     // 7: bitcoin / wallet / encrypt markers
    flag("hasMzHeader"),           // 8
];

const PHISHING_V1: &[FieldSpec] = &[
    flag("urlStructure"),
    flag("domainReputation"),
    flag("htmlContent"),
    flag("sslCertificates"),
    flag("phishingKeywords"),
];

const TROJAN_V1: &[FieldSpec] = &[
    flag("networkTrafficAnomalies"),
    flag("systemCallPatterns"),
    flag("fileSystemModifications"),
    flag("processBehavior"),
    flag("registryChanges"),
];

const RANSOMWARE_LAYOUTS: &[CategoryLayout] = &[
    CategoryLayout { category: ThreatCategory::Ransomware, version: 1, fields: RANSOMWARE_V1 },
    CategoryLayout { category: ThreatCategory::Ransomware, version: 2, fields: RANSOMWARE_V2 },
];

const PHISHING_LAYOUTS: &[CategoryLayout] = &[
    CategoryLayout { category: ThreatCategory::Phishing, version: 1, fields: PHISHING_V1 },
];

const TROJAN_LAYOUTS: &[CategoryLayout] = &[
    CategoryLayout { category: ThreatCategory::Trojan, version: 1, fields: TROJAN_V1 },
];

// ============================================================================
// CATEGORY LAYOUT
// ============================================================================

/// Versioned, ordered field schema for one category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryLayout {
    pub category: ThreatCategory,
    pub version: u8,
    pub fields: &'static [FieldSpec],
}

impl CategoryLayout {
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// CRC32 over category, version, and ordered field names
    pub fn hash(&self) -> u32 {
        let mut hasher = Hasher::new();
        hasher.update(self.category.as_str().as_bytes());
        hasher.update(&[0, self.version]);
        for field in self.fields {
            hasher.update(field.name.as_bytes());
            hasher.update(&[0]); // Separator
        }
        hasher.finalize()
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.name).collect()
    }

    pub fn info(&self) -> LayoutInfo {
        LayoutInfo {
            category: self.category,
            version: self.version,
            hash: self.hash(),
            feature_count: self.len(),
            feature_names: self.fields.iter().map(|f| f.name.to_string()).collect(),
        }
    }
}

/// All known layouts for a category, oldest first
pub fn layouts(category: ThreatCategory) -> &'static [CategoryLayout] {
    match category {
        ThreatCategory::Ransomware => RANSOMWARE_LAYOUTS,
        ThreatCategory::Phishing => PHISHING_LAYOUTS,
        ThreatCategory::Trojan => TROJAN_LAYOUTS,
    }
}

/// Layout a specific version of a category
pub fn layout(category: ThreatCategory, version: u8) -> Option<&'static CategoryLayout> {
    layouts(category).iter().find(|l| l.version == version)
}

/// Newest layout for a category
pub fn current_layout(category: ThreatCategory) -> &'static CategoryLayout {
    let all = layouts(category);
    &all[all.len() - 1]
}

// ============================================================================
// LAYOUT INFO
// ============================================================================

/// Complete layout information for serialization/logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub category: ThreatCategory,
    pub version: u8,
    pub hash: u32,
    pub feature_count: usize,
    pub feature_names: Vec<String>,
}

// ============================================================================
// LAYOUT VALIDATION
// ============================================================================

/// Error when a vector or model layout doesn't match the expected one
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Feature layout mismatch for {category}: expected v{expected_version} (hash: {expected_hash:08x}), got v{actual_version} (hash: {actual_hash:08x})")]
pub struct LayoutMismatchError {
    pub category: ThreatCategory,
    pub expected_version: u8,
    pub expected_hash: u32,
    pub actual_version: u8,
    pub actual_hash: u32,
}

/// Validate that a (version, hash) pair names a known layout of the category
pub fn validate_layout(
    category: ThreatCategory,
    version: u8,
    hash: u32,
) -> Result<&'static CategoryLayout, LayoutMismatchError> {
    let current = current_layout(category);
    match layout(category, version) {
        Some(found) if found.hash() == hash => Ok(found),
        Some(found) => Err(LayoutMismatchError {
            category,
            expected_version: found.version,
            expected_hash: found.hash(),
            actual_version: version,
            actual_hash: hash,
        }),
        None => Err(LayoutMismatchError {
            category,
            expected_version: current.version,
            expected_hash: current.hash(),
            actual_version: version,
            actual_hash: hash,
        }),
    }
}

// ============================================================================
// TESTS
// ============================================================================
