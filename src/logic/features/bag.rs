//! Raw Feature Bag - unvalidated observations from collectors
//!
//! One bag per category, keyed by the layout field names
//! (`fileDownloadBehavior`, `domainReputation`, ...).

use std::collections::{BTreeMap, HashMap};
use serde::{Deserialize, Serialize};

use crate::logic::category::ThreatCategory;

/// One observation as handed over by a collector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Bool(bool),
    Number(f64),
    Category(String),
}

impl RawValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            RawValue::Bool(_) => "boolean",
            RawValue::Number(_) => "number",
            RawValue::Category(_) => "string",
        }
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        RawValue::Bool(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Category(value.to_string())
    }
}

/// Observation set for one category. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawFeatureBag {
    values: BTreeMap<String, RawValue>,
}

impl RawFeatureBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert used by collectors before hand-off
    pub fn with(mut self, name: &str, value: impl Into<RawValue>) -> Self {
        self.values.insert(name.to_string(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&RawValue> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl FromIterator<(String, RawValue)> for RawFeatureBag {
    fn from_iter<I: IntoIterator<Item = (String, RawValue)>>(iter: I) -> Self {
        Self { values: iter.into_iter().collect() }
    }
}

/// Bags for one navigation attempt. A missing category was not observed.
pub type CategoryBags = HashMap<ThreatCategory, RawFeatureBag>;
