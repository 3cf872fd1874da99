//! Test fixtures: tree ensemble artifacts written to temp dirs

use std::path::{Path, PathBuf};

use crate::logic::category::ThreatCategory;
use crate::logic::features::layout;
use super::types::AlgorithmKind;

/// Single-stump ensemble keyed on `feature`: on → `high`, off → `low`
pub fn stump_artifact(
    category: ThreatCategory,
    algorithm: AlgorithmKind,
    layout_version: u8,
    feature: usize,
    low: f32,
    high: f32,
) -> serde_json::Value {
    let l = layout::layout(category, layout_version).expect("known layout");
    serde_json::json!({
        "format": "tree_ensemble",
        "manifest": {
            "format_version": 1,
            "name": format!("{}_{}", category, algorithm),
            "category": category,
            "algorithm": algorithm,
            "input_len": l.len(),
            "layout_version": layout_version,
            "layout_hash": l.hash(),
            "threshold": 0.5
        },
        "base_score": 0.0,
        "trees": [
            { "nodes": [
                { "feature": feature, "threshold": 0.5, "left": 1, "right": 2 },
                { "leaf": low },
                { "leaf": high }
            ] }
        ]
    })
}

/// Probability model that fires when `feature` is on
pub fn detector(category: ThreatCategory, algorithm: AlgorithmKind, feature: usize, on: f32) -> serde_json::Value {
    let version = layout::current_layout(category).version;
    if algorithm.is_boosted() {
        // Margin whose sigmoid is `on`
        let margin = (on / (1.0 - on)).ln();
        stump_artifact(category, algorithm, version, feature, -margin, margin)
    } else {
        stump_artifact(category, algorithm, version, feature, 1.0 - on, on)
    }
}

pub fn write_artifact(dir: &Path, file_name: &str, artifact: &serde_json::Value) -> PathBuf {
    let path = dir.join(file_name);
    std::fs::write(&path, serde_json::to_vec_pretty(artifact).expect("serialize")).expect("write");
    path
}
