use serde::{Deserialize, Serialize};

/// Tunable orchestration parameters, passed explicitly at public entry
/// points alongside the `ContextDescriptor` (§5: no persistent
/// process-wide state, so unlike the layered `GlobalConfig` this type's
/// ancestry is modeled on, there is no file/env loading here — a caller
/// builds or overrides one value and threads it through).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanflowConfig {
    pub detection: DetectionConfig,
    pub dedup: DedupConfig,
    pub merge: MergeConfig,
    pub rename: RenameConfig,
}

impl Default for PanflowConfig {
    fn default() -> Self {
        Self {
            detection: DetectionConfig::default(),
            dedup: DedupConfig::default(),
            merge: MergeConfig::default(),
            rename: RenameConfig::default(),
        }
    }
}

/// Device-kind auto-detection tuning (§4.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Minimum weighted score required before a marker-based device-kind
    /// guess is accepted; below this, ties break to `firewall`.
    pub confidence_threshold: f64,
    pub device_group_marker_weight: f64,
    pub panorama_block_marker_weight: f64,
    pub vsys_entries_marker_weight: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.5,
            device_group_marker_weight: 0.5,
            panorama_block_marker_weight: 0.3,
            vsys_entries_marker_weight: 0.2,
        }
    }
}

/// Default deduplication knobs (§4.8); callers may override per call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupConfig {
    pub default_strategy: SurvivorStrategy,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self { default_strategy: SurvivorStrategy::ShortestName }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SurvivorStrategy {
    First,
    ShortestName,
    LongestName,
    Alphabetical,
    HighestContext,
}

/// Default merge-conflict behavior (§4.9).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeConfig {
    pub default_strategy: ConflictStrategy,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self { default_strategy: ConflictStrategy::Skip }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictStrategy {
    Skip,
    Overwrite,
    Merge,
    Rename,
}

/// Default rename-collision suffixing (§4.9, merge `rename` strategy;
/// §8 Scenario E).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameConfig {
    pub suffix_separator: String,
    pub return_rule_suffix: String,
}

impl Default for RenameConfig {
    fn default() -> Self {
        Self {
            suffix_separator: "_".to_string(),
            return_rule_suffix: "-return".to_string(),
        }
    }
}
