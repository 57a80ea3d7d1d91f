//! Strategy Selector: confidence → how much rework the generation step does.
//!
//!   force_regenerate            → full_regeneration
//!   no usable template          → create_new_template
//!   confidence ≥ minimal        → minimal_customization
//!   incremental ≤ c < minimal   → incremental_optimization
//!   c < incremental             → significant_customization
//!
//! Re-evaluated on every call; nothing is remembered between calls.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationStrategy {
    FullRegeneration,
    CreateNewTemplate,
    MinimalCustomization,
    IncrementalOptimization,
    SignificantCustomization,
}

impl OptimizationStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptimizationStrategy::FullRegeneration => "full_regeneration",
            OptimizationStrategy::CreateNewTemplate => "create_new_template",
            OptimizationStrategy::MinimalCustomization => "minimal_customization",
            OptimizationStrategy::IncrementalOptimization => "incremental_optimization",
            OptimizationStrategy::SignificantCustomization => "significant_customization",
        }
    }

    /// Whether the generation step starts from the recommended template's content.
    pub fn uses_template(&self) -> bool {
        matches!(
            self,
            OptimizationStrategy::MinimalCustomization
                | OptimizationStrategy::IncrementalOptimization
                | OptimizationStrategy::SignificantCustomization
        )
    }
}

impl fmt::Display for OptimizationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyThresholds {
    pub minimal: f64,
    pub incremental: f64,
    /// Scores below this after `significant_customization` trigger the fallback.
    pub pass_threshold: f64,
}

impl Default for StrategyThresholds {
    fn default() -> Self {
        Self {
            minimal: 85.0,
            incremental: 70.0,
            pass_threshold: 75.0,
        }
    }
}

pub fn select_strategy(
    confidence: f64,
    has_template: bool,
    force_regenerate: bool,
    thresholds: &StrategyThresholds,
) -> OptimizationStrategy {
    if force_regenerate {
        OptimizationStrategy::FullRegeneration
    } else if !has_template {
        OptimizationStrategy::CreateNewTemplate
    } else if confidence >= thresholds.minimal {
        OptimizationStrategy::MinimalCustomization
    } else if confidence >= thresholds.incremental {
        OptimizationStrategy::IncrementalOptimization
    } else {
        OptimizationStrategy::SignificantCustomization
    }
}

/// The single documented retry: a failing significant customization is
/// redone once as a full regeneration.
pub fn should_fallback(strategy: OptimizationStrategy, score: f64, thresholds: &StrategyThresholds) -> bool {
    strategy == OptimizationStrategy::SignificantCustomization && score < thresholds.pass_threshold
}
