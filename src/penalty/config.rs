//! Penalty engine configuration.

use serde::{Deserialize, Serialize};

use crate::moo::fitness::ObjectiveWeights;

/// Configuration for preference penalties. Immutable per optimization run.
///
/// # Defaults
///
/// ```
/// use cartopt::penalty::PenaltyConfig;
///
/// let config = PenaltyConfig::default();
/// assert!(!config.strict_mode);
/// assert_eq!(config.high_cost_sentinel, 1_000_000.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PenaltyConfig {
    /// When set, any preference mismatch excludes the listing instead of
    /// penalizing it: its effective price becomes [`high_cost_sentinel`]
    /// (unusable rather than merely expensive).
    ///
    /// [`high_cost_sentinel`]: PenaltyConfig::high_cost_sentinel
    pub strict_mode: bool,

    /// Effective price assigned to strict-mode mismatches. Must dominate
    /// any realistic plan cost.
    pub high_cost_sentinel: f64,

    /// Objective weights used for scalarization and best-plan selection.
    pub objective_weights: ObjectiveWeights,

    /// Per-rank-step multiplier increment for language downgrades.
    ///
    /// Receiving a *more* common language than asked for is free;
    /// each rank step toward a less common language multiplies the price
    /// by `1.0 + language_step * distance`.
    pub language_step: f64,

    /// Per-rank-step multiplier increment for printing downgrades.
    /// Upgrades (e.g. first edition when unlimited was asked for) are free.
    pub printing_step: f64,

    /// Fixed multiplier for a finish mismatch.
    pub finish_mismatch: f64,

    /// Fixed multiplier for a set mismatch.
    pub set_mismatch: f64,
}

impl Default for PenaltyConfig {
    fn default() -> Self {
        Self {
            strict_mode: false,
            high_cost_sentinel: 1_000_000.0,
            objective_weights: ObjectiveWeights::default(),
            language_step: 0.10,
            printing_step: 0.15,
            finish_mismatch: 1.25,
            set_mismatch: 1.15,
        }
    }
}

impl PenaltyConfig {
    /// Enables or disables strict preference matching.
    pub fn with_strict_mode(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }

    /// Sets the sentinel price for strict-mode mismatches.
    pub fn with_high_cost_sentinel(mut self, sentinel: f64) -> Self {
        self.high_cost_sentinel = sentinel;
        self
    }

    /// Sets the objective weights.
    pub fn with_objective_weights(mut self, weights: ObjectiveWeights) -> Self {
        self.objective_weights = weights;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !self.high_cost_sentinel.is_finite() || self.high_cost_sentinel <= 0.0 {
            return Err("high_cost_sentinel must be positive and finite".into());
        }
        for (name, v) in [
            ("language_step", self.language_step),
            ("printing_step", self.printing_step),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(format!("{name} must be finite and non-negative"));
            }
        }
        for (name, v) in [
            ("finish_mismatch", self.finish_mismatch),
            ("set_mismatch", self.set_mismatch),
        ] {
            if !v.is_finite() || v < 1.0 {
                return Err(format!("{name} must be a multiplier >= 1.0"));
            }
        }
        self.objective_weights.validate()
    }
}
