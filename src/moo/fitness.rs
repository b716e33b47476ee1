//! Objective vectors and scalarization weights.
//!
//! Every candidate plan is scored on a fixed-arity vector of four
//! objectives, all **minimized**:
//!
//! | index | objective | stored as |
//! |-------|--------------------|---------------------|
//! | 0     | total cost         | cost                |
//! | 1     | quality            | negated mean score  |
//! | 2     | completeness       | negated fraction    |
//! | 3     | distinct sources   | count               |
//!
//! Maximized quantities are negated at construction so dominance and
//! scalarization only ever deal with minimization.

use serde::{Deserialize, Serialize};

/// Number of objectives.
pub const NUM_OBJECTIVES: usize = 4;

/// Index of the cost objective.
pub const OBJ_COST: usize = 0;
/// Index of the (negated) quality objective.
pub const OBJ_QUALITY: usize = 1;
/// Index of the (negated) completeness objective.
pub const OBJ_COMPLETENESS: usize = 2;
/// Index of the source-count objective.
pub const OBJ_SOURCES: usize = 3;

/// A fixed-arity objective vector, all components minimized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Objectives {
    pub values: [f64; NUM_OBJECTIVES],
}

impl Objectives {
    /// Builds an objective vector from natural-direction measurements.
    ///
    /// `quality` and `completeness` are given in their natural "higher is
    /// better" direction and negated internally.
    pub fn new(cost: f64, quality: f64, completeness: f64, source_count: usize) -> Self {
        Self {
            values: [cost, -quality, -completeness, source_count as f64],
        }
    }

    /// The worst possible vector; used for uninitialized individuals.
    pub fn worst() -> Self {
        Self {
            values: [f64::INFINITY; NUM_OBJECTIVES],
        }
    }

    /// Total cost.
    pub fn cost(&self) -> f64 {
        self.values[OBJ_COST]
    }

    /// Quality in its natural direction (higher is better).
    pub fn quality(&self) -> f64 {
        -self.values[OBJ_QUALITY]
    }

    /// Completeness fraction in `[0, 1]`.
    pub fn completeness(&self) -> f64 {
        -self.values[OBJ_COMPLETENESS]
    }

    /// Distinct sources used.
    pub fn source_count(&self) -> usize {
        self.values[OBJ_SOURCES] as usize
    }

    /// Pareto dominance: better-or-equal everywhere, strictly better somewhere.
    pub fn dominates(&self, other: &Objectives) -> bool {
        let mut strictly_better = false;
        for (a, b) in self.values.iter().zip(other.values.iter()) {
            if a > b {
                return false;
            }
            if a < b {
                strictly_better = true;
            }
        }
        strictly_better
    }

    /// Weighted-sum scalarization; lower is better.
    pub fn weighted(&self, weights: &ObjectiveWeights) -> f64 {
        self.values[OBJ_COST] * weights.cost
            + self.values[OBJ_QUALITY] * weights.quality
            + self.values[OBJ_COMPLETENESS] * weights.completeness
            + self.values[OBJ_SOURCES] * weights.sources
    }
}

/// Relative importance of the four objectives.
///
/// Completeness carries the largest default weight: a plan that finds more
/// of the wishlist beats a marginally cheaper one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectiveWeights {
    pub cost: f64,
    pub quality: f64,
    pub completeness: f64,
    pub sources: f64,
}

impl Default for ObjectiveWeights {
    fn default() -> Self {
        Self {
            cost: 1.0,
            quality: 10.0,
            completeness: 10_000.0,
            sources: 2.0,
        }
    }
}

impl ObjectiveWeights {
    /// Builds weights from `(key, value)` pairs, ignoring unknown keys.
    ///
    /// Recognized keys: `cost`, `quality`, `completeness`, `sources`.
    /// Missing keys keep their defaults.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut weights = Self::default();
        for (key, value) in pairs {
            match key {
                "cost" => weights.cost = value,
                "quality" => weights.quality = value,
                "completeness" => weights.completeness = value,
                "sources" => weights.sources = value,
                _ => {}
            }
        }
        weights
    }

    /// Validates that all weights are finite and non-negative.
    pub fn validate(&self) -> Result<(), String> {
        for (name, w) in [
            ("cost", self.cost),
            ("quality", self.quality),
            ("completeness", self.completeness),
            ("sources", self.sources),
        ] {
            if !w.is_finite() || w < 0.0 {
                return Err(format!("objective weight '{name}' must be finite and non-negative"));
            }
        }
        Ok(())
    }
}
