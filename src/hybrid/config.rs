//! Hybrid pipeline configuration.

use crate::config::{Algorithm, EngineConfig};
use crate::milp::MilpConfig;
use crate::moead::MoeadConfig;
use crate::moo::ObjectiveWeights;
use crate::nsga::NsgaConfig;
use crate::refpoint::RefPointConfig;

/// The metaheuristic used for the refinement phase, with its
/// configuration.
#[derive(Debug, Clone)]
pub enum RefinementConfig {
    Dominance(NsgaConfig),
    Decomposition(MoeadConfig),
    ReferencePoint(RefPointConfig),
}

/// Configuration for the exact + metaheuristic + local-search pipeline.
#[derive(Debug, Clone)]
pub struct HybridConfig {
    /// Phase-1 exact configuration (run unconstrained by default; the
    /// engine's source bounds carry over).
    pub exact: MilpConfig,

    /// Phase-2 refinement variant and configuration.
    pub refinement: RefinementConfig,

    /// Fraction of the remaining budget granted to the exact seed phase.
    pub seed_budget_fraction: f64,

    /// Hard cap on the seed phase, in milliseconds.
    pub seed_budget_cap_ms: u64,

    /// Hard cap on the local-search phase, in milliseconds.
    pub polish_budget_cap_ms: u64,

    /// Mutated copies of the seed injected into the initial population.
    pub seed_variants: usize,

    /// Local-search pass budget.
    pub polish_passes: usize,

    /// Objective weights for final best selection.
    pub weights: ObjectiveWeights,

    /// Completeness fraction above which a plan counts as acceptable.
    pub acceptable_completeness: f64,

    /// Random seed for the mutated seed variants.
    pub seed: Option<u64>,
}

impl HybridConfig {
    /// Derives the pipeline configuration from the engine record, picking
    /// the refinement variant from `primary_algorithm` (dominance when the
    /// record does not name a hybrid).
    pub fn from_engine(config: &EngineConfig) -> Self {
        let refinement = match config.primary_algorithm {
            Algorithm::HybridDecomposition => {
                RefinementConfig::Decomposition(MoeadConfig::from_engine(config))
            }
            Algorithm::HybridReferencePoint => {
                RefinementConfig::ReferencePoint(RefPointConfig::from_engine(config))
            }
            _ => RefinementConfig::Dominance(NsgaConfig::from_engine(config)),
        };
        Self {
            exact: MilpConfig::from_engine(config),
            refinement,
            seed_budget_fraction: 0.25,
            seed_budget_cap_ms: 5_000,
            polish_budget_cap_ms: 2_000,
            seed_variants: 8,
            polish_passes: 16,
            weights: config.objective_weights,
            acceptable_completeness: config.acceptable_completeness,
            seed: config.seed,
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.seed_budget_fraction) {
            return Err("seed_budget_fraction must be in [0, 1]".into());
        }
        if self.seed_budget_cap_ms == 0 || self.polish_budget_cap_ms == 0 {
            return Err("phase budget caps must be positive".into());
        }
        if self.polish_passes == 0 {
            return Err("polish_passes must be at least 1".into());
        }
        self.exact.validate()?;
        match &self.refinement {
            RefinementConfig::Dominance(c) => c.validate(),
            RefinementConfig::Decomposition(c) => c.validate(),
            RefinementConfig::ReferencePoint(c) => c.validate(),
        }
    }
}
