//! Engine configuration.
//!
//! [`EngineConfig`] is the data-only configuration record accepted at the
//! engine boundary. It deserializes with defaults on every field, so
//! missing keys take the documented defaults and unrecognized keys are
//! ignored.

use serde::{Deserialize, Serialize};

use crate::moo::fitness::ObjectiveWeights;
use crate::penalty::PenaltyConfig;

/// Optimizer implementation to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    /// Exact MILP assignment.
    Exact,
    /// Dominance-sorted evolutionary search (NSGA-II survival).
    Dominance,
    /// Decomposition-based evolutionary search (MOEA/D).
    Decomposition,
    /// Reference-point evolutionary search (NSGA-III survival).
    ReferencePoint,
    /// Exact seed + dominance-sorted refinement + local search.
    HybridDominance,
    /// Exact seed + decomposition refinement + local search.
    HybridDecomposition,
    /// Exact seed + reference-point refinement + local search.
    HybridReferencePoint,
    /// Let the selector pick from problem statistics.
    #[default]
    Auto,
}

impl Algorithm {
    /// Stable algorithm name used in results and logs.
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Exact => "exact",
            Algorithm::Dominance => "dominance",
            Algorithm::Decomposition => "decomposition",
            Algorithm::ReferencePoint => "reference-point",
            Algorithm::HybridDominance => "hybrid-dominance",
            Algorithm::HybridDecomposition => "hybrid-decomposition",
            Algorithm::HybridReferencePoint => "hybrid-reference-point",
            Algorithm::Auto => "auto",
        }
    }

    /// Whether this is one of the hybrid pipelines.
    pub fn is_hybrid(self) -> bool {
        matches!(
            self,
            Algorithm::HybridDominance
                | Algorithm::HybridDecomposition
                | Algorithm::HybridReferencePoint
        )
    }
}

/// Scalarization used by the decomposition variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DecompositionMethod {
    #[default]
    Tchebycheff,
    WeightedSum,
    Pbi,
}

/// Engine configuration record.
///
/// # Defaults
///
/// ```
/// use cartopt::config::{Algorithm, EngineConfig};
///
/// let config = EngineConfig::default();
/// assert_eq!(config.primary_algorithm, Algorithm::Auto);
/// assert_eq!(config.population_size, 100);
/// assert!(!config.strict_preferences);
/// ```
///
/// Unknown keys in serialized input are ignored:
///
/// ```
/// use cartopt::config::EngineConfig;
///
/// let config: EngineConfig =
///     serde_json::from_str(r#"{"population_size": 40, "some_future_key": true}"#).unwrap();
/// assert_eq!(config.population_size, 40);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Optimizer to run; `auto` routes through the selector.
    pub primary_algorithm: Algorithm,

    /// Lower bound on distinct sources (exact optimizer only).
    pub min_sources: Option<u32>,

    /// Upper bound on distinct sources.
    pub max_sources: Option<u32>,

    /// Iteratively re-solve with a shrinking source cap, keeping the best
    /// plan across iterations (exact optimizer).
    pub find_minimum_sources: bool,

    /// Exclude preference-mismatched listings instead of penalizing them.
    pub strict_preferences: bool,

    /// Objective weights; unknown keys in serialized input are ignored.
    pub objective_weights: ObjectiveWeights,

    /// Wall-clock budget for the whole run, in seconds.
    pub time_limit_seconds: f64,

    /// Generation budget for the metaheuristic variants.
    pub max_generations: usize,

    /// Population size for the metaheuristic variants.
    pub population_size: usize,

    /// Neighborhood size for the decomposition variant.
    pub neighborhood_size: usize,

    /// Scalarization for the decomposition variant.
    pub decomposition_method: DecompositionMethod,

    /// Das–Dennis divisions for the reference-point variant.
    pub reference_point_divisions: usize,

    /// Completeness fraction above which a plan counts as acceptable.
    /// Below 1.0 by default to tolerate unsatisfiable wishlists.
    pub acceptable_completeness: f64,

    /// Seed for reproducible runs; `None` draws from entropy.
    pub seed: Option<u64>,

    /// Evaluate populations on the rayon pool.
    pub parallel: bool,

    /// Capacity of the engine-level result cache (0 disables it).
    pub cache_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            primary_algorithm: Algorithm::Auto,
            min_sources: None,
            max_sources: None,
            find_minimum_sources: false,
            strict_preferences: false,
            objective_weights: ObjectiveWeights::default(),
            time_limit_seconds: 30.0,
            max_generations: 300,
            population_size: 100,
            neighborhood_size: 15,
            decomposition_method: DecompositionMethod::default(),
            reference_point_divisions: 4,
            acceptable_completeness: 0.8,
            seed: None,
            parallel: true,
            cache_capacity: 32,
        }
    }
}

impl EngineConfig {
    /// Sets the optimizer to run.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.primary_algorithm = algorithm;
        self
    }

    /// Sets the source cap.
    pub fn with_max_sources(mut self, cap: u32) -> Self {
        self.max_sources = Some(cap);
        self
    }

    /// Enables the iterative minimum-source search.
    pub fn with_find_minimum_sources(mut self, enabled: bool) -> Self {
        self.find_minimum_sources = enabled;
        self
    }

    /// Enables strict preference matching.
    pub fn with_strict_preferences(mut self, strict: bool) -> Self {
        self.strict_preferences = strict;
        self
    }

    /// Sets the wall-clock budget in seconds.
    pub fn with_time_limit_seconds(mut self, seconds: f64) -> Self {
        self.time_limit_seconds = seconds;
        self
    }

    /// Sets the population size.
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    /// Sets the generation budget.
    pub fn with_max_generations(mut self, n: usize) -> Self {
        self.max_generations = n;
        self
    }

    /// Sets the random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Enables or disables parallel evaluation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Derives the penalty configuration for this run.
    pub fn penalty_config(&self) -> PenaltyConfig {
        PenaltyConfig::default()
            .with_strict_mode(self.strict_preferences)
            .with_objective_weights(self.objective_weights)
    }

    /// Validates the configuration.
    ///
    /// Returns `Err` with a description if any parameter is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.population_size < 4 {
            return Err("population_size must be at least 4".into());
        }
        if self.max_generations == 0 {
            return Err("max_generations must be at least 1".into());
        }
        if self.neighborhood_size < 2 {
            return Err("neighborhood_size must be at least 2".into());
        }
        if self.reference_point_divisions == 0 {
            return Err("reference_point_divisions must be at least 1".into());
        }
        if !self.time_limit_seconds.is_finite() || self.time_limit_seconds <= 0.0 {
            return Err("time_limit_seconds must be positive".into());
        }
        if !(0.0..=1.0).contains(&self.acceptable_completeness) {
            return Err("acceptable_completeness must be in [0, 1]".into());
        }
        if let (Some(min), Some(max)) = (self.min_sources, self.max_sources) {
            if min > max {
                return Err("min_sources must not exceed max_sources".into());
            }
        }
        if self.max_sources == Some(0) {
            return Err("max_sources must be at least 1".into());
        }
        self.objective_weights.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_validates() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = EngineConfig::default()
            .with_algorithm(Algorithm::Decomposition)
            .with_max_sources(3)
            .with_population_size(60)
            .with_seed(42);
        assert_eq!(config.primary_algorithm, Algorithm::Decomposition);
        assert_eq!(config.max_sources, Some(3));
        assert_eq!(config.population_size, 60);
        assert_eq!(config.seed, Some(42));
    }

    #[test]
    fn test_algorithm_names_round_trip() {
        for algo in [
            Algorithm::Exact,
            Algorithm::Dominance,
            Algorithm::Decomposition,
            Algorithm::ReferencePoint,
            Algorithm::HybridDominance,
            Algorithm::Auto,
        ] {
            let json = serde_json::to_string(&algo).unwrap();
            assert_eq!(json.trim_matches('"'), algo.name());
            let back: Algorithm = serde_json::from_str(&json).unwrap();
            assert_eq!(back, algo);
        }
    }

    #[test]
    fn test_decomposition_method_kebab_case() {
        let method: DecompositionMethod = serde_json::from_str("\"weighted-sum\"").unwrap();
        assert_eq!(method, DecompositionMethod::WeightedSum);
        let method: DecompositionMethod = serde_json::from_str("\"pbi\"").unwrap();
        assert_eq!(method, DecompositionMethod::Pbi);
    }

    #[test]
    fn test_missing_keys_take_defaults() {
        let config: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(EngineConfig::default()
            .with_population_size(2)
            .validate()
            .is_err());
        assert!(EngineConfig::default()
            .with_time_limit_seconds(0.0)
            .validate()
            .is_err());
        let config = EngineConfig {
            min_sources: Some(5),
            max_sources: Some(2),
            ..Default::default()
        };
        assert!(config.validate().is_err());
        let config = EngineConfig {
            acceptable_completeness: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_penalty_config_carries_strictness() {
        let penalty = EngineConfig::default()
            .with_strict_preferences(true)
            .penalty_config();
        assert!(penalty.strict_mode);
    }

    #[test]
    fn test_hybrid_predicate() {
        assert!(Algorithm::HybridDecomposition.is_hybrid());
        assert!(!Algorithm::Exact.is_hybrid());
    }
}
