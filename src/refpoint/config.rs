//! Reference-point variant configuration.

use crate::config::EngineConfig;
use crate::moo::ObjectiveWeights;

/// Configuration for the reference-point optimizer.
#[derive(Debug, Clone)]
pub struct RefPointConfig {
    /// Number of individuals in the population.
    pub population_size: usize,

    /// Maximum number of generations before termination.
    pub max_generations: usize,

    /// Das–Dennis divisions per objective for the direction lattice.
    pub divisions: usize,

    /// Probability of applying crossover to a pair of parents (0.0–1.0).
    pub crossover_rate: f64,

    /// Probability of applying mutation to an offspring (0.0–1.0).
    pub mutation_rate: f64,

    /// Generations without improvement before stopping (0 disables).
    pub stagnation_limit: usize,

    /// Completeness fraction above which a plan counts as acceptable.
    pub acceptable_completeness: f64,

    /// Maximum alternates reported from the final front.
    pub archive_cap: usize,

    /// Objective weights for best-plan selection and the history trace.
    pub weights: ObjectiveWeights,

    /// Whether to evaluate individuals in parallel using rayon.
    pub parallel: bool,

    /// Random seed for reproducibility.
    pub seed: Option<u64>,
}

impl Default for RefPointConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            max_generations: 300,
            divisions: 4,
            crossover_rate: 0.9,
            mutation_rate: 0.2,
            stagnation_limit: 50,
            acceptable_completeness: 0.8,
            archive_cap: 10,
            weights: ObjectiveWeights::default(),
            parallel: true,
            seed: None,
        }
    }
}

impl RefPointConfig {
    /// Derives the variant configuration from the engine record.
    pub fn from_engine(config: &EngineConfig) -> Self {
        Self {
            population_size: config.population_size,
            max_generations: config.max_generations,
            divisions: config.reference_point_divisions,
            acceptable_completeness: config.acceptable_completeness,
            weights: config.objective_weights,
            parallel: config.parallel,
            seed: config.seed,
            ..Self::default()
        }
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

    /// Sets the lattice divisions.
    pub fn with_divisions(mut self, divisions: usize) -> Self {
        self.divisions = divisions;
        self
    }

    /// Sets the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.population_size < 4 {
            return Err("population_size must be at least 4".into());
        }
        if self.max_generations == 0 {
            return Err("max_generations must be at least 1".into());
        }
        if self.divisions == 0 {
            return Err("divisions must be at least 1".into());
        }
        if !(0.0..=1.0).contains(&self.crossover_rate) {
            return Err("crossover_rate must be in [0, 1]".into());
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err("mutation_rate must be in [0, 1]".into());
        }
        if !(0.0..=1.0).contains(&self.acceptable_completeness) {
            return Err("acceptable_completeness must be in [0, 1]".into());
        }
        if self.archive_cap == 0 {
            return Err("archive_cap must be at least 1".into());
        }
        self.weights.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_validates() {
        assert!(RefPointConfig::default().validate().is_ok());
    }

    #[test]
    fn test_from_engine_carries_divisions() {
        let engine = EngineConfig {
            reference_point_divisions: 6,
            ..Default::default()
        };
        assert_eq!(RefPointConfig::from_engine(&engine).divisions, 6);
    }

    #[test]
    fn test_validate_rejects_zero_divisions() {
        let config = RefPointConfig::default().with_divisions(0);
        assert!(config.validate().is_err());
    }
}
