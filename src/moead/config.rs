//! Decomposition variant configuration.

use crate::config::{DecompositionMethod, EngineConfig};
use crate::moo::ObjectiveWeights;

/// Configuration for the decomposition-based optimizer.
#[derive(Debug, Clone)]
pub struct MoeadConfig {
    /// Number of weight vectors (= population slots).
    pub population_size: usize,

    /// Neighborhood size per weight vector.
    pub neighborhood_size: usize,

    /// Maximum number of generations before termination.
    pub max_generations: usize,

    /// Probability of applying crossover when producing an offspring.
    pub crossover_rate: f64,

    /// Probability of applying mutation to an offspring.
    pub mutation_rate: f64,

    /// Scalarization method.
    pub method: DecompositionMethod,

    /// Maximum neighbor replacements per offspring; bounds the takeover
    /// of one good solution.
    pub max_replacements: usize,

    /// Generations without improvement before stopping (0 disables).
    pub stagnation_limit: usize,

    /// Completeness fraction above which a plan counts as acceptable.
    pub acceptable_completeness: f64,

    /// Maximum alternates reported from the archive.
    pub archive_cap: usize,

    /// Objective weights for best-plan selection and the history trace.
    pub weights: ObjectiveWeights,

    /// Whether to evaluate the initial population in parallel.
    ///
    /// The generational phase evolves slot by slot (neighbor replacement
    /// is order-dependent) and stays sequential.
    pub parallel: bool,

    /// Random seed for reproducibility.
    pub seed: Option<u64>,
}

impl Default for MoeadConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            neighborhood_size: 15,
            max_generations: 300,
            crossover_rate: 0.9,
            mutation_rate: 0.3,
            method: DecompositionMethod::default(),
            max_replacements: 2,
            stagnation_limit: 50,
            acceptable_completeness: 0.8,
            archive_cap: 10,
            weights: ObjectiveWeights::default(),
            parallel: true,
            seed: None,
        }
    }
}

impl MoeadConfig {
    /// Derives the variant configuration from the engine record.
    pub fn from_engine(config: &EngineConfig) -> Self {
        Self {
            population_size: config.population_size,
            neighborhood_size: config.neighborhood_size.min(config.population_size),
            max_generations: config.max_generations,
            method: config.decomposition_method,
            acceptable_completeness: config.acceptable_completeness,
            weights: config.objective_weights,
            parallel: config.parallel,
            seed: config.seed,
            ..Self::default()
        }
    }

    /// Sets the number of weight vectors.
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    /// Sets the generation budget.
    pub fn with_max_generations(mut self, n: usize) -> Self {
        self.max_generations = n;
        self
    }

    /// Sets the scalarization method.
    pub fn with_method(mut self, method: DecompositionMethod) -> Self {
        self.method = method;
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
        if self.neighborhood_size < 2 {
            return Err("neighborhood_size must be at least 2".into());
        }
        if self.neighborhood_size > self.population_size {
            return Err("neighborhood_size must not exceed population_size".into());
        }
        if self.max_generations == 0 {
            return Err("max_generations must be at least 1".into());
        }
        if self.max_replacements == 0 {
            return Err("max_replacements must be at least 1".into());
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
