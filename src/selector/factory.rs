//! Optimizer construction and the runtime fallback boundary.

use tracing::{debug, warn};

use crate::config::{Algorithm, EngineConfig};
use crate::engine::envelope::RunEnvelope;
use crate::error::{Diagnostics, EngineError};
use crate::hybrid::{HybridConfig, HybridRunner};
use crate::milp::{MilpConfig, MilpSolver};
use crate::moead::{MoeadConfig, MoeadRunner};
use crate::model::{OptimizationResult, PurchaseProblem, RunStats, Solution};
use crate::moo::genotype::{evaluate, genotype_from_solution, Candidate};
use crate::moo::ObjectiveWeights;
use crate::normalize::{normalize, RawPlan};
use crate::nsga::{NsgaConfig, NsgaRunner};
use crate::refpoint::{RefPointConfig, RefPointRunner};

/// A constructed optimizer, ready to run against one problem instance.
///
/// Implementations are stateless between runs; all mutable state lives in
/// the run itself.
pub trait Optimizer {
    /// Stable algorithm name.
    fn name(&self) -> &'static str;

    /// Executes the search and returns a normalized result.
    fn run(
        &self,
        problem: &PurchaseProblem,
        envelope: &RunEnvelope,
    ) -> Result<OptimizationResult, EngineError>;
}

/// Instantiates the optimizer for an algorithm id.
///
/// Construction validates the derived configuration and fails fast with a
/// validation error before any search begins. `Auto` must be resolved via
/// [`super::select`] first.
pub fn create(
    algorithm: Algorithm,
    config: &EngineConfig,
) -> Result<Box<dyn Optimizer>, EngineError> {
    config.validate().map_err(EngineError::InvalidConfig)?;

    match algorithm {
        Algorithm::Exact => {
            let milp = MilpConfig::from_engine(config);
            milp.validate().map_err(EngineError::InvalidConfig)?;
            Ok(Box::new(ExactOptimizer {
                config: milp,
                weights: config.objective_weights,
            }))
        }
        Algorithm::Dominance => {
            let nsga = NsgaConfig::from_engine(config);
            nsga.validate().map_err(EngineError::InvalidConfig)?;
            Ok(Box::new(DominanceOptimizer { config: nsga }))
        }
        Algorithm::Decomposition => {
            let moead = MoeadConfig::from_engine(config);
            moead.validate().map_err(EngineError::InvalidConfig)?;
            Ok(Box::new(DecompositionOptimizer { config: moead }))
        }
        Algorithm::ReferencePoint => {
            let refpoint = RefPointConfig::from_engine(config);
            refpoint.validate().map_err(EngineError::InvalidConfig)?;
            Ok(Box::new(ReferencePointOptimizer { config: refpoint }))
        }
        Algorithm::HybridDominance
        | Algorithm::HybridDecomposition
        | Algorithm::HybridReferencePoint => {
            let hybrid = HybridConfig::from_engine(config);
            hybrid.validate().map_err(EngineError::InvalidConfig)?;
            Ok(Box::new(HybridOptimizer {
                config: hybrid,
                name: algorithm.name(),
            }))
        }
        Algorithm::Auto => Err(EngineError::InvalidConfig(
            "auto must be resolved by the selector before construction".into(),
        )),
    }
}

/// Runs an optimizer, retrying with the exact optimizer on a runtime
/// failure. Only construction/validation problems surface as `Err`; a
/// doubly-failed run degrades to an explicit failed result.
pub fn run_with_fallback(
    problem: &PurchaseProblem,
    algorithm: Algorithm,
    config: &EngineConfig,
    envelope: &RunEnvelope,
    diagnostics: &mut Diagnostics,
) -> Result<OptimizationResult, EngineError> {
    let optimizer = create(algorithm, config)?;
    debug!(algorithm = optimizer.name(), "optimizer constructed");

    match optimizer.run(problem, envelope) {
        Ok(result) => Ok(result),
        Err(err) if algorithm != Algorithm::Exact => {
            warn!(algorithm = optimizer.name(), error = %err, "optimizer failed; falling back to exact");
            diagnostics.warn(format!(
                "{} failed ({err}); retried with the exact optimizer",
                optimizer.name()
            ));
            let fallback = create(Algorithm::Exact, config)?;
            match fallback.run(problem, envelope) {
                Ok(mut result) => {
                    result.stats.fallback_used = true;
                    Ok(result)
                }
                Err(fallback_err) => {
                    diagnostics.warn(format!("exact fallback also failed: {fallback_err}"));
                    Ok(failed_result(algorithm.name(), problem, diagnostics.clone()))
                }
            }
        }
        Err(err) => {
            diagnostics.warn(format!("exact optimizer failed: {err}"));
            Ok(failed_result(algorithm.name(), problem, diagnostics.clone()))
        }
    }
}

fn failed_result(
    name: &str,
    problem: &PurchaseProblem,
    diagnostics: Diagnostics,
) -> OptimizationResult {
    OptimizationResult::failed(
        name,
        problem.stats.required_total,
        problem.stats.required_unique as u32,
        problem.wishlist.iter().map(|w| w.item_name.clone()).collect(),
        diagnostics,
    )
}

/// Convergence metric for a normalized plan: weighted scalarization of
/// its objective vector, infinite when nothing was allocated.
fn metric_for(solution: &Solution, problem: &PurchaseProblem, weights: &ObjectiveWeights) -> f64 {
    if solution.found_total == 0 {
        return f64::INFINITY;
    }
    let slots = genotype_from_solution(solution, problem);
    evaluate(&slots, problem).weighted(weights)
}

/// Assembles an [`OptimizationResult`] from a metaheuristic's best
/// candidate and reporting front.
#[allow(clippy::too_many_arguments)]
fn result_from_candidates(
    name: &'static str,
    best: Candidate,
    front: Vec<Candidate>,
    weights: &ObjectiveWeights,
    problem: &PurchaseProblem,
    envelope: &RunEnvelope,
    iteration_count: usize,
    stats: RunStats,
) -> OptimizationResult {
    let best_solution = normalize(RawPlan::Genotype(best.slots), problem);
    let alternates: Vec<Solution> = front
        .into_iter()
        .map(|candidate| normalize(RawPlan::Genotype(candidate.slots), problem))
        .filter(|solution| solution != &best_solution)
        .collect();
    let convergence_metric = if best_solution.found_total == 0 {
        f64::INFINITY
    } else {
        best.objectives.weighted(weights)
    };

    OptimizationResult {
        best_solution,
        alternates,
        algorithm_name: name.into(),
        wall_time: envelope.elapsed(),
        iteration_count,
        convergence_metric,
        stats,
        diagnostics: Diagnostics::new(),
    }
}

struct ExactOptimizer {
    config: MilpConfig,
    weights: ObjectiveWeights,
}

impl Optimizer for ExactOptimizer {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn run(
        &self,
        problem: &PurchaseProblem,
        envelope: &RunEnvelope,
    ) -> Result<OptimizationResult, EngineError> {
        let result = MilpSolver::run(problem, &self.config, envelope)?;
        let convergence_metric = metric_for(&result.best, problem, &self.weights);
        Ok(OptimizationResult {
            convergence_metric,
            best_solution: result.best,
            alternates: result.alternates,
            algorithm_name: self.name().into(),
            wall_time: envelope.elapsed(),
            iteration_count: result.iterations,
            stats: RunStats {
                iterations: result.iterations,
                time_limit_hit: result.time_limit_hit,
                ..Default::default()
            },
            diagnostics: Diagnostics::new(),
        })
    }
}

struct DominanceOptimizer {
    config: NsgaConfig,
}

impl Optimizer for DominanceOptimizer {
    fn name(&self) -> &'static str {
        "dominance"
    }

    fn run(
        &self,
        problem: &PurchaseProblem,
        envelope: &RunEnvelope,
    ) -> Result<OptimizationResult, EngineError> {
        let result = NsgaRunner::run(problem, &self.config, envelope);
        let stats = RunStats {
            iterations: result.generations,
            evaluations: result.evaluations,
            stagnated: result.stagnated,
            time_limit_hit: result.time_limit_hit,
            archive_size: result.front.len(),
            history: result.history,
            ..Default::default()
        };
        Ok(result_from_candidates(
            self.name(),
            result.best,
            result.front,
            &self.config.weights,
            problem,
            envelope,
            result.generations,
            stats,
        ))
    }
}

struct DecompositionOptimizer {
    config: MoeadConfig,
}

impl Optimizer for DecompositionOptimizer {
    fn name(&self) -> &'static str {
        "decomposition"
    }

    fn run(
        &self,
        problem: &PurchaseProblem,
        envelope: &RunEnvelope,
    ) -> Result<OptimizationResult, EngineError> {
        let result = MoeadRunner::run(problem, &self.config, envelope);
        let stats = RunStats {
            iterations: result.generations,
            evaluations: result.evaluations,
            stagnated: result.stagnated,
            time_limit_hit: result.time_limit_hit,
            archive_size: result.archive_size,
            history: result.history,
            ..Default::default()
        };
        Ok(result_from_candidates(
            self.name(),
            result.best,
            result.archive,
            &self.config.weights,
            problem,
            envelope,
            result.generations,
            stats,
        ))
    }
}

struct ReferencePointOptimizer {
    config: RefPointConfig,
}

impl Optimizer for ReferencePointOptimizer {
    fn name(&self) -> &'static str {
        "reference-point"
    }

    fn run(
        &self,
        problem: &PurchaseProblem,
        envelope: &RunEnvelope,
    ) -> Result<OptimizationResult, EngineError> {
        let result = RefPointRunner::run(problem, &self.config, envelope);
        let stats = RunStats {
            iterations: result.generations,
            evaluations: result.evaluations,
            stagnated: result.stagnated,
            time_limit_hit: result.time_limit_hit,
            archive_size: result.front.len(),
            history: result.history,
            ..Default::default()
        };
        Ok(result_from_candidates(
            self.name(),
            result.best,
            result.front,
            &self.config.weights,
            problem,
            envelope,
            result.generations,
            stats,
        ))
    }
}

struct HybridOptimizer {
    config: HybridConfig,
    name: &'static str,
}

impl Optimizer for HybridOptimizer {
    fn name(&self) -> &'static str {
        self.name
    }

    fn run(
        &self,
        problem: &PurchaseProblem,
        envelope: &RunEnvelope,
    ) -> Result<OptimizationResult, EngineError> {
        let result = HybridRunner::run(problem, &self.config, envelope)?;
        let stats = RunStats {
            iterations: result.generations,
            evaluations: result.evaluations,
            stagnated: result.stagnated,
            time_limit_hit: result.time_limit_hit,
            seeded: result.seeded,
            archive_size: result.front.len(),
            history: result.history,
            ..Default::default()
        };
        Ok(result_from_candidates(
            self.name,
            result.best,
            result.front,
            &self.config.weights,
            problem,
            envelope,
            result.generations,
            stats,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConditionGrade, Language, Listing, Printing, WishlistItem};
    use crate::penalty::PenaltyConfig;

    fn listing(item: &str, source: u64, price: f64, avail: u32) -> Listing {
        Listing {
            item_name: item.into(),
            source_id: source,
            source_name: format!("Source{source}"),
            price,
            quantity_available: avail,
            quality_grade: ConditionGrade::NearMint,
            language: Language::English,
            printing: Printing::Unlimited,
            is_special_finish: false,
            set_name: "Alpha".into(),
        }
    }

    fn small_problem() -> PurchaseProblem {
        let listings = vec![
            listing("CardA", 1, 1.0, 2),
            listing("CardA", 2, 1.5, 5),
            listing("CardB", 1, 2.0, 1),
        ];
        let wishlist = vec![WishlistItem::new("CardA", 2), WishlistItem::new("CardB", 1)];
        let mut diag = Diagnostics::new();
        PurchaseProblem::build(&listings, &wishlist, PenaltyConfig::default(), &mut diag).unwrap()
    }

    fn engine_config() -> EngineConfig {
        EngineConfig::default()
            .with_population_size(20)
            .with_max_generations(30)
            .with_seed(42)
            .with_parallel(false)
    }

    #[test]
    fn test_create_rejects_auto() {
        let result = create(Algorithm::Auto, &engine_config());
        assert!(matches!(result, Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn test_create_fails_fast_on_bad_config() {
        let config = engine_config().with_population_size(1);
        assert!(matches!(
            create(Algorithm::Dominance, &config),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_every_algorithm_constructs_and_runs() {
        let problem = small_problem();
        let config = engine_config();
        for algorithm in [
            Algorithm::Exact,
            Algorithm::Dominance,
            Algorithm::Decomposition,
            Algorithm::ReferencePoint,
            Algorithm::HybridDominance,
        ] {
            let optimizer = create(algorithm, &config).unwrap();
            assert_eq!(optimizer.name(), algorithm.name());
            let result = optimizer.run(&problem, &RunEnvelope::new(None)).unwrap();
            assert_eq!(result.algorithm_name, algorithm.name());
            assert!(
                result.best_solution.is_complete,
                "{algorithm:?} should complete the trivial wishlist"
            );
            assert!(result.convergence_metric.is_finite());
        }
    }

    #[test]
    fn test_alternates_exclude_best() {
        let problem = small_problem();
        let optimizer = create(Algorithm::Dominance, &engine_config()).unwrap();
        let result = optimizer.run(&problem, &RunEnvelope::new(None)).unwrap();
        for alternate in &result.alternates {
            assert_ne!(alternate, &result.best_solution);
        }
    }

    #[test]
    fn test_fallback_not_flagged_on_success() {
        let problem = small_problem();
        let mut diagnostics = Diagnostics::new();
        let result = run_with_fallback(
            &problem,
            Algorithm::Dominance,
            &engine_config(),
            &RunEnvelope::new(None),
            &mut diagnostics,
        )
        .unwrap();
        assert!(!result.stats.fallback_used);
        assert!(!diagnostics.has_warnings());
    }
}
