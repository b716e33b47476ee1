//! Exact seed → metaheuristic refinement → bounded local search.
//!
//! Phase 1 runs the exact optimizer with a short budget; its plan (and
//! mutated variants of it) seed the refinement population instead of fully
//! random individuals. Phase 3 polishes the selected best within a fixed
//! budget, accepting only steps that keep completeness and improve cost,
//! quality, or source count.

use std::time::Duration;

use tracing::debug;

use super::config::{HybridConfig, RefinementConfig};
use super::local_search::polish;
use crate::engine::envelope::RunEnvelope;
use crate::error::EngineError;
use crate::milp::MilpSolver;
use crate::model::PurchaseProblem;
use crate::moo::genotype::{self, Candidate};
use crate::moo::operators::resample_mutation;
use crate::random::rng_from_option;

/// Result of a hybrid pipeline run.
#[derive(Debug, Clone)]
pub struct HybridResult {
    /// Best candidate after refinement and polishing.
    pub best: Candidate,

    /// Refinement-phase front/archive, best-first.
    pub front: Vec<Candidate>,

    /// Refinement generations executed.
    pub generations: usize,

    /// Fitness evaluations across all phases.
    pub evaluations: usize,

    /// Whether phase 1 produced a usable seed.
    pub seeded: bool,

    /// Whether any phase stopped on the time budget.
    pub time_limit_hit: bool,

    /// Whether the refinement phase stagnated.
    pub stagnated: bool,

    /// Best weighted fitness per refinement generation.
    pub history: Vec<f64>,
}

/// Executes the hybrid pipeline.
pub struct HybridRunner;

impl HybridRunner {
    /// Runs all three phases.
    pub fn run(
        problem: &PurchaseProblem,
        config: &HybridConfig,
        envelope: &RunEnvelope,
    ) -> Result<HybridResult, EngineError> {
        config.validate().map_err(EngineError::InvalidConfig)?;

        let mut rng = rng_from_option(config.seed);

        // Phase 1: exact seed under a short budget.
        let seed_cap = match envelope.remaining() {
            Some(remaining) => remaining.mul_f64(config.seed_budget_fraction),
            None => Duration::from_millis(config.seed_budget_cap_ms),
        }
        .min(Duration::from_millis(config.seed_budget_cap_ms));
        let seed_envelope = envelope.sub_budget(seed_cap);
        envelope.report(0.0, "hybrid: exact seed phase");

        let mut seeds: Vec<Vec<Option<usize>>> = Vec::new();
        let mut seeded = false;
        match MilpSolver::run(problem, &config.exact, &seed_envelope) {
            Ok(exact) if exact.best.found_total > 0 => {
                let seed = genotype::genotype_from_solution(&exact.best, problem);
                seeded = true;
                for _ in 0..config.seed_variants {
                    let mut variant = seed.clone();
                    resample_mutation(&mut variant, problem, &mut rng);
                    seeds.push(variant);
                }
                seeds.insert(0, seed);
            }
            Ok(_) => debug!("exact seed phase found nothing usable"),
            // A seed failure degrades to a cold-started refinement.
            Err(err) => debug!(error = %err, "exact seed phase failed; continuing unseeded"),
        }

        // Phase 2: seeded refinement.
        envelope.report(0.3, "hybrid: refinement phase");
        let polish_cap = Duration::from_millis(config.polish_budget_cap_ms);
        let refine_envelope = match envelope.remaining() {
            Some(remaining) => envelope.sub_budget(remaining.saturating_sub(polish_cap)),
            None => envelope.sub_budget(Duration::from_secs(3_600)),
        };

        let (mut best, front, generations, mut evaluations, stagnated, refine_time_hit, history) =
            match &config.refinement {
                RefinementConfig::Dominance(c) => {
                    let r = crate::nsga::NsgaRunner::run_seeded(problem, c, &refine_envelope, seeds);
                    (r.best, r.front, r.generations, r.evaluations, r.stagnated, r.time_limit_hit, r.history)
                }
                RefinementConfig::Decomposition(c) => {
                    let r = crate::moead::MoeadRunner::run_seeded(problem, c, &refine_envelope, seeds);
                    (r.best, r.archive, r.generations, r.evaluations, r.stagnated, r.time_limit_hit, r.history)
                }
                RefinementConfig::ReferencePoint(c) => {
                    let r = crate::refpoint::RefPointRunner::run_seeded(problem, c, &refine_envelope, seeds);
                    (r.best, r.front, r.generations, r.evaluations, r.stagnated, r.time_limit_hit, r.history)
                }
            };

        // Phase 3: bounded local search around the selected best.
        envelope.report(0.9, "hybrid: local search phase");
        let polish_envelope = envelope.sub_budget(polish_cap);
        let stats = polish(
            &mut best.slots,
            problem,
            &polish_envelope,
            config.polish_passes,
        );
        evaluations += stats.evaluations;
        if stats.steps_accepted > 0 {
            best.objectives = genotype::evaluate(&best.slots, problem);
        }

        debug!(
            seeded,
            generations,
            evaluations,
            polish_steps = stats.steps_accepted,
            "hybrid pipeline finished"
        );

        Ok(HybridResult {
            best,
            front,
            generations,
            evaluations,
            seeded,
            time_limit_hit: refine_time_hit || envelope.expired(),
            stagnated,
            history,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Algorithm, EngineConfig};
    use crate::error::Diagnostics;
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
            listing("CardB", 3, 4.0, 2),
        ];
        let wishlist = vec![WishlistItem::new("CardA", 2), WishlistItem::new("CardB", 1)];
        let mut diag = Diagnostics::new();
        PurchaseProblem::build(&listings, &wishlist, PenaltyConfig::default(), &mut diag).unwrap()
    }

    fn config(algorithm: Algorithm) -> HybridConfig {
        let engine = EngineConfig::default()
            .with_algorithm(algorithm)
            .with_population_size(20)
            .with_max_generations(20)
            .with_seed(42)
            .with_parallel(false);
        HybridConfig::from_engine(&engine)
    }

    #[test]
    fn test_pipeline_seeds_and_matches_exact_optimum() {
        let problem = small_problem();
        let result = HybridRunner::run(
            &problem,
            &config(Algorithm::HybridDominance),
            &RunEnvelope::new(None),
        )
        .unwrap();

        assert!(result.seeded);
        assert!((result.best.objectives.completeness() - 1.0).abs() < 1e-12);
        // Exact seed already achieves $4.00 from a single source; the
        // pipeline must not lose it.
        assert!(result.best.objectives.cost() <= 4.0 + 1e-9);
    }

    #[test]
    fn test_all_refinement_variants_run() {
        let problem = small_problem();
        for algorithm in [
            Algorithm::HybridDominance,
            Algorithm::HybridDecomposition,
            Algorithm::HybridReferencePoint,
        ] {
            let result = HybridRunner::run(
                &problem,
                &config(algorithm),
                &RunEnvelope::new(None),
            )
            .unwrap();
            assert!(
                (result.best.objectives.completeness() - 1.0).abs() < 1e-12,
                "{algorithm:?} should complete the small wishlist"
            );
        }
    }

    #[test]
    fn test_unseedable_problem_degrades_gracefully() {
        // No CardB listing: the exact phase yields a partial seed.
        let listings = vec![listing("CardA", 1, 1.0, 2)];
        let wishlist = vec![WishlistItem::new("CardA", 2), WishlistItem::new("CardB", 1)];
        let mut diag = Diagnostics::new();
        let problem =
            PurchaseProblem::build(&listings, &wishlist, PenaltyConfig::default(), &mut diag)
                .unwrap();

        let result = HybridRunner::run(
            &problem,
            &config(Algorithm::HybridDominance),
            &RunEnvelope::new(None),
        )
        .unwrap();
        assert!(result.seeded);
        assert!((result.best.objectives.completeness() - 2.0 / 3.0).abs() < 1e-9);
    }
}
