//! Decomposition-based evolutionary loop.
//!
//! Each weight vector owns one population slot. Every generation produces
//! one offspring per slot from neighborhood parents; the offspring
//! replaces up to `max_replacements` neighbors whose scalarized fitness it
//! improves, relative to the running ideal point. A separate unbounded
//! non-dominated archive collects everything worth reporting.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use super::config::MoeadConfig;
use super::weights::{neighborhoods, sample_weights, scalarize, update_ideal};
use crate::engine::envelope::RunEnvelope;
use crate::model::PurchaseProblem;
use crate::moo::fitness::NUM_OBJECTIVES;
use crate::moo::genotype::{self, Candidate};
use crate::moo::operators::{resample_mutation, segment_crossover};
use crate::moo::pareto::pick_best;
use crate::random::rng_from_option;

/// Result of a decomposition run.
#[derive(Debug, Clone)]
pub struct MoeadResult {
    /// Best individual seen (acceptable-completeness preferred).
    pub best: Candidate,

    /// Non-dominated archive, best-first, capped at `archive_cap`.
    pub archive: Vec<Candidate>,

    /// Archive size before capping.
    pub archive_size: usize,

    /// Generations executed.
    pub generations: usize,

    /// Fitness evaluations performed.
    pub evaluations: usize,

    /// Whether the stagnation window triggered.
    pub stagnated: bool,

    /// Whether the time budget triggered.
    pub time_limit_hit: bool,

    /// Best weighted fitness at the end of each generation.
    pub history: Vec<f64>,
}

/// Executes the decomposition-based search.
pub struct MoeadRunner;

impl MoeadRunner {
    /// Runs the search from a random initial population.
    ///
    /// # Panics
    ///
    /// Panics if the configuration is invalid (call
    /// [`MoeadConfig::validate`] first to get a descriptive error).
    pub fn run(
        problem: &PurchaseProblem,
        config: &MoeadConfig,
        envelope: &RunEnvelope,
    ) -> MoeadResult {
        Self::run_seeded(problem, config, envelope, Vec::new())
    }

    /// Runs the search with seed genotypes occupying the first slots.
    pub fn run_seeded(
        problem: &PurchaseProblem,
        config: &MoeadConfig,
        envelope: &RunEnvelope,
        seeds: Vec<Vec<Option<usize>>>,
    ) -> MoeadResult {
        config.validate().expect("invalid MoeadConfig");

        let mut rng = rng_from_option(config.seed);
        let mut evaluations = 0usize;

        // Subproblem structure.
        let weights = sample_weights(config.population_size, &mut rng);
        let hoods = neighborhoods(&weights, config.neighborhood_size);

        // Population: one candidate per weight slot.
        let mut population: Vec<Candidate> = seeds
            .into_iter()
            .take(config.population_size)
            .map(Candidate::unevaluated)
            .collect();
        while population.len() < config.population_size {
            population.push(Candidate::unevaluated(genotype::random_genotype(
                problem, &mut rng,
            )));
        }
        genotype::evaluate_population(&mut population, problem, config.parallel);
        evaluations += population.len();

        // Running ideal point and archive.
        let mut ideal = [f64::INFINITY; NUM_OBJECTIVES];
        for candidate in &population {
            update_ideal(&mut ideal, &candidate.objectives);
        }
        let mut archive: Vec<Candidate> = Vec::new();
        for candidate in &population {
            Self::offer_to_archive(&mut archive, candidate);
        }

        let mut best = Self::current_best(&population, config).clone();
        let mut best_scalar = best.objectives.weighted(&config.weights);
        let mut history = Vec::with_capacity(config.max_generations);
        history.push(best_scalar);

        let mut stagnation_counter = 0usize;
        let mut stagnated = false;
        let mut time_limit_hit = false;
        let mut generations = 0usize;

        for gen in 0..config.max_generations {
            if envelope.expired() {
                time_limit_hit = true;
                break;
            }

            for slot in 0..config.population_size {
                let hood = &hoods[slot];

                // Parents from the neighborhood.
                let p1 = hood[rng.random_range(0..hood.len())];
                let p2 = hood[rng.random_range(0..hood.len())];

                let mut child = if rng.random_range(0.0..1.0) < config.crossover_rate {
                    segment_crossover(&population[p1].slots, &population[p2].slots, &mut rng).0
                } else {
                    population[p1].slots.clone()
                };
                if rng.random_range(0.0..1.0) < config.mutation_rate {
                    resample_mutation(&mut child, problem, &mut rng);
                }

                let child = Candidate {
                    objectives: genotype::evaluate(&child, problem),
                    slots: child,
                };
                evaluations += 1;
                update_ideal(&mut ideal, &child.objectives);

                // Neighbor replacement, bounded and in random order.
                let mut order = hood.clone();
                order.shuffle(&mut rng);
                let mut replaced = 0usize;
                for neighbor in order {
                    if replaced >= config.max_replacements {
                        break;
                    }
                    let child_score =
                        scalarize(config.method, &child.objectives, &weights[neighbor], &ideal);
                    let incumbent_score = scalarize(
                        config.method,
                        &population[neighbor].objectives,
                        &weights[neighbor],
                        &ideal,
                    );
                    if child_score < incumbent_score {
                        population[neighbor] = child.clone();
                        replaced += 1;
                    }
                }

                Self::offer_to_archive(&mut archive, &child);
            }

            generations = gen + 1;

            let gen_best = Self::current_best(&population, config);
            let gen_scalar = gen_best.objectives.weighted(&config.weights);
            if gen_scalar < best_scalar {
                best = gen_best.clone();
                best_scalar = gen_scalar;
                stagnation_counter = 0;
            } else {
                stagnation_counter += 1;
            }
            history.push(best_scalar);

            envelope.report(
                generations as f64 / config.max_generations as f64,
                &format!("decomposition generation {generations}"),
            );

            if config.stagnation_limit > 0 && stagnation_counter >= config.stagnation_limit {
                stagnated = true;
                break;
            }
        }

        debug!(
            generations,
            evaluations,
            archive_size = archive.len(),
            stagnated,
            time_limit_hit,
            "decomposition search finished"
        );

        // The archive may hold something better than any population slot.
        let archive_best_idx = {
            let objectives: Vec<_> = archive.iter().map(|c| c.objectives).collect();
            (!objectives.is_empty())
                .then(|| pick_best(&objectives, &config.weights, config.acceptable_completeness))
        };
        if let Some(idx) = archive_best_idx {
            let archive_scalar = archive[idx].objectives.weighted(&config.weights);
            let better_completeness =
                archive[idx].objectives.completeness() > best.objectives.completeness();
            if archive_scalar < best_scalar || better_completeness {
                best = archive[idx].clone();
            }
        }

        let archive_size = archive.len();
        let mut reported = archive;
        reported.sort_by(|a, b| {
            a.objectives
                .weighted(&config.weights)
                .total_cmp(&b.objectives.weighted(&config.weights))
        });
        reported.truncate(config.archive_cap);

        MoeadResult {
            best,
            archive: reported,
            archive_size,
            generations,
            evaluations,
            stagnated,
            time_limit_hit,
            history,
        }
    }

    /// Inserts a candidate into the non-dominated archive: rejected when
    /// dominated or duplicated, evicts members it dominates.
    fn offer_to_archive(archive: &mut Vec<Candidate>, candidate: &Candidate) {
        if archive
            .iter()
            .any(|member| {
                member.objectives.dominates(&candidate.objectives)
                    || member.objectives == candidate.objectives
            })
        {
            return;
        }
        archive.retain(|member| !candidate.objectives.dominates(&member.objectives));
        archive.push(candidate.clone());
    }

    fn current_best<'a>(population: &'a [Candidate], config: &MoeadConfig) -> &'a Candidate {
        let objectives: Vec<_> = population.iter().map(|c| c.objectives).collect();
        let idx = pick_best(&objectives, &config.weights, config.acceptable_completeness);
        &population[idx]
    }
}
