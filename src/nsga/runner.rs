//! Dominance-sorted evolutionary loop.
//!
//! NSGA-II survival: each generation, parents and offspring are combined,
//! partitioned into non-dominated fronts, and the next population is
//! filled front by front, trimming the overflow front by crowding
//! distance.

use rand::Rng;
use tracing::debug;

use super::config::NsgaConfig;
use crate::engine::envelope::RunEnvelope;
use crate::model::PurchaseProblem;
use crate::moo::genotype::{self, Candidate};
use crate::moo::operators::{resample_mutation, segment_crossover};
use crate::moo::pareto::{crowding_distance, non_dominated_sort, pick_best};
use crate::random::rng_from_option;

/// Result of a dominance-sorted run.
#[derive(Debug, Clone)]
pub struct NsgaResult {
    /// Best individual seen (acceptable-completeness preferred).
    pub best: Candidate,

    /// Final non-dominated front, best-first, capped at `archive_cap`.
    pub front: Vec<Candidate>,

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

/// Executes the dominance-sorted search.
pub struct NsgaRunner;

impl NsgaRunner {
    /// Runs the search from a random initial population.
    ///
    /// # Panics
    ///
    /// Panics if the configuration is invalid (call
    /// [`NsgaConfig::validate`] first to get a descriptive error).
    pub fn run(
        problem: &PurchaseProblem,
        config: &NsgaConfig,
        envelope: &RunEnvelope,
    ) -> NsgaResult {
        Self::run_seeded(problem, config, envelope, Vec::new())
    }

    /// Runs the search with seed genotypes injected into the initial
    /// population (the hybrid pipeline passes exact-optimizer seeds).
    pub fn run_seeded(
        problem: &PurchaseProblem,
        config: &NsgaConfig,
        envelope: &RunEnvelope,
        seeds: Vec<Vec<Option<usize>>>,
    ) -> NsgaResult {
        config.validate().expect("invalid NsgaConfig");

        let mut rng = rng_from_option(config.seed);
        let mut evaluations = 0usize;

        // 1. Initialize population: seeds first, random remainder.
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

        // 2. Track best.
        let mut best = Self::current_best(&population, config).clone();
        let mut best_scalar = best.objectives.weighted(&config.weights);
        let mut history = Vec::with_capacity(config.max_generations);
        history.push(best_scalar);

        let mut stagnation_counter = 0usize;
        let mut stagnated = false;
        let mut time_limit_hit = false;
        let mut generations = 0usize;

        // 3. Evolutionary loop.
        for gen in 0..config.max_generations {
            if envelope.expired() {
                time_limit_hit = true;
                break;
            }

            // Ranks and crowding over the current population drive
            // tournament selection.
            let objectives: Vec<_> = population.iter().map(|c| c.objectives).collect();
            let sort = non_dominated_sort(&objectives);
            let crowding = crowding_distance(&objectives);

            // Offspring generation.
            let mut offspring: Vec<Candidate> = Vec::with_capacity(config.population_size);
            while offspring.len() < config.population_size {
                let p1 = Self::tournament(&sort.ranks, &crowding, &mut rng);
                let p2 = Self::tournament(&sort.ranks, &crowding, &mut rng);

                let (mut c1, mut c2) = if rng.random_range(0.0..1.0) < config.crossover_rate {
                    segment_crossover(&population[p1].slots, &population[p2].slots, &mut rng)
                } else {
                    (population[p1].slots.clone(), population[p2].slots.clone())
                };

                if rng.random_range(0.0..1.0) < config.mutation_rate {
                    resample_mutation(&mut c1, problem, &mut rng);
                }
                if rng.random_range(0.0..1.0) < config.mutation_rate {
                    resample_mutation(&mut c2, problem, &mut rng);
                }

                offspring.push(Candidate::unevaluated(c1));
                if offspring.len() < config.population_size {
                    offspring.push(Candidate::unevaluated(c2));
                }
            }
            genotype::evaluate_population(&mut offspring, problem, config.parallel);
            evaluations += offspring.len();

            // μ+λ survival.
            let mut combined = population;
            combined.append(&mut offspring);
            population = Self::survive(combined, config.population_size);

            generations = gen + 1;

            // Best tracking + stagnation.
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
                &format!("dominance generation {generations}"),
            );

            if config.stagnation_limit > 0 && stagnation_counter >= config.stagnation_limit {
                stagnated = true;
                break;
            }
        }

        debug!(
            generations,
            evaluations, stagnated, time_limit_hit, "dominance search finished"
        );

        let front = Self::final_front(&population, config);
        NsgaResult {
            best,
            front,
            generations,
            evaluations,
            stagnated,
            time_limit_hit,
            history,
        }
    }

    /// Binary tournament on (rank, crowding distance).
    fn tournament<R: Rng>(ranks: &[usize], crowding: &[f64], rng: &mut R) -> usize {
        let n = ranks.len();
        let a = rng.random_range(0..n);
        let b = rng.random_range(0..n);
        if ranks[a] < ranks[b] {
            a
        } else if ranks[b] < ranks[a] {
            b
        } else if crowding[a] >= crowding[b] {
            a
        } else {
            b
        }
    }

    /// NSGA-II survival: accept whole fronts, trim the overflow front by
    /// descending crowding distance.
    fn survive(combined: Vec<Candidate>, target: usize) -> Vec<Candidate> {
        let objectives: Vec<_> = combined.iter().map(|c| c.objectives).collect();
        let sort = non_dominated_sort(&objectives);

        let mut next: Vec<Candidate> = Vec::with_capacity(target);
        for front in &sort.fronts {
            if next.len() + front.len() <= target {
                next.extend(front.iter().map(|&i| combined[i].clone()));
                if next.len() == target {
                    break;
                }
            } else {
                let front_objectives: Vec<_> =
                    front.iter().map(|&i| combined[i].objectives).collect();
                let distances = crowding_distance(&front_objectives);
                let mut order: Vec<usize> = (0..front.len()).collect();
                order.sort_by(|&a, &b| distances[b].total_cmp(&distances[a]));
                next.extend(
                    order
                        .into_iter()
                        .take(target - next.len())
                        .map(|i| combined[front[i]].clone()),
                );
                break;
            }
        }
        next
    }

    fn current_best<'a>(population: &'a [Candidate], config: &NsgaConfig) -> &'a Candidate {
        let objectives: Vec<_> = population.iter().map(|c| c.objectives).collect();
        let idx = pick_best(&objectives, &config.weights, config.acceptable_completeness);
        &population[idx]
    }

    /// Rank-0 front, deduplicated by objective vector, sorted by weighted
    /// fitness, capped at `archive_cap`.
    fn final_front(population: &[Candidate], config: &NsgaConfig) -> Vec<Candidate> {
        let objectives: Vec<_> = population.iter().map(|c| c.objectives).collect();
        let sort = non_dominated_sort(&objectives);

        let mut front: Vec<Candidate> = sort.fronts[0]
            .iter()
            .map(|&i| population[i].clone())
            .collect();
        front.sort_by(|a, b| {
            a.objectives
                .weighted(&config.weights)
                .total_cmp(&b.objectives.weighted(&config.weights))
        });
        front.dedup_by(|a, b| a.objectives == b.objectives);
        front.truncate(config.archive_cap);
        front
    }
}
