//! Reference-point evolutionary loop.
//!
//! μ+λ survival in the NSGA-III style: combined parent+offspring
//! populations are partitioned into non-dominated fronts; fronts are
//! accepted whole until the next would overflow the target size, and the
//! overflow front is trimmed by associating individuals to the nearest
//! normalized reference direction and filling the least-represented
//! directions first.

use rand::Rng;
use tracing::debug;

use super::config::RefPointConfig;
use super::directions::{das_dennis, perpendicular_distance};
use crate::engine::envelope::RunEnvelope;
use crate::model::PurchaseProblem;
use crate::moo::fitness::{Objectives, NUM_OBJECTIVES};
use crate::moo::genotype::{self, Candidate};
use crate::moo::operators::{resample_mutation, segment_crossover};
use crate::moo::pareto::{non_dominated_sort, pick_best};
use crate::random::rng_from_option;

/// Result of a reference-point run.
#[derive(Debug, Clone)]
pub struct RefPointResult {
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

/// Executes the reference-point search.
pub struct RefPointRunner;

impl RefPointRunner {
    /// Runs the search from a random initial population.
    ///
    /// # Panics
    ///
    /// Panics if the configuration is invalid (call
    /// [`RefPointConfig::validate`] first to get a descriptive error).
    pub fn run(
        problem: &PurchaseProblem,
        config: &RefPointConfig,
        envelope: &RunEnvelope,
    ) -> RefPointResult {
        Self::run_seeded(problem, config, envelope, Vec::new())
    }

    /// Runs the search with seed genotypes injected into the initial
    /// population.
    pub fn run_seeded(
        problem: &PurchaseProblem,
        config: &RefPointConfig,
        envelope: &RunEnvelope,
        seeds: Vec<Vec<Option<usize>>>,
    ) -> RefPointResult {
        config.validate().expect("invalid RefPointConfig");

        let mut rng = rng_from_option(config.seed);
        let mut evaluations = 0usize;

        // The direction lattice is generated once per run.
        let directions = das_dennis(config.divisions);

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

            // Offspring from uniformly random parents; selection pressure
            // comes from survival, not mating.
            let mut offspring: Vec<Candidate> = Vec::with_capacity(config.population_size);
            while offspring.len() < config.population_size {
                let p1 = rng.random_range(0..population.len());
                let p2 = rng.random_range(0..population.len());

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

            let mut combined = population;
            combined.append(&mut offspring);
            population = Self::survive(combined, config.population_size, &directions);

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
                &format!("reference-point generation {generations}"),
            );

            if config.stagnation_limit > 0 && stagnation_counter >= config.stagnation_limit {
                stagnated = true;
                break;
            }
        }

        debug!(
            generations,
            evaluations, stagnated, time_limit_hit, "reference-point search finished"
        );

        let front = Self::final_front(&population, config);
        RefPointResult {
            best,
            front,
            generations,
            evaluations,
            stagnated,
            time_limit_hit,
            history,
        }
    }

    /// NSGA-III survival: whole fronts, then niching on the overflow front.
    fn survive(
        combined: Vec<Candidate>,
        target: usize,
        directions: &[[f64; NUM_OBJECTIVES]],
    ) -> Vec<Candidate> {
        let objectives: Vec<_> = combined.iter().map(|c| c.objectives).collect();
        let sort = non_dominated_sort(&objectives);

        let mut next: Vec<Candidate> = Vec::with_capacity(target);
        let mut accepted: Vec<usize> = Vec::new();
        let mut overflow: Option<&Vec<usize>> = None;
        for front in &sort.fronts {
            if accepted.len() + front.len() <= target {
                accepted.extend(front.iter().copied());
                if accepted.len() == target {
                    break;
                }
            } else {
                overflow = Some(front);
                break;
            }
        }

        next.extend(accepted.iter().map(|&i| combined[i].clone()));
        let Some(overflow) = overflow else {
            return next;
        };

        // Normalize over the individuals still under consideration.
        let considered: Vec<usize> = accepted.iter().chain(overflow.iter()).copied().collect();
        let (ideal, nadir) = Self::bounds(&objectives, &considered);
        let normalized = |idx: usize| -> [f64; NUM_OBJECTIVES] {
            let mut out = [0.0; NUM_OBJECTIVES];
            for k in 0..NUM_OBJECTIVES {
                let range = nadir[k] - ideal[k];
                out[k] = if range > f64::EPSILON {
                    (objectives[idx].values[k] - ideal[k]) / range
                } else {
                    0.0
                };
            }
            out
        };

        // Associate everyone with the nearest direction.
        let associate = |idx: usize| -> (usize, f64) {
            let point = normalized(idx);
            let mut best_dir = 0usize;
            let mut best_dist = f64::INFINITY;
            for (d, direction) in directions.iter().enumerate() {
                let dist = perpendicular_distance(&point, direction);
                if dist < best_dist {
                    best_dist = dist;
                    best_dir = d;
                }
            }
            (best_dir, best_dist)
        };

        let mut niche_count = vec![0usize; directions.len()];
        for &idx in &accepted {
            niche_count[associate(idx).0] += 1;
        }

        // Overflow members grouped by their associated direction.
        let mut members: Vec<Vec<(usize, f64)>> = vec![Vec::new(); directions.len()];
        for &idx in overflow {
            let (dir, dist) = associate(idx);
            members[dir].push((idx, dist));
        }
        for member in &mut members {
            member.sort_by(|a, b| a.1.total_cmp(&b.1));
        }

        // Fill the least-represented directions first.
        while next.len() < target {
            let Some(dir) = (0..directions.len())
                .filter(|&d| !members[d].is_empty())
                .min_by_key(|&d| niche_count[d])
            else {
                break;
            };
            let (idx, _) = members[dir].remove(0);
            next.push(combined[idx].clone());
            niche_count[dir] += 1;
        }

        next
    }

    /// Ideal and nadir points over the considered indices.
    fn bounds(
        objectives: &[Objectives],
        considered: &[usize],
    ) -> ([f64; NUM_OBJECTIVES], [f64; NUM_OBJECTIVES]) {
        let mut ideal = [f64::INFINITY; NUM_OBJECTIVES];
        let mut nadir = [f64::NEG_INFINITY; NUM_OBJECTIVES];
        for &idx in considered {
            for k in 0..NUM_OBJECTIVES {
                ideal[k] = ideal[k].min(objectives[idx].values[k]);
                nadir[k] = nadir[k].max(objectives[idx].values[k]);
            }
        }
        (ideal, nadir)
    }

    fn current_best<'a>(population: &'a [Candidate], config: &RefPointConfig) -> &'a Candidate {
        let objectives: Vec<_> = population.iter().map(|c| c.objectives).collect();
        let idx = pick_best(&objectives, &config.weights, config.acceptable_completeness);
        &population[idx]
    }

    fn final_front(population: &[Candidate], config: &RefPointConfig) -> Vec<Candidate> {
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
