//! Pareto machinery: non-dominated sorting, crowding distance, and
//! best-plan selection.
//!
//! # References
//!
//! - Deb et al. (2002), "A Fast and Elitist Multiobjective Genetic
//!   Algorithm: NSGA-II", IEEE TEC 6(2)

use super::fitness::{Objectives, ObjectiveWeights, NUM_OBJECTIVES};

/// Result of non-dominated sorting.
///
/// `ranks[i]` is the Pareto rank of the individual at index `i`
/// (0 = non-dominated front); `fronts[r]` lists the indices at rank `r`.
#[derive(Debug, Clone)]
pub struct NondominatedSortResult {
    pub ranks: Vec<usize>,
    pub fronts: Vec<Vec<usize>>,
}

/// Fast non-dominated sorting over objective vectors (Deb et al., 2002).
///
/// # Complexity
///
/// O(m · n²) for n individuals and m objectives.
///
/// # Panics
///
/// Panics if `objectives` is empty.
pub fn non_dominated_sort(objectives: &[Objectives]) -> NondominatedSortResult {
    let n = objectives.len();
    assert!(n > 0, "objectives must not be empty");

    if n == 1 {
        return NondominatedSortResult {
            ranks: vec![0],
            fronts: vec![vec![0]],
        };
    }

    let mut domination_count = vec![0usize; n];
    let mut dominated_by: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut ranks = vec![0usize; n];
    let mut front_0 = Vec::new();

    for i in 0..n {
        for j in (i + 1)..n {
            if objectives[i].dominates(&objectives[j]) {
                dominated_by[i].push(j);
                domination_count[j] += 1;
            } else if objectives[j].dominates(&objectives[i]) {
                dominated_by[j].push(i);
                domination_count[i] += 1;
            }
        }

        if domination_count[i] == 0 {
            ranks[i] = 0;
            front_0.push(i);
        }
    }

    let mut fronts = vec![front_0];
    loop {
        let current = fronts
            .last()
            .expect("fronts is initialized with front_0; never empty");
        let mut next_front = Vec::new();

        for &i in current {
            for &j in &dominated_by[i] {
                domination_count[j] -= 1;
                if domination_count[j] == 0 {
                    ranks[j] = fronts.len();
                    next_front.push(j);
                }
            }
        }

        if next_front.is_empty() {
            break;
        }
        fronts.push(next_front);
    }

    NondominatedSortResult { ranks, fronts }
}

/// Crowding distance for diversity preservation (Deb et al., 2002).
///
/// Boundary individuals of each objective receive infinity; interior
/// individuals accumulate normalized neighbor gaps.
pub fn crowding_distance(objectives: &[Objectives]) -> Vec<f64> {
    let n = objectives.len();
    if n <= 2 {
        return vec![f64::INFINITY; n];
    }

    let mut distances = vec![0.0f64; n];

    for obj_idx in 0..NUM_OBJECTIVES {
        let mut indices: Vec<usize> = (0..n).collect();
        indices.sort_by(|&a, &b| {
            objectives[a].values[obj_idx].total_cmp(&objectives[b].values[obj_idx])
        });

        distances[indices[0]] = f64::INFINITY;
        distances[indices[n - 1]] = f64::INFINITY;

        let min_val = objectives[indices[0]].values[obj_idx];
        let max_val = objectives[indices[n - 1]].values[obj_idx];
        let range = max_val - min_val;

        if range > 0.0 {
            for i in 1..(n - 1) {
                let prev = objectives[indices[i - 1]].values[obj_idx];
                let next = objectives[indices[i + 1]].values[obj_idx];
                distances[indices[i]] += (next - prev) / range;
            }
        }
    }

    distances
}

/// Picks the index of the best individual for reporting.
///
/// Individuals at or above the acceptable-completeness threshold are
/// preferred; among them the lowest weighted scalarization wins. When
/// none reaches the threshold, the most complete wins, then the lowest
/// scalarization.
pub fn pick_best(
    objectives: &[Objectives],
    weights: &ObjectiveWeights,
    acceptable_completeness: f64,
) -> usize {
    assert!(!objectives.is_empty(), "population must not be empty");

    let acceptable: Vec<usize> = (0..objectives.len())
        .filter(|&i| objectives[i].completeness() >= acceptable_completeness)
        .collect();

    if acceptable.is_empty() {
        // Nothing reaches the threshold: most complete, then cheapest scalar.
        return (0..objectives.len())
            .min_by(|&a, &b| {
                objectives[b]
                    .completeness()
                    .total_cmp(&objectives[a].completeness())
                    .then(objectives[a].weighted(weights).total_cmp(&objectives[b].weighted(weights)))
            })
            .expect("non-empty population");
    }

    acceptable
        .into_iter()
        .min_by(|&a, &b| {
            objectives[a]
                .weighted(weights)
                .total_cmp(&objectives[b].weighted(weights))
        })
        .expect("non-empty acceptable set")
}
