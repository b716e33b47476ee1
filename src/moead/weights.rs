//! Weight vectors, neighborhoods, and scalarization.
//!
//! Each subproblem owns one weight vector on the objective simplex and a
//! neighborhood of the nearest vectors (Euclidean distance). Offspring
//! compete inside the neighborhood under the selected scalarization,
//! relative to the running ideal point.
//!
//! # References
//!
//! - Zhang & Li (2007), "MOEA/D: A Multiobjective Evolutionary Algorithm
//!   Based on Decomposition", IEEE TEC 11(6)

use rand::Rng;

use crate::config::DecompositionMethod;
use crate::moo::fitness::{Objectives, NUM_OBJECTIVES};

/// Lower clamp applied to weight components; keeps Tchebycheff terms and
/// PBI projections well-defined on simplex boundaries.
const MIN_WEIGHT: f64 = 1e-6;

/// Penalty factor for the boundary-intersection scalarization.
const PBI_THETA: f64 = 5.0;

/// Samples `count` weight vectors on the objective simplex.
///
/// The first [`NUM_OBJECTIVES`] vectors are the simplex corners; the rest
/// are Dirichlet-style samples (normalized exponentials), so the set
/// covers the extremes and fills the interior.
pub fn sample_weights<R: Rng>(count: usize, rng: &mut R) -> Vec<[f64; NUM_OBJECTIVES]> {
    let mut weights = Vec::with_capacity(count);

    for corner in 0..NUM_OBJECTIVES.min(count) {
        let mut w = [MIN_WEIGHT; NUM_OBJECTIVES];
        w[corner] = 1.0 - MIN_WEIGHT * (NUM_OBJECTIVES - 1) as f64;
        weights.push(w);
    }

    while weights.len() < count {
        let mut w = [0.0f64; NUM_OBJECTIVES];
        let mut total = 0.0;
        for component in &mut w {
            // Exponential draw via inverse CDF; uniform in (0, 1].
            let u: f64 = 1.0 - rng.random_range(0.0..1.0);
            *component = -u.ln();
            total += *component;
        }
        for component in &mut w {
            *component = (*component / total).max(MIN_WEIGHT);
        }
        weights.push(w);
    }

    weights
}

/// For each weight vector, the indices of its `t` nearest vectors by
/// Euclidean distance (the vector itself included).
pub fn neighborhoods(weights: &[[f64; NUM_OBJECTIVES]], t: usize) -> Vec<Vec<usize>> {
    let t = t.min(weights.len());
    weights
        .iter()
        .map(|w| {
            let mut order: Vec<usize> = (0..weights.len()).collect();
            order.sort_by(|&a, &b| {
                distance_sq(w, &weights[a]).total_cmp(&distance_sq(w, &weights[b]))
            });
            order.truncate(t);
            order
        })
        .collect()
}

fn distance_sq(a: &[f64; NUM_OBJECTIVES], b: &[f64; NUM_OBJECTIVES]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Scalarizes an objective vector against a weight vector and the running
/// ideal point. Lower is better for every method.
pub fn scalarize(
    method: DecompositionMethod,
    objectives: &Objectives,
    weight: &[f64; NUM_OBJECTIVES],
    ideal: &[f64; NUM_OBJECTIVES],
) -> f64 {
    match method {
        DecompositionMethod::WeightedSum => objectives
            .values
            .iter()
            .zip(weight.iter())
            .map(|(f, w)| f * w)
            .sum(),
        DecompositionMethod::Tchebycheff => objectives
            .values
            .iter()
            .zip(weight.iter())
            .zip(ideal.iter())
            .map(|((f, w), z)| w.max(MIN_WEIGHT) * (f - z).abs())
            .fold(f64::NEG_INFINITY, f64::max),
        DecompositionMethod::Pbi => {
            let norm: f64 = weight.iter().map(|w| w * w).sum::<f64>().sqrt();
            let diff: Vec<f64> = objectives
                .values
                .iter()
                .zip(ideal.iter())
                .map(|(f, z)| f - z)
                .collect();
            let d1: f64 = diff
                .iter()
                .zip(weight.iter())
                .map(|(d, w)| d * w)
                .sum::<f64>()
                / norm;
            let d2: f64 = diff
                .iter()
                .zip(weight.iter())
                .map(|(d, w)| d - d1 * w / norm)
                .map(|v| v * v)
                .sum::<f64>()
                .sqrt();
            d1 + PBI_THETA * d2
        }
    }
}

/// Componentwise minimum update of the ideal point.
pub fn update_ideal(ideal: &mut [f64; NUM_OBJECTIVES], objectives: &Objectives) {
    for (z, f) in ideal.iter_mut().zip(objectives.values.iter()) {
        if f < z {
            *z = *f;
        }
    }
}
