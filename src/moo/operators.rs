//! Genetic operators over unit-slot genotypes.
//!
//! All operators preserve the slot structure: a slot only ever holds a
//! listing index drawn from its own item's candidate list (or `None`).
//! Because both parents share the same slot→item map, exchanging whole
//! segments between them cannot produce malformed genotypes.

use rand::Rng;

use crate::model::PurchaseProblem;

/// Picks an index in `0..len` with rank-weighted probability.
///
/// Weight of rank `r` is `1 / (r + 1)`, so the cheapest candidates (ranks
/// 0, 1, ...) are strongly favored but every candidate stays reachable.
///
/// # Panics
///
/// Panics if `len` is zero.
pub fn rank_weighted_pick<R: Rng>(len: usize, rng: &mut R) -> usize {
    assert!(len > 0, "cannot pick from an empty candidate list");
    if len == 1 {
        return 0;
    }

    let total: f64 = (0..len).map(|r| 1.0 / (r + 1) as f64).sum();
    let mut roll = rng.random_range(0.0..total);
    for rank in 0..len {
        roll -= 1.0 / (rank + 1) as f64;
        if roll <= 0.0 {
            return rank;
        }
    }
    len - 1 // floating-point fallback
}

/// Selects a random inclusive segment `[start, end]` of a genotype.
fn random_segment<R: Rng>(n: usize, rng: &mut R) -> (usize, usize) {
    let a = rng.random_range(0..n);
    let b = rng.random_range(0..n);
    (a.min(b), a.max(b))
}

/// Two-point segment crossover: children swap a random slot range.
///
/// # Panics
///
/// Panics if parents have different lengths or are empty.
pub fn segment_crossover<R: Rng>(
    parent1: &[Option<usize>],
    parent2: &[Option<usize>],
    rng: &mut R,
) -> (Vec<Option<usize>>, Vec<Option<usize>>) {
    let n = parent1.len();
    assert_eq!(n, parent2.len(), "parents must have equal length");
    assert!(n > 0, "parents must not be empty");

    let (start, end) = random_segment(n, rng);

    let mut child1 = parent1.to_vec();
    let mut child2 = parent2.to_vec();
    child1[start..=end].copy_from_slice(&parent2[start..=end]);
    child2[start..=end].copy_from_slice(&parent1[start..=end]);

    (child1, child2)
}

/// Resample mutation: one random slot is redrawn from its item's
/// candidate list, rank-weighted toward cheap/high-quality options.
pub fn resample_mutation<R: Rng>(
    slots: &mut [Option<usize>],
    problem: &PurchaseProblem,
    rng: &mut R,
) {
    if slots.is_empty() {
        return;
    }
    let slot = rng.random_range(0..slots.len());
    let candidates = &problem.candidates[problem.slot_item[slot]];
    if candidates.is_empty() {
        return;
    }
    slots[slot] = Some(candidates[rank_weighted_pick(candidates.len(), rng)]);
}
