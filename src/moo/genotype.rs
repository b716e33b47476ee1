//! Genotype representation, decoding, and evaluation.
//!
//! A genotype is a flat sequence of listing choices, one slot per required
//! unit across the whole wishlist (`slots.len() == problem.total_units()`).
//! Slot `k` belongs to wishlist item `problem.slot_item[k]`; `None` marks a
//! unit that could not be assigned (no usable candidate).
//!
//! Decoding caps per-listing usage at the listing's availability, so an
//! over-subscribed listing degrades completeness instead of over-buying.

use std::collections::HashSet;

use rand::Rng;
use rayon::prelude::*;

use super::fitness::Objectives;
use super::operators::rank_weighted_pick;
use crate::model::{PurchaseProblem, Solution};

/// A candidate plan: genotype plus its evaluated objective vector.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub slots: Vec<Option<usize>>,
    pub objectives: Objectives,
}

impl Candidate {
    /// Wraps a genotype with a worst-case objective vector; call
    /// [`evaluate`] (or [`evaluate_population`]) before comparing.
    pub fn unevaluated(slots: Vec<Option<usize>>) -> Self {
        Self {
            slots,
            objectives: Objectives::worst(),
        }
    }
}

/// Counts capped per-listing usage of a genotype.
///
/// Slots whose listing does not actually offer the slot's item are ignored
/// (a malformed slot contributes nothing rather than corrupting counts).
/// Returns `(listing_index, quantity)` pairs sorted by listing index.
pub fn usage_counts(slots: &[Option<usize>], problem: &PurchaseProblem) -> Vec<(usize, u32)> {
    let mut raw = vec![0u32; problem.listings.len()];
    for (slot, choice) in slots.iter().enumerate() {
        let Some(listing_idx) = *choice else {
            continue;
        };
        let Some(&item_idx) = problem.slot_item.get(slot) else {
            continue;
        };
        let Some(scored) = problem.listings.get(listing_idx) else {
            continue;
        };
        if scored.listing.item_name == problem.wishlist[item_idx].item_name {
            raw[listing_idx] += 1;
        }
    }

    raw.iter()
        .enumerate()
        .filter(|&(_, &count)| count > 0)
        .map(|(idx, &count)| (idx, count.min(problem.listings[idx].listing.quantity_available)))
        .collect()
}

/// Evaluates a genotype into its objective vector.
pub fn evaluate(slots: &[Option<usize>], problem: &PurchaseProblem) -> Objectives {
    let usage = usage_counts(slots, problem);
    let required_total = problem.stats.required_total as f64;

    let mut cost = 0.0;
    let mut quality_sum = 0.0;
    let mut found: u32 = 0;
    let mut sources = HashSet::new();
    for (listing_idx, quantity) in usage {
        let scored = &problem.listings[listing_idx];
        cost += scored.effective_price * quantity as f64;
        quality_sum += scored.listing.quality_grade.quality_score() * quantity as f64;
        found += quantity;
        sources.insert(scored.listing.source_id);
    }

    Objectives::new(
        cost,
        quality_sum / required_total,
        found as f64 / required_total,
        sources.len(),
    )
}

/// Evaluates a whole population, optionally on the rayon pool.
pub fn evaluate_population(population: &mut [Candidate], problem: &PurchaseProblem, parallel: bool) {
    if parallel {
        population.par_iter_mut().for_each(|candidate| {
            candidate.objectives = evaluate(&candidate.slots, problem);
        });
    } else {
        for candidate in population.iter_mut() {
            candidate.objectives = evaluate(&candidate.slots, problem);
        }
    }
}

/// Creates a random genotype biased toward cheap candidates.
///
/// Each slot samples from its item's candidate list with rank-weighted
/// probability (candidates are pre-sorted cheapest first).
pub fn random_genotype<R: Rng>(problem: &PurchaseProblem, rng: &mut R) -> Vec<Option<usize>> {
    problem
        .slot_item
        .iter()
        .map(|&item_idx| {
            let candidates = &problem.candidates[item_idx];
            if candidates.is_empty() {
                None
            } else {
                Some(candidates[rank_weighted_pick(candidates.len(), rng)])
            }
        })
        .collect()
}

/// Rebuilds a genotype from a canonical plan (used to seed populations
/// from an exact-optimizer result).
///
/// Lines are matched back to pool listings by item, source, and effective
/// price; slots that cannot be matched stay unfilled.
pub fn genotype_from_solution(solution: &Solution, problem: &PurchaseProblem) -> Vec<Option<usize>> {
    let mut slots: Vec<Option<usize>> = vec![None; problem.total_units()];

    for (item_idx, item) in problem.wishlist.iter().enumerate() {
        // Unit slots belonging to this item, in genotype order.
        let item_slots: Vec<usize> = problem
            .slot_item
            .iter()
            .enumerate()
            .filter(|&(_, &i)| i == item_idx)
            .map(|(slot, _)| slot)
            .collect();

        let mut cursor = 0usize;
        for line in solution.lines().filter(|l| l.item_name == item.item_name) {
            let Some(&listing_idx) = problem.candidates[item_idx].iter().find(|&&idx| {
                let scored = &problem.listings[idx];
                scored.listing.source_id == line.source_id
                    && (scored.effective_price - line.unit_price).abs() < 1e-9
            }) else {
                continue;
            };
            for _ in 0..line.quantity {
                if cursor >= item_slots.len() {
                    break;
                }
                slots[item_slots[cursor]] = Some(listing_idx);
                cursor += 1;
            }
        }
    }

    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Diagnostics;
    use crate::model::{ConditionGrade, Language, Listing, Printing, WishlistItem};
    use crate::normalize::{normalize, RawPlan};
    use crate::penalty::PenaltyConfig;
    use crate::random::create_rng;

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

    fn problem() -> PurchaseProblem {
        let listings = vec![
            listing("CardA", 1, 1.0, 2),
            listing("CardA", 2, 1.5, 5),
            listing("CardB", 2, 3.0, 1),
        ];
        let wishlist = vec![WishlistItem::new("CardA", 2), WishlistItem::new("CardB", 1)];
        let mut diag = Diagnostics::new();
        PurchaseProblem::build(&listings, &wishlist, PenaltyConfig::default(), &mut diag).unwrap()
    }

    // ---- Usage counting ----

    #[test]
    fn test_usage_capped_at_availability() {
        let problem = problem();
        // Three slots all pointing at listing 2 (CardB, avail 1); only the
        // CardB slot counts, and the count caps at 1.
        let usage = usage_counts(&[Some(0), Some(0), Some(2)], &problem);
        assert_eq!(usage, vec![(0, 2), (2, 1)]);
    }

    #[test]
    fn test_wrong_item_slot_ignored() {
        let problem = problem();
        // Slot 2 belongs to CardB but points at a CardA listing.
        let usage = usage_counts(&[None, None, Some(0)], &problem);
        assert!(usage.is_empty());
    }

    // ---- Evaluation ----

    #[test]
    fn test_evaluate_complete_plan() {
        let problem = problem();
        let objectives = evaluate(&[Some(0), Some(0), Some(2)], &problem);
        assert!((objectives.cost() - 5.0).abs() < 1e-12);
        assert!((objectives.completeness() - 1.0).abs() < 1e-12);
        assert_eq!(objectives.source_count(), 2);
    }

    #[test]
    fn test_evaluate_unfilled_slots() {
        let problem = problem();
        let objectives = evaluate(&[Some(0), None, None], &problem);
        assert!((objectives.completeness() - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(objectives.source_count(), 1);
    }

    #[test]
    fn test_evaluate_matches_normalized_solution() {
        let problem = problem();
        let slots = vec![Some(1), Some(1), Some(2)];
        let objectives = evaluate(&slots, &problem);
        let solution = normalize(RawPlan::Genotype(slots), &problem);
        assert!((objectives.cost() - solution.total_price).abs() < 1e-9);
        assert!(
            (objectives.completeness() - solution.completeness_by_quantity).abs() < 1e-12
        );
        assert_eq!(objectives.source_count(), solution.source_count());
    }

    // ---- Initialization ----

    #[test]
    fn test_random_genotype_fills_available_slots() {
        let problem = problem();
        let mut rng = create_rng(42);
        for _ in 0..20 {
            let slots = random_genotype(&problem, &mut rng);
            assert_eq!(slots.len(), 3);
            for (slot, choice) in slots.iter().enumerate() {
                let listing_idx = choice.expect("every item has candidates");
                let item_idx = problem.slot_item[slot];
                assert!(problem.candidates[item_idx].contains(&listing_idx));
            }
        }
    }

    #[test]
    fn test_random_genotype_leaves_uncovered_items_unfilled() {
        let listings = vec![listing("CardA", 1, 1.0, 2)];
        let wishlist = vec![WishlistItem::new("CardA", 1), WishlistItem::new("CardB", 2)];
        let mut diag = Diagnostics::new();
        let problem =
            PurchaseProblem::build(&listings, &wishlist, PenaltyConfig::default(), &mut diag)
                .unwrap();
        let mut rng = create_rng(42);
        let slots = random_genotype(&problem, &mut rng);
        assert!(slots[0].is_some());
        assert!(slots[1].is_none());
        assert!(slots[2].is_none());
    }

    // ---- Seeding ----

    #[test]
    fn test_genotype_round_trips_through_solution() {
        let problem = problem();
        let slots = vec![Some(0), Some(0), Some(2)];
        let solution = normalize(RawPlan::Genotype(slots.clone()), &problem);
        let rebuilt = genotype_from_solution(&solution, &problem);
        let rebuilt_solution = normalize(RawPlan::Genotype(rebuilt), &problem);
        assert_eq!(solution, rebuilt_solution);
    }

    // ---- Population evaluation ----

    #[test]
    fn test_parallel_and_sequential_evaluation_agree() {
        let problem = problem();
        let mut rng = create_rng(7);
        let genotypes: Vec<Vec<Option<usize>>> =
            (0..24).map(|_| random_genotype(&problem, &mut rng)).collect();

        let mut seq: Vec<Candidate> = genotypes
            .iter()
            .map(|g| Candidate::unevaluated(g.clone()))
            .collect();
        let mut par: Vec<Candidate> = genotypes
            .into_iter()
            .map(Candidate::unevaluated)
            .collect();

        evaluate_population(&mut seq, &problem, false);
        evaluate_population(&mut par, &problem, true);

        for (a, b) in seq.iter().zip(par.iter()) {
            assert_eq!(a.objectives, b.objectives);
        }
    }
}
