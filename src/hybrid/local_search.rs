//! Bounded local search around a selected plan.
//!
//! First-improvement passes over the genotype, restricted to moves that
//! never regress completeness:
//!
//! - reassigning one unit slot to a cheaper candidate,
//! - cost-neutral quality upgrades,
//! - source consolidation (retiring a source without a cost increase).
//!
//! The search stops when a pass finds nothing, the pass budget is spent,
//! or the envelope expires.

use crate::engine::envelope::RunEnvelope;
use crate::model::PurchaseProblem;
use crate::moo::fitness::Objectives;
use crate::moo::genotype::evaluate;

const EPS: f64 = 1e-9;

/// Whether replacing `old` with `new` is an accepted polishing step.
///
/// Completeness must not regress; beyond that the step must pay for
/// itself: cheaper, or better quality at no extra cost, or fewer sources
/// at no extra cost.
fn accepts(old: &Objectives, new: &Objectives) -> bool {
    if new.completeness() < old.completeness() - EPS {
        return false;
    }
    if new.completeness() > old.completeness() + EPS {
        return true;
    }
    let cost_improved = new.cost() < old.cost() - EPS;
    let cost_neutral = new.cost() <= old.cost() + EPS;
    let quality_improved = new.quality() > old.quality() + EPS;
    let sources_reduced = new.source_count() < old.source_count();
    cost_improved || (cost_neutral && (quality_improved || sources_reduced))
}

/// Statistics from one local-search invocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolishStats {
    pub steps_accepted: usize,
    pub evaluations: usize,
}

/// Polishes a genotype in place within the envelope's budget.
pub fn polish(
    slots: &mut Vec<Option<usize>>,
    problem: &PurchaseProblem,
    envelope: &RunEnvelope,
    max_passes: usize,
) -> PolishStats {
    let mut stats = PolishStats::default();
    let mut current = evaluate(slots, problem);
    stats.evaluations += 1;

    for _ in 0..max_passes {
        if envelope.expired() {
            break;
        }
        let mut improved = false;

        // Single-slot reassignment moves.
        for slot in 0..slots.len() {
            if envelope.expired() {
                break;
            }
            let item_idx = problem.slot_item[slot];
            let original = slots[slot];
            for &candidate in &problem.candidates[item_idx] {
                if Some(candidate) == original {
                    continue;
                }
                slots[slot] = Some(candidate);
                let trial = evaluate(slots, problem);
                stats.evaluations += 1;
                if accepts(&current, &trial) {
                    current = trial;
                    stats.steps_accepted += 1;
                    improved = true;
                    break;
                }
                slots[slot] = original;
            }
        }

        // Source-consolidation moves: try to retire one source wholesale.
        let used_sources: Vec<u64> = {
            let mut sources: Vec<u64> = slots
                .iter()
                .flatten()
                .map(|&idx| problem.listings[idx].listing.source_id)
                .collect();
            sources.sort_unstable();
            sources.dedup();
            sources
        };
        for source_id in used_sources {
            if envelope.expired() {
                break;
            }
            let backup = slots.clone();
            let mut moved_all = true;
            for slot in 0..slots.len() {
                let Some(listing_idx) = slots[slot] else {
                    continue;
                };
                if problem.listings[listing_idx].listing.source_id != source_id {
                    continue;
                }
                // Cheapest alternative from a different source.
                let item_idx = problem.slot_item[slot];
                match problem.candidates[item_idx].iter().find(|&&alt| {
                    problem.listings[alt].listing.source_id != source_id
                }) {
                    Some(&alt) => slots[slot] = Some(alt),
                    None => {
                        moved_all = false;
                        break;
                    }
                }
            }
            if !moved_all {
                *slots = backup;
                continue;
            }
            let trial = evaluate(slots, problem);
            stats.evaluations += 1;
            if accepts(&current, &trial) {
                current = trial;
                stats.steps_accepted += 1;
                improved = true;
            } else {
                *slots = backup;
            }
        }

        if !improved {
            break;
        }
    }

    stats
}
