//! Solution normalization.
//!
//! Each optimizer family produces a different raw shape: the exact solver
//! emits allocation rows, the metaheuristics emit index-list genotypes, the
//! local-search phase emits record lists, and cached plans are already
//! canonical. [`RawPlan`] is a closed union over those shapes, matched
//! exhaustively; every arm funnels into one shared aggregation routine so
//! the canonical [`Solution`] invariants hold regardless of the producer.
//!
//! Normalization is idempotent: a [`RawPlan::Canonical`] input is a
//! validation pass over the plan's own lines, and
//! `normalize(normalize(x)) == normalize(x)`.

use std::collections::HashMap;

use crate::model::{PurchaseLine, PurchaseProblem, Solution, SourcePurchase};
use crate::moo::genotype::usage_counts;

/// One tabular allocation row, as emitted by the exact optimizer.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationRow {
    pub item_name: String,
    pub source_id: u64,
    pub quantity: u32,
}

/// Raw optimizer output, before normalization.
#[derive(Debug, Clone)]
pub enum RawPlan {
    /// Index-list genotype: one listing index per required unit slot,
    /// `None` for unfilled slots.
    Genotype(Vec<Option<usize>>),

    /// A record list of purchase lines.
    Lines(Vec<PurchaseLine>),

    /// Tabular rows, resolved against the listing pool for pricing.
    Rows(Vec<AllocationRow>),

    /// An already-canonical plan.
    Canonical(Solution),
}

/// Converts any raw optimizer output into the canonical [`Solution`].
///
/// Required-vs-found counts always come from the wishlist, never from the
/// raw rows (which may double count); per-item allocations above the
/// required quantity are trimmed, cheapest lines kept.
pub fn normalize(raw: RawPlan, problem: &PurchaseProblem) -> Solution {
    let lines = match raw {
        RawPlan::Genotype(slots) => lines_from_genotype(&slots, problem),
        RawPlan::Lines(lines) => lines,
        RawPlan::Rows(rows) => lines_from_rows(&rows, problem),
        RawPlan::Canonical(solution) => solution.lines().cloned().collect(),
    };
    aggregate(lines, problem)
}

/// Decodes a genotype into purchase lines.
///
/// Usage is capped at each listing's availability through the shared
/// counting routine, so an over-subscribed listing degrades completeness
/// instead of over-buying.
fn lines_from_genotype(slots: &[Option<usize>], problem: &PurchaseProblem) -> Vec<PurchaseLine> {
    let usage = usage_counts(slots, problem);
    let mut lines: Vec<PurchaseLine> = usage
        .into_iter()
        .map(|(listing_idx, quantity)| {
            let scored = &problem.listings[listing_idx];
            PurchaseLine {
                item_name: scored.listing.item_name.clone(),
                source_id: scored.listing.source_id,
                source_name: scored.listing.source_name.clone(),
                quantity,
                unit_price: scored.effective_price,
            }
        })
        .collect();
    lines.sort_by(|a, b| {
        (a.source_id, &a.item_name)
            .cmp(&(b.source_id, &b.item_name))
            .then(a.unit_price.total_cmp(&b.unit_price))
    });
    lines
}

/// Resolves tabular rows against the listing pool.
///
/// Rows pointing at an unknown `(item, source)` pair cannot be priced and
/// are dropped; the aggregation then reports the shortfall through the
/// completeness fields.
fn lines_from_rows(rows: &[AllocationRow], problem: &PurchaseProblem) -> Vec<PurchaseLine> {
    rows.iter()
        .filter(|row| row.quantity > 0)
        .filter_map(|row| {
            problem
                .listings
                .iter()
                .find(|sl| {
                    sl.listing.item_name == row.item_name && sl.listing.source_id == row.source_id
                })
                .map(|scored| PurchaseLine {
                    item_name: row.item_name.clone(),
                    source_id: row.source_id,
                    source_name: scored.listing.source_name.clone(),
                    quantity: row.quantity,
                    unit_price: scored.effective_price,
                })
        })
        .collect()
}

/// Shared aggregation: merge, cap at wishlist requirements, group by
/// source, and derive the completeness fields.
fn aggregate(lines: Vec<PurchaseLine>, problem: &PurchaseProblem) -> Solution {
    let required: HashMap<&str, u32> = problem
        .wishlist
        .iter()
        .map(|w| (w.item_name.as_str(), w.required_quantity))
        .collect();
    let required_total = problem.stats.required_total;
    let required_unique = problem.stats.required_unique as u32;

    // Merge identical (item, source, price) lines.
    let mut merged: Vec<PurchaseLine> = Vec::new();
    for line in lines {
        if line.quantity == 0 {
            continue;
        }
        match merged.iter_mut().find(|m| {
            m.item_name == line.item_name
                && m.source_id == line.source_id
                && m.unit_price.to_bits() == line.unit_price.to_bits()
        }) {
            Some(existing) => existing.quantity += line.quantity,
            None => merged.push(line),
        }
    }

    // Cap each item at its required quantity, keeping the cheapest lines.
    let mut by_item: HashMap<&str, Vec<usize>> = HashMap::new();
    for (idx, line) in merged.iter().enumerate() {
        by_item.entry(line.item_name.as_str()).or_default().push(idx);
    }
    let mut keep_quantity = vec![0u32; merged.len()];
    let mut found_per_item: HashMap<String, u32> = HashMap::new();
    for (item, indices) in by_item {
        let Some(&limit) = required.get(item) else {
            // Not on the wishlist: contributes nothing.
            continue;
        };
        let mut indices = indices;
        indices.sort_by(|&a, &b| {
            merged[a]
                .unit_price
                .total_cmp(&merged[b].unit_price)
                .then(merged[a].source_id.cmp(&merged[b].source_id))
        });
        let mut remaining = limit;
        for idx in indices {
            if remaining == 0 {
                break;
            }
            let take = merged[idx].quantity.min(remaining);
            keep_quantity[idx] = take;
            remaining -= take;
        }
        let found = limit - remaining;
        if found > 0 {
            found_per_item.insert(item.to_string(), found);
        }
    }

    // Group the kept lines by source. Subtotals are summed only after the
    // per-source item sort so the result is bit-identical no matter what
    // order the raw lines arrived in (normalization must be idempotent).
    let mut sources: Vec<SourcePurchase> = Vec::new();
    for (idx, line) in merged.into_iter().enumerate() {
        let quantity = keep_quantity[idx];
        if quantity == 0 {
            continue;
        }
        let kept = PurchaseLine { quantity, ..line };
        match sources.iter_mut().find(|s| s.source_id == kept.source_id) {
            Some(source) => source.items.push(kept),
            None => sources.push(SourcePurchase {
                source_name: kept.source_name.clone(),
                source_id: kept.source_id,
                subtotal: 0.0,
                items: vec![kept],
            }),
        }
    }
    for source in &mut sources {
        source
            .items
            .sort_by(|a, b| a.item_name.cmp(&b.item_name).then(a.unit_price.total_cmp(&b.unit_price)));
        source.subtotal = source.items.iter().map(PurchaseLine::line_total).sum();
    }
    sources.sort_by(|a, b| {
        b.subtotal
            .total_cmp(&a.subtotal)
            .then(a.source_id.cmp(&b.source_id))
    });

    let found_total: u32 = found_per_item.values().sum();
    let found_unique = found_per_item.len() as u32;
    let total_price: f64 = sources.iter().map(|s| s.subtotal).sum();
    let missing_items: Vec<String> = problem
        .wishlist
        .iter()
        .filter(|w| !found_per_item.contains_key(w.item_name.as_str()))
        .map(|w| w.item_name.clone())
        .collect();

    Solution {
        total_price,
        required_total,
        required_unique,
        found_total,
        found_unique,
        completeness_by_quantity: found_total as f64 / required_total as f64,
        completeness_by_unique: found_unique as f64 / required_unique as f64,
        is_complete: found_total == required_total,
        missing_items,
        sources,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Diagnostics;
    use crate::model::{ConditionGrade, Language, Listing, Printing, WishlistItem};
    use crate::penalty::PenaltyConfig;
    use proptest::prelude::*;

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

    // ---- Shape conversions ----

    #[test]
    fn test_genotype_normalizes() {
        let problem = problem();
        // Slots: CardA×2 from listing 0, CardB from listing 2.
        let sol = normalize(RawPlan::Genotype(vec![Some(0), Some(0), Some(2)]), &problem);
        assert!(sol.is_complete);
        assert_eq!(sol.found_total, 3);
        assert_eq!(sol.source_count(), 2);
        assert!((sol.total_price - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_genotype_respects_availability() {
        let problem = problem();
        // Listing 2 has only 1 available; the second CardB-less slot stays open.
        let sol = normalize(RawPlan::Genotype(vec![Some(1), Some(1), None]), &problem);
        assert!(!sol.is_complete);
        assert_eq!(sol.found_total, 2);
        assert_eq!(sol.missing_items, vec!["CardB".to_string()]);
    }

    #[test]
    fn test_rows_resolve_against_pool() {
        let problem = problem();
        let rows = vec![
            AllocationRow {
                item_name: "CardA".into(),
                source_id: 1,
                quantity: 2,
            },
            AllocationRow {
                item_name: "CardB".into(),
                source_id: 2,
                quantity: 1,
            },
        ];
        let sol = normalize(RawPlan::Rows(rows), &problem);
        assert!(sol.is_complete);
        assert!((sol.total_price - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_unresolvable_row_degrades_completeness() {
        let problem = problem();
        let rows = vec![AllocationRow {
            item_name: "CardB".into(),
            source_id: 99,
            quantity: 1,
        }];
        let sol = normalize(RawPlan::Rows(rows), &problem);
        assert_eq!(sol.found_total, 0);
        assert_eq!(sol.missing_items.len(), 2);
    }

    // ---- Wishlist-derived counts ----

    #[test]
    fn test_over_allocation_trimmed_to_requirement() {
        let problem = problem();
        // 5 copies of CardA offered; only 2 required. Cheapest lines kept.
        let lines = vec![
            PurchaseLine {
                item_name: "CardA".into(),
                source_id: 2,
                source_name: "Source2".into(),
                quantity: 4,
                unit_price: 1.5,
            },
            PurchaseLine {
                item_name: "CardA".into(),
                source_id: 1,
                source_name: "Source1".into(),
                quantity: 1,
                unit_price: 1.0,
            },
        ];
        let sol = normalize(RawPlan::Lines(lines), &problem);
        assert_eq!(sol.found_total, 2);
        assert!((sol.total_price - 2.5).abs() < 1e-12);
        // found_total never exceeds the requirement for any single item
        let card_a_units: u32 = sol
            .lines()
            .filter(|l| l.item_name == "CardA")
            .map(|l| l.quantity)
            .sum();
        assert_eq!(card_a_units, 2);
    }

    #[test]
    fn test_off_wishlist_lines_dropped() {
        let problem = problem();
        let lines = vec![PurchaseLine {
            item_name: "CardZ".into(),
            source_id: 1,
            source_name: "Source1".into(),
            quantity: 3,
            unit_price: 0.1,
        }];
        let sol = normalize(RawPlan::Lines(lines), &problem);
        assert_eq!(sol.found_total, 0);
        assert_eq!(sol.total_price, 0.0);
    }

    // ---- Invariants ----

    #[test]
    fn test_found_total_matches_lines() {
        let problem = problem();
        let sol = normalize(RawPlan::Genotype(vec![Some(0), Some(1), Some(2)]), &problem);
        let line_sum: u32 = sol.lines().map(|l| l.quantity).sum();
        assert_eq!(sol.found_total, line_sum);
        let subtotal_sum: f64 = sol.sources.iter().map(|s| s.subtotal).sum();
        assert!((sol.total_price - subtotal_sum).abs() < 1e-9);
    }

    #[test]
    fn test_canonical_is_idempotent() {
        let problem = problem();
        let once = normalize(RawPlan::Genotype(vec![Some(0), Some(1), Some(2)]), &problem);
        let twice = normalize(RawPlan::Canonical(once.clone()), &problem);
        assert_eq!(once, twice);
    }

    // ---- Property: idempotence over arbitrary allocations ----

    proptest! {
        #[test]
        fn prop_normalize_idempotent(
            qty_a1 in 0u32..4,
            qty_a2 in 0u32..4,
            qty_b in 0u32..3,
        ) {
            let problem = problem();
            let rows = vec![
                AllocationRow { item_name: "CardA".into(), source_id: 1, quantity: qty_a1 },
                AllocationRow { item_name: "CardA".into(), source_id: 2, quantity: qty_a2 },
                AllocationRow { item_name: "CardB".into(), source_id: 2, quantity: qty_b },
            ];
            let once = normalize(RawPlan::Rows(rows), &problem);
            let twice = normalize(RawPlan::Canonical(once.clone()), &problem);
            prop_assert_eq!(once, twice);
        }
    }
}
