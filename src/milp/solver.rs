//! Exact binary/integer assignment model over the HiGHS solver.
//!
//! Variables: integer `x[item][candidate]` bounded by availability and
//! requirement, binary `use_source[s]`, and an integer shortfall slack per
//! item. The slack keeps the model feasible when the pool cannot cover the
//! wishlist, at a price that dominates every real allocation, so "no full
//! plan exists" shows up as an incomplete optimal solution, not an error.
//!
//! A single solve is an opaque blocking call; the time budget is checked
//! between solves of the iterative minimum-source mode.

use std::collections::HashMap;

use good_lp::solvers::highs::highs;
use good_lp::{
    constraint, variable, variables, Expression, ResolutionError, Solution as LpSolution,
    SolverModel, Variable,
};
use tracing::debug;

use super::config::MilpConfig;
use crate::engine::envelope::RunEnvelope;
use crate::error::EngineError;
use crate::model::{PurchaseProblem, Solution};
use crate::normalize::{normalize, AllocationRow, RawPlan};

/// Result of an exact run.
#[derive(Debug, Clone)]
pub struct MilpResult {
    /// Best plan found (see [`better_candidate`] for the retention policy).
    pub best: Solution,

    /// Plans from other cap iterations, best-first.
    pub alternates: Vec<Solution>,

    /// Solve iterations executed.
    pub iterations: usize,

    /// Whether the iterative mode stopped on the time budget.
    pub time_limit_hit: bool,
}

/// Executes the exact assignment model.
pub struct MilpSolver;

impl MilpSolver {
    /// Runs the exact optimizer.
    ///
    /// With `find_minimum_sources`, re-solves with the source cap
    /// decremented from its initial bound down to 1, stopping at the first
    /// cap that admits no complete plan; retains the cheapest complete
    /// plan seen, falling back to most-complete-then-cheapest.
    pub fn run(
        problem: &PurchaseProblem,
        config: &MilpConfig,
        envelope: &RunEnvelope,
    ) -> Result<MilpResult, EngineError> {
        config.validate().map_err(EngineError::InvalidConfig)?;

        if !problem.has_any_candidates() {
            return Ok(MilpResult {
                best: normalize(RawPlan::Rows(Vec::new()), problem),
                alternates: Vec::new(),
                iterations: 0,
                time_limit_hit: false,
            });
        }

        let mut iterations = 0usize;
        let mut time_limit_hit = false;
        let mut best: Option<Solution> = None;
        let mut alternates: Vec<Solution> = Vec::new();

        if !config.find_minimum_sources {
            iterations += 1;
            if let Some(rows) = Self::solve_once(problem, config, config.max_sources)? {
                best = Some(normalize(RawPlan::Rows(rows), problem));
            }
        } else {
            // Iterative minimum-source mode: shrink the cap until no
            // complete plan remains.
            let upper = problem.stats.distinct_sources as u32;
            let start = config.max_sources.map_or(upper, |cap| cap.min(upper)).max(1);
            let floor = config.min_sources.unwrap_or(1).max(1);

            for cap in (floor..=start).rev() {
                if envelope.expired() {
                    time_limit_hit = true;
                    break;
                }
                iterations += 1;
                let Some(rows) = Self::solve_once(problem, config, Some(cap))? else {
                    debug!(cap, "source cap infeasible; stopping descent");
                    break;
                };
                let candidate = normalize(RawPlan::Rows(rows), problem);
                let complete = candidate.is_complete;
                debug!(cap, complete, price = candidate.total_price, "cap iteration");

                match &best {
                    Some(current) if !better_candidate(&candidate, current) => {
                        alternates.push(candidate.clone());
                    }
                    Some(current) => {
                        alternates.push(current.clone());
                        best = Some(candidate.clone());
                    }
                    None => best = Some(candidate.clone()),
                }

                if !complete {
                    // A smaller cap can only be less complete.
                    break;
                }
            }
        }

        let best = match best {
            Some(solution) => solution,
            // Solver-level infeasibility (e.g. min_sources above the pool):
            // a partial/empty result, not an error.
            None => normalize(RawPlan::Rows(Vec::new()), problem),
        };

        alternates.retain(|alt| alt != &best);
        alternates.sort_by(|a, b| {
            b.completeness_by_quantity
                .total_cmp(&a.completeness_by_quantity)
                .then(a.total_price.total_cmp(&b.total_price))
        });
        alternates.dedup();
        alternates.truncate(config.archive_cap);

        Ok(MilpResult {
            best,
            alternates,
            iterations,
            time_limit_hit,
        })
    }

    /// One solve at the given source cap. `Ok(None)` means infeasible at
    /// this cap (a signal, not an error).
    fn solve_once(
        problem: &PurchaseProblem,
        config: &MilpConfig,
        source_cap: Option<u32>,
    ) -> Result<Option<Vec<AllocationRow>>, EngineError> {
        let mut vars = variables!();

        // Distinct sources with at least one usable candidate.
        let mut source_vars: HashMap<u64, Variable> = HashMap::new();
        for indices in &problem.candidates {
            for &listing_idx in indices {
                source_vars
                    .entry(problem.listings[listing_idx].listing.source_id)
                    .or_insert_with(|| vars.add(variable().binary()));
            }
        }

        // Assignment variables: one integer per (item, candidate).
        struct Assignment {
            item_idx: usize,
            listing_idx: usize,
            upper: u32,
            var: Variable,
        }
        let mut assignments: Vec<Assignment> = Vec::new();
        for (item_idx, indices) in problem.candidates.iter().enumerate() {
            let required = problem.wishlist[item_idx].required_quantity;
            for &listing_idx in indices {
                let upper = problem.listings[listing_idx]
                    .listing
                    .quantity_available
                    .min(required);
                if upper == 0 {
                    continue;
                }
                assignments.push(Assignment {
                    item_idx,
                    listing_idx,
                    upper,
                    var: vars.add(variable().integer().min(0.0).max(upper as f64)),
                });
            }
        }

        // Shortfall slack per item.
        let shortfalls: Vec<Variable> = problem
            .wishlist
            .iter()
            .map(|item| {
                vars.add(variable().integer().min(0.0).max(item.required_quantity as f64))
            })
            .collect();

        // Objective: assignment cost + per-source penalty + shortfall penalty.
        let assignment_cost: Expression = assignments
            .iter()
            .map(|a| problem.listings[a.listing_idx].effective_price * a.var)
            .sum();
        let source_cost: Expression = source_vars
            .values()
            .map(|&v| config.source_use_penalty * v)
            .sum();
        let shortfall_cost: Expression = shortfalls
            .iter()
            .map(|&u| config.shortfall_penalty * u)
            .sum();
        let objective = assignment_cost + source_cost + shortfall_cost;

        let mut model = vars.minimise(&objective).using(highs);

        // Per item: assigned units plus shortfall equal the requirement.
        for (item_idx, item) in problem.wishlist.iter().enumerate() {
            let assigned: Expression = assignments
                .iter()
                .filter(|a| a.item_idx == item_idx)
                .map(|a| 1.0 * a.var)
                .sum();
            let lhs = assigned + shortfalls[item_idx];
            model = model.with(constraint!(lhs == item.required_quantity as f64));
        }

        // Linking: buying from a source forces its use flag.
        for assignment in &assignments {
            let source_id = problem.listings[assignment.listing_idx].listing.source_id;
            let use_source = source_vars[&source_id];
            model = model.with(constraint!(
                1.0 * assignment.var - assignment.upper as f64 * use_source <= 0.0
            ));
        }

        // Reverse linking: a flagged source must ship at least one unit,
        // so `min_sources` cannot be met with phantom flags.
        for (&source_id, &use_source) in &source_vars {
            let shipped: Expression = assignments
                .iter()
                .filter(|a| problem.listings[a.listing_idx].listing.source_id == source_id)
                .map(|a| 1.0 * a.var)
                .sum();
            model = model.with(constraint!(shipped - 1.0 * use_source >= 0.0));
        }

        // Source-count bounds.
        let used_sources = || -> Expression { source_vars.values().map(|&v| 1.0 * v).sum() };
        if let Some(cap) = source_cap {
            model = model.with(constraint!(used_sources() <= cap as f64));
        }
        if let Some(min) = config.min_sources {
            model = model.with(constraint!(used_sources() >= min as f64));
        }

        match model.solve() {
            Ok(solution) => {
                let rows: Vec<AllocationRow> = assignments
                    .iter()
                    .filter_map(|a| {
                        let quantity = solution.value(a.var).round() as i64;
                        (quantity > 0).then(|| AllocationRow {
                            item_name: problem.wishlist[a.item_idx].item_name.clone(),
                            source_id: problem.listings[a.listing_idx].listing.source_id,
                            quantity: quantity as u32,
                        })
                    })
                    .collect();
                Ok(Some(rows))
            }
            Err(ResolutionError::Infeasible) | Err(ResolutionError::Unbounded) => Ok(None),
            Err(other) => Err(EngineError::Solver(other.to_string())),
        }
    }
}

/// Retention policy across cap iterations, preserved from the source
/// system: a complete plan beats any incomplete one; among complete plans
/// the cheaper wins; among incomplete plans the more complete wins, then
/// the cheaper.
pub fn better_candidate(candidate: &Solution, incumbent: &Solution) -> bool {
    if candidate.is_complete != incumbent.is_complete {
        return candidate.is_complete;
    }
    if candidate.is_complete {
        return candidate.total_price < incumbent.total_price;
    }
    if candidate.completeness_by_quantity != incumbent.completeness_by_quantity {
        return candidate.completeness_by_quantity > incumbent.completeness_by_quantity;
    }
    candidate.total_price < incumbent.total_price
}

#[cfg(test)]
mod tests {
    use super::*;
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

    fn build(listings: &[Listing], wishlist: &[WishlistItem]) -> PurchaseProblem {
        let mut diag = Diagnostics::new();
        PurchaseProblem::build(listings, wishlist, PenaltyConfig::default(), &mut diag).unwrap()
    }

    /// Brute-force minimum over all feasible allocations (small fixtures).
    fn brute_force_minimum(
        problem: &PurchaseProblem,
        source_cap: Option<usize>,
    ) -> Option<f64> {
        fn recurse(
            problem: &PurchaseProblem,
            item_idx: usize,
            usage: &mut Vec<u32>,
            source_cap: Option<usize>,
            best: &mut Option<f64>,
        ) {
            if item_idx == problem.wishlist.len() {
                let mut sources = std::collections::HashSet::new();
                let mut cost = 0.0;
                for (idx, &qty) in usage.iter().enumerate() {
                    if qty > 0 {
                        sources.insert(problem.listings[idx].listing.source_id);
                        cost += problem.listings[idx].effective_price * qty as f64;
                    }
                }
                if let Some(cap) = source_cap {
                    if sources.len() > cap {
                        return;
                    }
                }
                if best.is_none() || cost < best.unwrap() {
                    *best = Some(cost);
                }
                return;
            }

            let required = problem.wishlist[item_idx].required_quantity;
            let candidates = &problem.candidates[item_idx];

            fn assign(
                problem: &PurchaseProblem,
                item_idx: usize,
                candidates: &[usize],
                pos: usize,
                remaining: u32,
                usage: &mut Vec<u32>,
                source_cap: Option<usize>,
                best: &mut Option<f64>,
            ) {
                if remaining == 0 {
                    recurse(problem, item_idx + 1, usage, source_cap, best);
                    return;
                }
                if pos == candidates.len() {
                    return;
                }
                let idx = candidates[pos];
                let avail = problem.listings[idx].listing.quantity_available;
                for take in (0..=avail.min(remaining)).rev() {
                    usage[idx] += take;
                    assign(
                        problem,
                        item_idx,
                        candidates,
                        pos + 1,
                        remaining - take,
                        usage,
                        source_cap,
                        best,
                    );
                    usage[idx] -= take;
                }
            }

            assign(
                problem, item_idx, candidates, 0, required, usage, source_cap, best,
            );
        }

        let mut best = None;
        let mut usage = vec![0u32; problem.listings.len()];
        recurse(problem, 0, &mut usage, source_cap, &mut best);
        best
    }

    // ---- Spec end-to-end fixtures ----

    #[test]
    fn test_cap_one_buys_everything_from_cheapest_source() {
        let problem = build(
            &[
                listing("CardA", 1, 1.0, 2),
                listing("CardA", 2, 1.5, 5),
            ],
            &[WishlistItem::new("CardA", 2)],
        );
        let config = MilpConfig::default().with_max_sources(1);
        let result = MilpSolver::run(&problem, &config, &RunEnvelope::new(None)).unwrap();

        assert!(result.best.is_complete);
        assert!((result.best.total_price - 2.0).abs() < 1e-6);
        assert_eq!(result.best.source_count(), 1);
        assert_eq!(result.best.sources[0].source_id, 1);
        assert_eq!(result.best.sources[0].items[0].quantity, 2);
    }

    #[test]
    fn test_minimum_source_search_does_not_fragment() {
        let problem = build(
            &[
                listing("CardA", 1, 1.0, 2),
                listing("CardA", 2, 1.5, 5),
            ],
            &[WishlistItem::new("CardA", 2)],
        );
        let config = MilpConfig::default()
            .with_max_sources(2)
            .with_find_minimum_sources(true);
        let result = MilpSolver::run(&problem, &config, &RunEnvelope::new(None)).unwrap();

        // Both caps admit a complete plan; the 1-source plan is cheaper.
        assert!(result.best.is_complete);
        assert_eq!(result.best.source_count(), 1);
        assert!((result.best.total_price - 2.0).abs() < 1e-6);
        assert!(result.iterations >= 2);
    }

    #[test]
    fn test_unlisted_item_yields_missing_not_error() {
        let problem = build(
            &[listing("CardA", 1, 1.0, 2)],
            &[WishlistItem::new("CardB", 3)],
        );
        let result =
            MilpSolver::run(&problem, &MilpConfig::default(), &RunEnvelope::new(None)).unwrap();

        assert_eq!(result.best.missing_items, vec!["CardB".to_string()]);
        assert_eq!(result.best.completeness_by_quantity, 0.0);
        assert_eq!(result.best.found_total, 0);
    }

    // ---- Optimality ----

    #[test]
    fn test_matches_brute_force_minimum() {
        let problem = build(
            &[
                listing("CardA", 1, 1.2, 2),
                listing("CardA", 2, 0.9, 1),
                listing("CardA", 3, 1.6, 3),
                listing("CardB", 1, 2.5, 1),
                listing("CardB", 3, 2.1, 2),
                listing("CardC", 2, 0.4, 4),
            ],
            &[
                WishlistItem::new("CardA", 3),
                WishlistItem::new("CardB", 2),
                WishlistItem::new("CardC", 2),
            ],
        );
        let result =
            MilpSolver::run(&problem, &MilpConfig::default(), &RunEnvelope::new(None)).unwrap();
        let expected = brute_force_minimum(&problem, None).expect("fixture is feasible");

        assert!(result.best.is_complete);
        assert!(
            (result.best.total_price - expected).abs() < 1e-6,
            "solver {} vs brute force {expected}",
            result.best.total_price
        );
    }

    #[test]
    fn test_matches_brute_force_under_cap() {
        let problem = build(
            &[
                listing("CardA", 1, 1.2, 2),
                listing("CardA", 2, 0.9, 2),
                listing("CardB", 1, 2.5, 2),
                listing("CardB", 2, 2.8, 2),
            ],
            &[WishlistItem::new("CardA", 2), WishlistItem::new("CardB", 1)],
        );
        let config = MilpConfig::default().with_max_sources(1);
        let result = MilpSolver::run(&problem, &config, &RunEnvelope::new(None)).unwrap();
        let expected = brute_force_minimum(&problem, Some(1)).expect("one-source plan exists");

        assert!(result.best.is_complete);
        assert!((result.best.total_price - expected).abs() < 1e-6);
        assert_eq!(result.best.source_count(), 1);
    }

    // ---- Degradation ----

    #[test]
    fn test_shortfall_when_availability_insufficient() {
        let problem = build(
            &[listing("CardA", 1, 1.0, 1)],
            &[WishlistItem::new("CardA", 3)],
        );
        let result =
            MilpSolver::run(&problem, &MilpConfig::default(), &RunEnvelope::new(None)).unwrap();

        assert!(!result.best.is_complete);
        assert_eq!(result.best.found_total, 1);
        assert!((result.best.completeness_by_quantity - 1.0 / 3.0).abs() < 1e-9);
        // The found unit is still billed at its real price.
        assert!((result.best.total_price - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_min_sources_bound_respected() {
        let problem = build(
            &[
                listing("CardA", 1, 1.0, 4),
                listing("CardA", 2, 1.5, 4),
            ],
            &[WishlistItem::new("CardA", 2)],
        );
        let config = MilpConfig {
            min_sources: Some(2),
            ..Default::default()
        };
        let result = MilpSolver::run(&problem, &config, &RunEnvelope::new(None)).unwrap();
        assert!(result.best.is_complete);
        assert_eq!(result.best.source_count(), 2);
    }

    // ---- Retention policy ----

    #[test]
    fn test_better_candidate_policy() {
        let complete_cheap = Solution {
            is_complete: true,
            total_price: 5.0,
            ..Solution::empty(2, 1, vec![])
        };
        let complete_pricey = Solution {
            is_complete: true,
            total_price: 9.0,
            ..Solution::empty(2, 1, vec![])
        };
        let partial_full = Solution {
            completeness_by_quantity: 0.5,
            total_price: 1.0,
            ..Solution::empty(2, 1, vec![])
        };
        let partial_less = Solution {
            completeness_by_quantity: 0.25,
            total_price: 0.5,
            ..Solution::empty(2, 1, vec![])
        };

        assert!(better_candidate(&complete_cheap, &complete_pricey));
        assert!(!better_candidate(&complete_pricey, &complete_cheap));
        assert!(better_candidate(&complete_pricey, &partial_full));
        assert!(better_candidate(&partial_full, &partial_less));
        assert!(!better_candidate(&partial_less, &partial_full));
    }
}
