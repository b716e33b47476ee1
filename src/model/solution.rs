//! Canonical solution and result types.
//!
//! A [`Solution`] is a value type: created once by the normalizer
//! ([`crate::normalize`]) and never mutated afterwards. Every optimizer's
//! raw output funnels into this shape, so downstream consumers never see
//! algorithm-specific representations.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Diagnostics;

/// One allocation row: buy `quantity` copies of an item from one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseLine {
    pub item_name: String,
    pub source_id: u64,
    pub source_name: String,
    pub quantity: u32,
    /// Effective unit price (penalties applied).
    pub unit_price: f64,
}

impl PurchaseLine {
    /// Total price of this line.
    pub fn line_total(&self) -> f64 {
        self.unit_price * self.quantity as f64
    }
}

/// All lines bought from one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcePurchase {
    pub source_name: String,
    pub source_id: u64,
    pub items: Vec<PurchaseLine>,
    pub subtotal: f64,
}

/// A canonical purchase plan.
///
/// Invariant: `found_total` equals the sum of line quantities across
/// `sources`, and `missing_items` equals the required items minus the found
/// ones; both are recomputable regardless of which optimizer produced the plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    /// Sum of all line totals.
    pub total_price: f64,

    /// Units required by the wishlist.
    pub required_total: u32,

    /// Distinct items required by the wishlist.
    pub required_unique: u32,

    /// Units found, never above `required_total`.
    pub found_total: u32,

    /// Distinct items with at least one unit found.
    pub found_unique: u32,

    /// `found_total / required_total` in `[0, 1]`.
    pub completeness_by_quantity: f64,

    /// `found_unique / required_unique` in `[0, 1]`.
    pub completeness_by_unique: f64,

    /// Whether every required unit was found.
    pub is_complete: bool,

    /// Required items with no allocated unit.
    pub missing_items: Vec<String>,

    /// Per-source breakdown, sorted by descending subtotal.
    pub sources: Vec<SourcePurchase>,
}

impl Solution {
    /// A plan with no allocations; every required item is missing.
    pub fn empty(required_total: u32, required_unique: u32, missing_items: Vec<String>) -> Self {
        Self {
            total_price: 0.0,
            required_total,
            required_unique,
            found_total: 0,
            found_unique: 0,
            completeness_by_quantity: 0.0,
            completeness_by_unique: 0.0,
            is_complete: false,
            missing_items,
            sources: Vec::new(),
        }
    }

    /// Number of distinct sources used.
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// All lines across all sources.
    pub fn lines(&self) -> impl Iterator<Item = &PurchaseLine> {
        self.sources.iter().flat_map(|s| s.items.iter())
    }
}

/// Statistics about one optimizer run.
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Generations (metaheuristics) or cap iterations (exact) executed.
    pub iterations: usize,

    /// Fitness evaluations performed.
    pub evaluations: usize,

    /// Whether the run stopped on the stagnation window.
    pub stagnated: bool,

    /// Whether the run stopped on the time budget.
    pub time_limit_hit: bool,

    /// Whether the initial population was seeded from an exact solution.
    pub seeded: bool,

    /// Whether the factory fell back to the exact optimizer after a failure.
    pub fallback_used: bool,

    /// Size of the final archive / front used for alternates.
    pub archive_size: usize,

    /// Best scalarized fitness at the end of each iteration.
    pub history: Vec<f64>,
}

/// Result of one optimizer invocation.
///
/// Owned by the caller after return. Terminal failure states are data:
/// a failed run carries an empty best solution and an infinite
/// `convergence_metric`, never a raw internal error.
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// The selected purchase plan.
    pub best_solution: Solution,

    /// Alternate plans, best first, capped by the producing optimizer.
    pub alternates: Vec<Solution>,

    /// Name of the algorithm that produced the result.
    pub algorithm_name: String,

    /// Wall-clock duration of the run.
    pub wall_time: Duration,

    /// Generations or solver iterations executed.
    pub iteration_count: usize,

    /// Weighted scalarization of the best solution's objectives;
    /// lower is better, infinite when nothing usable was found.
    pub convergence_metric: f64,

    /// Run statistics.
    pub stats: RunStats,

    /// Diagnostics collected during the run.
    pub diagnostics: Diagnostics,
}

impl OptimizationResult {
    /// A terminal "nothing found" result for the given requirements.
    pub fn failed(
        algorithm_name: impl Into<String>,
        required_total: u32,
        required_unique: u32,
        missing_items: Vec<String>,
        diagnostics: Diagnostics,
    ) -> Self {
        Self {
            best_solution: Solution::empty(required_total, required_unique, missing_items),
            alternates: Vec::new(),
            algorithm_name: algorithm_name.into(),
            wall_time: Duration::ZERO,
            iteration_count: 0,
            convergence_metric: f64::INFINITY,
            stats: RunStats::default(),
            diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(item: &str, source: u64, qty: u32, price: f64) -> PurchaseLine {
        PurchaseLine {
            item_name: item.into(),
            source_id: source,
            source_name: format!("Source{source}"),
            quantity: qty,
            unit_price: price,
        }
    }

    #[test]
    fn test_line_total() {
        assert!((line("CardA", 1, 3, 1.5).line_total() - 4.5).abs() < 1e-12);
    }

    #[test]
    fn test_empty_solution() {
        let sol = Solution::empty(5, 2, vec!["CardA".into(), "CardB".into()]);
        assert_eq!(sol.found_total, 0);
        assert!(!sol.is_complete);
        assert_eq!(sol.source_count(), 0);
        assert_eq!(sol.missing_items.len(), 2);
        assert_eq!(sol.completeness_by_quantity, 0.0);
    }

    #[test]
    fn test_lines_iterates_all_sources() {
        let sol = Solution {
            total_price: 5.0,
            required_total: 3,
            required_unique: 2,
            found_total: 3,
            found_unique: 2,
            completeness_by_quantity: 1.0,
            completeness_by_unique: 1.0,
            is_complete: true,
            missing_items: vec![],
            sources: vec![
                SourcePurchase {
                    source_name: "Source1".into(),
                    source_id: 1,
                    items: vec![line("CardA", 1, 2, 1.0)],
                    subtotal: 2.0,
                },
                SourcePurchase {
                    source_name: "Source2".into(),
                    source_id: 2,
                    items: vec![line("CardB", 2, 1, 3.0)],
                    subtotal: 3.0,
                },
            ],
        };
        assert_eq!(sol.lines().count(), 2);
        assert_eq!(sol.source_count(), 2);
    }

    #[test]
    fn test_failed_result_is_data() {
        let result = OptimizationResult::failed("exact", 3, 1, vec!["CardB".into()], Diagnostics::new());
        assert!(result.convergence_metric.is_infinite());
        assert_eq!(result.best_solution.missing_items, vec!["CardB".to_string()]);
        assert_eq!(result.iteration_count, 0);
    }
}
