//! Algorithm selection and construction.
//!
//! [`select`] routes a problem to an optimizer from size/coverage
//! heuristics; [`create`] owns algorithm registration and fails fast on
//! invalid configuration; [`run_with_fallback`] retries runtime failures
//! with the exact optimizer before degrading to an explicit failed result.

mod factory;

pub use factory::{create, run_with_fallback, Optimizer};

use tracing::debug;

use crate::config::{Algorithm, EngineConfig};
use crate::model::ProblemStats;

/// Problem-size threshold below which the exact optimizer is preferred.
const SMALL_ITEMS: usize = 12;
/// Distinct-source threshold below which the exact optimizer is preferred.
const SMALL_SOURCES: usize = 15;
/// Item-count threshold routing to the reference-point variant.
const HUGE_ITEMS: usize = 150;
/// Source-count threshold routing to the reference-point variant.
const HUGE_SOURCES: usize = 80;
/// Item-count threshold routing to the decomposition variant.
const LARGE_ITEMS: usize = 60;
/// Coverage (mean sources per item) below which decomposition is used.
const SPARSE_COVERAGE: f64 = 2.0;
/// Time budgets under this many seconds route to the dominance variant.
const TIGHT_BUDGET_SECONDS: f64 = 5.0;

/// Picks an algorithm from problem statistics and the configured budget.
///
/// An explicit `primary_algorithm` always wins; `auto` routes:
/// small/well-covered problems to the exact optimizer, tight budgets to
/// the dominance variant, very large or source-diverse problems to the
/// reference-point variant, large or poorly-covered problems to the
/// decomposition variant, and mid-size problems with ample time to the
/// hybrid pipeline.
pub fn select(stats: &ProblemStats, config: &EngineConfig) -> Algorithm {
    if config.primary_algorithm != Algorithm::Auto {
        return config.primary_algorithm;
    }

    let algorithm = if stats.required_unique <= SMALL_ITEMS && stats.distinct_sources <= SMALL_SOURCES
    {
        Algorithm::Exact
    } else if config.time_limit_seconds < TIGHT_BUDGET_SECONDS {
        Algorithm::Dominance
    } else if stats.required_unique > HUGE_ITEMS || stats.distinct_sources > HUGE_SOURCES {
        Algorithm::ReferencePoint
    } else if stats.required_unique > LARGE_ITEMS || stats.avg_sources_per_item < SPARSE_COVERAGE {
        Algorithm::Decomposition
    } else {
        Algorithm::HybridDominance
    };

    debug!(
        required_unique = stats.required_unique,
        distinct_sources = stats.distinct_sources,
        coverage = stats.avg_sources_per_item,
        selected = algorithm.name(),
        "auto-selected algorithm"
    );
    algorithm
}
