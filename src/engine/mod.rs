//! Engine entry point.
//!
//! [`optimize`] is a pure function of `(listings, wishlist, config)`:
//! validation → penalty scoring → algorithm selection → search →
//! normalization, with no dependency on network, persistence, or task
//! infrastructure. [`Engine`] adds an optional bounded result cache in
//! front of the same pipeline.

pub mod cache;
pub mod envelope;

use std::time::Duration;

use tracing::info;

use crate::config::EngineConfig;
use crate::error::{Diagnostics, EngineError};
use crate::model::{Listing, OptimizationResult, PurchaseProblem, WishlistItem};
use crate::selector;

use cache::{cache_key, ResultCache};
use envelope::{ProgressFn, RunEnvelope};

/// Runs one optimization.
///
/// # Errors
///
/// Returns a validation error for empty inputs, malformed wishlist
/// entries, or invalid configuration, always before any search starts.
/// Infeasibility and missing items are reported inside the result, never
/// as errors.
///
/// # Example
///
/// ```no_run
/// use cartopt::config::{Algorithm, EngineConfig};
/// use cartopt::model::{ConditionGrade, Language, Listing, Printing, WishlistItem};
///
/// let listings = vec![Listing {
///     item_name: "CardA".into(),
///     source_id: 1,
///     source_name: "ShopX".into(),
///     price: 1.0,
///     quantity_available: 2,
///     quality_grade: ConditionGrade::NearMint,
///     language: Language::English,
///     printing: Printing::Unlimited,
///     is_special_finish: false,
///     set_name: "Alpha".into(),
/// }];
/// let wishlist = vec![WishlistItem::new("CardA", 2)];
/// let config = EngineConfig::default().with_algorithm(Algorithm::Exact);
///
/// let result = cartopt::optimize(&listings, &wishlist, &config).unwrap();
/// assert!(result.best_solution.is_complete);
/// ```
pub fn optimize(
    listings: &[Listing],
    wishlist: &[WishlistItem],
    config: &EngineConfig,
) -> Result<OptimizationResult, EngineError> {
    optimize_with_progress(listings, wishlist, config, None)
}

/// Runs one optimization with an optional progress callback
/// `(fraction, message)`.
pub fn optimize_with_progress(
    listings: &[Listing],
    wishlist: &[WishlistItem],
    config: &EngineConfig,
    progress: Option<&ProgressFn>,
) -> Result<OptimizationResult, EngineError> {
    config.validate().map_err(EngineError::InvalidConfig)?;

    let mut diagnostics = Diagnostics::new();
    let mut envelope = RunEnvelope::new(Some(Duration::from_secs_f64(config.time_limit_seconds)));
    if let Some(progress) = progress {
        envelope = envelope.with_progress(progress);
    }

    let problem = PurchaseProblem::build(listings, wishlist, config.penalty_config(), &mut diagnostics)?;
    let algorithm = selector::select(&problem.stats, config);

    info!(
        run_id = envelope.run_id(),
        algorithm = algorithm.name(),
        items = problem.stats.required_unique,
        sources = problem.stats.distinct_sources,
        "optimization started"
    );
    envelope.report(0.0, &format!("running {}", algorithm.name()));

    let mut result =
        selector::run_with_fallback(&problem, algorithm, config, &envelope, &mut diagnostics)?;

    result.wall_time = envelope.elapsed();
    diagnostics.merge(std::mem::take(&mut result.diagnostics));
    result.diagnostics = diagnostics;
    envelope.report(1.0, "done");

    info!(
        run_id = envelope.run_id(),
        algorithm = %result.algorithm_name,
        complete = result.best_solution.is_complete,
        price = result.best_solution.total_price,
        wall_ms = result.wall_time.as_millis() as u64,
        "optimization finished"
    );

    Ok(result)
}

/// The engine with a bounded result cache in front of [`optimize`].
///
/// The cache key covers the wishlist and the result-relevant
/// configuration fields; listings are assumed stable for the lifetime of
/// one `Engine` value (rebuild the engine when the pool is refreshed).
#[derive(Debug, Default)]
pub struct Engine {
    cache: ResultCache,
}

impl Engine {
    /// Creates an engine whose cache holds `cache_capacity` results.
    pub fn new(cache_capacity: usize) -> Self {
        Self {
            cache: ResultCache::new(cache_capacity),
        }
    }

    /// Runs one optimization, consulting the cache first.
    pub fn optimize(
        &mut self,
        listings: &[Listing],
        wishlist: &[WishlistItem],
        config: &EngineConfig,
    ) -> Result<OptimizationResult, EngineError> {
        let key = cache_key(wishlist, config);
        if let Some(cached) = self.cache.get(key) {
            return Ok(cached.clone());
        }
        let result = optimize(listings, wishlist, config)?;
        self.cache.insert(key, result.clone());
        Ok(result)
    }

    /// Number of cached results.
    pub fn cached_results(&self) -> usize {
        self.cache.len()
    }
}
