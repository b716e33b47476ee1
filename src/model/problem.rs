//! Preprocessed problem instance shared by every optimizer.
//!
//! [`PurchaseProblem`] is assembled once per run: listings are scored by
//! the penalty engine, per-item candidate indices are built and sorted by
//! effective price, and a flat slot map (one slot per required unit) is
//! derived for the metaheuristic genotype. Construction performs all input
//! validation; optimizers can assume a well-formed instance.

use std::collections::{HashMap, HashSet};

use crate::error::{Diagnostics, EngineError};
use crate::model::{Listing, WishlistItem};
use crate::penalty::{self, PenaltyConfig, ScoredListing};

/// Size and coverage statistics consumed by the algorithm selector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProblemStats {
    /// Distinct required items.
    pub required_unique: usize,

    /// Total required units across the wishlist.
    pub required_total: u32,

    /// Distinct sources offering at least one usable listing.
    pub distinct_sources: usize,

    /// Mean number of distinct sources offering each required item.
    pub avg_sources_per_item: f64,
}

/// A validated, penalty-scored problem instance.
#[derive(Debug, Clone)]
pub struct PurchaseProblem {
    /// Scored listing pool; indices into this vector are the engine's
    /// universal listing ids.
    pub listings: Vec<ScoredListing>,

    /// The wishlist, in caller order.
    pub wishlist: Vec<WishlistItem>,

    /// Per wishlist item: usable listing indices, cheapest effective
    /// price first. Empty when no source offers the item.
    pub candidates: Vec<Vec<usize>>,

    /// Genotype slot map: `slot_item[k]` is the wishlist index that unit
    /// slot `k` belongs to. Length = sum of required quantities.
    pub slot_item: Vec<usize>,

    /// Penalty configuration the pool was scored with.
    pub penalty: PenaltyConfig,

    /// Selector statistics.
    pub stats: ProblemStats,
}

impl PurchaseProblem {
    /// Scores and validates the inputs into a problem instance.
    ///
    /// Fails fast on empty inputs or malformed wishlist entries; items
    /// without any usable candidate are recorded in `diagnostics` and
    /// surface later as `missing_items`, not as errors.
    pub fn build(
        listings: &[Listing],
        wishlist: &[WishlistItem],
        penalty_config: PenaltyConfig,
        diagnostics: &mut Diagnostics,
    ) -> Result<Self, EngineError> {
        if listings.is_empty() {
            return Err(EngineError::EmptyListings);
        }
        if wishlist.is_empty() {
            return Err(EngineError::EmptyWishlist);
        }

        let mut seen = HashSet::new();
        for item in wishlist {
            if item.item_name.is_empty() {
                return Err(EngineError::InvalidWishlist {
                    item: String::from("<unnamed>"),
                    reason: "item_name must not be empty".into(),
                });
            }
            if item.required_quantity == 0 {
                return Err(EngineError::InvalidWishlist {
                    item: item.item_name.clone(),
                    reason: "required_quantity must be at least 1".into(),
                });
            }
            if !seen.insert(item.item_name.as_str()) {
                return Err(EngineError::InvalidWishlist {
                    item: item.item_name.clone(),
                    reason: "duplicate wishlist entry".into(),
                });
            }
        }

        penalty_config
            .validate()
            .map_err(EngineError::InvalidConfig)?;

        let scored = penalty::apply(listings, wishlist, &penalty_config);

        // Usable listings per item name.
        let mut by_item: HashMap<&str, Vec<usize>> = HashMap::new();
        for (idx, sl) in scored.iter().enumerate() {
            if sl.is_usable(&penalty_config) {
                by_item
                    .entry(sl.listing.item_name.as_str())
                    .or_default()
                    .push(idx);
            }
        }

        let mut candidates = Vec::with_capacity(wishlist.len());
        for item in wishlist {
            let mut indices = by_item
                .get(item.item_name.as_str())
                .cloned()
                .unwrap_or_default();
            indices.sort_by(|&a, &b| {
                scored[a]
                    .effective_price
                    .partial_cmp(&scored[b].effective_price)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            if indices.is_empty() {
                diagnostics.warn(format!("no usable candidate for '{}'", item.item_name));
            }
            candidates.push(indices);
        }

        let mut slot_item = Vec::new();
        for (item_idx, item) in wishlist.iter().enumerate() {
            for _ in 0..item.required_quantity {
                slot_item.push(item_idx);
            }
        }

        let stats = Self::compute_stats(wishlist, &candidates, &scored);

        Ok(Self {
            listings: scored,
            wishlist: wishlist.to_vec(),
            candidates,
            slot_item,
            penalty: penalty_config,
            stats,
        })
    }

    fn compute_stats(
        wishlist: &[WishlistItem],
        candidates: &[Vec<usize>],
        scored: &[ScoredListing],
    ) -> ProblemStats {
        let required_total: u32 = wishlist.iter().map(|w| w.required_quantity).sum();

        let mut all_sources = HashSet::new();
        let mut coverage_sum = 0usize;
        for indices in candidates {
            let item_sources: HashSet<u64> = indices
                .iter()
                .map(|&i| scored[i].listing.source_id)
                .collect();
            coverage_sum += item_sources.len();
            all_sources.extend(item_sources);
        }

        ProblemStats {
            required_unique: wishlist.len(),
            required_total,
            distinct_sources: all_sources.len(),
            avg_sources_per_item: coverage_sum as f64 / wishlist.len() as f64,
        }
    }

    /// Total required units (= genotype length).
    pub fn total_units(&self) -> usize {
        self.slot_item.len()
    }

    /// Names of required items with no usable candidate.
    pub fn missing_item_names(&self) -> Vec<String> {
        self.wishlist
            .iter()
            .zip(self.candidates.iter())
            .filter(|(_, c)| c.is_empty())
            .map(|(w, _)| w.item_name.clone())
            .collect()
    }

    /// Whether any item has at least one usable candidate.
    pub fn has_any_candidates(&self) -> bool {
        self.candidates.iter().any(|c| !c.is_empty())
    }
}
