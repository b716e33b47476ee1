//! Bounded result cache.
//!
//! A convenience layer in front of the engine, keyed by a hash of the
//! wishlist plus the result-relevant configuration fields, with
//! oldest-first eviction. Correctness never depends on it.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};

use crate::config::EngineConfig;
use crate::model::{OptimizationResult, WishlistItem};

/// FIFO-evicting cache of optimization results.
#[derive(Debug, Default)]
pub struct ResultCache {
    capacity: usize,
    map: HashMap<u64, OptimizationResult>,
    order: VecDeque<u64>,
}

impl ResultCache {
    /// Creates a cache holding up to `capacity` results (0 disables it).
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            map: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    /// Looks up a cached result.
    pub fn get(&self, key: u64) -> Option<&OptimizationResult> {
        self.map.get(&key)
    }

    /// Stores a result, evicting the oldest entry when full.
    pub fn insert(&mut self, key: u64, result: OptimizationResult) {
        if self.capacity == 0 {
            return;
        }
        if self.map.contains_key(&key) {
            self.map.insert(key, result);
            return;
        }
        if self.map.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.map.remove(&oldest);
            }
        }
        self.order.push_back(key);
        self.map.insert(key, result);
    }

    /// Number of cached results.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Hashes the wishlist and the result-relevant configuration fields.
///
/// The time budget, parallelism flag, and cache capacity are excluded:
/// they shape how long a run takes, not which plan it should return.
pub fn cache_key(wishlist: &[WishlistItem], config: &EngineConfig) -> u64 {
    let mut hasher = DefaultHasher::new();

    for item in wishlist {
        item.item_name.hash(&mut hasher);
        item.required_quantity.hash(&mut hasher);
        item.preferred_quality.hash(&mut hasher);
        item.preferred_language.hash(&mut hasher);
        item.preferred_printing.hash(&mut hasher);
        item.preferred_set.hash(&mut hasher);
        item.preferred_finish.hash(&mut hasher);
    }

    config.primary_algorithm.name().hash(&mut hasher);
    config.min_sources.hash(&mut hasher);
    config.max_sources.hash(&mut hasher);
    config.find_minimum_sources.hash(&mut hasher);
    config.strict_preferences.hash(&mut hasher);
    config.max_generations.hash(&mut hasher);
    config.population_size.hash(&mut hasher);
    config.neighborhood_size.hash(&mut hasher);
    config.reference_point_divisions.hash(&mut hasher);
    config.seed.hash(&mut hasher);
    for weight in [
        config.objective_weights.cost,
        config.objective_weights.quality,
        config.objective_weights.completeness,
        config.objective_weights.sources,
        config.acceptable_completeness,
    ] {
        weight.to_bits().hash(&mut hasher);
    }

    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Diagnostics;
    use crate::model::Solution;

    fn result(name: &str) -> OptimizationResult {
        OptimizationResult::failed(name, 1, 1, vec!["CardA".into()], Diagnostics::new())
    }

    fn dummy_solution() -> Solution {
        Solution::empty(1, 1, vec!["CardA".into()])
    }

    #[test]
    fn test_insert_and_get() {
        let mut cache = ResultCache::new(2);
        cache.insert(1, result("a"));
        assert_eq!(cache.get(1).unwrap().algorithm_name, "a");
        assert!(cache.get(2).is_none());
    }

    #[test]
    fn test_oldest_first_eviction() {
        let mut cache = ResultCache::new(2);
        cache.insert(1, result("a"));
        cache.insert(2, result("b"));
        cache.insert(3, result("c"));
        assert!(cache.get(1).is_none());
        assert!(cache.get(2).is_some());
        assert!(cache.get(3).is_some());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_zero_capacity_disables() {
        let mut cache = ResultCache::new(0);
        cache.insert(1, result("a"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_key_sensitive_to_wishlist_and_config() {
        let wishlist = vec![WishlistItem::new("CardA", 2)];
        let config = EngineConfig::default();
        let base = cache_key(&wishlist, &config);

        let other_wishlist = vec![WishlistItem::new("CardA", 3)];
        assert_ne!(base, cache_key(&other_wishlist, &config));

        let other_config = EngineConfig::default().with_strict_preferences(true);
        assert_ne!(base, cache_key(&wishlist, &other_config));

        // Runtime-only knobs do not change the key.
        let runtime_config = EngineConfig::default()
            .with_time_limit_seconds(1.0)
            .with_parallel(false);
        assert_eq!(base, cache_key(&wishlist, &runtime_config));
    }

    #[test]
    fn test_same_key_overwrites() {
        let mut cache = ResultCache::new(2);
        cache.insert(1, result("a"));
        let mut replacement = result("b");
        replacement.best_solution = dummy_solution();
        cache.insert(1, replacement);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(1).unwrap().algorithm_name, "b");
    }
}
