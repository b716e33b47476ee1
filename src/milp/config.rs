//! Exact optimizer configuration.

use crate::config::EngineConfig;

/// Configuration for the exact (MILP) optimizer.
#[derive(Debug, Clone)]
pub struct MilpConfig {
    /// Upper bound on distinct sources; `None` leaves the count free.
    pub max_sources: Option<u32>,

    /// Lower bound on distinct sources.
    pub min_sources: Option<u32>,

    /// Re-solve with a shrinking cap and keep the best plan across
    /// iterations.
    pub find_minimum_sources: bool,

    /// Small per-used-source objective penalty; discourages gratuitous
    /// source fragmentation without distorting the cost ranking.
    pub source_use_penalty: f64,

    /// Objective penalty per unassigned required unit. Must dominate any
    /// realistic plan cost so the solver only leaves units short when the
    /// pool genuinely cannot supply them.
    pub shortfall_penalty: f64,

    /// Maximum alternates kept across cap iterations.
    pub archive_cap: usize,
}

impl Default for MilpConfig {
    fn default() -> Self {
        Self {
            max_sources: None,
            min_sources: None,
            find_minimum_sources: false,
            source_use_penalty: 0.01,
            shortfall_penalty: 1_000_000.0,
            archive_cap: 10,
        }
    }
}

impl MilpConfig {
    /// Derives the exact-optimizer configuration from the engine record.
    pub fn from_engine(config: &EngineConfig) -> Self {
        Self {
            max_sources: config.max_sources,
            min_sources: config.min_sources,
            find_minimum_sources: config.find_minimum_sources,
            ..Self::default()
        }
    }

    /// Sets the source cap.
    pub fn with_max_sources(mut self, cap: u32) -> Self {
        self.max_sources = Some(cap);
        self
    }

    /// Enables the iterative minimum-source search.
    pub fn with_find_minimum_sources(mut self, enabled: bool) -> Self {
        self.find_minimum_sources = enabled;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_sources == Some(0) {
            return Err("max_sources must be at least 1".into());
        }
        if let (Some(min), Some(max)) = (self.min_sources, self.max_sources) {
            if min > max {
                return Err("min_sources must not exceed max_sources".into());
            }
        }
        if !self.source_use_penalty.is_finite() || self.source_use_penalty < 0.0 {
            return Err("source_use_penalty must be finite and non-negative".into());
        }
        if !self.shortfall_penalty.is_finite() || self.shortfall_penalty <= 0.0 {
            return Err("shortfall_penalty must be positive and finite".into());
        }
        if self.archive_cap == 0 {
            return Err("archive_cap must be at least 1".into());
        }
        Ok(())
    }
}
