//! Dominance-sorted metaheuristic (NSGA-II survival).
//!
//! Non-dominated sorting plus crowding-distance truncation each
//! generation; terminates on the generation budget, a stagnation window,
//! or the time budget.
//!
//! # References
//!
//! - Deb et al. (2002), *A Fast and Elitist Multiobjective GA: NSGA-II*

mod config;
mod runner;

pub use config::NsgaConfig;
pub use runner::{NsgaResult, NsgaRunner};
