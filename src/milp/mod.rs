//! Exact optimizer (mixed-integer assignment over HiGHS).
//!
//! Solves the purchase allocation to optimality under an optional
//! distinct-source cap, with an iterative minimum-source-count mode.
//! Infeasibility at a cap is a signal ("try a larger cap" / "partial
//! plan"), never an error.

mod config;
mod solver;

pub use config::MilpConfig;
pub use solver::{better_candidate, MilpResult, MilpSolver};
