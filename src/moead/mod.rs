//! Decomposition-based metaheuristic (MOEA/D).
//!
//! A set of weight vectors partitions objective space; each vector owns
//! one population slot and a neighborhood of nearby vectors. Offspring
//! compete under Tchebycheff, weighted-sum, or penalty-boundary-
//! intersection scalarization against a running ideal point; an unbounded
//! non-dominated archive collects the reportable front.
//!
//! # References
//!
//! - Zhang & Li (2007), *MOEA/D: A Multiobjective Evolutionary Algorithm
//!   Based on Decomposition*

mod config;
mod runner;
pub mod weights;

pub use config::MoeadConfig;
pub use runner::{MoeadResult, MoeadRunner};
