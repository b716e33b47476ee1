//! Shared multi-objective machinery for the metaheuristic optimizers.
//!
//! The three population-based variants ([`crate::nsga`], [`crate::moead`],
//! [`crate::refpoint`]) share one genotype/fitness contract:
//!
//! - [`genotype`]: unit-slot genotypes, decoding, evaluation, seeding
//! - [`fitness`]: the fixed-arity objective vector and scalarization weights
//! - [`operators`]: segment crossover and resample mutation
//! - [`pareto`]: non-dominated sorting, crowding distance, best-plan pick

pub mod fitness;
pub mod genotype;
pub mod operators;
pub mod pareto;

pub use fitness::{Objectives, ObjectiveWeights};
pub use genotype::Candidate;
