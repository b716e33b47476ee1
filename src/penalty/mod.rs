//! Preference/penalty engine.
//!
//! Computes, per candidate listing, a multiplicative cost penalty (or a
//! hard-filter decision under strict mode) from the wishlist's declared
//! preferences and the listing's intrinsic condition grade. The result is
//! an *effective price* attached to each listing; the source listings are
//! never mutated.
//!
//! # Key Types
//!
//! - [`PenaltyConfig`]: penalty table, strict-mode flag, sentinel price
//! - [`ScoredListing`]: listing + effective price + dominant reason
//!
//! # Operations
//!
//! - [`score_one`]: scores a single listing
//! - [`apply`]: batch transform over the whole pool, row-independent and
//!   referentially identical to the per-row path

mod config;
mod engine;

pub use config::PenaltyConfig;
pub use engine::{apply, score_one, PenaltyReason, ScoredListing};
