//! Multi-algorithm purchase-allocation optimization engine.
//!
//! Given a wishlist of required items (with per-item quantities and
//! optional quality/language/printing/finish/set preferences) and a pool
//! of candidate listings, computes purchase plans that satisfy required
//! quantities while minimizing cost, maximizing preference match, and
//! bounding the number of distinct sources used.
//!
//! # Optimizers
//!
//! - **Exact (MILP)**: binary/integer assignment solved to optimality over
//!   HiGHS, with an iterative minimum-distinct-source search mode.
//! - **Dominance-sorted**: NSGA-II survival (non-dominated sorting +
//!   crowding distance).
//! - **Decomposition**: MOEA/D with Tchebycheff, weighted-sum, or
//!   penalty-boundary-intersection scalarization.
//! - **Reference-point**: NSGA-III survival over a Das–Dennis direction
//!   lattice.
//! - **Hybrid pipelines**: exact seed → seeded metaheuristic refinement →
//!   bounded local search.
//!
//! # Architecture
//!
//! The engine is a pure function of `(listings, wishlist, config)`: the
//! penalty engine attaches effective prices, the selector routes to an
//! optimizer from problem statistics, every optimizer's raw output passes
//! through one solution normalizer, and terminal failure states are data:
//! infeasibility and missing items are reported inside the result, not
//! raised.
//!
//! # Example
//!
//! ```no_run
//! use cartopt::config::EngineConfig;
//! use cartopt::model::{ConditionGrade, Language, Listing, Printing, WishlistItem};
//!
//! let listings = vec![Listing {
//!     item_name: "CardA".into(),
//!     source_id: 1,
//!     source_name: "ShopX".into(),
//!     price: 1.0,
//!     quantity_available: 2,
//!     quality_grade: ConditionGrade::NearMint,
//!     language: Language::English,
//!     printing: Printing::Unlimited,
//!     is_special_finish: false,
//!     set_name: "Alpha".into(),
//! }];
//! let wishlist = vec![WishlistItem::new("CardA", 2)];
//!
//! let result = cartopt::optimize(&listings, &wishlist, &EngineConfig::default()).unwrap();
//! println!(
//!     "{}: ${:.2} from {} source(s)",
//!     result.algorithm_name,
//!     result.best_solution.total_price,
//!     result.best_solution.source_count()
//! );
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod hybrid;
pub mod milp;
pub mod moead;
pub mod model;
pub mod moo;
pub mod normalize;
pub mod nsga;
pub mod penalty;
pub mod random;
pub mod refpoint;
pub mod selector;

pub use config::{Algorithm, DecompositionMethod, EngineConfig};
pub use engine::{optimize, optimize_with_progress, Engine};
pub use error::{Diagnostics, EngineError};
pub use model::{Listing, OptimizationResult, Solution, WishlistItem};
