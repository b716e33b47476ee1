//! Error taxonomy and run diagnostics.
//!
//! Only *validation* problems and internal solver failures are errors.
//! Infeasibility (no allocation satisfies the constraints) and degraded
//! results (items with no usable candidates) are ordinary data, surfaced
//! through [`Solution`](crate::model::Solution) fields such as
//! `missing_items`; they never raise.

use thiserror::Error;

/// Errors raised before or during an optimization run.
///
/// Validation variants are raised immediately, before any search starts.
/// [`Solver`](EngineError::Solver) covers unexpected failures inside one
/// optimizer; the factory catches it and retries with the exact optimizer
/// before surfacing a failed result.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The listing pool is empty.
    #[error("listing pool is empty")]
    EmptyListings,

    /// The wishlist is empty.
    #[error("wishlist is empty")]
    EmptyWishlist,

    /// A wishlist entry is malformed.
    #[error("invalid wishlist entry '{item}': {reason}")]
    InvalidWishlist { item: String, reason: String },

    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An optimizer failed internally (solver error, malformed model).
    #[error("solver failure: {0}")]
    Solver(String),
}

/// Severity of a diagnostic entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
}

/// One diagnostic entry collected during a run.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

/// Diagnostics collected during one optimization run.
///
/// An explicit context object threaded through the engine and returned
/// alongside the result; the caller controls its lifetime. Collects
/// non-fatal findings: items with no candidates, truncated budgets,
/// fallback activations.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Creates an empty diagnostics context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an informational entry.
    pub fn info(&mut self, message: impl Into<String>) {
        self.entries.push(Diagnostic {
            severity: Severity::Info,
            message: message.into(),
        });
    }

    /// Records a warning.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.entries.push(Diagnostic {
            severity: Severity::Warning,
            message: message.into(),
        });
    }

    /// All collected entries, in insertion order.
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Whether any warning was recorded.
    pub fn has_warnings(&self) -> bool {
        self.entries
            .iter()
            .any(|d| d.severity == Severity::Warning)
    }

    /// Absorbs all entries from another context.
    pub fn merge(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }
}
