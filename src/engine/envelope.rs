//! Uniform execution envelope: timing, deadline, progress reporting.
//!
//! Every optimizer receives a [`RunEnvelope`] and checks it at iteration
//! boundaries. Cancellation is cooperative: when the deadline passes, the
//! optimizer returns its best-so-far result instead of raising.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Progress hook: `(fraction in [0, 1], message)`.
pub type ProgressFn = dyn Fn(f64, &str) + Send + Sync;

static NEXT_RUN_ID: AtomicU64 = AtomicU64::new(1);

/// Per-run execution context.
///
/// Carries a process-unique run id (so concurrent optimizer instances
/// never share identity), the start instant, an optional deadline, and an
/// optional progress callback.
pub struct RunEnvelope<'a> {
    run_id: u64,
    started: Instant,
    deadline: Option<Instant>,
    progress: Option<&'a ProgressFn>,
}

impl<'a> RunEnvelope<'a> {
    /// Creates an envelope with an optional wall-clock budget.
    pub fn new(time_limit: Option<Duration>) -> Self {
        let started = Instant::now();
        Self {
            run_id: NEXT_RUN_ID.fetch_add(1, Ordering::Relaxed),
            started,
            deadline: time_limit.map(|limit| started + limit),
            progress: None,
        }
    }

    /// Attaches a progress callback.
    pub fn with_progress(mut self, progress: &'a ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Process-unique identifier of this run.
    pub fn run_id(&self) -> u64 {
        self.run_id
    }

    /// Time since the envelope was created.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Whether the deadline has passed.
    pub fn expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Time left until the deadline, `None` without one.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Forwards progress to the callback, if any.
    pub fn report(&self, fraction: f64, message: &str) {
        if let Some(progress) = self.progress {
            progress(fraction.clamp(0.0, 1.0), message);
        }
    }

    /// A sub-envelope whose budget is the smaller of `cap` and the time
    /// remaining here. Shares the run id and progress callback; used by
    /// the hybrid pipeline to split its budget across phases.
    pub fn sub_budget(&self, cap: Duration) -> RunEnvelope<'a> {
        let budget = match self.remaining() {
            Some(remaining) => remaining.min(cap),
            None => cap,
        };
        let started = Instant::now();
        RunEnvelope {
            run_id: self.run_id,
            started,
            deadline: Some(started + budget),
            progress: self.progress,
        }
    }
}
