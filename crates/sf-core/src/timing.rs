//! Opt-in wall-clock accounting for the stages of a solve.
//!
//! Every call wrapped in [`timed`] adds its duration to the totals of its
//! [`Stage`]. Nothing is measured unless `SF_TIMING` is set in the
//! environment or [`enable_timing`] was called; [`log_stage_summary`] then
//! reports the totals through `tracing`.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

static ENABLED: AtomicBool = AtomicBool::new(false);

/// Turn on stage accounting for the rest of the process.
pub fn enable_timing() {
    ENABLED.store(true, Ordering::Relaxed);
}

fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed) || std::env::var_os("SF_TIMING").is_some()
}

/// Solve stages with their own totals.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Equation system assembly.
    Assembly,
    /// Linear solves, including the Newton correction.
    LinearSolve,
    /// Finite-difference Jacobian evaluation.
    Jacobian,
    /// Dual-box flux reconstruction passes.
    Reconstruction,
}

impl Stage {
    const ALL: [Stage; 4] = [
        Stage::Assembly,
        Stage::LinearSolve,
        Stage::Jacobian,
        Stage::Reconstruction,
    ];

    fn name(self) -> &'static str {
        match self {
            Stage::Assembly => "assembly",
            Stage::LinearSolve => "linear_solve",
            Stage::Jacobian => "jacobian",
            Stage::Reconstruction => "reconstruction",
        }
    }

    fn totals(self) -> &'static StageTotals {
        &TOTALS[self as usize]
    }
}

struct StageTotals {
    nanos: AtomicU64,
    calls: AtomicU64,
}

impl StageTotals {
    const fn zero() -> Self {
        Self {
            nanos: AtomicU64::new(0),
            calls: AtomicU64::new(0),
        }
    }

    fn add(&self, nanos: u64) {
        self.nanos.fetch_add(nanos, Ordering::Relaxed);
        self.calls.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> (u64, f64) {
        let calls = self.calls.load(Ordering::Relaxed);
        let seconds = self.nanos.load(Ordering::Relaxed) as f64 * 1e-9;
        (calls, seconds)
    }
}

static TOTALS: [StageTotals; 4] = [
    StageTotals::zero(),
    StageTotals::zero(),
    StageTotals::zero(),
    StageTotals::zero(),
];

/// Run `work`, charging its duration to `stage` when timing is on.
pub fn timed<R>(stage: Stage, work: impl FnOnce() -> R) -> R {
    if !is_enabled() {
        return work();
    }
    let start = Instant::now();
    let out = work();
    let nanos = u64::try_from(start.elapsed().as_nanos()).unwrap_or(u64::MAX);
    stage.totals().add(nanos);
    tracing::trace!(stage = stage.name(), elapsed_ns = nanos, "stage finished");
    out
}

/// Calls and accumulated seconds charged to `stage` so far.
pub fn stage_totals(stage: Stage) -> (u64, f64) {
    stage.totals().snapshot()
}

/// Report per-stage totals through `tracing` at info level.
pub fn log_stage_summary() {
    if !is_enabled() {
        return;
    }
    for stage in Stage::ALL {
        let (calls, total_s) = stage_totals(stage);
        if calls > 0 {
            tracing::info!(
                stage = stage.name(),
                calls,
                total_s,
                avg_ms = total_s * 1e3 / calls as f64,
                "timing"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enabled_stage_counts_calls_and_passes_result_through() {
        enable_timing();
        let (before, _) = stage_totals(Stage::Jacobian);
        let value = timed(Stage::Jacobian, || 6 * 7);
        let err: Result<(), &str> = timed(Stage::Jacobian, || Err("singular"));
        assert_eq!(value, 42);
        assert_eq!(err, Err("singular"));
        let (after, seconds) = stage_totals(Stage::Jacobian);
        // other tests in this process may time the same stage concurrently
        assert!(after >= before + 2);
        assert!(seconds >= 0.0);
    }

    #[test]
    fn stage_names_are_distinct() {
        let mut names: Vec<_> = Stage::ALL.iter().map(|s| s.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), Stage::ALL.len());
    }
}
