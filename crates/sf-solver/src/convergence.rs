//! Convergence metric and divergence detection.

use sf_config::Quantity;
use sf_core::numeric::relative_change;

use crate::state::FieldSet;

/// Largest relative change over the given quantities.
///
/// Returns the first non-finite change as soon as one is found, so a NaN or
/// infinity anywhere in the update is never hidden by `max`.
pub fn max_relative_change(old: &FieldSet, new: &FieldSet, quantities: &[Quantity]) -> f64 {
    let mut worst = 0.0_f64;
    for &q in quantities {
        let (Some(a), Some(b)) = (old.get(q), new.get(q)) else {
            continue;
        };
        for (&o, &n) in a.iter().zip(b.iter()) {
            let change = relative_change(o, n);
            if !change.is_finite() {
                return change;
            }
            worst = worst.max(change);
        }
    }
    worst
}

/// Tracks consecutive growth of the update metric.
#[derive(Debug, Clone)]
pub struct DivergenceMonitor {
    window: usize,
    streak: usize,
    previous: Option<f64>,
}

impl DivergenceMonitor {
    /// `window == 0` disables the growth check.
    pub fn new(window: usize) -> Self {
        Self {
            window,
            streak: 0,
            previous: None,
        }
    }

    /// Record a metric. Returns true once the solve should be considered
    /// diverged.
    pub fn observe(&mut self, metric: f64) -> bool {
        if !metric.is_finite() {
            return true;
        }
        match self.previous {
            Some(prev) if metric > prev => self.streak += 1,
            _ => self.streak = 0,
        }
        self.previous = Some(metric);
        self.window > 0 && self.streak >= self.window
    }
}
