//! Power propagation engine.
//!
//! This module recomputes the electrical state of the tree after every edit.
//!
//! ## Propagation
//!
//! Recomputing a node first recomputes each of its children (without
//! propagating upward), sums their input currents into its own output
//! current, then applies the node's forward model:
//!
//! ```text
//! Source       i_out = Σ i_in(children)
//! LDO          i_in  = i_out                      eff = v_out / v_in × 100
//! DCDC         i_in  = v_out × i_out / (eff/100) / v_in
//! Load switch  i_in  = i_out                      v_out = v_in − i_in × rds/1000
//! Load         (user-set i_in)
//! ```
//!
//! Rails finish with `loss = p_in − p_out`. When propagating upward, the same
//! procedure runs on every ancestor up to the root.
//!
//! ## Load switch fixed point
//!
//! A load switch's output voltage depends on its own input current, which in
//! turn depends on children whose draw may scale with that voltage. The switch
//! therefore iterates until the change in voltage drop falls below the
//! convergence threshold, stops early if the change grows (divergence), and
//! gives up after a fixed number of iterations. Both failure modes are
//! reported as [`NonConvergence`] warnings while keeping the last computed
//! values.

mod propagate;
mod report;
mod switch;

pub use propagate::update;
pub use report::{NonConvergence, NonConvergenceReason, Recompute};

/// Convergence threshold on the change in load switch voltage drop (volts).
pub const CONVERGENCE_THRESHOLD: f64 = 1e-6;

/// Maximum load switch iterations per recompute.
pub const MAX_ITERATIONS: usize = 10;

/// Configuration for the load switch solver.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    /// Maximum fixed-point iterations per load switch.
    pub max_iterations: usize,
    /// Convergence threshold on the voltage drop change (volts).
    pub tolerance: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: MAX_ITERATIONS,
            tolerance: CONVERGENCE_THRESHOLD,
        }
    }
}

impl SolverConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the convergence threshold (in volts).
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }
}

/// Divide, mapping a zero divisor or non-finite result to zero.
///
/// Keeps settled field values finite when a supply is configured at 0 V or a
/// converter at 0 % efficiency.
pub(crate) fn ratio(numerator: f64, denominator: f64) -> f64 {
    let q = numerator / denominator;
    if denominator == 0.0 || !q.is_finite() {
        0.0
    } else {
        q
    }
}
