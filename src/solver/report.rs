//! Recompute reports and solver warnings.

use std::fmt;

use serde::Serialize;

use crate::tree::NodeId;

/// Why a load switch failed to settle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NonConvergenceReason {
    /// The change in voltage drop grew between iterations
    Diverged,
    /// The iteration cap was reached while still changing
    IterationLimit,
}

/// A load switch that did not reach a fixed point.
///
/// The node keeps the values of its last iteration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NonConvergence {
    pub node: NodeId,
    pub iterations: usize,
    /// Change in voltage drop at the last iteration (volts)
    pub delta: f64,
    pub reason: NonConvergenceReason,
}

impl fmt::Display for NonConvergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let why = match self.reason {
            NonConvergenceReason::Diverged => "diverged",
            NonConvergenceReason::IterationLimit => "hit the iteration limit",
        };
        write!(
            f,
            "load switch {} {} after {} iterations (Δdrop: {:.2e} V)",
            self.node, why, self.iterations, self.delta
        )
    }
}

/// Outcome of one recompute pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Recompute {
    /// Number of node updates performed
    pub updates: usize,
    /// Load switches that did not settle, at most one entry per node
    pub warnings: Vec<NonConvergence>,
}

impl Recompute {
    /// Check if every load switch settled.
    pub fn converged(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Record a warning, replacing an earlier one for the same node.
    pub(crate) fn warn(&mut self, warning: NonConvergence) {
        self.clear(warning.node);
        self.warnings.push(warning);
    }

    /// Drop any warning for `node` after it settles on a later pass.
    pub(crate) fn clear(&mut self, node: NodeId) {
        self.warnings.retain(|w| w.node != node);
    }

    /// Fold a later pass into this report.
    pub fn merge(&mut self, later: Recompute) {
        self.updates += later.updates;
        for w in later.warnings {
            self.warn(w);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warning(node: usize, iterations: usize) -> NonConvergence {
        NonConvergence {
            node: NodeId(node),
            iterations,
            delta: 0.5,
            reason: NonConvergenceReason::Diverged,
        }
    }

    #[test]
    fn test_one_warning_per_node() {
        let mut report = Recompute::default();
        report.warn(warning(1, 3));
        report.warn(warning(1, 4));
        report.warn(warning(2, 2));
        assert_eq!(report.warnings.len(), 2);
        assert_eq!(report.warnings[0].iterations, 4);

        report.clear(NodeId(1));
        assert_eq!(report.warnings.len(), 1);
        assert!(!report.converged());
    }

    #[test]
    fn test_display() {
        let text = warning(7, 3).to_string();
        assert!(text.starts_with("load switch N7 diverged after 3 iterations"));
    }
}
