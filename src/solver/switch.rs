//! Fixed-point iteration for load switches.

use tracing::{debug, trace, warn};

use super::propagate::{aggregate_children, set};
use super::{NonConvergence, NonConvergenceReason, Recompute};
use crate::tree::{FieldKey, NodeId, PowerTree};

/// Settle a load switch's output voltage against its own input current.
///
/// Each iteration recomputes the children with the switch's current output
/// voltage, derives the new drop `i_in × rds/1000`, and compares it with the
/// previous drop (starting from zero). Stops when the change is below the
/// configured tolerance; reports [`NonConvergenceReason::Diverged`] as soon as
/// the change grows, and [`NonConvergenceReason::IterationLimit`] when the cap
/// is reached. The values of the last iteration are kept either way.
pub(super) fn settle(tree: &mut PowerTree, id: NodeId, report: &mut Recompute) {
    let config = tree.solver_config().clone();
    let v_in = tree.derive_vin(id).unwrap_or(0.0);
    let rds_ohm = tree.value(id, FieldKey::Rds).unwrap_or(0.0) / 1000.0;

    let mut last_drop = 0.0f64;
    let mut last_delta = f64::INFINITY;

    for iteration in 1..=config.max_iterations {
        let i_total = aggregate_children(tree, id, report);
        set(tree, id, FieldKey::IOut, i_total);
        set(tree, id, FieldKey::IIn, i_total);

        let drop = i_total * rds_ohm;
        set(tree, id, FieldKey::VOut, v_in - drop);

        let delta = (last_drop - drop).abs();
        trace!(%id, iteration, drop, delta, "load switch iteration");

        if delta < config.tolerance {
            debug!(%id, iterations = iteration, v_out = v_in - drop, "load switch settled");
            report.clear(id);
            return;
        }

        if delta > last_delta {
            let warning = NonConvergence {
                node: id,
                iterations: iteration,
                delta,
                reason: NonConvergenceReason::Diverged,
            };
            warn!(%warning, "failed to converge");
            report.warn(warning);
            return;
        }

        last_drop = drop;
        last_delta = delta;
    }

    let warning = NonConvergence {
        node: id,
        iterations: config.max_iterations,
        delta: last_delta,
        reason: NonConvergenceReason::IterationLimit,
    };
    warn!(%warning, "failed to converge");
    report.warn(warning);
}
