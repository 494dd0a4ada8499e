//! Per-node forward models and the recompute walk.

use tracing::debug;

use super::{ratio, switch, Recompute};
use crate::error::Result;
use crate::tree::{FieldKey, NodeId, NodeType, PowerTree};

/// Recompute `id` and, if `propagate_up`, every ancestor up to its root.
///
/// Recomputing a node recomputes its whole subtree first, so after this call
/// every node on the path from `id` to the root is consistent with its
/// current inputs.
pub fn update(tree: &mut PowerTree, id: NodeId, propagate_up: bool) -> Result<Recompute> {
    tree.node(id)?;

    let mut report = Recompute::default();
    update_node(tree, id, &mut report);

    if propagate_up {
        let mut next = tree.parent(id);
        while let Some(parent) = next {
            update_node(tree, parent, &mut report);
            next = tree.parent(parent);
        }
    }

    debug!(
        %id,
        propagate_up,
        updates = report.updates,
        warnings = report.warnings.len(),
        "recomputed"
    );
    Ok(report)
}

/// Apply the forward model of one node, recomputing its children first.
pub(super) fn update_node(tree: &mut PowerTree, id: NodeId, report: &mut Recompute) {
    let node_type = match tree.node(id) {
        Ok(node) => node.node_type(),
        Err(_) => return,
    };
    report.updates += 1;

    match node_type {
        NodeType::Source => {
            let i_total = aggregate_children(tree, id, report);
            set(tree, id, FieldKey::IOut, i_total);
        }

        NodeType::Ldo => {
            let i_total = aggregate_children(tree, id, report);
            set(tree, id, FieldKey::IOut, i_total);
            set(tree, id, FieldKey::IIn, i_total);

            let v_in = tree.derive_vin(id).unwrap_or(0.0);
            let v_out = tree.value(id, FieldKey::VOut).unwrap_or(0.0);
            set(tree, id, FieldKey::Eff, ratio(v_out, v_in) * 100.0);
            update_loss(tree, id);
        }

        NodeType::Dcdc => {
            let i_total = aggregate_children(tree, id, report);
            set(tree, id, FieldKey::IOut, i_total);

            let p_out = tree.p_out(id).unwrap_or(0.0);
            let eff = tree.value(id, FieldKey::Eff).unwrap_or(0.0);
            let v_in = tree.derive_vin(id).unwrap_or(0.0);
            set(tree, id, FieldKey::IIn, ratio(ratio(p_out, eff / 100.0), v_in));
            update_loss(tree, id);
        }

        NodeType::LoadSwitch => {
            switch::settle(tree, id, report);
            update_loss(tree, id);
        }

        // User-set demand; nothing derived
        NodeType::Load => {}
    }
}

/// Recompute every child and return the sum of their input currents.
pub(super) fn aggregate_children(tree: &mut PowerTree, id: NodeId, report: &mut Recompute) -> f64 {
    let children = tree.children(id).to_vec();
    let mut i_total = 0.0;
    for child in children {
        update_node(tree, child, report);
        i_total += tree.value(child, FieldKey::IIn).unwrap_or(0.0);
    }
    i_total
}

/// Write a stored field, ignoring keys the node does not carry.
pub(super) fn set(tree: &mut PowerTree, id: NodeId, key: FieldKey, value: f64) {
    if let Ok(node) = tree.node_mut(id) {
        if let Some(field) = node.kind.field_mut(key) {
            field.value = value;
        }
    }
}

fn update_loss(tree: &mut PowerTree, id: NodeId) {
    let p_in = tree.p_in(id).unwrap_or(0.0);
    let p_out = tree.p_out(id).unwrap_or(0.0);
    set(tree, id, FieldKey::Loss, p_in - p_out);
}
