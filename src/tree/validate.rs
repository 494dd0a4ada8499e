//! Edit validation.
//!
//! Every structural edit is checked here before the tree is touched, so a
//! rejected edit never leaves partial state behind.

use crate::error::{PowerTreeError, Result};

use super::{FieldKey, NodeId, NodeType, PowerTree};

/// Validate that `parent` can take a new child.
pub fn validate_parent(tree: &PowerTree, parent: NodeId) -> Result<()> {
    let node = tree.node(parent)?;
    if !node.node_type().can_parent() {
        return Err(PowerTreeError::LoadCannotParent { target: parent });
    }
    Ok(())
}

/// Validate moving `node` under `target`.
///
/// Checks:
/// - Both nodes are attached
/// - The node is not a source
/// - The target can take children
/// - The target is neither the node itself nor one of its descendants
pub fn validate_move(tree: &PowerTree, node: NodeId, target: NodeId) -> Result<()> {
    if tree.node(node)?.node_type() == NodeType::Source {
        return Err(PowerTreeError::SourceNotMovable { node });
    }
    validate_parent(tree, target)?;
    if node == target || tree.is_ancestor_of(node, target) {
        return Err(PowerTreeError::CycleDetected { node, target });
    }
    Ok(())
}

/// Validate swapping the positions of two siblings.
pub fn validate_swap(tree: &PowerTree, a: NodeId, b: NodeId) -> Result<()> {
    let parent_a = tree.node(a)?.parent;
    let parent_b = tree.node(b)?.parent;
    if parent_a.is_none() || parent_a != parent_b {
        return Err(PowerTreeError::NotSiblings { a, b });
    }
    Ok(())
}

/// Validate a user write of `value` into `key` of `node`.
pub fn validate_field_write(tree: &PowerTree, node: NodeId, key: FieldKey, value: f64) -> Result<()> {
    let editable = tree
        .node(node)?
        .kind
        .field(key)
        .is_some_and(|f| f.editable);
    if !editable {
        return Err(PowerTreeError::FieldNotEditable { node, field: key });
    }
    if !value.is_finite() {
        return Err(PowerTreeError::InvalidFieldValue { field: key, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (PowerTree, NodeId, NodeId, NodeId, NodeId) {
        let mut tree = PowerTree::new();
        let src = tree.add_source("VIN", 12.0);
        let buck = tree.add_dcdc(src, "BUCK", 5.0, 90.0).unwrap();
        let ldo = tree.add_ldo(buck, "LDO", 3.3).unwrap();
        let load = tree.add_load(ldo, "MCU", 0.1).unwrap();
        (tree, src, buck, ldo, load)
    }

    #[test]
    fn test_move_into_descendant_rejected() {
        let (tree, _, buck, ldo, _) = sample();
        assert!(matches!(
            validate_move(&tree, buck, ldo),
            Err(PowerTreeError::CycleDetected { .. })
        ));
        assert!(matches!(
            validate_move(&tree, buck, buck),
            Err(PowerTreeError::CycleDetected { .. })
        ));
    }

    #[test]
    fn test_move_onto_load_rejected() {
        let (tree, _, buck, _, load) = sample();
        assert!(matches!(
            validate_move(&tree, buck, load),
            Err(PowerTreeError::LoadCannotParent { .. })
        ));
    }

    #[test]
    fn test_source_cannot_move() {
        let (tree, src, buck, _, _) = sample();
        assert!(matches!(
            validate_move(&tree, src, buck),
            Err(PowerTreeError::SourceNotMovable { .. })
        ));
    }

    #[test]
    fn test_field_write_checks() {
        let (tree, _, buck, ldo, _) = sample();
        assert!(validate_field_write(&tree, buck, FieldKey::Eff, 92.0).is_ok());
        assert!(matches!(
            validate_field_write(&tree, ldo, FieldKey::Eff, 50.0),
            Err(PowerTreeError::FieldNotEditable { .. })
        ));
        assert!(matches!(
            validate_field_write(&tree, buck, FieldKey::VOut, f64::NAN),
            Err(PowerTreeError::InvalidFieldValue { .. })
        ));
    }

    #[test]
    fn test_swap_requires_siblings() {
        let (mut tree, src, buck, ldo, _) = sample();
        let led = tree.add_load(buck, "LED", 1.0).unwrap();
        assert!(validate_swap(&tree, ldo, led).is_ok());
        assert!(validate_swap(&tree, buck, led).is_err());
        let other = tree.add_source("AUX", 3.3);
        assert!(validate_swap(&tree, src, other).is_err());
    }
}
