//! The node arena and its edit operations.

use tracing::debug;

use super::field::Field;
use super::node::{LoadFields, Node, NodeKind, RailFields, SourceFields};
use super::types::{FieldKey, NodeId, NodeType};
use super::validate::{validate_field_write, validate_move, validate_parent, validate_swap};
use crate::error::{PowerTreeError, Result};
use crate::solver::{self, Recompute, SolverConfig};

/// An ordered forest of source-rooted power trees.
///
/// Nodes are stored in an arena and refer to each other by [`NodeId`]. Every
/// edit validates first, mutates, then recomputes the affected path before
/// returning; the warnings of that recompute are kept in
/// [`PowerTree::last_recompute`].
#[derive(Debug, Clone, Default)]
pub struct PowerTree {
    /// Arena slots; `None` once a node is deleted. Slots are not reclaimed so
    /// ids stay stable, at the cost of the arena growing with every insert.
    nodes: Vec<Option<Node>>,
    /// Number of occupied slots
    live: usize,
    /// Forest roots (sources) in display order
    roots: Vec<NodeId>,
    /// Load switch solver settings
    config: SolverConfig,
    /// Report of the most recent recompute
    last: Recompute,
}

impl PowerTree {
    /// Create an empty forest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty forest with custom solver settings.
    pub fn with_solver_config(config: SolverConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Get the solver settings.
    pub fn solver_config(&self) -> &SolverConfig {
        &self.config
    }

    /// Number of attached nodes.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Check if the forest has no nodes.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Forest roots in order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Check if `id` refers to an attached node.
    pub fn contains(&self, id: NodeId) -> bool {
        matches!(self.nodes.get(id.0), Some(Some(_)))
    }

    /// Get a node.
    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or(PowerTreeError::NodeNotFound { id })
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(PowerTreeError::NodeNotFound { id })
    }

    /// Get the parent of a node (`None` for roots and unknown ids).
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).ok().and_then(|n| n.parent)
    }

    /// Get the children of a node in order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Input voltage of a node: its parent's output voltage.
    ///
    /// Never stored; absent at forest roots.
    pub fn derive_vin(&self, id: NodeId) -> Option<f64> {
        let parent = self.parent(id)?;
        self.node(parent).ok()?.kind.v_out()
    }

    /// Input power `v_in × i_in`, absent if either factor is absent.
    pub fn p_in(&self, id: NodeId) -> Option<f64> {
        let i_in = self.node(id).ok()?.kind.i_in()?;
        Some(self.derive_vin(id)? * i_in)
    }

    /// Output power `v_out × i_out`, absent if either factor is absent.
    pub fn p_out(&self, id: NodeId) -> Option<f64> {
        let kind = &self.node(id).ok()?.kind;
        Some(kind.v_out()? * kind.i_out()?)
    }

    /// Get a field of a node, computing derived fields on demand.
    pub fn field(&self, id: NodeId, key: FieldKey) -> Option<Field> {
        match key {
            FieldKey::VIn => self
                .derive_vin(id)
                .map(|v| Field::new(v, "Input Voltage", "V")),
            FieldKey::PIn => self.p_in(id).map(|p| Field::new(p, "Input Power", "W")),
            FieldKey::POut => self.p_out(id).map(|p| Field::new(p, "Output Power", "W")),
            _ => self.node(id).ok()?.kind.field(key).cloned(),
        }
    }

    /// Get the numeric value of a field.
    pub fn value(&self, id: NodeId, key: FieldKey) -> Option<f64> {
        self.field(id, key).map(|f| f.get())
    }

    /// Check if `node` is reachable from `ancestor` through child links.
    pub fn is_ancestor_of(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.children(ancestor)
            .iter()
            .any(|&c| c == node || self.is_ancestor_of(c, node))
    }

    /// Depth-first, pre-order walk of the whole forest with node depths.
    pub fn walk(&self) -> Vec<(NodeId, usize)> {
        let mut out = Vec::with_capacity(self.len());
        for &root in &self.roots {
            self.walk_from(root, 0, &mut out);
        }
        out
    }

    fn walk_from(&self, id: NodeId, depth: usize, out: &mut Vec<(NodeId, usize)>) {
        out.push((id, depth));
        for &c in self.children(id) {
            self.walk_from(c, depth + 1, out);
        }
    }

    /// Warnings and statistics of the most recent recompute.
    pub fn last_recompute(&self) -> &Recompute {
        &self.last
    }

    // ============ Insertion ============

    /// Attach a node without recomputing.
    ///
    /// Used by edit operations and by the decoder, which recomputes once after
    /// the whole forest is rebuilt.
    pub(crate) fn attach(&mut self, parent: Option<NodeId>, mut node: Node) -> Result<NodeId> {
        let node_type = node.node_type();
        match parent {
            None if node_type != NodeType::Source => {
                return Err(PowerTreeError::RootMustBeSource { node_type });
            }
            Some(_) if node_type == NodeType::Source => {
                return Err(PowerTreeError::SourceMustBeRoot);
            }
            Some(p) => validate_parent(self, p)?,
            None => {}
        }

        let id = NodeId(self.nodes.len());
        node.parent = parent;
        node.children.clear();
        self.nodes.push(Some(node));
        self.live += 1;
        match parent {
            Some(p) => self.node_mut(p)?.children.push(id),
            None => self.roots.push(id),
        }
        Ok(id)
    }

    /// Add a new source at the end of the forest.
    pub fn add_source(&mut self, name: impl Into<String>, v_out: f64) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes
            .push(Some(Node::new(name, false, NodeKind::Source(SourceFields::new(v_out)))));
        self.live += 1;
        self.roots.push(id);
        debug!(%id, "added source");
        self.last = Recompute::default();
        id
    }

    /// Add a node of any non-source kind under `parent` and recompute.
    pub fn add_child(&mut self, parent: NodeId, name: impl Into<String>, kind: NodeKind) -> Result<NodeId> {
        let node_type = kind.node_type();
        let id = self.attach(Some(parent), Node::new(name, false, kind))?;
        debug!(%id, %parent, %node_type, "added node");
        self.last = solver::update(self, id, true)?;
        Ok(id)
    }

    /// Add an LDO regulator under `parent`.
    pub fn add_ldo(&mut self, parent: NodeId, name: impl Into<String>, v_out: f64) -> Result<NodeId> {
        self.add_child(parent, name, NodeKind::Ldo(RailFields::ldo(v_out)))
    }

    /// Add a DCDC converter under `parent`.
    pub fn add_dcdc(&mut self, parent: NodeId, name: impl Into<String>, v_out: f64, eff: f64) -> Result<NodeId> {
        self.add_child(parent, name, NodeKind::Dcdc(RailFields::dcdc(v_out, eff)))
    }

    /// Add a load switch under `parent`, its output seeded from the supply.
    pub fn add_load_switch(&mut self, parent: NodeId, name: impl Into<String>, rds: f64) -> Result<NodeId> {
        validate_parent(self, parent)?;
        let v_seed = self.node(parent)?.kind.v_out().unwrap_or(0.0);
        self.add_child(parent, name, NodeKind::LoadSwitch(RailFields::load_switch(v_seed, rds)))
    }

    /// Add a load under `parent`.
    pub fn add_load(&mut self, parent: NodeId, name: impl Into<String>, i_in: f64) -> Result<NodeId> {
        self.add_child(parent, name, NodeKind::Load(LoadFields::new(i_in, 1.0)))
    }

    /// Add a node of `node_type` with default values, as the edit menu does.
    pub fn add_default(&mut self, parent: Option<NodeId>, node_type: NodeType) -> Result<NodeId> {
        let name = node_type.default_name();
        match (parent, node_type) {
            (None, NodeType::Source) => Ok(self.add_source(name, 1.0)),
            (None, other) => Err(PowerTreeError::RootMustBeSource { node_type: other }),
            (Some(_), NodeType::Source) => Err(PowerTreeError::SourceMustBeRoot),
            (Some(p), NodeType::LoadSwitch) => self.add_load_switch(p, name, super::node::DEFAULT_RDS_MILLIOHM),
            (Some(p), ty) => {
                let kind = NodeKind::from_values(ty, &[], 0.0)
                    .ok_or_else(|| PowerTreeError::malformed("no default values"))?;
                self.add_child(p, name, kind)
            }
        }
    }

    // ============ Removal and Reordering ============

    /// Delete a node and its whole subtree, then recompute the parent chain.
    pub fn delete(&mut self, id: NodeId) -> Result<()> {
        let parent = self.node(id)?.parent;

        let mut doomed = Vec::new();
        self.collect_post_order(id, &mut doomed);
        for &d in &doomed {
            if let Some(slot) = self.nodes.get_mut(d.0) {
                if slot.take().is_some() {
                    self.live -= 1;
                }
            }
        }

        match parent {
            Some(p) => {
                self.node_mut(p)?.children.retain(|&c| c != id);
                debug!(%id, removed = doomed.len(), "deleted subtree");
                self.last = solver::update(self, p, true)?;
            }
            None => {
                self.roots.retain(|&r| r != id);
                debug!(%id, removed = doomed.len(), "deleted source");
                self.last = Recompute::default();
            }
        }
        Ok(())
    }

    fn collect_post_order(&self, id: NodeId, out: &mut Vec<NodeId>) {
        for &c in self.children(id) {
            self.collect_post_order(c, out);
        }
        out.push(id);
    }

    /// Move `id` under `target`.
    ///
    /// Moving onto the current parent moves the node to the front of its
    /// siblings instead. Both the old and the new parent chains are
    /// recomputed.
    pub fn move_to(&mut self, id: NodeId, target: NodeId) -> Result<()> {
        validate_move(self, id, target)?;
        let old_parent = self
            .node(id)?
            .parent
            .ok_or(PowerTreeError::SourceNotMovable { node: id })?;

        self.node_mut(old_parent)?.children.retain(|&c| c != id);
        if old_parent == target {
            self.node_mut(target)?.children.insert(0, id);
            debug!(%id, parent = %target, "moved to front");
        } else {
            self.node_mut(target)?.children.push(id);
            self.node_mut(id)?.parent = Some(target);
            debug!(%id, from = %old_parent, to = %target, "reparented");
        }

        let mut report = solver::update(self, id, true)?;
        if old_parent != target {
            report.merge(solver::update(self, old_parent, true)?);
        }
        self.last = report;
        Ok(())
    }

    /// Exchange the positions of two siblings.
    pub fn swap_siblings(&mut self, a: NodeId, b: NodeId) -> Result<()> {
        validate_swap(self, a, b)?;
        let parent = self.node(a)?.parent.ok_or(PowerTreeError::NotSiblings { a, b })?;
        let children = &mut self.node_mut(parent)?.children;
        let ia = children.iter().position(|&c| c == a);
        let ib = children.iter().position(|&c| c == b);
        if let (Some(ia), Some(ib)) = (ia, ib) {
            children.swap(ia, ib);
        }
        Ok(())
    }

    // ============ Field Edits ============

    /// Rename a node.
    pub fn rename(&mut self, id: NodeId, name: impl Into<String>) -> Result<()> {
        self.node_mut(id)?.name = name.into();
        Ok(())
    }

    /// Set the persisted disabled flag.
    pub fn set_disabled(&mut self, id: NodeId, disabled: bool) -> Result<()> {
        self.node_mut(id)?.disabled = disabled;
        Ok(())
    }

    /// Write an editable field and recompute the node's path.
    pub fn set_field(&mut self, id: NodeId, key: FieldKey, value: f64) -> Result<()> {
        validate_field_write(self, id, key, value)?;
        if let Some(field) = self.node_mut(id)?.kind.field_mut(key) {
            field.value = value;
        }
        debug!(%id, field = %key, value, "field written");
        self.last = solver::update(self, id, true)?;
        Ok(())
    }

    // ============ Recompute ============

    /// Recompute `id` and, if `propagate_up`, every ancestor.
    pub fn update(&mut self, id: NodeId, propagate_up: bool) -> Result<&Recompute> {
        self.last = solver::update(self, id, propagate_up)?;
        Ok(&self.last)
    }

    /// Recompute every tree in the forest.
    pub fn recompute_all(&mut self) -> &Recompute {
        let mut report = Recompute::default();
        for root in self.roots.clone() {
            if let Ok(r) = solver::update(self, root, false) {
                report.merge(r);
            }
        }
        self.last = report;
        &self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn example() -> (PowerTree, [NodeId; 6]) {
        let mut tree = PowerTree::new();
        let src = tree.add_source("12V_VIN", 12.0);
        let buck = tree.add_dcdc(src, "5V_BUCK", 5.0, 85.0).unwrap();
        let ldo = tree.add_ldo(buck, "3V3_LDO", 3.3).unwrap();
        let led = tree.add_load(buck, "LED Matrix", 1.4).unwrap();
        let mcu = tree.add_load(ldo, "STM32_VDD", 0.1).unwrap();
        let sensor = tree.add_load(ldo, "BME680_VDD", 0.05).unwrap();
        (tree, [src, buck, ldo, led, mcu, sensor])
    }

    #[test]
    fn test_parent_child_links_consistent() {
        let (tree, ids) = example();
        for (id, _) in tree.walk() {
            for &c in tree.children(id) {
                assert_eq!(tree.parent(c), Some(id));
            }
        }
        assert_eq!(tree.len(), ids.len());
        assert_eq!(tree.roots(), &[ids[0]]);
    }

    #[test]
    fn test_vin_derived_from_parent() {
        let (mut tree, [src, buck, ldo, ..]) = example();
        assert_eq!(tree.derive_vin(src), None);
        assert_eq!(tree.derive_vin(buck), Some(12.0));
        assert_eq!(tree.derive_vin(ldo), Some(5.0));

        tree.set_field(buck, FieldKey::VOut, 4.0).unwrap();
        assert_eq!(tree.derive_vin(ldo), Some(4.0));
    }

    #[test]
    fn test_power_fields_absent_without_factor() {
        let (tree, [src, buck, ..]) = example();
        assert!(tree.field(src, FieldKey::PIn).is_none());
        assert!(tree.field(src, FieldKey::POut).is_some());
        let p_in = tree.value(buck, FieldKey::PIn).unwrap();
        let i_in = tree.value(buck, FieldKey::IIn).unwrap();
        assert_abs_diff_eq!(p_in, 12.0 * i_in, epsilon = 1e-12);
    }

    #[test]
    fn test_is_ancestor_of() {
        let (tree, [src, buck, ldo, led, mcu, _]) = example();
        assert!(tree.is_ancestor_of(src, mcu));
        assert!(tree.is_ancestor_of(buck, ldo));
        assert!(!tree.is_ancestor_of(ldo, led));
        assert!(!tree.is_ancestor_of(mcu, mcu));
    }

    #[test]
    fn test_delete_internal_rail_removes_subtree() {
        let (mut tree, [src, buck, ldo, led, mcu, sensor]) = example();
        tree.delete(ldo).unwrap();

        for gone in [ldo, mcu, sensor] {
            assert!(!tree.contains(gone));
            assert!(tree.walk().iter().all(|&(id, _)| id != gone));
        }
        assert_eq!(tree.children(buck), &[led]);
        assert_eq!(tree.len(), 3);
        assert_abs_diff_eq!(tree.value(buck, FieldKey::IOut).unwrap(), 1.4, epsilon = 1e-12);
        assert!(tree.contains(src));
    }

    #[test]
    fn test_delete_source_removes_root() {
        let (mut tree, [src, ..]) = example();
        let aux = tree.add_source("AUX", 3.3);
        tree.delete(src).unwrap();
        assert_eq!(tree.roots(), &[aux]);
        assert_eq!(tree.len(), 1);
        assert!(matches!(tree.delete(src), Err(PowerTreeError::NodeNotFound { .. })));
    }

    #[test]
    fn test_len_tracks_adds_and_deletes() {
        let (mut tree, [src, buck, ..]) = example();
        for i in 0..20 {
            let ldo = tree.add_ldo(buck, format!("LDO{i}"), 1.8).unwrap();
            tree.add_load(ldo, "L", 0.01).unwrap();
            assert_eq!(tree.len(), 8);
            tree.delete(ldo).unwrap();
            assert_eq!(tree.len(), 6);
        }
        assert_eq!(tree.len(), tree.walk().len());

        tree.delete(src).unwrap();
        assert_eq!(tree.len(), 0);
        assert!(tree.is_empty());
    }

    fn snapshot(tree: &PowerTree) -> Vec<(NodeId, Vec<Option<f64>>)> {
        let keys = [FieldKey::VIn, FieldKey::IIn, FieldKey::VOut, FieldKey::IOut, FieldKey::Eff, FieldKey::Loss];
        let mut rows: Vec<_> = tree
            .walk()
            .into_iter()
            .map(|(id, _)| (id, keys.iter().map(|&k| tree.value(id, k)).collect()))
            .collect();
        rows.sort_by_key(|(id, _)| *id);
        rows
    }

    #[test]
    fn test_move_to_current_parent_reorders_to_front() {
        let (mut tree, [_, buck, ldo, led, ..]) = example();
        let before = snapshot(&tree);

        tree.move_to(led, buck).unwrap();
        assert_eq!(tree.children(buck), &[led, ldo]);
        assert_eq!(tree.parent(led), Some(buck));
        assert_eq!(snapshot(&tree), before);
    }

    #[test]
    fn test_reparent_recomputes_both_chains() {
        let (mut tree, [src, buck, ldo, led, ..]) = example();
        tree.move_to(led, src).unwrap();

        assert_eq!(tree.parent(led), Some(src));
        assert_eq!(tree.children(src).last(), Some(&led));
        let buck_i_out = tree.value(buck, FieldKey::IOut).unwrap();
        assert_abs_diff_eq!(buck_i_out, tree.value(ldo, FieldKey::IIn).unwrap(), epsilon = 1e-12);
        let src_i_out = tree.value(src, FieldKey::IOut).unwrap();
        let expected = tree.value(buck, FieldKey::IIn).unwrap() + 1.4;
        assert_abs_diff_eq!(src_i_out, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_rejected_move_leaves_tree_untouched() {
        let (mut tree, [_, buck, ldo, _, mcu, _]) = example();
        let before = tree.walk();
        assert!(tree.move_to(buck, ldo).is_err());
        assert!(tree.move_to(ldo, mcu).is_err());
        assert_eq!(tree.walk(), before);
    }

    #[test]
    fn test_swap_siblings() {
        let (mut tree, [_, _, ldo, _, mcu, sensor]) = example();
        tree.swap_siblings(mcu, sensor).unwrap();
        assert_eq!(tree.children(ldo), &[sensor, mcu]);
    }

    #[test]
    fn test_add_under_load_rejected() {
        let (mut tree, [_, _, _, led, ..]) = example();
        let count = tree.len();
        assert!(matches!(
            tree.add_ldo(led, "bad", 1.8),
            Err(PowerTreeError::LoadCannotParent { .. })
        ));
        assert_eq!(tree.len(), count);
    }

    #[test]
    fn test_add_default_nodes() {
        let mut tree = PowerTree::new();
        let src = tree.add_default(None, NodeType::Source).unwrap();
        assert_eq!(tree.value(src, FieldKey::VOut), Some(1.0));
        assert_eq!(tree.node(src).unwrap().name, "New Source");

        let lsw = tree.add_default(Some(src), NodeType::LoadSwitch).unwrap();
        assert_eq!(tree.value(lsw, FieldKey::Rds), Some(100.0));
        let dcdc = tree.add_default(Some(src), NodeType::Dcdc).unwrap();
        assert_eq!(tree.value(dcdc, FieldKey::Eff), Some(85.0));
        assert!(tree.add_default(None, NodeType::Load).is_err());
        assert!(tree.add_default(Some(src), NodeType::Source).is_err());
    }

    #[test]
    fn test_stale_ids_not_reused() {
        let (mut tree, [_, buck, ldo, ..]) = example();
        tree.delete(ldo).unwrap();
        let fresh = tree.add_ldo(buck, "again", 1.8).unwrap();
        assert_ne!(fresh, ldo);
        assert!(tree.node(ldo).is_err());
    }
}
