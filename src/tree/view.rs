//! Render-ready snapshots of the tree.

use serde::Serialize;

use super::{FieldKey, NodeId, PowerTree};

/// Display order of fields on a node card.
pub const DISPLAY_ORDER: [FieldKey; 10] = [
    FieldKey::VIn,
    FieldKey::IIn,
    FieldKey::PIn,
    FieldKey::VOut,
    FieldKey::IOut,
    FieldKey::POut,
    FieldKey::Eff,
    FieldKey::Rds,
    FieldKey::Loss,
    FieldKey::Qty,
];

/// One formatted field line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldView {
    pub key: FieldKey,
    pub text: String,
    pub editable: bool,
}

/// Everything a renderer needs to draw one node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeView {
    pub id: NodeId,
    pub name: String,
    pub node_type: &'static str,
    pub depth: usize,
    pub disabled: bool,
    /// Parent id, `None` for sources
    pub parent: Option<NodeId>,
    pub fields: Vec<FieldView>,
}

impl PowerTree {
    /// Visible fields of a node, formatted, in display order.
    ///
    /// Hidden fields and derived fields without a value are skipped.
    pub fn display_fields(&self, id: NodeId) -> Vec<FieldView> {
        DISPLAY_ORDER
            .iter()
            .filter_map(|&key| self.field(id, key).map(|f| (key, f)))
            .filter(|(_, f)| !f.hidden)
            .map(|(key, f)| FieldView {
                key,
                text: f.format(),
                editable: f.editable,
            })
            .collect()
    }

    /// Depth-first snapshot of the whole forest.
    pub fn view(&self) -> Vec<NodeView> {
        self.walk()
            .into_iter()
            .filter_map(|(id, depth)| {
                let node = self.node(id).ok()?;
                Some(NodeView {
                    id,
                    name: node.name.clone(),
                    node_type: node.node_type().tag(),
                    depth,
                    disabled: node.disabled,
                    parent: node.parent,
                    fields: self.display_fields(id),
                })
            })
            .collect()
    }
}
