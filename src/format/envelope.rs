//! Encoded forms of the tree.
//!
//! A node encodes as an object with a single type key whose value is the
//! positional array `[name, disabled, ...editable values]`, plus an optional
//! `"c"` array of children:
//!
//! ```text
//! {"DCDC": ["5V_BUCK", 0, 5, 85], "c": [{"Load": ["LED Matrix", 0, 1.4, 1]}]}
//! ```

use serde::ser::{SerializeMap, SerializeSeq, SerializeTuple};
use serde::{Serialize, Serializer};

use crate::tree::{NodeId, NodeType, PowerTree};

/// Key of the children array in a node encoding.
pub const CHILDREN_KEY: &str = "c";

/// A node and its subtree in persisted form.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedNode {
    pub node_type: NodeType,
    pub name: String,
    pub disabled: bool,
    /// Editable field values in declaration order
    pub values: Vec<f64>,
    pub children: Vec<EncodedNode>,
}

impl EncodedNode {
    /// Encode the subtree rooted at `id`.
    pub fn from_tree(tree: &PowerTree, id: NodeId) -> Option<Self> {
        let node = tree.node(id).ok()?;
        Some(Self {
            node_type: node.node_type(),
            name: node.name.clone(),
            disabled: node.disabled,
            values: node.kind.editable_values(),
            children: node
                .children
                .iter()
                .filter_map(|&c| Self::from_tree(tree, c))
                .collect(),
        })
    }
}

/// Positional argument array of a node.
struct Positional<'a>(&'a EncodedNode);

impl Serialize for Positional<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let node = self.0;
        let mut seq = serializer.serialize_seq(Some(2 + node.values.len()))?;
        seq.serialize_element(&node.name)?;
        seq.serialize_element(&u8::from(node.disabled))?;
        for v in &node.values {
            seq.serialize_element(v)?;
        }
        seq.end()
    }
}

impl Serialize for EncodedNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.children.is_empty() { 1 } else { 2 };
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry(self.node_type.tag(), &Positional(self))?;
        if !self.children.is_empty() {
            map.serialize_entry(CHILDREN_KEY, &self.children)?;
        }
        map.end()
    }
}

/// The versioned top-level array `[version, sources]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub version: f64,
    pub sources: Vec<EncodedNode>,
}

impl Envelope {
    /// Encode a whole forest at the current format version.
    pub fn from_tree(tree: &PowerTree) -> Self {
        Self {
            version: super::FORMAT_VERSION,
            sources: tree
                .roots()
                .iter()
                .filter_map(|&r| EncodedNode::from_tree(tree, r))
                .collect(),
        }
    }
}

impl Serialize for Envelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&self.version)?;
        tuple.serialize_element(&self.sources)?;
        tuple.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_node_encoding_shape() {
        let mut tree = PowerTree::new();
        let src = tree.add_source("12V_VIN", 12.0);
        let buck = tree.add_dcdc(src, "5V_BUCK", 5.0, 85.0).unwrap();
        tree.add_load(buck, "LED", 1.5).unwrap();
        tree.set_disabled(buck, true).unwrap();

        let value = serde_json::to_value(Envelope::from_tree(&tree)).unwrap();
        assert_eq!(
            value,
            json!([
                0.1,
                [{
                    "Source": ["12V_VIN", 0, 12.0],
                    "c": [{
                        "DCDC": ["5V_BUCK", 1, 5.0, 85.0],
                        "c": [{ "Load": ["LED", 0, 1.5, 1.0] }]
                    }]
                }]
            ])
        );
    }

    #[test]
    fn test_leaf_omits_children_key() {
        let mut tree = PowerTree::new();
        tree.add_source("LONE", 3.3);
        let text = serde_json::to_string(&Envelope::from_tree(&tree)).unwrap();
        assert!(!text.contains("\"c\""));
    }
}
