//! Reconstruction of a live tree from its persisted form.

use serde_json::Value;
use tracing::debug;

use super::envelope::{EncodedNode, Envelope, CHILDREN_KEY};
use super::FORMAT_VERSION;
use crate::error::{PowerTreeError, Result};
use crate::tree::{Node, NodeId, NodeKind, NodeType, PowerTree};

impl TryFrom<&Value> for EncodedNode {
    type Error = PowerTreeError;

    fn try_from(value: &Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| PowerTreeError::malformed("node encoding must be an object"))?;

        let mut tags = obj.keys().filter(|k| k.as_str() != CHILDREN_KEY);
        let tag = match (tags.next(), tags.next()) {
            (Some(tag), None) => tag,
            (None, _) => return Err(PowerTreeError::malformed("node encoding has no type key")),
            (Some(_), Some(_)) => {
                return Err(PowerTreeError::malformed("node encoding has more than one type key"))
            }
        };
        let node_type = NodeType::from_tag(tag).ok_or_else(|| PowerTreeError::unknown_type(tag))?;

        let args = obj[tag]
            .as_array()
            .ok_or_else(|| PowerTreeError::malformed(format!("{tag} arguments must be an array")))?;
        let name = args
            .first()
            .and_then(Value::as_str)
            .ok_or_else(|| PowerTreeError::malformed(format!("{tag} name must be a string")))?;
        let disabled = match args.get(1) {
            None => false,
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
            Some(_) => {
                return Err(PowerTreeError::malformed(format!(
                    "{tag} '{name}' disabled flag must be a number or boolean"
                )))
            }
        };
        let values = args
            .iter()
            .skip(2)
            .map(|v| {
                v.as_f64().ok_or_else(|| {
                    PowerTreeError::malformed(format!("{tag} '{name}' has a non-numeric field value"))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        if values.len() > node_type.editable_fields().len() {
            return Err(PowerTreeError::malformed(format!(
                "{tag} '{name}' takes at most {} field values, got {}",
                node_type.editable_fields().len(),
                values.len()
            )));
        }

        let children = match obj.get(CHILDREN_KEY) {
            None => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(EncodedNode::try_from)
                .collect::<Result<Vec<_>>>()?,
            Some(_) => return Err(PowerTreeError::malformed("children must be an array")),
        };

        Ok(Self {
            node_type,
            name: name.to_string(),
            disabled,
            values,
            children,
        })
    }
}

impl TryFrom<&Value> for Envelope {
    type Error = PowerTreeError;

    fn try_from(value: &Value) -> Result<Self> {
        let items = value
            .as_array()
            .ok_or_else(|| PowerTreeError::malformed("payload must be a [version, sources] array"))?;

        let version = items
            .first()
            .and_then(Value::as_f64)
            .ok_or(PowerTreeError::MissingVersion)?;
        if version != FORMAT_VERSION {
            return Err(PowerTreeError::VersionMismatch {
                expected: FORMAT_VERSION,
                found: version,
            });
        }

        let sources = items
            .get(1)
            .and_then(Value::as_array)
            .ok_or_else(|| PowerTreeError::malformed("payload has no source list"))?
            .iter()
            .map(EncodedNode::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { version, sources })
    }
}

impl Envelope {
    /// Build a fresh, fully recomputed tree.
    pub fn into_tree(self) -> Result<PowerTree> {
        let mut tree = PowerTree::new();
        for source in &self.sources {
            build(&mut tree, None, source)?;
        }
        let warnings = tree.recompute_all().warnings.len();
        debug!(nodes = tree.len(), warnings, "decoded tree");
        Ok(tree)
    }
}

fn build(tree: &mut PowerTree, parent: Option<NodeId>, encoded: &EncodedNode) -> Result<NodeId> {
    let v_seed = parent
        .and_then(|p| tree.node(p).ok())
        .and_then(|p| p.kind.v_out())
        .unwrap_or(0.0);
    let kind = NodeKind::from_values(encoded.node_type, &encoded.values, v_seed).ok_or_else(|| {
        PowerTreeError::malformed(format!("too many field values for '{}'", encoded.name))
    })?;

    let node = Node::new(encoded.name.clone(), encoded.disabled, kind);
    let id = tree
        .attach(parent, node)
        .map_err(|e| PowerTreeError::malformed(format!("'{}': {e}", encoded.name)))?;

    for child in &encoded.children {
        build(tree, Some(id), child)?;
    }
    Ok(id)
}

/// Parse a JSON payload into a new tree.
///
/// Fails as a whole on any error; no partially built tree escapes.
pub fn decode(input: &str) -> Result<PowerTree> {
    let value: Value = serde_json::from_str(input)?;
    Envelope::try_from(&value)?.into_tree()
}
