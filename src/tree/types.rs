//! Core identifier and tag types for tree representation.

use std::fmt;

use serde::Serialize;

/// A stable identifier for a node in the tree arena.
///
/// Ids are never reused after a node is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "N{}", self.0)
    }
}

/// The closed set of node types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NodeType {
    /// Root supply
    Source,
    /// Linear regulator
    Ldo,
    /// Switching converter
    Dcdc,
    /// Load switch (resistive pass element)
    LoadSwitch,
    /// Terminal consumer
    Load,
}

impl NodeType {
    /// All node types, in tag order.
    pub const ALL: [NodeType; 5] = [
        NodeType::Source,
        NodeType::Ldo,
        NodeType::Dcdc,
        NodeType::LoadSwitch,
        NodeType::Load,
    ];

    /// Type tag used in the persisted format.
    pub fn tag(&self) -> &'static str {
        match self {
            NodeType::Source => "Source",
            NodeType::Ldo => "LDO",
            NodeType::Dcdc => "DCDC",
            NodeType::LoadSwitch => "LSW",
            NodeType::Load => "Load",
        }
    }

    /// Resolve a persisted type tag, accepting the legacy `Pt*` names.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "Source" | "PtSrc" => Some(NodeType::Source),
            "LDO" | "PtLDO" => Some(NodeType::Ldo),
            "DCDC" | "PtDCDC" => Some(NodeType::Dcdc),
            "LSW" | "PtLSW" => Some(NodeType::LoadSwitch),
            "Load" | "PtLd" => Some(NodeType::Load),
            _ => None,
        }
    }

    /// Check if this is one of the rail variants.
    pub fn is_rail(&self) -> bool {
        matches!(self, NodeType::Ldo | NodeType::Dcdc | NodeType::LoadSwitch)
    }

    /// Check if nodes of this type may own children.
    pub fn can_parent(&self) -> bool {
        !matches!(self, NodeType::Load)
    }

    /// Editable fields in declaration order.
    ///
    /// This order is the positional order of the persisted value array.
    pub fn editable_fields(&self) -> &'static [FieldKey] {
        match self {
            NodeType::Source => &[FieldKey::VOut],
            NodeType::Ldo => &[FieldKey::VOut],
            NodeType::Dcdc => &[FieldKey::VOut, FieldKey::Eff],
            NodeType::LoadSwitch => &[FieldKey::Rds],
            NodeType::Load => &[FieldKey::IIn, FieldKey::Qty],
        }
    }

    /// Name given to nodes created from the edit menu.
    pub fn default_name(&self) -> &'static str {
        match self {
            NodeType::Source => "New Source",
            NodeType::Ldo => "New LDO",
            NodeType::Dcdc => "New DCDC",
            NodeType::LoadSwitch => "New Load Switch",
            NodeType::Load => "New Load",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Key of a field, stored or derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKey {
    /// Input voltage (derived from the parent)
    VIn,
    /// Input current
    IIn,
    /// Input power (derived)
    PIn,
    /// Output voltage
    VOut,
    /// Output current
    IOut,
    /// Output power (derived)
    POut,
    /// Efficiency in percent
    Eff,
    /// Pass element on-resistance in milliohms
    Rds,
    /// Power dissipated in the stage
    Loss,
    /// Load replication count
    Qty,
}

impl FieldKey {
    /// Short key as used by renderers.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKey::VIn => "v_in",
            FieldKey::IIn => "i_in",
            FieldKey::PIn => "p_in",
            FieldKey::VOut => "v_out",
            FieldKey::IOut => "i_out",
            FieldKey::POut => "p_out",
            FieldKey::Eff => "eff",
            FieldKey::Rds => "rds",
            FieldKey::Loss => "loss",
            FieldKey::Qty => "qty",
        }
    }

    /// Parse a short key.
    pub fn parse(key: &str) -> Option<Self> {
        match key {
            "v_in" => Some(FieldKey::VIn),
            "i_in" => Some(FieldKey::IIn),
            "p_in" => Some(FieldKey::PIn),
            "v_out" => Some(FieldKey::VOut),
            "i_out" => Some(FieldKey::IOut),
            "p_out" => Some(FieldKey::POut),
            "eff" => Some(FieldKey::Eff),
            "rds" => Some(FieldKey::Rds),
            "loss" => Some(FieldKey::Loss),
            "qty" => Some(FieldKey::Qty),
            _ => None,
        }
    }

    /// Check if the field is computed on demand rather than stored.
    pub fn is_derived(&self) -> bool {
        matches!(self, FieldKey::VIn | FieldKey::PIn | FieldKey::POut)
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
