//! Node records and their per-type field sets.

use super::field::Field;
use super::types::{FieldKey, NodeId, NodeType};

/// Default source output voltage when decoding without a value.
pub const DEFAULT_SOURCE_VOLTAGE: f64 = 12.0;

/// Default regulator output voltage.
pub const DEFAULT_RAIL_VOLTAGE: f64 = 1.0;

/// Default DCDC efficiency in percent.
pub const DEFAULT_DCDC_EFFICIENCY: f64 = 85.0;

/// Default load switch on-resistance in milliohms.
pub const DEFAULT_RDS_MILLIOHM: f64 = 100.0;

/// Default load current in amps.
pub const DEFAULT_LOAD_CURRENT: f64 = 1.0;

/// A node in the power tree.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    /// Persisted for round trips; does not affect computation
    pub disabled: bool,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub kind: NodeKind,
}

impl Node {
    /// Create a detached node.
    pub fn new(name: impl Into<String>, disabled: bool, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            disabled,
            parent: None,
            children: Vec::new(),
            kind,
        }
    }

    /// Get the node type.
    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }
}

/// Stored fields of a source.
#[derive(Debug, Clone)]
pub struct SourceFields {
    pub v_out: Field,
    pub i_out: Field,
}

impl SourceFields {
    pub fn new(v_out: f64) -> Self {
        Self {
            v_out: Field::editable(v_out, "Output Voltage", "V"),
            i_out: Field::new(0.0, "Output Current", "A"),
        }
    }
}

/// Stored fields shared by all rail variants.
///
/// `param` is the efficiency for LDO/DCDC rails and the on-resistance for
/// load switches.
#[derive(Debug, Clone)]
pub struct RailFields {
    pub i_in: Field,
    pub v_out: Field,
    pub i_out: Field,
    pub param: Field,
    pub loss: Field,
}

impl RailFields {
    fn base(v_out: Field, param: Field) -> Self {
        Self {
            i_in: Field::new(0.0, "Input Current", "A"),
            v_out,
            i_out: Field::new(0.0, "Output Current", "A"),
            param,
            loss: Field::new(0.0, "Power Loss", "W"),
        }
    }

    /// LDO: editable output voltage, derived efficiency.
    pub fn ldo(v_out: f64) -> Self {
        Self::base(
            Field::editable(v_out, "Output Voltage", "V"),
            Field::new(0.0, "Efficiency", "%"),
        )
    }

    /// DCDC: editable output voltage and efficiency.
    pub fn dcdc(v_out: f64, eff: f64) -> Self {
        Self::base(
            Field::editable(v_out, "Output Voltage", "V"),
            Field::editable(eff, "Efficiency", "%"),
        )
    }

    /// Load switch: derived output voltage seeded from the supply, editable
    /// on-resistance.
    pub fn load_switch(v_seed: f64, rds: f64) -> Self {
        Self::base(
            Field::new(v_seed, "Output Voltage", "V"),
            Field::editable(rds, "RDS(ON)", "mΩ"),
        )
    }
}

/// Stored fields of a load.
#[derive(Debug, Clone)]
pub struct LoadFields {
    pub i_in: Field,
    /// Replication count; display-only annotation, not folded into `i_in`
    pub qty: Field,
}

impl LoadFields {
    pub fn new(i_in: f64, qty: f64) -> Self {
        Self {
            i_in: Field::editable(i_in, "Input Current", "A"),
            qty: Field::editable(qty, "Quantity", "").hidden(),
        }
    }
}

/// Type-specific payload of a node.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Source(SourceFields),
    Ldo(RailFields),
    Dcdc(RailFields),
    LoadSwitch(RailFields),
    Load(LoadFields),
}

impl NodeKind {
    /// Build the payload for `node_type` from positional editable values.
    ///
    /// Missing trailing values take their defaults. `v_seed` seeds the output
    /// voltage of a load switch before its first solve. Returns `None` if more
    /// values are given than the type declares.
    pub fn from_values(node_type: NodeType, values: &[f64], v_seed: f64) -> Option<Self> {
        if values.len() > node_type.editable_fields().len() {
            return None;
        }
        let arg = |i: usize, default: f64| values.get(i).copied().unwrap_or(default);
        Some(match node_type {
            NodeType::Source => NodeKind::Source(SourceFields::new(arg(0, DEFAULT_SOURCE_VOLTAGE))),
            NodeType::Ldo => NodeKind::Ldo(RailFields::ldo(arg(0, DEFAULT_RAIL_VOLTAGE))),
            NodeType::Dcdc => NodeKind::Dcdc(RailFields::dcdc(
                arg(0, DEFAULT_RAIL_VOLTAGE),
                arg(1, DEFAULT_DCDC_EFFICIENCY),
            )),
            NodeType::LoadSwitch => {
                NodeKind::LoadSwitch(RailFields::load_switch(v_seed, arg(0, DEFAULT_RDS_MILLIOHM)))
            }
            NodeType::Load => NodeKind::Load(LoadFields::new(arg(0, DEFAULT_LOAD_CURRENT), arg(1, 1.0))),
        })
    }

    /// Get the node type.
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Source(_) => NodeType::Source,
            NodeKind::Ldo(_) => NodeType::Ldo,
            NodeKind::Dcdc(_) => NodeType::Dcdc,
            NodeKind::LoadSwitch(_) => NodeType::LoadSwitch,
            NodeKind::Load(_) => NodeType::Load,
        }
    }

    /// Get the rail fields if this is a rail.
    pub fn rail(&self) -> Option<&RailFields> {
        match self {
            NodeKind::Ldo(r) | NodeKind::Dcdc(r) | NodeKind::LoadSwitch(r) => Some(r),
            _ => None,
        }
    }

    /// Get a stored field.
    pub fn field(&self, key: FieldKey) -> Option<&Field> {
        match (self, key) {
            (NodeKind::Source(s), FieldKey::VOut) => Some(&s.v_out),
            (NodeKind::Source(s), FieldKey::IOut) => Some(&s.i_out),
            (NodeKind::Load(l), FieldKey::IIn) => Some(&l.i_in),
            (NodeKind::Load(l), FieldKey::Qty) => Some(&l.qty),
            (NodeKind::LoadSwitch(r), FieldKey::Rds) => Some(&r.param),
            (NodeKind::Ldo(r) | NodeKind::Dcdc(r), FieldKey::Eff) => Some(&r.param),
            (NodeKind::Ldo(r) | NodeKind::Dcdc(r) | NodeKind::LoadSwitch(r), key) => match key {
                FieldKey::IIn => Some(&r.i_in),
                FieldKey::VOut => Some(&r.v_out),
                FieldKey::IOut => Some(&r.i_out),
                FieldKey::Loss => Some(&r.loss),
                _ => None,
            },
            _ => None,
        }
    }

    /// Get a stored field mutably.
    pub fn field_mut(&mut self, key: FieldKey) -> Option<&mut Field> {
        match (self, key) {
            (NodeKind::Source(s), FieldKey::VOut) => Some(&mut s.v_out),
            (NodeKind::Source(s), FieldKey::IOut) => Some(&mut s.i_out),
            (NodeKind::Load(l), FieldKey::IIn) => Some(&mut l.i_in),
            (NodeKind::Load(l), FieldKey::Qty) => Some(&mut l.qty),
            (NodeKind::LoadSwitch(r), FieldKey::Rds) => Some(&mut r.param),
            (NodeKind::Ldo(r) | NodeKind::Dcdc(r), FieldKey::Eff) => Some(&mut r.param),
            (NodeKind::Ldo(r) | NodeKind::Dcdc(r) | NodeKind::LoadSwitch(r), key) => match key {
                FieldKey::IIn => Some(&mut r.i_in),
                FieldKey::VOut => Some(&mut r.v_out),
                FieldKey::IOut => Some(&mut r.i_out),
                FieldKey::Loss => Some(&mut r.loss),
                _ => None,
            },
            _ => None,
        }
    }

    /// Input current, absent for sources.
    pub fn i_in(&self) -> Option<f64> {
        self.field(FieldKey::IIn).map(Field::get)
    }

    /// Output voltage, absent for loads.
    pub fn v_out(&self) -> Option<f64> {
        self.field(FieldKey::VOut).map(Field::get)
    }

    /// Output current, absent for loads.
    pub fn i_out(&self) -> Option<f64> {
        self.field(FieldKey::IOut).map(Field::get)
    }

    /// Editable values in declaration order.
    pub fn editable_values(&self) -> Vec<f64> {
        self.node_type()
            .editable_fields()
            .iter()
            .filter_map(|key| self.field(*key).map(Field::get))
            .collect()
    }
}
