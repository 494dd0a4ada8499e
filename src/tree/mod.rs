//! Power tree representation and edit operations.
//!
//! This module provides the arena-backed [`PowerTree`]: sources at the top of
//! an ordered forest, rails below them, loads at the leaves. Nodes refer to
//! each other by [`NodeId`]; a node's input voltage is always read from its
//! parent rather than stored.

mod field;
mod forest;
mod node;
mod types;
mod validate;
mod view;

pub use field::{format_value, Field, MAX_DISPLAY_DECIMALS};
pub use forest::PowerTree;
pub use node::*;
pub use types::*;
pub use validate::{validate_field_write, validate_move, validate_parent, validate_swap};
pub use view::{FieldView, NodeView, DISPLAY_ORDER};
