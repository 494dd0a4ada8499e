//! # Power Tree Core
//!
//! An interactive power-distribution tree engine for electronic designs.
//!
//! This library provides:
//! - A forest of power trees rooted at sources, with LDO, DC-DC and load
//!   switch rails and leaf loads
//! - Bidirectional propagation: voltages flow down from sources, current
//!   demand aggregates up from loads
//! - A fixed-point solver for load switches, whose output voltage depends on
//!   the current they carry
//! - A versioned JSON format for saving, loading and share links
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`tree`] - Node model, arena forest, edit validation and display fields
//! - [`solver`] - Recompute engine and load switch convergence
//! - [`format`] - Persisted envelope, decoding and share links
//! - [`session`] - Editing session with atomic loads
//!
//! ## Usage
//!
//! ### Native CLI
//!
//! ```bash
//! powertree board.json --link https://example.com/powertree/
//! ```
//!
//! ### WASM
//!
//! ```javascript
//! import { WasmPowerTree } from 'power_tree_core';
//!
//! const session = new WasmPowerTree(new URLSearchParams(location.search).get("s"));
//! const nodes = JSON.parse(session.view_json());
//! ```
//!
//! ## Propagation Model
//!
//! Every edit recomputes the edited node's subtree and then walks up the
//! parent chain to the source:
//!
//! 1. A node's input voltage is its parent's output voltage
//! 2. A rail's output current is the sum of its children's input currents
//! 3. A rail's input current follows from its regulator model (LDO passes
//!    current through, DC-DC conserves power, a load switch drops I*R)
//!
//! Load switches iterate until the voltage drop settles; non-convergence is
//! reported as a warning, never as an error.

pub mod error;
pub mod format;
pub mod session;
pub mod solver;
pub mod tree;

// Re-export main types for convenience
pub use error::{PowerTreeError, Result};
pub use format::FORMAT_VERSION;
pub use session::Session;
pub use solver::SolverConfig;
pub use tree::{FieldKey, NodeId, NodeType, PowerTree};

// WASM bindings
#[cfg(feature = "wasm")]
mod wasm;

#[cfg(feature = "wasm")]
pub use wasm::WasmPowerTree;
