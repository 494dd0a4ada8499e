//! WASM bindings for Power Tree Core.
//!
//! This module provides JavaScript-friendly bindings so a browser page can
//! drive an editing session and render the tree from JSON views.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { WasmPowerTree } from 'power_tree_core';
//!
//! await init();
//!
//! const params = new URLSearchParams(window.location.search);
//! let session;
//! try {
//!   session = new WasmPowerTree(params.get("s"));
//! } catch (e) {
//!   alert(e);
//!   session = new WasmPowerTree(null);
//! }
//!
//! const nodes = JSON.parse(session.view_json());
//! // draw nodes[i].name and nodes[i].fields[j].text ...
//! session.set_field(nodes[1].id, "eff", 90);
//! ```

use wasm_bindgen::prelude::*;

use crate::error::{PowerTreeError, LOAD_FAILED_MESSAGE};
use crate::session::Session;
use crate::tree::{FieldKey, NodeId, NodeType};

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

fn to_js(e: PowerTreeError) -> JsValue {
    JsValue::from_str(&e.user_message())
}

fn node_type(tag: &str) -> Result<NodeType, JsValue> {
    NodeType::from_tag(tag).ok_or_else(|| to_js(PowerTreeError::unknown_type(tag)))
}

fn field_key(key: &str) -> Result<FieldKey, JsValue> {
    FieldKey::parse(key).ok_or_else(|| {
        to_js(PowerTreeError::WasmError {
            message: format!("unknown field '{key}'"),
        })
    })
}

/// WASM-compatible power tree editing session.
///
/// Node ids cross the boundary as plain numbers.
#[wasm_bindgen]
pub struct WasmPowerTree {
    session: Session,
}

#[wasm_bindgen]
impl WasmPowerTree {
    /// Create a session from the page's `s` query parameter, or the example
    /// tree when it is absent.
    ///
    /// Pass the value from `URLSearchParams.get`, which is already
    /// percent-decoded.
    ///
    /// Throws the generic load failure message if the parameter is present
    /// but does not decode.
    #[wasm_bindgen(constructor)]
    pub fn new(share_param: Option<String>) -> Result<WasmPowerTree, JsValue> {
        let session = Session::from_share_param(share_param.as_deref())
            .map_err(|_| JsValue::from_str(LOAD_FAILED_MESSAGE))?;
        Ok(WasmPowerTree { session })
    }

    /// Render-ready nodes as a JSON array.
    #[wasm_bindgen]
    pub fn view_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.session.view()).map_err(|e| to_js(e.into()))
    }

    /// Non-convergence warnings of the last recompute as a JSON array.
    #[wasm_bindgen]
    pub fn warnings_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.session.warnings()).map_err(|e| to_js(e.into()))
    }

    /// Serialize the tree for saving.
    #[wasm_bindgen]
    pub fn to_json(&self) -> Result<String, JsValue> {
        self.session.to_json().map_err(to_js)
    }

    /// Replace the tree from saved JSON; the tree is untouched on failure.
    #[wasm_bindgen]
    pub fn load_json(&mut self, input: &str) -> Result<(), JsValue> {
        self.session.load_json(input).map_err(to_js)
    }

    /// Build a share link for the current tree.
    #[wasm_bindgen]
    pub fn share_link(&self, base_url: &str) -> Result<String, JsValue> {
        self.session.share_link(base_url).map_err(to_js)
    }

    /// Add a node with menu defaults. `parent` is omitted for sources.
    #[wasm_bindgen]
    pub fn add(&mut self, parent: Option<usize>, type_tag: &str) -> Result<usize, JsValue> {
        let ty = node_type(type_tag)?;
        self.session
            .add_default(parent.map(NodeId), ty)
            .map(|id| id.0)
            .map_err(to_js)
    }

    /// Delete a node and its subtree.
    #[wasm_bindgen]
    pub fn delete(&mut self, id: usize) -> Result<(), JsValue> {
        self.session.delete(NodeId(id)).map_err(to_js)
    }

    /// Move a node under `target`.
    #[wasm_bindgen]
    pub fn move_to(&mut self, id: usize, target: usize) -> Result<(), JsValue> {
        self.session.move_to(NodeId(id), NodeId(target)).map_err(to_js)
    }

    /// Exchange two siblings.
    #[wasm_bindgen]
    pub fn swap_siblings(&mut self, a: usize, b: usize) -> Result<(), JsValue> {
        self.session.swap_siblings(NodeId(a), NodeId(b)).map_err(to_js)
    }

    /// Rename a node.
    #[wasm_bindgen]
    pub fn rename(&mut self, id: usize, name: &str) -> Result<(), JsValue> {
        self.session.rename(NodeId(id), name).map_err(to_js)
    }

    /// Write an editable field by short key (`"v_out"`, `"eff"`, ...).
    #[wasm_bindgen]
    pub fn set_field(&mut self, id: usize, key: &str, value: f64) -> Result<(), JsValue> {
        let key = field_key(key)?;
        self.session.set_field(NodeId(id), key, value).map_err(to_js)
    }
}

/// Get the library version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Get the persisted format version.
#[wasm_bindgen]
pub fn format_version() -> f64 {
    crate::format::FORMAT_VERSION
}
