//! Editing session: the single owner of the current tree.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::Result;
use crate::format;
use crate::solver::NonConvergence;
use crate::tree::{FieldKey, NodeId, NodeKind, NodeType, NodeView, PowerTree};

/// An editing session over one power tree.
///
/// Loads are atomic: a payload is decoded into a fresh tree and swapped in
/// only on success, so a failed load leaves the displayed tree untouched.
#[derive(Debug, Clone)]
pub struct Session {
    tree: PowerTree,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Create a session showing the example tree.
    pub fn new() -> Self {
        Self {
            tree: example_tree(),
        }
    }

    /// Create a session over an existing tree.
    pub fn with_tree(mut tree: PowerTree) -> Self {
        tree.recompute_all();
        Self { tree }
    }

    /// Create a session from an optional share parameter.
    ///
    /// `param` is the parameter's value as a URL parser hands it out, i.e. the
    /// JSON text with percent-escapes already resolved; it is not decoded
    /// again. A present parameter takes precedence over the example tree; if
    /// it does not parse, the error is returned instead of a partial tree.
    pub fn from_share_param(param: Option<&str>) -> Result<Self> {
        match param {
            Some(json) => {
                info!("loading tree from share parameter");
                let tree = format::from_json(json)
                    .inspect_err(|e| warn!(error = %e, "invalid share parameter"))?;
                Ok(Self { tree })
            }
            None => Ok(Self::new()),
        }
    }

    /// The current tree.
    pub fn tree(&self) -> &PowerTree {
        &self.tree
    }

    /// Load switches that did not settle during the last recompute.
    pub fn warnings(&self) -> &[NonConvergence] {
        &self.tree.last_recompute().warnings
    }

    /// Render-ready snapshot of the current tree.
    pub fn view(&self) -> Vec<NodeView> {
        self.tree.view()
    }

    // ============ Loading and Saving ============

    fn replace(&mut self, loaded: Result<PowerTree>, origin: &str) -> Result<()> {
        match loaded {
            Ok(tree) => {
                info!(origin, nodes = tree.len(), "loaded tree");
                self.tree = tree;
                Ok(())
            }
            Err(e) => {
                warn!(origin, error = %e, "load failed; keeping current tree");
                Err(e)
            }
        }
    }

    /// Replace the tree with a decoded JSON payload.
    pub fn load_json(&mut self, input: &str) -> Result<()> {
        self.replace(format::from_json(input), "json")
    }

    /// Replace the tree with the one carried by a share link.
    pub fn load_share_link(&mut self, url: &str) -> Result<()> {
        self.replace(format::from_share_link(url), "share link")
    }

    /// Replace the tree with the contents of a file.
    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        self.replace(format::read_file(path), "file")
    }

    /// Serialize the current tree.
    pub fn to_json(&self) -> Result<String> {
        format::to_json(&self.tree)
    }

    /// Build a share link for the current tree.
    pub fn share_link(&self, base_url: &str) -> Result<String> {
        let link = format::share_link(base_url, &self.tree)?;
        info!(length = link.len(), "built share link");
        Ok(link)
    }

    /// Write a timestamped export into `dir`.
    pub fn export(&self, dir: &Path) -> Result<PathBuf> {
        let path = format::export(dir, &self.tree)?;
        info!(path = %path.display(), "exported tree");
        Ok(path)
    }

    // ============ Edits ============

    /// Add a source at the end of the forest.
    pub fn add_source(&mut self, name: impl Into<String>, v_out: f64) -> NodeId {
        self.tree.add_source(name, v_out)
    }

    /// Add a node with menu defaults under `parent` (or as a root source).
    pub fn add_default(&mut self, parent: Option<NodeId>, node_type: NodeType) -> Result<NodeId> {
        self.tree.add_default(parent, node_type)
    }

    /// Add a non-source node under `parent`.
    pub fn add_child(&mut self, parent: NodeId, name: impl Into<String>, kind: NodeKind) -> Result<NodeId> {
        self.tree.add_child(parent, name, kind)
    }

    /// Delete a node and its subtree.
    pub fn delete(&mut self, id: NodeId) -> Result<()> {
        self.tree.delete(id)
    }

    /// Move a node under `target`, or to the front if `target` is its parent.
    pub fn move_to(&mut self, id: NodeId, target: NodeId) -> Result<()> {
        self.tree.move_to(id, target)
    }

    /// Exchange two siblings.
    pub fn swap_siblings(&mut self, a: NodeId, b: NodeId) -> Result<()> {
        self.tree.swap_siblings(a, b)
    }

    /// Rename a node.
    pub fn rename(&mut self, id: NodeId, name: impl Into<String>) -> Result<()> {
        self.tree.rename(id, name)
    }

    /// Set the persisted disabled flag.
    pub fn set_disabled(&mut self, id: NodeId, disabled: bool) -> Result<()> {
        self.tree.set_disabled(id, disabled)
    }

    /// Write an editable field and recompute.
    pub fn set_field(&mut self, id: NodeId, key: FieldKey, value: f64) -> Result<()> {
        self.tree.set_field(id, key, value)
    }
}

/// The tree shown when nothing else is loaded.
pub fn example_tree() -> PowerTree {
    let mut tree = PowerTree::new();
    let src = tree.add_source("12V_VIN", 12.0);
    let built = (|| -> Result<()> {
        let buck = tree.add_dcdc(src, "5V_BUCK", 5.0, 85.0)?;
        let ldo = tree.add_ldo(buck, "3V3_LDO", 3.3)?;
        tree.add_load(buck, "LED Matrix", 1.4)?;
        tree.add_load(ldo, "STM32_VDD", 0.1)?;
        tree.add_load(ldo, "BME680_VDD", 0.05)?;
        Ok(())
    })();
    if let Err(e) = built {
        warn!(error = %e, "example tree incomplete");
    }
    tree
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PowerTreeError, LOAD_FAILED_MESSAGE};
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_example_tree() {
        let session = Session::new();
        let names: Vec<_> = session.view().into_iter().map(|v| v.name).collect();
        assert_eq!(
            names,
            vec!["12V_VIN", "5V_BUCK", "3V3_LDO", "STM32_VDD", "BME680_VDD", "LED Matrix"]
        );

        let tree = session.tree();
        let buck = tree.children(tree.roots()[0])[0];
        assert_abs_diff_eq!(tree.value(buck, FieldKey::IOut).unwrap(), 1.55, epsilon = 1e-12);
        let expected = 5.0 * 1.55 / 0.85 / 12.0;
        assert_abs_diff_eq!(tree.value(tree.roots()[0], FieldKey::IOut).unwrap(), expected, epsilon = 1e-12);
        assert!(session.warnings().is_empty());
    }

    #[test]
    fn test_failed_load_keeps_tree() {
        let mut session = Session::new();
        let before = session.to_json().unwrap();

        for bad in [r#"[0.2, []]"#, r#"[]"#, "not json", r#"[0.1, [{"Widget": ["W", 0]}]]"#] {
            let err = session.load_json(bad).unwrap_err();
            assert_eq!(err.user_message(), LOAD_FAILED_MESSAGE);
            assert_eq!(session.to_json().unwrap(), before);
        }
    }

    #[test]
    fn test_load_replaces_tree() {
        let mut session = Session::new();
        session
            .load_json(r#"[0.1, [{"Source": ["BAT", 0, 3.7], "c": [{"Load": ["RADIO", 0, 0.3, 2]}]}]]"#)
            .unwrap();
        let view = session.view();
        assert_eq!(view.len(), 2);
        assert_eq!(view[0].name, "BAT");
        assert_eq!(session.tree().value(view[0].id, FieldKey::IOut), Some(0.3));
    }

    #[test]
    fn test_share_param_precedence() {
        let link = Session::new().share_link("http://localhost/").unwrap();
        let json = format::decode_param(format::share_param(&link).unwrap()).unwrap();
        let shared = Session::from_share_param(Some(&json)).unwrap();
        assert_eq!(shared.to_json().unwrap(), Session::new().to_json().unwrap());

        let empty = Session::from_share_param(Some("[0.1,[]]")).unwrap();
        assert!(empty.tree().is_empty());

        assert!(matches!(
            Session::from_share_param(Some("[9,[]]")),
            Err(PowerTreeError::VersionMismatch { .. })
        ));
        assert_eq!(Session::from_share_param(None).unwrap().tree().len(), 6);
    }

    #[test]
    fn test_share_param_is_not_decoded_twice() {
        let json = r#"[0.1,[{"Source":["+12V",0,12],"c":[{"LDO":["+3V3 %20",0,3.3]}]}]]"#;
        let session = Session::from_share_param(Some(json)).unwrap();
        let names: Vec<_> = session.view().into_iter().map(|v| v.name).collect();
        assert_eq!(names, vec!["+12V", "+3V3 %20"]);

        let link = session.share_link("http://localhost/").unwrap();
        let mut reloaded = Session::new();
        reloaded.load_share_link(&link).unwrap();
        assert_eq!(reloaded.to_json().unwrap(), session.to_json().unwrap());
    }

    #[test]
    fn test_edits_refresh_view() {
        let mut session = Session::new();
        let src = session.tree().roots()[0];
        let sw = session.add_default(Some(src), NodeType::LoadSwitch).unwrap();
        let load = session.add_default(Some(sw), NodeType::Load).unwrap();
        session.set_field(load, FieldKey::IIn, 2.0).unwrap();

        let sw_view = session.view().into_iter().find(|v| v.id == sw).unwrap();
        assert_eq!(sw_view.node_type, "LSW");
        assert!(sw_view.fields.iter().any(|f| f.text == "Output Voltage: 11.8 V"));
        assert!(session.set_field(sw, FieldKey::VOut, 3.0).is_err());
    }
}
