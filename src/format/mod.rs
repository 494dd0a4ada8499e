//! Persisted and shared tree format.
//!
//! Trees are stored as a compact, positional JSON array tagged with a format
//! version:
//!
//! ```text
//! [version, [source, ...]]
//! ```
//!
//! # Node Encoding
//!
//! | Type | Tag | Positional arguments |
//! |------|-----|----------------------|
//! | Source | `Source` | `[name, disabled, v_out]` |
//! | LDO | `LDO` | `[name, disabled, v_out]` |
//! | DCDC | `DCDC` | `[name, disabled, v_out, eff]` |
//! | Load switch | `LSW` | `[name, disabled, rds]` |
//! | Load | `Load` | `[name, disabled, i_in, qty]` |
//!
//! Children, if any, follow under the `"c"` key. Trailing values may be
//! omitted on read and take their defaults; the legacy `Pt*` tags are
//! accepted as aliases.
//!
//! # Example
//!
//! ```text
//! [0.1, [{"Source": ["12V_VIN", 0, 12], "c": [
//!     {"LDO": ["3V3_LDO", 0, 3.3], "c": [{"Load": ["MCU", 0, 0.1, 1]}]}
//! ]}]]
//! ```
//!
//! Loading is all-or-nothing: the payload is decoded into a fresh tree and
//! any version mismatch, unknown type or malformed node fails the whole load.

mod decode;
mod envelope;
mod share;

pub use decode::decode;
pub use envelope::{EncodedNode, Envelope, CHILDREN_KEY};
pub use share::{decode_param, from_share_link, share_link, share_param, SHARE_PARAM};

use std::path::{Path, PathBuf};

use crate::error::{PowerTreeError, Result};
use crate::tree::PowerTree;

/// Current format version; loaders reject anything else.
pub const FORMAT_VERSION: f64 = 0.1;

/// Serialize a tree to its JSON envelope.
pub fn to_json(tree: &PowerTree) -> Result<String> {
    Ok(serde_json::to_string(&Envelope::from_tree(tree))?)
}

/// Parse a JSON envelope into a new tree.
pub fn from_json(input: &str) -> Result<PowerTree> {
    decode(input)
}

/// Read a tree file.
pub fn read_file(path: &Path) -> Result<PowerTree> {
    let content = std::fs::read_to_string(path).map_err(|e| PowerTreeError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    from_json(&content)
}

/// Write a tree to `path`.
pub fn write_file(path: &Path, tree: &PowerTree) -> Result<()> {
    let json = to_json(tree)?;
    std::fs::write(path, json).map_err(|e| PowerTreeError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })
}

/// File name for an export made at `timestamp_ms` (Unix milliseconds).
pub fn export_file_name(timestamp_ms: i64) -> String {
    format!("powertree-{timestamp_ms}.json")
}

/// Write a timestamped export into `dir` and return its path.
pub fn export(dir: &Path, tree: &PowerTree) -> Result<PathBuf> {
    let path = dir.join(export_file_name(chrono::Utc::now().timestamp_millis()));
    write_file(&path, tree)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{FieldKey, NodeId};

    fn sample() -> PowerTree {
        let mut tree = PowerTree::new();
        let src = tree.add_source("12V_VIN", 12.0);
        let buck = tree.add_dcdc(src, "5V_BUCK", 5.0, 85.0).unwrap();
        let ldo = tree.add_ldo(buck, "3V3_LDO", 3.3).unwrap();
        tree.add_load(buck, "LED Matrix", 1.4).unwrap();
        let mcu = tree.add_load(ldo, "STM32_VDD", 0.1).unwrap();
        tree.set_field(mcu, FieldKey::Qty, 4.0).unwrap();
        let sw = tree.add_load_switch(buck, "SENSOR_SW", 250.0).unwrap();
        tree.add_load(sw, "BME680_VDD", 0.05).unwrap();
        tree.set_disabled(sw, true).unwrap();
        let aux = tree.add_source("AUX", 3.3);
        tree.add_ldo(aux, "1V8", 1.8).unwrap();
        tree
    }

    fn outline(tree: &PowerTree) -> Vec<(usize, String, &'static str, bool, Vec<f64>)> {
        tree.walk()
            .into_iter()
            .map(|(id, depth): (NodeId, usize)| {
                let node = tree.node(id).unwrap();
                (
                    depth,
                    node.name.clone(),
                    node.node_type().tag(),
                    node.disabled,
                    node.kind.editable_values(),
                )
            })
            .collect()
    }

    #[test]
    fn test_round_trip_preserves_structure() {
        let tree = sample();
        let restored = from_json(&to_json(&tree).unwrap()).unwrap();
        assert_eq!(outline(&restored), outline(&tree));
    }

    #[test]
    fn test_file_round_trip() {
        let tree = sample();
        let dir = std::env::temp_dir().join(format!("powertree-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let path = export(&dir, &tree).unwrap();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("powertree-") && name.ends_with(".json"));

        let restored = read_file(&path).unwrap();
        assert_eq!(outline(&restored), outline(&tree));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_file() {
        let err = read_file(Path::new("/nonexistent/powertree.json")).unwrap_err();
        assert!(matches!(err, PowerTreeError::FileReadError { .. }));
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(export_file_name(1700000000123), "powertree-1700000000123.json");
    }
}
