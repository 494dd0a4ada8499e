//! Error types for the power tree engine.
//!
//! This module provides a unified error type [`PowerTreeError`] that covers
//! all error conditions that can occur during tree edits, payload decoding,
//! and file I/O. Solver non-convergence is deliberately absent: it is a
//! warning carried by [`crate::solver::Recompute`], not a failure.

use thiserror::Error;

use crate::tree::{FieldKey, NodeId, NodeType};

/// Result type alias using [`PowerTreeError`].
pub type Result<T> = std::result::Result<T, PowerTreeError>;

/// Message shown to the user for any failed load, whatever the cause.
pub const LOAD_FAILED_MESSAGE: &str = "Failed to parse file or incompatible version.";

/// Unified error type for all power tree operations.
#[derive(Error, Debug)]
pub enum PowerTreeError {
    // ============ Structural Violations ============
    /// Node id does not refer to an attached node
    #[error("Node {id} not found in tree")]
    NodeNotFound { id: NodeId },

    /// Move would make a node its own ancestor
    #[error("Cannot move {node} under {target}: target is the node itself or one of its descendants")]
    CycleDetected { node: NodeId, target: NodeId },

    /// Loads terminate demand aggregation and never take children
    #[error("Load {target} cannot have children")]
    LoadCannotParent { target: NodeId },

    /// Sources are forest roots and are never reparented
    #[error("Source {node} cannot be moved under another node")]
    SourceNotMovable { node: NodeId },

    /// Sources live only at the top of the forest
    #[error("Source nodes can only be forest roots")]
    SourceMustBeRoot,

    /// Only sources may be forest roots
    #[error("Forest roots must be sources, got {node_type}")]
    RootMustBeSource { node_type: NodeType },

    /// Swap requested on nodes with different parents
    #[error("Nodes {a} and {b} are not siblings")]
    NotSiblings { a: NodeId, b: NodeId },

    /// Write to a derived or absent field
    #[error("Field '{field}' of node {node} is not editable")]
    FieldNotEditable { node: NodeId, field: FieldKey },

    /// Write of a NaN or infinite value
    #[error("Invalid value {value} for field '{field}'")]
    InvalidFieldValue { field: FieldKey, value: f64 },

    // ============ Payload Errors ============
    /// Version tag differs from the engine's format version
    #[error("Format version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: f64, found: f64 },

    /// Envelope carries no usable version tag
    #[error("Payload has no format version tag")]
    MissingVersion,

    /// Type tag with no matching constructor
    #[error("Unknown node type '{tag}'")]
    UnknownNodeType { tag: String },

    /// Structurally invalid envelope or node encoding
    #[error("Malformed payload: {message}")]
    MalformedPayload { message: String },

    /// JSON syntax error
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Share link without a decodable state parameter
    #[error("Invalid share link: {message}")]
    ShareLink { message: String },

    // ============ I/O Errors ============
    /// Error reading a tree file
    #[error("Failed to read tree file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Error writing an exported tree file
    #[error("Failed to write tree file '{path}': {source}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // ============ WASM Errors ============
    /// WASM-specific error
    #[cfg(feature = "wasm")]
    #[error("WASM error: {message}")]
    WasmError { message: String },
}

impl PowerTreeError {
    /// Create a malformed payload error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedPayload {
            message: message.into(),
        }
    }

    /// Create a share link error
    pub fn share_link(message: impl Into<String>) -> Self {
        Self::ShareLink {
            message: message.into(),
        }
    }

    /// Create an unknown node type error
    pub fn unknown_type(tag: impl Into<String>) -> Self {
        Self::UnknownNodeType { tag: tag.into() }
    }

    /// True for every failure that can abort loading a saved or shared tree.
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            Self::VersionMismatch { .. }
                | Self::MissingVersion
                | Self::UnknownNodeType { .. }
                | Self::MalformedPayload { .. }
                | Self::Json(_)
                | Self::ShareLink { .. }
                | Self::FileReadError { .. }
        )
    }

    /// Message suitable for showing to a user.
    ///
    /// Load failures collapse to [`LOAD_FAILED_MESSAGE`]; the specific cause
    /// stays available through `Display` for logs.
    pub fn user_message(&self) -> String {
        if self.is_load_failure() {
            LOAD_FAILED_MESSAGE.to_string()
        } else {
            self.to_string()
        }
    }
}
