//! Error types for the node tree.

use crate::tree::{NodeId, WindowId};

/// Result type alias for node tree operations.
pub type TreeResult<T> = std::result::Result<T, TreeError>;

/// Errors that can occur while building or mutating a [`NodeTree`](crate::NodeTree).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// The node ID is invalid or the node has been destroyed.
    #[error("Invalid or destroyed node {0:?}")]
    InvalidNode(NodeId),

    /// The window ID is invalid or the window has been destroyed.
    #[error("Invalid or destroyed window {0:?}")]
    InvalidWindow(WindowId),

    /// Attempted to make a node its own ancestor.
    #[error("Cannot make {node:?} a child of its own descendant {parent:?}")]
    CircularParentage {
        /// The node being reparented.
        node: NodeId,
        /// The requested new parent.
        parent: NodeId,
    },

    /// Window roots cannot be reparented.
    #[error("Node {0:?} is a window root and cannot be reparented")]
    RootReparent(NodeId),
}
