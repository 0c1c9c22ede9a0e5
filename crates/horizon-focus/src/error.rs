//! Error types for the focus subsystem.
//!
//! Only programmer misuse is an error here. A target that cannot take focus
//! right now, or a traversal that finds nothing eligible, is reported through
//! ordinary return values instead.

use horizon_focus_core::{NodeId, TreeError, WindowId};

/// Result type alias for focus operations.
pub type Result<T> = std::result::Result<T, FocusError>;

/// Errors raised by focus operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FocusError {
    /// The two endpoints of a transfer live in different windows.
    #[error("Cannot move focus from {from:?} in {from_window:?} to {to:?} in {to_window:?}")]
    CrossWindowTransfer {
        /// The node losing focus.
        from: NodeId,
        /// Its window.
        from_window: WindowId,
        /// The node gaining focus.
        to: NodeId,
        /// Its window.
        to_window: WindowId,
    },

    /// The field is already in a tab order.
    #[error("Node {0:?} is already registered as a focusable field")]
    AlreadyRegistered(NodeId),

    /// Two fields being reordered relative to each other live in different windows.
    #[error("Cannot reorder {field:?} relative to {other:?}: they belong to different windows")]
    CrossWindowReorder {
        /// The field being moved.
        field: NodeId,
        /// The field it was to be placed next to.
        other: NodeId,
    },

    /// The node is not a registered focusable field.
    #[error("Node {0:?} is not a registered focusable field")]
    NotRegistered(NodeId),

    /// The node is not known to the widget tree.
    #[error("Unknown or destroyed node {0:?}")]
    UnknownNode(NodeId),

    /// The window has not been added to the focus manager.
    #[error("Window {0:?} is not managed")]
    UnknownWindow(WindowId),

    /// A node tree operation failed.
    #[error(transparent)]
    Tree(#[from] TreeError),
}
