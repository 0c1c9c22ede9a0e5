//! Core systems for Horizon Focus.
//!
//! This crate provides the foundations the focus subsystem builds on:
//!
//! - **Node Tree**: generation-checked node and window handles, the
//!   capability traits the focus engine reads widgets through, and an
//!   arena-backed [`NodeTree`] implementing them
//! - **Thread Affinity**: UI-thread confinement checks
//! - **Request Marshaling**: fire-and-forget channels from worker threads
//!   onto the UI thread
//! - **Signals**: observer notifications for focus and appearance changes
//! - **Logging**: tracing targets and tree visualization
//!
//! # Example
//!
//! ```
//! use horizon_focus_core::{ancestors, NodeTree};
//!
//! let mut tree = NodeTree::new();
//! let (_, root) = tree.create_window("main");
//! let group = tree.add_child(root, "group").unwrap();
//! let input = tree.add_child(group, "input").unwrap();
//!
//! let chain: Vec<_> = ancestors(&tree, input).collect();
//! assert_eq!(chain, vec![input, group, root]);
//! ```

pub mod dispatch;
mod error;
pub mod logging;
pub mod signal;
pub mod thread_check;
pub mod tree;

pub use dispatch::{request_channel, RequestReceiver, RequestSender};
pub use error::{TreeError, TreeResult};
pub use logging::{PerfSpan, TreeDebug, TreeFormatOptions, TreeStyle};
pub use signal::{ConnectionId, Signal};
pub use thread_check::ThreadAffinity;
pub use tree::{
    ancestors, is_ancestor_or_self, Ancestors, FocusTree, HasEnabledPredicate, HasGeometry,
    HasParent, NodeId, NodeLink, NodeTree, WindowId,
};

// Re-export the vector type used by HasGeometry.
pub use glam::Vec2;
