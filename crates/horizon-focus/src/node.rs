//! Per-node focus flags.
//!
//! Every node on the path of a transition carries two transient flags. They
//! are set during the declare phase, consulted by the leaving, entering, and
//! completion walks, and cleared again before the transition returns. Nodes
//! that are not mid-transition have no entry at all.
//!
//! Keyboard and pointer focus each keep their own [`FocusNodes`] store, so the
//! two kinds never see each other's flags.

use horizon_focus_core::NodeId;
use slotmap::SecondaryMap;

/// The two transient flags of a focus node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FocusFlags {
    /// The node is on the path of the widget losing focus and has not yet
    /// been told the final outcome.
    pub original_focus: bool,
    /// The node is on the path of the widget about to gain focus.
    pub new_focus: bool,
}

impl FocusFlags {
    /// Whether both flags are clear.
    pub fn is_clear(&self) -> bool {
        !self.original_focus && !self.new_focus
    }
}

/// Flag storage for one kind of focus.
#[derive(Debug, Default)]
pub struct FocusNodes {
    flags: SecondaryMap<NodeId, FocusFlags>,
}

impl FocusNodes {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The node's flags; clear if it has none.
    pub fn get(&self, node: NodeId) -> FocusFlags {
        self.flags.get(node).copied().unwrap_or_default()
    }

    /// Update the node's flags in place.
    ///
    /// An entry that ends up clear is dropped.
    pub fn update(&mut self, node: NodeId, f: impl FnOnce(&mut FocusFlags)) {
        let mut flags = self.get(node);
        f(&mut flags);
        if flags.is_clear() {
            self.flags.remove(node);
        } else {
            self.flags.insert(node, flags);
        }
    }

    /// Drop the node's entry.
    pub fn forget(&mut self, node: NodeId) {
        self.flags.remove(node);
    }

    /// Whether no node carries a flag.
    pub fn is_settled(&self) -> bool {
        self.flags.is_empty()
    }

    /// Nodes whose `new_focus` flag is set.
    pub fn new_focus_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.flags
            .iter()
            .filter(|(_, f)| f.new_focus)
            .map(|(node, _)| node)
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.flags.clear();
    }
}
