//! The focus transition engine.
//!
//! [`TransitionEngine::transfer_focus`] moves focus from one node to another
//! (either may be absent) and tells every node on both ancestor chains what
//! happened to it, in a fixed order:
//!
//! 1. **Declare**: clear `original_focus` up the new chain, mark the old
//!    chain as `original_focus`, then mark the new chain as `new_focus`.
//! 2. **Leave** (old leaf to root): the old holder gets [`Lost`], its
//!    ancestors [`ChildLost`] until the walk reaches a node shared with the
//!    new chain, which gets [`ChildMoved`]. If the new holder is an ancestor
//!    of the old one it gets [`GainedFromChild`].
//! 3. **Enter** (root to new leaf): the new holder gets [`Gained`], its
//!    ancestors [`ChildGained`], except shared nodes which get
//!    [`ChildMoved`]. If the old holder is an ancestor of the new one it
//!    gets [`LostToChild`].
//! 4. **Complete**: [`MovementComplete`] up the new chain, stopping at the
//!    first node that was also on the old chain, then up the whole old chain.
//!    The old chain has no early stop, so every node that held or contained
//!    the old holder hears the completion after the new chain's walk ends.
//!
//! Shared nodes therefore hear about a transition twice, once per walk.
//!
//! The engine keeps its own flag storage. The focus manager runs one engine
//! for keyboard focus and one for pointer focus.
//!
//! [`Lost`]: FocusChange::Lost
//! [`ChildLost`]: FocusChange::ChildLost
//! [`ChildMoved`]: FocusChange::ChildMoved
//! [`GainedFromChild`]: FocusChange::GainedFromChild
//! [`Gained`]: FocusChange::Gained
//! [`ChildGained`]: FocusChange::ChildGained
//! [`LostToChild`]: FocusChange::LostToChild
//! [`MovementComplete`]: FocusChange::MovementComplete
//!
//! # Example
//!
//! ```
//! use horizon_focus::{FocusChange, FocusKind, FocusTrigger, TransitionEngine};
//! use horizon_focus_core::NodeTree;
//!
//! let mut tree = NodeTree::new();
//! let (_, root) = tree.create_window("main");
//! let field = tree.add_child(root, "field").unwrap();
//!
//! let mut engine = TransitionEngine::new(FocusKind::Keyboard);
//! let mut events = Vec::new();
//! engine
//!     .transfer_focus(&tree, None, Some(field), FocusTrigger::Tab, &mut |n, c, _| {
//!         events.push((n, c))
//!     })
//!     .unwrap();
//!
//! assert_eq!(events[0], (root, FocusChange::ChildGained));
//! assert_eq!(events[1], (field, FocusChange::Gained));
//! ```

use horizon_focus_core::logging::{span_names, targets};
use horizon_focus_core::{ancestors, HasParent, NodeId, PerfSpan};

use crate::error::{FocusError, Result};
use crate::event::{FocusChange, FocusKind, FocusTrigger};
use crate::node::{FocusFlags, FocusNodes};

/// Receives every event of a transition, in order.
///
/// Reporters must not start another transition on the same window while
/// being called; defer any follow-up request instead.
pub type Reporter<'a> = dyn FnMut(NodeId, FocusChange, FocusTrigger) + 'a;

/// Computes and dispatches focus transitions for one kind of focus.
#[derive(Debug)]
pub struct TransitionEngine {
    kind: FocusKind,
    nodes: FocusNodes,
}

impl TransitionEngine {
    /// Create an engine with empty flag storage.
    pub fn new(kind: FocusKind) -> Self {
        Self {
            kind,
            nodes: FocusNodes::new(),
        }
    }

    /// The kind of focus this engine tracks.
    pub fn kind(&self) -> FocusKind {
        self.kind
    }

    /// The node's current flags. Clear outside of a transition.
    pub fn flags(&self, node: NodeId) -> FocusFlags {
        self.nodes.get(node)
    }

    /// Whether every flag is clear.
    pub fn is_settled(&self) -> bool {
        self.nodes.is_settled()
    }

    /// Drop any state held for a node that is going away.
    pub fn forget(&mut self, node: NodeId) {
        self.nodes.forget(node);
    }

    /// Move focus from `from` to `to`, reporting every affected node.
    ///
    /// Both endpoints must be live nodes of the same window. Moving to the
    /// current holder, or from nothing to nothing, reports nothing.
    ///
    /// # Errors
    ///
    /// [`FocusError::CrossWindowTransfer`] if the endpoints are in different
    /// windows, [`FocusError::UnknownNode`] if either endpoint is not in the
    /// tree. No event is reported in either case.
    #[tracing::instrument(
        skip_all,
        target = "horizon_focus::engine",
        level = "debug",
        fields(kind = ?self.kind, ?from, ?to, ?trigger)
    )]
    pub fn transfer_focus<T: HasParent + ?Sized>(
        &mut self,
        tree: &T,
        from: Option<NodeId>,
        to: Option<NodeId>,
        trigger: FocusTrigger,
        reporter: &mut Reporter<'_>,
    ) -> Result<()> {
        if from == to {
            tracing::trace!(target: targets::ENGINE, "endpoints equal, nothing to report");
            return Ok(());
        }
        check_same_window(tree, from, to)?;
        let _perf = PerfSpan::new(span_names::TRANSITION);

        let from_chain: Vec<NodeId> =
            from.map(|n| ancestors(tree, n).collect()).unwrap_or_default();
        let to_chain: Vec<NodeId> = to.map(|n| ancestors(tree, n).collect()).unwrap_or_default();

        self.declare(&from_chain, &to_chain);
        debug_assert!(self.nodes.new_focus_nodes().count() == to_chain.len());

        self.leave(&from_chain, to, trigger, reporter);
        self.enter(&to_chain, from, trigger, reporter);
        self.complete(&from_chain, &to_chain, trigger, reporter);

        debug_assert!(self.nodes.is_settled());
        Ok(())
    }

    fn declare(&mut self, from_chain: &[NodeId], to_chain: &[NodeId]) {
        for &node in to_chain {
            self.nodes.update(node, |f| f.original_focus = false);
        }
        for &node in from_chain {
            self.nodes.update(node, |f| {
                f.original_focus = true;
                f.new_focus = false;
            });
        }
        for &node in to_chain {
            self.nodes.update(node, |f| f.new_focus = true);
        }
    }

    fn leave(
        &self,
        from_chain: &[NodeId],
        to: Option<NodeId>,
        trigger: FocusTrigger,
        reporter: &mut Reporter<'_>,
    ) {
        let mut change = FocusChange::Lost;
        for &node in from_chain {
            if Some(node) == to {
                // Focus returns to an ancestor; everything above it is shared.
                reporter(node, FocusChange::GainedFromChild, trigger);
                change = FocusChange::ChildLost;
            } else if self.nodes.get(node).new_focus && change != FocusChange::Lost {
                reporter(node, FocusChange::ChildMoved, trigger);
            } else {
                reporter(node, change, trigger);
                change = FocusChange::ChildLost;
            }
        }
    }

    fn enter(
        &self,
        to_chain: &[NodeId],
        from: Option<NodeId>,
        trigger: FocusTrigger,
        reporter: &mut Reporter<'_>,
    ) {
        for (depth, &node) in to_chain.iter().enumerate().rev() {
            let change = if depth == 0 {
                FocusChange::Gained
            } else {
                FocusChange::ChildGained
            };
            if Some(node) == from {
                reporter(node, FocusChange::LostToChild, trigger);
            } else if self.nodes.get(node).original_focus && change != FocusChange::Gained {
                reporter(node, FocusChange::ChildMoved, trigger);
            } else {
                reporter(node, change, trigger);
            }
        }
    }

    fn complete(
        &mut self,
        from_chain: &[NodeId],
        to_chain: &[NodeId],
        trigger: FocusTrigger,
        reporter: &mut Reporter<'_>,
    ) {
        for &node in to_chain {
            if self.nodes.get(node).original_focus {
                break;
            }
            reporter(node, FocusChange::MovementComplete, trigger);
            self.nodes.update(node, |f| f.new_focus = false);
        }
        for &node in from_chain {
            reporter(node, FocusChange::MovementComplete, trigger);
            self.nodes.forget(node);
        }
        // Nodes above the early stop were on the old chain and are already
        // clear; this only matters if the tree was inconsistent.
        for &node in to_chain {
            self.nodes.forget(node);
        }
    }
}

fn check_same_window<T: HasParent + ?Sized>(
    tree: &T,
    from: Option<NodeId>,
    to: Option<NodeId>,
) -> Result<()> {
    let window_of = |node: NodeId| tree.window_of(node).ok_or(FocusError::UnknownNode(node));
    match (from, to) {
        (Some(from), Some(to)) => {
            let from_window = window_of(from)?;
            let to_window = window_of(to)?;
            if from_window != to_window {
                return Err(FocusError::CrossWindowTransfer {
                    from,
                    from_window,
                    to,
                    to_window,
                });
            }
            Ok(())
        }
        (Some(node), None) | (None, Some(node)) => window_of(node).map(|_| ()),
        (None, None) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use horizon_focus_core::NodeTree;

    fn record(
        engine: &mut TransitionEngine,
        tree: &NodeTree,
        from: Option<NodeId>,
        to: Option<NodeId>,
    ) -> Result<Vec<(NodeId, FocusChange)>> {
        let mut events = Vec::new();
        engine.transfer_focus(tree, from, to, FocusTrigger::Programmatic, &mut |n, c, _| {
            events.push((n, c))
        })?;
        Ok(events)
    }

    #[test]
    fn test_equal_endpoints_report_nothing() {
        let mut tree = NodeTree::new();
        let (_, root) = tree.create_window("w");
        let a = tree.add_child(root, "a").unwrap();

        let mut engine = TransitionEngine::new(FocusKind::Keyboard);
        assert!(record(&mut engine, &tree, Some(a), Some(a)).unwrap().is_empty());
        assert!(record(&mut engine, &tree, None, None).unwrap().is_empty());
        assert!(engine.is_settled());
    }

    #[test]
    fn test_cross_window_rejected_without_events() {
        let mut tree = NodeTree::new();
        let (w1, r1) = tree.create_window("one");
        let (w2, r2) = tree.create_window("two");
        let a = tree.add_child(r1, "a").unwrap();
        let b = tree.add_child(r2, "b").unwrap();

        let mut engine = TransitionEngine::new(FocusKind::Keyboard);
        let err = record(&mut engine, &tree, Some(a), Some(b)).unwrap_err();
        assert_eq!(
            err,
            FocusError::CrossWindowTransfer {
                from: a,
                from_window: w1,
                to: b,
                to_window: w2
            }
        );
        assert!(engine.is_settled());
    }

    #[test]
    fn test_unknown_node_rejected() {
        let mut tree = NodeTree::new();
        let (_, root) = tree.create_window("w");
        let gone = tree.add_child(root, "gone").unwrap();
        tree.destroy(gone).unwrap();

        let mut engine = TransitionEngine::new(FocusKind::Pointer);
        assert_eq!(
            record(&mut engine, &tree, None, Some(gone)).unwrap_err(),
            FocusError::UnknownNode(gone)
        );
    }

    #[test]
    fn test_unrelated_siblings_under_root() {
        let mut tree = NodeTree::new();
        let (_, root) = tree.create_window("w");
        let a = tree.add_child(root, "a").unwrap();
        let b = tree.add_child(root, "b").unwrap();

        let mut engine = TransitionEngine::new(FocusKind::Keyboard);
        let events = record(&mut engine, &tree, Some(a), Some(b)).unwrap();
        assert_eq!(
            events,
            vec![
                (a, FocusChange::Lost),
                (root, FocusChange::ChildMoved),
                (root, FocusChange::ChildMoved),
                (b, FocusChange::Gained),
                (b, FocusChange::MovementComplete),
                (a, FocusChange::MovementComplete),
                (root, FocusChange::MovementComplete),
            ]
        );
        assert!(engine.is_settled());
    }

    #[test]
    fn test_declare_marks_single_new_path() {
        let mut tree = NodeTree::new();
        let (_, root) = tree.create_window("w");
        let a = tree.add_child(root, "a").unwrap();
        let b = tree.add_child(root, "b").unwrap();
        let b1 = tree.add_child(b, "b1").unwrap();

        let mut engine = TransitionEngine::new(FocusKind::Keyboard);
        let from_chain: Vec<_> = ancestors(&tree, a).collect();
        let to_chain: Vec<_> = ancestors(&tree, b1).collect();
        engine.declare(&from_chain, &to_chain);

        let mut marked: Vec<_> = engine.nodes.new_focus_nodes().collect();
        marked.sort();
        let mut expected = vec![root, b, b1];
        expected.sort();
        assert_eq!(marked, expected);

        assert_eq!(
            engine.flags(a),
            FocusFlags {
                original_focus: true,
                new_focus: false
            }
        );
        assert_eq!(
            engine.flags(root),
            FocusFlags {
                original_focus: true,
                new_focus: true
            }
        );
        assert!(!engine.flags(b1).original_focus);
    }
}
