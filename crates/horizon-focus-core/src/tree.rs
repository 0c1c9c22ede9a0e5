//! Node tree for Horizon Focus.
//!
//! The focus subsystem never owns widgets. It sees them through three small
//! capability traits:
//!
//! - [`HasParent`] - where a node sits: under a parent, or at a window root
//! - [`HasEnabledPredicate`] - whether the node may currently hold focus
//! - [`HasGeometry`] - where the node's origin is in window coordinates
//!
//! [`FocusTree`] is the conjunction of the three. Any widget store can
//! implement them; [`NodeTree`] is an arena-backed implementation used by
//! applications without their own store, and by the tests.
//!
//! # Stable Handles
//!
//! [`NodeId`] and [`WindowId`] are generation-counted `slotmap` keys. A handle
//! to a destroyed node never aliases a newer node; lookups through it simply
//! fail, which is what lets registries hold them as non-owning references.
//!
//! # Example
//!
//! ```
//! use horizon_focus_core::{HasEnabledPredicate, HasParent, NodeLink, NodeTree};
//!
//! let mut tree = NodeTree::new();
//! let (window, root) = tree.create_window("main");
//! let form = tree.add_child(root, "form").unwrap();
//! let name = tree.add_child(form, "name").unwrap();
//!
//! assert_eq!(tree.link(root), Some(NodeLink::Root(window)));
//! assert_eq!(tree.window_of(name), Some(window));
//!
//! tree.set_enabled(form, false).unwrap();
//! assert!(!tree.is_enabled_for_focus(name));
//! ```

use glam::Vec2;
use slotmap::{new_key_type, SlotMap};

use crate::error::{TreeError, TreeResult};
use crate::logging::targets;

new_key_type! {
    /// A stable, generation-checked identifier for a node in a widget tree.
    ///
    /// Becomes inert (never dangling) once the node is destroyed.
    pub struct NodeId;

    /// A stable, generation-checked identifier for a top-level window.
    pub struct WindowId;
}

/// How a node is attached: under a parent node, or as a window's root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeLink {
    /// The node is the root of the given window.
    Root(WindowId),
    /// The node is a child of the given node.
    Child(NodeId),
}

/// Access to a node's place in the tree.
pub trait HasParent {
    /// How `node` is attached, or `None` if the node no longer exists.
    fn link(&self, node: NodeId) -> Option<NodeLink>;

    /// The window `node` belongs to.
    ///
    /// Walks to the root. Returns `None` for unknown nodes.
    fn window_of(&self, node: NodeId) -> Option<WindowId> {
        let mut current = node;
        loop {
            match self.link(current)? {
                NodeLink::Root(window) => return Some(window),
                NodeLink::Child(parent) => current = parent,
            }
        }
    }

    /// The parent of `node`, if it has one.
    fn parent_of(&self, node: NodeId) -> Option<NodeId> {
        match self.link(node)? {
            NodeLink::Child(parent) => Some(parent),
            NodeLink::Root(_) => None,
        }
    }
}

/// Whether a node may currently hold input focus.
pub trait HasEnabledPredicate {
    /// `true` when the node and all of its ancestors are enabled, visible, and
    /// not removed.
    fn is_enabled_for_focus(&self, node: NodeId) -> bool;
}

/// Where a node sits in window coordinates.
pub trait HasGeometry {
    /// The node's top-left corner in window coordinates.
    fn origin(&self, node: NodeId) -> Vec2;
}

/// Everything the focus subsystem needs from a widget tree.
pub trait FocusTree: HasParent + HasEnabledPredicate + HasGeometry {}

impl<T: HasParent + HasEnabledPredicate + HasGeometry + ?Sized> FocusTree for T {}

/// Iterator over a node and its ancestors, leaf first.
///
/// Created by [`ancestors`].
#[derive(Debug)]
pub struct Ancestors<'a, T: ?Sized> {
    tree: &'a T,
    next: Option<NodeId>,
}

impl<T: HasParent + ?Sized> Iterator for Ancestors<'_, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = match self.tree.link(current) {
            Some(NodeLink::Child(parent)) => Some(parent),
            Some(NodeLink::Root(_)) | None => None,
        };
        Some(current)
    }
}

/// Iterate `node`, its parent, and so on up to the window root.
///
/// An unknown node yields only itself.
pub fn ancestors<T: HasParent + ?Sized>(tree: &T, node: NodeId) -> Ancestors<'_, T> {
    Ancestors {
        tree,
        next: Some(node),
    }
}

/// Whether `ancestor` is `node` itself or one of its ancestors.
pub fn is_ancestor_or_self<T: HasParent + ?Sized>(
    tree: &T,
    ancestor: NodeId,
    node: NodeId,
) -> bool {
    ancestors(tree, node).any(|n| n == ancestor)
}

struct NodeData {
    name: String,
    link: NodeLink,
    children: Vec<NodeId>,
    enabled: bool,
    visible: bool,
    /// Position relative to the parent's origin.
    position: Vec2,
}

impl NodeData {
    fn new(name: String, link: NodeLink) -> Self {
        Self {
            name,
            link,
            children: Vec::new(),
            enabled: true,
            visible: true,
            position: Vec2::ZERO,
        }
    }
}

struct WindowData {
    name: String,
    root: NodeId,
}

/// Arena-backed widget tree.
///
/// Each window owns exactly one root node; every other node has a parent.
/// Destroying a node destroys its subtree, and destroying a window root
/// destroys the window.
#[derive(Default)]
pub struct NodeTree {
    nodes: SlotMap<NodeId, NodeData>,
    windows: SlotMap<WindowId, WindowData>,
}

impl std::fmt::Debug for NodeTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeTree")
            .field("nodes", &self.nodes.len())
            .field("windows", &self.windows.len())
            .finish()
    }
}

impl NodeTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new top-level window and its root node.
    pub fn create_window(&mut self, name: impl Into<String>) -> (WindowId, NodeId) {
        let name = name.into();
        let window = self.windows.insert(WindowData {
            name: name.clone(),
            root: NodeId::default(),
        });
        let root = self.nodes.insert(NodeData::new(name, NodeLink::Root(window)));
        self.windows[window].root = root;
        tracing::trace!(target: targets::TREE, ?window, ?root, "created window");
        (window, root)
    }

    /// Add a new child node under `parent`.
    pub fn add_child(&mut self, parent: NodeId, name: impl Into<String>) -> TreeResult<NodeId> {
        if !self.nodes.contains_key(parent) {
            return Err(TreeError::InvalidNode(parent));
        }
        let id = self
            .nodes
            .insert(NodeData::new(name.into(), NodeLink::Child(parent)));
        self.nodes[parent].children.push(id);
        tracing::trace!(target: targets::TREE, ?id, ?parent, "added node");
        Ok(id)
    }

    /// Destroy a node and its whole subtree.
    ///
    /// Returns the destroyed IDs, children before parents. Destroying a
    /// window root also destroys the window.
    pub fn destroy(&mut self, id: NodeId) -> TreeResult<Vec<NodeId>> {
        let link = self.nodes.get(id).ok_or(TreeError::InvalidNode(id))?.link;

        let mut doomed = Vec::new();
        self.collect_descendants(id, &mut doomed);
        doomed.push(id);

        match link {
            NodeLink::Child(parent) => {
                if let Some(parent) = self.nodes.get_mut(parent) {
                    parent.children.retain(|&child| child != id);
                }
            }
            NodeLink::Root(window) => {
                self.windows.remove(window);
            }
        }

        for &node in &doomed {
            self.nodes.remove(node);
        }
        tracing::trace!(target: targets::TREE, ?id, count = doomed.len(), "destroyed subtree");
        Ok(doomed)
    }

    fn collect_descendants(&self, id: NodeId, out: &mut Vec<NodeId>) {
        if let Some(data) = self.nodes.get(id) {
            for &child in &data.children {
                self.collect_descendants(child, out);
                out.push(child);
            }
        }
    }

    /// Move a node (and its subtree) under a new parent.
    ///
    /// The new parent may be in another window.
    pub fn set_parent(&mut self, id: NodeId, new_parent: NodeId) -> TreeResult<()> {
        let link = self.nodes.get(id).ok_or(TreeError::InvalidNode(id))?.link;
        if !self.nodes.contains_key(new_parent) {
            return Err(TreeError::InvalidNode(new_parent));
        }
        let NodeLink::Child(old_parent) = link else {
            return Err(TreeError::RootReparent(id));
        };
        if is_ancestor_or_self(self, id, new_parent) {
            return Err(TreeError::CircularParentage {
                node: id,
                parent: new_parent,
            });
        }

        if let Some(old) = self.nodes.get_mut(old_parent) {
            old.children.retain(|&child| child != id);
        }
        self.nodes[new_parent].children.push(id);
        self.nodes[id].link = NodeLink::Child(new_parent);
        Ok(())
    }

    /// Check if a node exists.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Check if a window exists.
    pub fn contains_window(&self, window: WindowId) -> bool {
        self.windows.contains_key(window)
    }

    /// The root node of a window.
    pub fn window_root(&self, window: WindowId) -> TreeResult<NodeId> {
        self.windows
            .get(window)
            .map(|w| w.root)
            .ok_or(TreeError::InvalidWindow(window))
    }

    /// The window's name.
    pub fn window_name(&self, window: WindowId) -> TreeResult<&str> {
        self.windows
            .get(window)
            .map(|w| w.name.as_str())
            .ok_or(TreeError::InvalidWindow(window))
    }

    /// All live windows.
    pub fn window_ids(&self) -> Vec<WindowId> {
        self.windows.keys().collect()
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// The node's name.
    pub fn name(&self, id: NodeId) -> TreeResult<&str> {
        self.nodes
            .get(id)
            .map(|d| d.name.as_str())
            .ok_or(TreeError::InvalidNode(id))
    }

    /// The node's children, in insertion order.
    pub fn children(&self, id: NodeId) -> TreeResult<&[NodeId]> {
        self.nodes
            .get(id)
            .map(|d| d.children.as_slice())
            .ok_or(TreeError::InvalidNode(id))
    }

    /// Set the node's own enabled flag.
    pub fn set_enabled(&mut self, id: NodeId, enabled: bool) -> TreeResult<()> {
        let data = self.nodes.get_mut(id).ok_or(TreeError::InvalidNode(id))?;
        data.enabled = enabled;
        Ok(())
    }

    /// Set the node's own visibility flag.
    pub fn set_visible(&mut self, id: NodeId, visible: bool) -> TreeResult<()> {
        let data = self.nodes.get_mut(id).ok_or(TreeError::InvalidNode(id))?;
        data.visible = visible;
        Ok(())
    }

    /// The node's own enabled flag, ignoring ancestors.
    pub fn is_enabled(&self, id: NodeId) -> bool {
        self.nodes.get(id).is_some_and(|d| d.enabled)
    }

    /// The node's own visibility flag, ignoring ancestors.
    pub fn is_visible(&self, id: NodeId) -> bool {
        self.nodes.get(id).is_some_and(|d| d.visible)
    }

    /// Set the node's position relative to its parent.
    pub fn set_position(&mut self, id: NodeId, position: Vec2) -> TreeResult<()> {
        let data = self.nodes.get_mut(id).ok_or(TreeError::InvalidNode(id))?;
        data.position = position;
        Ok(())
    }
}

impl HasParent for NodeTree {
    fn link(&self, node: NodeId) -> Option<NodeLink> {
        self.nodes.get(node).map(|d| d.link)
    }
}

impl HasEnabledPredicate for NodeTree {
    fn is_enabled_for_focus(&self, node: NodeId) -> bool {
        if !self.nodes.contains_key(node) {
            return false;
        }
        ancestors(self, node).all(|n| self.nodes.get(n).is_some_and(|d| d.enabled && d.visible))
    }
}

impl HasGeometry for NodeTree {
    fn origin(&self, node: NodeId) -> Vec2 {
        ancestors(self, node)
            .filter_map(|n| self.nodes.get(n))
            .map(|d| d.position)
            .sum()
    }
}
