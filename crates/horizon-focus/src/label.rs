//! Label links.
//!
//! A label is a non-focusable widget describing a focusable one. Linking
//! the two makes pointer activation on the label land on the target, with
//! coordinates translated into the target's space, and makes the label's
//! disabled appearance follow the target's eligibility.
//!
//! Links never own either side. A link whose label or target has been
//! destroyed stops resolving and is swept by [`LabelLinks::sever_where`].

use horizon_focus_core::logging::targets;
use glam::Vec2;
use horizon_focus_core::{FocusTree, HasEnabledPredicate, HasParent, NodeId, Signal};
use slotmap::{new_key_type, SecondaryMap, SlotMap};

use crate::error::{FocusError, Result};

new_key_type! {
    /// Identifies one label link.
    pub struct LinkId;
}

#[derive(Debug, Clone, Copy)]
struct Link {
    label: NodeId,
    target: NodeId,
}

/// All label links of an application.
#[derive(Debug, Default)]
pub struct LabelLinks {
    links: SlotMap<LinkId, Link>,
    by_label: SecondaryMap<NodeId, LinkId>,
    disabled: SecondaryMap<NodeId, bool>,
    /// Emitted with `(label, disabled)` when a label's appearance changes.
    pub appearance_changed: Signal<(NodeId, bool)>,
}

impl LabelLinks {
    /// Create an empty link table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Link `label` to `target`, replacing any link the label already had.
    ///
    /// Several labels may share a target.
    ///
    /// # Errors
    ///
    /// [`FocusError::UnknownNode`] if either side is not in the tree.
    pub fn link<T: HasParent + HasEnabledPredicate + ?Sized>(
        &mut self,
        tree: &T,
        label: NodeId,
        target: NodeId,
    ) -> Result<LinkId> {
        for node in [label, target] {
            if tree.link(node).is_none() {
                return Err(FocusError::UnknownNode(node));
            }
        }
        if let Some(old) = self.by_label.remove(label) {
            self.links.remove(old);
        }
        let id = self.links.insert(Link { label, target });
        self.by_label.insert(label, id);
        tracing::debug!(target: targets::LABEL, ?label, ?target, "linked label");
        self.set_appearance(label, !tree.is_enabled_for_focus(target));
        Ok(id)
    }

    /// Remove the label's link. Returns whether it had one.
    pub fn unlink(&mut self, label: NodeId) -> bool {
        let Some(id) = self.by_label.remove(label) else {
            return false;
        };
        self.links.remove(id);
        self.set_appearance(label, false);
        self.disabled.remove(label);
        true
    }

    /// The label's live target.
    pub fn target_of<T: HasParent + ?Sized>(&self, tree: &T, label: NodeId) -> Option<NodeId> {
        let link = self.links.get(*self.by_label.get(label)?)?;
        tree.link(link.target).map(|_| link.target)
    }

    /// Labels currently linked to `target`.
    pub fn labels_for(&self, target: NodeId) -> Vec<NodeId> {
        self.links
            .values()
            .filter(|l| l.target == target)
            .map(|l| l.label)
            .collect()
    }

    /// Number of links.
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Whether there are no links.
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Drop every link touching a doomed node. Never fails.
    ///
    /// Labels that survive their target revert to their own appearance.
    pub fn sever_where(&mut self, mut doomed: impl FnMut(NodeId) -> bool) -> usize {
        let severed: Vec<(LinkId, Link)> = self
            .links
            .iter()
            .filter(|(_, l)| doomed(l.label) || doomed(l.target))
            .map(|(id, l)| (id, *l))
            .collect();
        for &(id, link) in &severed {
            self.links.remove(id);
            self.by_label.remove(link.label);
            if doomed(link.label) {
                self.disabled.remove(link.label);
            } else {
                self.set_appearance(link.label, false);
                self.disabled.remove(link.label);
            }
        }
        if !severed.is_empty() {
            tracing::debug!(target: targets::LABEL, count = severed.len(), "severed label links");
        }
        severed.len()
    }

    /// Translate an activation at `local` in the label's space into the
    /// target's space.
    pub fn redirect<T: FocusTree + ?Sized>(
        &self,
        tree: &T,
        label: NodeId,
        local: Vec2,
    ) -> Option<(NodeId, Vec2)> {
        let target = self.target_of(tree, label)?;
        let window_pos = tree.origin(label) + local;
        Some((target, window_pos - tree.origin(target)))
    }

    /// Recompute every label's appearance from its target's eligibility.
    pub fn refresh<T: HasParent + HasEnabledPredicate + ?Sized>(&mut self, tree: &T) {
        let updates: Vec<(NodeId, bool)> = self
            .links
            .values()
            .filter(|l| tree.link(l.label).is_some())
            .map(|l| (l.label, !tree.is_enabled_for_focus(l.target)))
            .collect();
        for (label, disabled) in updates {
            self.set_appearance(label, disabled);
        }
    }

    /// Whether the label currently renders as disabled because of its link.
    pub fn is_disabled(&self, label: NodeId) -> bool {
        self.disabled.get(label).copied().unwrap_or(false)
    }

    fn set_appearance(&mut self, label: NodeId, disabled: bool) {
        let previous = self.disabled.insert(label, disabled).unwrap_or(false);
        if previous != disabled {
            tracing::trace!(target: targets::LABEL, ?label, disabled, "label appearance changed");
            self.appearance_changed.emit((label, disabled));
        }
    }
}
