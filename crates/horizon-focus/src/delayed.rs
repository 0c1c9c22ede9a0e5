//! Delayed focus requests.
//!
//! When a field is asked to take focus while it cannot (disabled, hidden,
//! not yet shown), the request can be parked for its window. Each window
//! holds at most one parked request; parking a new one supersedes the old.
//! Whenever the window re-evaluates eligibility the parked request is
//! granted if its field has become focusable.
//!
//! Requests are identified by [`DelayedToken`]s. Tokens are generation
//! checked, so a superseded or cancelled token simply stops being live.

use horizon_focus_core::logging::targets;
use horizon_focus_core::{NodeId, WindowId};
use slotmap::{new_key_type, SecondaryMap, SlotMap};

use crate::event::FocusTrigger;

new_key_type! {
    /// Identifies one delayed focus request.
    pub struct DelayedToken;
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    field: NodeId,
    trigger: FocusTrigger,
}

/// Parked focus requests, at most one per window.
#[derive(Debug, Default)]
pub struct DelayedFocus {
    requests: SlotMap<DelayedToken, Pending>,
    by_window: SecondaryMap<WindowId, DelayedToken>,
}

impl DelayedFocus {
    /// Create an empty set of slots.
    pub fn new() -> Self {
        Self::default()
    }

    /// Park a request for `field` in `window`.
    ///
    /// Returns the new token and the token it superseded, if any.
    pub fn arm(
        &mut self,
        window: WindowId,
        field: NodeId,
        trigger: FocusTrigger,
    ) -> (DelayedToken, Option<DelayedToken>) {
        let superseded = self.cancel(window);
        let token = self.requests.insert(Pending { field, trigger });
        self.by_window.insert(window, token);
        tracing::debug!(
            target: targets::DELAYED,
            ?window,
            ?field,
            ?token,
            ?superseded,
            "parked focus request"
        );
        (token, superseded)
    }

    /// Drop the window's parked request, returning its token.
    pub fn cancel(&mut self, window: WindowId) -> Option<DelayedToken> {
        let token = self.by_window.remove(window)?;
        self.requests.remove(token);
        Some(token)
    }

    /// Drop the window's parked request if its field matches `doomed`.
    pub fn cancel_if(
        &mut self,
        window: WindowId,
        doomed: impl FnOnce(NodeId) -> bool,
    ) -> Option<DelayedToken> {
        let (_, field, _) = self.pending(window)?;
        if doomed(field) { self.cancel(window) } else { None }
    }

    /// The window's parked request, if any.
    pub fn pending(&self, window: WindowId) -> Option<(DelayedToken, NodeId, FocusTrigger)> {
        let token = *self.by_window.get(window)?;
        self.requests.get(token).map(|p| (token, p.field, p.trigger))
    }

    /// Whether `token` is still parked.
    pub fn is_live(&self, token: DelayedToken) -> bool {
        self.requests.contains_key(token)
    }

    /// Take the window's parked request if its field is now eligible.
    pub fn take_if_eligible(
        &mut self,
        window: WindowId,
        eligible: impl FnOnce(NodeId) -> bool,
    ) -> Option<(NodeId, FocusTrigger)> {
        let (_, field, trigger) = self.pending(window)?;
        if !eligible(field) {
            return None;
        }
        self.cancel(window);
        tracing::debug!(target: targets::DELAYED, ?window, ?field, "granting parked focus request");
        Some((field, trigger))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use horizon_focus_core::NodeTree;

    fn setup() -> (WindowId, WindowId, NodeId, NodeId) {
        let mut tree = NodeTree::new();
        let (w1, r1) = tree.create_window("one");
        let (w2, _) = tree.create_window("two");
        (w1, w2, tree.add_child(r1, "a").unwrap(), tree.add_child(r1, "b").unwrap())
    }

    #[test]
    fn test_arm_supersedes_previous() {
        let (w, _, a, b) = setup();
        let mut slots = DelayedFocus::new();

        let (first, superseded) = slots.arm(w, a, FocusTrigger::Programmatic);
        assert_eq!(superseded, None);
        assert!(slots.is_live(first));

        let (second, superseded) = slots.arm(w, b, FocusTrigger::Tab);
        assert_eq!(superseded, Some(first));
        assert!(!slots.is_live(first));
        assert!(slots.is_live(second));
        assert_eq!(slots.pending(w), Some((second, b, FocusTrigger::Tab)));
    }

    #[test]
    fn test_windows_are_independent() {
        let (w1, w2, a, b) = setup();
        let mut slots = DelayedFocus::new();
        let (t1, _) = slots.arm(w1, a, FocusTrigger::Programmatic);
        let (t2, superseded) = slots.arm(w2, b, FocusTrigger::Programmatic);
        assert_eq!(superseded, None);
        assert_ne!(t1, t2);
        assert!(slots.is_live(t1) && slots.is_live(t2));
        assert_eq!(slots.cancel(w1), Some(t1));
        assert!(slots.is_live(t2));
    }

    #[test]
    fn test_take_only_when_eligible() {
        let (w, _, a, _) = setup();
        let mut slots = DelayedFocus::new();
        let (token, _) = slots.arm(w, a, FocusTrigger::Programmatic);

        assert_eq!(slots.take_if_eligible(w, |_| false), None);
        assert!(slots.is_live(token));

        assert_eq!(slots.take_if_eligible(w, |n| n == a), Some((a, FocusTrigger::Programmatic)));
        assert!(!slots.is_live(token));
        assert_eq!(slots.pending(w), None);
    }

    #[test]
    fn test_cancel_if() {
        let (w, _, a, b) = setup();
        let mut slots = DelayedFocus::new();
        let (token, _) = slots.arm(w, a, FocusTrigger::Programmatic);

        assert_eq!(slots.cancel_if(w, |n| n == b), None);
        assert_eq!(slots.cancel_if(w, |n| n == a), Some(token));
        assert_eq!(slots.cancel(w), None);
    }
}
