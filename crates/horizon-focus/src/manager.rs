//! Application-wide focus management.
//!
//! The [`FocusManager`] owns every per-window focus context: the tab order,
//! the current keyboard and pointer focus holders and the parked focus
//! request. It drives one [`TransitionEngine`] for keyboard focus and
//! another for pointer focus, each with its own reporter.
//!
//! The manager never owns the widget tree. Every operation that needs to
//! look at the tree takes it as a parameter through the capability traits
//! in `horizon_focus_core`.
//!
//! # Threading
//!
//! The manager is confined to the thread that created it. Other threads
//! post requests through a [`FocusHandle`]; the UI thread applies them in
//! arrival order from [`FocusManager::process_pending`].
//!
//! # Example
//!
//! ```
//! use horizon_focus::{Direction, FocusManager, FocusTrigger};
//! use horizon_focus_core::NodeTree;
//!
//! let mut tree = NodeTree::new();
//! let (window, root) = tree.create_window("main");
//! let name = tree.add_child(root, "name").unwrap();
//! let email = tree.add_child(root, "email").unwrap();
//!
//! let mut focus = FocusManager::new();
//! focus.add_window(window);
//! focus.register_field(&tree, name).unwrap();
//! focus.register_field(&tree, email).unwrap();
//!
//! focus.advance(&tree, window, Direction::Next, FocusTrigger::Tab).unwrap();
//! assert_eq!(focus.keyboard_focus(window), Some(name));
//! focus.advance(&tree, window, Direction::Next, FocusTrigger::Tab).unwrap();
//! assert_eq!(focus.keyboard_focus(window), Some(email));
//! ```

use horizon_focus_core::logging::{span_names, targets};
use horizon_focus_core::{
    is_ancestor_or_self, request_channel, FocusTree, HasEnabledPredicate, HasParent, NodeId,
    PerfSpan, RequestReceiver, RequestSender, Signal, ThreadAffinity, WindowId,
};
use glam::Vec2;
use slotmap::SecondaryMap;

use crate::config::FocusConfig;
use crate::delayed::{DelayedFocus, DelayedToken};
use crate::engine::TransitionEngine;
use crate::error::{FocusError, Result};
use crate::event::{FocusChange, FocusEvent, FocusKind, FocusTrigger};
use crate::handle::{FocusHandle, FocusRequest};
use crate::input::{navigation, Key, KeyboardModifiers, MouseButton};
use crate::label::{LabelLinks, LinkId};
use crate::tab_order::{Direction, TabOrder};

type BoxedReporter = Box<dyn FnMut(NodeId, FocusChange, FocusTrigger)>;

/// Result of [`FocusManager::request_focus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// The field took focus immediately.
    Granted,
    /// The field could not take focus and the request was immediate-only.
    Declined,
    /// The request was parked until the field becomes eligible.
    Deferred(DelayedToken),
}

/// Payload of [`FocusManager::focus_changed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusChanged {
    /// The window whose keyboard focus changed.
    pub window: WindowId,
    /// The previous holder.
    pub old: Option<NodeId>,
    /// The new holder.
    pub new: Option<NodeId>,
    /// What caused the change.
    pub trigger: FocusTrigger,
}

/// Where a pointer activation ended up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Activation {
    /// The node that should handle the press.
    pub target: NodeId,
    /// The press position in the target's coordinates.
    pub position: Vec2,
    /// Whether the press was forwarded from a label.
    pub redirected: bool,
    /// Whether keyboard focus moved to the target.
    pub focused: bool,
}

#[derive(Debug, Default)]
struct WindowFocus {
    tab_order: TabOrder,
    keyboard: Option<NodeId>,
    pointer: Option<NodeId>,
}

#[derive(Debug, Clone, Copy)]
struct FieldInfo {
    window: WindowId,
    autofocus: bool,
}

enum Step {
    Within(NodeId),
    Across(WindowId, NodeId),
    Wrapped(NodeId),
    Exhausted,
}

/// Per-application focus state and the operations on it.
pub struct FocusManager {
    config: FocusConfig,
    affinity: ThreadAffinity,
    windows: SecondaryMap<WindowId, WindowFocus>,
    window_order: Vec<WindowId>,
    fields: SecondaryMap<NodeId, FieldInfo>,
    keyboard: TransitionEngine,
    pointer: TransitionEngine,
    delayed: DelayedFocus,
    labels: LabelLinks,
    keyboard_reporter: Option<BoxedReporter>,
    pointer_reporter: Option<BoxedReporter>,
    sender: RequestSender<FocusRequest>,
    receiver: RequestReceiver<FocusRequest>,
    /// Emitted after every keyboard transition that changed the holder.
    pub focus_changed: Signal<FocusChanged>,
    /// Emitted when a parked request is superseded or cancelled.
    pub request_invalidated: Signal<DelayedToken>,
}

impl std::fmt::Debug for FocusManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FocusManager")
            .field("config", &self.config)
            .field("windows", &self.window_order)
            .field("fields", &self.fields.len())
            .field("labels", &self.labels.len())
            .field("pending_requests", &self.receiver.pending_count())
            .finish()
    }
}

impl Default for FocusManager {
    fn default() -> Self {
        Self::new()
    }
}

impl FocusManager {
    /// Create a manager with the default configuration, bound to the
    /// calling thread.
    pub fn new() -> Self {
        Self::with_config(FocusConfig::default())
    }

    /// Create a manager with a custom configuration.
    pub fn with_config(config: FocusConfig) -> Self {
        let (sender, receiver) = request_channel();
        Self {
            config,
            affinity: ThreadAffinity::current(),
            windows: SecondaryMap::new(),
            window_order: Vec::new(),
            fields: SecondaryMap::new(),
            keyboard: TransitionEngine::new(FocusKind::Keyboard),
            pointer: TransitionEngine::new(FocusKind::Pointer),
            delayed: DelayedFocus::new(),
            labels: LabelLinks::new(),
            keyboard_reporter: None,
            pointer_reporter: None,
            sender,
            receiver,
            focus_changed: Signal::new(),
            request_invalidated: Signal::new(),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &FocusConfig {
        &self.config
    }

    /// A thread-safe handle for posting requests to this manager.
    pub fn handle(&self) -> FocusHandle {
        FocusHandle::new(self.sender.clone())
    }

    /// Install the callback receiving keyboard focus events.
    pub fn set_keyboard_reporter(
        &mut self,
        reporter: impl FnMut(NodeId, FocusChange, FocusTrigger) + 'static,
    ) {
        self.keyboard_reporter = Some(Box::new(reporter));
    }

    /// Install the callback receiving pointer focus events.
    pub fn set_pointer_reporter(
        &mut self,
        reporter: impl FnMut(NodeId, FocusChange, FocusTrigger) + 'static,
    ) {
        self.pointer_reporter = Some(Box::new(reporter));
    }

    /// The label link table, e.g. to observe appearance changes.
    pub fn labels(&self) -> &LabelLinks {
        &self.labels
    }

    // =========================================================================
    // Windows
    // =========================================================================

    /// Start managing a window. New windows go to the end of the
    /// application's window order. Returns `false` if already managed.
    pub fn add_window(&mut self, window: WindowId) -> bool {
        self.affinity.debug_assert_same_thread();
        if self.windows.contains_key(window) {
            return false;
        }
        self.windows.insert(window, WindowFocus::default());
        self.window_order.push(window);
        tracing::debug!(target: targets::MANAGER, ?window, "window added");
        true
    }

    /// Stop managing a window and forget all of its fields. Never fails.
    ///
    /// No focus events are reported; the window is going away.
    pub fn remove_window(&mut self, window: WindowId) {
        self.affinity.debug_assert_same_thread();
        let Some(state) = self.windows.remove(window) else {
            return;
        };
        self.window_order.retain(|&w| w != window);
        for node in state.keyboard.into_iter().chain(state.pointer) {
            self.keyboard.forget(node);
            self.pointer.forget(node);
        }
        let gone: Vec<NodeId> = self
            .fields
            .iter()
            .filter(|(_, info)| info.window == window)
            .map(|(node, _)| node)
            .collect();
        for &node in &gone {
            self.fields.remove(node);
            self.keyboard.forget(node);
            self.pointer.forget(node);
        }
        self.cancel_delayed(window);
        self.labels.sever_where(|n| gone.contains(&n));
        tracing::debug!(target: targets::MANAGER, ?window, fields = gone.len(), "window removed");
    }

    /// Managed windows in application focus order.
    pub fn windows(&self) -> &[WindowId] {
        &self.window_order
    }

    /// The window's tab order.
    pub fn tab_order(&self, window: WindowId) -> Option<&TabOrder> {
        self.windows.get(window).map(|s| &s.tab_order)
    }

    // =========================================================================
    // Fields
    // =========================================================================

    /// Register a focusable field at the end of its window's tab order.
    ///
    /// The field stays in that window's tab order until removed.
    ///
    /// # Errors
    ///
    /// [`FocusError::UnknownNode`] if the node is not in the tree,
    /// [`FocusError::UnknownWindow`] if its window is not managed and
    /// [`FocusError::AlreadyRegistered`] on a second registration.
    pub fn register_field<T: HasParent + ?Sized>(&mut self, tree: &T, node: NodeId) -> Result<()> {
        self.affinity.debug_assert_same_thread();
        let window = tree.window_of(node).ok_or(FocusError::UnknownNode(node))?;
        let state = self
            .windows
            .get_mut(window)
            .ok_or(FocusError::UnknownWindow(window))?;
        if self.fields.contains_key(node) {
            return Err(FocusError::AlreadyRegistered(node));
        }
        state.tab_order.insert(node)?;
        self.fields.insert(
            node,
            FieldInfo {
                window,
                autofocus: false,
            },
        );
        tracing::debug!(target: targets::TAB_ORDER, ?node, ?window, "field registered");
        Ok(())
    }

    /// Mark a field as a candidate for focus when its window is shown.
    pub fn set_autofocus(&mut self, node: NodeId, autofocus: bool) -> Result<()> {
        let info = self
            .fields
            .get_mut(node)
            .ok_or(FocusError::NotRegistered(node))?;
        info.autofocus = autofocus;
        Ok(())
    }

    /// Whether the node is a registered field.
    pub fn is_field(&self, node: NodeId) -> bool {
        self.fields.contains_key(node)
    }

    /// Remove a field, or any other node, from focus bookkeeping.
    ///
    /// Call this while the node is still in the tree. If it holds keyboard
    /// focus, focus first advances past it with [`FocusTrigger::Implicit`],
    /// or is cleared when nothing else is eligible. Its parked request and
    /// label links are dropped. Never fails.
    pub fn remove_field<T: FocusTree + ?Sized>(&mut self, tree: &T, node: NodeId) {
        self.affinity.debug_assert_same_thread();
        self.remove_where(tree, &|n| n == node);
    }

    /// [`remove_field`](Self::remove_field) for a whole subtree.
    pub fn detach<T: FocusTree + ?Sized>(&mut self, tree: &T, root: NodeId) {
        self.affinity.debug_assert_same_thread();
        self.remove_where(tree, &|n| is_ancestor_or_self(tree, root, n));
    }

    fn remove_where<T: FocusTree + ?Sized>(
        &mut self,
        tree: &T,
        doomed: &dyn Fn(NodeId) -> bool,
    ) {
        let windows: Vec<WindowId> = self.window_order.clone();
        for window in windows {
            let Some(state) = self.windows.get(window) else {
                continue;
            };
            let (keyboard, pointer) = (state.keyboard, state.pointer);

            if keyboard.is_some_and(doomed) {
                let moved = self.advance_excluding(
                    tree,
                    window,
                    Direction::Next,
                    FocusTrigger::Implicit,
                    doomed,
                );
                if let Err(err) = moved {
                    tracing::warn!(
                        target: targets::MANAGER,
                        ?window,
                        %err,
                        "could not move focus off a removed node"
                    );
                    self.drop_holder(window, FocusKind::Keyboard);
                }
            }
            if pointer.is_some_and(doomed) {
                let cleared =
                    self.transfer(tree, FocusKind::Pointer, window, None, FocusTrigger::Implicit);
                if let Err(err) = cleared {
                    tracing::warn!(
                        target: targets::MANAGER,
                        ?window,
                        %err,
                        "could not clear pointer focus"
                    );
                    self.drop_holder(window, FocusKind::Pointer);
                }
            }
            if let Some(token) = self.delayed.cancel_if(window, doomed) {
                self.request_invalidated.emit(token);
            }
            if let Some(state) = self.windows.get_mut(window) {
                state.tab_order.remove_where(doomed);
            }
        }

        let gone: Vec<NodeId> = self.fields.keys().filter(|&n| doomed(n)).collect();
        for node in gone {
            self.fields.remove(node);
            self.keyboard.forget(node);
            self.pointer.forget(node);
            tracing::debug!(target: targets::TAB_ORDER, ?node, "field removed");
        }
        self.labels.sever_where(doomed);
    }

    fn drop_holder(&mut self, window: WindowId, kind: FocusKind) {
        let Some(state) = self.windows.get_mut(window) else {
            return;
        };
        let holder = match kind {
            FocusKind::Keyboard => state.keyboard.take(),
            FocusKind::Pointer => state.pointer.take(),
        };
        if let Some(node) = holder {
            self.keyboard.forget(node);
            self.pointer.forget(node);
        }
    }

    // =========================================================================
    // Reordering
    // =========================================================================

    /// Move `field` to immediately before `other`.
    ///
    /// # Errors
    ///
    /// [`FocusError::NotRegistered`] if either is not a field,
    /// [`FocusError::CrossWindowReorder`] if they are in different windows.
    pub fn relocate_before(&mut self, field: NodeId, other: NodeId) -> Result<()> {
        self.affinity.debug_assert_same_thread();
        let window = self.pair_window(field, other)?;
        self.tab_order_mut(window)?.relocate_before(field, other)
    }

    /// Move `field` to immediately after `other`.
    pub fn relocate_after(&mut self, field: NodeId, other: NodeId) -> Result<()> {
        self.affinity.debug_assert_same_thread();
        let window = self.pair_window(field, other)?;
        self.tab_order_mut(window)?.relocate_after(field, other)
    }

    /// Place `fields`, in order, immediately after `anchor`.
    pub fn relocate_list_after(&mut self, anchor: NodeId, fields: &[NodeId]) -> Result<()> {
        self.affinity.debug_assert_same_thread();
        let window = self.list_window(anchor, fields)?;
        self.tab_order_mut(window)?.relocate_list_after(anchor, fields)
    }

    /// Place `fields`, in order, immediately before `anchor`.
    pub fn relocate_list_before(&mut self, anchor: NodeId, fields: &[NodeId]) -> Result<()> {
        self.affinity.debug_assert_same_thread();
        let window = self.list_window(anchor, fields)?;
        self.tab_order_mut(window)?.relocate_list_before(anchor, fields)
    }

    fn field_window(&self, node: NodeId) -> Result<WindowId> {
        self.fields
            .get(node)
            .map(|info| info.window)
            .ok_or(FocusError::NotRegistered(node))
    }

    // Validation always runs in id order so the reported error does not
    // depend on which side asked.
    fn pair_window(&self, field: NodeId, other: NodeId) -> Result<WindowId> {
        let (low, high) = if field <= other { (field, other) } else { (other, field) };
        let low_window = self.field_window(low)?;
        let high_window = self.field_window(high)?;
        if low_window != high_window {
            return Err(FocusError::CrossWindowReorder { field, other });
        }
        Ok(low_window)
    }

    fn list_window(&self, anchor: NodeId, fields: &[NodeId]) -> Result<WindowId> {
        let mut all: Vec<NodeId> = fields.iter().copied().chain(std::iter::once(anchor)).collect();
        all.sort();
        all.dedup();
        let windows = all
            .iter()
            .map(|&n| self.field_window(n).map(|w| (n, w)))
            .collect::<Result<Vec<_>>>()?;
        let anchor_window = self.field_window(anchor)?;
        match windows.iter().find(|(_, w)| *w != anchor_window) {
            Some(&(field, _)) => Err(FocusError::CrossWindowReorder { field, other: anchor }),
            None => Ok(anchor_window),
        }
    }

    fn tab_order_mut(&mut self, window: WindowId) -> Result<&mut TabOrder> {
        self.windows
            .get_mut(window)
            .map(|s| &mut s.tab_order)
            .ok_or(FocusError::UnknownWindow(window))
    }

    // =========================================================================
    // Keyboard focus
    // =========================================================================

    /// The window's keyboard focus holder.
    pub fn keyboard_focus(&self, window: WindowId) -> Option<NodeId> {
        self.windows.get(window).and_then(|s| s.keyboard)
    }

    /// The window's pointer focus holder.
    pub fn pointer_focus(&self, window: WindowId) -> Option<NodeId> {
        self.windows.get(window).and_then(|s| s.pointer)
    }

    /// Give keyboard focus to `node` regardless of eligibility.
    ///
    /// Any parked request in the node's window is cancelled.
    #[tracing::instrument(
        skip_all,
        target = "horizon_focus::manager",
        level = "debug",
        fields(?node, ?trigger)
    )]
    pub fn set_focus<T: HasParent + ?Sized>(
        &mut self,
        tree: &T,
        node: NodeId,
        trigger: FocusTrigger,
    ) -> Result<()> {
        self.affinity.debug_assert_same_thread();
        let window = tree.window_of(node).ok_or(FocusError::UnknownNode(node))?;
        self.focus_in(tree, window, node, trigger)
    }

    /// Drop keyboard focus in `window`.
    pub fn clear_focus<T: HasParent + ?Sized>(
        &mut self,
        tree: &T,
        window: WindowId,
        trigger: FocusTrigger,
    ) -> Result<()> {
        self.affinity.debug_assert_same_thread();
        self.transfer(tree, FocusKind::Keyboard, window, None, trigger)
    }

    /// Move keyboard focus to the next or previous eligible field.
    ///
    /// The scan starts just past the current holder. When the window is
    /// exhausted focus moves to the first eligible field of a later window
    /// in application order (if enabled in the configuration), then wraps
    /// around inside the window, and is cleared when nothing is eligible.
    /// Returns the new holder.
    ///
    /// Landing on a field cancels the parked request of the window it
    /// lands in.
    #[tracing::instrument(
        skip_all,
        target = "horizon_focus::manager",
        level = "debug",
        fields(?window, ?direction, ?trigger)
    )]
    pub fn advance<T: FocusTree + ?Sized>(
        &mut self,
        tree: &T,
        window: WindowId,
        direction: Direction,
        trigger: FocusTrigger,
    ) -> Result<Option<NodeId>> {
        self.affinity.debug_assert_same_thread();
        let landed = self.advance_excluding(tree, window, direction, trigger, &|_| false)?;
        if let Some((window, _)) = landed {
            self.cancel_delayed(window);
        }
        Ok(landed.map(|(_, node)| node))
    }

    /// Advance forward with the Tab trigger.
    pub fn focus_next<T: FocusTree + ?Sized>(
        &mut self,
        tree: &T,
        window: WindowId,
    ) -> Result<Option<NodeId>> {
        self.advance(tree, window, Direction::Next, FocusTrigger::Tab)
    }

    /// Advance backward with the Backtab trigger.
    pub fn focus_previous<T: FocusTree + ?Sized>(
        &mut self,
        tree: &T,
        window: WindowId,
    ) -> Result<Option<NodeId>> {
        self.advance(tree, window, Direction::Previous, FocusTrigger::Backtab)
    }

    /// Focus the first eligible field of the window.
    pub fn focus_first<T: FocusTree + ?Sized>(
        &mut self,
        tree: &T,
        window: WindowId,
        trigger: FocusTrigger,
    ) -> Result<Option<NodeId>> {
        self.focus_end(tree, window, Direction::Next, trigger)
    }

    /// Focus the last eligible field of the window.
    pub fn focus_last<T: FocusTree + ?Sized>(
        &mut self,
        tree: &T,
        window: WindowId,
        trigger: FocusTrigger,
    ) -> Result<Option<NodeId>> {
        self.focus_end(tree, window, Direction::Previous, trigger)
    }

    fn focus_end<T: FocusTree + ?Sized>(
        &mut self,
        tree: &T,
        window: WindowId,
        direction: Direction,
        trigger: FocusTrigger,
    ) -> Result<Option<NodeId>> {
        self.affinity.debug_assert_same_thread();
        let state = self.windows.get(window).ok_or(FocusError::UnknownWindow(window))?;
        let pick = state.tab_order.first(direction, |n| resident(tree, window, n));
        if let Some(node) = pick {
            self.focus_in(tree, window, node, trigger)?;
        }
        Ok(pick)
    }

    // Moves focus without touching parked requests and reports where it
    // landed.
    fn advance_excluding<T: FocusTree + ?Sized>(
        &mut self,
        tree: &T,
        window: WindowId,
        direction: Direction,
        trigger: FocusTrigger,
        excluded: &dyn Fn(NodeId) -> bool,
    ) -> Result<Option<(WindowId, NodeId)>> {
        let _perf = PerfSpan::new(span_names::ADVANCE);
        let eligible = |w: WindowId, n: NodeId| !excluded(n) && resident(tree, w, n);

        let step = {
            let state = self.windows.get(window).ok_or(FocusError::UnknownWindow(window))?;
            let start = state.keyboard.and_then(|holder| state.tab_order.position(holder));
            if let Some(node) = state.tab_order.scan(start, direction, |n| eligible(window, n)) {
                Step::Within(node)
            } else if let Some((other, node)) = self.scan_windows(window, direction, &eligible) {
                Step::Across(other, node)
            } else if let Some(node) = state.tab_order.first(direction, |n| eligible(window, n)) {
                Step::Wrapped(node)
            } else {
                Step::Exhausted
            }
        };

        match step {
            Step::Within(node) => {
                self.transfer(tree, FocusKind::Keyboard, window, Some(node), trigger)?;
                Ok(Some((window, node)))
            }
            Step::Across(other, node) => {
                tracing::debug!(
                    target: targets::TAB_ORDER,
                    from = ?window,
                    to = ?other,
                    ?node,
                    "focus leaves window"
                );
                self.transfer(tree, FocusKind::Keyboard, window, None, trigger)?;
                self.transfer(tree, FocusKind::Keyboard, other, Some(node), trigger)?;
                Ok(Some((other, node)))
            }
            Step::Wrapped(node) => {
                tracing::trace!(target: targets::TAB_ORDER, ?window, ?node, "tab order wrapped");
                self.transfer(tree, FocusKind::Keyboard, window, Some(node), trigger)?;
                Ok(Some((window, node)))
            }
            Step::Exhausted => {
                tracing::debug!(
                    target: targets::TAB_ORDER,
                    ?window,
                    "no eligible field, clearing focus"
                );
                self.transfer(tree, FocusKind::Keyboard, window, None, trigger)?;
                Ok(None)
            }
        }
    }

    // Later windows in `direction`, without wrapping around the window list.
    fn scan_windows(
        &self,
        window: WindowId,
        direction: Direction,
        eligible: impl Fn(WindowId, NodeId) -> bool,
    ) -> Option<(WindowId, NodeId)> {
        if !self.config.cross_window_traversal {
            return None;
        }
        let index = self.window_order.iter().position(|&w| w == window)?;
        let candidates: Vec<WindowId> = match direction {
            Direction::Next => self.window_order[index + 1..].to_vec(),
            Direction::Previous => self.window_order[..index].iter().rev().copied().collect(),
        };
        candidates.into_iter().find_map(|other| {
            let state = self.windows.get(other)?;
            state
                .tab_order
                .first(direction, |n| eligible(other, n))
                .map(|node| (other, node))
        })
    }

    // An explicit keyboard move: the window's parked request is cancelled.
    fn focus_in<T: HasParent + ?Sized>(
        &mut self,
        tree: &T,
        window: WindowId,
        node: NodeId,
        trigger: FocusTrigger,
    ) -> Result<()> {
        self.transfer(tree, FocusKind::Keyboard, window, Some(node), trigger)?;
        self.cancel_delayed(window);
        Ok(())
    }

    fn cancel_delayed(&mut self, window: WindowId) {
        if let Some(token) = self.delayed.cancel(window) {
            self.request_invalidated.emit(token);
        }
    }

    fn transfer<T: HasParent + ?Sized>(
        &mut self,
        tree: &T,
        kind: FocusKind,
        window: WindowId,
        to: Option<NodeId>,
        trigger: FocusTrigger,
    ) -> Result<()> {
        let trace = self.config.trace_events;
        let state = self
            .windows
            .get_mut(window)
            .ok_or(FocusError::UnknownWindow(window))?;
        let (holder, engine, reporter) = match kind {
            FocusKind::Keyboard => (
                &mut state.keyboard,
                &mut self.keyboard,
                &mut self.keyboard_reporter,
            ),
            FocusKind::Pointer => (
                &mut state.pointer,
                &mut self.pointer,
                &mut self.pointer_reporter,
            ),
        };

        // A holder destroyed without being removed, or reparented into
        // another window, is dropped silently.
        if let Some(node) = *holder {
            if tree.window_of(node) != Some(window) {
                tracing::debug!(
                    target: targets::MANAGER,
                    ?node,
                    ?kind,
                    "dropping focus holder that left the window"
                );
                engine.forget(node);
                *holder = None;
            }
        }

        let from = *holder;
        let mut report = |node: NodeId, change: FocusChange, trigger: FocusTrigger| {
            if trace {
                let event = FocusEvent {
                    kind,
                    node,
                    change,
                    trigger,
                };
                tracing::trace!(target: targets::MANAGER, ?event, "focus event");
            }
            if let Some(reporter) = reporter.as_mut() {
                reporter(node, change, trigger);
            }
        };
        engine.transfer_focus(tree, from, to, trigger, &mut report)?;
        *holder = to;

        if kind == FocusKind::Keyboard && from != to {
            self.focus_changed.emit(FocusChanged {
                window,
                old: from,
                new: to,
                trigger,
            });
        }
        Ok(())
    }

    // =========================================================================
    // Requests and re-evaluation
    // =========================================================================

    /// Ask for keyboard focus on a registered field.
    ///
    /// An eligible field is focused at once and any parked request in its
    /// window is cancelled. Otherwise the request is declined when
    /// `immediate_only` is set, or parked, superseding the window's
    /// previous parked request.
    pub fn request_focus<T: FocusTree + ?Sized>(
        &mut self,
        tree: &T,
        node: NodeId,
        immediate_only: bool,
        trigger: FocusTrigger,
    ) -> Result<RequestOutcome> {
        self.affinity.debug_assert_same_thread();
        let window = self.field_window(node)?;
        if tree.link(node).is_none() {
            return Err(FocusError::UnknownNode(node));
        }
        if resident(tree, window, node) {
            self.focus_in(tree, window, node, trigger)?;
            return Ok(RequestOutcome::Granted);
        }
        if immediate_only {
            return Ok(RequestOutcome::Declined);
        }
        let (token, superseded) = self.delayed.arm(window, node, trigger);
        if let Some(old) = superseded {
            self.request_invalidated.emit(old);
        }
        Ok(RequestOutcome::Deferred(token))
    }

    /// Whether a parked request is still waiting.
    pub fn is_request_pending(&self, token: DelayedToken) -> bool {
        self.delayed.is_live(token)
    }

    /// Re-evaluate the window after enabled or visible state changed.
    ///
    /// Grants the parked request if its field became eligible, refreshes
    /// label appearance and moves focus off a holder that is no longer
    /// eligible.
    ///
    /// Moving off an ineligible holder leaves the parked request in place.
    pub fn fields_changed<T: FocusTree + ?Sized>(
        &mut self,
        tree: &T,
        window: WindowId,
    ) -> Result<()> {
        self.affinity.debug_assert_same_thread();
        if !self.windows.contains_key(window) {
            return Err(FocusError::UnknownWindow(window));
        }
        let granted = self.delayed.take_if_eligible(window, |n| resident(tree, window, n));
        if let Some((field, trigger)) = granted {
            self.transfer(tree, FocusKind::Keyboard, window, Some(field), trigger)?;
        }
        self.labels.refresh(tree);

        let holder = self.keyboard_focus(window);
        if let Some(node) = holder.filter(|&n| !resident(tree, window, n)) {
            tracing::debug!(target: targets::MANAGER, ?node, "focus holder became ineligible");
            self.advance_excluding(
                tree,
                window,
                Direction::Next,
                FocusTrigger::Implicit,
                &|_| false,
            )?;
        }
        Ok(())
    }

    /// Tell the manager a window has been shown.
    ///
    /// Runs [`fields_changed`](Self::fields_changed), then, if nothing holds
    /// focus and autofocus is enabled, focuses the first eligible field
    /// flagged for autofocus. Returns the window's holder afterwards.
    pub fn window_shown<T: FocusTree + ?Sized>(
        &mut self,
        tree: &T,
        window: WindowId,
    ) -> Result<Option<NodeId>> {
        self.fields_changed(tree, window)?;
        let state = self.windows.get(window).ok_or(FocusError::UnknownWindow(window))?;
        if state.keyboard.is_some() || !self.config.autofocus {
            return Ok(state.keyboard);
        }
        let fields = &self.fields;
        let pick = state.tab_order.first(Direction::Next, |n| {
            fields.get(n).is_some_and(|f| f.autofocus) && resident(tree, window, n)
        });
        if let Some(node) = pick {
            tracing::debug!(target: targets::MANAGER, ?window, ?node, "autofocus");
            self.transfer(tree, FocusKind::Keyboard, window, Some(node), FocusTrigger::Implicit)?;
        }
        Ok(pick)
    }

    // =========================================================================
    // Pointer focus
    // =========================================================================

    /// Move pointer focus to `node`.
    pub fn set_pointer_focus<T: HasParent + ?Sized>(
        &mut self,
        tree: &T,
        node: NodeId,
        trigger: FocusTrigger,
    ) -> Result<()> {
        self.affinity.debug_assert_same_thread();
        let window = tree.window_of(node).ok_or(FocusError::UnknownNode(node))?;
        self.transfer(tree, FocusKind::Pointer, window, Some(node), trigger)
    }

    /// Drop pointer focus in `window`.
    pub fn clear_pointer_focus<T: HasParent + ?Sized>(
        &mut self,
        tree: &T,
        window: WindowId,
        trigger: FocusTrigger,
    ) -> Result<()> {
        self.affinity.debug_assert_same_thread();
        self.transfer(tree, FocusKind::Pointer, window, None, trigger)
    }

    // =========================================================================
    // Input
    // =========================================================================

    /// Handle a key press in `window`. Returns whether it was consumed.
    pub fn handle_key<T: FocusTree + ?Sized>(
        &mut self,
        tree: &T,
        window: WindowId,
        key: Key,
        modifiers: KeyboardModifiers,
    ) -> Result<bool> {
        let Some((direction, trigger)) = navigation(key, modifiers) else {
            return Ok(false);
        };
        self.advance(tree, window, direction, trigger)?;
        Ok(true)
    }

    /// Handle a pointer button press on `node` at `position` (node-local).
    ///
    /// Presses on a linked label are forwarded to its target. With
    /// focus-on-click enabled, a primary press on a field focuses it if it
    /// is eligible.
    pub fn handle_button<T: FocusTree + ?Sized>(
        &mut self,
        tree: &T,
        node: NodeId,
        button: MouseButton,
        position: Vec2,
    ) -> Result<Activation> {
        self.affinity.debug_assert_same_thread();
        if tree.link(node).is_none() {
            return Err(FocusError::UnknownNode(node));
        }
        let (target, position, redirected) = match self.labels.redirect(tree, node, position) {
            Some((target, translated)) => (target, translated, true),
            None => (node, position, false),
        };
        let mut focused = false;
        if self.config.focus_on_click && button == MouseButton::Left && self.is_field(target) {
            let outcome = self.request_focus(tree, target, true, FocusTrigger::Pointer)?;
            focused = outcome == RequestOutcome::Granted;
        }
        Ok(Activation {
            target,
            position,
            redirected,
            focused,
        })
    }

    // =========================================================================
    // Labels
    // =========================================================================

    /// Link a label to the field it describes.
    pub fn link_label<T: HasParent + HasEnabledPredicate + ?Sized>(
        &mut self,
        tree: &T,
        label: NodeId,
        target: NodeId,
    ) -> Result<LinkId> {
        self.affinity.debug_assert_same_thread();
        self.labels.link(tree, label, target)
    }

    /// Break a label's link. Returns whether it had one.
    pub fn unlink_label(&mut self, label: NodeId) -> bool {
        self.affinity.debug_assert_same_thread();
        self.labels.unlink(label)
    }

    // =========================================================================
    // Marshaled requests
    // =========================================================================

    /// Apply every request posted through a [`FocusHandle`], oldest first.
    ///
    /// Failures are logged and skipped. Returns the number of requests
    /// processed.
    pub fn process_pending<T: FocusTree + ?Sized>(&mut self, tree: &T) -> usize {
        self.affinity.debug_assert_same_thread();
        let _perf = PerfSpan::new(span_names::MARSHAL);
        let pending: Vec<FocusRequest> = self.receiver.drain().collect();
        for &request in &pending {
            let result = match request {
                FocusRequest::RequestFocus { node, trigger } => {
                    self.request_focus(tree, node, false, trigger).map(|_| ())
                }
                FocusRequest::Advance {
                    window,
                    direction,
                    trigger,
                } => self.advance(tree, window, direction, trigger).map(|_| ()),
                FocusRequest::ClearFocus { window, trigger } => {
                    self.clear_focus(tree, window, trigger)
                }
                FocusRequest::FieldsChanged { window } => self.fields_changed(tree, window),
            };
            if let Err(err) = result {
                tracing::warn!(
                    target: targets::MANAGER,
                    ?request,
                    %err,
                    "marshaled focus request failed"
                );
            }
        }
        pending.len()
    }

    pub(crate) fn field_annotation(&self, node: NodeId) -> Option<(usize, bool)> {
        let info = self.fields.get(node)?;
        let position = self.windows.get(info.window)?.tab_order.position(node)?;
        Some((position, info.autofocus))
    }
}

// Eligible for focus and still inside the window whose tab order lists it.
fn resident<T: FocusTree + ?Sized>(tree: &T, window: WindowId, node: NodeId) -> bool {
    tree.window_of(node) == Some(window) && tree.is_enabled_for_focus(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use horizon_focus_core::NodeTree;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Form {
        tree: NodeTree,
        window: WindowId,
        fields: Vec<NodeId>,
        focus: FocusManager,
    }

    fn form(count: usize) -> Form {
        let mut tree = NodeTree::new();
        let (window, root) = tree.create_window("form");
        let mut focus = FocusManager::new();
        focus.add_window(window);
        let fields: Vec<NodeId> = (0..count)
            .map(|i| tree.add_child(root, format!("field{i}")).unwrap())
            .collect();
        for &field in &fields {
            focus.register_field(&tree, field).unwrap();
        }
        Form {
            tree,
            window,
            fields,
            focus,
        }
    }

    #[test]
    fn test_register_twice_fails() {
        let mut f = form(1);
        assert_eq!(
            f.focus.register_field(&f.tree, f.fields[0]),
            Err(FocusError::AlreadyRegistered(f.fields[0]))
        );
    }

    #[test]
    fn test_register_in_unmanaged_window() {
        let mut f = form(0);
        let (other, root) = f.tree.create_window("other");
        let node = f.tree.add_child(root, "n").unwrap();
        assert_eq!(f.focus.register_field(&f.tree, node), Err(FocusError::UnknownWindow(other)));
    }

    #[test]
    fn test_advance_skips_disabled_and_wraps() {
        let mut f = form(3);
        f.tree.set_enabled(f.fields[1], false).unwrap();

        let window = f.window;
        assert_eq!(f.focus.focus_next(&f.tree, window).unwrap(), Some(f.fields[0]));
        assert_eq!(f.focus.focus_next(&f.tree, window).unwrap(), Some(f.fields[2]));
        assert_eq!(f.focus.focus_next(&f.tree, window).unwrap(), Some(f.fields[0]));
        assert_eq!(f.focus.focus_previous(&f.tree, window).unwrap(), Some(f.fields[2]));
    }

    #[test]
    fn test_advance_clears_when_nothing_eligible() {
        let mut f = form(2);
        f.focus.set_focus(&f.tree, f.fields[0], FocusTrigger::Programmatic).unwrap();
        for &field in &f.fields {
            f.tree.set_enabled(field, false).unwrap();
        }
        assert_eq!(f.focus.focus_next(&f.tree, f.window).unwrap(), None);
        assert_eq!(f.focus.keyboard_focus(f.window), None);
    }

    #[test]
    fn test_remove_focused_field_advances() {
        let mut f = form(3);
        f.focus.set_focus(&f.tree, f.fields[1], FocusTrigger::Programmatic).unwrap();

        let triggers = Rc::new(RefCell::new(Vec::new()));
        let sink = triggers.clone();
        f.focus.set_keyboard_reporter(move |_, _, trigger| sink.borrow_mut().push(trigger));

        f.focus.remove_field(&f.tree, f.fields[1]);
        assert_eq!(f.focus.keyboard_focus(f.window), Some(f.fields[2]));
        assert!(!f.focus.is_field(f.fields[1]));
        assert!(triggers.borrow().iter().all(|&t| t == FocusTrigger::Implicit));
    }

    #[test]
    fn test_remove_last_field_clears() {
        let mut f = form(1);
        f.focus.set_focus(&f.tree, f.fields[0], FocusTrigger::Programmatic).unwrap();
        f.focus.remove_field(&f.tree, f.fields[0]);
        assert_eq!(f.focus.keyboard_focus(f.window), None);
        assert!(f.focus.tab_order(f.window).unwrap().is_empty());
    }

    #[test]
    fn test_destroyed_holder_is_dropped_silently() {
        let mut f = form(2);
        f.focus.set_focus(&f.tree, f.fields[0], FocusTrigger::Programmatic).unwrap();
        f.tree.destroy(f.fields[0]).unwrap();

        f.focus.set_focus(&f.tree, f.fields[1], FocusTrigger::Programmatic).unwrap();
        assert_eq!(f.focus.keyboard_focus(f.window), Some(f.fields[1]));
    }

    #[test]
    fn test_relocate_across_windows_rejected() {
        let mut f = form(1);
        let (other, root) = f.tree.create_window("other");
        f.focus.add_window(other);
        let foreign = f.tree.add_child(root, "foreign").unwrap();
        f.focus.register_field(&f.tree, foreign).unwrap();

        let err = f.focus.relocate_before(f.fields[0], foreign).unwrap_err();
        assert_eq!(
            err,
            FocusError::CrossWindowReorder {
                field: f.fields[0],
                other: foreign
            }
        );
        assert_eq!(
            f.focus.relocate_list_after(f.fields[0], &[foreign]).unwrap_err(),
            FocusError::CrossWindowReorder {
                field: foreign,
                other: f.fields[0]
            }
        );
    }

    #[test]
    fn test_focus_changed_signal() {
        let mut f = form(2);
        let seen = std::sync::Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = seen.clone();
        f.focus.focus_changed.connect(move |change| sink.lock().push(*change));

        f.focus.set_focus(&f.tree, f.fields[0], FocusTrigger::Programmatic).unwrap();
        f.focus.set_focus(&f.tree, f.fields[0], FocusTrigger::Programmatic).unwrap();
        f.focus.clear_focus(&f.tree, f.window, FocusTrigger::Shortcut).unwrap();

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].new, Some(f.fields[0]));
        assert_eq!(seen[1].old, Some(f.fields[0]));
        assert_eq!(seen[1].trigger, FocusTrigger::Shortcut);
    }

    #[test]
    fn test_pointer_focus_is_independent() {
        let mut f = form(2);
        f.focus.set_focus(&f.tree, f.fields[0], FocusTrigger::Programmatic).unwrap();
        f.focus.set_pointer_focus(&f.tree, f.fields[1], FocusTrigger::Pointer).unwrap();
        assert_eq!(f.focus.keyboard_focus(f.window), Some(f.fields[0]));
        assert_eq!(f.focus.pointer_focus(f.window), Some(f.fields[1]));

        f.focus.clear_pointer_focus(&f.tree, f.window, FocusTrigger::Pointer).unwrap();
        assert_eq!(f.focus.pointer_focus(f.window), None);
        assert_eq!(f.focus.keyboard_focus(f.window), Some(f.fields[0]));
    }

    #[test]
    fn test_window_shown_autofocus() {
        let mut f = form(3);
        f.focus.set_autofocus(f.fields[2], true).unwrap();
        assert_eq!(f.focus.window_shown(&f.tree, f.window).unwrap(), Some(f.fields[2]));

        let mut g = form(2);
        g.focus = FocusManager::with_config(FocusConfig::new().with_autofocus(false));
        g.focus.add_window(g.window);
        g.focus.register_field(&g.tree, g.fields[0]).unwrap();
        g.focus.set_autofocus(g.fields[0], true).unwrap();
        assert_eq!(g.focus.window_shown(&g.tree, g.window).unwrap(), None);
    }

    #[test]
    fn test_fields_changed_moves_off_disabled_holder() {
        let mut f = form(3);
        f.focus.set_focus(&f.tree, f.fields[0], FocusTrigger::Programmatic).unwrap();
        f.tree.set_enabled(f.fields[0], false).unwrap();
        f.focus.fields_changed(&f.tree, f.window).unwrap();
        assert_eq!(f.focus.keyboard_focus(f.window), Some(f.fields[1]));
    }

    #[test]
    fn test_handle_key() {
        let mut f = form(2);
        let window = f.window;
        assert!(f.focus.handle_key(&f.tree, window, Key::Tab, KeyboardModifiers::NONE).unwrap());
        assert_eq!(f.focus.keyboard_focus(window), Some(f.fields[0]));
        assert!(f.focus.handle_key(&f.tree, window, Key::Tab, KeyboardModifiers::SHIFT).unwrap());
        assert_eq!(f.focus.keyboard_focus(window), Some(f.fields[1]));
        assert!(!f.focus.handle_key(&f.tree, window, Key::Enter, KeyboardModifiers::NONE).unwrap());
    }
}
