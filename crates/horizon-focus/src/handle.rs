//! Thread-safe access to a focus manager.
//!
//! A [`FocusHandle`] can be cloned into worker threads. Each call posts a
//! [`FocusRequest`] that the UI thread applies on its next
//! [`FocusManager::process_pending`](crate::FocusManager::process_pending).

use horizon_focus_core::{NodeId, RequestSender, WindowId};

use crate::event::FocusTrigger;
use crate::tab_order::Direction;

/// A focus operation posted from another thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusRequest {
    /// Ask for keyboard focus on a field, parking the request if needed.
    RequestFocus {
        /// The field.
        node: NodeId,
        /// Why.
        trigger: FocusTrigger,
    },
    /// Move keyboard focus through the tab order.
    Advance {
        /// The window to traverse.
        window: WindowId,
        /// Which way.
        direction: Direction,
        /// Why.
        trigger: FocusTrigger,
    },
    /// Drop keyboard focus in a window.
    ClearFocus {
        /// The window.
        window: WindowId,
        /// Why.
        trigger: FocusTrigger,
    },
    /// Some field's enabled or visible state changed.
    FieldsChanged {
        /// The affected window.
        window: WindowId,
    },
}

/// Cloneable, `Send + Sync` front end for posting focus requests.
#[derive(Debug, Clone)]
pub struct FocusHandle {
    sender: RequestSender<FocusRequest>,
}

impl FocusHandle {
    pub(crate) fn new(sender: RequestSender<FocusRequest>) -> Self {
        Self { sender }
    }

    /// Ask for focus on `node`. Returns `false` if the manager is gone.
    pub fn request_focus(&self, node: NodeId, trigger: FocusTrigger) -> bool {
        self.sender.post(FocusRequest::RequestFocus { node, trigger })
    }

    /// Advance focus in `window`.
    pub fn advance(&self, window: WindowId, direction: Direction, trigger: FocusTrigger) -> bool {
        self.sender.post(FocusRequest::Advance {
            window,
            direction,
            trigger,
        })
    }

    /// Clear focus in `window`.
    pub fn clear_focus(&self, window: WindowId, trigger: FocusTrigger) -> bool {
        self.sender.post(FocusRequest::ClearFocus { window, trigger })
    }

    /// Tell the manager that eligibility may have changed in `window`.
    pub fn fields_changed(&self, window: WindowId) -> bool {
        self.sender.post(FocusRequest::FieldsChanged { window })
    }

    /// Post a prepared request.
    pub fn post(&self, request: FocusRequest) -> bool {
        self.sender.post(request)
    }
}

static_assertions::assert_impl_all!(FocusHandle: Send, Sync, Clone);
static_assertions::assert_impl_all!(FocusRequest: Send, Copy);
