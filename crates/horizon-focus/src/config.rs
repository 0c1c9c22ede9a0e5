//! Focus manager configuration.

/// Behavior switches for a [`FocusManager`](crate::FocusManager).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusConfig {
    /// Let Tab traversal hand focus to the next or previous window once the
    /// current window is exhausted, before wrapping around.
    pub cross_window_traversal: bool,
    /// Move keyboard focus to a field when a pointer button activates it.
    pub focus_on_click: bool,
    /// Focus the first enabled autofocus field when a window is shown and
    /// nothing in it holds focus yet.
    pub autofocus: bool,
    /// Log every reported focus event at trace level.
    pub trace_events: bool,
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            cross_window_traversal: true,
            focus_on_click: true,
            autofocus: true,
            trace_events: false,
        }
    }
}

impl FocusConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// A configuration that keeps traversal inside each window.
    pub fn window_local() -> Self {
        Self {
            cross_window_traversal: false,
            ..Default::default()
        }
    }

    /// Enable or disable cross-window traversal.
    pub fn with_cross_window_traversal(mut self, enable: bool) -> Self {
        self.cross_window_traversal = enable;
        self
    }

    /// Enable or disable focus on pointer activation.
    pub fn with_focus_on_click(mut self, enable: bool) -> Self {
        self.focus_on_click = enable;
        self
    }

    /// Enable or disable autofocus on window show.
    pub fn with_autofocus(mut self, enable: bool) -> Self {
        self.autofocus = enable;
        self
    }

    /// Enable or disable per-event trace logging.
    pub fn with_trace_events(mut self, enable: bool) -> Self {
        self.trace_events = enable;
        self
    }
}
