//! Focus event vocabulary.
//!
//! During a transition every affected node is told one [`FocusChange`] per
//! phase, together with the [`FocusTrigger`] that started it. The trigger is
//! never interpreted by the engine; it only travels with the events.

use std::fmt;

use horizon_focus_core::NodeId;

/// What happened to a node's focus state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FocusChange {
    /// The node held focus and no longer does.
    Lost,
    /// A descendant held focus and focus has left this subtree.
    ChildLost,
    /// Focus moved between two descendants; this node is on both paths.
    ChildMoved,
    /// The node now holds focus.
    Gained,
    /// A descendant now holds focus, entering this subtree from outside.
    ChildGained,
    /// The node takes focus back from one of its descendants.
    GainedFromChild,
    /// The node held focus and hands it to one of its descendants.
    LostToChild,
    /// The transition is over; sent after every other event.
    MovementComplete,
}

impl FocusChange {
    /// Whether the node itself stops holding focus.
    pub fn is_loss(self) -> bool {
        matches!(self, Self::Lost | Self::LostToChild)
    }

    /// Whether the node itself starts holding focus.
    pub fn is_gain(self) -> bool {
        matches!(self, Self::Gained | Self::GainedFromChild)
    }

    /// Whether focus is inside this node's subtree once the transition ends.
    ///
    /// `None` for [`MovementComplete`](Self::MovementComplete), which carries
    /// no state of its own.
    pub fn focus_within(self) -> Option<bool> {
        match self {
            Self::Lost | Self::ChildLost => Some(false),
            Self::ChildMoved
            | Self::Gained
            | Self::ChildGained
            | Self::GainedFromChild
            | Self::LostToChild => Some(true),
            Self::MovementComplete => None,
        }
    }

    /// Stable lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lost => "lost",
            Self::ChildLost => "child_lost",
            Self::ChildMoved => "child_moved",
            Self::Gained => "gained",
            Self::ChildGained => "child_gained",
            Self::GainedFromChild => "gained_from_child",
            Self::LostToChild => "lost_to_child",
            Self::MovementComplete => "focus_movement_complete",
        }
    }
}

impl fmt::Display for FocusChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Why focus moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FocusTrigger {
    /// A pointer button press.
    Pointer,
    /// The Tab key.
    Tab,
    /// Shift+Tab or ISO left tab.
    Backtab,
    /// A keyboard shortcut or mnemonic.
    Shortcut,
    /// A side effect of another change, e.g. removing the focused field.
    Implicit,
    /// A direct request from application code.
    #[default]
    Programmatic,
}

/// Which kind of focus an engine tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FocusKind {
    /// Keyboard input focus.
    Keyboard,
    /// Pointer (hover) focus.
    Pointer,
}

/// One reported event, as delivered to reporters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusEvent {
    /// The kind of focus that moved.
    pub kind: FocusKind,
    /// The node being told.
    pub node: NodeId,
    /// What happened to it.
    pub change: FocusChange,
    /// What caused the transition.
    pub trigger: FocusTrigger,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loss_and_gain_classification() {
        assert!(FocusChange::Lost.is_loss());
        assert!(FocusChange::LostToChild.is_loss());
        assert!(!FocusChange::ChildLost.is_loss());
        assert!(FocusChange::GainedFromChild.is_gain());
        assert!(!FocusChange::ChildGained.is_gain());
    }

    #[test]
    fn test_focus_within() {
        assert_eq!(FocusChange::ChildLost.focus_within(), Some(false));
        assert_eq!(FocusChange::LostToChild.focus_within(), Some(true));
        assert_eq!(FocusChange::MovementComplete.focus_within(), None);
    }

    #[test]
    fn test_display_names() {
        assert_eq!(FocusChange::GainedFromChild.to_string(), "gained_from_child");
        assert_eq!(FocusChange::MovementComplete.to_string(), "focus_movement_complete");
        assert_eq!(FocusTrigger::default(), FocusTrigger::Programmatic);
    }
}
