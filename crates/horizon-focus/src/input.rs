//! Input translation.
//!
//! Raw key symbols and modifier state are turned into focus navigation
//! requests here. Only the navigation keys are interpreted; everything else
//! passes through untouched so widgets can handle it.

use crate::event::FocusTrigger;
use crate::tab_order::Direction;

/// X11 keysym values for the keys this module interprets.
pub mod keysym {
    /// `XK_Tab`
    pub const TAB: u32 = 0xff09;
    /// `XK_ISO_Left_Tab`, sent by many layouts for Shift+Tab.
    pub const ISO_LEFT_TAB: u32 = 0xfe20;
    /// `XK_Return`
    pub const RETURN: u32 = 0xff0d;
    /// `XK_KP_Enter`
    pub const KP_ENTER: u32 = 0xff8d;
    /// `XK_Escape`
    pub const ESCAPE: u32 = 0xff1b;
    /// `XK_space`
    pub const SPACE: u32 = 0x0020;
}

/// A key relevant to focus handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Tab.
    Tab,
    /// ISO left tab (Shift+Tab on most layouts).
    IsoLeftTab,
    /// Return or keypad Enter.
    Enter,
    /// Escape.
    Escape,
    /// Space bar.
    Space,
    /// A printable character.
    Character(char),
    /// Any other keysym.
    Other(u32),
}

impl Key {
    /// Classify a raw keysym.
    pub fn from_keysym(sym: u32) -> Self {
        match sym {
            keysym::TAB => Self::Tab,
            keysym::ISO_LEFT_TAB => Self::IsoLeftTab,
            keysym::RETURN | keysym::KP_ENTER => Self::Enter,
            keysym::ESCAPE => Self::Escape,
            keysym::SPACE => Self::Space,
            // Latin-1 keysyms map straight to their code points.
            0x21..=0x7e | 0xa0..=0xff => {
                char::from_u32(sym).map_or(Self::Other(sym), Self::Character)
            }
            // Unicode keysyms carry the code point below this marker.
            0x0100_0000..=0x0110_ffff => {
                char::from_u32(sym - 0x0100_0000).map_or(Self::Other(sym), Self::Character)
            }
            _ => Self::Other(sym),
        }
    }
}

/// Keyboard modifier state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KeyboardModifiers {
    /// The Shift key is held.
    pub shift: bool,
    /// The Control key is held.
    pub control: bool,
    /// The Alt key is held.
    pub alt: bool,
    /// The Meta/Super key is held.
    pub meta: bool,
}

impl KeyboardModifiers {
    /// No modifiers pressed.
    pub const NONE: Self = Self {
        shift: false,
        control: false,
        alt: false,
        meta: false,
    };

    /// Shift modifier only.
    pub const SHIFT: Self = Self {
        shift: true,
        control: false,
        alt: false,
        meta: false,
    };

    /// Control modifier only.
    pub const CTRL: Self = Self {
        shift: false,
        control: true,
        alt: false,
        meta: false,
    };

    /// Check if any modifier is pressed.
    pub fn any(&self) -> bool {
        self.shift || self.control || self.alt || self.meta
    }

    /// Check if no modifiers are pressed.
    pub fn none(&self) -> bool {
        !self.any()
    }
}

/// Pointer buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Primary button (usually left).
    Left,
    /// Secondary button (usually right).
    Right,
    /// Middle button.
    Middle,
}

/// Map a key press to a focus navigation request.
///
/// Tab moves forward; Shift+Tab and ISO left tab move backward. Control
/// and Alt combinations are left to the application (e.g. Ctrl+Tab for
/// switching tabs).
pub fn navigation(key: Key, modifiers: KeyboardModifiers) -> Option<(Direction, FocusTrigger)> {
    if modifiers.control || modifiers.alt || modifiers.meta {
        return None;
    }
    match key {
        Key::Tab if modifiers.shift => Some((Direction::Previous, FocusTrigger::Backtab)),
        Key::Tab => Some((Direction::Next, FocusTrigger::Tab)),
        Key::IsoLeftTab => Some((Direction::Previous, FocusTrigger::Backtab)),
        _ => None,
    }
}
