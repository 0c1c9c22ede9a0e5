//! Horizon Focus - keyboard and pointer focus for widget trees.
//!
//! This crate decides, on every focus change, which widgets are told what
//! and in which order, and keeps the tab order of every window.
//!
//! - [`TransitionEngine`]: the four-phase ancestor-chain walk that reports
//!   [`FocusChange`] events for one kind of focus
//! - [`TabOrder`]: the mutable, per-window order of focusable fields
//! - [`DelayedFocus`]: focus requests parked until their field is eligible
//! - [`LabelLinks`]: labels forwarding activation to the field they describe
//! - [`FocusManager`]: per-window focus contexts tying the above together
//! - [`FocusHandle`]: posting focus requests from other threads
//!
//! # Example
//!
//! ```
//! use horizon_focus::{FocusManager, FocusTrigger, RequestOutcome};
//! use horizon_focus_core::NodeTree;
//!
//! let mut tree = NodeTree::new();
//! let (window, root) = tree.create_window("login");
//! let user = tree.add_child(root, "user").unwrap();
//! let password = tree.add_child(root, "password").unwrap();
//! tree.set_enabled(password, false).unwrap();
//!
//! let mut focus = FocusManager::new();
//! focus.add_window(window);
//! focus.register_field(&tree, user).unwrap();
//! focus.register_field(&tree, password).unwrap();
//!
//! let outcome = focus
//!     .request_focus(&tree, password, false, FocusTrigger::Programmatic)
//!     .unwrap();
//! assert!(matches!(outcome, RequestOutcome::Deferred(_)));
//!
//! tree.set_enabled(password, true).unwrap();
//! focus.fields_changed(&tree, window).unwrap();
//! assert_eq!(focus.keyboard_focus(window), Some(password));
//! ```

mod config;
mod debug;
pub mod delayed;
pub mod engine;
mod error;
pub mod event;
mod handle;
pub mod input;
pub mod label;
mod manager;
pub mod node;
pub mod tab_order;

pub use config::FocusConfig;
pub use debug::FocusTreeDebug;
pub use delayed::{DelayedFocus, DelayedToken};
pub use engine::{Reporter, TransitionEngine};
pub use error::{FocusError, Result};
pub use event::{FocusChange, FocusEvent, FocusKind, FocusTrigger};
pub use handle::{FocusHandle, FocusRequest};
pub use input::{navigation, Key, KeyboardModifiers, MouseButton};
pub use label::{LabelLinks, LinkId};
pub use manager::{Activation, FocusChanged, FocusManager, RequestOutcome};
pub use node::{FocusFlags, FocusNodes};
pub use tab_order::{Direction, TabOrder};
