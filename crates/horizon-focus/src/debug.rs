//! Tree dumps annotated with focus state.

use horizon_focus_core::{NodeTree, TreeDebug, TreeFormatOptions, WindowId};

use crate::error::{FocusError, Result};
use crate::manager::FocusManager;

/// Formats a window's node tree with keyboard focus, pointer focus and tab
/// positions marked.
///
/// ```
/// use horizon_focus::{FocusManager, FocusTreeDebug, FocusTrigger};
/// use horizon_focus_core::NodeTree;
///
/// let mut tree = NodeTree::new();
/// let (window, root) = tree.create_window("main");
/// let field = tree.add_child(root, "field").unwrap();
///
/// let mut focus = FocusManager::new();
/// focus.add_window(window);
/// focus.register_field(&tree, field).unwrap();
/// focus.set_focus(&tree, field, FocusTrigger::Programmatic).unwrap();
///
/// let dump = FocusTreeDebug::new(&focus).format(&tree, window).unwrap();
/// assert!(dump.contains("field [tab 0] <keyboard>"));
/// ```
#[derive(Debug)]
pub struct FocusTreeDebug<'a> {
    manager: &'a FocusManager,
    options: TreeFormatOptions,
}

impl<'a> FocusTreeDebug<'a> {
    /// Create a formatter with default options.
    pub fn new(manager: &'a FocusManager) -> Self {
        Self {
            manager,
            options: TreeFormatOptions::default(),
        }
    }

    /// Use custom tree options.
    pub fn with_options(mut self, options: TreeFormatOptions) -> Self {
        self.options = options;
        self
    }

    /// Format the window's tree.
    pub fn format(&self, tree: &NodeTree, window: WindowId) -> Result<String> {
        let manager = self.manager;
        if !manager.windows().contains(&window) {
            return Err(FocusError::UnknownWindow(window));
        }
        let root = tree.window_root(window)?;
        let keyboard = manager.keyboard_focus(window);
        let pointer = manager.pointer_focus(window);

        let output = TreeDebug::with_options(self.options.clone())
            .annotate(move |node| {
                let mut marks = Vec::new();
                if let Some((position, autofocus)) = manager.field_annotation(node) {
                    marks.push(format!("[tab {position}]"));
                    if autofocus {
                        marks.push("[autofocus]".to_string());
                    }
                }
                if keyboard == Some(node) {
                    marks.push("<keyboard>".to_string());
                }
                if pointer == Some(node) {
                    marks.push("<pointer>".to_string());
                }
                if manager.labels().is_disabled(node) {
                    marks.push("(label disabled)".to_string());
                }
                (!marks.is_empty()).then(|| marks.join(" "))
            })
            .format_subtree(tree, root)?;
        Ok(output)
    }
}
