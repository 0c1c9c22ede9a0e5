//! Logging and debugging facilities for Horizon Focus.
//!
//! This module provides:
//! - Fixed `tracing` targets for each focus subsystem
//! - Debug visualization of a node tree, optionally annotated with focus state
//! - Performance tracing hooks for profiling
//!
//! # Tracing Integration
//!
//! Horizon Focus uses the `tracing` crate for instrumentation. To see logs,
//! install a subscriber in your application:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("horizon_focus=trace")
//!     .init();
//! ```
//!
//! # Debug Visualization
//!
//! ```
//! use horizon_focus_core::{NodeTree, TreeDebug};
//!
//! let mut tree = NodeTree::new();
//! let (_, root) = tree.create_window("main");
//! tree.add_child(root, "ok").unwrap();
//!
//! let output = TreeDebug::new().format_subtree(&tree, root).unwrap();
//! assert!(output.contains("ok"));
//! ```

use std::fmt::Write as FmtWrite;

use crate::error::TreeResult;
use crate::tree::{NodeId, NodeTree};

/// Span names used throughout Horizon Focus for tracing.
pub mod span_names {
    /// A complete focus transition.
    pub const TRANSITION: &str = "horizon_focus::transition";
    /// Directional tab-order traversal.
    pub const ADVANCE: &str = "horizon_focus::advance";
    /// Draining requests marshaled from other threads.
    pub const MARSHAL: &str = "horizon_focus::marshal";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core framework target.
    pub const CORE: &str = "horizon_focus_core";
    /// Node tree target.
    pub const TREE: &str = "horizon_focus_core::tree";
    /// Signal target.
    pub const SIGNAL: &str = "horizon_focus_core::signal";
    /// Transition engine target.
    pub const ENGINE: &str = "horizon_focus::engine";
    /// Tab-order registry target.
    pub const TAB_ORDER: &str = "horizon_focus::tab_order";
    /// Delayed focus request target.
    pub const DELAYED: &str = "horizon_focus::delayed";
    /// Label link target.
    pub const LABEL: &str = "horizon_focus::label";
    /// Focus manager target.
    pub const MANAGER: &str = "horizon_focus::manager";
}

/// Style options for tree visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeStyle {
    /// ASCII characters for tree branches.
    Ascii,
    /// Unicode box-drawing characters.
    #[default]
    Unicode,
}

/// Configuration for tree debug output.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    /// The style of tree visualization.
    pub style: TreeStyle,
    /// Whether to show node IDs.
    pub show_ids: bool,
    /// Whether to mark disabled and hidden nodes.
    pub show_state: bool,
    /// Maximum depth to traverse (None for unlimited).
    pub max_depth: Option<usize>,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_ids: false,
            show_state: true,
            max_depth: None,
        }
    }
}

impl TreeFormatOptions {
    /// Options for detailed debugging output.
    pub fn detailed() -> Self {
        Self {
            show_ids: true,
            ..Default::default()
        }
    }
}

type Annotator<'a> = Box<dyn Fn(NodeId) -> Option<String> + 'a>;

/// Debug utility for visualizing a [`NodeTree`].
///
/// An optional annotator appends a tag to each node's line; the focus
/// manager uses it to mark focus holders and transient flags.
pub struct TreeDebug<'a> {
    options: TreeFormatOptions,
    annotator: Option<Annotator<'a>>,
}

impl std::fmt::Debug for TreeDebug<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeDebug")
            .field("options", &self.options)
            .field("annotated", &self.annotator.is_some())
            .finish()
    }
}

impl Default for TreeDebug<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> TreeDebug<'a> {
    /// Create a visualizer with default options.
    pub fn new() -> Self {
        Self::with_options(TreeFormatOptions::default())
    }

    /// Create a visualizer with custom options.
    pub fn with_options(options: TreeFormatOptions) -> Self {
        Self {
            options,
            annotator: None,
        }
    }

    /// Attach an annotator called once per node.
    pub fn annotate(mut self, annotator: impl Fn(NodeId) -> Option<String> + 'a) -> Self {
        self.annotator = Some(Box::new(annotator));
        self
    }

    /// Format the subtree rooted at `root`.
    pub fn format_subtree(&self, tree: &NodeTree, root: NodeId) -> TreeResult<String> {
        let mut output = String::new();
        self.format_into(tree, root, 0, &mut Vec::new(), &mut output)?;
        Ok(output)
    }

    fn format_into(
        &self,
        tree: &NodeTree,
        id: NodeId,
        depth: usize,
        last_flags: &mut Vec<bool>,
        output: &mut String,
    ) -> TreeResult<()> {
        if self.options.max_depth.is_some_and(|max| depth > max) {
            return Ok(());
        }

        let name = tree.name(id)?;
        output.push_str(&self.prefix(last_flags));
        output.push_str(if name.is_empty() { "(unnamed)" } else { name });

        if self.options.show_ids {
            let _ = write!(output, " [{id:?}]");
        }
        if self.options.show_state {
            if !tree.is_enabled(id) {
                output.push_str(" (disabled)");
            }
            if !tree.is_visible(id) {
                output.push_str(" (hidden)");
            }
        }
        if let Some(tag) = self.annotator.as_ref().and_then(|f| f(id)) {
            let _ = write!(output, " {tag}");
        }
        output.push('\n');

        let children = tree.children(id)?;
        let count = children.len();
        for (i, &child) in children.iter().enumerate() {
            last_flags.push(i + 1 == count);
            self.format_into(tree, child, depth + 1, last_flags, output)?;
            last_flags.pop();
        }
        Ok(())
    }

    fn prefix(&self, last_flags: &[bool]) -> String {
        let (pipe, tee, corner) = match self.options.style {
            TreeStyle::Ascii => ("|   ", "+-- ", "`-- "),
            TreeStyle::Unicode => (
                "\u{2502}   ",
                "\u{251c}\u{2500}\u{2500} ",
                "\u{2514}\u{2500}\u{2500} ",
            ),
        };
        let mut prefix = String::new();
        let Some((&is_last, parents)) = last_flags.split_last() else {
            return prefix;
        };
        for &parent_last in parents {
            prefix.push_str(if parent_last { "    " } else { pipe });
        }
        prefix.push_str(if is_last { corner } else { tee });
        prefix
    }
}

/// A guard that keeps a tracing span entered until dropped.
#[derive(Debug)]
pub struct PerfSpan {
    _span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Enter a new performance span.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::debug_span!(target: "horizon_focus::perf", "perf", operation = name);
        Self {
            _span: span.entered(),
        }
    }
}

/// Trace-level event on the core target.
#[macro_export]
macro_rules! focus_trace {
    ($($arg:tt)*) => {
        tracing::trace!(target: "horizon_focus_core", $($arg)*)
    };
}

/// Debug-level event on the core target.
#[macro_export]
macro_rules! focus_debug {
    ($($arg:tt)*) => {
        tracing::debug!(target: "horizon_focus_core", $($arg)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (NodeTree, NodeId, NodeId) {
        let mut tree = NodeTree::new();
        let (_, root) = tree.create_window("window");
        let a = tree.add_child(root, "a").unwrap();
        tree.add_child(a, "a1").unwrap();
        let b = tree.add_child(root, "b").unwrap();
        tree.set_enabled(b, false).unwrap();
        (tree, root, b)
    }

    #[test]
    fn test_format_unicode_layout() {
        let (tree, root, _) = sample();
        let output = TreeDebug::new().format_subtree(&tree, root).unwrap();
        let expected = "window\n\
                        \u{251c}\u{2500}\u{2500} a\n\
                        \u{2502}   \u{2514}\u{2500}\u{2500} a1\n\
                        \u{2514}\u{2500}\u{2500} b (disabled)\n";
        assert_eq!(output, expected);
    }

    #[test]
    fn test_format_ascii_with_annotation() {
        let (tree, root, b) = sample();
        let output = TreeDebug::with_options(TreeFormatOptions {
            style: TreeStyle::Ascii,
            show_state: false,
            ..Default::default()
        })
        .annotate(move |id| (id == b).then(|| "<focus>".to_string()))
        .format_subtree(&tree, root)
        .unwrap();
        assert_eq!(output, "window\n+-- a\n|   `-- a1\n`-- b <focus>\n");
    }

    #[test]
    fn test_format_max_depth() {
        let (tree, root, _) = sample();
        let output = TreeDebug::with_options(TreeFormatOptions {
            max_depth: Some(1),
            ..Default::default()
        })
        .format_subtree(&tree, root)
        .unwrap();
        assert!(output.contains("a\n"));
        assert!(!output.contains("a1"));
    }

    #[test]
    fn test_format_invalid_root() {
        let (mut tree, _, b) = sample();
        tree.destroy(b).unwrap();
        assert!(TreeDebug::new().format_subtree(&tree, b).is_err());
    }

    #[test]
    fn test_perf_span() {
        let _span = PerfSpan::new("test_operation");
    }
}
