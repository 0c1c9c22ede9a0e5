//! Tab order and directional traversal through the focus manager.

use horizon_focus::{
    Direction, FocusConfig, FocusError, FocusManager, FocusTrigger, Key, KeyboardModifiers,
};
use horizon_focus_core::{NodeId, NodeTree, WindowId};

struct App {
    tree: NodeTree,
    focus: FocusManager,
}

impl App {
    fn new(config: FocusConfig) -> Self {
        Self {
            tree: NodeTree::new(),
            focus: FocusManager::with_config(config),
        }
    }

    fn window(&mut self, name: &str, fields: usize) -> (WindowId, Vec<NodeId>) {
        let (window, root) = self.tree.create_window(name);
        self.focus.add_window(window);
        let fields = (0..fields)
            .map(|i| {
                let node = self.tree.add_child(root, format!("{name}.{i}")).unwrap();
                self.focus.register_field(&self.tree, node).unwrap();
                node
            })
            .collect();
        (window, fields)
    }

    fn tab(&mut self, window: WindowId) -> Option<NodeId> {
        self.focus.focus_next(&self.tree, window).unwrap()
    }
}

#[test]
fn relocation_is_visible_to_forward_scan() {
    let mut app = App::new(FocusConfig::default());
    let (window, f) = app.window("w", 4);

    app.focus.relocate_before(f[3], f[1]).unwrap();
    assert_eq!(app.focus.tab_order(window).unwrap().as_slice(), &[f[0], f[3], f[1], f[2]]);

    // The reverse call order produces the same adjacency.
    app.focus.relocate_after(f[0], f[3]).unwrap();
    let order = app.focus.tab_order(window).unwrap().as_slice().to_vec();
    let x = order.iter().position(|&n| n == f[3]).unwrap();
    assert_eq!(order[x + 1], f[0]);

    app.focus.set_focus(&app.tree, f[3], FocusTrigger::Programmatic).unwrap();
    assert_eq!(app.tab(window), Some(f[0]));
}

#[test]
fn list_relocation_keeps_given_order() {
    let mut app = App::new(FocusConfig::default());
    let (window, f) = app.window("w", 5);

    app.focus.relocate_list_after(f[0], &[f[4], f[2]]).unwrap();
    assert_eq!(
        app.focus.tab_order(window).unwrap().as_slice(),
        &[f[0], f[4], f[2], f[1], f[3]]
    );

    app.focus.relocate_list_before(f[0], &[f[3]]).unwrap();
    assert_eq!(app.focus.tab_order(window).unwrap().as_slice()[0], f[3]);
}

#[test]
fn reorder_errors_do_not_depend_on_argument_order() {
    let mut app = App::new(FocusConfig::default());
    let (first, a) = app.window("a", 1);
    let (_, b) = app.window("b", 1);

    let forward = app.focus.relocate_before(a[0], b[0]).unwrap_err();
    let backward = app.focus.relocate_before(b[0], a[0]).unwrap_err();
    assert!(matches!(forward, FocusError::CrossWindowReorder { .. }));
    assert!(matches!(backward, FocusError::CrossWindowReorder { .. }));

    let root = app.tree.window_root(first).unwrap();
    let stray = app.tree.add_child(root, "stray").unwrap();
    assert_eq!(app.focus.relocate_after(stray, a[0]), Err(FocusError::NotRegistered(stray)));
    assert_eq!(app.focus.relocate_after(a[0], stray), Err(FocusError::NotRegistered(stray)));
}

#[test]
fn traversal_moves_to_next_window_before_wrapping() {
    let mut app = App::new(FocusConfig::default());
    let (first, a) = app.window("first", 2);
    let (second, b) = app.window("second", 2);

    app.focus.set_focus(&app.tree, a[1], FocusTrigger::Programmatic).unwrap();
    assert_eq!(app.tab(first), Some(b[0]));
    assert_eq!(app.focus.keyboard_focus(first), None);
    assert_eq!(app.focus.keyboard_focus(second), Some(b[0]));

    // The last window has nowhere to go and wraps inside itself.
    app.focus.set_focus(&app.tree, b[1], FocusTrigger::Programmatic).unwrap();
    assert_eq!(app.tab(second), Some(b[0]));
}

#[test]
fn traversal_backward_visits_earlier_windows() {
    let mut app = App::new(FocusConfig::default());
    let (_, a) = app.window("first", 2);
    let (second, b) = app.window("second", 2);

    app.focus.set_focus(&app.tree, b[0], FocusTrigger::Programmatic).unwrap();
    assert_eq!(app.focus.focus_previous(&app.tree, second).unwrap(), Some(a[1]));
}

#[test]
fn window_local_traversal_wraps_immediately() {
    let mut app = App::new(FocusConfig::window_local());
    let (first, a) = app.window("first", 2);
    app.window("second", 2);

    app.focus.set_focus(&app.tree, a[1], FocusTrigger::Programmatic).unwrap();
    assert_eq!(app.tab(first), Some(a[0]));
}

#[test]
fn hidden_window_is_skipped() {
    let mut app = App::new(FocusConfig::default());
    let (first, a) = app.window("first", 1);
    let (second, _) = app.window("second", 1);
    let (_, c) = app.window("third", 1);
    let root = app.tree.window_root(second).unwrap();
    app.tree.set_visible(root, false).unwrap();

    app.focus.set_focus(&app.tree, a[0], FocusTrigger::Programmatic).unwrap();
    assert_eq!(app.tab(first), Some(c[0]));
}

#[test]
fn exhaustion_clears_focus() {
    let mut app = App::new(FocusConfig::default());
    let (window, f) = app.window("w", 2);
    app.focus.set_focus(&app.tree, f[0], FocusTrigger::Programmatic).unwrap();
    let root = app.tree.window_root(window).unwrap();
    app.tree.set_enabled(root, false).unwrap();

    assert_eq!(app.tab(window), None);
    assert_eq!(app.focus.keyboard_focus(window), None);
}

#[test]
fn removing_focused_field_never_leaves_stale_holder() {
    let mut app = App::new(FocusConfig::default());
    let (window, f) = app.window("w", 3);

    for &field in &f {
        app.focus.set_focus(&app.tree, field, FocusTrigger::Programmatic).unwrap();
        app.focus.remove_field(&app.tree, field);
        assert_ne!(app.focus.keyboard_focus(window), Some(field));
        app.tree.destroy(field).unwrap();
    }
    assert_eq!(app.focus.keyboard_focus(window), None);
    assert!(app.focus.tab_order(window).unwrap().is_empty());
}

#[test]
fn detaching_a_container_removes_its_fields() {
    let mut app = App::new(FocusConfig::default());
    let (window, root) = app.tree.create_window("w");
    app.focus.add_window(window);
    let group = app.tree.add_child(root, "group").unwrap();
    let inner = app.tree.add_child(group, "inner").unwrap();
    let outer = app.tree.add_child(root, "outer").unwrap();
    for node in [inner, outer] {
        app.focus.register_field(&app.tree, node).unwrap();
    }
    app.focus.set_focus(&app.tree, inner, FocusTrigger::Programmatic).unwrap();

    app.focus.detach(&app.tree, group);
    app.tree.destroy(group).unwrap();

    assert!(!app.focus.is_field(inner));
    assert_eq!(app.focus.keyboard_focus(window), Some(outer));
    assert_eq!(app.focus.tab_order(window).unwrap().as_slice(), &[outer]);
}

#[test]
fn keyboard_navigation_keys() {
    let mut app = App::new(FocusConfig::default());
    let (window, f) = app.window("w", 3);
    let tree = &app.tree;

    app.focus.handle_key(tree, window, Key::from_keysym(0xff09), KeyboardModifiers::NONE).unwrap();
    app.focus.handle_key(tree, window, Key::Tab, KeyboardModifiers::NONE).unwrap();
    assert_eq!(app.focus.keyboard_focus(window), Some(f[1]));

    app.focus.handle_key(tree, window, Key::from_keysym(0xfe20), KeyboardModifiers::SHIFT).unwrap();
    assert_eq!(app.focus.keyboard_focus(window), Some(f[0]));

    app.focus.focus_last(tree, window, FocusTrigger::Shortcut).unwrap();
    assert_eq!(app.focus.keyboard_focus(window), Some(f[2]));
    app.focus.focus_first(tree, window, FocusTrigger::Shortcut).unwrap();
    assert_eq!(app.focus.keyboard_focus(window), Some(f[0]));

    assert_eq!(
        app.focus.advance(tree, window, Direction::Previous, FocusTrigger::Backtab).unwrap(),
        Some(f[2])
    );
}

#[test]
fn holder_moved_to_another_window_is_dropped() {
    let mut app = App::new(FocusConfig::default());
    let (first, a) = app.window("first", 2);
    let (second, _) = app.window("second", 0);
    let other_root = app.tree.window_root(second).unwrap();

    app.focus.set_focus(&app.tree, a[0], FocusTrigger::Programmatic).unwrap();
    app.tree.set_parent(a[0], other_root).unwrap();

    app.focus.set_focus(&app.tree, a[1], FocusTrigger::Programmatic).unwrap();
    assert_eq!(app.focus.keyboard_focus(first), Some(a[1]));

    // The moved field stays in the first tab order but is never picked there.
    app.focus.clear_focus(&app.tree, first, FocusTrigger::Programmatic).unwrap();
    assert_eq!(app.tab(first), Some(a[1]));
    assert_eq!(app.tab(first), Some(a[1]));
    let picked = app.focus.focus_first(&app.tree, first, FocusTrigger::Shortcut).unwrap();
    assert_eq!(picked, Some(a[1]));
    assert_eq!(app.focus.keyboard_focus(second), None);
}
