//! Tabs through two windows and prints every focus event.
//!
//! Run with `RUST_LOG=horizon_focus=trace` to see the engine's own logging.

use std::collections::HashMap;

use horizon_focus::{FocusConfig, FocusManager, FocusTreeDebug, Key, KeyboardModifiers};
use horizon_focus_core::{NodeId, NodeTree, WindowId};
use tracing_subscriber::EnvFilter;

fn build_window(
    tree: &mut NodeTree,
    focus: &mut FocusManager,
    names: &mut HashMap<NodeId, String>,
    name: &str,
    fields: &[&str],
) -> WindowId {
    let (window, root) = tree.create_window(name);
    focus.add_window(window);
    let group = tree.add_child(root, "group").expect("window root exists");
    names.insert(root, name.to_string());
    names.insert(group, format!("{name}/group"));
    for &field in fields {
        let node = tree.add_child(group, field).expect("group exists");
        focus.register_field(tree, node).expect("window is managed");
        names.insert(node, field.to_string());
    }
    window
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut tree = NodeTree::new();
    let mut focus = FocusManager::with_config(FocusConfig::new().with_trace_events(true));

    let mut names = HashMap::new();
    let login = build_window(
        &mut tree,
        &mut focus,
        &mut names,
        "login",
        &["user", "password", "submit"],
    );
    let help = build_window(&mut tree, &mut focus, &mut names, "help", &["search", "close"]);

    focus.set_keyboard_reporter(move |node, change, trigger| {
        let name = names.get(&node).map(String::as_str).unwrap_or("?");
        println!("  {name:<12} {change:<24} ({trigger:?})");
    });

    let mut window = login;
    for step in 1..=6 {
        println!("Tab #{step}");
        focus
            .handle_key(&tree, window, Key::Tab, KeyboardModifiers::NONE)
            .expect("window is managed");
        if focus.keyboard_focus(help).is_some() {
            window = help;
        }
    }

    println!("Shift+Tab");
    focus
        .handle_key(&tree, window, Key::Tab, KeyboardModifiers::SHIFT)
        .expect("window is managed");

    for window in [login, help] {
        let dump = FocusTreeDebug::new(&focus)
            .format(&tree, window)
            .expect("window is managed");
        println!("{dump}");
    }
}
