//! The widget-selection engine: tree iteration, visibility refresh, and
//! the five selector strategies.

pub mod iterator;
pub mod slice_iterator;
pub mod strategy;
pub mod visibility;

pub use iterator::TreeIterator;
pub use slice_iterator::SliceTreeIterator;
pub use strategy::{Strategy, compile};

use crate::types::{Selector, Widget, Window};

/// Walks `iterator` to completion, refreshing visibility against `window`
/// and running the compiled strategy over the resulting DFS dump.
///
/// Fills `visited` with every widget walked (after visibility refresh) and
/// returns the indices into `visited` that the strategy selected, in DFS
/// order. When `is_remove_invisible` is true (the normal case), invisible
/// subtrees are pruned from the walk via `remove_invisible_widget` and
/// never appear in `visited`.
pub fn locate_node(
    window: &Window,
    iterator: &mut dyn TreeIterator,
    selector: &Selector,
    is_remove_invisible: bool,
) -> (Vec<Widget>, Vec<usize>) {
    let mut visited = Vec::new();
    let strategy = compile(selector);
    strategy.run(window, iterator, is_remove_invisible, &mut visited)
}
