//! The DFS tree-iterator contract the select engine consumes.
//!
//! The concrete accessibility-tree walk is an external collaborator (the
//! platform's UI dump); this trait specifies only the operations the
//! select engine needs, mirroring `ElementNodeIterator`.

use crate::types::{Rect, Widget};

/// Produces widgets from a single accessibility-tree dump in DFS
/// (pre-order, children left-to-right) order.
pub trait TreeIterator {
    /// Advances to the next node in full DFS order, filling `widget`.
    /// Returns `false` once the dump is exhausted.
    fn dfs_next(&mut self, widget: &mut Widget) -> bool;

    /// Like [`TreeIterator::dfs_next`], but stops advancing once the walk
    /// ascends above the anchor node that was current when the `withIn`
    /// strategy last called [`TreeIterator::reset_node_index_to_anchor`].
    fn dfs_next_within_target(&mut self, widget: &mut Widget) -> bool;

    /// Saves the current position as the anchor, and positions the
    /// iterator so the next [`TreeIterator::dfs_next_within_target`] call
    /// starts walking the anchor's subtree.
    fn reset_node_index_to_anchor(&mut self);

    /// Restores the position last saved by
    /// [`TreeIterator::reset_node_index_to_anchor`]. The `withIn` strategy
    /// does not call this: it leaves the cursor at the last in-subtree
    /// node so the outer `dfs_next` resumes past the anchor's subtree
    /// instead of re-walking it.
    fn restore_node_index_by_anchor(&mut self);

    /// Clears any saved "within target" bound, re-enabling full DFS via
    /// [`TreeIterator::dfs_next`].
    fn clear_dfs_next(&mut self);

    /// Writes the bounds of the nearest ancestor of the current node whose
    /// type is a known container type, or the window bounds if none.
    fn get_parent_container_bounds(&self) -> Rect;

    /// If the current node is a container type, caches its refreshed
    /// bounds for descendants' [`TreeIterator::get_parent_container_bounds`]
    /// lookups.
    fn check_and_update_container_rect_map(&mut self, refreshed: Rect);

    /// Marks the current node invisible, causing its subtree to be
    /// skipped by subsequent `dfs_next*` calls.
    fn remove_invisible_widget(&mut self);
}
