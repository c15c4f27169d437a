//! An in-memory [`TreeIterator`] over an explicit DFS dump.
//!
//! Lets the select engine and its five strategies be exercised without a
//! live accessibility tree: callers build a `Vec<Widget>` already in DFS
//! order (as a platform dump would deliver it) with `hierarchy` and
//! `type` attributes set, and this iterator supplies the rest of the
//! contract (container-bounds lookup, within-subtree bounding, subtree
//! pruning) over that slice.

use super::iterator::TreeIterator;
use crate::types::widget::AttrTag;
use crate::types::{Rect, Widget};
use std::collections::{HashMap, HashSet};

/// Widget type names treated as "containers" for visibility refresh and
/// parent-bounds lookup purposes.
pub const CONTAINER_TYPES: &[&str] = &["Scroll", "List", "Grid", "Tabs", "SwipeView"];

/// True iff `type_name` is a recognized container type.
#[must_use]
pub fn is_container_type(type_name: &str) -> bool {
    CONTAINER_TYPES.contains(&type_name)
}

/// A DFS-ordered, in-memory accessibility-tree dump.
pub struct SliceTreeIterator {
    nodes: Vec<Widget>,
    hierarchy_index: HashMap<String, usize>,
    container_rects: HashMap<String, Rect>,
    window_bounds: Rect,
    invisible_prefixes: HashSet<String>,
    current: Option<usize>,
    anchor: Option<usize>,
    within_bound: Option<String>,
}

impl SliceTreeIterator {
    /// Builds an iterator over `nodes`, which must already be in DFS
    /// pre-order with each widget's `hierarchy` attribute set.
    #[must_use]
    pub fn new(nodes: Vec<Widget>, window_bounds: Rect) -> Self {
        let hierarchy_index = nodes
            .iter()
            .enumerate()
            .map(|(i, w)| (w.hierarchy().to_string(), i))
            .collect();
        Self {
            nodes,
            hierarchy_index,
            container_rects: HashMap::new(),
            window_bounds,
            invisible_prefixes: HashSet::new(),
            current: None,
            anchor: None,
            within_bound: None,
        }
    }

    fn is_under_invisible(&self, hierarchy: &str) -> bool {
        self.invisible_prefixes.iter().any(|prefix| {
            hierarchy == prefix || hierarchy.starts_with(&format!("{prefix},"))
        })
    }

    fn advance_from(&self, start: usize) -> Option<usize> {
        let mut idx = start;
        while idx < self.nodes.len() {
            let hierarchy = self.nodes[idx].hierarchy();
            if !self.is_under_invisible(hierarchy) {
                return Some(idx);
            }
            idx += 1;
        }
        None
    }

    fn parent_hierarchy(hierarchy: &str) -> Option<&str> {
        hierarchy.rsplit_once(',').map(|(parent, _)| parent)
    }
}

impl TreeIterator for SliceTreeIterator {
    fn dfs_next(&mut self, widget: &mut Widget) -> bool {
        let start = self.current.map_or(0, |i| i + 1);
        match self.advance_from(start) {
            Some(idx) => {
                self.current = Some(idx);
                *widget = self.nodes[idx].clone();
                true
            }
            None => false,
        }
    }

    fn dfs_next_within_target(&mut self, widget: &mut Widget) -> bool {
        let start = self.current.map_or(0, |i| i + 1);
        let Some(idx) = self.advance_from(start) else {
            return false;
        };
        if let Some(bound) = &self.within_bound {
            let hierarchy = self.nodes[idx].hierarchy();
            if !(hierarchy == bound || hierarchy.starts_with(&format!("{bound},"))) {
                return false;
            }
        }
        self.current = Some(idx);
        *widget = self.nodes[idx].clone();
        true
    }

    fn reset_node_index_to_anchor(&mut self) {
        self.anchor = self.current;
        self.within_bound = self.current.map(|i| self.nodes[i].hierarchy().to_string());
    }

    fn restore_node_index_by_anchor(&mut self) {
        self.current = self.anchor;
    }

    fn clear_dfs_next(&mut self) {
        self.within_bound = None;
        self.anchor = None;
    }

    fn get_parent_container_bounds(&self) -> Rect {
        let Some(idx) = self.current else {
            return self.window_bounds;
        };
        let mut hierarchy = self.nodes[idx].hierarchy();
        while let Some(parent) = Self::parent_hierarchy(hierarchy) {
            if let Some(&parent_idx) = self.hierarchy_index.get(parent) {
                if is_container_type(self.nodes[parent_idx].type_name()) {
                    if let Some(rect) = self.container_rects.get(parent) {
                        return *rect;
                    }
                    return self.nodes[parent_idx].bounds();
                }
            }
            hierarchy = parent;
        }
        self.window_bounds
    }

    fn check_and_update_container_rect_map(&mut self, refreshed: Rect) {
        if let Some(idx) = self.current {
            if is_container_type(self.nodes[idx].type_name()) {
                self.container_rects
                    .insert(self.nodes[idx].hierarchy().to_string(), refreshed);
            }
        }
    }

    fn remove_invisible_widget(&mut self) {
        if let Some(idx) = self.current {
            self.invisible_prefixes
                .insert(self.nodes[idx].hierarchy().to_string());
        }
    }
}

/// Builds a widget with `hierarchy`, `type`, and `text` set, and
/// `orig_bounds`/`bounds` both set to `bounds` (pre-refresh).
#[must_use]
pub fn make_widget(hierarchy: &str, type_name: &str, text: &str, bounds: Rect) -> Widget {
    let mut w = Widget::new();
    w.set_hierarchy(hierarchy);
    w.set_attr(AttrTag::Type, type_name);
    w.set_attr(AttrTag::Text, text);
    w.set_orig_bounds(bounds);
    w.set_bounds(bounds);
    w
}
