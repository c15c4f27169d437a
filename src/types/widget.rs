//! Accessibility-tree node representation.

use super::rect::Rect;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The fixed set of recognized widget attribute tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AttrTag {
    /// Accessibility id assigned by the host framework.
    AccessibilityId,
    /// Developer-assigned id.
    Id,
    /// Developer-assigned key.
    Key,
    /// Structural hash of the node's identity-bearing fields.
    HashCode,
    /// Visible text content.
    Text,
    /// Widget type name (e.g. "Text", "Scroll", "List").
    Type,
    /// Owning application bundle name.
    BundleName,
    /// Refreshed, occlusion-adjusted bounds.
    Bounds,
    /// Bounds as reported by the tree provider, before visibility refresh.
    OrigBounds,
    /// `"true"` / `"false"`.
    Enabled,
    /// `"true"` / `"false"`.
    Focused,
    /// `"true"` / `"false"`.
    Selected,
    /// `"true"` / `"false"`.
    Clickable,
    /// `"true"` / `"false"`.
    LongClickable,
    /// `"true"` / `"false"`.
    Scrollable,
    /// `"true"` / `"false"`.
    Checkable,
    /// `"true"` / `"false"`.
    Checked,
    /// `"true"` / `"false"`; set by visibility refresh.
    Visible,
    /// Id of the window that owns this node.
    HostWindowId,
    /// DFS path from the dump root, e.g. `"ROOT,0,2"`.
    Hierarchy,
}

/// One node of a single accessibility-tree dump.
///
/// `hierarchy` uniquely identifies the node within the dump it came from;
/// `bounds` is expected to be a subset of `orig_bounds` once visibility
/// refresh has run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Widget {
    attrs: BTreeMap<AttrTag, String>,
}

impl Widget {
    /// An empty widget with no attributes set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a raw attribute string.
    #[must_use]
    pub fn attr(&self, tag: AttrTag) -> Option<&str> {
        self.attrs.get(&tag).map(String::as_str)
    }

    /// Sets a raw attribute string.
    pub fn set_attr(&mut self, tag: AttrTag, value: impl Into<String>) -> &mut Self {
        self.attrs.insert(tag, value.into());
        self
    }

    /// The DFS hierarchy path, or `"ROOT"` if unset.
    #[must_use]
    pub fn hierarchy(&self) -> &str {
        self.attr(AttrTag::Hierarchy).unwrap_or("ROOT")
    }

    /// Sets the DFS hierarchy path.
    pub fn set_hierarchy(&mut self, path: impl Into<String>) -> &mut Self {
        self.set_attr(AttrTag::Hierarchy, path)
    }

    /// The refreshed visible bounds, or [`Rect::EMPTY`] if unset/unparsable.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        self.attr(AttrTag::Bounds)
            .and_then(Rect::parse)
            .unwrap_or(Rect::EMPTY)
    }

    /// Writes the refreshed visible bounds.
    pub fn set_bounds(&mut self, rect: Rect) -> &mut Self {
        self.set_attr(AttrTag::Bounds, rect.render())
    }

    /// The pre-refresh bounds as reported by the tree provider.
    #[must_use]
    pub fn orig_bounds(&self) -> Rect {
        self.attr(AttrTag::OrigBounds)
            .and_then(Rect::parse)
            .unwrap_or(Rect::EMPTY)
    }

    /// Writes the pre-refresh bounds.
    pub fn set_orig_bounds(&mut self, rect: Rect) -> &mut Self {
        self.set_attr(AttrTag::OrigBounds, rect.render())
    }

    /// Whether the node is currently marked visible. Absent ⇒ visible,
    /// matching the original tree provider's default for freshly-dumped
    /// nodes prior to the first visibility refresh pass.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.attr(AttrTag::Visible).is_none_or(|v| v == "true")
    }

    /// Sets the `visible` attribute.
    pub fn set_visible(&mut self, visible: bool) -> &mut Self {
        self.set_attr(AttrTag::Visible, if visible { "true" } else { "false" })
    }

    /// The widget's type name, or empty string if unset.
    #[must_use]
    pub fn type_name(&self) -> &str {
        self.attr(AttrTag::Type).unwrap_or_default()
    }

    /// True iff `hierarchy` is an ancestor-or-self prefix of `other`, i.e.
    /// `other` equals `self.hierarchy()` or starts with
    /// `"<hierarchy>,"`. Used by the `withIn` and `complex` strategies to
    /// test subtree membership.
    #[must_use]
    pub fn is_ancestor_of_hierarchy(&self, other: &str) -> bool {
        let h = self.hierarchy();
        other == h || other.starts_with(&format!("{h},"))
    }
}

impl fmt::Display for Widget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Widget(hierarchy={}, type={}, text={:?})",
            self.hierarchy(),
            self.type_name(),
            self.attr(AttrTag::Text)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_widget_defaults_to_root_and_visible() {
        let w = Widget::new();
        assert_eq!(w.hierarchy(), "ROOT");
        assert!(w.is_visible());
    }

    #[test]
    fn ancestor_prefix_matches_self_and_descendants() {
        let mut w = Widget::new();
        w.set_hierarchy("ROOT,0");
        assert!(w.is_ancestor_of_hierarchy("ROOT,0"));
        assert!(w.is_ancestor_of_hierarchy("ROOT,0,3"));
        assert!(!w.is_ancestor_of_hierarchy("ROOT,01"));
        assert!(!w.is_ancestor_of_hierarchy("ROOT,1"));
    }

    #[test]
    fn bounds_round_trip_through_attr_string() {
        let mut w = Widget::new();
        w.set_bounds(Rect::new(1, 2, 3, 4));
        assert_eq!(w.bounds(), Rect::new(1, 2, 3, 4));
    }
}
