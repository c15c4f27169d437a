//! Visibility refresh: intersecting a widget's raw bounds against window
//! bounds, its parent container, and overlay windows.

use crate::types::{Rect, Widget};

/// The outcome of refreshing one widget's bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshedBounds {
    /// The bounds to write back to the widget.
    pub bounds: Rect,
    /// Whether the widget should be marked visible.
    pub visible: bool,
}

/// Refreshes one widget's visible bounds per the four-step algorithm:
/// intersect with the window, intersect with the parent container (with
/// the collapsed-dimension container exception), subtract overlay
/// windows, and report the result.
///
/// A widget whose raw bounds already collapse to zero width or height
/// while its origin is non-negative is treated as an intentional
/// zero-size marker node (e.g. a layout spacer): it short-circuits
/// straight to visible with its original bounds preserved, without being
/// run through the window/parent/overlay intersection chain.
#[must_use]
pub fn refresh_widget_bounds(
    widget: &Widget,
    window_bounds: Rect,
    parent_bounds: Rect,
    parent_is_container: bool,
    overlays: &[Rect],
) -> RefreshedBounds {
    let raw = widget.orig_bounds();

    if (raw.width() == 0 || raw.height() == 0) && raw.left >= 0 && raw.top >= 0 {
        return RefreshedBounds {
            bounds: raw,
            visible: true,
        };
    }

    let window_clipped = raw.intersect(window_bounds);
    if window_clipped.is_empty() {
        return RefreshedBounds {
            bounds: Rect::EMPTY,
            visible: false,
        };
    }

    let parent_clipped = window_clipped.intersect(parent_bounds);
    if parent_clipped.is_empty() {
        if parent_is_container {
            // The parent-container intersection collapsed to zero, but the
            // widget was otherwise visible against the window: keep it
            // visible with its original bounds.
            return RefreshedBounds {
                bounds: raw,
                visible: true,
            };
        }
        return RefreshedBounds {
            bounds: Rect::EMPTY,
            visible: false,
        };
    }

    let visible_region = parent_clipped.max_visible_region(overlays);
    if visible_region.is_empty() {
        return RefreshedBounds {
            bounds: Rect::EMPTY,
            visible: false,
        };
    }
    RefreshedBounds {
        bounds: visible_region,
        visible: true,
    }
}
