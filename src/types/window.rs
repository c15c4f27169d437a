//! Window metadata consumed by visibility refresh.

use super::rect::Rect;
use serde::{Deserialize, Serialize};

/// One window on the device's display stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    /// Platform window id.
    pub id: i32,
    /// Z-order layer; higher draws on top.
    pub layer: i32,
    /// The window's own bounds.
    pub bounds: Rect,
    /// Bounds of overlay windows above this one that may occlude it.
    pub invisible_bounds: Vec<Rect>,
    /// Owning application bundle name.
    pub bundle_name: String,
}

impl Window {
    /// Builds a window with no overlays.
    #[must_use]
    pub fn new(id: i32, layer: i32, bounds: Rect, bundle_name: impl Into<String>) -> Self {
        Self {
            id,
            layer,
            bounds,
            invisible_bounds: Vec::new(),
            bundle_name: bundle_name.into(),
        }
    }

    /// Adds an overlay-occlusion rectangle, builder-style.
    #[must_use]
    pub fn with_overlay(mut self, overlay: Rect) -> Self {
        self.invisible_bounds.push(overlay);
        self
    }
}
