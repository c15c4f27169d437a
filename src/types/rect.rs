//! Axis-aligned pixel rectangles and the overlay-occlusion algorithm used
//! by the select engine's visibility refresh.

use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle in pixel coordinates.
///
/// Invariant: callers are expected to maintain `right >= left` and
/// `bottom >= top`; [`Rect::empty`] satisfies this trivially with all
/// fields zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge, inclusive.
    pub left: i32,
    /// Top edge, inclusive.
    pub top: i32,
    /// Right edge, exclusive upper bound.
    pub right: i32,
    /// Bottom edge, exclusive upper bound.
    pub bottom: i32,
}

impl Rect {
    /// The empty rectangle (all coordinates zero).
    pub const EMPTY: Self = Self {
        left: 0,
        top: 0,
        right: 0,
        bottom: 0,
    };

    /// Builds a rect from its four edges.
    #[must_use]
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// The empty rectangle.
    #[must_use]
    pub const fn empty() -> Self {
        Self::EMPTY
    }

    /// Width in pixels; zero if degenerate.
    #[must_use]
    pub const fn width(self) -> i32 {
        if self.right > self.left {
            self.right - self.left
        } else {
            0
        }
    }

    /// Height in pixels; zero if degenerate.
    #[must_use]
    pub const fn height(self) -> i32 {
        if self.bottom > self.top {
            self.bottom - self.top
        } else {
            0
        }
    }

    /// True when the rect has zero area.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Intersection with `other`; returns [`Rect::EMPTY`] if disjoint.
    #[must_use]
    pub fn intersect(self, other: Self) -> Self {
        let left = self.left.max(other.left);
        let top = self.top.max(other.top);
        let right = self.right.min(other.right);
        let bottom = self.bottom.min(other.bottom);
        if right <= left || bottom <= top {
            Self::EMPTY
        } else {
            Self::new(left, top, right, bottom)
        }
    }

    /// True iff `self` and `other` share any area.
    #[must_use]
    pub fn overlaps(self, other: Self) -> bool {
        !self.intersect(other).is_empty()
    }

    /// Computes the maximum sub-rectangle of `self` not covered by any of
    /// `overlays`. When several candidate regions are produced by cutting
    /// around each overlay, the largest by area is kept, matching
    /// `RectAlgorithm::ComputeMaxVisibleRegion`'s "best remaining slice"
    /// semantics. Returns `Rect::EMPTY` if `self` itself is empty, or if a
    /// fully-covering overlay leaves no visible area.
    #[must_use]
    pub fn max_visible_region(self, overlays: &[Self]) -> Self {
        if self.is_empty() {
            return Self::EMPTY;
        }
        let mut candidates = vec![self];
        for overlay in overlays {
            let mut next = Vec::with_capacity(candidates.len());
            for candidate in candidates {
                next.extend(candidate.subtract(*overlay));
            }
            candidates = next;
            if candidates.is_empty() {
                return Self::EMPTY;
            }
        }
        candidates
            .into_iter()
            .max_by_key(|r| i64::from(r.width()) * i64::from(r.height()))
            .unwrap_or(Self::EMPTY)
    }

    /// Splits `self` into the (up to four) axis-aligned rectangles that
    /// remain after removing the area covered by `cutter`. Returns `self`
    /// unchanged, as a single-element result, when there is no overlap.
    fn subtract(self, cutter: Self) -> Vec<Self> {
        let overlap = self.intersect(cutter);
        if overlap.is_empty() {
            return vec![self];
        }
        if overlap == self {
            return Vec::new();
        }
        let mut pieces = Vec::with_capacity(4);
        if overlap.top > self.top {
            pieces.push(Self::new(self.left, self.top, self.right, overlap.top));
        }
        if overlap.bottom < self.bottom {
            pieces.push(Self::new(self.left, overlap.bottom, self.right, self.bottom));
        }
        if overlap.left > self.left {
            pieces.push(Self::new(self.left, overlap.top, overlap.left, overlap.bottom));
        }
        if overlap.right < self.right {
            pieces.push(Self::new(overlap.right, overlap.top, self.right, overlap.bottom));
        }
        pieces
    }

    /// Parses the original wire format `"[left,top][right,bottom]"`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (first, second) = raw.split_once("][")?;
        let first = first.strip_prefix('[')?;
        let second = second.strip_suffix(']')?;
        let (left, top) = first.split_once(',')?;
        let (right, bottom) = second.split_once(',')?;
        Some(Self::new(
            left.trim().parse().ok()?,
            top.trim().parse().ok()?,
            right.trim().parse().ok()?,
            bottom.trim().parse().ok()?,
        ))
    }

    /// Renders the original wire format `"[left,top][right,bottom]"`.
    #[must_use]
    pub fn render(self) -> String {
        format!("[{},{}][{},{}]", self.left, self.top, self.right, self.bottom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersect_disjoint_is_empty() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(20, 20, 30, 30);
        assert!(a.intersect(b).is_empty());
    }

    #[test]
    fn intersect_overlapping() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, 5, 15, 15);
        assert_eq!(a.intersect(b), Rect::new(5, 5, 10, 10));
    }

    #[test]
    fn max_visible_region_no_overlays_returns_self() {
        let r = Rect::new(0, 0, 100, 100);
        assert_eq!(r.max_visible_region(&[]), r);
    }

    #[test]
    fn max_visible_region_fully_covered_is_empty() {
        let r = Rect::new(0, 0, 100, 100);
        let overlay = Rect::new(0, 0, 200, 200);
        assert!(r.max_visible_region(&[overlay]).is_empty());
    }

    #[test]
    fn max_visible_region_picks_largest_remaining_slice() {
        // Overlay covers the left half; the remaining visible region should
        // be the right half.
        let r = Rect::new(0, 0, 100, 100);
        let overlay = Rect::new(0, 0, 50, 100);
        let visible = r.max_visible_region(&[overlay]);
        assert_eq!(visible, Rect::new(50, 0, 100, 100));
    }

    #[test]
    fn round_trip_wire_format() {
        let r = Rect::new(1, 2, 3, 4);
        let rendered = r.render();
        assert_eq!(rendered, "[1,2][3,4]");
        assert_eq!(Rect::parse(&rendered), Some(r));
    }
}
