//! The `Selector` value: self-matchers plus up to three locator lists.

use super::matcher::WidgetMatchModel;
use serde::{Deserialize, Serialize};

/// One anchor specification: a conjunction of matchers describing a single
/// anchor widget.
pub type AnchorMatchers = Vec<WidgetMatchModel>;

/// A widget selector: self-matchers plus structural locators.
///
/// Each locator list (`after_anchors`, `before_anchors`, `within_anchors`)
/// is a list of anchor specifications; having more than one anchor
/// specification in a list means the target must satisfy the locator
/// relative to *every* anchor in that list (AND semantics across anchors,
/// matching the original's conjunctive locator-list contract).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Selector {
    /// Matchers the target widget itself must satisfy.
    pub self_matchers: Vec<WidgetMatchModel>,
    /// Anchors the target must come after, in DFS order.
    pub after_anchors: Vec<AnchorMatchers>,
    /// Anchors the target must come before, in DFS order.
    pub before_anchors: Vec<AnchorMatchers>,
    /// Anchors whose subtree the target must lie within.
    pub within_anchors: Vec<AnchorMatchers>,
    /// When false, only the first DFS-order match is returned.
    pub want_multi: bool,
}

impl Selector {
    /// Builds an empty selector (no self-matchers, no locators).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a self-matcher, builder-style.
    #[must_use]
    pub fn with_self_matcher(mut self, matcher: WidgetMatchModel) -> Self {
        self.self_matchers.push(matcher);
        self
    }

    /// Adds an `isAfter` anchor, builder-style.
    #[must_use]
    pub fn with_after_anchor(mut self, anchor: AnchorMatchers) -> Self {
        self.after_anchors.push(anchor);
        self
    }

    /// Adds an `isBefore` anchor, builder-style.
    #[must_use]
    pub fn with_before_anchor(mut self, anchor: AnchorMatchers) -> Self {
        self.before_anchors.push(anchor);
        self
    }

    /// Adds a `withIn` anchor, builder-style.
    #[must_use]
    pub fn with_within_anchor(mut self, anchor: AnchorMatchers) -> Self {
        self.within_anchors.push(anchor);
        self
    }

    /// Sets `want_multi`, builder-style.
    #[must_use]
    pub const fn wanting_multi(mut self, want_multi: bool) -> Self {
        self.want_multi = want_multi;
        self
    }
}
