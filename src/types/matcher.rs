//! Widget attribute matchers.

use super::widget::{AttrTag, Widget};
use serde::{Deserialize, Serialize};

/// String-comparison mode for a [`WidgetMatchModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchPattern {
    /// Exact equality.
    Eq,
    /// Substring containment.
    Contains,
    /// Prefix match.
    StartsWith,
    /// Suffix match.
    EndsWith,
}

impl MatchPattern {
    /// Evaluates `pattern` of `expected` against `actual`.
    #[must_use]
    pub fn evaluate(self, actual: &str, expected: &str) -> bool {
        match self {
            Self::Eq => actual == expected,
            Self::Contains => actual.contains(expected),
            Self::StartsWith => actual.starts_with(expected),
            Self::EndsWith => actual.ends_with(expected),
        }
    }
}

/// One `(attrTag, value, pattern)` predicate against a widget attribute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WidgetMatchModel {
    /// The attribute tag to read from the widget.
    pub attr: AttrTag,
    /// The value to compare against.
    pub value: String,
    /// The comparison mode.
    pub pattern: MatchPattern,
}

impl WidgetMatchModel {
    /// Builds a new matcher.
    #[must_use]
    pub fn new(attr: AttrTag, value: impl Into<String>, pattern: MatchPattern) -> Self {
        Self {
            attr,
            value: value.into(),
            pattern,
        }
    }

    /// Evaluates this matcher against a widget. A widget missing the
    /// attribute never matches.
    #[must_use]
    pub fn matches(&self, widget: &Widget) -> bool {
        widget
            .attr(self.attr)
            .is_some_and(|actual| self.pattern.evaluate(actual, &self.value))
    }
}

/// Evaluates a conjunction of matchers (all must match).
#[must_use]
pub fn matches_all(matchers: &[WidgetMatchModel], widget: &Widget) -> bool {
    matchers.iter().all(|m| m.matches(widget))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eq_pattern_requires_exact_match() {
        let mut w = Widget::new();
        w.set_attr(AttrTag::Type, "Text");
        let m = WidgetMatchModel::new(AttrTag::Type, "Text", MatchPattern::Eq);
        assert!(m.matches(&w));
        let m2 = WidgetMatchModel::new(AttrTag::Type, "Tex", MatchPattern::Eq);
        assert!(!m2.matches(&w));
    }

    #[test]
    fn contains_pattern() {
        let mut w = Widget::new();
        w.set_attr(AttrTag::Text, "hello world");
        let m = WidgetMatchModel::new(AttrTag::Text, "lo wo", MatchPattern::Contains);
        assert!(m.matches(&w));
    }

    #[test]
    fn missing_attr_never_matches() {
        let w = Widget::new();
        let m = WidgetMatchModel::new(AttrTag::Text, "", MatchPattern::Contains);
        assert!(!m.matches(&w));
    }
}
