//! Selector compilation and the five strategy walks.

use super::iterator::TreeIterator;
use super::visibility::refresh_widget_bounds;
use crate::types::matcher::matches_all;
use crate::types::selector::AnchorMatchers;
use crate::types::{Rect, Selector, Widget, Window};

/// A selector compiled to one of the five execution strategies.
#[derive(Debug, Clone)]
pub enum Strategy {
    /// No locators: every self-match is a target.
    Plain {
        self_matchers: Vec<crate::types::matcher::WidgetMatchModel>,
        want_multi: bool,
    },
    /// Exactly one `after` anchor, no other locators.
    IsAfter {
        self_matchers: Vec<crate::types::matcher::WidgetMatchModel>,
        anchor: AnchorMatchers,
        want_multi: bool,
    },
    /// Exactly one `before` anchor, no other locators.
    IsBefore {
        self_matchers: Vec<crate::types::matcher::WidgetMatchModel>,
        anchor: AnchorMatchers,
        want_multi: bool,
    },
    /// Exactly one `withIn` anchor, no other locators.
    WithIn {
        self_matchers: Vec<crate::types::matcher::WidgetMatchModel>,
        anchor: AnchorMatchers,
        want_multi: bool,
    },
    /// Any combination of locator lists.
    Complex { selector: Selector },
}

/// Compiles a [`Selector`] to its strategy per the fixed precedence: empty
/// locators ⇒ plain; a single locator of one kind alone ⇒ that kind's
/// dedicated strategy; anything else ⇒ complex.
#[must_use]
pub fn compile(selector: &Selector) -> Strategy {
    let after = &selector.after_anchors;
    let before = &selector.before_anchors;
    let within = &selector.within_anchors;

    if after.is_empty() && before.is_empty() && within.is_empty() {
        return Strategy::Plain {
            self_matchers: selector.self_matchers.clone(),
            want_multi: selector.want_multi,
        };
    }
    if after.len() == 1 && before.is_empty() && within.is_empty() {
        return Strategy::IsAfter {
            self_matchers: selector.self_matchers.clone(),
            anchor: after[0].clone(),
            want_multi: selector.want_multi,
        };
    }
    if before.len() == 1 && after.is_empty() && within.is_empty() {
        return Strategy::IsBefore {
            self_matchers: selector.self_matchers.clone(),
            anchor: before[0].clone(),
            want_multi: selector.want_multi,
        };
    }
    if within.len() == 1 && after.is_empty() && before.is_empty() {
        return Strategy::WithIn {
            self_matchers: selector.self_matchers.clone(),
            anchor: within[0].clone(),
            want_multi: selector.want_multi,
        };
    }
    Strategy::Complex {
        selector: selector.clone(),
    }
}

/// Refreshes the widget currently held by `iterator` and records it in
/// `visited` unless it turned out invisible and `is_remove_invisible` is
/// set, pruning its subtree in that case. Returns the refreshed widget and
/// whether it is visible.
fn refresh_and_record(
    window: &Window,
    iterator: &mut dyn TreeIterator,
    widget: Widget,
    is_remove_invisible: bool,
    visited: &mut Vec<Widget>,
) -> (Widget, bool) {
    let parent_bounds = iterator.get_parent_container_bounds();
    let parent_is_container = parent_bounds != window.bounds;
    let refreshed = refresh_widget_bounds(
        &widget,
        window.bounds,
        parent_bounds,
        parent_is_container,
        &window.invisible_bounds,
    );
    let mut widget = widget;
    widget.set_bounds(refreshed.bounds);
    widget.set_visible(refreshed.visible);
    iterator.check_and_update_container_rect_map(refreshed.bounds);

    if refreshed.visible {
        visited.push(widget.clone());
    } else if is_remove_invisible {
        iterator.remove_invisible_widget();
    } else {
        visited.push(widget.clone());
    }
    (widget, refreshed.visible)
}

impl Strategy {
    /// Walks `iterator`, refreshing visibility per node, and returns every
    /// visited widget plus the indices into it that this strategy selects.
    #[must_use]
    pub fn run(
        &self,
        window: &Window,
        iterator: &mut dyn TreeIterator,
        is_remove_invisible: bool,
        visited: &mut Vec<Widget>,
    ) -> (Vec<Widget>, Vec<usize>) {
        let targets = match self {
            Self::Plain {
                self_matchers,
                want_multi,
            } => run_plain(window, iterator, is_remove_invisible, visited, self_matchers, *want_multi),
            Self::IsAfter {
                self_matchers,
                anchor,
                want_multi,
            } => run_is_after(
                window,
                iterator,
                is_remove_invisible,
                visited,
                self_matchers,
                anchor,
                *want_multi,
            ),
            Self::IsBefore {
                self_matchers,
                anchor,
                want_multi,
            } => run_is_before(
                window,
                iterator,
                is_remove_invisible,
                visited,
                self_matchers,
                anchor,
                *want_multi,
            ),
            Self::WithIn {
                self_matchers,
                anchor,
                want_multi,
            } => run_within(
                window,
                iterator,
                is_remove_invisible,
                visited,
                self_matchers,
                anchor,
                *want_multi,
            ),
            Self::Complex { selector } => run_complex(window, iterator, is_remove_invisible, visited, selector),
        };
        (visited.clone(), targets)
    }
}

fn run_plain(
    window: &Window,
    iterator: &mut dyn TreeIterator,
    is_remove_invisible: bool,
    visited: &mut Vec<Widget>,
    self_matchers: &[crate::types::matcher::WidgetMatchModel],
    want_multi: bool,
) -> Vec<usize> {
    let mut targets = Vec::new();
    let mut widget = Widget::new();
    while iterator.dfs_next(&mut widget) {
        let (refreshed, visible) =
            refresh_and_record(window, iterator, widget.clone(), is_remove_invisible, visited);
        if visible && matches_all(self_matchers, &refreshed) {
            targets.push(visited.len() - 1);
            if !want_multi {
                break;
            }
        }
    }
    targets
}

fn run_is_after(
    window: &Window,
    iterator: &mut dyn TreeIterator,
    is_remove_invisible: bool,
    visited: &mut Vec<Widget>,
    self_matchers: &[crate::types::matcher::WidgetMatchModel],
    anchor: &AnchorMatchers,
    want_multi: bool,
) -> Vec<usize> {
    let mut targets = Vec::new();
    let mut widget = Widget::new();
    let mut anchor_found = false;
    while iterator.dfs_next(&mut widget) {
        let (refreshed, visible) =
            refresh_and_record(window, iterator, widget.clone(), is_remove_invisible, visited);
        if !visible {
            continue;
        }
        if !anchor_found {
            if matches_all(anchor, &refreshed) {
                anchor_found = true;
            }
            continue;
        }
        if matches_all(self_matchers, &refreshed) {
            targets.push(visited.len() - 1);
            if !want_multi {
                break;
            }
        }
    }
    targets
}

fn run_is_before(
    window: &Window,
    iterator: &mut dyn TreeIterator,
    is_remove_invisible: bool,
    visited: &mut Vec<Widget>,
    self_matchers: &[crate::types::matcher::WidgetMatchModel],
    anchor: &AnchorMatchers,
    want_multi: bool,
) -> Vec<usize> {
    let mut targets = Vec::new();
    let mut pending: Vec<usize> = Vec::new();
    let mut widget = Widget::new();
    while iterator.dfs_next(&mut widget) {
        let (refreshed, visible) =
            refresh_and_record(window, iterator, widget.clone(), is_remove_invisible, visited);
        if !visible {
            continue;
        }
        if matches_all(anchor, &refreshed) {
            targets.extend(pending.drain(..));
            if !want_multi && !targets.is_empty() {
                return vec![targets[0]];
            }
            continue;
        }
        if matches_all(self_matchers, &refreshed) {
            pending.push(visited.len() - 1);
        }
    }
    targets
}

fn run_within(
    window: &Window,
    iterator: &mut dyn TreeIterator,
    is_remove_invisible: bool,
    visited: &mut Vec<Widget>,
    self_matchers: &[crate::types::matcher::WidgetMatchModel],
    anchor: &AnchorMatchers,
    want_multi: bool,
) -> Vec<usize> {
    let mut targets = Vec::new();
    let mut widget = Widget::new();
    'outer: while iterator.dfs_next(&mut widget) {
        let (refreshed, visible) =
            refresh_and_record(window, iterator, widget.clone(), is_remove_invisible, visited);
        if !visible || !matches_all(anchor, &refreshed) {
            continue;
        }
        iterator.reset_node_index_to_anchor();
        let mut inner = Widget::new();
        while iterator.dfs_next_within_target(&mut inner) {
            let (inner_refreshed, inner_visible) =
                refresh_and_record(window, iterator, inner.clone(), is_remove_invisible, visited);
            if inner_visible && matches_all(self_matchers, &inner_refreshed) {
                targets.push(visited.len() - 1);
                if !want_multi {
                    iterator.clear_dfs_next();
                    break 'outer;
                }
            }
        }
        iterator.clear_dfs_next();
    }
    targets
}

fn first_match_index(visited: &[Widget], anchor: &AnchorMatchers) -> Option<usize> {
    visited.iter().position(|w| matches_all(anchor, w))
}

fn run_complex(
    window: &Window,
    iterator: &mut dyn TreeIterator,
    is_remove_invisible: bool,
    visited: &mut Vec<Widget>,
    selector: &Selector,
) -> Vec<usize> {
    let mut candidates = Vec::new();
    let mut widget = Widget::new();
    while iterator.dfs_next(&mut widget) {
        let (refreshed, visible) =
            refresh_and_record(window, iterator, widget.clone(), is_remove_invisible, visited);
        if visible && matches_all(&selector.self_matchers, &refreshed) {
            candidates.push(visited.len() - 1);
        }
    }

    let after_threshold = if selector.after_anchors.is_empty() {
        None
    } else {
        selector
            .after_anchors
            .iter()
            .map(|anchor| first_match_index(visited, anchor))
            .max()
            .flatten()
            .or(Some(usize::MAX)) // an unmatched required anchor excludes every candidate
    };
    let before_threshold = if selector.before_anchors.is_empty() {
        None
    } else {
        selector
            .before_anchors
            .iter()
            .map(|anchor| first_match_index(visited, anchor))
            .min()
            .flatten()
            .or(Some(0)) // an unmatched required anchor excludes every candidate
    };

    let within_anchor_hierarchies: Vec<Vec<&str>> = selector
        .within_anchors
        .iter()
        .map(|anchor| {
            visited
                .iter()
                .filter(|w| matches_all(anchor, w))
                .map(Widget::hierarchy)
                .collect()
        })
        .collect();

    let mut targets = Vec::new();
    for idx in candidates {
        if let Some(threshold) = after_threshold {
            if idx <= threshold {
                continue;
            }
        }
        if let Some(threshold) = before_threshold {
            if idx >= threshold {
                continue;
            }
        }
        let candidate_hierarchy = visited[idx].hierarchy();
        let within_ok = within_anchor_hierarchies.iter().all(|anchors_for_spec| {
            anchors_for_spec
                .iter()
                .any(|h| *h == candidate_hierarchy || candidate_hierarchy.starts_with(&format!("{h},")))
        });
        if !within_ok {
            continue;
        }
        targets.push(idx);
        if !selector.want_multi {
            break;
        }
    }
    targets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::select::slice_iterator::{make_widget, SliceTreeIterator};
    use crate::types::matcher::{MatchPattern, WidgetMatchModel};
    use crate::types::widget::AttrTag;

    fn window() -> Window {
        Window::new(1, 0, Rect::new(0, 0, 100, 100), "com.example.app")
    }

    #[test]
    fn compile_picks_plain_for_empty_selector() {
        let selector = Selector::new();
        assert!(matches!(compile(&selector), Strategy::Plain { .. }));
    }

    #[test]
    fn compile_picks_is_after_for_single_after_anchor() {
        let selector = Selector::new().with_after_anchor(vec![WidgetMatchModel::new(
            AttrTag::Text,
            "A",
            MatchPattern::Eq,
        )]);
        assert!(matches!(compile(&selector), Strategy::IsAfter { .. }));
    }

    #[test]
    fn compile_picks_complex_when_locators_combine() {
        let selector = Selector::new()
            .with_after_anchor(vec![WidgetMatchModel::new(AttrTag::Text, "A", MatchPattern::Eq)])
            .with_within_anchor(vec![WidgetMatchModel::new(AttrTag::Type, "Scroll", MatchPattern::Eq)]);
        assert!(matches!(compile(&selector), Strategy::Complex { .. }));
    }

    #[test]
    fn plain_strategy_returns_all_visible_self_matches() {
        let nodes = vec![
            make_widget("ROOT", "Column", "root", Rect::new(0, 0, 100, 100)),
            make_widget("ROOT,0", "Text", "A", Rect::new(0, 0, 10, 10)),
            make_widget("ROOT,1", "Text", "B", Rect::new(0, 10, 10, 20)),
        ];
        let mut it = SliceTreeIterator::new(nodes, Rect::new(0, 0, 100, 100));
        let selector = Selector::new().with_self_matcher(WidgetMatchModel::new(
            AttrTag::Type,
            "Text",
            MatchPattern::Eq,
        ));
        let strategy = compile(&selector);
        let mut visited = Vec::new();
        let (visited, targets) = strategy.run(&window(), &mut it, true, &mut visited);
        assert_eq!(targets.len(), 2);
        assert_eq!(visited[targets[0]].attr(AttrTag::Text), Some("A"));
        assert_eq!(visited[targets[1]].attr(AttrTag::Text), Some("B"));
    }

    #[test]
    fn is_after_returns_matches_following_the_anchor() {
        let nodes = vec![
            make_widget("ROOT", "Column", "root", Rect::new(0, 0, 100, 100)),
            make_widget("ROOT,0", "Text", "A", Rect::new(0, 0, 10, 10)),
            make_widget("ROOT,1", "Text", "B", Rect::new(0, 10, 10, 20)),
            make_widget("ROOT,2", "Text", "C", Rect::new(0, 20, 10, 30)),
        ];
        let mut it = SliceTreeIterator::new(nodes, Rect::new(0, 0, 100, 100));
        let selector = Selector::new()
            .with_self_matcher(WidgetMatchModel::new(AttrTag::Type, "Text", MatchPattern::Eq))
            .with_after_anchor(vec![WidgetMatchModel::new(AttrTag::Text, "A", MatchPattern::Eq)])
            .wanting_multi(true);
        let strategy = compile(&selector);
        let mut visited = Vec::new();
        let (visited, targets) = strategy.run(&window(), &mut it, true, &mut visited);
        let texts: Vec<&str> = targets
            .iter()
            .map(|&i| visited[i].attr(AttrTag::Text).unwrap())
            .collect();
        assert_eq!(texts, vec!["B", "C"]);
    }

    #[test]
    fn within_returns_only_descendants_of_the_anchor() {
        let nodes = vec![
            make_widget("ROOT", "Column", "root", Rect::new(0, 0, 100, 100)),
            make_widget("ROOT,0", "Scroll", "anchor", Rect::new(0, 0, 50, 50)),
            make_widget("ROOT,0,0", "Text", "inside", Rect::new(0, 0, 10, 10)),
            make_widget("ROOT,1", "Text", "outside", Rect::new(0, 50, 10, 60)),
        ];
        let mut it = SliceTreeIterator::new(nodes, Rect::new(0, 0, 100, 100));
        let selector = Selector::new()
            .with_self_matcher(WidgetMatchModel::new(AttrTag::Type, "Text", MatchPattern::Eq))
            .with_within_anchor(vec![WidgetMatchModel::new(AttrTag::Type, "Scroll", MatchPattern::Eq)])
            .wanting_multi(true);
        let strategy = compile(&selector);
        let mut visited = Vec::new();
        let (visited, targets) = strategy.run(&window(), &mut it, true, &mut visited);
        let texts: Vec<&str> = targets
            .iter()
            .map(|&i| visited[i].attr(AttrTag::Text).unwrap())
            .collect();
        assert_eq!(texts, vec!["inside"]);
    }
}
