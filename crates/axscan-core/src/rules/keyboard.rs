//! Keyboard rules: tab order and visible focus.

use std::sync::LazyLock;

use regex::Regex;
use scraper::ElementRef;

use crate::declare_rule;
use crate::rules::{ANY_TAG, Check, Rule, RuleContext, SourceMatch};
use crate::scanner::FileKind;

static OUTLINE_NONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)outline\s*:\s*none\b").expect("Invalid regex pattern"));

static FOCUS_SELECTOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":focus(?:-visible|-within)?").expect("Invalid regex pattern"));

pub fn rules() -> Vec<Rule> {
    vec![
        declare_rule!(
            id = "tabindex",
            name = "Elements should not have tabindex greater than zero",
            category = Keyboard,
            wcag = ("2.4.3", A),
            severity = Moderate,
            description = "Positive tabindex overrides the natural focus order",
            help = "Use tabindex=\"0\" or restructure the DOM order",
            help_url = "https://www.w3.org/WAI/WCAG22/Understanding/focus-order.html",
            check = Check::Element {
                tags: ANY_TAG,
                predicate: tabindex_not_positive,
            },
        ),
        declare_rule!(
            id = "focus-visible",
            name = "Focus indicator must not be removed",
            category = Keyboard,
            wcag = ("2.4.7", AA),
            severity = Serious,
            description = "outline: none removes the focus indicator and no :focus style replaces it",
            help = "Provide a :focus or :focus-visible style when removing the default outline",
            help_url = "https://www.w3.org/WAI/WCAG22/Understanding/focus-visible.html",
            check = Check::Source {
                kinds: &[FileKind::Stylesheet],
                detect: outline_removed_without_focus_style,
            },
        ),
    ]
}

fn tabindex_not_positive(element: &ElementRef<'_>, _ctx: &RuleContext<'_>) -> bool {
    element
        .value()
        .attr("tabindex")
        .and_then(|value| value.trim().parse::<i32>().ok())
        .is_none_or(|value| value <= 0)
}

/// File-wide check: any focus selector anywhere in the sheet clears every
/// `outline: none` in it.
fn outline_removed_without_focus_style(source: &str) -> Vec<SourceMatch> {
    if FOCUS_SELECTOR.is_match(source) {
        return Vec::new();
    }

    OUTLINE_NONE
        .find_iter(source)
        .map(|m| {
            let line_start = source[..m.start()].rfind('\n').map_or(0, |i| i + 1);
            let line_end = source[m.end()..]
                .find('\n')
                .map_or(source.len(), |i| m.end() + i);
            SourceMatch::new(source[line_start..line_end].trim())
        })
        .collect()
}
