//! Angular template rules.

use std::sync::LazyLock;

use regex::Regex;
use scraper::ElementRef;

use crate::declare_rule;
use crate::rules::aria::is_focusable;
use crate::rules::{ANY_TAG, Check, Rule, RuleContext, SourceMatch};
use crate::scanner::FileKind;

static NG_FOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\*ngFor\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("Invalid regex pattern")
});

const CLICK_ATTRS: &[&str] = &["(click)", "on-click"];

const KEY_ATTR_PREFIXES: &[&str] = &["(keydown", "(keyup", "(keypress", "on-keydown", "on-keyup"];

pub fn rules() -> Vec<Rule> {
    vec![
        declare_rule!(
            id = "click-events-have-key-events",
            name = "Click handlers must have keyboard equivalents",
            category = Angular,
            wcag = ("2.1.1", A),
            severity = Serious,
            description = "(click) binding on a non-interactive element has no keyboard handler",
            help = "Add a (keydown)/(keyup) handler or use a <button>",
            help_url = "https://www.w3.org/WAI/WCAG22/Understanding/keyboard.html",
            check = Check::Element {
                tags: ANY_TAG,
                predicate: click_has_key_handler,
            },
        ),
        declare_rule!(
            id = "ngfor-trackby",
            name = "*ngFor should declare a trackBy function",
            category = Angular,
            wcag = ("2.4.3", A),
            severity = Minor,
            description = "*ngFor without trackBy re-renders the list and drops keyboard focus",
            help = "Add \"; trackBy: trackById\" to the *ngFor expression",
            help_url = "https://www.w3.org/WAI/WCAG22/Understanding/focus-order.html",
            check = Check::Source {
                kinds: &[FileKind::Component, FileKind::Markup],
                detect: ng_for_without_track_by,
            },
        ),
    ]
}

fn click_has_key_handler(element: &ElementRef<'_>, _ctx: &RuleContext<'_>) -> bool {
    let el = element.value();
    if !CLICK_ATTRS.iter().any(|name| el.attr(name).is_some()) {
        return true;
    }

    // Native controls already fire click on Enter/Space.
    if is_focusable(element) && el.attr("tabindex").is_none() {
        return true;
    }

    el.attrs()
        .any(|(name, _)| KEY_ATTR_PREFIXES.iter().any(|prefix| name.starts_with(prefix)))
}

fn ng_for_without_track_by(source: &str) -> Vec<SourceMatch> {
    NG_FOR
        .captures_iter(source)
        .filter(|caps| {
            let expression = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            !expression.contains("trackBy")
        })
        .filter_map(|caps| caps.get(0))
        .map(|m| SourceMatch::new(m.as_str()))
        .collect()
}
