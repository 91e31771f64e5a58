//! ARIA rules: valid role tokens and focusable content hidden from assistive
//! technology.

use scraper::ElementRef;

use crate::declare_rule;
use crate::rules::{ANY_TAG, Check, Rule, RuleContext};

/// WAI-ARIA 1.2 roles, abstract roles excluded.
const VALID_ROLES: &[&str] = &[
    "alert", "alertdialog", "application", "article", "banner", "blockquote", "button",
    "caption", "cell", "checkbox", "code", "columnheader", "combobox", "complementary",
    "contentinfo", "definition", "deletion", "dialog", "directory", "document", "emphasis",
    "feed", "figure", "form", "generic", "grid", "gridcell", "group", "heading", "img",
    "insertion", "link", "list", "listbox", "listitem", "log", "main", "marquee", "math",
    "menu", "menubar", "menuitem", "menuitemcheckbox", "menuitemradio", "meter", "navigation",
    "none", "note", "option", "paragraph", "presentation", "progressbar", "radio",
    "radiogroup", "region", "row", "rowgroup", "rowheader", "scrollbar", "search",
    "searchbox", "separator", "slider", "spinbutton", "status", "strong", "subscript",
    "superscript", "switch", "tab", "table", "tablist", "tabpanel", "term", "textbox",
    "time", "timer", "toolbar", "tooltip", "tree", "treegrid", "treeitem",
];

pub fn rules() -> Vec<Rule> {
    vec![
        declare_rule!(
            id = "aria-roles",
            name = "ARIA roles used must conform to valid values",
            category = Aria,
            wcag = ("4.1.2", A),
            severity = Critical,
            description = "Element has an invalid role attribute value",
            help = "Use a valid, non-abstract WAI-ARIA role",
            help_url = "https://www.w3.org/WAI/WCAG22/Understanding/name-role-value.html",
            check = Check::Element {
                tags: ANY_TAG,
                predicate: role_is_valid,
            },
        ),
        declare_rule!(
            id = "aria-hidden-focus",
            name = "ARIA hidden element must not be focusable or contain focusable elements",
            category = Aria,
            wcag = ("4.1.2", A),
            severity = Serious,
            description = "aria-hidden content contains a focusable element",
            help = "Remove aria-hidden or take the content out of the tab order with tabindex=\"-1\"",
            help_url = "https://www.w3.org/WAI/WCAG22/Understanding/name-role-value.html",
            check = Check::Element {
                tags: ANY_TAG,
                predicate: hidden_content_not_focusable,
            },
        ),
    ]
}

fn role_is_valid(element: &ElementRef<'_>, _ctx: &RuleContext<'_>) -> bool {
    let Some(role) = element.value().attr("role") else {
        return true;
    };

    role.split_ascii_whitespace()
        .all(|token| VALID_ROLES.contains(&token.to_ascii_lowercase().as_str()))
}

fn hidden_content_not_focusable(element: &ElementRef<'_>, _ctx: &RuleContext<'_>) -> bool {
    let hidden = element
        .value()
        .attr("aria-hidden")
        .is_some_and(|value| value.trim().eq_ignore_ascii_case("true"));
    if !hidden {
        return true;
    }

    !element
        .descendants()
        .filter_map(ElementRef::wrap)
        .any(|node| is_focusable(&node))
}

pub(crate) fn is_focusable(element: &ElementRef<'_>) -> bool {
    let el = element.value();

    if let Some(tabindex) = el.attr("tabindex") {
        return tabindex.trim().parse::<i32>().is_ok_and(|value| value >= 0);
    }

    if el.attr("disabled").is_some() {
        return false;
    }

    match el.name() {
        "a" | "area" => el.attr("href").is_some(),
        "input" => !el
            .attr("type")
            .is_some_and(|t| t.eq_ignore_ascii_case("hidden")),
        "button" | "select" | "textarea" | "iframe" | "summary" => true,
        _ => el.attr("contenteditable").is_some_and(|v| v != "false"),
    }
}
