//! Structural HTML rules: text alternatives, form labels, heading order and
//! accessible names for buttons and links.

use scraper::ElementRef;

use crate::declare_rule;
use crate::rules::{Check, Rule, RuleContext, has_any_attr, has_visible_text};

/// Input types that take free text and therefore need a label.
const TEXT_INPUT_TYPES: &[&str] = &["text", "email", "password", "number", "tel", "url"];

const ALT_ATTRS: &[&str] = &["alt", "[alt]", "[attr.alt]"];

const LABEL_ATTRS: &[&str] = &[
    "aria-label",
    "aria-labelledby",
    "[attr.aria-label]",
    "[attr.aria-labelledby]",
];

const NAME_ATTRS: &[&str] = &[
    "aria-label",
    "aria-labelledby",
    "title",
    "[attr.aria-label]",
    "[attr.aria-labelledby]",
];

pub fn rules() -> Vec<Rule> {
    vec![
        declare_rule!(
            id = "image-alt",
            name = "Images must have alternate text",
            category = Html,
            wcag = ("1.1.1", A),
            severity = Serious,
            description = "Image is missing an alt attribute",
            help = "Add alt=\"description\" for informative images or alt=\"\" for decorative ones",
            help_url = "https://www.w3.org/WAI/WCAG22/Understanding/non-text-content.html",
            check = Check::Element {
                tags: &["img"],
                predicate: image_has_alt,
            },
        ),
        declare_rule!(
            id = "label",
            name = "Form elements must have labels",
            category = Html,
            wcag = ("1.3.1", A),
            severity = Serious,
            description = "Form control has no associated label",
            help = "Add a <label for=\"id\">, aria-label or aria-labelledby",
            help_url = "https://www.w3.org/WAI/WCAG22/Understanding/info-and-relationships.html",
            check = Check::Element {
                tags: &["input", "textarea", "select"],
                predicate: control_has_label,
            },
        ),
        declare_rule!(
            id = "heading-order",
            name = "Heading levels should only increase by one",
            category = Html,
            wcag = ("1.3.1", A),
            severity = Moderate,
            description = "Heading level skips one or more levels",
            help = "Use the next heading level down instead of jumping levels",
            help_url = "https://www.w3.org/WAI/WCAG22/Understanding/info-and-relationships.html",
            check = Check::Element {
                tags: &["h1", "h2", "h3", "h4", "h5", "h6"],
                predicate: heading_in_order,
            },
        ),
        declare_rule!(
            id = "button-name",
            name = "Buttons must have discernible text",
            category = Html,
            wcag = ("4.1.2", A),
            severity = Critical,
            description = "Button has no accessible name",
            help = "Give the button text content, aria-label, aria-labelledby or title",
            help_url = "https://www.w3.org/WAI/WCAG22/Understanding/name-role-value.html",
            check = Check::Element {
                tags: &["button"],
                predicate: button_has_name,
            },
        ),
        declare_rule!(
            id = "link-name",
            name = "Links must have discernible text",
            category = Html,
            wcag = ("2.4.4", A),
            severity = Serious,
            description = "Link has no accessible name",
            help = "Give the link text content, an aria-label or an image with alt text",
            help_url = "https://www.w3.org/WAI/WCAG22/Understanding/link-purpose-in-context.html",
            check = Check::Element {
                tags: &["a"],
                predicate: link_has_name,
            },
        ),
    ]
}

/// Presence of the attribute is what matters: `alt=""` marks decoration.
fn image_has_alt(element: &ElementRef<'_>, _ctx: &RuleContext<'_>) -> bool {
    has_any_attr(element, ALT_ATTRS)
}

fn control_has_label(element: &ElementRef<'_>, ctx: &RuleContext<'_>) -> bool {
    let el = element.value();
    if el.name() == "input" {
        let input_type = el.attr("type").unwrap_or("text").trim().to_ascii_lowercase();
        if !TEXT_INPUT_TYPES.contains(&input_type.as_str()) {
            return true;
        }
    }

    if has_any_attr(element, LABEL_ATTRS) {
        return true;
    }

    el.attr("id")
        .is_some_and(|id| ctx.label_targets.contains(id))
}

pub(crate) fn heading_level(element: &ElementRef<'_>) -> Option<u8> {
    let name = element.value().name();
    let level = name.strip_prefix('h')?.parse::<u8>().ok()?;
    (1..=6).contains(&level).then_some(level)
}

fn heading_in_order(element: &ElementRef<'_>, ctx: &RuleContext<'_>) -> bool {
    match (heading_level(element), ctx.previous_heading) {
        (Some(level), Some(previous)) => level <= previous + 1,
        _ => true,
    }
}

fn button_has_name(element: &ElementRef<'_>, _ctx: &RuleContext<'_>) -> bool {
    has_visible_text(element) || has_any_attr(element, NAME_ATTRS)
}

fn link_has_name(element: &ElementRef<'_>, _ctx: &RuleContext<'_>) -> bool {
    let el = element.value();
    if el.attr("href").is_none() && el.attr("[routerlink]").is_none() && el.attr("routerlink").is_none() {
        return true;
    }

    if has_visible_text(element) || has_any_attr(element, NAME_ATTRS) {
        return true;
    }

    element
        .descendants()
        .filter_map(ElementRef::wrap)
        .any(|child| {
            child.value().name() == "img"
                && child
                    .value()
                    .attr("alt")
                    .is_some_and(|alt| !alt.trim().is_empty())
        })
}
