//! Markup checks: parses an HTML document or template and runs the element
//! rules against every element in document order.

use std::collections::HashSet;

use scraper::{ElementRef, Html};
use tracing::warn;

use crate::rules::html::heading_level;
use crate::rules::{Rule, RuleContext, RuleOutcome, RuleRegistry};

const MAX_SNIPPET_LEN: usize = 200;

/// An element that failed a rule.
#[derive(Debug, Clone)]
pub struct MarkupViolation<'r> {
    pub rule: &'r Rule,
    pub element: String,
    pub selector: String,
}

pub fn check_markup<'r>(registry: &'r RuleRegistry, markup: &str) -> Vec<MarkupViolation<'r>> {
    let document = Html::parse_document(markup);
    let elements: Vec<ElementRef<'_>> = document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .collect();

    let label_targets: HashSet<String> = elements
        .iter()
        .filter(|el| el.value().name() == "label")
        .filter_map(|el| el.value().attr("for"))
        .map(|id| id.trim().to_string())
        .collect();

    let mut ctx = RuleContext::new(&label_targets);
    let mut violations = Vec::new();

    for element in &elements {
        for rule in registry.element_rules_for(element.value().name()) {
            match registry.evaluate(rule, element, &ctx) {
                RuleOutcome::Compliant => {}
                RuleOutcome::Violation => violations.push(MarkupViolation {
                    rule,
                    element: snippet(element),
                    selector: selector(element),
                }),
                RuleOutcome::Fault(message) => {
                    warn!(
                        rule = rule.metadata.id,
                        element = %selector(element),
                        error = %message,
                        "rule predicate failed, skipping element"
                    );
                }
            }
        }

        // The baseline moves on every heading, flagged or not.
        if let Some(level) = heading_level(element) {
            ctx.previous_heading = Some(level);
        }
    }

    violations
}

/// Opening tag of the element, truncated for display.
pub fn snippet(element: &ElementRef<'_>) -> String {
    let el = element.value();
    let mut out = format!("<{}", el.name());
    for (name, value) in el.attrs() {
        if value.is_empty() {
            out.push_str(&format!(" {name}=\"\""));
        } else {
            out.push_str(&format!(" {name}=\"{value}\""));
        }
    }
    out.push('>');

    if out.chars().count() > MAX_SNIPPET_LEN {
        let truncated: String = out.chars().take(MAX_SNIPPET_LEN - 3).collect();
        return format!("{truncated}...");
    }
    out
}

/// Short CSS selector identifying the element: `tag#id`, `tag.class` or
/// `tag[name="..."]`.
pub fn selector(element: &ElementRef<'_>) -> String {
    let el = element.value();
    let tag = el.name();

    if let Some(id) = el.id() {
        return format!("{tag}#{id}");
    }

    let classes: Vec<&str> = el.classes().take(2).collect();
    if !classes.is_empty() {
        return format!("{tag}.{}", classes.join("."));
    }

    if let Some(name) = el.attr("name") {
        return format!("{tag}[name=\"{name}\"]");
    }

    tag.to_string()
}
