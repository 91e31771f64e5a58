//! Angular component sources. Only files that declare a component are
//! checked; their inline templates go through the markup rules like any
//! `.html` file.

use std::sync::LazyLock;

use regex::Regex;

static COMPONENT_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@Component\s*\(|\btemplateUrl\s*:|\bstyleUrls?\s*:").expect("Invalid regex pattern")
});

static INLINE_TEMPLATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\btemplate\s*:\s*(?:`((?:[^`\\]|\\.)*)`|'((?:[^'\\]|\\.)*)'|"((?:[^"\\]|\\.)*)")"#)
        .expect("Invalid regex pattern")
});

pub fn is_component(source: &str) -> bool {
    COMPONENT_MARKER.is_match(source)
}

/// Bodies of every `template:` string literal, in source order.
pub fn inline_templates(source: &str) -> Vec<&str> {
    INLINE_TEMPLATE
        .captures_iter(source)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)))
        .map(|m| m.as_str())
        .collect()
}
