//! Conversion of raw auditor output into issues.
//!
//! Records follow the axe-core result shape. Every affected node becomes its
//! own issue carrying the violation's shared metadata.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::issue::{Issue, IssueSource, Severity, UNKNOWN_CRITERION, WcagLevel};

/// `wcag2a`, `wcag21aa`, `wcag2aaa`...
static LEVEL_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^wcag\d+(a+)$").expect("Invalid regex pattern"));

/// `wcag111`, `wcag1410`...
static CRITERION_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^wcag(\d)(\d)(\d{1,2})$").expect("Invalid regex pattern"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawViolation {
    pub id: String,
    #[serde(default)]
    pub impact: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub help: String,
    #[serde(default)]
    pub help_url: String,
    #[serde(default)]
    pub nodes: Vec<RawNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawNode {
    #[serde(default)]
    pub html: String,
    #[serde(default)]
    pub target: Vec<NodeTarget>,
}

/// A target entry is a plain selector, or a selector path through shadow
/// roots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeTarget {
    Selector(String),
    Shadow(Vec<String>),
}

impl RawNode {
    pub fn selector(&self) -> Option<String> {
        let parts: Vec<String> = self
            .target
            .iter()
            .map(|target| match target {
                NodeTarget::Selector(selector) => selector.clone(),
                NodeTarget::Shadow(path) => path.join(" >>> "),
            })
            .filter(|s| !s.is_empty())
            .collect();
        (!parts.is_empty()).then(|| parts.join(" "))
    }
}

/// WCAG level and criterion carried by a tag list. Without any WCAG tag the
/// level is `AA` and the criterion unknown.
///
/// The level comes from `wcag<digits>a+` tags: one trailing `a` is `A`, two
/// are `AA`, three or more are `AAA`. The highest level among the tags wins.
pub fn wcag_from_tags(tags: &[String]) -> (WcagLevel, String) {
    let level = tags
        .iter()
        .filter_map(|tag| LEVEL_TAG.captures(tag))
        .map(|caps| match caps[1].len() {
            1 => WcagLevel::A,
            2 => WcagLevel::AA,
            _ => WcagLevel::AAA,
        })
        .max();

    let criterion = tags.iter().find_map(|tag| {
        CRITERION_TAG
            .captures(tag)
            .map(|caps| format!("{}.{}.{}", &caps[1], &caps[2], &caps[3]))
    });

    (
        level.unwrap_or(WcagLevel::AA),
        criterion.unwrap_or_else(|| UNKNOWN_CRITERION.to_string()),
    )
}

/// Issues for one audited page. Ids are `<url>:<rule>-<n>`, numbered per
/// rule across the page's nodes.
pub fn normalize(page_url: &str, violations: &[RawViolation]) -> Vec<Issue> {
    let mut counters: HashMap<&str, usize> = HashMap::new();
    let mut issues = Vec::new();

    for violation in violations {
        let severity = Severity::from_impact(violation.impact.as_deref());
        let (level, criterion) = wcag_from_tags(&violation.tags);

        for node in &violation.nodes {
            let n = counters.entry(violation.id.as_str()).or_insert(0);
            *n += 1;

            let mut issue = Issue::new(
                format!("{}:{}-{}", page_url, violation.id, n),
                violation.id.as_str(),
                severity,
                IssueSource::Dynamic,
            )
            .with_wcag(criterion.as_str(), level)
            .with_description(violation.description.as_str())
            .with_help(violation.help.as_str(), violation.help_url.as_str());

            if !node.html.is_empty() {
                issue = issue.with_element(node.html.as_str());
            }
            if let Some(selector) = node.selector() {
                issue = issue.with_selector(selector);
            }
            issues.push(issue);
        }
    }

    issues
}
