//! Rule system for accessibility analysis
//!
//! Every rule is plain data: fixed metadata plus a function pointer. Element
//! rules are evaluated against one markup element at a time; source rules look
//! at the raw text of a whole file. The registry builds its lookup indices once
//! on registration so finding rules by id, category, level, severity, tag or
//! file kind never scans the catalog.

pub mod angular;
pub mod aria;
pub mod color;
pub mod html;
pub mod keyboard;

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use scraper::ElementRef;
use tracing::warn;

use crate::config::RulesConfig;
use crate::issue::{Severity, WcagLevel};
use crate::scanner::FileKind;

/// Returns `true` when the element is compliant.
pub type ElementPredicate = fn(&ElementRef<'_>, &RuleContext<'_>) -> bool;

/// Returns every offending occurrence found in a file's text.
pub type SourceDetector = fn(&str) -> Vec<SourceMatch>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleCategory {
    Html,
    Aria,
    Angular,
    Keyboard,
    Color,
}

impl RuleCategory {
    pub const ALL: [RuleCategory; 5] = [
        RuleCategory::Html,
        RuleCategory::Aria,
        RuleCategory::Angular,
        RuleCategory::Keyboard,
        RuleCategory::Color,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RuleCategory::Html => "html",
            RuleCategory::Aria => "aria",
            RuleCategory::Angular => "angular",
            RuleCategory::Keyboard => "keyboard",
            RuleCategory::Color => "color",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        RuleCategory::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMetadata {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub help: &'static str,
    pub help_url: &'static str,
    pub category: RuleCategory,
    pub severity: Severity,
    pub wcag_criterion: &'static str,
    pub wcag_level: WcagLevel,
}

#[derive(Debug, Clone, Copy)]
pub enum Check {
    Element {
        tags: &'static [&'static str],
        predicate: ElementPredicate,
    },
    Source {
        kinds: &'static [FileKind],
        detect: SourceDetector,
    },
}

/// Tag list that makes an element rule apply to every element.
pub const ANY_TAG: &[&str] = &["*"];

#[derive(Debug, Clone)]
pub struct Rule {
    pub metadata: RuleMetadata,
    pub check: Check,
}

/// Document state an element predicate may consult. The scanner owns it and
/// updates it between elements.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    /// Values of every `<label for=..>` in the document.
    pub label_targets: &'a HashSet<String>,
    /// Level of the closest preceding heading in document order.
    pub previous_heading: Option<u8>,
}

impl<'a> RuleContext<'a> {
    pub fn new(label_targets: &'a HashSet<String>) -> Self {
        Self {
            label_targets,
            previous_heading: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMatch {
    pub snippet: String,
}

impl SourceMatch {
    pub fn new(snippet: impl Into<String>) -> Self {
        Self {
            snippet: snippet.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutcome {
    Compliant,
    Violation,
    /// The predicate panicked; the element is skipped for this rule.
    Fault(String),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RuleError {
    #[error("Rule '{id}' is already registered")]
    DuplicateId { id: &'static str },
}

pub struct RuleRegistry {
    rules: Vec<Rule>,
    by_id: HashMap<&'static str, usize>,
    by_category: HashMap<RuleCategory, Vec<usize>>,
    by_level: HashMap<WcagLevel, Vec<usize>>,
    by_severity: HashMap<Severity, Vec<usize>>,
    by_tag: HashMap<&'static str, Vec<usize>>,
    any_tag: Vec<usize>,
    by_kind: HashMap<FileKind, Vec<usize>>,
    disabled: HashSet<String>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            by_id: HashMap::new(),
            by_category: HashMap::new(),
            by_level: HashMap::new(),
            by_severity: HashMap::new(),
            by_tag: HashMap::new(),
            any_tag: Vec::new(),
            by_kind: HashMap::new(),
            disabled: HashSet::new(),
        }
    }

    /// Registry holding the full built-in catalog.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        let catalog = html::rules()
            .into_iter()
            .chain(aria::rules())
            .chain(angular::rules())
            .chain(keyboard::rules())
            .chain(color::rules());

        for rule in catalog {
            if let Err(e) = registry.register(rule) {
                warn!(error = %e, "skipping built-in rule");
            }
        }
        registry
    }

    pub fn with_config(config: &RulesConfig) -> Self {
        let mut registry = Self::builtin();
        registry.configure(config);
        registry
    }

    pub fn register(&mut self, rule: Rule) -> Result<(), RuleError> {
        let id = rule.metadata.id;
        if self.by_id.contains_key(id) {
            return Err(RuleError::DuplicateId { id });
        }

        let index = self.rules.len();
        self.by_id.insert(id, index);
        self.by_category
            .entry(rule.metadata.category)
            .or_default()
            .push(index);
        self.by_level
            .entry(rule.metadata.wcag_level)
            .or_default()
            .push(index);
        self.by_severity
            .entry(rule.metadata.severity)
            .or_default()
            .push(index);

        match rule.check {
            Check::Element { tags, .. } => {
                if tags.contains(&"*") {
                    self.any_tag.push(index);
                } else {
                    for tag in tags {
                        self.by_tag.entry(*tag).or_default().push(index);
                    }
                }
            }
            Check::Source { kinds, .. } => {
                for kind in kinds {
                    self.by_kind.entry(*kind).or_default().push(index);
                }
            }
        }

        self.rules.push(rule);
        Ok(())
    }

    pub fn configure(&mut self, config: &RulesConfig) {
        self.disabled = config.disabled.iter().cloned().collect();
    }

    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.by_id.get(id).map(|&index| &self.rules[index])
    }

    pub fn by_category(&self, category: RuleCategory) -> impl Iterator<Item = &Rule> {
        self.indexed(self.by_category.get(&category))
    }

    pub fn by_level(&self, level: WcagLevel) -> impl Iterator<Item = &Rule> {
        self.indexed(self.by_level.get(&level))
    }

    pub fn by_severity(&self, severity: Severity) -> impl Iterator<Item = &Rule> {
        self.indexed(self.by_severity.get(&severity))
    }

    pub fn is_enabled(&self, id: &str) -> bool {
        self.by_id.contains_key(id) && !self.disabled.contains(id)
    }

    /// Enabled element rules for `tag`, tag-specific rules first.
    pub fn element_rules_for<'a>(&'a self, tag: &str) -> impl Iterator<Item = &'a Rule> + use<'a> {
        let specific = self.by_tag.get(tag).map(Vec::as_slice).unwrap_or(&[]);
        specific
            .iter()
            .chain(self.any_tag.iter())
            .map(|&index| &self.rules[index])
            .filter(|rule| !self.disabled.contains(rule.metadata.id))
    }

    /// Enabled source rules for a file kind.
    pub fn source_rules_for(&self, kind: FileKind) -> impl Iterator<Item = &Rule> {
        self.indexed(self.by_kind.get(&kind))
            .filter(|rule| !self.disabled.contains(rule.metadata.id))
    }

    /// Runs an element predicate, turning a panic into [`RuleOutcome::Fault`].
    pub fn evaluate(&self, rule: &Rule, element: &ElementRef<'_>, ctx: &RuleContext<'_>) -> RuleOutcome {
        let Check::Element { predicate, .. } = rule.check else {
            return RuleOutcome::Compliant;
        };

        match panic::catch_unwind(AssertUnwindSafe(|| predicate(element, ctx))) {
            Ok(true) => RuleOutcome::Compliant,
            Ok(false) => RuleOutcome::Violation,
            Err(payload) => RuleOutcome::Fault(panic_message(payload.as_ref())),
        }
    }

    /// Runs a source detector; a panic yields no matches and a warning.
    pub fn detect(&self, rule: &Rule, source: &str) -> Result<Vec<SourceMatch>, String> {
        let Check::Source { detect, .. } = rule.check else {
            return Ok(Vec::new());
        };

        panic::catch_unwind(AssertUnwindSafe(|| detect(source)))
            .map_err(|payload| panic_message(payload.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn indexed<'a>(&'a self, indices: Option<&'a Vec<usize>>) -> impl Iterator<Item = &'a Rule> + 'a {
        indices
            .map(Vec::as_slice)
            .unwrap_or(&[])
            .iter()
            .map(|&index| &self.rules[index])
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "rule predicate panicked".to_string()
    }
}

/// True when the element carries any of the given attributes. Names are
/// matched as the HTML parser stores them, i.e. lowercase.
pub(crate) fn has_any_attr(element: &ElementRef<'_>, names: &[&str]) -> bool {
    names.iter().any(|name| element.value().attr(name).is_some())
}

pub(crate) fn has_visible_text(element: &ElementRef<'_>) -> bool {
    element.text().any(|text| !text.trim().is_empty())
}

#[macro_export]
macro_rules! declare_rule {
    (
        id = $id:literal,
        name = $name:literal,
        category = $cat:ident,
        wcag = ($criterion:literal, $level:ident),
        severity = $sev:ident,
        description = $desc:literal,
        help = $help:literal,
        help_url = $url:literal,
        check = $check:expr $(,)?
    ) => {
        $crate::rules::Rule {
            metadata: $crate::rules::RuleMetadata {
                id: $id,
                name: $name,
                description: $desc,
                help: $help,
                help_url: $url,
                category: $crate::rules::RuleCategory::$cat,
                severity: $crate::issue::Severity::$sev,
                wcag_criterion: $criterion,
                wcag_level: $crate::issue::WcagLevel::$level,
            },
            check: $check,
        }
    };
}


#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;
    use test_support::first;

    fn always_compliant(_element: &ElementRef<'_>, _ctx: &RuleContext<'_>) -> bool {
        true
    }

    fn always_panics(_element: &ElementRef<'_>, _ctx: &RuleContext<'_>) -> bool {
        panic!("boom")
    }

    fn test_rule(id: &'static str, category: RuleCategory, predicate: ElementPredicate) -> Rule {
        Rule {
            metadata: RuleMetadata {
                id,
                name: "Test rule",
                description: "A test rule",
                help: "Fix it",
                help_url: "https://example.com",
                category,
                severity: Severity::Moderate,
                wcag_criterion: "1.1.1",
                wcag_level: WcagLevel::A,
            },
            check: Check::Element {
                tags: &["div"],
                predicate,
            },
        }
    }

    #[test]
    fn builtin_catalog_has_unique_ids() {
        let registry = RuleRegistry::builtin();
        let ids: HashSet<_> = registry.rules().map(|r| r.metadata.id).collect();

        assert_eq!(ids.len(), registry.len());
        assert!(registry.len() >= 12);
    }

    #[test]
    fn builtin_catalog_covers_every_category() {
        let registry = RuleRegistry::builtin();

        for category in RuleCategory::ALL {
            assert!(
                registry.by_category(category).next().is_some(),
                "no rule in category {}",
                category
            );
        }
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let mut registry = RuleRegistry::new();
        registry
            .register(test_rule("T001", RuleCategory::Html, always_compliant))
            .unwrap();

        let err = registry
            .register(test_rule("T001", RuleCategory::Aria, always_compliant))
            .unwrap_err();

        assert_eq!(err, RuleError::DuplicateId { id: "T001" });
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn lookup_by_id_category_level_and_severity() {
        let registry = RuleRegistry::builtin();

        let image_alt = registry.get("image-alt").unwrap();
        assert_eq!(image_alt.metadata.wcag_criterion, "1.1.1");
        assert!(registry.get("missing").is_none());

        assert!(
            registry
                .by_category(RuleCategory::Angular)
                .any(|r| r.metadata.id == "ngfor-trackby")
        );
        assert!(
            registry
                .by_level(WcagLevel::AA)
                .any(|r| r.metadata.id == "focus-visible")
        );
        assert!(
            registry
                .by_severity(Severity::Serious)
                .all(|r| r.metadata.severity == Severity::Serious)
        );
    }

    #[test]
    fn element_rules_for_tag_include_wildcard_rules() {
        let registry = RuleRegistry::builtin();

        let img_rules: Vec<_> = registry
            .element_rules_for("img")
            .map(|r| r.metadata.id)
            .collect();

        assert_eq!(img_rules[0], "image-alt");
        assert!(img_rules.contains(&"tabindex"));
        assert!(!img_rules.contains(&"label"));
    }

    #[test]
    fn source_rules_are_indexed_by_file_kind() {
        let registry = RuleRegistry::builtin();

        let css: Vec<_> = registry
            .source_rules_for(FileKind::Stylesheet)
            .map(|r| r.metadata.id)
            .collect();
        let component: Vec<_> = registry
            .source_rules_for(FileKind::Component)
            .map(|r| r.metadata.id)
            .collect();

        assert_eq!(css, vec!["focus-visible"]);
        assert_eq!(component, vec!["ngfor-trackby"]);
    }

    #[test]
    fn disabled_rules_are_filtered() {
        let config = RulesConfig {
            disabled: vec!["image-alt".to_string()],
        };
        let registry = RuleRegistry::with_config(&config);

        assert!(!registry.is_enabled("image-alt"));
        assert!(registry.is_enabled("label"));
        assert!(!registry.is_enabled("unknown-rule"));
        assert!(
            !registry
                .element_rules_for("img")
                .any(|r| r.metadata.id == "image-alt")
        );
    }

    #[test]
    fn panicking_predicate_is_reported_as_fault() {
        let mut registry = RuleRegistry::new();
        registry
            .register(test_rule("T001", RuleCategory::Html, always_panics))
            .unwrap();
        let document = Html::parse_fragment("<div></div>");
        let element = first(&document, "div");
        let labels = HashSet::new();
        let ctx = RuleContext::new(&labels);

        let rule = registry.get("T001").unwrap();
        let outcome = registry.evaluate(rule, &element, &ctx);

        assert_eq!(outcome, RuleOutcome::Fault("boom".to_string()));
    }

    #[test]
    fn category_parses_case_insensitively() {
        assert_eq!(RuleCategory::parse("ARIA"), Some(RuleCategory::Aria));
        assert_eq!(RuleCategory::parse("color"), Some(RuleCategory::Color));
        assert_eq!(RuleCategory::parse("security"), None);
    }

    #[test]
    fn declare_rule_macro_builds_metadata() {
        let rule = crate::declare_rule!(
            id = "M001",
            name = "Macro rule",
            category = Keyboard,
            wcag = ("2.1.1", A),
            severity = Critical,
            description = "Tests the declare_rule! macro",
            help = "Nothing to do",
            help_url = "https://example.com/rules/M001",
            check = Check::Element {
                tags: ANY_TAG,
                predicate: always_compliant,
            },
        );

        assert_eq!(rule.metadata.id, "M001");
        assert_eq!(rule.metadata.category, RuleCategory::Keyboard);
        assert_eq!(rule.metadata.severity, Severity::Critical);
        assert_eq!(rule.metadata.wcag_level, WcagLevel::A);
        assert_eq!(rule.metadata.help_url, "https://example.com/rules/M001");
    }
}
