//! Issue model shared by the static scanner, the dynamic normalizer and the
//! aggregator.
//!
//! Issues are built once through [`Issue::new`] and the `with_*` builders and
//! are read-only afterwards. [`AnalysisResult`] never stores a summary of its
//! own: [`Summary`] is always recomputed from the issue list.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const UNKNOWN_CRITERION: &str = "Unknown";

/// Priority tier of an issue. Variants are declared from highest to lowest
/// priority, so the derived ordering sorts `Critical` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Serious,
    Moderate,
    Minor,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::Serious,
        Severity::Moderate,
        Severity::Minor,
    ];

    /// Sort rank: `critical = 0` up to `minor = 3`.
    pub fn rank(self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::Serious => 1,
            Severity::Moderate => 2,
            Severity::Minor => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Serious => "serious",
            Severity::Moderate => "moderate",
            Severity::Minor => "minor",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "critical" => Some(Severity::Critical),
            "serious" => Some(Severity::Serious),
            "moderate" => Some(Severity::Moderate),
            "minor" => Some(Severity::Minor),
            _ => None,
        }
    }

    /// Maps an auditor impact value. Anything unrecognized, including a
    /// missing impact, becomes `Minor`.
    pub fn from_impact(impact: Option<&str>) -> Self {
        impact.and_then(Severity::parse).unwrap_or(Severity::Minor)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WcagLevel {
    A,
    AA,
    AAA,
}

impl WcagLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            WcagLevel::A => "A",
            WcagLevel::AA => "AA",
            WcagLevel::AAA => "AAA",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "A" => Some(WcagLevel::A),
            "AA" => Some(WcagLevel::AA),
            "AAA" => Some(WcagLevel::AAA),
            _ => None,
        }
    }
}

impl fmt::Display for WcagLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provenance of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSource {
    Static,
    Dynamic,
}

/// One detected accessibility violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    id: String,
    rule: String,
    severity: Severity,
    wcag_level: WcagLevel,
    wcag_criterion: String,
    description: String,
    help_text: String,
    #[serde(default)]
    wcag_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    element: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    file: Option<String>,
    source: IssueSource,
}

impl Issue {
    pub fn new(
        id: impl Into<String>,
        rule: impl Into<String>,
        severity: Severity,
        source: IssueSource,
    ) -> Self {
        Self {
            id: id.into(),
            rule: rule.into(),
            severity,
            wcag_level: WcagLevel::AA,
            wcag_criterion: UNKNOWN_CRITERION.to_string(),
            description: String::new(),
            help_text: String::new(),
            wcag_url: String::new(),
            element: None,
            selector: None,
            file: None,
            source,
        }
    }

    pub fn with_wcag(mut self, criterion: impl Into<String>, level: WcagLevel) -> Self {
        self.wcag_criterion = criterion.into();
        self.wcag_level = level;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_help(mut self, help_text: impl Into<String>, wcag_url: impl Into<String>) -> Self {
        self.help_text = help_text.into();
        self.wcag_url = wcag_url.into();
        self
    }

    pub fn with_element(mut self, element: impl Into<String>) -> Self {
        self.element = Some(element.into());
        self
    }

    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn rule(&self) -> &str {
        &self.rule
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn wcag_level(&self) -> WcagLevel {
        self.wcag_level
    }

    pub fn wcag_criterion(&self) -> &str {
        &self.wcag_criterion
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn help_text(&self) -> &str {
        &self.help_text
    }

    pub fn wcag_url(&self) -> &str {
        &self.wcag_url
    }

    pub fn element(&self) -> Option<&str> {
        self.element.as_deref()
    }

    pub fn selector(&self) -> Option<&str> {
        self.selector.as_deref()
    }

    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    pub fn source(&self) -> IssueSource {
        self.source
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub critical: usize,
    pub serious: usize,
    pub moderate: usize,
    pub minor: usize,
}

impl Summary {
    pub fn from_issues(issues: &[Issue]) -> Self {
        let mut summary = Summary::default();
        for issue in issues {
            summary.total += 1;
            match issue.severity() {
                Severity::Critical => summary.critical += 1,
                Severity::Serious => summary.serious += 1,
                Severity::Moderate => summary.moderate += 1,
                Severity::Minor => summary.minor += 1,
            }
        }
        summary
    }

    pub fn count(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical,
            Severity::Serious => self.serious,
            Severity::Moderate => self.moderate,
            Severity::Minor => self.minor,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisType {
    Static,
    Dynamic,
    Combined,
}

impl AnalysisType {
    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisType::Static => "static",
            AnalysisType::Dynamic => "dynamic",
            AnalysisType::Combined => "combined",
        }
    }
}

/// What an analysis run looked at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    Project(PathBuf),
    Url(String),
}

/// Output of one analysis pass, or of an aggregation of several.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "AnalysisResultRecord", from = "AnalysisResultRecord")]
pub struct AnalysisResult {
    issues: Vec<Issue>,
    summary: Summary,
    analysis_type: AnalysisType,
    timestamp: DateTime<Utc>,
    target: Option<Target>,
}

impl AnalysisResult {
    pub fn new(analysis_type: AnalysisType, issues: Vec<Issue>, target: Option<Target>) -> Self {
        Self::at(analysis_type, issues, target, Utc::now())
    }

    pub(crate) fn at(
        analysis_type: AnalysisType,
        issues: Vec<Issue>,
        target: Option<Target>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let summary = Summary::from_issues(&issues);
        Self {
            issues,
            summary,
            analysis_type,
            timestamp,
            target,
        }
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn into_issues(self) -> Vec<Issue> {
        self.issues
    }

    pub fn summary(&self) -> Summary {
        self.summary
    }

    pub fn analysis_type(&self) -> AnalysisType {
        self.analysis_type
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn target(&self) -> Option<&Target> {
        self.target.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Serialized shape of [`AnalysisResult`]. The summary is written for
/// consumers but ignored on read.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisResultRecord {
    issues: Vec<Issue>,
    #[serde(default)]
    summary: Summary,
    analysis_type: AnalysisType,
    timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    project_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
}

impl From<AnalysisResult> for AnalysisResultRecord {
    fn from(result: AnalysisResult) -> Self {
        let (project_path, url) = match result.target {
            Some(Target::Project(path)) => (Some(path), None),
            Some(Target::Url(url)) => (None, Some(url)),
            None => (None, None),
        };
        Self {
            issues: result.issues,
            summary: result.summary,
            analysis_type: result.analysis_type,
            timestamp: result.timestamp,
            project_path,
            url,
        }
    }
}

impl From<AnalysisResultRecord> for AnalysisResult {
    fn from(record: AnalysisResultRecord) -> Self {
        let target = match (record.project_path, record.url) {
            (Some(path), _) => Some(Target::Project(path)),
            (None, Some(url)) => Some(Target::Url(url)),
            (None, None) => None,
        };
        AnalysisResult::at(record.analysis_type, record.issues, target, record.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(id: &str, severity: Severity) -> Issue {
        Issue::new(id, "image-alt", severity, IssueSource::Static)
    }

    #[test]
    fn severity_rank_orders_critical_first() {
        assert_eq!(Severity::Critical.rank(), 0);
        assert_eq!(Severity::Serious.rank(), 1);
        assert_eq!(Severity::Moderate.rank(), 2);
        assert_eq!(Severity::Minor.rank(), 3);
        assert!(Severity::Critical < Severity::Minor);
    }

    #[test]
    fn unknown_impact_maps_to_minor() {
        assert_eq!(Severity::from_impact(Some("blocker")), Severity::Minor);
        assert_eq!(Severity::from_impact(None), Severity::Minor);
        assert_eq!(Severity::from_impact(Some("SERIOUS")), Severity::Serious);
    }

    #[test]
    fn new_issue_defaults_to_unknown_criterion() {
        let issue = issue("a", Severity::Minor);

        assert_eq!(issue.wcag_criterion(), UNKNOWN_CRITERION);
        assert_eq!(issue.wcag_level(), WcagLevel::AA);
        assert!(issue.element().is_none());
        assert!(issue.file().is_none());
    }

    #[test]
    fn summary_counts_by_severity() {
        let issues = vec![
            issue("a", Severity::Critical),
            issue("b", Severity::Serious),
            issue("c", Severity::Serious),
            issue("d", Severity::Minor),
        ];

        let summary = Summary::from_issues(&issues);

        assert_eq!(summary.total, 4);
        assert_eq!(summary.critical, 1);
        assert_eq!(summary.serious, 2);
        assert_eq!(summary.moderate, 0);
        assert_eq!(summary.minor, 1);
        assert_eq!(
            summary.critical + summary.serious + summary.moderate + summary.minor,
            summary.total
        );
    }

    #[test]
    fn result_serializes_target_as_project_path_or_url() {
        let result = AnalysisResult::new(
            AnalysisType::Dynamic,
            vec![issue("a", Severity::Serious)],
            Some(Target::Url("https://example.com".to_string())),
        );

        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["url"], "https://example.com");
        assert!(json.get("projectPath").is_none());
        assert_eq!(json["analysisType"], "dynamic");
        assert_eq!(json["summary"]["serious"], 1);
        assert_eq!(json["issues"][0]["wcagCriterion"], "Unknown");
    }

    #[test]
    fn deserialized_summary_is_recomputed_from_issues() {
        let json = serde_json::json!({
            "issues": [{
                "id": "x",
                "rule": "label",
                "severity": "critical",
                "wcagLevel": "A",
                "wcagCriterion": "1.3.1",
                "description": "",
                "helpText": "",
                "source": "static"
            }],
            "summary": { "total": 99, "critical": 0, "serious": 99, "moderate": 0, "minor": 0 },
            "analysisType": "static",
            "timestamp": "2024-05-01T12:00:00Z",
            "projectPath": "/srv/app"
        });

        let result: AnalysisResult = serde_json::from_value(json).unwrap();

        assert_eq!(result.summary().total, 1);
        assert_eq!(result.summary().critical, 1);
        assert_eq!(result.summary().serious, 0);
        assert_eq!(
            result.target(),
            Some(&Target::Project(PathBuf::from("/srv/app")))
        );
    }
}
