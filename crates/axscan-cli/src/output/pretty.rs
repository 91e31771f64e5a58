//! Pretty formatter for human-readable terminal output
//!
//! Groups issues by file or audited page, keeping the report's severity
//! order inside each group, and ends with a per-severity summary.

use axscan_core::{AnalysisResult, Issue, Severity, Target};
use colored::{ColoredString, Colorize};

pub struct PrettyFormatter;

impl PrettyFormatter {
    pub fn new() -> Self {
        Self
    }

    pub fn format(&self, result: &AnalysisResult) -> String {
        let mut output = String::new();
        output.push_str(&self.format_header(result));
        output.push('\n');

        for (location, issues) in group_by_location(result.issues()) {
            output.push('\n');
            output.push_str(&location.underline().to_string());
            output.push('\n');
            for issue in issues {
                output.push_str(&self.format_issue(issue));
                output.push('\n');
            }
        }

        output.push_str(&self.format_summary(result));
        output
    }

    fn format_header(&self, result: &AnalysisResult) -> String {
        let target = match result.target() {
            Some(Target::Project(path)) => format!(" of {}", path.display()),
            Some(Target::Url(url)) => format!(" of {}", url),
            None => String::new(),
        };
        format!(
            "{} analysis{} ({})",
            result.analysis_type().as_str().bold(),
            target,
            result.timestamp().format("%Y-%m-%d %H:%M:%S UTC").to_string().dimmed()
        )
    }

    fn format_issue(&self, issue: &Issue) -> String {
        let mut lines = vec![format!(
            "  {} {} {} [{} {}]",
            self.colorize_severity(issue.severity()),
            issue.rule().dimmed(),
            issue.description(),
            issue.wcag_criterion(),
            issue.wcag_level()
        )];

        if let Some(selector) = issue.selector() {
            lines.push(format!("    {} {}", "-->".blue(), selector));
        }
        if let Some(element) = issue.element() {
            lines.push(format!("    {} {}", "|".blue(), element));
        }
        if !issue.help_text().is_empty() {
            lines.push(format!("    {} {} {}", "=".blue(), "help:".green(), issue.help_text()));
        }
        if !issue.wcag_url().is_empty() {
            lines.push(format!("    {} {}", "=".blue(), issue.wcag_url().dimmed()));
        }

        lines.join("\n")
    }

    fn colorize_severity(&self, severity: Severity) -> ColoredString {
        match severity {
            Severity::Critical => "critical".red().bold(),
            Severity::Serious => "serious".yellow().bold(),
            Severity::Moderate => "moderate".blue().bold(),
            Severity::Minor => "minor".cyan().bold(),
        }
    }

    fn format_summary(&self, result: &AnalysisResult) -> String {
        let summary = result.summary();
        if summary.total == 0 {
            return format!("\n{}\n", "No accessibility issues found.".green());
        }

        let issues_str = if summary.total == 1 { "issue" } else { "issues" };
        format!(
            "\nFound {} {} ({}, {}, {}, {})\n",
            summary.total.to_string().bold(),
            issues_str,
            format!("{} critical", summary.critical).red(),
            format!("{} serious", summary.serious).yellow(),
            format!("{} moderate", summary.moderate).blue(),
            format!("{} minor", summary.minor).cyan()
        )
    }
}

impl Default for PrettyFormatter {
    fn default() -> Self {
        Self::new()
    }
}

/// File for static issues, page URL for dynamic ones. Groups appear in the
/// order their first issue does.
fn group_by_location(issues: &[Issue]) -> Vec<(String, Vec<&Issue>)> {
    let mut groups: Vec<(String, Vec<&Issue>)> = Vec::new();
    for issue in issues {
        let location = location(issue);
        match groups.iter_mut().find(|(l, _)| *l == location) {
            Some((_, members)) => members.push(issue),
            None => groups.push((location, vec![issue])),
        }
    }
    groups
}

/// Dynamic issue ids are `<url>:<rule>-<n>`; the URL is recovered from there.
fn location(issue: &Issue) -> String {
    if let Some(file) = issue.file() {
        return file.to_string();
    }
    let marker = format!(":{}-", issue.rule());
    match issue.id().rfind(&marker) {
        Some(end) => issue.id()[..end].to_string(),
        None => issue.id().to_string(),
    }
}
