//! JSON output. The document is the serialized [`AnalysisResult`], so saved
//! reports can be fed back into `axscan report`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use axscan_core::AnalysisResult;

pub struct JsonFormatter;

impl JsonFormatter {
    pub fn new() -> Self {
        Self
    }

    pub fn format(&self, result: &AnalysisResult) -> Result<String> {
        Ok(serde_json::to_string_pretty(result)?)
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

/// Loads a report previously written with `--format json`.
pub fn read_result(path: &Path) -> Result<AnalysisResult> {
    let content = fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("{} is not an axscan JSON report", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axscan_core::{AnalysisType, Issue, IssueSource, Severity, Target, WcagLevel};
    use serde_json::Value;
    use tempfile::tempdir;

    fn sample() -> AnalysisResult {
        let issues = vec![
            Issue::new("http://localhost/:button-name-1", "button-name", Severity::Critical, IssueSource::Dynamic)
                .with_wcag("4.1.2", WcagLevel::A)
                .with_selector("button.close"),
        ];
        AnalysisResult::new(
            AnalysisType::Dynamic,
            issues,
            Some(Target::Url("http://localhost/".to_string())),
        )
    }

    #[test]
    fn json_output_carries_summary_and_type() {
        let json = JsonFormatter::new().format(&sample()).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["analysisType"], "dynamic");
        assert_eq!(value["summary"]["total"], 1);
        assert_eq!(value["summary"]["critical"], 1);
        assert_eq!(value["url"], "http://localhost/");
    }

    #[test]
    fn json_output_lists_issues_in_order() {
        let json = JsonFormatter::new().format(&sample()).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["issues"][0]["id"], "http://localhost/:button-name-1");
        assert_eq!(value["issues"][0]["severity"], "critical");
    }

    #[test]
    fn read_result_loads_saved_report() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.json");
        let result = sample();
        fs::write(&path, JsonFormatter::new().format(&result).unwrap()).unwrap();

        assert_eq!(read_result(&path).unwrap(), result);
    }

    #[test]
    fn read_result_rejects_foreign_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("other.json");
        fs::write(&path, r#"{"name": "not a report"}"#).unwrap();

        let err = read_result(&path).unwrap_err();

        assert!(err.to_string().contains("is not an axscan JSON report"));
    }

    #[test]
    fn read_result_reports_missing_file() {
        let dir = tempdir().unwrap();
        let err = read_result(&dir.path().join("absent.json")).unwrap_err();
        assert!(err.to_string().contains("Cannot read"));
    }
}
