//! Report formatters.

pub mod json;
pub mod pretty;

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use axscan_core::AnalysisResult;
use clap::ValueEnum;

use self::json::JsonFormatter;
use self::pretty::PrettyFormatter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Pretty,
    Json,
}

/// Writes `result` to `output`, or to stdout when no path is given. Files
/// never receive color codes.
pub fn write_result(result: &AnalysisResult, format: OutputFormat, output: Option<&Path>) -> Result<()> {
    if output.is_some() {
        colored::control::set_override(false);
    }

    let rendered = match format {
        OutputFormat::Pretty => PrettyFormatter::new().format(result),
        OutputFormat::Json => JsonFormatter::new().format(result)?,
    };

    match output {
        Some(path) => fs::write(path, rendered.as_bytes())
            .with_context(|| format!("Cannot write report to {}", path.display())),
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(rendered.as_bytes())?;
            if !rendered.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axscan_core::{AnalysisType, Issue, IssueSource, Severity, WcagLevel};
    use tempfile::tempdir;

    fn sample() -> AnalysisResult {
        let issue = Issue::new("index.html:image-alt-1", "image-alt", Severity::Serious, IssueSource::Static)
            .with_wcag("1.1.1", WcagLevel::A)
            .with_file("index.html");
        AnalysisResult::new(AnalysisType::Static, vec![issue], None)
    }

    #[test]
    fn json_report_is_written_to_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.json");

        let result = sample();

        write_result(&result, OutputFormat::Json, Some(&path)).unwrap();

        let written: AnalysisResult = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, result);
    }

    #[test]
    fn pretty_report_file_has_no_color_codes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.txt");

        write_result(&sample(), OutputFormat::Pretty, Some(&path)).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("image-alt"));
        assert!(!written.contains('\u{1b}'));
    }

    #[test]
    fn unwritable_output_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("report.json");

        let err = write_result(&sample(), OutputFormat::Json, Some(&path)).unwrap_err();

        assert!(err.to_string().contains("Cannot write report"));
    }
}
