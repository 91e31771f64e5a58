//! Report command - merges saved JSON reports into one ranked report

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use axscan_core::{AnalysisResult, AnalysisSession, Severity};
use clap::Args;
use tracing::info;

use super::{exit_code, parse_severity};
use crate::output::json::read_result;
use crate::output::{OutputFormat, write_result};

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Reports written by `scan` or `audit` with `--format json`
    #[arg(value_name = "RESULT", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output format for the merged report
    #[arg(short, long, value_enum, default_value = "pretty")]
    pub format: OutputFormat,

    /// Write the merged report to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Exit with code 1 when an issue at or above this severity is present
    #[arg(long, value_name = "SEVERITY", value_parser = parse_severity)]
    pub fail_on: Option<Severity>,
}

impl ReportArgs {
    pub fn run(&self) -> Result<ExitCode> {
        let report = self.merge()?;
        write_result(&report, self.format, self.output.as_deref())?;
        Ok(exit_code(&report, self.fail_on))
    }

    fn merge(&self) -> Result<AnalysisResult> {
        let session = AnalysisSession::new();
        for input in &self.inputs {
            let result = read_result(input)?;
            info!(path = %input.display(), issues = result.issues().len(), "loaded report");
            session.record(result);
        }
        Ok(session.report()?)
    }
}
