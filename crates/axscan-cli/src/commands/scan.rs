//! Scan command - static analysis of a project directory or a single file

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use axscan_core::config::Config;
use axscan_core::{AnalysisResult, FileFilter, RuleRegistry, Severity, StaticScanner};
use clap::Args;
use tracing::debug;

use super::{exit_code, load_config, parse_severity};
use crate::output::{OutputFormat, write_result};

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Project directory or single file to scan
    #[arg(value_name = "PATH", default_value = ".")]
    pub path: PathBuf,

    /// Only scan files matching this glob (repeatable, replaces configured includes)
    #[arg(long, value_name = "GLOB")]
    pub include: Vec<String>,

    /// Skip files matching this glob (repeatable, added to configured excludes)
    #[arg(long, value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Output format for the report
    #[arg(short, long, value_enum, default_value = "pretty")]
    pub format: OutputFormat,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Exit with code 1 when an issue at or above this severity is found
    #[arg(long, value_name = "SEVERITY", value_parser = parse_severity)]
    pub fail_on: Option<Severity>,
}

impl ScanArgs {
    pub fn run(&self) -> Result<ExitCode> {
        let result = self.analyze()?;
        write_result(&result, self.format, self.output.as_deref())?;
        Ok(exit_code(&result, self.fail_on))
    }

    fn analyze(&self) -> Result<AnalysisResult> {
        let config = load_config(&self.path);
        let (include, exclude) = self.globs(&config);
        debug!(include = ?include, exclude = ?exclude, "resolved scan globs");

        let filter = FileFilter::new(&include, &exclude)?;
        let scanner = StaticScanner::new(RuleRegistry::with_config(&config.rules), filter);
        Ok(scanner.scan(&self.path)?)
    }

    fn globs(&self, config: &Config) -> (Vec<String>, Vec<String>) {
        let include = if self.include.is_empty() {
            config.include.clone()
        } else {
            self.include.clone()
        };
        let exclude = config.exclude.iter().chain(&self.exclude).cloned().collect();
        (include, exclude)
    }
}
