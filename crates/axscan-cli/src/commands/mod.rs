//! CLI command implementations

pub mod audit;
pub mod explain;
pub mod guidelines;
pub mod report;
pub mod rules;
pub mod scan;

pub use audit::AuditArgs;
pub use explain::ExplainArgs;
pub use guidelines::GuidelinesArgs;
pub use report::ReportArgs;
pub use rules::RulesArgs;
pub use scan::ScanArgs;

use std::path::Path;
use std::process::ExitCode;

use axscan_core::config::{Config, load_config_or_default_with_warnings};
use axscan_core::{AnalysisResult, Severity};
use clap::Subcommand;
use colored::Colorize;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check markup, stylesheets and Angular components in a project
    Scan(ScanArgs),

    /// Normalize a recorded DOM audit of rendered pages
    Audit(AuditArgs),

    /// Merge saved JSON reports into one ranked report
    Report(ReportArgs),

    /// Show detailed explanation for a specific rule
    Explain(ExplainArgs),

    /// List the built-in rules
    Rules(RulesArgs),

    /// Show WCAG success criteria from the guideline cache
    Guidelines(GuidelinesArgs),
}

/// Configuration for `start_dir`, with unknown-key and load warnings printed
/// to stderr.
pub(crate) fn load_config(start_dir: &Path) -> Config {
    let config_result = load_config_or_default_with_warnings(start_dir);
    for warning in &config_result.warnings {
        eprintln!("{} {}", "warning:".yellow().bold(), warning);
    }
    config_result.config
}

pub(crate) fn parse_severity(value: &str) -> Result<Severity, String> {
    Severity::parse(value).ok_or_else(|| {
        format!(
            "invalid severity '{}' (expected critical, serious, moderate or minor)",
            value
        )
    })
}

/// True when `result` holds an issue at least as severe as `threshold`.
pub(crate) fn threshold_reached(result: &AnalysisResult, threshold: Option<Severity>) -> bool {
    threshold.is_some_and(|threshold| result.issues().iter().any(|i| i.severity() <= threshold))
}

pub(crate) fn exit_code(result: &AnalysisResult, fail_on: Option<Severity>) -> ExitCode {
    if threshold_reached(result, fail_on) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
