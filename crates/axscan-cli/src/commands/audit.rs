//! Audit command - normalizes a recorded DOM audit of rendered pages

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use axscan_core::config::DynamicConfig;
use axscan_core::dynamic::{DEFAULT_TIMEOUT_MS, RecordedAuditDriver};
use axscan_core::{AnalysisResult, DynamicRequest, Severity, run_dynamic_analysis};
use clap::Args;

use super::{exit_code, load_config, parse_severity};
use crate::output::{OutputFormat, write_result};

#[derive(Args, Debug)]
pub struct AuditArgs {
    /// Primary page URL (http, https or file)
    #[arg(value_name = "URL")]
    pub url: String,

    /// Recorded auditor output, a JSON object keyed by page URL
    #[arg(long, value_name = "FILE")]
    pub recorded: PathBuf,

    /// Secondary page to audit after the primary one (repeatable)
    #[arg(long = "page", value_name = "URL")]
    pub pages: Vec<String>,

    /// CSS selector to wait for before auditing each page
    #[arg(long, value_name = "SELECTOR")]
    pub wait_for: Option<String>,

    /// Per-step timeout in milliseconds
    #[arg(long, value_name = "MS")]
    pub timeout: Option<u64>,

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

impl AuditArgs {
    pub async fn run(&self) -> Result<ExitCode> {
        let config = load_config(&env::current_dir()?);
        let result = self.analyze(&config.dynamic).await?;
        write_result(&result, self.format, self.output.as_deref())?;
        Ok(exit_code(&result, self.fail_on))
    }

    async fn analyze(&self, config: &DynamicConfig) -> Result<AnalysisResult> {
        let driver = Arc::new(RecordedAuditDriver::from_file(&self.recorded)?);
        Ok(run_dynamic_analysis(driver, &self.request(config)).await?)
    }

    /// Flags win over `[dynamic]` configuration.
    fn request(&self, config: &DynamicConfig) -> DynamicRequest {
        let secondary = if self.pages.is_empty() {
            config.secondary_urls.clone()
        } else {
            self.pages.clone()
        };
        let timeout_ms = self.timeout.or(config.timeout_ms).unwrap_or(DEFAULT_TIMEOUT_MS);

        let mut request = DynamicRequest::new(self.url.as_str())
            .with_secondary_urls(secondary)
            .with_timeout_ms(timeout_ms);
        if let Some(selector) = self.wait_for.as_ref().or(config.wait_for_selector.as_ref()) {
            request = request.with_wait_for_selector(selector.as_str());
        }
        request
    }
}
