//! axscan core: accessibility issue detection and aggregation.
//!
//! Static analysis checks markup, stylesheets and Angular component sources
//! against the built-in rule catalog. Dynamic analysis normalizes what a DOM
//! auditor reports on rendered pages. Both produce [`AnalysisResult`]s that
//! [`aggregate`] merges into one severity-ranked view.

pub mod aggregate;
pub mod config;
pub mod dynamic;
pub mod guidelines;
pub mod issue;
pub mod markup;
pub mod rules;
pub mod scanner;
pub mod session;

use std::path::Path;
use std::sync::Arc;

pub use aggregate::aggregate;
pub use dynamic::{BrowserDriver, DynamicError, DynamicRequest};
pub use issue::{AnalysisResult, AnalysisType, Issue, IssueSource, Severity, Summary, Target, WcagLevel};
pub use rules::RuleRegistry;
pub use scanner::{FileFilter, ScanError, StaticScanner};
pub use session::{AnalysisSession, SessionError};

/// Scans `root` with the full rule catalog. Empty glob lists mean the
/// defaults.
pub fn run_static_analysis<S: AsRef<str>>(
    root: &Path,
    include: &[S],
    exclude: &[S],
) -> Result<AnalysisResult, ScanError> {
    let filter = FileFilter::new(include, exclude)?;
    StaticScanner::new(RuleRegistry::builtin(), filter).scan(root)
}

/// Audits `request.url`, then its secondary pages, through `driver`.
pub async fn run_dynamic_analysis(
    driver: Arc<dyn BrowserDriver>,
    request: &DynamicRequest,
) -> Result<AnalysisResult, DynamicError> {
    dynamic::analyze(driver, request).await
}
