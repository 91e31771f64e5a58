//! Dynamic analysis of rendered pages.
//!
//! A [`BrowserDriver`] loads pages and runs the DOM auditor; this module
//! bounds every step with a timeout, releases each page whatever happens, and
//! normalizes what the auditor reports. The primary page is load-bearing: its
//! failure fails the run. Secondary pages are best-effort and audited
//! concurrently once the primary has succeeded.

pub mod normalize;
pub mod recorded;

use std::collections::HashSet;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use tokio::task::JoinSet;
use tokio::time;
use tracing::{debug, info, warn};

use crate::issue::{AnalysisResult, AnalysisType, Issue, Target};

pub use normalize::{NodeTarget, RawNode, RawViolation, normalize, wcag_from_tags};
pub use recorded::RecordedAuditDriver;

pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

const SUPPORTED_SCHEMES: &[&str] = &["http", "https", "file"];

/// Failure reported by a driver implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct DriverError {
    message: String,
}

impl DriverError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DynamicError {
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Timed out after {timeout_ms} ms on {url}")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("Failed to load {url}: {source}")]
    PageLoad { url: String, source: DriverError },

    #[error("Audit failed on {url}: {source}")]
    Audit { url: String, source: DriverError },

    #[error("Cannot load recorded audit {}: {message}", path.display())]
    Recording { path: PathBuf, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageOptions {
    pub timeout_ms: u64,
    pub wait_for_selector: Option<String>,
}

impl PageOptions {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// An open page. Must be handed back to [`BrowserDriver::close`].
#[derive(Debug, PartialEq, Eq)]
pub struct PageHandle {
    pub id: u64,
    pub url: String,
}

#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Navigates to `url` and waits for `options.wait_for_selector`, if any.
    async fn load_page(&self, url: &str, options: &PageOptions) -> Result<PageHandle, DriverError>;

    /// Injects the auditor into the page and returns its violations.
    async fn run_audit(&self, page: &PageHandle) -> Result<Vec<RawViolation>, DriverError>;

    async fn close(&self, page: PageHandle);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicRequest {
    pub url: String,
    pub secondary_urls: Vec<String>,
    pub wait_for_selector: Option<String>,
    pub timeout_ms: u64,
}

impl DynamicRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            secondary_urls: Vec::new(),
            wait_for_selector: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_secondary_urls(mut self, urls: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.secondary_urls = urls.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_wait_for_selector(mut self, selector: impl Into<String>) -> Self {
        self.wait_for_selector = Some(selector.into());
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    fn page_options(&self) -> PageOptions {
        PageOptions {
            timeout_ms: self.timeout_ms,
            wait_for_selector: self.wait_for_selector.clone(),
        }
    }
}

pub fn validate_url(url: &str) -> Result<(), DynamicError> {
    let invalid = |reason: String| DynamicError::InvalidUrl {
        url: url.to_string(),
        reason,
    };
    let parsed = Url::parse(url).map_err(|e| invalid(e.to_string()))?;
    if !SUPPORTED_SCHEMES.contains(&parsed.scheme()) {
        return Err(invalid(format!("unsupported scheme '{}'", parsed.scheme())));
    }
    Ok(())
}

pub async fn analyze(
    driver: Arc<dyn BrowserDriver>,
    request: &DynamicRequest,
) -> Result<AnalysisResult, DynamicError> {
    validate_url(&request.url)?;
    for url in &request.secondary_urls {
        validate_url(url)?;
    }

    let options = request.page_options();
    let mut issues = audit_page(driver.as_ref(), &request.url, &options).await?;
    debug!(url = %request.url, issues = issues.len(), "primary page audited");

    let secondary_urls = distinct_secondary_urls(request);

    let mut pages = JoinSet::new();
    for (index, url) in secondary_urls.iter().enumerate() {
        let driver = Arc::clone(&driver);
        let url = url.to_string();
        let options = options.clone();
        pages.spawn(async move {
            let outcome = audit_page(driver.as_ref(), &url, &options).await;
            (index, url, outcome)
        });
    }

    let mut secondary: Vec<(usize, Vec<Issue>)> = Vec::new();
    while let Some(joined) = pages.join_next().await {
        match joined {
            Ok((index, _, Ok(page_issues))) => secondary.push((index, page_issues)),
            Ok((_, url, Err(e))) => warn!(url = %url, error = %e, "skipping secondary page"),
            Err(e) => warn!(error = %e, "secondary page task failed"),
        }
    }
    secondary.sort_by_key(|(index, _)| *index);
    issues.extend(secondary.into_iter().flat_map(|(_, page_issues)| page_issues));

    info!(
        url = %request.url,
        pages = 1 + secondary_urls.len(),
        issues = issues.len(),
        "dynamic analysis finished"
    );

    Ok(AnalysisResult::new(
        AnalysisType::Dynamic,
        issues,
        Some(Target::Url(request.url.clone())),
    ))
}

/// Secondary URLs in request order, without repeats and without the
/// primary. Each page is audited once, so issue ids stay unique.
fn distinct_secondary_urls(request: &DynamicRequest) -> Vec<&str> {
    let mut seen = HashSet::from([request.url.as_str()]);
    request
        .secondary_urls
        .iter()
        .map(String::as_str)
        .filter(|url| {
            let first = seen.insert(*url);
            if !first {
                debug!(url = %url, "skipping repeated page");
            }
            first
        })
        .collect()
}

async fn audit_page(
    driver: &dyn BrowserDriver,
    url: &str,
    options: &PageOptions,
) -> Result<Vec<Issue>, DynamicError> {
    let page = bounded(url, options, driver.load_page(url, options))
        .await?
        .map_err(|source| DynamicError::PageLoad {
            url: url.to_string(),
            source,
        })?;

    let audit = bounded(url, options, driver.run_audit(&page)).await;

    if time::timeout(options.timeout(), driver.close(page)).await.is_err() {
        warn!(url = %url, "closing page timed out");
    }

    let violations = audit?.map_err(|source| DynamicError::Audit {
        url: url.to_string(),
        source,
    })?;

    Ok(normalize(url, &violations))
}

async fn bounded<T>(
    url: &str,
    options: &PageOptions,
    step: impl Future<Output = T>,
) -> Result<T, DynamicError> {
    time::timeout(options.timeout(), step)
        .await
        .map_err(|_| DynamicError::Timeout {
            url: url.to_string(),
            timeout_ms: options.timeout_ms,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::IssueSource;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[derive(Clone)]
    enum PageBehavior {
        Violations(Vec<RawViolation>),
        LoadFails,
        AuditFails,
        HangsOnLoad,
        HangsOnAudit,
    }

    #[derive(Default)]
    struct FakeDriver {
        pages: HashMap<String, PageBehavior>,
        next_id: AtomicU64,
        opened: Mutex<Vec<u64>>,
        closed: Mutex<Vec<u64>>,
        waited_for: Mutex<Vec<Option<String>>>,
    }

    impl FakeDriver {
        fn with_page(mut self, url: &str, behavior: PageBehavior) -> Self {
            self.pages.insert(url.to_string(), behavior);
            self
        }

        fn behavior(&self, url: &str) -> PageBehavior {
            self.pages
                .get(url)
                .cloned()
                .unwrap_or(PageBehavior::Violations(Vec::new()))
        }
    }

    #[async_trait]
    impl BrowserDriver for FakeDriver {
        async fn load_page(&self, url: &str, options: &PageOptions) -> Result<PageHandle, DriverError> {
            self.waited_for.lock().push(options.wait_for_selector.clone());
            match self.behavior(url) {
                PageBehavior::LoadFails => return Err(DriverError::new("net::ERR_CONNECTION_REFUSED")),
                PageBehavior::HangsOnLoad => std::future::pending::<()>().await,
                _ => {}
            }
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            self.opened.lock().push(id);
            Ok(PageHandle {
                id,
                url: url.to_string(),
            })
        }

        async fn run_audit(&self, page: &PageHandle) -> Result<Vec<RawViolation>, DriverError> {
            match self.behavior(&page.url) {
                PageBehavior::Violations(violations) => Ok(violations),
                PageBehavior::AuditFails => Err(DriverError::new("axe is not defined")),
                PageBehavior::HangsOnAudit => {
                    std::future::pending::<()>().await;
                    Ok(Vec::new())
                }
                PageBehavior::LoadFails | PageBehavior::HangsOnLoad => Ok(Vec::new()),
            }
        }

        async fn close(&self, page: PageHandle) {
            self.closed.lock().push(page.id);
        }
    }

    fn violation(id: &str, impact: &str, nodes: usize) -> RawViolation {
        RawViolation {
            id: id.to_string(),
            impact: Some(impact.to_string()),
            tags: vec!["wcag2a".to_string(), "wcag111".to_string()],
            description: format!("{id} description"),
            help: format!("{id} help"),
            help_url: format!("https://example.com/{id}"),
            nodes: (0..nodes)
                .map(|i| RawNode {
                    html: format!("<img id=\"n{i}\">"),
                    target: vec![NodeTarget::Selector(format!("#n{i}"))],
                })
                .collect(),
        }
    }

    fn all_pages_closed(driver: &FakeDriver) -> bool {
        let mut opened = driver.opened.lock().clone();
        let mut closed = driver.closed.lock().clone();
        opened.sort_unstable();
        closed.sort_unstable();
        opened == closed
    }

    const PRIMARY: &str = "http://localhost:4200/";
    const ABOUT: &str = "http://localhost:4200/about";
    const CONTACT: &str = "http://localhost:4200/contact";

    #[tokio::test]
    async fn primary_page_issues_are_normalized() {
        let driver = Arc::new(FakeDriver::default().with_page(
            PRIMARY,
            PageBehavior::Violations(vec![violation("image-alt", "serious", 2)]),
        ));

        let result = analyze(driver.clone(), &DynamicRequest::new(PRIMARY)).await.unwrap();

        assert_eq!(result.analysis_type(), AnalysisType::Dynamic);
        assert_eq!(result.target(), Some(&Target::Url(PRIMARY.to_string())));
        assert_eq!(result.summary().serious, 2);
        assert!(result.issues().iter().all(|i| i.source() == IssueSource::Dynamic));
        assert!(all_pages_closed(&driver));
    }

    #[tokio::test]
    async fn secondary_pages_follow_primary_in_request_order() {
        let driver = Arc::new(
            FakeDriver::default()
                .with_page(PRIMARY, PageBehavior::Violations(vec![violation("a", "minor", 1)]))
                .with_page(ABOUT, PageBehavior::Violations(vec![violation("b", "minor", 1)]))
                .with_page(CONTACT, PageBehavior::Violations(vec![violation("c", "minor", 1)])),
        );
        let request = DynamicRequest::new(PRIMARY).with_secondary_urls([ABOUT, CONTACT]);

        let result = analyze(driver.clone(), &request).await.unwrap();

        let ids: Vec<_> = result.issues().iter().map(Issue::id).collect();
        assert_eq!(
            ids,
            vec![
                "http://localhost:4200/:a-1",
                "http://localhost:4200/about:b-1",
                "http://localhost:4200/contact:c-1",
            ]
        );
        assert!(all_pages_closed(&driver));
    }

    #[tokio::test]
    async fn repeated_pages_are_audited_once() {
        let driver = Arc::new(
            FakeDriver::default()
                .with_page(PRIMARY, PageBehavior::Violations(vec![violation("button-name", "critical", 1)]))
                .with_page(ABOUT, PageBehavior::Violations(vec![violation("link-name", "serious", 1)])),
        );
        let request = DynamicRequest::new(PRIMARY).with_secondary_urls([PRIMARY, ABOUT, ABOUT]);

        let result = analyze(driver.clone(), &request).await.unwrap();

        let ids: Vec<_> = result.issues().iter().map(Issue::id).collect();
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
        assert_eq!(
            ids,
            vec!["http://localhost:4200/:button-name-1", "http://localhost:4200/about:link-name-1"]
        );
        assert_eq!(driver.opened.lock().len(), 2);
        assert!(all_pages_closed(&driver));
    }

    #[tokio::test]
    async fn failing_secondary_page_is_skipped() {
        let driver = Arc::new(
            FakeDriver::default()
                .with_page(PRIMARY, PageBehavior::Violations(vec![violation("a", "minor", 1)]))
                .with_page(ABOUT, PageBehavior::LoadFails)
                .with_page(CONTACT, PageBehavior::AuditFails),
        );
        let request = DynamicRequest::new(PRIMARY).with_secondary_urls([ABOUT, CONTACT]);

        let result = analyze(driver.clone(), &request).await.unwrap();

        assert_eq!(result.issues().len(), 1);
        assert!(all_pages_closed(&driver));
    }

    #[tokio::test]
    async fn primary_load_failure_is_fatal() {
        let driver = Arc::new(FakeDriver::default().with_page(PRIMARY, PageBehavior::LoadFails));
        let request = DynamicRequest::new(PRIMARY).with_secondary_urls([ABOUT]);

        let err = analyze(driver.clone(), &request).await.unwrap_err();

        assert!(matches!(err, DynamicError::PageLoad { ref url, .. } if url == PRIMARY));
        assert!(err.to_string().contains("ERR_CONNECTION_REFUSED"));
        assert!(driver.opened.lock().is_empty(), "secondary pages must not start");
    }

    #[tokio::test]
    async fn primary_audit_failure_still_closes_the_page() {
        let driver = Arc::new(FakeDriver::default().with_page(PRIMARY, PageBehavior::AuditFails));

        let err = analyze(driver.clone(), &DynamicRequest::new(PRIMARY)).await.unwrap_err();

        assert!(matches!(err, DynamicError::Audit { .. }));
        assert_eq!(driver.closed.lock().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_load_times_out() {
        let driver = Arc::new(FakeDriver::default().with_page(PRIMARY, PageBehavior::HangsOnLoad));
        let request = DynamicRequest::new(PRIMARY).with_timeout_ms(500);

        let err = analyze(driver, &request).await.unwrap_err();

        assert!(matches!(err, DynamicError::Timeout { timeout_ms: 500, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_audit_times_out_and_closes_the_page() {
        let driver = Arc::new(FakeDriver::default().with_page(PRIMARY, PageBehavior::HangsOnAudit));
        let request = DynamicRequest::new(PRIMARY).with_timeout_ms(500);

        let err = analyze(driver.clone(), &request).await.unwrap_err();

        assert!(matches!(err, DynamicError::Timeout { .. }));
        assert!(all_pages_closed(&driver));
    }

    #[tokio::test(start_paused = true)]
    async fn one_secondary_timeout_does_not_cancel_the_others() {
        let driver = Arc::new(
            FakeDriver::default()
                .with_page(ABOUT, PageBehavior::HangsOnAudit)
                .with_page(CONTACT, PageBehavior::Violations(vec![violation("c", "serious", 1)])),
        );
        let request = DynamicRequest::new(PRIMARY)
            .with_secondary_urls([ABOUT, CONTACT])
            .with_timeout_ms(1_000);

        let result = analyze(driver.clone(), &request).await.unwrap();

        assert_eq!(result.issues().len(), 1);
        assert_eq!(result.issues()[0].rule(), "c");
        assert!(all_pages_closed(&driver));
    }

    #[tokio::test]
    async fn wait_condition_is_passed_to_every_page() {
        let driver = Arc::new(FakeDriver::default());
        let request = DynamicRequest::new(PRIMARY)
            .with_secondary_urls([ABOUT])
            .with_wait_for_selector("app-root");

        analyze(driver.clone(), &request).await.unwrap();

        let waited = driver.waited_for.lock().clone();
        assert_eq!(waited, vec![Some("app-root".to_string()); 2]);
    }

    #[tokio::test]
    async fn invalid_urls_are_rejected_before_any_page_loads() {
        let driver = Arc::new(FakeDriver::default());
        let request = DynamicRequest::new(PRIMARY).with_secondary_urls(["not a url"]);

        let err = analyze(driver.clone(), &request).await.unwrap_err();

        assert!(matches!(err, DynamicError::InvalidUrl { ref url, .. } if url == "not a url"));
        assert!(driver.waited_for.lock().is_empty());
    }

    #[test]
    fn url_validation_checks_scheme() {
        assert!(validate_url("https://example.com/page").is_ok());
        assert!(validate_url("file:///tmp/index.html").is_ok());
        assert!(matches!(
            validate_url("ftp://example.com"),
            Err(DynamicError::InvalidUrl { reason, .. }) if reason.contains("ftp")
        ));
        assert!(validate_url("localhost:4200").is_err());
    }

    #[test]
    fn request_defaults_to_thirty_second_timeout() {
        let request = DynamicRequest::new(PRIMARY);

        assert_eq!(request.timeout_ms, 30_000);
        assert!(request.secondary_urls.is_empty());
        assert_eq!(request.wait_for_selector, None);
    }
}
