//! Driver that replays auditor output captured by an external browser run.
//!
//! The recording is a JSON object keyed by page URL. Each value is either
//! the violation list itself or a full axe result with a `violations` field.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{BrowserDriver, DriverError, DynamicError, PageHandle, PageOptions, RawViolation};

#[derive(Deserialize)]
#[serde(untagged)]
enum RecordedPage {
    Violations(Vec<RawViolation>),
    Results { violations: Vec<RawViolation> },
}

impl RecordedPage {
    fn into_violations(self) -> Vec<RawViolation> {
        match self {
            RecordedPage::Violations(violations) | RecordedPage::Results { violations } => violations,
        }
    }
}

#[derive(Debug, Default)]
pub struct RecordedAuditDriver {
    pages: HashMap<String, Vec<RawViolation>>,
    next_id: AtomicU64,
}

impl RecordedAuditDriver {
    pub fn from_file(path: &Path) -> Result<Self, DynamicError> {
        let content = fs::read_to_string(path).map_err(|e| DynamicError::Recording {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_json(&content).map_err(|e| DynamicError::Recording {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let recorded: HashMap<String, RecordedPage> = serde_json::from_str(json)?;
        let pages = recorded
            .into_iter()
            .map(|(url, page)| (url, page.into_violations()))
            .collect();
        Ok(Self {
            pages,
            next_id: AtomicU64::new(0),
        })
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.pages.keys().map(String::as_str)
    }
}

#[async_trait]
impl BrowserDriver for RecordedAuditDriver {
    async fn load_page(&self, url: &str, options: &PageOptions) -> Result<PageHandle, DriverError> {
        if !self.pages.contains_key(url) {
            return Err(DriverError::new(format!("no recorded audit for {url}")));
        }
        if let Some(selector) = &options.wait_for_selector {
            debug!(url, selector = %selector, "wait condition has no effect on recorded pages");
        }
        Ok(PageHandle {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            url: url.to_string(),
        })
    }

    async fn run_audit(&self, page: &PageHandle) -> Result<Vec<RawViolation>, DriverError> {
        self.pages
            .get(&page.url)
            .cloned()
            .ok_or_else(|| DriverError::new(format!("no recorded audit for {}", page.url)))
    }

    async fn close(&self, _page: PageHandle) {}
}
