//! WCAG guideline lookup with an on-disk cache.
//!
//! Guidelines are fetched from a remote source and cached as
//! `{guidelines, timestamp}` JSON. A fresh cache is served as-is; an expired
//! or missing one triggers a live fetch. When the fetch fails the built-in
//! set is returned, so callers always get guidelines back.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::issue::WcagLevel;

pub const DEFAULT_SOURCE_URL: &str = "https://www.w3.org/WAI/WCAG22/wcag.json";
pub const DEFAULT_MAX_AGE_HOURS: u64 = 24;
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guideline {
    /// Success criterion number, e.g. `1.4.3`.
    pub id: String,
    pub level: WcagLevel,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub techniques: Vec<String>,
    pub url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GuidelineError {
    #[error("Failed to fetch guidelines from {url}: {source}")]
    Request { url: String, source: reqwest::Error },

    #[error("Guideline source {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Guideline source {url} returned no guidelines")]
    Empty { url: String },

    #[error("Cannot write guideline cache {}: {source}", path.display())]
    CacheWrite { path: PathBuf, source: io::Error },

    #[error("Cannot encode guideline cache: {0}")]
    Encode(#[from] serde_json::Error),
}

#[async_trait]
pub trait GuidelineFetcher: Send + Sync {
    async fn fetch(&self) -> Result<Vec<Guideline>, GuidelineError>;
}

/// Accepts either a flat list of [`Guideline`] records or the W3C
/// `wcag.json` document.
#[derive(Deserialize)]
#[serde(untagged)]
enum GuidelineDocument {
    Records(Vec<Guideline>),
    W3c { principles: Vec<W3cPrinciple> },
}

#[derive(Deserialize)]
struct W3cPrinciple {
    #[serde(default)]
    guidelines: Vec<W3cGuideline>,
}

#[derive(Deserialize)]
struct W3cGuideline {
    #[serde(default)]
    successcriteria: Vec<W3cCriterion>,
}

#[derive(Deserialize)]
struct W3cCriterion {
    id: String,
    num: String,
    level: String,
    handle: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    techniques: Vec<String>,
}

impl GuidelineDocument {
    fn into_guidelines(self) -> Vec<Guideline> {
        match self {
            GuidelineDocument::Records(records) => records,
            GuidelineDocument::W3c { principles } => principles
                .into_iter()
                .flat_map(|p| p.guidelines)
                .flat_map(|g| g.successcriteria)
                .filter_map(|sc| {
                    Some(Guideline {
                        level: WcagLevel::parse(&sc.level)?,
                        url: format!("https://www.w3.org/WAI/WCAG22/Understanding/{}.html", sc.id),
                        id: sc.num,
                        title: sc.handle,
                        description: sc.title,
                        techniques: sc.techniques,
                    })
                })
                .collect(),
        }
    }
}

pub struct HttpGuidelineFetcher {
    client: reqwest::Client,
    url: String,
}

impl HttpGuidelineFetcher {
    pub fn new(url: impl Into<String>) -> Result<Self, GuidelineError> {
        let url = url.into();
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(concat!("axscan/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| GuidelineError::Request {
                url: url.clone(),
                source,
            })?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl GuidelineFetcher for HttpGuidelineFetcher {
    async fn fetch(&self) -> Result<Vec<Guideline>, GuidelineError> {
        let request_error = |source: reqwest::Error| GuidelineError::Request {
            url: self.url.clone(),
            source,
        };

        let response = self.client.get(&self.url).send().await.map_err(request_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(GuidelineError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let document: GuidelineDocument = response.json().await.map_err(request_error)?;
        let guidelines = document.into_guidelines();
        if guidelines.is_empty() {
            return Err(GuidelineError::Empty {
                url: self.url.clone(),
            });
        }
        Ok(guidelines)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheRecord {
    guidelines: Vec<Guideline>,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuidelineOrigin {
    Cache,
    Live,
    BuiltIn,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuidelineSet {
    pub guidelines: Vec<Guideline>,
    pub origin: GuidelineOrigin,
}

impl GuidelineSet {
    pub fn find(&self, criterion: &str) -> Option<&Guideline> {
        self.guidelines.iter().find(|g| g.id == criterion)
    }
}

pub fn default_cache_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join("axscan").join("guidelines.json"))
}

pub struct GuidelineService<F> {
    fetcher: F,
    cache_path: Option<PathBuf>,
    max_age: chrono::Duration,
}

impl<F: GuidelineFetcher> GuidelineService<F> {
    /// Without a cache path every call fetches live.
    pub fn new(fetcher: F, cache_path: Option<PathBuf>) -> Self {
        Self {
            fetcher,
            cache_path,
            max_age: chrono::Duration::hours(DEFAULT_MAX_AGE_HOURS as i64),
        }
    }

    pub fn with_max_age_hours(mut self, hours: u64) -> Self {
        self.max_age = i64::try_from(hours)
            .ok()
            .and_then(chrono::Duration::try_hours)
            .unwrap_or(chrono::Duration::MAX);
        self
    }

    pub async fn fetch_guidelines(&self) -> GuidelineSet {
        if let Some(guidelines) = self.read_fresh_cache() {
            return GuidelineSet {
                guidelines,
                origin: GuidelineOrigin::Cache,
            };
        }
        self.fetch_live().await
    }

    /// Ignores the cache and fetches live.
    pub async fn refresh(&self) -> GuidelineSet {
        self.fetch_live().await
    }

    async fn fetch_live(&self) -> GuidelineSet {
        match self.fetcher.fetch().await {
            Ok(guidelines) => {
                info!(count = guidelines.len(), "fetched guidelines");
                if let Some(path) = &self.cache_path {
                    if let Err(e) = write_cache(path, &guidelines) {
                        warn!(error = %e, "failed to update guideline cache");
                    }
                }
                GuidelineSet {
                    guidelines,
                    origin: GuidelineOrigin::Live,
                }
            }
            Err(e) => {
                warn!(error = %e, "guideline fetch failed, using built-in guidelines");
                GuidelineSet {
                    guidelines: builtin_guidelines(),
                    origin: GuidelineOrigin::BuiltIn,
                }
            }
        }
    }

    fn read_fresh_cache(&self) -> Option<Vec<Guideline>> {
        let path = self.cache_path.as_deref()?;
        let content = fs::read_to_string(path).ok()?;
        let record: CacheRecord = match serde_json::from_str(&content) {
            Ok(record) => record,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring corrupt guideline cache");
                return None;
            }
        };

        let age = Utc::now().signed_duration_since(record.timestamp);
        if age > self.max_age || record.guidelines.is_empty() {
            debug!(path = %path.display(), age_hours = age.num_hours(), "guideline cache expired");
            return None;
        }
        Some(record.guidelines)
    }
}

fn write_cache(path: &Path, guidelines: &[Guideline]) -> Result<(), GuidelineError> {
    let record = CacheRecord {
        guidelines: guidelines.to_vec(),
        timestamp: Utc::now(),
    };
    let json = serde_json::to_string_pretty(&record)?;
    let cache_write = |source: io::Error| GuidelineError::CacheWrite {
        path: path.to_path_buf(),
        source,
    };
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(cache_write)?;
    }
    fs::write(path, json).map_err(cache_write)
}

/// Criteria the built-in rules map to.
pub fn builtin_guidelines() -> Vec<Guideline> {
    let guideline = |id: &str, level, title: &str, description: &str, slug: &str| Guideline {
        id: id.to_string(),
        level,
        title: title.to_string(),
        description: description.to_string(),
        techniques: Vec::new(),
        url: format!("https://www.w3.org/WAI/WCAG22/Understanding/{slug}.html"),
    };

    vec![
        guideline(
            "1.1.1",
            WcagLevel::A,
            "Non-text Content",
            "All non-text content has a text alternative that serves the equivalent purpose.",
            "non-text-content",
        ),
        guideline(
            "1.3.1",
            WcagLevel::A,
            "Info and Relationships",
            "Information, structure and relationships conveyed through presentation can be programmatically determined.",
            "info-and-relationships",
        ),
        guideline(
            "1.4.3",
            WcagLevel::AA,
            "Contrast (Minimum)",
            "Text has a contrast ratio of at least 4.5:1.",
            "contrast-minimum",
        ),
        guideline(
            "2.1.1",
            WcagLevel::A,
            "Keyboard",
            "All functionality is operable through a keyboard interface.",
            "keyboard",
        ),
        guideline(
            "2.4.3",
            WcagLevel::A,
            "Focus Order",
            "Focusable components receive focus in an order that preserves meaning and operability.",
            "focus-order",
        ),
        guideline(
            "2.4.4",
            WcagLevel::A,
            "Link Purpose (In Context)",
            "The purpose of each link can be determined from the link text or its context.",
            "link-purpose-in-context",
        ),
        guideline(
            "2.4.7",
            WcagLevel::AA,
            "Focus Visible",
            "Any keyboard operable interface has a visible keyboard focus indicator.",
            "focus-visible",
        ),
        guideline(
            "4.1.2",
            WcagLevel::A,
            "Name, Role, Value",
            "User interface components expose their name and role to assistive technologies.",
            "name-role-value",
        ),
    ]
}
