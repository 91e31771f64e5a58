//! Static analysis of a project tree.
//!
//! Files are discovered once, then checked in parallel. Each file is
//! independent: a file that cannot be read is logged and skipped, and a rule
//! that faults on one element does not stop the others.

pub mod component;
pub mod files;
pub mod stylesheet;

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::issue::{AnalysisResult, AnalysisType, Issue, IssueSource, Target};
use crate::markup::check_markup;
use crate::rules::{Rule, RuleRegistry};

pub use files::{DEFAULT_EXCLUDE, DEFAULT_INCLUDE, FileFilter, discover_files, relative_path};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// `.html` and `.htm` templates and pages.
    Markup,
    /// `.css`, `.scss`, `.sass` and `.less`.
    Stylesheet,
    /// `.ts` and `.js` sources; only Angular components are checked.
    Component,
}

impl FileKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "html" | "htm" => Some(FileKind::Markup),
            "css" | "scss" | "sass" | "less" => Some(FileKind::Stylesheet),
            "ts" | "js" => Some(FileKind::Component),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FileKind::Markup => "markup",
            FileKind::Stylesheet => "stylesheet",
            FileKind::Component => "component",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Path does not exist: {}", path.display())]
    InvalidRoot { path: PathBuf },

    #[error("Cannot read project root {}: {source}", path.display())]
    RootUnreadable { path: PathBuf, source: io::Error },

    #[error("Invalid glob pattern '{pattern}': {source}")]
    InvalidGlob {
        pattern: String,
        source: globset::Error,
    },
}

pub struct StaticScanner {
    registry: RuleRegistry,
    filter: FileFilter,
}

impl StaticScanner {
    pub fn new(registry: RuleRegistry, filter: FileFilter) -> Self {
        Self { registry, filter }
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    pub fn scan(&self, root: &Path) -> Result<AnalysisResult, ScanError> {
        let files = discover_files(root, &self.filter)?;
        debug!(root = %root.display(), files = files.len(), "discovered files");

        // A single-file root reports paths relative to its directory.
        let base = if root.is_file() {
            root.parent().unwrap_or(root)
        } else {
            root
        };

        let issues: Vec<Issue> = files
            .par_iter()
            .map(|path| self.scan_file(base, path))
            .collect::<Vec<_>>()
            .into_iter()
            .flatten()
            .collect();

        info!(
            root = %root.display(),
            files = files.len(),
            issues = issues.len(),
            "static analysis finished"
        );

        Ok(AnalysisResult::new(
            AnalysisType::Static,
            issues,
            Some(Target::Project(root.to_path_buf())),
        ))
    }

    fn scan_file(&self, base: &Path, path: &Path) -> Vec<Issue> {
        let Some(kind) = FileKind::from_path(path) else {
            return Vec::new();
        };
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable file");
                return Vec::new();
            }
        };
        self.scan_source(&relative_path(base, path), kind, &content)
    }

    /// Checks one file's content. `file` is the path recorded on each issue
    /// and the prefix of its id.
    pub fn scan_source(&self, file: &str, kind: FileKind, content: &str) -> Vec<Issue> {
        let mut issues = IssueCollector::new(file);

        match kind {
            FileKind::Markup => {
                self.check_template(content, &mut issues);
                self.check_source(kind, content, &mut issues);
            }
            FileKind::Component => {
                if !component::is_component(content) {
                    return Vec::new();
                }
                for template in component::inline_templates(content) {
                    self.check_template(template, &mut issues);
                }
                self.check_source(kind, content, &mut issues);
            }
            FileKind::Stylesheet => {
                let css = stylesheet::strip_comments(content);
                self.check_source(kind, &css, &mut issues);
            }
        }

        issues.into_issues()
    }

    fn check_template(&self, markup: &str, issues: &mut IssueCollector<'_>) {
        for violation in check_markup(&self.registry, markup) {
            issues.push(violation.rule, Some(violation.element), Some(violation.selector));
        }
    }

    fn check_source(&self, kind: FileKind, content: &str, issues: &mut IssueCollector<'_>) {
        for rule in self.registry.source_rules_for(kind) {
            match self.registry.detect(rule, content) {
                Ok(matches) => {
                    for m in matches {
                        issues.push(rule, Some(m.snippet), None);
                    }
                }
                Err(message) => {
                    warn!(
                        rule = rule.metadata.id,
                        file = issues.file,
                        error = %message,
                        "source rule failed, skipping file"
                    );
                }
            }
        }
    }
}

/// Builds issues for one file. Ids are `<file>:<rule>-<n>`, numbered per
/// rule from 1, so they are unique across a whole run.
struct IssueCollector<'f> {
    file: &'f str,
    counters: HashMap<&'static str, usize>,
    issues: Vec<Issue>,
}

impl<'f> IssueCollector<'f> {
    fn new(file: &'f str) -> Self {
        Self {
            file,
            counters: HashMap::new(),
            issues: Vec::new(),
        }
    }

    fn push(&mut self, rule: &Rule, element: Option<String>, selector: Option<String>) {
        let meta = &rule.metadata;
        let n = self.counters.entry(meta.id).or_insert(0);
        *n += 1;

        let mut issue = Issue::new(
            format!("{}:{}-{}", self.file, meta.id, n),
            meta.id,
            meta.severity,
            IssueSource::Static,
        )
        .with_wcag(meta.wcag_criterion, meta.wcag_level)
        .with_description(meta.description)
        .with_help(meta.help, meta.help_url)
        .with_file(self.file);

        if let Some(element) = element {
            issue = issue.with_element(element);
        }
        if let Some(selector) = selector {
            issue = issue.with_selector(selector);
        }
        self.issues.push(issue);
    }

    fn into_issues(self) -> Vec<Issue> {
        self.issues
    }
}
