//! Guidelines command - shows WCAG success criteria from the guideline cache

use std::env;
use std::process::ExitCode;

use anyhow::Result;
use axscan_core::config::GuidelinesConfig;
use axscan_core::guidelines::{
    DEFAULT_SOURCE_URL, Guideline, GuidelineOrigin, GuidelineService, GuidelineSet, HttpGuidelineFetcher,
    default_cache_path,
};
use clap::Args;
use colored::Colorize;

use super::load_config;
use crate::output::OutputFormat;

#[derive(Args, Debug)]
pub struct GuidelinesArgs {
    /// Success criterion to show (e.g., "1.4.3"); all criteria when omitted
    #[arg(value_name = "CRITERION")]
    pub criterion: Option<String>,

    /// Ignore the cache and fetch from the guideline source
    #[arg(long)]
    pub refresh: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "pretty")]
    pub format: OutputFormat,
}

impl GuidelinesArgs {
    pub async fn run(&self) -> Result<ExitCode> {
        let config = load_config(&env::current_dir()?);
        let service = build_service(&config.guidelines)?;
        let set = if self.refresh {
            service.refresh().await
        } else {
            service.fetch_guidelines().await
        };

        let selected = select(&set, self.criterion.as_deref());
        if let Some(criterion) = self.criterion.as_deref().filter(|_| selected.is_empty()) {
            eprintln!("{} Unknown success criterion '{}'", "error:".red().bold(), criterion);
            return Ok(ExitCode::FAILURE);
        }

        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&selected)?),
            OutputFormat::Pretty => {
                println!();
                for guideline in &selected {
                    print_guideline(guideline);
                }
                println!("  {} {}", "source:".dimmed(), origin_label(set.origin).dimmed());
                println!();
            }
        }
        Ok(ExitCode::SUCCESS)
    }
}

pub(crate) fn build_service(config: &GuidelinesConfig) -> Result<GuidelineService<HttpGuidelineFetcher>> {
    let url = config.source_url.as_deref().unwrap_or(DEFAULT_SOURCE_URL);
    let fetcher = HttpGuidelineFetcher::new(url)?;
    let cache_path = config.cache_path.clone().or_else(default_cache_path);

    let mut service = GuidelineService::new(fetcher, cache_path);
    if let Some(hours) = config.max_age_hours {
        service = service.with_max_age_hours(hours);
    }
    Ok(service)
}

pub(crate) fn print_guideline(guideline: &Guideline) {
    println!(
        "  {} {} ({})",
        guideline.id.bold(),
        guideline.title.bold(),
        guideline.level
    );
    if !guideline.description.is_empty() {
        println!("    {}", guideline.description);
    }
    if !guideline.techniques.is_empty() {
        println!("    {}: {}", "techniques".cyan(), guideline.techniques.join(", "));
    }
    println!("    {}", guideline.url.dimmed());
    println!();
}

pub(crate) fn origin_label(origin: GuidelineOrigin) -> &'static str {
    match origin {
        GuidelineOrigin::Cache => "cache",
        GuidelineOrigin::Live => "live",
        GuidelineOrigin::BuiltIn => "built-in defaults",
    }
}

fn select<'a>(set: &'a GuidelineSet, criterion: Option<&str>) -> Vec<&'a Guideline> {
    match criterion {
        Some(criterion) => set.find(criterion.trim()).into_iter().collect(),
        None => set.guidelines.iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axscan_core::guidelines::builtin_guidelines;
    use std::path::PathBuf;

    fn builtin_set() -> GuidelineSet {
        GuidelineSet {
            guidelines: builtin_guidelines(),
            origin: GuidelineOrigin::BuiltIn,
        }
    }

    #[test]
    fn select_finds_single_criterion() {
        let set = builtin_set();

        let selected = select(&set, Some("1.4.3"));

        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id, "1.4.3");
    }

    #[test]
    fn select_without_criterion_returns_all() {
        let set = builtin_set();
        assert_eq!(select(&set, None).len(), set.guidelines.len());
    }

    #[test]
    fn select_unknown_criterion_is_empty() {
        assert!(select(&builtin_set(), Some("9.9.9")).is_empty());
    }

    #[test]
    fn service_builds_from_configuration() {
        let config = GuidelinesConfig {
            source_url: Some("https://guidelines.example.test/wcag.json".to_string()),
            cache_path: Some(PathBuf::from("/tmp/axscan-guidelines.json")),
            max_age_hours: Some(1),
        };

        assert!(build_service(&config).is_ok());
    }

    #[test]
    fn origin_labels_are_readable() {
        assert_eq!(origin_label(GuidelineOrigin::Cache), "cache");
        assert_eq!(origin_label(GuidelineOrigin::BuiltIn), "built-in defaults");
    }
}
