//! Rules command - lists the built-in rule catalog

use std::env;
use std::process::ExitCode;

use anyhow::Result;
use axscan_core::rules::{Rule, RuleCategory};
use axscan_core::{RuleRegistry, Severity, WcagLevel};
use clap::Args;
use colored::Colorize;

use super::{load_config, parse_severity};

#[derive(Args, Debug)]
pub struct RulesArgs {
    /// Only list rules in this category (html, aria, angular, keyboard, color)
    #[arg(long, value_name = "CATEGORY", value_parser = parse_category)]
    pub category: Option<RuleCategory>,

    /// Only list rules for this conformance level (A, AA, AAA)
    #[arg(long, value_name = "LEVEL", value_parser = parse_level)]
    pub level: Option<WcagLevel>,

    /// Only list rules with this severity
    #[arg(long, value_name = "SEVERITY", value_parser = parse_severity)]
    pub severity: Option<Severity>,
}

fn parse_category(value: &str) -> Result<RuleCategory, String> {
    RuleCategory::parse(value).ok_or_else(|| {
        let known: Vec<_> = RuleCategory::ALL.iter().map(|c| c.as_str()).collect();
        format!("unknown category '{}' (expected one of: {})", value, known.join(", "))
    })
}

fn parse_level(value: &str) -> Result<WcagLevel, String> {
    WcagLevel::parse(value).ok_or_else(|| format!("unknown level '{}' (expected A, AA or AAA)", value))
}

impl RulesArgs {
    pub fn run(&self) -> Result<ExitCode> {
        let config = load_config(&env::current_dir()?);
        let registry = RuleRegistry::with_config(&config.rules);
        let rules = self.select(&registry);

        if rules.is_empty() {
            println!("No rules match the given filters.");
            return Ok(ExitCode::SUCCESS);
        }

        println!();
        println!(
            "  {:<30} {:<9} {:<9} {:<10} {}",
            "RULE".bold(),
            "CATEGORY".bold(),
            "SEVERITY".bold(),
            "WCAG".bold(),
            "STATUS".bold()
        );
        for rule in &rules {
            let metadata = &rule.metadata;
            let status = if registry.is_enabled(metadata.id) {
                "enabled".green()
            } else {
                "disabled".red()
            };
            println!(
                "  {:<30} {:<9} {:<9} {:<10} {}",
                metadata.id.cyan(),
                metadata.category.as_str(),
                metadata.severity.as_str(),
                format!("{} {}", metadata.wcag_criterion, metadata.wcag_level),
                status
            );
        }
        println!();
        println!("  {} rules. Run `axscan explain <RULE>` for details.", rules.len());
        println!();

        Ok(ExitCode::SUCCESS)
    }

    fn select<'a>(&self, registry: &'a RuleRegistry) -> Vec<&'a Rule> {
        let candidates: Vec<&Rule> = match self.category {
            Some(category) => registry.by_category(category).collect(),
            None => registry.rules().collect(),
        };
        candidates
            .into_iter()
            .filter(|rule| self.level.is_none_or(|level| rule.metadata.wcag_level == level))
            .filter(|rule| self.severity.is_none_or(|severity| rule.metadata.severity == severity))
            .collect()
    }
}
