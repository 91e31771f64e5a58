//! Explain command - provides detailed explanation of a rule

use std::env;
use std::process::ExitCode;

use anyhow::Result;
use axscan_core::RuleRegistry;
use axscan_core::guidelines::{GuidelineOrigin, GuidelineSet, builtin_guidelines};
use axscan_core::rules::{Check, Rule};
use clap::Args;
use colored::Colorize;

use super::guidelines::{build_service, origin_label, print_guideline};
use super::load_config;

#[derive(Args, Debug)]
pub struct ExplainArgs {
    #[arg(value_name = "RULE_ID", help = "Rule ID to explain (e.g., \"image-alt\")")]
    pub rule_id: String,

    /// Use the built-in guideline set instead of the cache or network
    #[arg(long)]
    pub offline: bool,
}

impl ExplainArgs {
    pub async fn run(&self) -> Result<ExitCode> {
        let config = load_config(&env::current_dir()?);
        let registry = RuleRegistry::with_config(&config.rules);

        let Some(rule) = registry.get(self.rule_id.trim()) else {
            eprintln!("{} Rule '{}' not found", "error:".red().bold(), self.rule_id);
            eprintln!();
            eprintln!("Available rules:");
            for rule in registry.rules() {
                eprintln!("  {} - {}", rule.metadata.id.cyan(), rule.metadata.name);
            }
            return Ok(ExitCode::FAILURE);
        };

        print_rule(rule, registry.is_enabled(rule.metadata.id));

        let set = if self.offline {
            GuidelineSet {
                guidelines: builtin_guidelines(),
                origin: GuidelineOrigin::BuiltIn,
            }
        } else {
            build_service(&config.guidelines)?.fetch_guidelines().await
        };

        match set.find(rule.metadata.wcag_criterion) {
            Some(guideline) => {
                println!("  {}:", "Guideline".cyan());
                println!();
                print_guideline(guideline);
                println!("  {} {}", "source:".dimmed(), origin_label(set.origin).dimmed());
            }
            None => println!(
                "  {}: no guideline found for {}",
                "Guideline".cyan(),
                rule.metadata.wcag_criterion
            ),
        }
        println!();

        Ok(ExitCode::SUCCESS)
    }
}

fn print_rule(rule: &Rule, is_enabled: bool) {
    let metadata = &rule.metadata;

    println!();
    println!("{}", format!("Rule {}", metadata.id).bold());
    println!();
    println!("  {}: {}", "Name".cyan(), metadata.name);
    println!("  {}: {}", "Description".cyan(), metadata.description);
    println!("  {}: {}", "Category".cyan(), metadata.category);
    println!("  {}: {}", "Severity".cyan(), metadata.severity);
    println!(
        "  {}: {} (level {})",
        "WCAG".cyan(),
        metadata.wcag_criterion,
        metadata.wcag_level
    );
    println!("  {}: {}", "Applies to".cyan(), applies_to(rule));
    println!("  {}: {}", "Fix".cyan(), metadata.help);
    println!("  {}: {}", "Documentation".cyan(), metadata.help_url);
    println!();
    if is_enabled {
        println!("  {}: {}", "Status".cyan(), "enabled".green());
    } else {
        println!("  {}: {}", "Status".cyan(), "disabled".red());
    }
    println!();
}

fn applies_to(rule: &Rule) -> String {
    match rule.check {
        Check::Element { tags, .. } if tags.contains(&"*") => "every element".to_string(),
        Check::Element { tags, .. } => tags
            .iter()
            .map(|tag| format!("<{}>", tag))
            .collect::<Vec<_>>()
            .join(", "),
        Check::Source { kinds, .. } => kinds
            .iter()
            .map(|kind| kind.as_str())
            .collect::<Vec<_>>()
            .join(", "),
    }
}
