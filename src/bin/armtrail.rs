//! Command-line front end over the matcher, action resolver and planner.
//!
//! Every subcommand prints one JSON document on stdout. Diagnostics and log
//! events go to stderr. Exit status is 0 on success, 1 on errors (bad input,
//! unreadable catalog) and 2 when an identifier has no match or `lint`
//! reports findings.

use anyhow::{Context, Result};
use armtrail::{
    ExpansionPlanner, LiteralCase, MatchOptions, MatchResult, NavigationError, NavigatorConfig,
    TemplateMatcher, TemplateRegistry, available_actions, logging::init_logging,
};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::{Value, json};
use std::path::PathBuf;

const EXIT_MISS: i32 = 2;

#[derive(Parser)]
#[command(
    name = "armtrail",
    version,
    about = "Match resource identifiers against a resource type catalog"
)]
struct Cli {
    /// Catalog document (overrides ARMTRAIL_CATALOG).
    #[arg(long, global = true, value_name = "PATH")]
    catalog: Option<PathBuf>,

    /// Literal comparison policy: `namespace` or `all` (overrides ARMTRAIL_LITERAL_CASE).
    #[arg(long, global = true, value_name = "POLICY", value_parser = parse_literal_case)]
    literal_case: Option<LiteralCase>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the node an identifier resolves to.
    Match { id: String },
    /// List the verbs and bound URLs available at an identifier.
    Actions { id: String },
    /// Show the children and drill-downs below an identifier.
    Expand {
        id: String,
        /// Also build drill-down paths for this item identifier.
        #[arg(long, value_name = "NAME")]
        item: Option<String>,
    },
    /// Report catalog defects found while building the registry.
    Lint,
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let mut config = NavigatorConfig::from_env()?;
    if let Some(path) = cli.catalog {
        config.catalog_path = Some(path);
    }
    if let Some(case) = cli.literal_case {
        config.literal_case = case;
    }
    init_logging(&config.log_filter)?;

    let registry = TemplateRegistry::load(config.require_catalog()?)?;
    let matcher = TemplateMatcher::with_options(
        &registry,
        MatchOptions {
            literal_case: config.literal_case,
        },
    );

    match cli.command {
        Command::Match { id } => with_match(&matcher, &id, |result| {
            Ok(json!({
                "catalog": registry.key(),
                "match": result.summary(&registry),
            }))
        }),
        Command::Actions { id } => with_match(&matcher, &id, |result| {
            let set = available_actions(result);
            let inconsistencies: Vec<String> =
                set.inconsistencies.iter().map(ToString::to_string).collect();
            Ok(json!({
                "catalog": registry.key(),
                "match": result.summary(&registry),
                "actions": set.actions,
                "inconsistencies": inconsistencies,
            }))
        }),
        Command::Expand { id, item } => with_match(&matcher, &id, |result| {
            let planner = ExpansionPlanner::new(&registry);
            let layer = planner.next_layer(result);
            let mut doc = json!({
                "catalog": registry.key(),
                "match": result.summary(&registry),
                "next_layer": layer,
            });
            if let Some(item) = item.as_deref() {
                let paths = layer
                    .drill_downs
                    .iter()
                    .map(|entry| planner.drill_down_path(result, entry, item))
                    .collect::<Result<Vec<_>, _>>()?;
                doc["drill_down_paths"] = to_value(&paths)?;
            }
            Ok(doc)
        }),
        Command::Lint => {
            let findings = registry.lint();
            for finding in findings {
                eprintln!("{finding}");
            }
            print_json(&json!({
                "catalog": registry.key(),
                "nodes": registry.len(),
                "findings": findings,
            }))?;
            Ok(if findings.is_empty() { 0 } else { EXIT_MISS })
        }
    }
}

/// Match `id` and print the document built from the result. A miss is
/// reported on stderr with exit status 2; malformed input is an error.
fn with_match<'r>(
    matcher: &TemplateMatcher<'r>,
    id: &str,
    render: impl FnOnce(&MatchResult<'r>) -> Result<Value>,
) -> Result<i32> {
    match matcher.match_path(id) {
        Ok(result) => {
            print_json(&render(&result)?)?;
            Ok(0)
        }
        Err(err @ NavigationError::NoMatch { .. }) => {
            eprintln!("{err}");
            Ok(EXIT_MISS)
        }
        Err(err) => Err(err).with_context(|| format!("matching {id}")),
    }
}

fn to_value<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).context("serializing output")
}

fn print_json(value: &Value) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("serializing output")?;
    println!("{rendered}");
    Ok(())
}

fn parse_literal_case(raw: &str) -> Result<LiteralCase, String> {
    LiteralCase::parse(raw).ok_or_else(|| format!("expected 'namespace' or 'all', got '{raw}'"))
}
