//! Buildwarden operator CLI.
//!
//! ## Commands
//!
//! - `rules check`: parse a rule file and summarize the table
//! - `evaluate`: run one event through the full pipeline with in-memory
//!   stores and a dry-run SCM backend

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};

use warden_core::{
    init_tracing, DryRunBackend, Event, EventFilterConfig, EventWorkflow, RuleEngine, RuleTable,
    TriggerType,
};
use warden_notify::TracingGateway;
use warden_state::fakes::{MemoryHistoryStore, MemoryPendingActionStore};
use warden_state::{BuildReport, HistoryStore};

#[derive(Parser)]
#[command(name = "warden")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "CI/SCM remediation bot tooling", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect rule tables
    Rules {
        #[command(subcommand)]
        action: RulesAction,
    },

    /// Evaluate one event against a rule table (dry run)
    Evaluate {
        /// Event JSON file (tagged with a `kind` field)
        #[arg(short, long)]
        event: PathBuf,

        /// Rule table TOML; defaults to the built-in standard table
        #[arg(short, long)]
        rules: Option<PathBuf>,

        /// Optional JSON array of build reports to seed the history with
        #[arg(long)]
        history: Option<PathBuf>,

        /// Channel name used in rendered output
        #[arg(long, default_value = "general")]
        channel: String,
    },

    /// Run the periodic repository rules for a branch (dry run)
    Periodic {
        /// Branch to evaluate
        #[arg(short, long)]
        branch: String,

        /// Rule table TOML; defaults to the built-in standard table
        #[arg(short, long)]
        rules: Option<PathBuf>,

        /// JSON array of build reports to seed the history with
        #[arg(long)]
        history: Option<PathBuf>,

        /// Channel name used in rendered output
        #[arg(long, default_value = "general")]
        channel: String,
    },
}

#[derive(Subcommand)]
enum RulesAction {
    /// Parse a rule file and report per-trigger rule counts
    Check {
        /// Rule table TOML file
        #[arg(short, long)]
        file: PathBuf,
    },
}

fn load_table(path: Option<&PathBuf>) -> Result<RuleTable> {
    match path {
        Some(path) => RuleTable::load(path)
            .with_context(|| format!("failed to load rules from {}", path.display())),
        None => Ok(RuleTable::standard()),
    }
}

fn check_rules(file: &PathBuf) -> Result<()> {
    let table = load_table(Some(file))?;

    let triggers = [
        ("build_failed", TriggerType::BuildFailed),
        ("build_passed", TriggerType::BuildPassed),
        ("branch_starts_failing", TriggerType::BranchStartsFailing),
        ("branch_starts_passing", TriggerType::BranchStartsPassing),
        ("pull_request_merged", TriggerType::PullRequestMerged),
        ("pull_request_modified", TriggerType::PullRequestModified),
        ("repository", TriggerType::RepositoryPeriodic),
    ];

    println!("{}: {} rules", file.display(), table.len());
    for (name, trigger) in triggers {
        let rules = table.rules_for(trigger);
        if rules.is_empty() {
            continue;
        }
        let names: Vec<&str> = rules.iter().map(|r| r.name.as_str()).collect();
        println!("  {name}: {}", names.join(", "));
    }
    Ok(())
}

/// In-memory pipeline for one-shot runs: seeded history, dry-run backend,
/// log-only notifications.
async fn build_workflow(
    rules: Option<&PathBuf>,
    history_path: Option<&PathBuf>,
    channel: &str,
) -> Result<EventWorkflow> {
    let history = Arc::new(MemoryHistoryStore::new());
    if let Some(path) = history_path {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let reports: Vec<BuildReport> = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse build reports from {}", path.display()))?;
        for report in &reports {
            history.record_build(report).await?;
        }
        info!("Seeded history with {} build reports", reports.len());
    }

    let table = load_table(rules)?;
    Ok(EventWorkflow::new(
        history,
        Arc::new(MemoryPendingActionStore::new()),
        Arc::new(DryRunBackend::new()),
        Arc::new(TracingGateway::new()),
        RuleEngine::new(table, channel),
        EventFilterConfig::default(),
        channel,
    ))
}

async fn evaluate(
    event_path: &PathBuf,
    rules: Option<&PathBuf>,
    history_path: Option<&PathBuf>,
    channel: &str,
) -> Result<()> {
    let raw = std::fs::read_to_string(event_path)
        .with_context(|| format!("failed to read {}", event_path.display()))?;
    let event: Event = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse event from {}", event_path.display()))?;

    let workflow = build_workflow(rules, history_path, channel).await?;

    let analysis = match event {
        Event::BuildReport(report) => workflow.handle_build_report(report).await?,
        Event::PullRequestMerged(merged) => workflow.handle_pull_request_merged(merged).await?,
        Event::PullRequestCreatedOrUpdated(updated) => {
            workflow.handle_pull_request_updated(updated).await?
        }
    };

    match analysis {
        Some(analysis) => println!("{}", serde_json::to_string_pretty(&analysis)?),
        None => println!("event was filtered out"),
    }
    Ok(())
}

async fn periodic(
    branch: &str,
    rules: Option<&PathBuf>,
    history_path: Option<&PathBuf>,
    channel: &str,
) -> Result<()> {
    let workflow = build_workflow(rules, history_path, channel).await?;
    let analysis = workflow.run_periodic(branch).await?;
    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    init_tracing(cli.json, level);

    match &cli.command {
        Commands::Rules {
            action: RulesAction::Check { file },
        } => check_rules(file),
        Commands::Evaluate {
            event,
            rules,
            history,
            channel,
        } => evaluate(event, rules.as_ref(), history.as_ref(), channel).await,
        Commands::Periodic {
            branch,
            rules,
            history,
            channel,
        } => periodic(branch, rules.as_ref(), history.as_ref(), channel).await,
    }
}
