//! Bug triage CLI
//!
//! The `bugtriage` command routes defect reports to developers.
//!
//! ## Commands
//!
//! - `normalize`, `tags`: inspect the text pipeline offline
//! - `resolve`: match an assignee hint against the roster
//! - `predict`: triage a report without storing it
//! - `submit`, `import`: triage and store one report or a JSON batch
//! - `bugs`, `stats`, `assign`, `delete`, `backfill-tags`: manage stored bugs
//! - `developers`, `add-developer`: manage the roster

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{warn, Level};

use triage_core::service::DEVELOPER_ROLE;
use triage_core::telemetry::init_tracing;
use triage_core::{
    classify, normalize, resolve, Classifier, ClassifierConfig, HttpClassifier, ImportStatus,
    RawReport, StaticClassifier, Threshold, TriageConfig, TriageContext, TriageDecision,
    TriageService,
};
use triage_state::{BugId, Identity, ReportSource, SurrealRecordStore};

#[derive(Parser)]
#[command(name = "bugtriage")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Route bug reports to developers", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Scoring endpoint of the assignee classifier
    #[arg(long, global = true, env = "TRIAGE_CLASSIFIER_URL")]
    classifier_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the normalized tokens of a text
    Normalize { text: String },

    /// Print the category tags of a text
    Tags { text: String },

    /// Resolve an assignee hint against the roster
    Resolve { hint: String },

    /// List known identities
    Developers {
        /// Only list identities with this role
        #[arg(short, long)]
        role: Option<String>,
    },

    /// Register an identity
    AddDeveloper {
        /// Unique identity id
        id: String,

        /// Display name ("Daniel Imms")
        #[arg(short, long)]
        name: String,

        /// Login handle
        #[arg(short, long)]
        login: String,

        #[arg(short, long)]
        email: Option<String>,

        #[arg(short, long, default_value = "developer")]
        role: String,
    },

    /// Triage a report without storing it
    Predict {
        #[command(flatten)]
        report: ReportArgs,

        /// Override the configured predict threshold
        #[arg(long)]
        threshold: Option<f64>,
    },

    /// Triage and store a report
    Submit {
        #[command(flatten)]
        report: ReportArgs,
    },

    /// Triage and store a JSON array of reports
    Import {
        /// Path to a JSON file: `[{"title", "body", "assignee"?, ...}]`
        file: PathBuf,
    },

    /// List stored bugs
    Bugs {
        #[arg(long, default_value = "0")]
        offset: usize,

        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Show dashboard aggregates
    Stats,

    /// Manually assign a bug
    Assign { bug_id: String, developer: String },

    /// Delete a bug with its predictions and assignments
    Delete { bug_id: String },

    /// Tag stored bugs that have no tags yet
    BackfillTags,
}

#[derive(clap::Args)]
struct ReportArgs {
    /// Report title
    #[arg(short, long)]
    title: String,

    /// Report body
    #[arg(short, long, default_value = "")]
    body: String,

    /// Suggested assignee
    #[arg(short, long)]
    assignee: Option<String>,

    #[arg(short, long, default_value = "medium")]
    priority: String,

    /// manual, imported-tracker or bulk-import
    #[arg(short, long, default_value = "manual")]
    source: ReportSource,
}

impl ReportArgs {
    fn into_report(self) -> RawReport {
        let report = RawReport::new(self.title, self.body)
            .with_priority(self.priority)
            .with_source(self.source);
        match self.assignee {
            Some(hint) => report.with_assignee_hint(hint),
            None => report,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    match cli.command {
        Commands::Normalize { text } => {
            println!("{}", normalize(&text));
            Ok(())
        }
        Commands::Tags { text } => {
            println!("{}", classify(&text).join(", "));
            Ok(())
        }
        command => {
            let service = connect_service(cli.classifier_url.as_deref()).await?;
            run(&service, command).await
        }
    }
}

/// Open the configured store and classifier.
async fn connect_service(classifier_url: Option<&str>) -> Result<TriageService> {
    let config = TriageConfig::from_env().context("Invalid triage configuration")?;
    let store = Arc::new(
        SurrealRecordStore::from_env()
            .await
            .context("Failed to connect to triage database")?,
    );

    let classifier: Arc<dyn Classifier> = match classifier_url {
        Some(url) => Arc::new(
            HttpClassifier::new(
                ClassifierConfig::new(url).with_timeout(config.classifier_timeout),
            )
            .context("Failed to create classifier client")?,
        ),
        None => {
            warn!("no classifier configured; only resolved assignee hints can be routed");
            Arc::new(StaticClassifier::unavailable())
        }
    };

    Ok(TriageService::new(store.clone(), store, classifier, config))
}

async fn run(service: &TriageService, command: Commands) -> Result<()> {
    match command {
        // Offline commands are handled before connecting.
        Commands::Normalize { .. } | Commands::Tags { .. } => Ok(()),
        Commands::Resolve { hint } => cmd_resolve(service, &hint).await,
        Commands::Developers { role } => cmd_developers(service, role.as_deref()).await,
        Commands::AddDeveloper {
            id,
            name,
            login,
            email,
            role,
        } => {
            let mut identity = Identity::new(id, name, login).with_role(role);
            if let Some(email) = email {
                identity = identity.with_email(email);
            }
            cmd_add_developer(service, identity).await
        }
        Commands::Predict { report, threshold } => {
            cmd_predict(service, report.into_report(), threshold).await
        }
        Commands::Submit { report } => cmd_submit(service, report.into_report()).await,
        Commands::Import { file } => cmd_import(service, &file).await,
        Commands::Bugs { offset, limit } => cmd_bugs(service, offset, limit).await,
        Commands::Stats => cmd_stats(service).await,
        Commands::Assign { bug_id, developer } => {
            cmd_assign(service, &BugId::from(bug_id.as_str()), &developer).await
        }
        Commands::Delete { bug_id } => cmd_delete(service, &BugId::from(bug_id.as_str())).await,
        Commands::BackfillTags => {
            let updated = service.backfill_tags().await.context("Tag backfill failed")?;
            println!("Tagged {} bug(s)", updated);
            Ok(())
        }
    }
}

fn print_decision(decision: &TriageDecision) {
    println!("Assignee:   {}", decision.top_candidate);
    println!("Confidence: {:.2}", decision.confidence);
    println!(
        "Routing:    {} (threshold {:.2})",
        if decision.is_auto_assigned {
            "auto-assigned"
        } else {
            "manual review"
        },
        decision.threshold_used
    );
    println!("Tags:       {}", decision.tags.join(", "));
    if let Some(resolution) = &decision.hint_resolution {
        println!(
            "Hint:       {} ({:.2})",
            resolution.status, resolution.similarity_score
        );
    }
    if decision.candidates.len() > 1 {
        println!("Candidates:");
        for c in &decision.candidates {
            println!("  {:<24} {:.2}", c.identity_name, c.confidence);
        }
    }
}

async fn cmd_resolve(service: &TriageService, hint: &str) -> Result<()> {
    let roster = service
        .identities(Some(DEVELOPER_ROLE))
        .await
        .context("Failed to read roster")?;
    let result = resolve(hint, &roster);
    match &result.matched_name {
        Some(name) => println!("{} -> {} ({:.2})", result.status, name, result.similarity_score),
        None => println!("{}", result.status),
    }
    Ok(())
}

async fn cmd_developers(service: &TriageService, role: Option<&str>) -> Result<()> {
    let identities = service
        .identities(role)
        .await
        .context("Failed to read roster")?;
    if identities.is_empty() {
        println!("No identities registered");
        return Ok(());
    }
    for i in identities {
        println!(
            "{:<12} {:<24} {:<16} {:<10} {}",
            i.id,
            i.display_name,
            i.login,
            i.role,
            i.email.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

async fn cmd_add_developer(service: &TriageService, identity: Identity) -> Result<()> {
    let id = identity.id.clone();
    service
        .register_identity(identity)
        .await
        .context(format!("Failed to register identity {}", id))?;
    println!("Registered {}", id);
    Ok(())
}

async fn cmd_predict(
    service: &TriageService,
    report: RawReport,
    threshold: Option<f64>,
) -> Result<()> {
    let decision = match threshold {
        Some(value) => {
            let config = service
                .config()
                .clone()
                .with_predict_threshold(Threshold::new(value)?);
            service.clone().with_config(config).predict(&report).await?
        }
        None => service.predict(&report).await?,
    };
    print_decision(&decision);
    Ok(())
}

async fn cmd_submit(service: &TriageService, report: RawReport) -> Result<()> {
    let submission = service
        .submit(&report, TriageContext::Predict)
        .await
        .context(format!("Failed to submit '{}'", report.title))?;
    println!("Stored bug {} ({})", submission.bug.bug_id, submission.bug.status);
    print_decision(&submission.decision);
    Ok(())
}

/// Read a JSON array of reports.
fn load_reports(path: &Path) -> Result<Vec<RawReport>> {
    let raw = std::fs::read_to_string(path)
        .context(format!("Failed to read report file {:?}", path))?;
    let reports: Vec<RawReport> =
        serde_json::from_str(&raw).context(format!("Failed to parse report file {:?}", path))?;
    Ok(reports)
}

async fn cmd_import(service: &TriageService, path: &Path) -> Result<()> {
    let reports = load_reports(path)?
        .into_iter()
        .map(|r| r.with_source(ReportSource::BulkImport))
        .collect();
    let summary = service.import_batch(reports).await.context("Import failed")?;

    for outcome in &summary.outcomes {
        match &outcome.status {
            ImportStatus::Imported {
                bug_id,
                assignee,
                auto_assigned,
            } => println!(
                "[{}] imported {} -> {}{}",
                outcome.index,
                bug_id,
                assignee,
                if *auto_assigned { "" } else { " (review)" }
            ),
            ImportStatus::SkippedDuplicate { existing } => println!(
                "[{}] duplicate of {}: {}",
                outcome.index, existing, outcome.title
            ),
            ImportStatus::Errored { error, .. } => {
                println!("[{}] failed: {}: {}", outcome.index, outcome.title, error)
            }
        }
    }
    println!(
        "Imported {}, skipped {} duplicate(s), {} error(s)",
        summary.imported, summary.skipped_duplicates, summary.errored
    );
    Ok(())
}

async fn cmd_bugs(service: &TriageService, offset: usize, limit: usize) -> Result<()> {
    let bugs = service
        .list_bugs(offset, limit)
        .await
        .context("Failed to list bugs")?;
    if bugs.is_empty() {
        println!("No bugs found");
        return Ok(());
    }
    for bug in bugs {
        println!(
            "{}  {:<14} {:<8} {}  [{}]",
            bug.bug_id,
            bug.status,
            bug.priority,
            bug.title,
            bug.tags.join(", ")
        );
    }
    Ok(())
}

async fn cmd_stats(service: &TriageService) -> Result<()> {
    let stats = service.stats().await.context("Failed to compute stats")?;
    println!("Total bugs:    {}", stats.total_bugs);
    println!("Auto-assigned: {}", stats.auto_assigned);
    println!("Manual review: {}", stats.manual_review);
    println!("Pending:       {}", stats.pending_bugs);
    if !stats.bugs_per_developer.is_empty() {
        println!("\nPer developer:");
        for (developer, count) in &stats.bugs_per_developer {
            println!("  {:<24} {}", developer, count);
        }
    }
    Ok(())
}

async fn cmd_assign(service: &TriageService, bug_id: &BugId, developer: &str) -> Result<()> {
    let record = service
        .assign_manual(bug_id, developer)
        .await
        .context(format!("Failed to assign bug {}", bug_id))?;
    println!("Assigned {} to {} ({})", record.bug_id, record.developer_name, record.kind);
    Ok(())
}

async fn cmd_delete(service: &TriageService, bug_id: &BugId) -> Result<()> {
    let deleted = service
        .delete_bug(bug_id)
        .await
        .context(format!("Failed to delete bug {}", bug_id))?;
    if deleted {
        println!("Deleted {}", bug_id);
    } else {
        println!("No bug {}", bug_id);
    }
    Ok(())
}
