mod cli;
mod report;

use std::path::Path;

use cm_core::services::artifact_store::ArtifactRegistry;
use cm_core::services::journal::JournalStore;
use cm_core::services::ledger::{DevLedger, DEFAULT_BALANCE};
use cm_core::services::orchestrator::Orchestrator;
use cm_core::services::plan_loader;

use crate::cli::CliArgs;

const USAGE: &str = "\
Usage: cm-cli [PLAN] [options]

Runs the migration plan (default: migrations.yaml) against the embedded
development ledger and writes the deployment journal.

Options:
  --artifacts DIR   override the plan's artifacts directory
  --journal FILE    journal path (default: deployments.json next to the plan)
  --balance WEI     starting account balance on the development ledger
  --validate        check the plan and artifacts without deploying
  --json            print the run report as JSON
  --debug           write trace logs to .contract-migrator-debug.log
  -h, --help        show this help";

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let raw: Vec<String> = std::env::args().skip(1).collect();
    let args = match CliArgs::parse(&raw) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}\n\n{USAGE}");
            std::process::exit(2);
        }
    };

    if args.help {
        println!("{USAGE}");
        return Ok(());
    }

    let _guard = if args.debug {
        Some(setup_debug_logging())
    } else {
        None
    };

    let plan = plan_loader::load(&args.plan_path)?;
    let plan_dir = args.plan_path.parent().unwrap_or(Path::new("."));
    let artifacts_dir = args
        .artifacts_dir
        .clone()
        .unwrap_or_else(|| plan_dir.join(&plan.artifacts_dir));

    let registry = ArtifactRegistry::load(&artifacts_dir).await?;
    tracing::debug!(
        artifacts = registry.len(),
        dir = %artifacts_dir.display(),
        "registry_loaded"
    );

    let missing: Vec<String> = plan_loader::referenced_artifacts(&plan)
        .into_iter()
        .filter(|name| !registry.contains(name))
        .collect();
    if !missing.is_empty() {
        eprintln!(
            "plan references artifacts missing from {}: {}",
            artifacts_dir.display(),
            missing.join(", ")
        );
        std::process::exit(1);
    }

    if args.validate_only {
        println!(
            "plan OK: {} steps over {} artifacts",
            plan.steps.len(),
            registry.len()
        );
        return Ok(());
    }

    let journal_path = args
        .journal_path
        .clone()
        .unwrap_or_else(|| plan_dir.join("deployments.json"));

    let ledger = DevLedger::with_balance(args.balance.unwrap_or(DEFAULT_BALANCE));
    let mut orchestrator =
        Orchestrator::new(ledger, registry).with_journal(JournalStore::new(&journal_path));

    tracing::info!(plan = %args.plan_path.display(), "migration_started");
    let run = orchestrator.run(&plan).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&run)?);
    } else {
        print!("{}", report::render(&run));
        println!("journal: {}", journal_path.display());
    }

    if !run.succeeded() {
        std::process::exit(1);
    }
    Ok(())
}

/// Configure file-based tracing to `.contract-migrator-debug.log` in CWD.
/// Returns the guard that must be held alive for the duration of the program.
fn setup_debug_logging() -> tracing_appender::non_blocking::WorkerGuard {
    let file_appender = tracing_appender::rolling::never(".", ".contract-migrator-debug.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .with_ansi(false)
        .init();

    guard
}
