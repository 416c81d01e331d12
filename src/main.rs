//! LearnGuard - Learning Verification & Substrate Integrity
//!
//! Batch host over a JSON unit file and an optional JSON ledger snapshot.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use learnguard::{
    substrate::{compute_substrate_stats, migrate, InMemoryUnitRepository, UnitRepository},
    LearningConfig, LearningStore, SharedLearningStore,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "learnguard")]
#[command(version)]
#[command(about = "Learning verification and substrate integrity checks")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "LEARNGUARD_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Knowledge units (JSON array)
    #[arg(short, long, global = true)]
    units: Option<PathBuf>,

    /// Ledger snapshot (JSON), created if missing
    #[arg(short, long, global = true)]
    state: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Partition counts by classification
    Stats,

    /// Back-fill missing classification fields and write the units back
    Migrate,

    /// Per-domain utilization and concentration
    Coverage,

    /// Probation audit with demotion candidates
    Probation,

    /// Reclassify stale, harmful and orphaned units
    Prune {
        /// Write reclassified units back to the unit file
        #[arg(long)]
        write: bool,
    },

    /// Duplicate scan of recently created units
    Dedup {
        /// Window in hours
        #[arg(long, default_value = "24")]
        hours: i64,
    },

    /// Headline learning numbers
    Dashboard,

    /// Show configuration
    Config {
        /// Show default configuration
        #[arg(long)]
        default: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("learnguard={}", log_level).into());
    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    let config = load_config(cli.config.as_deref())?;
    run_command(cli.command, config, cli.units.as_deref(), cli.state.as_deref()).await
}

async fn run_command(
    command: Commands,
    config: LearningConfig,
    units: Option<&Path>,
    state: Option<&Path>,
) -> Result<()> {
    match command {
        Commands::Config { default } => {
            show_config(if default { None } else { Some(&config) })?;
        }
        Commands::Stats => {
            let (repo, _) = load_units(units)?;
            print_json(&compute_substrate_stats(repo.units(), None))?;
        }
        Commands::Migrate => {
            let (mut repo, path) = load_units(units)?;
            let report = migrate(repo.units_mut());
            repo.save(path)?;
            tracing::info!("Migrated {} units in {}", report.migrated, path.display());
            print_json(&report)?;
        }
        Commands::Coverage => {
            let (repo, _) = load_units(units)?;
            let store = load_store(config, state).await?;
            print_json(&store.domain_coverage(repo.units()).await)?;
        }
        Commands::Probation => {
            let (repo, _) = load_units(units)?;
            let store = load_store(config, state).await?;
            print_json(&store.run_probation_audit(repo.units()).await)?;
        }
        Commands::Prune { write } => {
            let (mut repo, path) = load_units(units)?;
            let store = load_store(config, state).await?;
            let report = store.run_substrate_pruning(&mut repo).await?;
            if write {
                repo.save(path)?;
                tracing::info!("Wrote reclassified units to {}", path.display());
            }
            save_state(&store, state).await?;
            print_json(&report)?;
        }
        Commands::Dedup { hours } => {
            let (repo, _) = load_units(units)?;
            let store = load_store(config, state).await?;
            let report = store.run_dedup_audit(repo.units(), hours).await;
            save_state(&store, state).await?;
            print_json(&report)?;
        }
        Commands::Dashboard => {
            let (repo, _) = load_units(units)?;
            let store = load_store(config, state).await?;
            print_json(&store.dashboard(repo.units()).await)?;
        }
    }

    Ok(())
}

fn load_units(units: Option<&Path>) -> Result<(InMemoryUnitRepository, &Path)> {
    let path = units.context("--units <file> is required for this command")?;
    let repo = InMemoryUnitRepository::load(path)
        .with_context(|| format!("failed to load units from {}", path.display()))?;
    Ok((repo, path))
}

/// `--config` / `LEARNGUARD_CONFIG`, then the default location, then defaults
fn load_config(path: Option<&Path>) -> Result<LearningConfig> {
    if let Some(path) = path {
        return LearningConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()));
    }
    match LearningConfig::default_path() {
        Some(path) if path.exists() => {
            tracing::debug!("Using config file {}", path.display());
            Ok(LearningConfig::from_file(&path)?)
        }
        _ => Ok(LearningConfig::default()),
    }
}

async fn load_store(config: LearningConfig, state: Option<&Path>) -> Result<SharedLearningStore> {
    let store = match state {
        Some(path) if path.exists() => {
            let json = tokio::fs::read_to_string(path).await?;
            LearningStore::from_json(config, &json)
                .with_context(|| format!("failed to restore ledgers from {}", path.display()))?
        }
        _ => LearningStore::new(config),
    };
    Ok(SharedLearningStore::new(store))
}

async fn save_state(store: &SharedLearningStore, state: Option<&Path>) -> Result<()> {
    if let Some(path) = state {
        tokio::fs::write(path, store.to_json().await?).await?;
        tracing::debug!("Saved ledger snapshot to {}", path.display());
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn show_config(config: Option<&LearningConfig>) -> Result<()> {
    let config = config.cloned().unwrap_or_default();
    let toml = toml::to_string_pretty(&config)?;
    println!("{}", toml);
    Ok(())
}
