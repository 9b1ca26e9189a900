use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;

use sneakersecure_lib::bootstrap::{BootstrapStatus, RESTART_HINT};
use sneakersecure_lib::config::AppConfig;
use sneakersecure_lib::db::CollectionDatabase;
use sneakersecure_lib::logging;
use sneakersecure_lib::migration::MigrationOutcome;
use sneakersecure_lib::state::AppState;

#[derive(Debug, Parser)]
#[command(name = "sneakersecure", about = "SneakerSecure data maintenance", version)]
struct Cli {
    /// Override the data directory (defaults to SNEAKERSECURE_DATA_DIR or the platform data dir).
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the startup sequence and report the resulting status.
    Bootstrap {
        /// Emit the status as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Inspect the reference catalog.
    #[command(subcommand)]
    Catalog(CatalogCommand),
    /// Inspect the migrated collection.
    #[command(subcommand)]
    Collection(CollectionCommand),
    /// Inspect or reset the legacy migration flag.
    #[command(subcommand)]
    Migration(MigrationCommand),
}

#[derive(Debug, Subcommand)]
enum CatalogCommand {
    /// List every catalog entry, seeding the catalog if it is missing.
    List {
        #[arg(long)]
        json: bool,
    },
    /// Show one entry as JSON.
    Show { id: String },
}

#[derive(Debug, Subcommand)]
enum CollectionCommand {
    /// List records already imported into the database.
    List {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Subcommand)]
enum MigrationCommand {
    /// Print whether the legacy migration has completed.
    Status,
    /// Clear the completion flag so the next launch migrates again.
    Reset,
}

fn main() {
    let cli = Cli::parse();

    let mut config = AppConfig::from_env();
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if config.log.dir.is_none() {
        config.log.dir = Some(config.default_log_dir());
    }
    if let Err(err) = logging::init_logging(&config.log) {
        eprintln!("Warning: {err:#}");
    }

    let command = cli.command.unwrap_or(Commands::Bootstrap { json: false });
    match run(command, &config) {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("Error: {err:#}");
            process::exit(1);
        }
    }
}

fn run(command: Commands, config: &AppConfig) -> Result<i32> {
    let runtime = tokio::runtime::Runtime::new().context("start async runtime")?;
    runtime.block_on(async {
        let state = match AppState::open(config).await {
            Ok(state) => state,
            Err(err) => {
                eprintln!("Database error: {err:#}");
                eprintln!("{RESTART_HINT}");
                return Ok::<i32, anyhow::Error>(1);
            }
        };
        let code = match command {
            Commands::Bootstrap { json } => handle_bootstrap(&state, json).await?,
            Commands::Catalog(cmd) => handle_catalog(&state, cmd).await?,
            Commands::Collection(cmd) => handle_collection(&state, cmd).await?,
            Commands::Migration(cmd) => handle_migration(&state, cmd).await?,
        };
        state.db.pool().close().await;
        Ok::<i32, anyhow::Error>(code)
    })
}

fn describe_migration(outcome: Option<&MigrationOutcome>) -> String {
    match outcome {
        None => "not run".to_string(),
        Some(MigrationOutcome::Migrated { count }) => format!("migrated ({count} records)"),
        Some(MigrationOutcome::Failed(reason)) => format!("failed, will retry: {reason}"),
        Some(other) => other.label().replace('_', " "),
    }
}

async fn handle_bootstrap(state: &AppState, emit_json: bool) -> Result<i32> {
    let report = state.bootstrap.run().await;
    if emit_json {
        let payload = json!({
            "status": report.status,
            "migration": report.migration.as_ref().map(MigrationOutcome::label),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&payload).context("serialize bootstrap status")?
        );
    } else {
        match &report.status {
            BootstrapStatus::Ready => {
                println!("Ready");
                println!("Migration: {}", describe_migration(report.migration.as_ref()));
            }
            status => {
                if let Some(message) = status.user_message() {
                    eprintln!("{message}");
                }
                eprintln!("{RESTART_HINT}");
            }
        }
    }
    Ok(if report.status.is_ready() { 0 } else { 1 })
}

async fn handle_catalog(state: &AppState, command: CatalogCommand) -> Result<i32> {
    match command {
        CatalogCommand::List { json } => {
            let entries = state.catalog.get_all().await;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&entries).context("serialize catalog")?
                );
            } else {
                for entry in &entries {
                    println!("{}  {}  ({})", entry.id, entry.name, entry.manufacture_number);
                }
            }
            Ok(0)
        }
        CatalogCommand::Show { id } => match state.catalog.get_by_id(&id).await {
            Some(entry) => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&entry).context("serialize catalog entry")?
                );
                Ok(0)
            }
            None => {
                eprintln!("No catalog entry with id {id}");
                Ok(2)
            }
        },
    }
}

async fn handle_collection(state: &AppState, command: CollectionCommand) -> Result<i32> {
    match command {
        CollectionCommand::List { json } => {
            state.db.initialize().await.context("initialize database")?;
            let items = state
                .db
                .list_collection()
                .await
                .context("read collection")?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&items).context("serialize collection")?
                );
            } else {
                for item in &items {
                    println!("{}  {}", item.id, item.name);
                }
            }
            Ok(0)
        }
    }
}

async fn handle_migration(state: &AppState, command: MigrationCommand) -> Result<i32> {
    match command {
        MigrationCommand::Status => {
            let done = state
                .migration
                .is_completed()
                .await
                .context("read migration flag")?;
            println!("{}", if done { "completed" } else { "pending" });
            Ok(0)
        }
        MigrationCommand::Reset => {
            state
                .migration
                .reset()
                .await
                .context("reset migration flag")?;
            println!("Migration flag cleared.");
            Ok(0)
        }
    }
}
