//! Command-line front end for the service catalog.
//!
//! Stands in for the console's panels: one-shot listings, plus a shell that
//! replays the same directory, service and application actions the panels
//! trigger.

use anyhow::Result;
use clap::{Parser, Subcommand};
use service_catalog_core::applications::{ApplicationLedger, ApplicationStatus};
use chrono::NaiveDate;
use service_catalog_core::ids::{ApplicationIdGenerator, SequenceGenerator, TokenGenerator};
use service_catalog_core::services::ServiceFilter;
use service_catalog_core::{seed, CatalogStore, CountMode};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod render;
mod shell;

/// Application ids issued under `--deterministic-ids` carry this date.
const DETERMINISTIC_DATE: (i32, u32, u32) = (2026, 1, 1);

#[derive(Parser)]
#[command(name = "service-catalog")]
#[command(about = "Browse and edit the spatiotemporal service catalog")]
struct Cli {
    /// JSON directory forest to use instead of the built-in one
    #[arg(long, env = "CATALOG_SEED", global = true)]
    seed: Option<PathBuf>,

    /// Log filter (defaults to RUST_LOG)
    #[arg(long, global = true)]
    log: Option<String>,

    /// Issue sequential directory/application ids and seeded credentials
    #[arg(long, global = true)]
    deterministic_ids: bool,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every directory with its full path
    Paths,

    /// Show the directory tree with service badges
    Tree {
        /// Count online services only, as the market view does
        #[arg(long)]
        market: bool,
    },

    /// List services
    Services {
        /// Directory id, `all` for every directory
        #[arg(long, default_value = "all")]
        dir: String,

        #[arg(long, default_value = "")]
        search: String,

        /// Drafts (offline services) only
        #[arg(long)]
        drafts: bool,
    },

    /// List applications
    Applications {
        /// pending, approved or rejected
        #[arg(long)]
        status: Option<String>,

        #[arg(long, default_value = "")]
        search: String,
    },

    /// Read catalog actions from stdin, one per line
    Shell,
}

fn build_store(cli: &Cli) -> Result<CatalogStore> {
    let directories = match &cli.seed {
        Some(path) => seed::load_forest(path)?,
        None => seed::directories(),
    };
    if !cli.deterministic_ids {
        return Ok(CatalogStore::new(directories, seed::services(), seed::applications()));
    }
    let (y, m, d) = DETERMINISTIC_DATE;
    let date = NaiveDate::from_ymd_opt(y, m, d).ok_or_else(|| anyhow::anyhow!("invalid date {y}-{m}-{d}"))?;
    let ledger = ApplicationLedger::with_generators(
        seed::applications(),
        Arc::new(ApplicationIdGenerator::fixed(date, 3)),
        Arc::new(TokenGenerator::seeded("ak_", 16, 1)),
        Arc::new(TokenGenerator::seeded("sk_", 26, 2)),
    );
    Ok(CatalogStore::with_generators(
        directories,
        seed::services(),
        ledger,
        Arc::new(SequenceGenerator::new("dir")),
    ))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match &cli.log {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::from_default_env(),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut store = build_store(&cli)?;
    let out = match &cli.command {
        Commands::Paths => render::paths(&store.directory_paths(), cli.json)?,
        Commands::Tree { market } => {
            let mode = if *market { CountMode::Market } else { CountMode::Development };
            render::tree(&store, mode, cli.json)?
        }
        Commands::Services { dir, search, drafts } => {
            let filter = ServiceFilter {
                directory_id: dir.clone(),
                search: search.clone(),
                drafts_only: *drafts,
                online_only: false,
            };
            render::services(&store.services_in(&filter), cli.json)?
        }
        Commands::Applications { status, search } => {
            let tab = match status.as_deref() {
                Some(s) => Some(
                    ApplicationStatus::from_str(s)
                        .ok_or_else(|| anyhow::anyhow!("unknown status '{}'", s))?,
                ),
                None => None,
            };
            render::applications(&store.applications().filter(tab, search), cli.json)?
        }
        Commands::Shell => {
            let stdin = std::io::stdin();
            let stdout = std::io::stdout();
            shell::run(&mut store, stdin.lock(), stdout.lock(), cli.json)?;
            return Ok(());
        }
    };
    print!("{}", out);
    Ok(())
}
