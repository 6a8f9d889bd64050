//! Command-line interface

pub mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::{self, Settings};
use crate::store::SqliteReportStore;

use commands::{
    columns::ColumnsArgs, export::ExportArgs, generate::GenerateArgs, map::MapArgs,
    store::StoreCommands,
};

#[derive(Parser, Debug)]
#[command(name = "reportdesk", version, about = "Branch sales reporting: column mapping, report generation and consolidated export")]
pub struct Cli {
    /// Settings file (defaults to $REPORTDESK_CONFIG or the user config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Guess which spreadsheet column holds which field
    Map(MapArgs),
    /// List sheets or header columns of an uploaded workbook
    Columns(ColumnsArgs),
    /// Run a report on the backend and add it to the consolidated store
    Generate(GenerateArgs),
    /// Inspect or manage the consolidated report store
    Store {
        #[command(subcommand)]
        command: StoreCommands,
    },
    /// Export the consolidated store to .xlsx or .csv
    Export(ExportArgs),
}

impl Cli {
    /// Log filter implied by `-v` count
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

/// Load settings and dispatch to the command handler
pub async fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Map(args) => commands::map::handle_map_command(args, &settings).await,
        Commands::Columns(args) => commands::columns::handle_columns_command(args, &settings).await,
        Commands::Generate(args) => {
            commands::generate::handle_generate_command(args, &settings).await
        }
        Commands::Store { command } => {
            commands::store::handle_store_command(command, &settings).await
        }
        Commands::Export(args) => commands::export::handle_export_command(args, &settings).await,
    }
}

/// Open the configured SQLite report store
pub async fn open_store(settings: &Settings) -> Result<SqliteReportStore> {
    let pool = config::connect(&settings.database_path()).await?;
    Ok(SqliteReportStore::new(pool).with_quota(settings.store.quota_bytes))
}
