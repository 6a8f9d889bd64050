//! `export` command: write the consolidated store to a file

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Args;
use colored::*;

use crate::cli::open_store;
use crate::config::Settings;
use crate::export::{SheetLayout, export_to_path};
use crate::store::ReportStore;

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Output file (.xlsx or .csv)
    pub output: PathBuf,

    /// Only export one category
    #[arg(long)]
    pub category: Option<String>,

    /// One worksheet per category (.xlsx only)
    #[arg(long)]
    pub sheet_per_category: bool,
}

pub async fn handle_export_command(args: ExportArgs, settings: &Settings) -> Result<()> {
    let store = open_store(settings).await?;

    let fragments = match &args.category {
        Some(category) => store.get_by_category(category).await?,
        None => store.get_all().await?,
    };

    if fragments.is_empty() {
        bail!("The consolidated store has no reports to export");
    }

    let layout = if args.sheet_per_category {
        SheetLayout::PerCategory
    } else {
        SheetLayout::Single
    };
    export_to_path(&fragments, &args.output, layout)?;

    println!(
        "{} Exported {} report(s) to {}",
        "✓".green(),
        fragments.len(),
        args.output.display().to_string().cyan()
    );
    Ok(())
}
