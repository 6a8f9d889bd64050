//! `columns` command: sheets and headers of an uploaded workbook

use anyhow::{Context, Result};
use clap::Args;
use colored::*;

use crate::api::{ReportApiClient, SheetRef};
use crate::config::Settings;

#[derive(Args, Debug)]
pub struct ColumnsArgs {
    /// File name as known to the backend upload folder
    pub filename: String,

    /// Sheet to read; lists the workbook's sheets when omitted
    #[arg(long)]
    pub sheet: Option<String>,

    /// 1-based header row
    #[arg(long, default_value_t = 1)]
    pub header_row: u32,
}

pub async fn handle_columns_command(args: ColumnsArgs, settings: &Settings) -> Result<()> {
    let client = ReportApiClient::new(&settings.api)?;

    let Some(sheet_name) = args.sheet else {
        let sheets = client
            .sheet_names(&args.filename)
            .await
            .with_context(|| format!("Failed to list sheets of {}", args.filename))?;
        println!("{} {}", "Sheets in".bold(), args.filename.cyan());
        for sheet in sheets {
            println!("  {}", sheet);
        }
        return Ok(());
    };

    let sheet = SheetRef {
        filename: args.filename,
        sheet_name,
        header: args.header_row,
    };
    let columns = client
        .columns(&sheet)
        .await
        .with_context(|| format!("Failed to read columns of '{}'", sheet.sheet_name))?;

    println!(
        "{} {} (row {})",
        "Columns of".bold(),
        sheet.sheet_name.cyan(),
        sheet.header
    );
    for (i, column) in columns.iter().enumerate() {
        println!("  {:>3}  {}", i + 1, column);
    }
    Ok(())
}
