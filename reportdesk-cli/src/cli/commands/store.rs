//! `store` commands: import, inspect and clear the consolidated store

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use colored::*;
use dialoguer::Confirm;
use is_terminal::IsTerminal;

use crate::cli::open_store;
use crate::config::Settings;
use crate::export::render_table;
use crate::report::ReportFragment;
use crate::store::ReportStore;

#[derive(Subcommand, Debug)]
pub enum StoreCommands {
    /// Append fragments from a JSON file (a list of {df, columns, title, percent_cols})
    Import {
        file: PathBuf,
        #[arg(long)]
        category: String,
    },
    /// List stored reports
    List {
        #[arg(long)]
        category: Option<String>,
    },
    /// Print stored reports as tables
    Show {
        #[arg(long)]
        category: Option<String>,
    },
    /// Remove every stored report
    Clear {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

pub async fn handle_store_command(command: StoreCommands, settings: &Settings) -> Result<()> {
    let store = open_store(settings).await?;

    match command {
        StoreCommands::Import { file, category } => {
            let fragments = read_fragments(&file)?;
            let outcome = store.append(fragments, &category).await?;

            println!(
                "{} Appended {} report(s) to '{}'",
                "✓".green(),
                outcome.appended,
                category.cyan()
            );
            for skipped in &outcome.skipped {
                println!(
                    "  {} skipped empty report #{} '{}'",
                    "-".dimmed(),
                    skipped.index,
                    skipped.title
                );
            }
        }

        StoreCommands::List { category } => {
            let entries = store.entries().await?;
            let mut shown = 0;
            for entry in entries
                .iter()
                .filter(|e| category.as_ref().is_none_or(|c| e.fragment.category == *c))
            {
                println!(
                    "{:>4}  {}  {:<24} {} ({} rows)",
                    entry.id,
                    entry.appended_at.format("%Y-%m-%d %H:%M"),
                    entry.fragment.category.cyan(),
                    entry.fragment.title,
                    entry.fragment.rows.len()
                );
                shown += 1;
            }

            if shown == 0 {
                println!("{}", "No stored reports.".dimmed());
                return Ok(());
            }

            println!();
            for (category, count) in store.category_counts().await? {
                println!("  {:<24} {}", category, count);
            }
            println!(
                "  {} of {} bytes used",
                store.used_bytes().await?,
                store.quota_bytes()
            );
        }

        StoreCommands::Show { category } => {
            let fragments = match &category {
                Some(category) => store.get_by_category(category).await?,
                None => store.get_all().await?,
            };
            if fragments.is_empty() {
                println!("{}", "No stored reports.".dimmed());
            }
            for fragment in &fragments {
                println!("{}", render_table(fragment));
            }
        }

        StoreCommands::Clear { yes } => {
            if !yes && !confirm_clear()? {
                println!("Cancelled.");
                return Ok(());
            }
            store.clear().await?;
            println!("{} Consolidated store cleared", "✓".green());
        }
    }

    Ok(())
}

fn read_fragments(path: &Path) -> Result<Vec<ReportFragment>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read fragments file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Expected a JSON list of reports in {}", path.display()))
}

fn confirm_clear() -> Result<bool> {
    if !io::stdin().is_terminal() {
        bail!("Refusing to clear the store without a terminal; pass --yes");
    }

    Confirm::new()
        .with_prompt("Remove every report from the consolidated store?")
        .default(false)
        .interact()
        .context("Failed to read confirmation")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::CellValue;

    #[test]
    fn test_read_fragments_accepts_stored_shape() {
        let path = std::env::temp_dir().join(format!("reportdesk-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            r#"[{"df": [{"Branch": "SALEM", "APR": 4}], "columns": ["Branch", "APR"],
                "title": "NUMBER OF BILLED CUSTOMERS - APR", "percent_cols": []}]"#,
        )
        .unwrap();

        let fragments = read_fragments(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].rows[0]["APR"], CellValue::Number(4.0));
        assert_eq!(fragments[0].column_order, vec!["Branch", "APR"]);
    }
}
