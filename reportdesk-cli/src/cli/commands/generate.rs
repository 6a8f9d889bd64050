//! `generate` command: run a report on the backend and consolidate it

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::Args;
use colored::*;

use crate::api::ReportApiClient;
use crate::cli::open_store;
use crate::config::Settings;
use crate::export::render_table;
use crate::report::flows::{ReportFlow, run_flow};
use crate::report::{Consolidation, ReportFragment, consolidate};
use crate::store::StoreError;

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Report to run: budget, od, product-growth, nbc, executive-budget,
    /// executive-customers or executive-od
    #[arg(value_parser = ReportFlow::from_str)]
    pub flow: ReportFlow,

    /// JSON request body for the backend calculation
    #[arg(long)]
    pub request: PathBuf,

    /// Period label used in report titles (e.g. "April 2025"; the selected
    /// months for executive-budget)
    #[arg(long)]
    pub period: String,

    /// Show the report without adding it to the consolidated store
    #[arg(long)]
    pub no_store: bool,
}

pub async fn handle_generate_command(args: GenerateArgs, settings: &Settings) -> Result<()> {
    let content = std::fs::read_to_string(&args.request)
        .with_context(|| format!("Failed to read request file: {}", args.request.display()))?;
    let payload: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Invalid JSON in {}", args.request.display()))?;

    let client = ReportApiClient::new(&settings.api)?;
    let fragments = run_flow(&client, args.flow, &payload, &args.period)
        .await
        .with_context(|| format!("Failed to generate {} report", args.flow))?;

    if fragments.is_empty() {
        println!("{}", "The backend returned no rows for this report.".yellow());
        return Ok(());
    }

    for fragment in &fragments {
        println!("{}", render_table(fragment));
    }

    if args.no_store {
        return Ok(());
    }

    match add_to_store(settings, fragments, args.flow.category()).await {
        Consolidation::Stored(outcome) => {
            println!(
                "{} Added {} report(s) to the consolidated store",
                "✓".green(),
                outcome.appended
            );
            for skipped in outcome.skipped {
                println!("  {} skipped empty report '{}'", "-".dimmed(), skipped.title);
            }
        }
        Consolidation::Failed(err) => {
            eprintln!(
                "{} Report generated but not added to the consolidated store: {}",
                "warning:".yellow().bold(),
                err
            );
        }
    }

    Ok(())
}

/// Consolidate into the configured store; a store that cannot be opened is
/// reported the same way as a failed append
async fn add_to_store(
    settings: &Settings,
    fragments: Vec<ReportFragment>,
    category: &str,
) -> Consolidation {
    match open_store(settings).await {
        Ok(store) => consolidate(&store, fragments, category).await,
        Err(err) => {
            log::error!("Could not open the consolidated store: {:#}", err);
            Consolidation::Failed(StoreError::from(err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_server;
    use crate::report::flows::categories;
    use crate::store::test_support::fragment;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("reportdesk-{}-{}", uuid::Uuid::new_v4(), name))
    }

    /// A database path whose parent is a regular file
    fn unopenable_database() -> (PathBuf, PathBuf) {
        let blocker = temp_path("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let database = blocker.join("reports.db");
        (blocker, database)
    }

    #[tokio::test]
    async fn test_unopenable_store_is_a_failed_consolidation() {
        let (blocker, database) = unopenable_database();
        let settings = Settings::builder().database_path(&database).build();

        let result = add_to_store(
            &settings,
            vec![fragment("A", "x", 1.0)],
            categories::BUDGET_VS_BILLED,
        )
        .await;
        std::fs::remove_file(&blocker).ok();

        assert!(matches!(result, Consolidation::Failed(StoreError::Backend(_))));
    }

    #[tokio::test]
    async fn test_generate_succeeds_when_store_cannot_open() {
        let (blocker, database) = unopenable_database();
        let request = temp_path("request.json");
        std::fs::write(&request, br#"{"os_file_path": "uploads/os.xlsx"}"#).unwrap();

        let (base_url, server) = test_server::serve_once(
            200,
            r#"{"success": true, "data": [{"Executive": "RAVI", "TARGET": 4.5}], "columns": ["Executive", "TARGET"], "end_date": "Sep 2025"}"#,
        )
        .await;
        let settings = Settings::builder()
            .base_url(base_url)
            .timeout_secs(5)
            .database_path(&database)
            .build();

        let args = GenerateArgs {
            flow: ReportFlow::ExecutiveOd,
            request: request.clone(),
            period: "Sep 2025".to_string(),
            no_store: false,
        };
        let result = handle_generate_command(args, &settings).await;
        server.await.unwrap();
        std::fs::remove_file(&blocker).ok();
        std::fs::remove_file(&request).ok();

        assert!(result.is_ok(), "generate failed: {:?}", result.err());
    }
}
