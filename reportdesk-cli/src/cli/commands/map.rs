//! `map` command: keyword auto-mapping of spreadsheet headers

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::Args;
use colored::*;

use crate::api::{BackendMapping, NamedMappings, ReportApiClient, endpoints};
use crate::config::Settings;
use crate::services::mapping::{
    ColumnMapping, KeywordTable, MappingRequest, MatchMode, MatchSource, auto_map, builtin_table,
    builtin_tables, table_from_config,
};
use crate::sheets::read_headers;

#[derive(Args, Debug)]
pub struct MapArgs {
    /// Keyword table (built-in or from [keyword_tables] in the settings)
    #[arg(long)]
    pub table: String,

    /// Comma-separated header list
    #[arg(long, value_delimiter = ',', conflicts_with = "xlsx", required_unless_present = "xlsx")]
    pub headers: Option<Vec<String>>,

    /// Read headers from a local workbook instead
    #[arg(long)]
    pub xlsx: Option<PathBuf>,

    /// Sheet to read (first sheet by default)
    #[arg(long)]
    pub sheet: Option<String>,

    /// 1-based header row
    #[arg(long, default_value_t = 1)]
    pub header_row: u32,

    /// Saved backend auto-map response to merge over the keyword result
    #[arg(long, conflicts_with = "backend_endpoint")]
    pub backend: Option<PathBuf>,

    /// Ask the backend instead: auto-map endpoint by short name (budget, od,
    /// product-growth, nbc, executive-budget, executive-customers,
    /// executive-od) or path
    #[arg(long, requires = "backend_request")]
    pub backend_endpoint: Option<String>,

    /// JSON request body for --backend-endpoint
    #[arg(long, requires = "backend_endpoint")]
    pub backend_request: Option<PathBuf>,

    /// Which `<name>_mapping` of the backend response to use
    #[arg(long)]
    pub mapping: Option<String>,

    /// Manual choice, FIELD=HEADER (repeatable)
    #[arg(long = "set", value_name = "FIELD=HEADER")]
    pub overrides: Vec<String>,

    /// Prefer whole-header matches before substring matching
    #[arg(long)]
    pub exact_first: bool,

    /// Print the field -> header payload as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn handle_map_command(args: MapArgs, settings: &Settings) -> Result<()> {
    let table = resolve_table(&args.table, settings)?;

    let headers: Vec<String> = match (&args.headers, &args.xlsx) {
        (Some(headers), _) => headers.iter().map(|h| h.trim().to_string()).collect(),
        (None, Some(path)) => read_headers(path, args.sheet.as_deref(), args.header_row)?,
        (None, None) => bail!("Provide --headers or --xlsx"),
    };

    let backend = backend_mapping(&args, settings).await?;

    let request = MappingRequest {
        headers: &headers,
        table: &table,
        mode: if args.exact_first {
            MatchMode::ExactFirst
        } else {
            MatchMode::Substring
        },
        backend: backend.as_ref(),
    };
    let mut mapping = auto_map(&request);

    if !args.overrides.is_empty() {
        let overrides = parse_overrides(&args.overrides)?;
        let applied = mapping.apply_overrides(&overrides, &headers, MatchSource::Manual);
        if applied < overrides.len() {
            eprintln!(
                "{} {} of {} manual choice(s) ignored (unknown field or column)",
                "warning:".yellow().bold(),
                overrides.len() - applied,
                overrides.len()
            );
        }
    }

    if args.json {
        let payload = serde_json::to_string_pretty(&mapping.to_payload())
            .context("Failed to serialize mapping")?;
        println!("{}", payload);
        return Ok(());
    }

    print_mapping(&table, &mapping);
    Ok(())
}

/// Settings tables shadow built-ins of the same name
fn resolve_table(name: &str, settings: &Settings) -> Result<KeywordTable> {
    if let Some(rows) = settings.keyword_tables.get(name) {
        return table_from_config(name, rows);
    }

    builtin_table(name).cloned().ok_or_else(|| {
        let mut known: Vec<String> = builtin_tables().iter().map(|t| t.name.clone()).collect();
        known.extend(settings.keyword_tables.keys().cloned());
        anyhow!(
            "Unknown keyword table '{}'. Available: {}",
            name,
            known.join(", ")
        )
    })
}

/// Backend suggestion from a saved response or a live auto-map call
async fn backend_mapping(
    args: &MapArgs,
    settings: &Settings,
) -> Result<Option<BackendMapping>> {
    if let Some(path) = &args.backend {
        return load_backend_mapping(path, args.mapping.as_deref()).map(Some);
    }

    let (Some(endpoint), Some(request)) = (&args.backend_endpoint, &args.backend_request) else {
        return Ok(None);
    };

    let path = match endpoints::auto_map_endpoint(endpoint) {
        Some(path) => path.to_string(),
        None if endpoint.starts_with('/') => endpoint.clone(),
        None => bail!(
            "Unknown auto-map endpoint '{}'. Use a path or one of: {}",
            endpoint,
            endpoints::AUTO_MAP
                .iter()
                .map(|(name, _)| *name)
                .collect::<Vec<_>>()
                .join(", ")
        ),
    };

    let body = read_json(request)?;
    let client = ReportApiClient::new(&settings.api)?;
    let named = client
        .auto_map(&path, &body)
        .await
        .with_context(|| format!("Backend auto-mapping failed ({})", path))?;

    select_mapping(&named, args.mapping.as_deref(), &path).map(Some)
}

fn read_json(path: &Path) -> Result<serde_json::Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn load_backend_mapping(path: &Path, name: Option<&str>) -> Result<BackendMapping> {
    let value = read_json(path)?;
    let named = NamedMappings::from_json(&value).map_err(|e| anyhow!("{}: {}", path.display(), e))?;
    select_mapping(&named, name, &path.display().to_string())
}

/// The named mapping, or the first one when no name is given
fn select_mapping(
    named: &NamedMappings,
    name: Option<&str>,
    source: &str,
) -> Result<BackendMapping> {
    let selected = match name {
        Some(name) => named.get(name),
        None => named.mappings.values().next(),
    };

    selected.cloned().ok_or_else(|| {
        anyhow!(
            "No matching '<name>_mapping' object in {} (found: {})",
            source,
            named.mappings.keys().cloned().collect::<Vec<_>>().join(", ")
        )
    })
}

fn parse_overrides(raw: &[String]) -> Result<BackendMapping> {
    raw.iter()
        .map(|entry| {
            let (field, header) = entry
                .split_once('=')
                .ok_or_else(|| anyhow!("Expected FIELD=HEADER, got '{}'", entry))?;
            Ok((field.trim().to_string(), Some(header.trim().to_string())))
        })
        .collect()
}

fn print_mapping(table: &KeywordTable, mapping: &ColumnMapping) {
    println!("{} {}", "Keyword table:".bold(), table.name.cyan());
    println!();

    for field in mapping.fields() {
        match mapping.column(field) {
            Some(column) => println!(
                "  {:<16} {} {}",
                field.as_str(),
                column.header.green(),
                column.source.label().dimmed()
            ),
            None => println!("  {:<16} {}", field.as_str(), "(unmapped)".yellow()),
        }
    }

    let shared = mapping.shared_headers();
    if !shared.is_empty() {
        println!();
        for (header, fields) in shared {
            let names: Vec<&str> = fields.iter().map(|f| f.as_str()).collect();
            println!(
                "{} '{}' is used for {}",
                "note:".cyan(),
                header,
                names.join(", ")
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_server;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use std::collections::BTreeMap;

    fn parse_map_args(extra: &[&str]) -> MapArgs {
        let mut argv = vec!["reportdesk", "map", "--table", "customers", "--headers", "Inv Date"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Map(args) => args,
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_overrides() {
        let parsed = parse_overrides(&["branch = Area Name".to_string()]).unwrap();
        assert_eq!(parsed["branch"], Some("Area Name".to_string()));
        assert!(parse_overrides(&["branch".to_string()]).is_err());
    }

    #[test]
    fn test_resolve_table() {
        let mut rows = BTreeMap::new();
        rows.insert("branch".to_string(), vec!["office".to_string()]);
        let settings = Settings::builder().keyword_table("offices", rows).build();

        assert_eq!(resolve_table("offices", &settings).unwrap().specs.len(), 1);
        assert_eq!(resolve_table("Customers", &settings).unwrap().name, "customers");

        let err = resolve_table("nope", &settings).unwrap_err().to_string();
        assert!(err.contains("offices"));
    }

    #[test]
    fn test_load_backend_mapping() {
        let path = std::env::temp_dir().join(format!("reportdesk-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            r#"{"sales_mapping": {"date": "Bill Date"}, "budget_mapping": {"area": "Branch"}}"#,
        )
        .unwrap();

        let budget = load_backend_mapping(&path, None).unwrap();
        let sales = load_backend_mapping(&path, Some("sales")).unwrap();
        let missing = load_backend_mapping(&path, Some("od"));
        std::fs::remove_file(&path).ok();

        assert_eq!(budget["area"], Some("Branch".to_string()));
        assert_eq!(sales["date"], Some("Bill Date".to_string()));
        assert!(missing.is_err());
    }

    #[tokio::test]
    async fn test_backend_mapping_from_endpoint() {
        let request =
            std::env::temp_dir().join(format!("reportdesk-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&request, r#"{"sales_file_path": "uploads/sales.xlsx"}"#).unwrap();

        let (base_url, server) = test_server::serve_once(
            200,
            r#"{"success": true, "mapping": {"date": "Inv Date", "branch": null}}"#,
        )
        .await;
        let settings = Settings::builder().base_url(base_url).timeout_secs(5).build();

        let args = parse_map_args(&[
            "--backend-endpoint",
            "executive-customers",
            "--backend-request",
            request.to_str().unwrap(),
        ]);
        let mapping = backend_mapping(&args, &settings).await;
        let raw = server.await.unwrap();
        std::fs::remove_file(&request).ok();

        let mapping = mapping.unwrap().unwrap();
        assert!(raw.starts_with("POST /api/executive/customer_auto_map_columns "));
        assert!(raw.contains("uploads/sales.xlsx"));
        assert_eq!(mapping["date"], Some("Inv Date".to_string()));
        assert_eq!(mapping["branch"], None);
    }

    #[tokio::test]
    async fn test_backend_endpoint_validation() {
        let settings = Settings::builder().build();

        let args = parse_map_args(&["--backend-endpoint", "weekly", "--backend-request", "r.json"]);
        let err = backend_mapping(&args, &settings).await.unwrap_err().to_string();
        assert!(err.contains("executive-od"));

        let none = parse_map_args(&[]);
        assert!(backend_mapping(&none, &settings).await.unwrap().is_none());

        // an endpoint without a request body is rejected by clap
        let argv = [
            "reportdesk",
            "map",
            "--table",
            "customers",
            "--headers",
            "A",
            "--backend-endpoint",
            "od",
        ];
        assert!(Cli::try_parse_from(argv).is_err());
    }
}
