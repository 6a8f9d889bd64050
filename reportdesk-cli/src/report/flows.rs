//! Report flows
//!
//! Each flow takes one typed backend result and reshapes it into the
//! fragments that get shown, stored and exported: unit-suffixed column
//! names, a fixed column order, percent positions and a title.

use std::str::FromStr;

use super::types::{ReportFragment, Row};
use crate::api::{
    ApiError, BilledCustomersResponse, BudgetVsBilledResponse, ExecutiveBudgetResponse,
    ExecutiveCustomersResponse, ExecutiveOdResponse, OdTargetResponse, ProductGrowthResponse,
    ReportApiClient,
};
use crate::store::{AppendOutcome, ReportStore, StoreError};

/// Store categories, one per flow
pub mod categories {
    pub const BUDGET_VS_BILLED: &str = "branch_budget_results";
    pub const OD_TARGET: &str = "branch_od_vs_results";
    pub const PRODUCT_GROWTH: &str = "product_growth_results";
    pub const BILLED_CUSTOMERS: &str = "branch_nbc_results";
    pub const EXECUTIVE_BUDGET: &str = "budget_results";
    pub const EXECUTIVE_CUSTOMERS: &str = "customers_results";
    pub const EXECUTIVE_OD: &str = "od_results";
}

const BUDGET_RENAMES: &[(&str, &str)] = &[
    ("Budget Qty", "Budget Qty/Mt"),
    ("Billed Qty", "Billed Qty/Mt"),
    ("Budget Value", "Budget Value/L"),
    ("Billed Value", "Billed Value/L"),
];

const BUDGET_QTY_COLUMNS: &[&str] = &["Area", "Budget Qty/Mt", "Billed Qty/Mt", "%"];
const BUDGET_VALUE_COLUMNS: &[&str] = &["Area", "Budget Value/L", "Billed Value/L", "%"];
const OVERALL_QTY_COLUMNS: &[&str] = &["Area", "Budget Qty/Mt", "Billed Qty/Mt"];
const OVERALL_VALUE_COLUMNS: &[&str] = &["Area", "Budget Value/L", "Billed Value/L"];

const EXECUTIVE_RENAMES: &[(&str, &str)] = &[
    ("Budget Qty", "Target Qty"),
    ("Budget Value", "Target Value"),
];

const EXECUTIVE_QTY_COLUMNS: &[&str] = &["Executive", "Target Qty", "Billed Qty", "%"];
const EXECUTIVE_VALUE_COLUMNS: &[&str] = &["Executive", "Target Value", "Billed Value", "%"];
const EXECUTIVE_OVERALL_QTY_COLUMNS: &[&str] = &["Executive", "Target Qty", "Billed Qty"];
const EXECUTIVE_OVERALL_VALUE_COLUMNS: &[&str] = &["Executive", "Target Value", "Billed Value"];

/// Serial-number columns the backend adds to executive tables
const SERIAL_COLUMNS: &[&str] = &["s.no", "sno"];

const OD_RENAMES: &[(&str, &str)] = &[
    ("Branch", "BRANCH"),
    ("Region", "REGION"),
    ("Due Target", "DUE TARGET/L"),
    ("Collection Achieved", "COLLECTION ACHIEVED/L"),
    ("Overall % Achieved", "OVERALL % ACHIEVED"),
    ("For the month Overdue", "FOR THE MONTH OVERDUE/L"),
    ("For the month Collection", "FOR THE MONTH COLLECTION/L"),
    ("For the month % Achieved", "FOR THE MONTH % ACHIEVED"),
    ("% Achieved (Selected Month)", "FOR THE MONTH % ACHIEVED"),
];

const OD_BRANCH_COLUMNS: &[&str] = &[
    "BRANCH",
    "DUE TARGET/L",
    "COLLECTION ACHIEVED/L",
    "OVERALL % ACHIEVED",
    "FOR THE MONTH OVERDUE/L",
    "FOR THE MONTH COLLECTION/L",
    "FOR THE MONTH % ACHIEVED",
];

const OD_REGION_COLUMNS: &[&str] = &[
    "REGION",
    "DUE TARGET/L",
    "COLLECTION ACHIEVED/L",
    "OVERALL % ACHIEVED",
    "FOR THE MONTH OVERDUE/L",
    "FOR THE MONTH COLLECTION/L",
    "FOR THE MONTH % ACHIEVED",
];

const GROWTH_RENAMES: &[(&str, &str)] = &[
    ("LAST_YEAR_QTY/MT", "LAST YEAR QTY/MT"),
    ("BUDGET_QTY/MT", "BUDGET QTY/MT"),
    ("CURRENT_YEAR_QTY/MT", "CURRENT YEAR QTY/MT"),
    ("LAST_YEAR_VALUE/L", "LAST YEAR VALUE/L"),
    ("BUDGET_VALUE/L", "BUDGET VALUE/L"),
    ("CURRENT_YEAR_VALUE/L", "CURRENT YEAR VALUE/L"),
];

const GROWTH_QTY_COLUMNS: &[&str] = &[
    "PRODUCT NAME",
    "LAST YEAR QTY/MT",
    "BUDGET QTY/MT",
    "CURRENT YEAR QTY/MT",
    "GROWTH %",
];

const GROWTH_VALUE_COLUMNS: &[&str] = &[
    "PRODUCT NAME",
    "LAST YEAR VALUE/L",
    "BUDGET VALUE/L",
    "CURRENT YEAR VALUE/L",
    "GROWTH %",
];

/// The report screens that feed the consolidated store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportFlow {
    BudgetVsBilled,
    OdTarget,
    ProductGrowth,
    BilledCustomers,
    ExecutiveBudget,
    ExecutiveCustomers,
    ExecutiveOd,
}

impl ReportFlow {
    pub const ALL: [ReportFlow; 7] = [
        ReportFlow::BudgetVsBilled,
        ReportFlow::OdTarget,
        ReportFlow::ProductGrowth,
        ReportFlow::BilledCustomers,
        ReportFlow::ExecutiveBudget,
        ReportFlow::ExecutiveCustomers,
        ReportFlow::ExecutiveOd,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ReportFlow::BudgetVsBilled => "budget",
            ReportFlow::OdTarget => "od",
            ReportFlow::ProductGrowth => "product-growth",
            ReportFlow::BilledCustomers => "nbc",
            ReportFlow::ExecutiveBudget => "executive-budget",
            ReportFlow::ExecutiveCustomers => "executive-customers",
            ReportFlow::ExecutiveOd => "executive-od",
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            ReportFlow::BudgetVsBilled => categories::BUDGET_VS_BILLED,
            ReportFlow::OdTarget => categories::OD_TARGET,
            ReportFlow::ProductGrowth => categories::PRODUCT_GROWTH,
            ReportFlow::BilledCustomers => categories::BILLED_CUSTOMERS,
            ReportFlow::ExecutiveBudget => categories::EXECUTIVE_BUDGET,
            ReportFlow::ExecutiveCustomers => categories::EXECUTIVE_CUSTOMERS,
            ReportFlow::ExecutiveOd => categories::EXECUTIVE_OD,
        }
    }
}

impl FromStr for ReportFlow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "budget" | "budget-vs-billed" => Ok(ReportFlow::BudgetVsBilled),
            "od" | "od-target" => Ok(ReportFlow::OdTarget),
            "product-growth" | "growth" => Ok(ReportFlow::ProductGrowth),
            "nbc" | "billed-customers" => Ok(ReportFlow::BilledCustomers),
            "executive-budget" | "target-vs-billed" => Ok(ReportFlow::ExecutiveBudget),
            "executive-customers" | "executive-nbc" => Ok(ReportFlow::ExecutiveCustomers),
            "executive-od" => Ok(ReportFlow::ExecutiveOd),
            other => Err(format!(
                "Unknown report flow '{}'. Expected one of: {}",
                other,
                ReportFlow::ALL.map(|f| f.name()).join(", ")
            )),
        }
    }
}

impl std::fmt::Display for ReportFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Build a fragment from backend rows, keeping the column order even when
/// there are no rows
fn table(
    rows: &[Row],
    renames: &[(&str, &str)],
    columns: &[&str],
    title: String,
    percent: &[usize],
) -> ReportFragment {
    let order = columns.iter().map(|c| c.to_string()).collect();
    let mut fragment =
        ReportFragment::new(title, order, rows.to_vec()).with_percent_columns(percent.iter().copied());
    fragment.rename_columns(renames);
    fragment
}

/// Like [`table`], but `None` when there are no rows
fn reshape(
    rows: &[Row],
    renames: &[(&str, &str)],
    columns: &[&str],
    title: String,
    percent: &[usize],
) -> Option<ReportFragment> {
    if rows.is_empty() {
        log::debug!("Omitting '{}': no rows", title);
        return None;
    }
    Some(table(rows, renames, columns, title, percent))
}

fn without_serial_columns(columns: &[String]) -> Vec<&str> {
    columns
        .iter()
        .map(String::as_str)
        .filter(|c| !SERIAL_COLUMNS.contains(&c.to_lowercase().as_str()))
        .collect()
}

/// Budget vs billed: quantity, value and the two overall tables. All four
/// are returned even when a table has no rows.
pub fn budget_vs_billed_fragments(
    response: &BudgetVsBilledResponse,
    period: &str,
) -> Vec<ReportFragment> {
    let period = period.to_uppercase();

    vec![
        table(
            &response.budget_vs_billed_qty.data,
            BUDGET_RENAMES,
            BUDGET_QTY_COLUMNS,
            format!("BUDGET VS BILLED - QUANTITY - {}", period),
            &[3],
        ),
        table(
            &response.budget_vs_billed_value.data,
            BUDGET_RENAMES,
            BUDGET_VALUE_COLUMNS,
            format!("BUDGET VS BILLED - VALUE - {}", period),
            &[3],
        ),
        table(
            &response.overall_sales_qty.data,
            BUDGET_RENAMES,
            OVERALL_QTY_COLUMNS,
            format!("OVERALL SALES - QUANTITY - {}", period),
            &[],
        ),
        table(
            &response.overall_sales_value.data,
            BUDGET_RENAMES,
            OVERALL_VALUE_COLUMNS,
            format!("OVERALL SALES - VALUE - {}", period),
            &[],
        ),
    ]
}

/// OD target vs collection: branch and regional summaries
pub fn od_target_fragments(response: &OdTargetResponse, period: &str) -> Vec<ReportFragment> {
    let period = period.to_uppercase();

    [
        reshape(
            &response.branch_summary,
            OD_RENAMES,
            OD_BRANCH_COLUMNS,
            format!("OD TARGET VS COLLECTION - BRANCH - {}", period),
            &[3, 6],
        ),
        reshape(
            &response.regional_summary,
            OD_RENAMES,
            OD_REGION_COLUMNS,
            format!("OD TARGET VS COLLECTION - REGIONAL - {}", period),
            &[3, 6],
        ),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// Product growth: quantity and value tables per company group
pub fn product_growth_fragments(response: &ProductGrowthResponse) -> Vec<ReportFragment> {
    let mut fragments = Vec::new();

    for (group, tables) in response.iter() {
        let group = group.to_uppercase();
        fragments.extend(reshape(
            &tables.qty_df,
            GROWTH_RENAMES,
            GROWTH_QTY_COLUMNS,
            format!("{} - QUANTITY GROWTH", group),
            &[4],
        ));
        fragments.extend(reshape(
            &tables.value_df,
            GROWTH_RENAMES,
            GROWTH_VALUE_COLUMNS,
            format!("{} - VALUE GROWTH", group),
            &[4],
        ));
    }

    fragments
}

/// Number of billed customers: one table per financial year, titled with
/// the most recent month (the period label when the backend omits it)
pub fn billed_customers_fragments(
    response: &BilledCustomersResponse,
    period: &str,
) -> Vec<ReportFragment> {
    response
        .iter()
        .filter_map(|(year, counts)| {
            let month = counts
                .recent_month
                .as_deref()
                .filter(|m| !m.trim().is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| period.to_uppercase());

            let mut columns = vec!["Branch"];
            columns.extend(counts.months.iter().map(String::as_str));

            let fragment = reshape(
                &counts.data,
                &[],
                &columns,
                format!("NUMBER OF BILLED CUSTOMERS - {}", month),
                &[],
            );
            if fragment.is_some() {
                log::debug!("Billed customers for {} titled by {}", year, month);
            }
            fragment
        })
        .collect()
}

/// Executive target against billed: the same four tables per executive,
/// titled with the selected months ("All Months" when none)
pub fn executive_budget_fragments(
    response: &ExecutiveBudgetResponse,
    months: &str,
) -> Vec<ReportFragment> {
    let months = match months.trim() {
        "" => "All Months",
        label => label,
    };

    vec![
        table(
            &response.budget_vs_billed_qty,
            EXECUTIVE_RENAMES,
            EXECUTIVE_QTY_COLUMNS,
            format!("TARGET AGAINST BILLED - QUANTITY - {}", months),
            &[3],
        ),
        table(
            &response.budget_vs_billed_value,
            EXECUTIVE_RENAMES,
            EXECUTIVE_VALUE_COLUMNS,
            format!("TARGET AGAINST BILLED - VALUE - {}", months),
            &[3],
        ),
        table(
            &response.overall_sales_qty,
            EXECUTIVE_RENAMES,
            EXECUTIVE_OVERALL_QTY_COLUMNS,
            format!("OVERALL SALES - QUANTITY - {}", months),
            &[],
        ),
        table(
            &response.overall_sales_value,
            EXECUTIVE_RENAMES,
            EXECUTIVE_OVERALL_VALUE_COLUMNS,
            format!("OVERALL SALES - VALUE - {}", months),
            &[],
        ),
    ]
}

/// Executive billed customers: one table per financial year, in backend order
pub fn executive_customers_fragments(
    response: &ExecutiveCustomersResponse,
) -> Vec<ReportFragment> {
    response
        .results
        .iter()
        .map(|(year, counts)| {
            table(
                &counts.data,
                &[],
                &without_serial_columns(&counts.columns),
                format!("NUMBER OF BILLED CUSTOMERS - FY {}", year),
                &[],
            )
        })
        .collect()
}

/// Executive OD target: a single table titled with the period end
pub fn executive_od_fragments(response: &ExecutiveOdResponse) -> Vec<ReportFragment> {
    let end = response
        .end_date
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .unwrap_or("All Periods");

    vec![table(
        &response.data,
        &[],
        &without_serial_columns(&response.columns),
        format!("OD Target - {}", end),
        &[],
    )]
}

/// Call the backend for one flow and reshape its result
pub async fn run_flow(
    client: &ReportApiClient,
    flow: ReportFlow,
    payload: &serde_json::Value,
    period: &str,
) -> Result<Vec<ReportFragment>, ApiError> {
    log::info!("Running {} report for '{}'", flow, period);

    let fragments = match flow {
        ReportFlow::BudgetVsBilled => {
            budget_vs_billed_fragments(&client.budget_vs_billed(payload).await?, period)
        }
        ReportFlow::OdTarget => od_target_fragments(&client.od_target(payload).await?, period),
        ReportFlow::ProductGrowth => {
            product_growth_fragments(&client.product_growth(payload).await?)
        }
        ReportFlow::BilledCustomers => {
            billed_customers_fragments(&client.billed_customers(payload).await?, period)
        }
        ReportFlow::ExecutiveBudget => {
            executive_budget_fragments(&client.executive_budget(payload).await?, period)
        }
        ReportFlow::ExecutiveCustomers => {
            executive_customers_fragments(&client.executive_customers(payload).await?)
        }
        ReportFlow::ExecutiveOd => executive_od_fragments(&client.executive_od(payload).await?),
    };

    Ok(fragments)
}

/// Result of handing a flow's fragments to the store
#[derive(Debug)]
pub enum Consolidation {
    Stored(AppendOutcome),
    Failed(StoreError),
}

impl Consolidation {
    pub fn is_stored(&self) -> bool {
        matches!(self, Consolidation::Stored(_))
    }
}

/// Append a flow's fragments; a store failure is logged and returned as a
/// value so the flow's own output still goes through
pub async fn consolidate(
    store: &dyn ReportStore,
    fragments: Vec<ReportFragment>,
    category: &str,
) -> Consolidation {
    match store.append(fragments, category).await {
        Ok(outcome) => {
            log::info!(
                "Stored {} fragment(s) under '{}' (batch {})",
                outcome.appended,
                category,
                outcome.batch_id
            );
            Consolidation::Stored(outcome)
        }
        Err(err) => {
            log::error!("Could not add '{}' reports to the consolidated store: {}", category, err);
            Consolidation::Failed(err)
        }
    }
}
