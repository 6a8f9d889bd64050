//! Request and response shapes of the report backend

use std::collections::{BTreeMap, HashMap};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::report::Row;

/// A sheet inside an uploaded workbook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetRef {
    pub filename: String,
    pub sheet_name: String,
    /// 1-based header row
    pub header: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SheetsResponse {
    pub sheets: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnsResponse {
    pub columns: Vec<String>,
}

/// Backend error body (`{"error": "..."}`)
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// field -> header (null when the backend found nothing)
pub type BackendMapping = HashMap<String, Option<String>>;

/// Mappings returned by an auto-map endpoint, keyed by name without the
/// `_mapping` suffix (`sales_mapping` becomes `sales`). A bare `mapping`
/// object is kept under [`NamedMappings::DEFAULT`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamedMappings {
    pub mappings: BTreeMap<String, BackendMapping>,
}

impl NamedMappings {
    pub const DEFAULT: &'static str = "default";

    /// Pick `<name>_mapping` objects out of an arbitrary JSON response
    pub fn from_json(value: &serde_json::Value) -> Result<Self, String> {
        let object = value
            .as_object()
            .ok_or_else(|| "expected a JSON object".to_string())?;

        let mut mappings = BTreeMap::new();
        for (key, value) in object {
            let name = match key.strip_suffix("_mapping") {
                Some(name) => name,
                None if key == "mapping" => Self::DEFAULT,
                None => continue,
            };
            let mapping: BackendMapping = serde_json::from_value(value.clone())
                .map_err(|e| format!("'{}' is not a field mapping: {}", key, e))?;
            mappings.insert(name.to_string(), mapping);
        }

        Ok(Self { mappings })
    }

    pub fn get(&self, name: &str) -> Option<&BackendMapping> {
        self.mappings.get(name)
    }
}

/// One computed table (`{data, columns}`)
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SubTable {
    #[serde(default)]
    pub data: Vec<Row>,
    #[serde(default)]
    pub columns: Vec<String>,
}

/// `calculate_budget_vs_billed`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BudgetVsBilledResponse {
    pub budget_vs_billed_qty: SubTable,
    pub budget_vs_billed_value: SubTable,
    #[serde(default)]
    pub overall_sales_qty: SubTable,
    #[serde(default)]
    pub overall_sales_value: SubTable,
}

/// `calculate_od_target`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OdTargetResponse {
    #[serde(default)]
    pub branch_summary: Vec<Row>,
    #[serde(default)]
    pub regional_summary: Vec<Row>,
    #[serde(default)]
    pub region_mapping: HashMap<String, String>,
}

/// Quantity/value growth tables for one company group
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GrowthGroup {
    #[serde(default)]
    pub qty_df: Vec<Row>,
    #[serde(default)]
    pub value_df: Vec<Row>,
}

/// JSON object decoded into its entries, in the order the backend wrote them
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(
    try_from = "serde_json::Map<String, serde_json::Value>",
    bound = "T: DeserializeOwned"
)]
pub struct Keyed<T> {
    entries: Vec<(String, T)>,
}

impl<T> Keyed<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Replace the value of an existing key in place, or append a new one
    pub fn insert(&mut self, key: impl Into<String>, value: T) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for Keyed<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned> TryFrom<serde_json::Map<String, serde_json::Value>> for Keyed<T> {
    type Error = serde_json::Error;

    fn try_from(object: serde_json::Map<String, serde_json::Value>) -> Result<Self, Self::Error> {
        let entries = object
            .into_iter()
            .map(|(key, value)| Ok((key, serde_json::from_value(value)?)))
            .collect::<Result<_, serde_json::Error>>()?;
        Ok(Self { entries })
    }
}

/// `calculate_product_growth`: company group -> tables
pub type ProductGrowthResponse = Keyed<GrowthGroup>;

/// Billed customer counts for one financial year
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BilledCustomersYear {
    #[serde(default)]
    pub data: Vec<Row>,
    #[serde(default)]
    pub months: Vec<String>,
    #[serde(default)]
    pub recent_month: Option<String>,
}

/// `calculate_nbc_table`: financial year -> counts
pub type BilledCustomersResponse = Keyed<BilledCustomersYear>;

/// `executive/calculate_budget_vs_billed`: bare row lists per table
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExecutiveBudgetResponse {
    #[serde(default)]
    pub budget_vs_billed_qty: Vec<Row>,
    #[serde(default)]
    pub budget_vs_billed_value: Vec<Row>,
    #[serde(default)]
    pub overall_sales_qty: Vec<Row>,
    #[serde(default)]
    pub overall_sales_value: Vec<Row>,
}

/// Customer counts of one financial year, per executive
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExecutiveCustomersYear {
    #[serde(default)]
    pub data: Vec<Row>,
    #[serde(default)]
    pub columns: Vec<String>,
}

/// `executive/calculate_customer_analysis`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExecutiveCustomersResponse {
    #[serde(default)]
    pub results: Keyed<ExecutiveCustomersYear>,
}

/// `executive/calculate_od_target`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExecutiveOdResponse {
    #[serde(default)]
    pub data: Vec<Row>,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::CellValue;
    use serde_json::json;

    #[test]
    fn test_named_mappings() {
        let body = json!({
            "sales_mapping": {"date": "Bill Date", "value": null},
            "budget_mapping": {"area": "Branch"},
            "note": "ignored"
        });

        let named = NamedMappings::from_json(&body).unwrap();
        assert_eq!(named.mappings.len(), 2);
        assert_eq!(named.get("sales").unwrap()["date"], Some("Bill Date".to_string()));
        assert_eq!(named.get("sales").unwrap()["value"], None);
        assert_eq!(named.get("budget").unwrap()["area"], Some("Branch".to_string()));
    }

    #[test]
    fn test_named_mappings_rejects_bad_shape() {
        assert!(NamedMappings::from_json(&json!([1, 2])).is_err());
        assert!(NamedMappings::from_json(&json!({"sales_mapping": [1]})).is_err());
    }

    #[test]
    fn test_budget_response() {
        let body = json!({
            "budget_vs_billed_qty": {
                "data": [{"Area": "SALEM", "Budget Qty": 10.5, "Billed Qty": 8, "%": 76.19}],
                "columns": ["Area", "Budget Qty", "Billed Qty", "%"]
            },
            "budget_vs_billed_value": {"data": [], "columns": []}
        });

        let response: BudgetVsBilledResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.budget_vs_billed_qty.data.len(), 1);
        assert_eq!(
            response.budget_vs_billed_qty.data[0]["Billed Qty"],
            CellValue::Number(8.0)
        );
        assert!(response.overall_sales_qty.data.is_empty());
    }

    #[test]
    fn test_budget_response_missing_table_is_error() {
        let body = json!({"budget_vs_billed_qty": {"data": [], "columns": []}});
        assert!(serde_json::from_value::<BudgetVsBilledResponse>(body).is_err());
    }

    #[test]
    fn test_billed_customers_response() {
        let body = json!({
            "2024-25": {
                "data": [{"Branch": "ERODE", "APR": 12}],
                "months": ["APR"],
                "recent_month": "APR"
            }
        });

        let response: BilledCustomersResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.get("2024-25").unwrap().months, vec!["APR".to_string()]);
    }

    #[test]
    fn test_keyed_keeps_backend_order() {
        let response: ProductGrowthResponse = serde_json::from_str(
            r#"{"ZETA PIPES": {"qty_df": []}, "ACCLP": {"value_df": []}, "MID": {}}"#,
        )
        .unwrap();

        assert_eq!(
            response.keys().collect::<Vec<_>>(),
            vec!["ZETA PIPES", "ACCLP", "MID"]
        );
    }

    #[test]
    fn test_keyed_rejects_bad_entry() {
        let result = serde_json::from_str::<ProductGrowthResponse>(r#"{"ACCLP": [1, 2]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_bare_mapping_key() {
        let body = json!({"success": true, "mapping": {"date": "Inv Date", "branch": null}});
        let named = NamedMappings::from_json(&body).unwrap();

        let mapping = named.get(NamedMappings::DEFAULT).unwrap();
        assert_eq!(mapping["date"], Some("Inv Date".to_string()));
        assert_eq!(mapping["branch"], None);
    }

    #[test]
    fn test_executive_responses() {
        let customers: ExecutiveCustomersResponse = serde_json::from_value(json!({
            "success": true,
            "results": {
                "2025-26": {"data": [{"Executive Name": "RAVI", "APR": 4}], "columns": ["S.NO", "Executive Name", "APR"]},
                "2024-25": {"data": [], "columns": []}
            }
        }))
        .unwrap();
        assert_eq!(
            customers.results.keys().collect::<Vec<_>>(),
            vec!["2025-26", "2024-25"]
        );

        let od: ExecutiveOdResponse = serde_json::from_value(json!({
            "success": true,
            "data": [{"Executive": "RAVI", "TARGET": 12.5}],
            "columns": ["Executive", "TARGET"],
            "end_date": "September 2025"
        }))
        .unwrap();
        assert_eq!(od.end_date.as_deref(), Some("September 2025"));
        assert_eq!(od.data[0]["TARGET"], CellValue::Number(12.5));
    }
}
