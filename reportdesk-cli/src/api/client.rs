//! HTTP client for the report backend

use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::error::ApiError;
use super::models::{
    BilledCustomersResponse, BudgetVsBilledResponse, ColumnsResponse, ErrorBody,
    ExecutiveBudgetResponse, ExecutiveCustomersResponse, ExecutiveOdResponse, NamedMappings,
    OdTargetResponse, ProductGrowthResponse, SheetRef, SheetsResponse,
};
use crate::config::ApiSettings;

/// Backend endpoint paths
pub mod endpoints {
    pub const SHEETS: &str = "/api/branch/sheets";
    pub const COLUMNS: &str = "/api/branch/get_columns";
    pub const AUTO_MAP_BUDGET: &str = "/api/branch/auto_map_columns";
    pub const AUTO_MAP_OD: &str = "/api/branch/get_od_columns";
    pub const AUTO_MAP_PRODUCT_GROWTH: &str = "/api/branch/auto_map_product_growth";
    pub const AUTO_MAP_BILLED_CUSTOMERS: &str = "/api/branch/get_nbc_columns";
    pub const BUDGET_VS_BILLED: &str = "/api/branch/calculate_budget_vs_billed";
    pub const OD_TARGET: &str = "/api/branch/calculate_od_target";
    pub const PRODUCT_GROWTH: &str = "/api/branch/calculate_product_growth";
    pub const BILLED_CUSTOMERS: &str = "/api/branch/calculate_nbc_table";

    pub const EXECUTIVE_AUTO_MAP_BUDGET: &str = "/api/executive/auto_map_columns";
    pub const EXECUTIVE_AUTO_MAP_CUSTOMERS: &str = "/api/executive/customer_auto_map_columns";
    pub const EXECUTIVE_AUTO_MAP_OD: &str = "/api/executive/od_target_auto_map_columns";
    pub const EXECUTIVE_BUDGET: &str = "/api/executive/calculate_budget_vs_billed";
    pub const EXECUTIVE_CUSTOMERS: &str = "/api/executive/calculate_customer_analysis";
    pub const EXECUTIVE_OD: &str = "/api/executive/calculate_od_target";

    /// Short names accepted by `map --backend-endpoint`
    pub const AUTO_MAP: &[(&str, &str)] = &[
        ("budget", AUTO_MAP_BUDGET),
        ("od", AUTO_MAP_OD),
        ("product-growth", AUTO_MAP_PRODUCT_GROWTH),
        ("nbc", AUTO_MAP_BILLED_CUSTOMERS),
        ("executive-budget", EXECUTIVE_AUTO_MAP_BUDGET),
        ("executive-customers", EXECUTIVE_AUTO_MAP_CUSTOMERS),
        ("executive-od", EXECUTIVE_AUTO_MAP_OD),
    ];

    /// Path of an auto-map endpoint by short name
    pub fn auto_map_endpoint(name: &str) -> Option<&'static str> {
        AUTO_MAP
            .iter()
            .find(|(short, _)| *short == name)
            .map(|(_, path)| *path)
    }
}

/// Typed client over the backend's JSON endpoints
#[derive(Debug, Clone)]
pub struct ReportApiClient {
    http: Client,
    base_url: String,
}

impl ReportApiClient {
    pub fn new(settings: &ApiSettings) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = settings.timeout() {
            builder = builder.timeout(timeout);
        }

        let http = builder.build().map_err(|e| ApiError::Transport {
            endpoint: settings.base_url.clone(),
            message: e.to_string(),
        })?;

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    /// Sheet names of an uploaded workbook
    pub async fn sheet_names(&self, filename: &str) -> Result<Vec<String>, ApiError> {
        let body = serde_json::json!({ "filename": filename });
        let response: SheetsResponse = self.post_json(endpoints::SHEETS, &body).await?;
        Ok(response.sheets)
    }

    /// Header strings of one sheet at the given header row
    pub async fn columns(&self, sheet: &SheetRef) -> Result<Vec<String>, ApiError> {
        let response: ColumnsResponse = self.post_json(endpoints::COLUMNS, sheet).await?;
        Ok(response.columns)
    }

    /// Backend auto-mapping; returns every `<name>_mapping` object
    pub async fn auto_map<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<NamedMappings, ApiError> {
        let value: serde_json::Value = self.post_json(endpoint, body).await?;
        NamedMappings::from_json(&value).map_err(|message| ApiError::Malformed {
            endpoint: endpoint.to_string(),
            message,
        })
    }

    pub async fn budget_vs_billed(
        &self,
        payload: &serde_json::Value,
    ) -> Result<BudgetVsBilledResponse, ApiError> {
        self.post_json(endpoints::BUDGET_VS_BILLED, payload).await
    }

    pub async fn od_target(&self, payload: &serde_json::Value) -> Result<OdTargetResponse, ApiError> {
        self.post_json(endpoints::OD_TARGET, payload).await
    }

    pub async fn product_growth(
        &self,
        payload: &serde_json::Value,
    ) -> Result<ProductGrowthResponse, ApiError> {
        self.post_json(endpoints::PRODUCT_GROWTH, payload).await
    }

    pub async fn billed_customers(
        &self,
        payload: &serde_json::Value,
    ) -> Result<BilledCustomersResponse, ApiError> {
        self.post_json(endpoints::BILLED_CUSTOMERS, payload).await
    }

    pub async fn executive_budget(
        &self,
        payload: &serde_json::Value,
    ) -> Result<ExecutiveBudgetResponse, ApiError> {
        self.post_json(endpoints::EXECUTIVE_BUDGET, payload).await
    }

    pub async fn executive_customers(
        &self,
        payload: &serde_json::Value,
    ) -> Result<ExecutiveCustomersResponse, ApiError> {
        self.post_json(endpoints::EXECUTIVE_CUSTOMERS, payload).await
    }

    pub async fn executive_od(
        &self,
        payload: &serde_json::Value,
    ) -> Result<ExecutiveOdResponse, ApiError> {
        self.post_json(endpoints::EXECUTIVE_OD, payload).await
    }

    /// POST a JSON body and decode a typed response
    pub async fn post_json<B, R>(&self, endpoint: &str, body: &B) -> Result<R, ApiError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.url(endpoint);
        log::debug!("POST {}", url);

        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::Transport {
                endpoint: endpoint.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| ApiError::Transport {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })?;

        let result = decode_response(endpoint, status, &text);
        if let Err(ref err) = result {
            log::error!("{}", err);
        }
        result
    }
}

/// Turn a status + body into a typed value or a classified error
pub fn decode_response<R: DeserializeOwned>(
    endpoint: &str,
    status: u16,
    body: &str,
) -> Result<R, ApiError> {
    if !(200..300).contains(&status) {
        let message = serde_json::from_str::<ErrorBody>(body)
            .map(|b| b.error)
            .unwrap_or_else(|_| {
                let trimmed = body.trim();
                if trimmed.is_empty() {
                    "no error message".to_string()
                } else {
                    trimmed.chars().take(200).collect()
                }
            });
        return Err(ApiError::Status {
            endpoint: endpoint.to_string(),
            status,
            message,
        });
    }

    serde_json::from_str(body).map_err(|e| ApiError::Malformed {
        endpoint: endpoint.to_string(),
        message: e.to_string(),
    })
}
