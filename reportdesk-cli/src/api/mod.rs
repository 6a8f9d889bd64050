//! Report backend API
//!
//! Typed access to the backend that parses uploaded sheets and computes
//! report tables. Responses are validated at this boundary; nothing
//! downstream sees raw JSON.

pub mod client;
pub mod error;
pub mod models;

#[cfg(test)]
pub(crate) mod test_server;

pub use client::{ReportApiClient, decode_response, endpoints};
pub use error::ApiError;
pub use models::{
    BackendMapping, BilledCustomersResponse, BilledCustomersYear, BudgetVsBilledResponse,
    ColumnsResponse, ExecutiveBudgetResponse, ExecutiveCustomersResponse, ExecutiveCustomersYear,
    ExecutiveOdResponse, GrowthGroup, Keyed, NamedMappings, OdTargetResponse,
    ProductGrowthResponse, SheetRef, SubTable,
};
