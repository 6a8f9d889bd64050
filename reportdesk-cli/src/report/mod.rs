//! Report tables: cell values, fragments, rendering and the per-report
//! flows that turn backend results into storable fragments

pub mod flows;
pub mod format;
pub mod types;

pub use flows::{Consolidation, consolidate};
pub use format::format_cell;
pub use types::{CellValue, ReportFragment, Row};
